//! Configuration commands.

use anyhow::Context as _;
use clap::{Args, Subcommand};
use soundpair_pairing::SessionConfig;

use super::{config_path, get_config};
use crate::Cli;

/// Show or initialize the session configuration.
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Write the default configuration to the config path
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the config file location
    Path,
}

impl ConfigCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::Show => {
                let cfg = get_config(cli)?;
                cfg.validate()?;
                print!("{}", cfg.to_yaml()?);
            }
            ConfigSubcommand::Init { force } => {
                let path = config_path(cli)?;
                if path.exists() && !force {
                    anyhow::bail!("{} already exists, use --force to overwrite", path.display());
                }
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&path, SessionConfig::default().to_yaml()?)
                    .with_context(|| format!("write {}", path.display()))?;
                println!("wrote {}", path.display());
            }
            ConfigSubcommand::Path => println!("{}", config_path(cli)?.display()),
        }
        Ok(())
    }
}
