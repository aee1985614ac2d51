//! soundpair - fingerprint recordings and run pairings between WAV files.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{ConfigCommand, DistanceCommand, FingerprintCommand, PairCommand};

/// soundpair - acoustic device pairing toolkit.
///
/// Two recordings of the same ambient sound yield the same pairing key.
/// Session parameters are read from ~/.soundpair/config.yaml when present.
#[derive(Parser)]
#[command(name = "soundpair")]
#[command(about = "Acoustic pairing from shared ambient sound")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.soundpair/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output as JSON (default is YAML)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show or initialize the session configuration
    Config(ConfigCommand),
    /// Extract the fingerprint of a WAV recording
    Fingerprint(FingerprintCommand),
    /// Compare two recordings across every shift candidate
    Distance(DistanceCommand),
    /// Pair two recordings over an in-process connection
    Pair(PairCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli),
        Commands::Fingerprint(cmd) => cmd.run(&cli),
        Commands::Distance(cmd) => cmd.run(&cli),
        Commands::Pair(cmd) => cmd.run(&cli).await,
    }
}
