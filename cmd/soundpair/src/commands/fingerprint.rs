//! Fingerprint extraction command.

use clap::Args;
use serde::Serialize;

use super::{get_config, load_wav, output_result};
use crate::Cli;

/// Extract the fingerprint of a WAV recording.
#[derive(Args)]
pub struct FingerprintCommand {
    /// Input WAV file
    file: String,

    /// Keep every bit the recording supports instead of the configured length
    #[arg(long)]
    all: bool,
}

#[derive(Serialize)]
struct FingerprintReport {
    file: String,
    sample_rate: u32,
    duration_secs: f64,
    bits: usize,
    ones: usize,
    fingerprint: String,
}

impl FingerprintCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        let extractor = cfg.extractor()?;
        let signal = load_wav(&self.file)?;

        let fp = if self.all {
            extractor.all_bits(&signal)?
        } else {
            extractor.extract(&signal)?
        };

        output_result(
            &FingerprintReport {
                file: self.file.clone(),
                sample_rate: signal.sample_rate(),
                duration_secs: signal.duration_secs(),
                bits: fp.len(),
                ones: fp.hamming_weight(),
                fingerprint: fp.to_string(),
            },
            cli.json,
        )
    }
}
