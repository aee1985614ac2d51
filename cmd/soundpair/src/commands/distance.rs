//! Shift-aware fingerprint comparison.

use clap::Args;
use serde::Serialize;
use soundpair_fingerprint::Candidate;

use super::{get_config, load_wav, output_result};
use crate::Cli;

/// Compare two recordings across every shift candidate.
///
/// The first file plays the requester (its fingerprint is committed), the
/// second the acceptor (its recording is shifted).
#[derive(Args)]
pub struct DistanceCommand {
    /// Requester WAV file
    reference: String,
    /// Acceptor WAV file
    other: String,
}

#[derive(Serialize)]
struct DistanceReport {
    bits: usize,
    capacity: usize,
    unshifted_distance: usize,
    best_distance: usize,
    best_correlation: f64,
    best_candidate: usize,
    best_shift: String,
    first_within_capacity: Option<usize>,
}

impl DistanceCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let cfg = get_config(cli)?;
        cfg.validate()?;
        let generator = cfg.candidate_generator()?;

        let reference = generator.extractor().extract(&load_wav(&self.reference)?)?;
        let candidates = generator.generate(&load_wav(&self.other)?)?;
        let distances: Vec<usize> = candidates
            .iter()
            .map(|c: &Candidate| c.fingerprint.hamming_distance(&reference))
            .collect();

        let capacity = cfg.code.capacity();
        let (best_candidate, best_distance) = distances
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, d)| d)
            .ok_or_else(|| anyhow::anyhow!("no candidates generated"))?;

        output_result(
            &DistanceReport {
                bits: reference.len(),
                capacity,
                unshifted_distance: distances[0],
                best_distance,
                best_correlation: candidates[best_candidate].fingerprint.correlation(&reference),
                best_candidate,
                best_shift: candidates[best_candidate].shift.to_string(),
                first_within_capacity: distances.iter().position(|&d| d <= capacity),
            },
            cli.json,
        )
    }
}
