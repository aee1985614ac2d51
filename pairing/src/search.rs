//! Parallel candidate search on the acceptor.
//!
//! Decommit attempts run on a bounded rayon pool. The result is the match
//! with the smallest candidate index, the same one a sequential scan in
//! priority order would return; work past a found match is abandoned.

use std::sync::Arc;

use rayon::prelude::*;
use soundpair_fingerprint::{AudioSignal, CandidateGenerator, Shift};
use soundpair_fuzzy::{Codeword, CommitmentBlob, FuzzyCommitment, SymbolCodec};

use crate::logger::Logger;
use crate::{PairingError, log_debug};

/// The candidate that opened the commitment.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub codeword: Codeword,
    /// Index in priority order.
    pub candidate: usize,
    pub shift: Shift,
    /// Positions the decoder corrected.
    pub corrected: Vec<usize>,
}

/// Builds a worker pool with `workers` threads; 0 means one per CPU.
pub fn worker_pool(workers: usize) -> Result<rayon::ThreadPool, PairingError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("pairing-search-{i}"))
        .build()
        .map_err(|e| PairingError::WorkerPool(e.to_string()))
}

/// Runs `attempt` over `0..count` on `pool` and returns the successful
/// attempt with the lowest index.
pub fn first_match<T, F>(pool: &rayon::ThreadPool, count: usize, attempt: F) -> Option<(usize, T)>
where
    T: Send,
    F: Fn(usize) -> Option<T> + Sync + Send,
{
    pool.install(|| {
        (0..count)
            .into_par_iter()
            .find_map_first(|index| attempt(index).map(|found| (index, found)))
    })
}

/// Tries every shifted fingerprint of `signal` against `blob`.
///
/// A failing candidate is logged at debug and skipped; `Ok(None)` means no
/// candidate opened the commitment.
pub fn reconcile<C: SymbolCodec>(
    pool: &rayon::ThreadPool,
    fuzzy: &FuzzyCommitment<C>,
    generator: &CandidateGenerator,
    signal: &AudioSignal,
    blob: &CommitmentBlob,
    logger: &Arc<dyn Logger>,
) -> Result<Option<Reconciliation>, PairingError> {
    let plan = generator.extractor().plan(signal.sample_rate())?;

    let found = first_match(pool, generator.count(), |index| {
        let candidate = match generator.candidate(&plan, signal, index) {
            Ok(c) => c,
            Err(e) => {
                log_debug!(logger, "candidate {index}: extraction failed: {e}");
                return None;
            }
        };
        match fuzzy.decommit(blob, &candidate.fingerprint.to_symbols()) {
            Ok(opened) => Some(Reconciliation {
                codeword: opened.codeword,
                candidate: index,
                shift: candidate.shift,
                corrected: opened.corrected,
            }),
            Err(e) => {
                log_debug!(logger, "candidate {index} ({}): {e}", candidate.shift);
                None
            }
        }
    });
    Ok(found.map(|(_, r)| r))
}
