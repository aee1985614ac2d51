//! Energy-difference audio fingerprints for acoustic device pairing.
//!
//! # Pipeline
//!
//! 1. [`AudioSignal`]: captured mono samples plus sample rate
//! 2. [`Extractor::extract`]: signal -> fixed-length [`Fingerprint`]
//! 3. [`CandidateGenerator::generate`]: signal -> shifted fingerprints in
//!    priority order, compensating for capture start misalignment
//!
//! # Bit Derivation
//!
//! Each frame is Hann-windowed, transformed with a real FFT and reduced to
//! per-band energies. A bit compares how the energy step between adjacent
//! bands changed since the previous frame:
//!
//! ```text
//! bit(n, m) = (E[n][m] - E[n][m+1]) - (E[n-1][m] - E[n-1][m+1]) > 0
//! ```
//!
//! At 44.1 kHz with the default [`FingerprintConfig`] a frame is 16317
//! samples, giving 33 bands and 32 bits per frame; the 512-bit fingerprint
//! therefore needs 17 frames (about 6.3 s) of audio.

mod candidates;
mod error;
mod extractor;
mod fingerprint;
mod signal;
pub mod spectrum;

pub use candidates::{Candidate, CandidateGenerator, DEFAULT_SHIFTS, DEFAULT_STEP, Shift};
pub use error::FingerprintError;
pub use extractor::{Extractor, FingerprintConfig, frame_energies};
pub use fingerprint::Fingerprint;
pub use signal::AudioSignal;
pub use spectrum::{EnergyVector, FramePlan};
