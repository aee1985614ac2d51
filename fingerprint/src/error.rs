use thiserror::Error;

/// Errors returned by fingerprint extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FingerprintError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(u32),

    #[error("insufficient audio: need at least {needed} samples, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("spectrum too narrow: {bins} bins cannot form two bands of width {band_width}")]
    SpectrumTooNarrow { bins: usize, band_width: usize },

    #[error("invalid fingerprint config: {0}")]
    InvalidConfig(String),
}
