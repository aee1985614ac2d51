use soundpair_fingerprint::FingerprintError;
use soundpair_fuzzy::{CodecError, CommitmentError};
use thiserror::Error;

use crate::{ConnError, PairingState};

/// Errors surfaced by a pairing session.
///
/// The first three variants correspond to the protocol's failure exits;
/// everything else is also session-fatal but carries its underlying cause.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("connection denied: {0}")]
    ConnectionDenied(String),

    #[error("recording failed: {0}")]
    RecordingFailed(String),

    #[error("agreement failed: no candidate opened the commitment")]
    AgreementFailed,

    #[error("local clock is out of sync")]
    ClockOutOfSync,

    #[error("session already started (state {0})")]
    AlreadyStarted(PairingState),

    #[error("fingerprint: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("commitment: {0}")]
    Commitment(#[from] CommitmentError),

    #[error("transport: {0}")]
    Transport(#[from] ConnError),

    #[error("unexpected response to {request}: {response}")]
    UnexpectedResponse { request: &'static str, response: String },

    #[error("cipher: {0}")]
    Cipher(String),

    #[error("invalid channel: {0}")]
    InvalidChannel(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("worker pool: {0}")]
    WorkerPool(String),
}

impl From<CodecError> for PairingError {
    fn from(e: CodecError) -> Self {
        PairingError::InvalidConfig(e.to_string())
    }
}
