use thiserror::Error;

/// Errors returned by the Reed-Solomon codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid code parameters: {0}")]
    InvalidParams(String),

    #[error("length mismatch: expected {expected} symbols, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("symbol {value} at index {index} is out of range (limit {limit})")]
    SymbolOutOfRange { index: usize, value: u16, limit: u32 },

    #[error("uncorrectable: {0}")]
    Uncorrectable(&'static str),
}

/// Errors returned by commit and decommit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitmentError {
    #[error("secret length mismatch: expected {expected} symbols, got {got}")]
    LengthMismatch { expected: usize, got: usize },

    #[error("symbol {value} at index {index} is out of range (limit {limit})")]
    SymbolOutOfRange { index: usize, value: u16, limit: u32 },

    #[error("codec: {0}")]
    Codec(CodecError),

    #[error("decode failed: {0}")]
    Decode(CodecError),

    #[error("decoded codeword does not match the committed hash")]
    HashMismatch,

    #[error("codeword of {len} symbols is too short to derive a key (minimum {min})")]
    CodewordTooShort { len: usize, min: usize },
}

impl From<CodecError> for CommitmentError {
    fn from(e: CodecError) -> Self {
        CommitmentError::Codec(e)
    }
}
