//! Fuzzy commitment for noisy shared secrets.
//!
//! Two parties holding similar (not identical) symbol vectors agree on an
//! identical codeword:
//!
//! 1. [`FuzzyCommitment::commit`]: secret -> public [`CommitmentBlob`] + private [`Codeword`]
//! 2. [`FuzzyCommitment::decommit`]: blob + nearby secret -> the same [`Codeword`]
//! 3. [`SharedKey::derive`]: codeword -> 32-byte key
//!
//! The error-correcting layer is a systematic Reed-Solomon code
//! ([`ReedSolomon`]) reached through the [`SymbolCodec`] contract. With the
//! default [`CodeParams`] (n = 512, m = 152, 10-bit symbols) up to 180
//! differing positions are tolerated.

mod commitment;
mod error;
pub mod gf;
mod kdf;
pub mod rs;

pub use commitment::{Codeword, Commitment, CommitmentBlob, Decommitment, Digest, FuzzyCommitment};
pub use error::{CodecError, CommitmentError};
pub use kdf::{KEY_LEN, SharedKey};
pub use rs::{CodeParams, Decoded, FieldSpec, ReedSolomon, SymbolCodec};
