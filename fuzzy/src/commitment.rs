//! Juels-Wattenberg fuzzy commitment over a Reed-Solomon code.
//!
//! The committer picks a random codeword `c` and publishes
//! `(sha256(c), x - c mod 2^s)`. Anyone holding `x'` close to `x` computes
//! `x' - delta = c + (x' - x)`, decodes it back to `c` and checks the
//! digest. Decoding alone is never sufficient: a wrong-but-valid codeword
//! is rejected by the hash.
//!
//! The delta is only as hiding as the secret is uniform. Biased fingerprint
//! bits (silence, loud transients) leak structure of `x - c`.

use std::fmt;

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::rs::{CodeParams, ReedSolomon, SymbolCodec};
use crate::{CodecError, CommitmentError};

/// SHA-256 digest of a codeword's canonical serialization.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(pub [u8; 32]);

impl Digest {
    /// Hashes each symbol as a 2-byte big-endian integer, in order.
    pub fn of_symbols(symbols: &[u16]) -> Self {
        let mut hasher = Sha256::new();
        for s in symbols {
            hasher.update(s.to_be_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)?;
        Ok(Self(out))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Digest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Digest::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A secret codeword. Never serialized; `Debug` does not print symbols.
#[derive(Clone, PartialEq, Eq)]
pub struct Codeword(Vec<u16>);

impl Codeword {
    /// Wraps raw symbols without checking code membership.
    pub fn from_symbols(symbols: Vec<u16>) -> Self {
        Self(symbols)
    }

    pub fn symbols(&self) -> &[u16] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn digest(&self) -> Digest {
        Digest::of_symbols(&self.0)
    }
}

impl fmt::Debug for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Codeword(<{} symbols>)", self.0.len())
    }
}

/// The public half of a commitment: the only thing sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentBlob {
    pub hash: Digest,
    pub delta: Vec<u16>,
}

impl CommitmentBlob {
    /// Checks the delta length and symbol range against `params`.
    pub fn validate(&self, params: &CodeParams) -> Result<(), CommitmentError> {
        check_vector(params, &self.delta)
    }
}

/// Output of [`FuzzyCommitment::commit`].
#[derive(Debug, Clone)]
pub struct Commitment {
    pub blob: CommitmentBlob,
    /// Retained by the committer as key material.
    pub codeword: Codeword,
}

/// Output of [`FuzzyCommitment::decommit`].
#[derive(Debug, Clone)]
pub struct Decommitment {
    pub codeword: Codeword,
    /// Positions the decoder corrected, ascending. Diagnostics only.
    pub corrected: Vec<usize>,
}

/// Commit/decommit over a symbol codec.
#[derive(Debug, Clone)]
pub struct FuzzyCommitment<C = ReedSolomon> {
    codec: C,
}

impl FuzzyCommitment<ReedSolomon> {
    /// Creates a commitment scheme over the default Reed-Solomon field for
    /// `params`.
    pub fn new(params: CodeParams) -> Result<Self, CodecError> {
        Ok(Self {
            codec: ReedSolomon::new(params)?,
        })
    }
}

impl<C: SymbolCodec> FuzzyCommitment<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn params(&self) -> CodeParams {
        self.codec.params()
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Commits to `secret` using the operating system's CSPRNG.
    pub fn commit(&self, secret: &[u16]) -> Result<Commitment, CommitmentError> {
        self.commit_with_rng(secret, &mut OsRng)
    }

    /// Commits to `secret`, drawing the random message from `rng`.
    pub fn commit_with_rng<R>(&self, secret: &[u16], rng: &mut R) -> Result<Commitment, CommitmentError>
    where
        R: RngCore + CryptoRng,
    {
        let params = self.params();
        check_vector(&params, secret)?;

        let limit = params.symbol_limit();
        let message: Vec<u16> = (0..params.m).map(|_| rng.gen_range(0..limit) as u16).collect();
        let codeword = self.codec.encode(&message)?;

        let delta = secret
            .iter()
            .zip(&codeword)
            .map(|(&x, &c)| sub_mod(x, c, limit))
            .collect();
        let codeword = Codeword(codeword);

        Ok(Commitment {
            blob: CommitmentBlob {
                hash: codeword.digest(),
                delta,
            },
            codeword,
        })
    }

    /// Recovers the committed codeword from a secret close to the committed one.
    ///
    /// Fails with [`CommitmentError::Decode`] when `secret` is further than
    /// the code's capacity from the committed secret, and with
    /// [`CommitmentError::HashMismatch`] when the decoded codeword is not
    /// the committed one.
    pub fn decommit(
        &self,
        blob: &CommitmentBlob,
        secret: &[u16],
    ) -> Result<Decommitment, CommitmentError> {
        let params = self.params();
        blob.validate(&params)?;
        check_vector(&params, secret)?;

        let limit = params.symbol_limit();
        let diff: Vec<u16> = secret
            .iter()
            .zip(&blob.delta)
            .map(|(&x, &d)| sub_mod(x, d, limit))
            .collect();

        let decoded = self.codec.decode(&diff).map_err(CommitmentError::Decode)?;
        let codeword = Codeword(decoded.codeword);
        if codeword.digest() != blob.hash {
            return Err(CommitmentError::HashMismatch);
        }
        Ok(Decommitment {
            codeword,
            corrected: decoded.corrected,
        })
    }
}

fn check_vector(params: &CodeParams, symbols: &[u16]) -> Result<(), CommitmentError> {
    params.check_symbols(symbols, params.n).map_err(|e| match e {
        CodecError::LengthMismatch { expected, got } => {
            CommitmentError::LengthMismatch { expected, got }
        }
        CodecError::SymbolOutOfRange { index, value, limit } => {
            CommitmentError::SymbolOutOfRange { index, value, limit }
        }
        other => CommitmentError::Codec(other),
    })
}

fn sub_mod(a: u16, b: u16, limit: u32) -> u16 {
    ((a as u32 + limit - b as u32) % limit) as u16
}
