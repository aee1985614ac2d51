use std::fmt;

use crate::{Codeword, CommitmentError};

/// Length of a derived key in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte symmetric key folded from a shared codeword.
///
/// Block `i` of the codeword maps to byte `i`: the sum of its symbols
/// mod 256. For the default 512-symbol code each block holds 16 symbols.
/// The fold adds no strength of its own; the entropy comes from the random
/// commitment message.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey([u8; KEY_LEN]);

impl SharedKey {
    /// Derives the key from `codeword`. Codewords shorter than 32 symbols
    /// are rejected; when the length is not a multiple of 32 the remainder
    /// folds into the last block.
    pub fn derive(codeword: &Codeword) -> Result<Self, CommitmentError> {
        let symbols = codeword.symbols();
        if symbols.len() < KEY_LEN {
            return Err(CommitmentError::CodewordTooShort {
                len: symbols.len(),
                min: KEY_LEN,
            });
        }
        let block = symbols.len() / KEY_LEN;

        let mut key = [0u8; KEY_LEN];
        for (i, byte) in key.iter_mut().enumerate() {
            let start = i * block;
            let end = if i == KEY_LEN - 1 { symbols.len() } else { start + block };
            let sum: u64 = symbols[start..end].iter().map(|&s| s as u64).sum();
            *byte = (sum % 256) as u8;
        }
        Ok(Self(key))
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedKey(<redacted>)")
    }
}
