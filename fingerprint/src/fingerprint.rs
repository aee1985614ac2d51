use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered binary audio fingerprint.
///
/// Bits are laid out frame-major, band-minor. Two fingerprints describe the
/// same audio event when their Hamming distance is small relative to
/// their length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Fingerprint {
    bits: Vec<bool>,
}

impl Fingerprint {
    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Returns the fingerprint cut to its first `len` bits.
    pub fn truncated(mut self, len: usize) -> Self {
        self.bits.truncate(len);
        self
    }

    /// One code symbol per bit (0 or 1), as consumed by the fuzzy commitment.
    pub fn to_symbols(&self) -> Vec<u16> {
        self.bits.iter().map(|&b| b as u16).collect()
    }

    /// Number of differing positions. Positions past the end of the shorter
    /// fingerprint count as differences.
    pub fn hamming_distance(&self, other: &Fingerprint) -> usize {
        let common = self
            .bits
            .iter()
            .zip(other.bits.iter())
            .filter(|(a, b)| a != b)
            .count();
        common + self.len().abs_diff(other.len())
    }

    /// Fraction of agreeing positions, `1 - distance / len`.
    /// Uses the longer length as denominator; two empty prints correlate fully.
    pub fn correlation(&self, other: &Fingerprint) -> f64 {
        let len = self.len().max(other.len());
        if len == 0 {
            return 1.0;
        }
        1.0 - self.hamming_distance(other) as f64 / len as f64
    }

    /// Number of set bits.
    pub fn hamming_weight(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            f.write_str(if b { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl std::str::FromStr for Fingerprint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(format!("invalid fingerprint digit {other:?}")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { bits })
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
