//! Immutable mono audio buffers.

use std::sync::Arc;

use crate::FingerprintError;

/// A captured mono recording: ordered amplitude samples plus sample rate.
///
/// Samples are held behind an `Arc` so a signal can be handed to worker
/// threads without copying. The buffer is never mutated after construction;
/// shifting produces a new buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSignal {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl AudioSignal {
    /// Creates a signal from floating point samples.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self, FingerprintError> {
        if sample_rate == 0 {
            return Err(FingerprintError::InvalidSampleRate(sample_rate));
        }
        Ok(Self {
            samples: samples.into(),
            sample_rate,
        })
    }

    /// Creates a signal from PCM16 samples, normalized to [-1, 1].
    pub fn from_pcm16(pcm: &[i16], sample_rate: u32) -> Result<Self, FingerprintError> {
        let samples = pcm.iter().map(|&s| s as f32 / 32768.0).collect();
        Self::new(samples, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Returns a copy moved `offset` samples towards the start,
    /// zero-filling the vacated tail.
    pub fn shifted_left(&self, offset: usize) -> Vec<f32> {
        let n = self.samples.len();
        let mut out = vec![0.0f32; n];
        if offset < n {
            out[..n - offset].copy_from_slice(&self.samples[offset..]);
        }
        out
    }

    /// Returns a copy moved `offset` samples towards the end,
    /// zero-filling the vacated head.
    pub fn shifted_right(&self, offset: usize) -> Vec<f32> {
        let n = self.samples.len();
        let mut out = vec![0.0f32; n];
        if offset < n {
            out[offset..].copy_from_slice(&self.samples[..n - offset]);
        }
        out
    }
}
