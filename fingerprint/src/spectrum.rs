//! Per-frame spectral analysis: Hann window, magnitude FFT and band energies.

use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::FingerprintError;

/// Summed squared magnitudes of one frame, one entry per frequency band.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyVector(Vec<f64>);

impl EnergyVector {
    pub fn bands(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Precomputed analysis state for frames of a fixed length.
///
/// Holds the window and the FFT plan so repeated extraction over the same
/// sample rate (as the candidate search does hundreds of times) reuses them.
/// A plan is immutable and can be shared across threads.
#[derive(Clone)]
pub struct FramePlan {
    frame_length: usize,
    band_width: usize,
    window: Arc<[f64]>,
    fft: Arc<dyn Fft<f64>>,
}

impl FramePlan {
    /// Creates a plan for frames of `frame_length` samples split into bands of
    /// `band_width` bins.
    ///
    /// Fails if the positive half of the spectrum cannot hold at least two
    /// bands, since no bit could be derived from a single band.
    pub fn new(frame_length: usize, band_width: usize) -> Result<Self, FingerprintError> {
        if band_width == 0 {
            return Err(FingerprintError::InvalidConfig("band width must be positive".into()));
        }
        let bins = frame_length / 2;
        if bins <= band_width {
            return Err(FingerprintError::SpectrumTooNarrow { bins, band_width });
        }

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(frame_length);

        Ok(Self {
            frame_length,
            band_width,
            window: hann_window(frame_length).into(),
            fft,
        })
    }

    /// Frame length in samples.
    pub fn frame_length(&self) -> usize {
        self.frame_length
    }

    /// Number of retained spectrum bins (positive frequencies, below Nyquist).
    pub fn num_bins(&self) -> usize {
        self.frame_length / 2
    }

    /// Number of bands per frame. The last band may be narrower.
    pub fn num_bands(&self) -> usize {
        self.num_bins().div_ceil(self.band_width)
    }

    /// Bits contributed by each frame after the reference frame.
    pub fn bits_per_frame(&self) -> usize {
        self.num_bands() - 1
    }

    /// Magnitude spectrum of a Hann-windowed frame, positive half only.
    ///
    /// `frame` must hold exactly `frame_length` samples.
    pub fn spectrum(&self, frame: &[f32]) -> Vec<f64> {
        debug_assert_eq!(frame.len(), self.frame_length);

        let mut buf: Vec<Complex<f64>> = frame
            .iter()
            .zip(self.window.iter())
            .map(|(&s, &w)| Complex::new(s as f64 * w, 0.0))
            .collect();
        self.fft.process(&mut buf);

        buf.iter().take(self.num_bins()).map(|c| c.norm()).collect()
    }

    /// Band energies of a frame: sum of squared magnitudes per band.
    pub fn band_energies(&self, frame: &[f32]) -> EnergyVector {
        let spectrum = self.spectrum(frame);
        let energies = spectrum
            .chunks(self.band_width)
            .map(|band| band.iter().map(|m| m * m).sum())
            .collect();
        EnergyVector(energies)
    }
}

impl fmt::Debug for FramePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FramePlan")
            .field("frame_length", &self.frame_length)
            .field("band_width", &self.band_width)
            .finish()
    }
}

/// Periodic Hann window.
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}
