use serde::{Deserialize, Serialize};

use crate::spectrum::{EnergyVector, FramePlan};
use crate::{AudioSignal, Fingerprint, FingerprintError};

/// Configures energy-difference fingerprint extraction.
///
/// Defaults follow Haitsma & Kalker as used for pairing: 0.37 s
/// non-overlapping frames, 250-bin bands, 512-bit fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Frame duration in seconds (default: 0.37).
    pub frame_seconds: f64,
    /// Width of one frequency band in spectrum bins (default: 250).
    pub band_width: usize,
    /// Bits kept in a fingerprint (default: 512).
    pub bits: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            frame_seconds: 0.37,
            band_width: 250,
            bits: 512,
        }
    }
}

impl FingerprintConfig {
    /// Frame length in samples at the given sample rate.
    pub fn frame_length(&self, sample_rate: u32) -> usize {
        (self.frame_seconds * sample_rate as f64) as usize
    }

    pub fn validate(&self) -> Result<(), FingerprintError> {
        if !(self.frame_seconds.is_finite() && self.frame_seconds > 0.0) {
            return Err(FingerprintError::InvalidConfig(format!(
                "frame_seconds must be positive, got {}",
                self.frame_seconds
            )));
        }
        if self.band_width == 0 {
            return Err(FingerprintError::InvalidConfig("band_width must be positive".into()));
        }
        if self.bits == 0 {
            return Err(FingerprintError::InvalidConfig("bits must be positive".into()));
        }
        Ok(())
    }
}

/// Turns mono audio into energy-difference fingerprints.
///
/// # Algorithm
///
/// 1. Split the signal into non-overlapping frames of `frame_seconds`.
/// 2. Hann-window each frame and take the magnitude FFT (positive half).
/// 3. Sum squared magnitudes over bands of `band_width` bins.
/// 4. For frame `n >= 1` and band `m < bands - 1` emit
///    `(E[n][m] - E[n][m+1]) - (E[n-1][m] - E[n-1][m+1]) > 0`.
///
/// Frame 0 only serves as reference. The computation is deterministic:
/// identical input yields bit-identical output.
#[derive(Debug, Clone)]
pub struct Extractor {
    cfg: FingerprintConfig,
}

impl Extractor {
    pub fn new(cfg: FingerprintConfig) -> Result<Self, FingerprintError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    pub fn config(&self) -> &FingerprintConfig {
        &self.cfg
    }

    /// Builds the frame plan for a sample rate.
    pub fn plan(&self, sample_rate: u32) -> Result<FramePlan, FingerprintError> {
        if sample_rate == 0 {
            return Err(FingerprintError::InvalidSampleRate(sample_rate));
        }
        FramePlan::new(self.cfg.frame_length(sample_rate), self.cfg.band_width)
    }

    /// Minimum number of samples for a full-length fingerprint under `plan`.
    pub fn required_samples(&self, plan: &FramePlan) -> usize {
        let frames = 1 + self.cfg.bits.div_ceil(plan.bits_per_frame());
        frames * plan.frame_length()
    }

    /// Extracts a fingerprint of exactly `bits` bits.
    pub fn extract(&self, signal: &AudioSignal) -> Result<Fingerprint, FingerprintError> {
        let plan = self.plan(signal.sample_rate())?;
        self.extract_with(&plan, signal.samples())
    }

    /// Extracts a fingerprint of exactly `bits` bits using a prepared plan.
    ///
    /// Only the frames needed for `bits` bits are analyzed.
    pub fn extract_with(
        &self,
        plan: &FramePlan,
        samples: &[f32],
    ) -> Result<Fingerprint, FingerprintError> {
        let needed = self.required_samples(plan);
        if samples.len() < needed {
            return Err(FingerprintError::InsufficientData {
                needed,
                got: samples.len(),
            });
        }
        let frames = needed / plan.frame_length();
        Ok(energy_difference_bits(plan, samples, frames).truncated(self.cfg.bits))
    }

    /// Extracts every bit the signal supports, without truncation.
    pub fn all_bits(&self, signal: &AudioSignal) -> Result<Fingerprint, FingerprintError> {
        let plan = self.plan(signal.sample_rate())?;
        let frames = signal.len() / plan.frame_length();
        if frames < 2 {
            return Err(FingerprintError::InsufficientData {
                needed: 2 * plan.frame_length(),
                got: signal.len(),
            });
        }
        Ok(energy_difference_bits(&plan, signal.samples(), frames))
    }
}

/// Band energies for the first `frames` frames of `samples`.
pub fn frame_energies(plan: &FramePlan, samples: &[f32], frames: usize) -> Vec<EnergyVector> {
    samples
        .chunks_exact(plan.frame_length())
        .take(frames)
        .map(|frame| plan.band_energies(frame))
        .collect()
}

fn energy_difference_bits(plan: &FramePlan, samples: &[f32], frames: usize) -> Fingerprint {
    let energies = frame_energies(plan, samples, frames);
    let mut bits = Vec::with_capacity(frames.saturating_sub(1) * plan.bits_per_frame());

    for pair in energies.windows(2) {
        let (prev, cur) = (pair[0].bands(), pair[1].bands());
        for m in 0..cur.len() - 1 {
            let diff = (cur[m] - cur[m + 1]) - (prev[m] - prev[m + 1]);
            bits.push(diff > 0.0);
        }
    }
    Fingerprint::from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn noise(n: usize, seed: u64) -> Vec<f32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| rng.gen_range(-1.0f32..1.0)).collect()
    }

    #[test]
    fn config_default() {
        let cfg = FingerprintConfig::default();
        assert_eq!(cfg.frame_length(44100), 16317);
        assert_eq!(cfg.band_width, 250);
        assert_eq!(cfg.bits, 512);
    }

    #[test]
    fn config_validation() {
        let bad = FingerprintConfig {
            frame_seconds: 0.0,
            ..Default::default()
        };
        assert!(Extractor::new(bad).is_err());
        let bad = FingerprintConfig {
            bits: 0,
            ..Default::default()
        };
        assert!(Extractor::new(bad).is_err());
    }

    #[test]
    fn required_samples_at_44k() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let plan = ex.plan(44100).unwrap();
        // 32 bits per frame, 512 bits -> 16 frames + 1 reference frame.
        assert_eq!(ex.required_samples(&plan), 17 * 16317);
    }

    #[test]
    fn long_input_yields_exact_length() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let sig = AudioSignal::new(noise(7 * 44100, 1), 44100).unwrap();
        let fp = ex.extract(&sig).unwrap();
        assert_eq!(fp.len(), 512);
    }

    #[test]
    fn short_input_is_insufficient() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let sig = AudioSignal::new(noise(16 * 16317, 2), 44100).unwrap();
        let err = ex.extract(&sig).unwrap_err();
        assert_eq!(
            err,
            FingerprintError::InsufficientData {
                needed: 17 * 16317,
                got: 16 * 16317
            }
        );
    }

    #[test]
    fn extraction_is_deterministic() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let samples = noise(7 * 44100, 3);
        let a = ex.extract(&AudioSignal::new(samples.clone(), 44100).unwrap()).unwrap();
        let b = ex.extract(&AudioSignal::new(samples, 44100).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn all_bits_is_prefix_compatible() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let sig = AudioSignal::new(noise(7 * 44100, 4), 44100).unwrap();
        let full = ex.all_bits(&sig).unwrap();
        // 308700 / 16317 = 18 frames -> 17 * 32 bits.
        assert_eq!(full.len(), 17 * 32);
        assert_eq!(full.clone().truncated(512), ex.extract(&sig).unwrap());
    }

    #[test]
    fn bit_rule_on_handmade_energies() {
        // Three frames, three bands; band 0 goes quiet -> loud -> quiet.
        let n = 600;
        let plan = FramePlan::new(n, 100).unwrap();
        let tone = |amp: f64| -> Vec<f32> {
            (0..n)
                .map(|i| (amp * (2.0 * std::f64::consts::PI * 50.0 * i as f64 / n as f64).sin()) as f32)
                .collect()
        };
        let mut samples = tone(0.1);
        samples.extend(tone(1.0));
        samples.extend(tone(0.1));

        let fp = energy_difference_bits(&plan, &samples, 3);
        assert_eq!(plan.bits_per_frame(), 2);
        assert_eq!(fp.len(), 4);
        // Frame 1: band 0 rose relative to band 1.
        assert!(fp.bits()[0]);
        // Frame 2: band 0 fell relative to band 1.
        assert!(!fp.bits()[2]);
    }

    #[test]
    fn noisy_copy_is_close() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let clean = noise(7 * 44100, 5);
        let extra = noise(clean.len(), 6);
        let noisy: Vec<f32> = clean.iter().zip(&extra).map(|(c, e)| c + 0.05 * e).collect();

        let a = ex.extract(&AudioSignal::new(clean, 44100).unwrap()).unwrap();
        let b = ex.extract(&AudioSignal::new(noisy, 44100).unwrap()).unwrap();
        assert!(a.hamming_distance(&b) < 128, "distance {}", a.hamming_distance(&b));
    }

    #[test]
    fn unrelated_audio_is_far() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let a = ex.extract(&AudioSignal::new(noise(7 * 44100, 7), 44100).unwrap()).unwrap();
        let b = ex.extract(&AudioSignal::new(noise(7 * 44100, 8), 44100).unwrap()).unwrap();
        let d = a.hamming_distance(&b);
        assert!(d > 180, "independent noise should disagree on ~half the bits, got {d}");
    }
}
