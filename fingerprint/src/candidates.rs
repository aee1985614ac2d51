//! Time-shifted fingerprint candidates.
//!
//! Two devices never start recording at exactly the same instant. The
//! responder therefore re-extracts its fingerprint from copies of the
//! recording shifted left and right in fixed steps, ordered from the nearest
//! alignment outward:
//!
//! ```text
//! index: 0     1      2      3      4      ...  2k-1   2k
//! shift: none  L(1)   R(1)   L(2)   R(2)   ...  L(k)   R(k)
//! ```
//!
//! `L(i)` moves the buffer `i * step` samples towards the start, `R(i)`
//! towards the end; vacated samples are zero.

use std::fmt;

use rayon::prelude::*;

use crate::spectrum::FramePlan;
use crate::{AudioSignal, Extractor, Fingerprint, FingerprintError};

/// Default number of shift magnitudes (including zero): about 0.4 s at 44.1 kHz.
pub const DEFAULT_SHIFTS: usize = 176;

/// Default shift step in samples.
pub const DEFAULT_STEP: usize = 100;

/// Direction and amount a candidate's samples were moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    None,
    Left(usize),
    Right(usize),
}

impl Shift {
    /// Signed sample offset: negative for left shifts.
    pub fn offset(&self) -> isize {
        match *self {
            Shift::None => 0,
            Shift::Left(n) => -(n as isize),
            Shift::Right(n) => n as isize,
        }
    }

    /// Absolute number of samples moved.
    pub fn magnitude(&self) -> usize {
        self.offset().unsigned_abs()
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shift::None => write!(f, "none"),
            Shift::Left(n) => write!(f, "left {n}"),
            Shift::Right(n) => write!(f, "right {n}"),
        }
    }
}

/// A shifted fingerprint and the shift that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub shift: Shift,
    pub fingerprint: Fingerprint,
}

/// Produces the ordered family of shifted fingerprints for one recording.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    extractor: Extractor,
    shifts: usize,
    step: usize,
}

impl CandidateGenerator {
    /// Creates a generator over `shifts` shift magnitudes (0 through
    /// `shifts - 1` steps) of `step` samples each.
    pub fn new(extractor: Extractor, shifts: usize, step: usize) -> Result<Self, FingerprintError> {
        if shifts == 0 {
            return Err(FingerprintError::InvalidConfig("shifts must be positive".into()));
        }
        if step == 0 && shifts > 1 {
            return Err(FingerprintError::InvalidConfig("shift step must be positive".into()));
        }
        Ok(Self {
            extractor,
            shifts,
            step,
        })
    }

    /// A generator with the default 176 shifts of 100 samples.
    pub fn with_defaults(extractor: Extractor) -> Self {
        Self {
            extractor,
            shifts: DEFAULT_SHIFTS,
            step: DEFAULT_STEP,
        }
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Number of candidates: `2 * (shifts - 1) + 1`.
    pub fn count(&self) -> usize {
        2 * (self.shifts - 1) + 1
    }

    /// The shift applied to the candidate at `index` in priority order.
    pub fn shift_at(&self, index: usize) -> Shift {
        if index == 0 {
            Shift::None
        } else if index % 2 == 1 {
            Shift::Left(index.div_ceil(2) * self.step)
        } else {
            Shift::Right(index / 2 * self.step)
        }
    }

    /// Extracts the candidate at `index` with a prepared plan.
    pub fn candidate(
        &self,
        plan: &FramePlan,
        signal: &AudioSignal,
        index: usize,
    ) -> Result<Candidate, FingerprintError> {
        let shift = self.shift_at(index);
        let fingerprint = match shift {
            Shift::None => self.extractor.extract_with(plan, signal.samples())?,
            Shift::Left(n) => self.extractor.extract_with(plan, &signal.shifted_left(n))?,
            Shift::Right(n) => self.extractor.extract_with(plan, &signal.shifted_right(n))?,
        };
        Ok(Candidate { shift, fingerprint })
    }

    /// Generates every candidate in priority order.
    ///
    /// Extraction runs on the current rayon pool; the output order is the
    /// documented priority order regardless of scheduling.
    pub fn generate(&self, signal: &AudioSignal) -> Result<Vec<Candidate>, FingerprintError> {
        let plan = self.extractor.plan(signal.sample_rate())?;
        (0..self.count())
            .into_par_iter()
            .map(|index| self.candidate(&plan, signal, index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FingerprintConfig;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn small_extractor() -> Extractor {
        // 8 kHz, 0.1 s frames -> 800 samples, 400 bins, 4 bands of 100 -> 3 bits/frame.
        Extractor::new(FingerprintConfig {
            frame_seconds: 0.1,
            band_width: 100,
            bits: 30,
        })
        .unwrap()
    }

    fn noise_signal(seconds: usize, rate: u32, seed: u64) -> AudioSignal {
        let mut rng = StdRng::seed_from_u64(seed);
        let samples = (0..seconds * rate as usize)
            .map(|_| rng.gen_range(-1.0f32..1.0))
            .collect();
        AudioSignal::new(samples, rate).unwrap()
    }

    #[test]
    fn default_count_is_351() {
        let generator = CandidateGenerator::with_defaults(small_extractor());
        assert_eq!(generator.count(), 351);
        assert_eq!(generator.shift_at(349), Shift::Left(17500));
        assert_eq!(generator.shift_at(350), Shift::Right(17500));
    }

    #[test]
    fn shift_order() {
        let generator = CandidateGenerator::new(small_extractor(), 4, 100).unwrap();
        let shifts: Vec<Shift> = (0..generator.count()).map(|i| generator.shift_at(i)).collect();
        assert_eq!(
            shifts,
            vec![
                Shift::None,
                Shift::Left(100),
                Shift::Right(100),
                Shift::Left(200),
                Shift::Right(200),
                Shift::Left(300),
                Shift::Right(300),
            ]
        );
    }

    #[test]
    fn shift_offsets() {
        assert_eq!(Shift::Left(300).offset(), -300);
        assert_eq!(Shift::Right(300).offset(), 300);
        assert_eq!(Shift::Left(300).magnitude(), 300);
        assert_eq!(Shift::None.to_string(), "none");
    }

    #[test]
    fn rejects_zero_shifts() {
        assert!(CandidateGenerator::new(small_extractor(), 0, 100).is_err());
        assert!(CandidateGenerator::new(small_extractor(), 3, 0).is_err());
        assert!(CandidateGenerator::new(small_extractor(), 1, 0).is_ok());
    }

    #[test]
    fn generate_matches_manual_extraction() {
        let ex = small_extractor();
        let generator = CandidateGenerator::new(ex.clone(), 6, 100).unwrap();
        let signal = noise_signal(2, 8000, 11);

        let candidates = generator.generate(&signal).unwrap();
        assert_eq!(candidates.len(), 11);
        assert_eq!(candidates[0].fingerprint, ex.extract(&signal).unwrap());

        let left2 = AudioSignal::new(signal.shifted_left(200), 8000).unwrap();
        assert_eq!(candidates[3].shift, Shift::Left(200));
        assert_eq!(candidates[3].fingerprint, ex.extract(&left2).unwrap());

        let right5 = AudioSignal::new(signal.shifted_right(500), 8000).unwrap();
        assert_eq!(candidates[10].shift, Shift::Right(500));
        assert_eq!(candidates[10].fingerprint, ex.extract(&right5).unwrap());

        assert!(candidates.iter().all(|c| c.fingerprint.len() == 30));
    }

    #[test]
    fn default_generator_yields_351_fingerprints() {
        let ex = Extractor::new(FingerprintConfig::default()).unwrap();
        let generator = CandidateGenerator::with_defaults(ex);
        let signal = noise_signal(7, 44100, 12);
        let candidates = generator.generate(&signal).unwrap();
        assert_eq!(candidates.len(), 351);
        assert!(candidates.iter().all(|c| c.fingerprint.len() == 512));
        for (i, c) in candidates.iter().enumerate() {
            assert_eq!(c.shift, generator.shift_at(i));
        }
    }

    #[test]
    fn generate_propagates_short_input() {
        let generator = CandidateGenerator::new(small_extractor(), 3, 100).unwrap();
        let signal = noise_signal(1, 8000, 13);
        // 30 bits need 11 frames of 800 samples; one second holds 10.
        assert!(matches!(
            generator.generate(&signal),
            Err(FingerprintError::InsufficientData { .. })
        ));
    }
}
