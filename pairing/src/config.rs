//! Per-session configuration.
//!
//! A [`SessionConfig`] is immutable once a session starts and both peers
//! must use identical values. It is usually loaded from YAML:
//!
//! ```yaml
//! code:
//!   n: 512
//!   m: 152
//!   symsize: 10
//! lead_time_ms: 3000
//! capture_duration_ms: 7000
//! check_clock: false
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use soundpair_fingerprint::{CandidateGenerator, Extractor, FingerprintConfig};
use soundpair_fuzzy::{CodeParams, FuzzyCommitment};

use crate::PairingError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Reed-Solomon dimensions (default: n=512, m=152, symsize=10).
    pub code: CodeParams,

    /// Delay between connection acceptance and capture start (default: 3000).
    pub lead_time_ms: u64,

    /// Capture length on both peers (default: 7000).
    pub capture_duration_ms: u64,

    /// Require the clock-sync precondition on both peers (default: false).
    pub check_clock: bool,

    /// Shift magnitudes tried by the acceptor, including zero (default: 176).
    pub candidate_shifts: usize,

    /// Samples per shift step (default: 100).
    pub shift_step: usize,

    /// Candidate search threads; 0 means one per CPU (default: 0).
    pub max_workers: usize,

    /// Fingerprint extraction parameters.
    pub fingerprint: FingerprintConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            code: CodeParams::default(),
            lead_time_ms: 3000,
            capture_duration_ms: 7000,
            check_clock: false,
            candidate_shifts: soundpair_fingerprint::DEFAULT_SHIFTS,
            shift_step: soundpair_fingerprint::DEFAULT_STEP,
            max_workers: 0,
            fingerprint: FingerprintConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parses a YAML document; missing fields take their defaults.
    pub fn from_yaml(s: &str) -> Result<Self, PairingError> {
        let cfg: Self =
            serde_yaml::from_str(s).map_err(|e| PairingError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PairingError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|e| {
            PairingError::InvalidConfig(format!("read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&data)
    }

    pub fn to_yaml(&self) -> Result<String, PairingError> {
        serde_yaml::to_string(self).map_err(|e| PairingError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), PairingError> {
        self.code.validate()?;
        self.fingerprint.validate()?;
        if self.fingerprint.bits != self.code.n {
            return Err(PairingError::InvalidConfig(format!(
                "fingerprint bits ({}) must equal codeword length ({})",
                self.fingerprint.bits, self.code.n
            )));
        }
        if self.code.n < soundpair_fuzzy::KEY_LEN {
            return Err(PairingError::InvalidConfig(format!(
                "codeword length {} is shorter than the {}-byte key",
                self.code.n,
                soundpair_fuzzy::KEY_LEN
            )));
        }
        if self.capture_duration_ms == 0 {
            return Err(PairingError::InvalidConfig("capture duration must be positive".into()));
        }
        if self.candidate_shifts == 0 {
            return Err(PairingError::InvalidConfig("candidate_shifts must be positive".into()));
        }
        if self.shift_step == 0 && self.candidate_shifts > 1 {
            return Err(PairingError::InvalidConfig("shift_step must be positive".into()));
        }
        Ok(())
    }

    pub fn lead_time(&self) -> Duration {
        Duration::from_millis(self.lead_time_ms)
    }

    pub fn capture_duration(&self) -> Duration {
        Duration::from_millis(self.capture_duration_ms)
    }

    pub fn extractor(&self) -> Result<Extractor, PairingError> {
        Ok(Extractor::new(self.fingerprint.clone())?)
    }

    pub fn candidate_generator(&self) -> Result<CandidateGenerator, PairingError> {
        Ok(CandidateGenerator::new(
            self.extractor()?,
            self.candidate_shifts,
            self.shift_step,
        )?)
    }

    pub fn commitment(&self) -> Result<FuzzyCommitment, PairingError> {
        Ok(FuzzyCommitment::new(self.code)?)
    }
}
