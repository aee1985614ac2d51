//! Pairing session states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// State of one side of a pairing session.
///
/// ```text
/// Init -> Connecting -> Recording -> Agreeing -> Established
///             |             |            |
///           Denied   RecordingFailed  AgreementFailed
/// ```
///
/// Terminal states are final; a new session starts again from `Init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PairingState {
    #[default]
    Init,
    Connecting,
    Recording,
    Agreeing,
    Established,
    Denied,
    RecordingFailed,
    AgreementFailed,
}

impl PairingState {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PairingState::Established
                | PairingState::Denied
                | PairingState::RecordingFailed
                | PairingState::AgreementFailed
        )
    }

    /// Returns true for the three failure exits.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            PairingState::Denied | PairingState::RecordingFailed | PairingState::AgreementFailed
        )
    }

    /// The failure exit taken when the current step fails.
    pub fn failure(&self) -> Option<PairingState> {
        match self {
            PairingState::Init | PairingState::Connecting => Some(PairingState::Denied),
            PairingState::Recording => Some(PairingState::RecordingFailed),
            PairingState::Agreeing => Some(PairingState::AgreementFailed),
            _ => None,
        }
    }

    /// Returns true if `next` directly follows this state.
    pub fn can_advance_to(&self, next: PairingState) -> bool {
        use PairingState::*;
        matches!(
            (self, next),
            (Init, Connecting)
                | (Init, Denied)
                | (Connecting, Recording)
                | (Connecting, Denied)
                | (Recording, Agreeing)
                | (Recording, RecordingFailed)
                | (Agreeing, Established)
                | (Agreeing, AgreementFailed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PairingState::Init => "init",
            PairingState::Connecting => "connecting",
            PairingState::Recording => "recording",
            PairingState::Agreeing => "agreeing",
            PairingState::Established => "established",
            PairingState::Denied => "denied",
            PairingState::RecordingFailed => "recording_failed",
            PairingState::AgreementFailed => "agreement_failed",
        }
    }
}

impl fmt::Display for PairingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PairingState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "init" => PairingState::Init,
            "connecting" => PairingState::Connecting,
            "recording" => PairingState::Recording,
            "agreeing" => PairingState::Agreeing,
            "established" => PairingState::Established,
            "denied" => PairingState::Denied,
            "recording_failed" => PairingState::RecordingFailed,
            "agreement_failed" => PairingState::AgreementFailed,
            other => return Err(format!("unknown pairing state {other:?}")),
        })
    }
}

impl Serialize for PairingState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PairingState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
