//! Protocol messages.
//!
//! Every step of the handshake is one [`Request`] answered by one
//! [`Response`]. Both serialize as internally tagged JSON:
//!
//! ```json
//! {"type":"connection","device_id":"alice"}
//! {"type":"agreement","blob":{"hash":"9f2c...","delta":[17,1003,...]}}
//! ```

use serde::{Deserialize, Serialize};
use soundpair_fuzzy::CommitmentBlob;

/// Requester to acceptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Asks the acceptor to pair with `device_id`.
    Connection { device_id: String },

    /// Both peers capture from `start_time_ms` (milliseconds since epoch).
    Recording { start_time_ms: i64 },

    /// The requester's public commitment.
    Agreement { blob: CommitmentBlob },

    /// Asks for a messaging handle once agreement succeeded.
    OpenChannel,

    /// An application message sealed under the shared key.
    Message {
        handle: u64,
        #[serde(with = "hex_bytes")]
        nonce: Vec<u8>,
        #[serde(with = "hex_bytes")]
        ciphertext: Vec<u8>,
    },
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Connection { .. } => "connection",
            Request::Recording { .. } => "recording",
            Request::Agreement { .. } => "agreement",
            Request::OpenChannel => "open_channel",
            Request::Message { .. } => "message",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Acceptor to requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Connection { accepted: bool },
    Recording { success: bool },
    Agreement { accepted: bool },
    ChannelGranted { handle: u64 },
    MessageAck { accepted: bool },
    /// The request was not valid in the acceptor's current state.
    Rejected { reason: String },
}

impl Response {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Response::Rejected {
            reason: reason.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}
