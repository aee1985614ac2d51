//! Two-party acoustic pairing.
//!
//! Two devices record the same ambient sound and turn the noisy but highly
//! correlated recordings into an identical 32-byte key:
//!
//! ```text
//! Requester                                  Acceptor
//!   Connection { device_id }            ->   allow-list, clock check
//!   Recording { start_time_ms }         ->   both capture from start_time
//!   Agreement { blob }                  ->   candidate search + decommit
//!   OpenChannel                         ->   ChannelGranted { handle }
//!   Message { handle, nonce, ... }      ->   decrypted into the inbox
//! ```
//!
//! - [`Requester`] and [`Acceptor`] drive each side of the [`PairingState`] machine
//! - [`RequesterConn`] / [`AcceptorConn`] abstract the transport; [`new_pipe`]
//!   connects both sides in memory
//! - [`AudioSource`] and [`ClockSync`] are the capture and time collaborators
//! - [`SessionConfig`] holds every per-session parameter
//!
//! # Example
//!
//! ```rust
//! use soundpair_pairing::{PairingState, SessionConfig};
//!
//! let cfg = SessionConfig::default();
//! assert_eq!(cfg.code.capacity(), 180);
//! assert!(PairingState::Agreeing.can_advance_to(PairingState::Established));
//! ```

mod acceptor;
pub mod audio;
mod channel;
pub mod clock;
mod config;
mod conn;
pub mod conn_pipe;
mod error;
pub mod logger;
mod message;
mod requester;
pub mod search;
mod state;

pub use acceptor::Acceptor;
pub use audio::{AudioSource, CaptureError, FailingSource, StaticSource};
pub use channel::{NONCE_LEN, SecureChannel};
pub use clock::{AlwaysInSync, ClockSync, FixedOffset};
pub use config::SessionConfig;
pub use conn::*;
pub use conn_pipe::new_pipe;
pub use error::PairingError;
pub use message::{Request, Response};
pub use requester::{Established, Requester};
pub use search::Reconciliation;
pub use state::PairingState;
