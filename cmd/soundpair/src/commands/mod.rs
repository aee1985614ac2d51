//! CLI commands module.

mod config;
mod distance;
mod fingerprint;
mod pair;
mod util;

pub use config::ConfigCommand;
pub use distance::DistanceCommand;
pub use fingerprint::FingerprintCommand;
pub use pair::PairCommand;

pub(crate) use util::*;
