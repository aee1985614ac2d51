//! Session logging.
//!
//! Requester and Acceptor log through an injected [`Logger`]. The default
//! forwards to `tracing` with the session role as a structured field; once
//! the acceptor knows its peer, [`for_peer`] prefixes every line with the
//! peer's device id.

use std::sync::Arc;

/// Sink for session log lines.
pub trait Logger: Send + Sync {
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Returns a `tracing` logger tagged with `role` ("requester", "acceptor").
pub fn default_logger(role: &'static str) -> Arc<dyn Logger> {
    Arc::new(TracingLogger { role })
}

/// Wraps `inner` so each line starts with `[peer] `.
pub fn for_peer(inner: Arc<dyn Logger>, peer: &str) -> Arc<dyn Logger> {
    Arc::new(PeerLogger {
        inner,
        prefix: format!("[{peer}] "),
    })
}

struct TracingLogger {
    role: &'static str,
}

impl Logger for TracingLogger {
    fn error(&self, msg: &str) {
        tracing::error!(target: "pairing", role = self.role, "{msg}");
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(target: "pairing", role = self.role, "{msg}");
    }

    fn info(&self, msg: &str) {
        tracing::info!(target: "pairing", role = self.role, "{msg}");
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(target: "pairing", role = self.role, "{msg}");
    }
}

struct PeerLogger {
    inner: Arc<dyn Logger>,
    prefix: String,
}

impl Logger for PeerLogger {
    fn error(&self, msg: &str) {
        self.inner.error(&format!("{}{msg}", self.prefix));
    }

    fn warn(&self, msg: &str) {
        self.inner.warn(&format!("{}{msg}", self.prefix));
    }

    fn info(&self, msg: &str) {
        self.inner.info(&format!("{}{msg}", self.prefix));
    }

    fn debug(&self, msg: &str) {
        self.inner.debug(&format!("{}{msg}", self.prefix));
    }
}

/// Discards everything.
pub struct NopLogger;

impl Logger for NopLogger {
    fn error(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => { $logger.error(&format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => { $logger.warn(&format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => { $logger.info(&format!($($arg)*)) };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => { $logger.debug(&format!($($arg)*)) };
}

/// Records messages by level, for asserting on session logs in tests.
#[cfg(test)]
pub(crate) struct CapturingLogger {
    messages: std::sync::Mutex<Vec<(&'static str, String)>>,
}

#[cfg(test)]
impl CapturingLogger {
    pub(crate) fn new() -> Self {
        Self {
            messages: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn messages(&self) -> Vec<(&'static str, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub(crate) fn contains(&self, level: &str, needle: &str) -> bool {
        self.messages()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }
}

#[cfg(test)]
impl Logger for CapturingLogger {
    fn error(&self, msg: &str) {
        self.messages.lock().unwrap().push(("error", msg.to_string()));
    }
    fn warn(&self, msg: &str) {
        self.messages.lock().unwrap().push(("warn", msg.to_string()));
    }
    fn info(&self, msg: &str) {
        self.messages.lock().unwrap().push(("info", msg.to_string()));
    }
    fn debug(&self, msg: &str) {
        self.messages.lock().unwrap().push(("debug", msg.to_string()));
    }
}
