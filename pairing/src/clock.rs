//! Clock-sync precondition.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

/// Default tolerance between the local clock and the reference: one second.
pub const DEFAULT_TOLERANCE_MS: i64 = 1000;

/// Reports whether the local clock is close enough to a reference time
/// for both peers' captures to start together.
#[async_trait]
pub trait ClockSync: Send + Sync {
    async fn in_sync(&self) -> bool;
}

/// A clock that always reports in sync.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysInSync;

#[async_trait]
impl ClockSync for AlwaysInSync {
    async fn in_sync(&self) -> bool {
        true
    }
}

/// A clock with a known offset from the reference, e.g. measured once
/// against a time server.
#[derive(Debug, Clone, Copy)]
pub struct FixedOffset {
    pub offset_ms: i64,
    pub tolerance_ms: i64,
}

impl FixedOffset {
    pub fn new(offset_ms: i64) -> Self {
        Self {
            offset_ms,
            tolerance_ms: DEFAULT_TOLERANCE_MS,
        }
    }
}

#[async_trait]
impl ClockSync for FixedOffset {
    async fn in_sync(&self) -> bool {
        self.offset_ms.abs() <= self.tolerance_ms
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_offset_tolerance() {
        assert!(FixedOffset::new(0).in_sync().await);
        assert!(FixedOffset::new(-1000).in_sync().await);
        assert!(!FixedOffset::new(1001).in_sync().await);
        let strict = FixedOffset {
            offset_ms: 50,
            tolerance_ms: 10,
        };
        assert!(!strict.in_sync().await);
        assert!(AlwaysInSync.in_sync().await);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_ms() > 1_577_836_800_000);
    }
}
