//! Audio capture collaborators.

use std::time::Duration;

use async_trait::async_trait;
use soundpair_fingerprint::AudioSignal;

use crate::clock::now_ms;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CaptureError {
    #[error("audio device unavailable: {0}")]
    Unavailable(String),
    #[error("capture failed: {0}")]
    Failed(String),
}

/// A time-triggered mono recorder.
#[async_trait]
pub trait AudioSource: Send + Sync {
    /// Records `duration` of audio starting at `start_time_ms`
    /// (milliseconds since epoch).
    async fn capture(&self, start_time_ms: i64, duration: Duration) -> Result<AudioSignal, CaptureError>;
}

/// Plays back a preloaded recording, e.g. read from a WAV file.
///
/// Waits until the start time, then returns at most `duration` of the
/// signal.
#[derive(Debug, Clone)]
pub struct StaticSource {
    signal: AudioSignal,
}

impl StaticSource {
    pub fn new(signal: AudioSignal) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl AudioSource for StaticSource {
    async fn capture(&self, start_time_ms: i64, duration: Duration) -> Result<AudioSignal, CaptureError> {
        let wait = start_time_ms - now_ms();
        if wait > 0 {
            tokio::time::sleep(Duration::from_millis(wait as u64)).await;
        }

        let rate = self.signal.sample_rate();
        let wanted = (duration.as_secs_f64() * rate as f64) as usize;
        if wanted >= self.signal.len() {
            return Ok(self.signal.clone());
        }
        AudioSignal::new(self.signal.samples()[..wanted].to_vec(), rate)
            .map_err(|e| CaptureError::Failed(e.to_string()))
    }
}

/// A source whose every capture fails.
#[derive(Debug, Clone)]
pub struct FailingSource {
    reason: String,
}

impl FailingSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl AudioSource for FailingSource {
    async fn capture(&self, _start_time_ms: i64, _duration: Duration) -> Result<AudioSignal, CaptureError> {
        Err(CaptureError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_source_truncates_to_duration() {
        let signal = AudioSignal::new(vec![0.5; 8000], 4000).unwrap();
        let source = StaticSource::new(signal);
        let got = source.capture(0, Duration::from_millis(500)).await.unwrap();
        assert_eq!(got.len(), 2000);
        assert_eq!(got.sample_rate(), 4000);

        let all = source.capture(0, Duration::from_secs(5)).await.unwrap();
        assert_eq!(all.len(), 8000);
    }

    #[tokio::test]
    async fn static_source_waits_for_start() {
        let source = StaticSource::new(AudioSignal::new(vec![0.0; 10], 10).unwrap());
        let begin = std::time::Instant::now();
        source.capture(now_ms() + 200, Duration::from_secs(1)).await.unwrap();
        assert!(begin.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn failing_source() {
        let err = FailingSource::new("no microphone")
            .capture(0, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "audio device unavailable: no microphone");
    }
}
