//! Pacing between item cycles

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::Instant;

/// Decides when the next item cycle may start
#[async_trait]
pub trait RateLimiter: Send {
    /// Waits until another cycle is allowed, then claims it
    async fn acquire(&mut self);
}

/// Enforces a minimum spacing between the starts of consecutive cycles
///
/// The first acquire returns immediately.
#[derive(Debug, Clone)]
pub struct MinIntervalGate {
    interval: Duration,
    last_start: Option<Instant>,
}

impl MinIntervalGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: None,
        }
    }

    /// Time left before the gate opens, or `None` if it is open at `now`
    pub fn time_until_open(&self, now: Instant) -> Option<Duration> {
        let last = self.last_start?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.interval {
            Some(self.interval - elapsed)
        } else {
            None
        }
    }
}

#[async_trait]
impl RateLimiter for MinIntervalGate {
    async fn acquire(&mut self) {
        if let Some(wait) = self.time_until_open(Instant::now()) {
            tracing::trace!("Rate limit: waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.last_start = Some(Instant::now());
    }
}
