use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;
use crate::metrics::RATE_GATE_WAIT;

// Free tier allows 5 calls per minute
pub const RATE_LIMIT_MS: u64 = 12_500;

/// Enforces a minimum spacing between the issue instants of upstream calls.
///
/// The whole read-wait-write sequence runs with the lock held, so concurrent
/// callers are let through one at a time, each at least `interval` after the
/// previous one. Order among waiters is whatever the mutex hands out.
pub struct RateGate {
    interval: Duration,
    // None until the first call goes through, so that call is never delayed
    last_issued: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_issued: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    // Suspend the caller until it may issue its request, then stamp the issue time
    pub async fn wait_turn(&self) {
        let mut last = self.last_issued.lock().await;

        let mut waited = Duration::ZERO;
        if let Some(prev) = *last {
            let elapsed = Instant::now().saturating_duration_since(prev);
            if elapsed < self.interval {
                waited = self.interval - elapsed;
                debug!(wait_ms = waited.as_millis() as u64, "rate gate delaying upstream call");
                sleep(waited).await;
            }
        }
        RATE_GATE_WAIT.observe(waited.as_secs_f64());

        *last = Some(Instant::now());
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(RATE_LIMIT_MS))
    }
}
