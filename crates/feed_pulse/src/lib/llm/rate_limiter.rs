use std::{sync::Mutex, time::Duration};

use tokio::time::Instant;

/// Enforces a minimum spacing between dispatches, shared by every caller
/// holding a reference to the same limiter.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Gemini free tier allows roughly one request per minute
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(65);

    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Waits until a dispatch is allowed and records it.
    ///
    /// The slot is reserved before sleeping so the lock is never held across
    /// an await point.
    pub async fn acquire(&self) {
        let wait = {
            let mut last = self
                .last_dispatch
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let now = Instant::now();
            let dispatch_at = match *last {
                Some(previous) => (previous + self.min_interval).max(now),
                None => now,
            };
            *last = Some(dispatch_at);
            dispatch_at - now
        };

        if !wait.is_zero() {
            tracing::info!(
                wait_secs = wait.as_secs_f64(),
                "Waiting to respect the model rate limit"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_INTERVAL)
    }
}
