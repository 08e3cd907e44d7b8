use std::{fmt::Display, future::Future, time::Duration};

/// Bounded exponential backoff: the wait after the n-th failed attempt is
/// `multiplier * 2^(n-1)` seconds, clamped to `[min_delay, max_delay]`.
#[derive(Debug, Clone)]
pub struct Backoff {
    pub max_attempts: u32,
    pub multiplier: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            multiplier: 1,
            min_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// No waiting between attempts
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            multiplier: 0,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = 2u64.saturating_pow(attempt.saturating_sub(1));
        let secs = u64::from(self.multiplier).saturating_mul(exp);
        Duration::from_secs(secs).clamp(self.min_delay, self.max_delay)
    }

    /// Runs `op` until it succeeds, fails with an error `is_transient` rejects,
    /// or `max_attempts` is exhausted. The last error is returned.
    pub async fn retry<T, E, F, Fut>(
        &self,
        operation: &str,
        mut op: F,
        is_transient: impl Fn(&E) -> bool,
    ) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let delay = self.delay_after(attempt);
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_secs = delay.as_secs_f64(),
                        "{operation} failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
