//! Call pacing against the platform's rate limit.
//!
//! Consecutive calls of the same class start at least one interval apart.
//! A rate-limited response is retried with backoff; every other failure is
//! returned to the caller untouched.

use crate::config::PacingConfig;
use crate::remote::RemoteError;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::time::{self, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallClass {
    Database,
    Record,
}

impl CallClass {
    pub fn as_str(self) -> &'static str {
        match self {
            CallClass::Database => "database",
            CallClass::Record => "record",
        }
    }
}

#[derive(Debug)]
pub struct Pacer {
    database_interval: Duration,
    record_interval: Duration,
    max_retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    last_start: HashMap<CallClass, Instant>,
}

impl Pacer {
    pub fn new(config: &PacingConfig) -> Self {
        Self {
            database_interval: Duration::from_millis(config.database_interval_ms),
            record_interval: Duration::from_millis(config.record_interval_ms),
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            last_start: HashMap::new(),
        }
    }

    fn interval(&self, class: CallClass) -> Duration {
        match class {
            CallClass::Database => self.database_interval,
            CallClass::Record => self.record_interval,
        }
    }

    /// Suspend until a call of `class` may start, then mark it started.
    pub async fn wait(&mut self, class: CallClass) {
        if let Some(last) = self.last_start.get(&class) {
            let ready = *last + self.interval(class);
            if ready > Instant::now() {
                tracing::debug!(class = class.as_str(), "pacing");
                time::sleep_until(ready).await;
            }
        }
        self.last_start.insert(class, Instant::now());
    }

    /// Delay before retry number `attempt + 1`.
    pub fn backoff_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(d) = retry_after {
            return d;
        }
        let factor = 2u32.saturating_pow(attempt);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    /// Run `op` under pacing, retrying rate-limited responses.
    pub async fn call<T, F, Fut>(&mut self, class: CallClass, mut op: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0;
        loop {
            self.wait(class).await;
            match op().await {
                Err(RemoteError::RateLimited { retry_after }) if attempt < self.max_retries => {
                    let delay = self.backoff_delay(attempt, retry_after);
                    tracing::debug!(
                        class = class.as_str(),
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
