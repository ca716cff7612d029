use std::thread;
use std::time::{Duration, Instant};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bounded retry with linear backoff. Knows nothing about what is being fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub jitter_ms: u64,
    /// An attempt that takes longer than this counts as failed even if it returned data.
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_ms: 1_000,
            jitter_ms: 250,
            attempt_timeout_ms: 15_000,
        }
    }
}

#[derive(Debug)]
pub struct Attempted<T, E> {
    /// Last value an attempt produced, complete or not.
    pub value: Option<T>,
    pub complete: bool,
    pub attempts: u32,
    pub last_error: Option<E>,
    /// Set when an error hit the `gives_up` predicate and retries were cut short.
    pub aborted: bool,
}

impl RetryPolicy {
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff_ms: 0,
            jitter_ms: 0,
            ..Self::default()
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calls `attempt(n)` (1-based) until `is_complete` holds or attempts run out.
    /// An error for which `gives_up` holds ends the loop at once.
    /// `before_retry(n)` runs ahead of attempt `n` for every `n > 1`.
    pub fn run<T, E>(
        &self,
        mut attempt: impl FnMut(u32) -> Result<T, E>,
        is_complete: impl Fn(&T) -> bool,
        gives_up: impl Fn(&E) -> bool,
        mut before_retry: impl FnMut(u32),
    ) -> Attempted<T, E> {
        let mut out = Attempted {
            value: None,
            complete: false,
            attempts: 0,
            last_error: None,
            aborted: false,
        };
        let limit = Duration::from_millis(self.attempt_timeout_ms);

        for n in 1..=self.max_attempts() {
            if n > 1 {
                before_retry(n);
                self.pause(n - 1);
            }
            out.attempts = n;
            let started = Instant::now();
            let result = attempt(n);
            let late = self.attempt_timeout_ms > 0 && started.elapsed() > limit;
            match result {
                Ok(_) if late => {
                    debug!(attempt = n, "attempt overran its time budget");
                }
                Ok(value) => {
                    let done = is_complete(&value);
                    out.value = Some(value);
                    if done {
                        out.complete = true;
                        return out;
                    }
                }
                Err(err) => {
                    let stop = gives_up(&err);
                    out.last_error = Some(err);
                    if stop {
                        out.aborted = true;
                        return out;
                    }
                }
            }
        }
        out
    }

    fn pause(&self, retry: u32) {
        let base = self.backoff_ms.saturating_mul(u64::from(retry));
        let jitter = if self.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.jitter_ms)
        } else {
            0
        };
        let wait = base.saturating_add(jitter);
        if wait > 0 {
            thread::sleep(Duration::from_millis(wait));
        }
    }
}
