use std::fmt::Display;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::log::LogManager;

/// Bounded retry with exponential backoff. One attempt means no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Runs `op` until it succeeds or the attempts are spent, returning the last error.
    pub fn run<T, E, F>(&self, label: &str, logger: &LogManager, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let attempts = self.attempts.max(1);
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts => {
                    logger.warn(&format!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        label, attempt, attempts, err, delay
                    ));
                    thread::sleep(delay);
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retries_until_success() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let logger = LogManager::new("test");
        let mut calls = 0;
        let result: Result<u32, String> = policy.run("op", &logger, || {
            calls += 1;
            if calls < 3 {
                Err(format!("transient {}", calls))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[test]
    fn gives_up_after_last_attempt() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let logger = LogManager::new("test");
        let mut calls = 0;
        let result: Result<(), String> = policy.run("op", &logger, || {
            calls += 1;
            Err(format!("failure {}", calls))
        });
        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls, 2);
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        assert_eq!(policy.attempts, 1);
        let logger = LogManager::default();
        let mut calls = 0;
        let _: Result<(), &str> = policy.run("op", &logger, || {
            calls += 1;
            Err("nope")
        });
        assert_eq!(calls, 1);
    }
}
