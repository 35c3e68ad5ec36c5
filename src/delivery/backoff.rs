//! Delay strategies between delivery attempts.
//!
//! The retry loop only asks a [`DelayStrategy`] how long to wait after a
//! given failed attempt, so the policy can change without touching callers.
//!
//! - [`FixedDelay`]: the same wait every time (default, 5 seconds)
//! - [`ExponentialBackoff`]: doubling waits capped at 30 seconds, plus
//!   0–250ms of random jitter
//!
//! ```text
//! exponential delay = min(base * 2^(attempt-1), max) + jitter(0..=250ms)
//! ```

use crate::cli::Backoff;
use rand::{Rng, rng};
use std::fmt;
use std::time::Duration;

/// How long to wait after a failed attempt before the next one.
pub trait DelayStrategy: fmt::Debug {
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn delay_for(&self, attempt: usize) -> Duration;
}

/// Wait the same duration after every failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl DelayStrategy for FixedDelay {
    fn delay_for(&self, _attempt: usize) -> Duration {
        self.0
    }
}

/// Doubling delay with a ceiling and optional jitter.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Cap applied before jitter.
    pub max_delay: Duration,
    /// Upper bound of the random jitter added to each delay.
    pub max_jitter: Duration,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// The capped delay for `attempt`, without jitter.
    pub fn base_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }
}

impl DelayStrategy for ExponentialBackoff {
    fn delay_for(&self, attempt: usize) -> Duration {
        let jitter_cap = self.max_jitter.as_millis() as u64;
        let jitter_ms = if jitter_cap == 0 {
            0
        } else {
            rng().random_range(0..=jitter_cap)
        };
        self.base_for(attempt) + Duration::from_millis(jitter_ms)
    }
}

/// Build the strategy selected on the command line.
pub fn strategy_for(backoff: Backoff, retry_delay: Duration) -> Box<dyn DelayStrategy> {
    match backoff {
        Backoff::Fixed => Box::new(FixedDelay(retry_delay)),
        Backoff::Exponential => Box::new(ExponentialBackoff::new(retry_delay)),
    }
}
