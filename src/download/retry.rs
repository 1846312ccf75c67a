//! Retry policy for failed download attempts.
//!
//! Every failed attempt is retryable: an HTTP error status, a dropped
//! connection, a timeout, or a local write error all count the same. The
//! [`RetryPolicy`] only decides whether attempts remain and how long to pause
//! before the next one.
//!
//! # Example
//!
//! ```
//! use linkdl_core::download::{RetryDecision, RetryPolicy};
//!
//! let policy = RetryPolicy::default();
//! match policy.should_retry(1) {
//!     RetryDecision::Retry { delay, attempt } => {
//!         println!("Retrying in {:?} (attempt {})", delay, attempt);
//!     }
//!     RetryDecision::DoNotRetry { reason } => {
//!         println!("Not retrying: {}", reason);
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument};

/// Default maximum attempts per URL, including the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Upper bound on the attempts a policy accepts.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Fraction of the configured delay added at most as random jitter (1/4).
const JITTER_DIVISOR: u32 = 4;

/// Decision on whether to retry a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the download after the specified delay.
    Retry {
        /// How long to wait before retrying.
        delay: Duration,
        /// Which attempt number this will be (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Do not retry the download.
    DoNotRetry {
        /// Human-readable reason why retry is not attempted.
        reason: String,
    },
}

/// How many times a URL is attempted and how long to pause in between.
///
/// # Default Values
///
/// - `max_attempts`: 3
/// - `delay`: none, the next attempt starts immediately
///
/// A non-zero delay gets up to a quarter of itself added as random jitter so
/// that downloads failing together do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,

    /// Pause before each retry.
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with custom settings.
    ///
    /// `max_attempts` is clamped to `1..=10`.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
            delay,
        }
    }

    /// Creates a policy with a custom `max_attempts` and no delay.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the configured pause between attempts, without jitter.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Determines whether to retry after attempt number `attempt` (1-indexed) failed.
    #[instrument(level = "trace", skip(self), fields(max_attempts = self.max_attempts))]
    pub fn should_retry(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }

        RetryDecision::Retry {
            delay: self.delay_with_jitter(),
            attempt: attempt + 1,
        }
    }

    fn delay_with_jitter(&self) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }
        let max_jitter = self.delay / JITTER_DIVISOR;
        let jitter_ms = rand::thread_rng()
            .gen_range(0..=u64::try_from(max_jitter.as_millis()).unwrap_or(u64::MAX));
        self.delay + Duration::from_millis(jitter_ms)
    }
}
