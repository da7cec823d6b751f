//! Retry policy shared by the chunked and single-stream download paths.
//!
//! Every transfer attempt that fails is retried after a policy-determined
//! delay until the attempt budget is exhausted; the retry loop inspects
//! outcome values rather than catching errors as control flow. The same
//! policy value drives both strategies, so behavior is consistent
//! regardless of which one the engine picked.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use media_downloader::RetryPolicy;
//!
//! let policy = RetryPolicy::fixed(3, Duration::from_secs(2));
//! assert!(policy.should_retry(1).is_some());
//! assert!(policy.should_retry(3).is_none());
//! ```

use std::time::Duration;

use rand::Rng;
use tracing::debug;

/// Default maximum transfer attempts (including the initial attempt).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default fixed inter-attempt delay (2 seconds).
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Default base delay for exponential backoff (1 second).
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default maximum delay cap for exponential backoff (32 seconds).
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(32);

/// Default exponential multiplier (doubles each attempt).
const DEFAULT_BACKOFF_MULTIPLIER: f32 = 2.0;

/// Maximum jitter added to exponential delays (500ms).
const MAX_JITTER: Duration = Duration::from_millis(500);

/// Delay schedule mapping a failed attempt number to a wait time.
#[derive(Debug, Clone)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed(Duration),
    /// Exponential growth with jitter:
    /// `min(base * multiplier^(attempt-1), max) + jitter`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Cap applied to the computed delay.
        max: Duration,
        /// Growth factor per attempt (typically 2.0).
        multiplier: f32,
    },
}

impl Backoff {
    /// Computes the delay after the given failed attempt (1-indexed).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential {
                base,
                max,
                multiplier,
            } => {
                let exponent = f64::from(attempt.saturating_sub(1));
                let delay_ms = base.as_millis() as f64 * f64::from(*multiplier).powf(exponent);
                let capped_ms = delay_ms.min(max.as_millis() as f64);
                Duration::from_millis(capped_ms as u64) + jitter()
            }
        }
    }
}

/// Generates random jitter between 0 and [`MAX_JITTER`].
///
/// Jitter spreads out retries when several chunk tasks fail at once.
fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_ms = rng.gen_range(0..=MAX_JITTER.as_millis() as u64);
    Duration::from_millis(jitter_ms)
}

/// Attempt budget plus delay schedule for failed transfers.
///
/// The default policy performs 3 total attempts with a fixed 2-second
/// delay between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    max_attempts: u32,
    /// Delay schedule between attempts.
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            backoff: Backoff::Fixed(DEFAULT_RETRY_DELAY),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy from an attempt budget and delay schedule.
    ///
    /// `max_attempts` is clamped to at least 1 (the initial attempt always
    /// runs).
    #[must_use]
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Fixed-delay policy.
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self::new(max_attempts, Backoff::Fixed(delay))
    }

    /// Exponential-backoff policy with default base/cap/multiplier.
    #[must_use]
    pub fn exponential(max_attempts: u32) -> Self {
        Self::new(
            max_attempts,
            Backoff::Exponential {
                base: DEFAULT_BASE_DELAY,
                max: DEFAULT_MAX_DELAY,
                multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            },
        )
    }

    /// Default schedule with a custom attempt budget.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Returns the maximum number of attempts configured.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decides whether to retry after the given failed attempt (1-indexed).
    ///
    /// Returns the delay to wait before the next attempt, or `None` when the
    /// attempt budget is exhausted.
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            debug!(attempt, max = self.max_attempts, "max attempts reached");
            return None;
        }
        let delay = self.backoff.delay_for(attempt);
        debug!(
            attempt,
            next_attempt = attempt + 1,
            delay_ms = delay.as_millis(),
            "will retry"
        );
        Some(delay)
    }
}
