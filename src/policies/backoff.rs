//! # Backoff policy for automatic reconnects.
//!
//! [`BackoffPolicy`] spaces out consecutive reconnects after server-side
//! closures. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first reconnect of a streak;
//! - [`BackoffPolicy::factor`] the multiplicative growth per further reconnect;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The delay for streak position `n` (0-based) is `first × factor^n`, clamped to
//! `max`, then jittered. The streak resets when the transport reports a
//! logged-in status.
//!
//! The default policy has `first = 0`, so reconnects happen immediately.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use wavisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(500),
//!     max: Duration::from_secs(8),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(500));
//! assert_eq!(backoff.next(2), Duration::from_secs(2));
//! assert_eq!(backoff.next(9), Duration::from_secs(8));
//! assert_eq!(BackoffPolicy::default().next(3), Duration::ZERO);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::policies::jitter::JitterPolicy;

/// Reconnect backoff policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay before the first reconnect of a streak (`0` = immediate).
    pub first: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
    /// Growth factor per consecutive reconnect (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 0` (immediate), `max = 30s`, `factor = 2.0`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Constant delay between reconnects.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay before the reconnect at streak position `attempt` (0-based).
    pub fn next(&self, attempt: u32) -> Duration {
        if self.first.is_zero() {
            return Duration::ZERO;
        }
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = match Duration::try_from_secs_f64(secs) {
            Ok(d) if d <= self.max => d,
            _ => self.max,
        };
        self.jitter.apply(base)
    }
}
