//! # Delivery policy for managed subscriptions.
//!
//! [`DeliveryPolicy`] bounds how many consecutive times a registered handler is
//! invoked before its bus subscription is recycled.
//!
//! - `max_calls`: deliveries per cycle (must be `>= 1`).
//! - `reset_after`: what happens when the cycle is used up.
//!
//! ```text
//! reset_after = true  (renewing):
//!   occ 1 ─► handler  (count 1)
//!   occ 2 ─► handler  (count 2) ─► detach, reset, attach fresh listener
//!   occ 3 ─► handler  (count 1)
//!   ...                                   every occurrence delivered once
//!
//! reset_after = false (bounded):
//!   occ 1..N ─► handler, then detach for good; occ N+1.. are never delivered
//! ```

use serde::{Deserialize, Serialize};

/// Per-subscription delivery ceiling and renewal behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryPolicy {
    /// Consecutive deliveries before renewal or removal.
    pub max_calls: u32,
    /// Renew the subscription after `max_calls` deliveries (`false` = remove permanently).
    pub reset_after: bool,
}

impl DeliveryPolicy {
    /// Policy that renews every `max_calls` deliveries.
    pub fn renewing(max_calls: u32) -> Self {
        Self {
            max_calls,
            reset_after: true,
        }
    }

    /// Policy that delivers `max_calls` times and then stops for good.
    ///
    /// ```rust
    /// use wavisor::DeliveryPolicy;
    ///
    /// let once = DeliveryPolicy::bounded(1);
    /// assert!(!once.reset_after);
    /// assert!(once.is_valid());
    /// assert!(!DeliveryPolicy::bounded(0).is_valid());
    /// ```
    pub fn bounded(max_calls: u32) -> Self {
        Self {
            max_calls,
            reset_after: false,
        }
    }

    /// True if the policy allows at least one delivery per cycle.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.max_calls >= 1
    }
}

impl Default for DeliveryPolicy {
    /// `max_calls = 2`, `reset_after = true`.
    fn default() -> Self {
        Self::renewing(2)
    }
}
