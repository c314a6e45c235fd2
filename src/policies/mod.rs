//! Delivery and reconnect policies.
//!
//! ## Contents
//! - [`DeliveryPolicy`] how many times a handler fires before renewal/removal
//! - [`BackoffPolicy`]  how long to wait before consecutive automatic reconnects
//! - [`JitterPolicy`]   randomization of reconnect delays
//!
//! ## Quick wiring
//! ```text
//! Config { delivery: DeliveryPolicy, reconnect_backoff: BackoffPolicy, .. }
//!      ├─► core::registry::Registry uses delivery for `register` (unless overridden)
//!      └─► core::supervisor::Supervisor uses reconnect_backoff.next(streak)
//!          before each serverClose-driven recreation
//! ```
//!
//! ## Defaults
//! - `DeliveryPolicy::default()` → max_calls=2, reset_after=true.
//! - `BackoffPolicy::default()`  → first=0 (immediate reconnect), factor=2.0, max=30s.
//! - `JitterPolicy::None`.

mod backoff;
mod delivery;
mod jitter;

pub use backoff::BackoffPolicy;
pub use delivery::DeliveryPolicy;
pub use jitter::JitterPolicy;
