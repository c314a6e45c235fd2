//! Runtime core: session lifecycle, listener registry and shutdown.
//!
//! The public entry point is [`Supervisor`] (built directly or through
//! [`SupervisorBuilder`]), which owns one transport session, relays its
//! notifications through the [`Registry`], and recreates the session when the
//! server closes it.
//!
//! Internal modules:
//! - [`registry`]: one managed subscription per event name, with renewal;
//! - [`lifecycle`]: session state machine and reconnect guard;
//! - [`supervisor`]: creation rounds, transport hooks, reply, shutdown;
//! - [`builder`]: assembles a supervisor with handlers pre-registered;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod lifecycle;
mod registry;
mod shutdown;
mod supervisor;

use std::any::Any;

pub use builder::SupervisorBuilder;
pub use lifecycle::SessionState;
pub use registry::{Registry, SubscriptionState};
pub use supervisor::Supervisor;

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
