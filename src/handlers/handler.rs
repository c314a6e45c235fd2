//! # Core handler trait
//!
//! `Handler` is the extension point for reacting to relayed events. A handler is
//! registered once per event name on the [`Registry`](crate::Registry) and is
//! invoked synchronously, in emission order, by the delivery wrapper.
//!
//! ## Contract
//! - `on_event` runs on the thread that published the event and must not block.
//!   Suspending work belongs in [`AsyncHandlerFn`](crate::AsyncHandlerFn), which
//!   moves each delivery onto its own task.
//! - A panic inside `on_event` is caught by the registry and logged; it still
//!   counts as a delivery.
//!
//! ## Example
//! ```rust
//! use wavisor::{Event, Handler};
//!
//! struct Audit;
//!
//! impl Handler for Audit {
//!     fn on_event(&self, event: &Event) {
//!         let _ = event.name();
//!     }
//!     fn name(&self) -> &str { "audit" }
//! }
//! ```

use std::sync::Arc;

use crate::events::Event;

/// Contract for event handlers.
pub trait Handler: Send + Sync + 'static {
    /// Handle a single delivered event.
    fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Shared handle to a handler (`Arc<dyn Handler>`).
pub type HandlerRef = Arc<dyn Handler>;
