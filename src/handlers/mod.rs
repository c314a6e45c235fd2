//! # Event handlers.
//!
//! This module provides the [`Handler`] trait and built-in implementations for
//! reacting to events relayed through the [`Registry`](crate::Registry).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Transport hook ── publish(Event) ──► Bus ──► delivery wrapper (Registry)
//!                                                    │  count < max_calls ?
//!                                                    ▼
//!                                           Handler::on_event(&Event)
//!                                                    │
//!                          ┌─────────────┬───────────┴───────┬──────────┐
//!                          ▼             ▼                   ▼          ▼
//!                      HandlerFn   AsyncHandlerFn        LogWriter    Custom
//!                      (inline)    (spawned task)        (tracing)
//! ```
//!
//! ## Implementing custom handlers
//! ```rust
//! use wavisor::{Event, Handler};
//!
//! struct Pairing;
//!
//! impl Handler for Pairing {
//!     fn on_event(&self, event: &Event) {
//!         if let Event::Connect(info) = event {
//!             if let Some(code) = &info.code {
//!                 println!("enter {code} on your phone");
//!             }
//!         }
//!     }
//! }
//! ```

mod handler;
mod handler_fn;
mod log;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::{AsyncHandlerFn, HandlerFn};
pub use log::LogWriter;
