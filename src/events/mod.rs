//! Relayed events: types and synchronous bus.
//!
//! This module groups the event **data model** and the **bus** that carries
//! transport notifications to the listener registry.
//!
//! ## Contents
//! - [`Event`], [`EventKind`], [`EventName`] the normalized notification stream
//! - [`ConnectInfo`], [`StatusInfo`], [`ErrorInfo`], [`SessionStatus`] variant payloads
//! - [`Bus`] named publish/subscribe with in-order, same-thread dispatch
//!
//! ## Quick reference
//! - **Publishers**: the supervisor's start hooks (link code, QR, status), the
//!   session's message/ack callbacks, and the creation routine (errors).
//! - **Consumers**: the [`Registry`](crate::Registry), one managed listener per name.

mod bus;
mod event;

pub use bus::{Bus, Listener, ListenerId};
pub use event::{
    ConnectInfo, ErrorInfo, Event, EventKind, EventName, SessionStatus, StatusInfo,
    format_link_code,
};
