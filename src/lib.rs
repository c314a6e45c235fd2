//! # wavisor
//!
//! **Wavisor** keeps one browser-driven messaging session alive and relays its
//! notifications to registered handlers.
//!
//! The transport (the thing that actually drives a browser and speaks the
//! messaging protocol) is an opaque capability behind the [`Transport`] and
//! [`Session`] traits. Wavisor owns the session lifecycle around it: creation,
//! pairing notifications, status relay, automatic recreation when the server
//! closes the session, and graceful shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   Transport::start(LaunchOptions, StartHooks) ──► Session
//!        │ link code / QR / status hooks              │ on_message / on_ack
//!        ▼                                            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Lifecycle (Idle / Creating / Live / Failed, generation guard)  │
//! │  - session slot (current SessionRef)                              │
//! │  - Bus (named, synchronous publish/subscribe)                     │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!                  Bus.publish(Event) by event name
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Registry: one managed subscription per name                      │
//! │  - counts deliveries against DeliveryPolicy::max_calls            │
//! │  - renews (reset_after) or retires the subscription               │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   Handler (connect)  Handler (status)   Handler (message) ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! Idle ──start──► Creating ──ok──► Live ──serverClose──► Creating ──► ...
//!                     └──err/panic──► Failed (one `error` event, no retry)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                         |
//! |-------------------|--------------------------------------------------------------|--------------------------------------------|
//! | **Supervision**   | Create, relay, recreate and shut down one session.           | [`Supervisor`], [`SupervisorBuilder`]      |
//! | **Handlers**      | React to relayed events.                                     | [`Handler`], [`HandlerFn`], [`LogWriter`]  |
//! | **Delivery**      | Per-subscription call limits with renewal.                   | [`Registry`], [`DeliveryPolicy`]           |
//! | **Transport**     | Seam for the browser-driven client.                          | [`Transport`], [`Session`], [`StartHooks`] |
//! | **Policies**      | Pacing of automatic reconnects.                              | [`BackoffPolicy`], [`JitterPolicy`]        |
//! | **Errors**        | Typed errors with stable labels.                             | [`RegisterError`], [`SessionError`]        |
//! | **Configuration** | Session, browser and runtime settings (JSON loadable).       | [`Config`], [`BrowserConfig`]              |
//!
//! ## Optional features
//! - `logging`: exposes [`logging::init`](crate::logging) (a compact `tracing` subscriber).
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use wavisor::{Config, Event, HandlerFn, LogWriter, Supervisor, TransportRef};
//!
//! async fn serve(transport: TransportRef) -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::builder(Config::default(), transport)
//!         .with_handler("status", Arc::new(LogWriter))
//!         .with_handler("connect", HandlerFn::arc("pairing", |ev: &Event| {
//!             if let Event::Connect(info) = ev {
//!                 if let Some(code) = &info.code {
//!                     println!("link code: {code}");
//!                 }
//!             }
//!         }))
//!         .build()?;
//!
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod handlers;
mod policies;
mod transport;

// ---- Public re-exports ----

pub use config::{BrowserConfig, Config, DEFAULT_BROWSER_ARGS, Pairing};
pub use crate::core::{Registry, SessionState, SubscriptionState, Supervisor, SupervisorBuilder};
pub use error::{ConfigError, RegisterError, RuntimeError, SessionError, TransportError};
pub use events::{
    Bus, ConnectInfo, ErrorInfo, Event, EventKind, EventName, Listener, ListenerId,
    SessionStatus, StatusInfo, format_link_code,
};
pub use handlers::{AsyncHandlerFn, Handler, HandlerFn, HandlerRef, LogWriter};
pub use policies::{BackoffPolicy, DeliveryPolicy, JitterPolicy};
pub use transport::{
    LaunchOptions, LinkCodeHook, PayloadHook, QrHook, SendOptions, Session, SessionRef,
    StartHooks, StatusHook, Transport, TransportRef,
};

// Optional: tracing subscriber setup.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub mod logging;
