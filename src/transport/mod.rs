//! # Transport seam: the external messaging client.
//!
//! The supervisor treats the browser-driven client as an opaque capability:
//!
//! ```text
//! Supervisor ── start(LaunchOptions, StartHooks) ──► Transport
//!                                                       │  (while starting)
//!      ◄── hooks: link code / QR / status ──────────────┤
//!                                                       ▼
//!      ◄──────────────── Ok(SessionRef) ─────────── Session
//!                                                       │  (while live)
//!      ◄── on_message / on_ack callbacks ───────────────┤
//!      ◄── status hook (e.g. serverClose) ──────────────┘
//! ```
//!
//! Implementations wrap a concrete client (a browser automation driver, a
//! WebSocket bridge, a scripted fake for tests). The wire protocol is theirs.
//!
//! ## Rules
//! - `start` may call the hooks any number of times before and after it returns.
//! - Hooks are `Send + Sync` and may be called from any thread.
//! - A returned `Err` (or a panic inside `start`) becomes a single error event.

mod hooks;
mod options;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

pub use hooks::{LinkCodeHook, PayloadHook, QrHook, StartHooks, StatusHook};
pub use options::{LaunchOptions, SendOptions};

/// Factory for sessions.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Starts a session and resolves once it is usable.
    async fn start(
        &self,
        options: LaunchOptions,
        hooks: StartHooks,
    ) -> Result<SessionRef, TransportError>;

    /// Human-readable name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// A live session created by a [`Transport`].
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Installs the inbound-message callback.
    fn on_message(&self, callback: PayloadHook);

    /// Installs the delivery-acknowledgment callback.
    fn on_ack(&self, callback: PayloadHook);

    /// Shows the typing indicator in `chat`.
    async fn start_typing(&self, chat: &str) -> Result<(), TransportError>;

    /// Sends a text message and returns the transport's description of it.
    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<Value, TransportError>;

    /// Closes the session and releases the browser.
    async fn close(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Shared handle to a transport (`Arc<dyn Transport>`).
pub type TransportRef = Arc<dyn Transport>;

/// Shared handle to a session (`Arc<dyn Session>`).
pub type SessionRef = Arc<dyn Session>;
