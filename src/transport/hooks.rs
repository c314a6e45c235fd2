//! # Callbacks handed to the transport when a session starts.
//!
//! The supervisor builds one [`StartHooks`] per creation attempt and passes it to
//! [`Transport::start`](crate::Transport::start). Exactly one pairing hook is set:
//!
//! ```text
//! phone number configured ─► link_code: Some, qr: None
//! otherwise               ─► link_code: None, qr: Some
//! status                  ─► always set
//! ```
//!
//! Transports call the `fire_*` helpers; they are no-ops for unset hooks.

use std::fmt;

/// Link-code callback: raw code.
pub type LinkCodeHook = Box<dyn Fn(&str) + Send + Sync>;
/// QR callback: base64 image, ASCII rendering, attempt counter.
pub type QrHook = Box<dyn Fn(&str, &str, u32) + Send + Sync>;
/// Status callback: status value, session identifier.
pub type StatusHook = Box<dyn Fn(&str, &str) + Send + Sync>;
/// Message/ack callback: raw payload.
pub type PayloadHook = Box<dyn Fn(serde_json::Value) + Send + Sync>;

/// Callback bundle for one creation attempt.
pub struct StartHooks {
    pub link_code: Option<LinkCodeHook>,
    pub qr: Option<QrHook>,
    pub status: StatusHook,
}

impl StartHooks {
    /// Reports a pairing link code.
    pub fn fire_link_code(&self, code: &str) {
        if let Some(hook) = &self.link_code {
            hook(code);
        }
    }

    /// Reports a fresh QR image.
    pub fn fire_qr(&self, base64: &str, ascii: &str, attempts: u32) {
        if let Some(hook) = &self.qr {
            hook(base64, ascii, attempts);
        }
    }

    /// Reports a status change.
    pub fn fire_status(&self, status: &str, session: &str) {
        (self.status)(status, session);
    }

    /// True if the transport should pair via link code.
    pub fn wants_link_code(&self) -> bool {
        self.link_code.is_some()
    }
}

impl fmt::Debug for StartHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartHooks")
            .field("link_code", &self.link_code.is_some())
            .field("qr", &self.qr.is_some())
            .finish_non_exhaustive()
    }
}
