//! # Notifications relayed from the transport to registered handlers.
//!
//! The transport reports pairing, status, inbound traffic and acknowledgments in
//! its own shapes. The supervisor normalizes all of them into one [`Event`] sum
//! type with five variants, one per [`EventKind`]:
//!
//! | Kind      | Name        | Payload                                  |
//! |-----------|-------------|------------------------------------------|
//! | `Connect` | `"connect"` | [`ConnectInfo`] (QR image or link code)  |
//! | `Status`  | `"status"`  | [`StatusInfo`] (status value, session)   |
//! | `Message` | `"message"` | raw inbound message (`serde_json::Value`) |
//! | `Ack`     | `"ack"`     | raw acknowledgment (`serde_json::Value`)  |
//! | `Error`   | `"error"`   | [`ErrorInfo`] (creation failure message) |
//!
//! Handlers are registered by [`EventName`]; built-in events use
//! [`EventKind::as_str`] as their name.
//!
//! ## Example
//! ```rust
//! use wavisor::{ConnectInfo, Event, EventKind};
//!
//! let ev = Event::Connect(ConnectInfo::link_code("ABCD1234"));
//! assert_eq!(ev.kind(), EventKind::Connect);
//! assert_eq!(ev.name(), "connect");
//! if let Event::Connect(info) = ev {
//!     assert_eq!(info.code.as_deref(), Some("ABCD-1234"));
//! }
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Classification of relayed events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Pairing material: QR image or link code.
    Connect,
    /// Session status change reported by the transport.
    Status,
    /// Inbound message.
    Message,
    /// Delivery acknowledgment.
    Ack,
    /// Session creation failed.
    Error,
}

impl EventKind {
    /// All built-in kinds, in declaration order.
    pub const ALL: [EventKind; 5] = [
        EventKind::Connect,
        EventKind::Status,
        EventKind::Message,
        EventKind::Ack,
        EventKind::Error,
    ];

    /// Event name used for registration and bus routing.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connect => "connect",
            EventKind::Status => "status",
            EventKind::Message => "message",
            EventKind::Ack => "ack",
            EventKind::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name under which handlers are registered and events are routed.
///
/// Cheap to clone. Any string is accepted; names that match no [`EventKind`]
/// simply never fire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventName(Arc<str>);

impl EventName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<EventKind> for EventName {
    fn from(kind: EventKind) -> Self {
        Self(Arc::from(kind.as_str()))
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pairing material for associating a new session with an account.
///
/// Exactly one of the two shapes is populated:
/// - QR pairing: `attempts`, `qr` (ASCII rendering) and `base64` (image); `code` is `None`.
/// - Link-code pairing: `code` only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectInfo {
    /// QR attempt counter reported by the transport.
    pub attempts: Option<u32>,
    /// ASCII-rendered QR code.
    pub qr: Option<String>,
    /// Base64-encoded QR image.
    pub base64: Option<String>,
    /// Link code, grouped for display (`ABCD-1234`).
    pub code: Option<String>,
}

impl ConnectInfo {
    /// Builds link-code pairing info, grouping the raw code with [`format_link_code`].
    pub fn link_code(raw: &str) -> Self {
        Self {
            code: Some(format_link_code(raw)),
            ..Self::default()
        }
    }

    /// Builds QR pairing info.
    pub fn qr(base64: impl Into<String>, ascii: impl Into<String>, attempts: u32) -> Self {
        Self {
            attempts: Some(attempts),
            qr: Some(ascii.into()),
            base64: Some(base64.into()),
            code: None,
        }
    }
}

/// Splits a link code into groups of four characters joined by `-`.
///
/// Codes with nothing to group (empty) are returned unchanged.
///
/// ```rust
/// use wavisor::format_link_code;
///
/// assert_eq!(format_link_code("ABCD1234"), "ABCD-1234");
/// assert_eq!(format_link_code("ABCDEF"), "ABCD-EF");
/// assert_eq!(format_link_code(""), "");
/// ```
pub fn format_link_code(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    if chars.is_empty() {
        return raw.to_string();
    }
    chars
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}

/// Status values reported by the transport's status callback.
///
/// Unknown values are kept verbatim in [`SessionStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    IsLogged,
    NotLogged,
    QrReadSuccess,
    QrReadFail,
    QrReadError,
    InChat,
    BrowserClose,
    AutocloseCalled,
    DesconnectedMobile,
    PhoneNotConnected,
    DeleteToken,
    /// Remote side terminated the session; triggers recreation.
    ServerClose,
    Other(String),
}

impl SessionStatus {
    /// Wire value, as the transport reports it.
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::IsLogged => "isLogged",
            SessionStatus::NotLogged => "notLogged",
            SessionStatus::QrReadSuccess => "qrReadSuccess",
            SessionStatus::QrReadFail => "qrReadFail",
            SessionStatus::QrReadError => "qrReadError",
            SessionStatus::InChat => "inChat",
            SessionStatus::BrowserClose => "browserClose",
            SessionStatus::AutocloseCalled => "autocloseCalled",
            SessionStatus::DesconnectedMobile => "desconnectedMobile",
            SessionStatus::PhoneNotConnected => "phoneNotConnected",
            SessionStatus::DeleteToken => "deleteToken",
            SessionStatus::ServerClose => "serverClose",
            SessionStatus::Other(s) => s,
        }
    }

    /// True if the server closed the session.
    #[inline]
    pub fn is_server_close(&self) -> bool {
        matches!(self, SessionStatus::ServerClose)
    }

    /// True if the account is logged in and the session is usable.
    #[inline]
    pub fn is_logged_in(&self) -> bool {
        matches!(self, SessionStatus::IsLogged | SessionStatus::InChat)
    }
}

impl From<&str> for SessionStatus {
    fn from(s: &str) -> Self {
        match s {
            "isLogged" => SessionStatus::IsLogged,
            "notLogged" => SessionStatus::NotLogged,
            "qrReadSuccess" => SessionStatus::QrReadSuccess,
            "qrReadFail" => SessionStatus::QrReadFail,
            "qrReadError" => SessionStatus::QrReadError,
            "inChat" => SessionStatus::InChat,
            "browserClose" => SessionStatus::BrowserClose,
            "autocloseCalled" => SessionStatus::AutocloseCalled,
            "desconnectedMobile" => SessionStatus::DesconnectedMobile,
            "phoneNotConnected" => SessionStatus::PhoneNotConnected,
            "deleteToken" => SessionStatus::DeleteToken,
            "serverClose" => SessionStatus::ServerClose,
            other => SessionStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for SessionStatus {
    fn from(s: String) -> Self {
        match SessionStatus::from(s.as_str()) {
            SessionStatus::Other(_) => SessionStatus::Other(s),
            known => known,
        }
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        match status {
            SessionStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusInfo {
    pub status: SessionStatus,
    /// Session identifier the status belongs to.
    pub session: String,
}

/// Creation failure notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
}

/// Event relayed to registered handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "lowercase")]
pub enum Event {
    Connect(ConnectInfo),
    Status(StatusInfo),
    Message(Value),
    Ack(Value),
    Error(ErrorInfo),
}

impl Event {
    /// Builds a status event.
    pub fn status(status: impl Into<SessionStatus>, session: impl Into<String>) -> Self {
        Event::Status(StatusInfo {
            status: status.into(),
            session: session.into(),
        })
    }

    /// Builds an error event.
    pub fn error(message: impl Into<String>) -> Self {
        Event::Error(ErrorInfo {
            message: message.into(),
        })
    }

    #[inline]
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Connect(_) => EventKind::Connect,
            Event::Status(_) => EventKind::Status,
            Event::Message(_) => EventKind::Message,
            Event::Ack(_) => EventKind::Ack,
            Event::Error(_) => EventKind::Error,
        }
    }

    /// Name the event is routed under.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}
