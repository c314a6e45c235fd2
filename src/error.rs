//! Error types used by the wavisor runtime, transports and callers.
//!
//! - [`RegisterError`] a handler registration did not take effect.
//! - [`TransportError`] raised by [`Transport`](crate::Transport) and [`Session`](crate::Session) implementations.
//! - [`SessionError`] pass-through operations on the live session handle.
//! - [`ConfigError`] loading [`Config`](crate::Config) from disk or JSON.
//! - [`RuntimeError`] failures of the supervisor run loop itself.
//!
//! Every enum provides `as_label` (stable snake_case label for logs/metrics)
//! and `as_message` (human-readable details).
//!
//! Creation failures are **never** returned as errors: the supervisor turns them
//! into a single [`Event::Error`](crate::Event::Error) instead.

use std::time::Duration;
use thiserror::Error;

/// # Errors returned by handler registration.
///
/// Only one managed subscription may exist per event name; the first
/// registration wins and later ones report [`RegisterError::AlreadyRegistered`].
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    /// Event name was empty.
    #[error("event name must not be empty")]
    EmptyEvent,

    /// Delivery policy asked for zero deliveries per cycle.
    #[error("max_calls must be at least 1 (event {event:?})")]
    InvalidMaxCalls {
        /// Event the registration targeted.
        event: String,
    },

    /// A handler is already registered for this event name.
    #[error("a handler is already registered for event {event:?}")]
    AlreadyRegistered {
        /// Event the registration targeted.
        event: String,
    },
}

impl RegisterError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wavisor::RegisterError;
    ///
    /// let err = RegisterError::AlreadyRegistered { event: "status".into() };
    /// assert_eq!(err.as_label(), "register_duplicate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RegisterError::EmptyEvent => "register_empty_event",
            RegisterError::InvalidMaxCalls { .. } => "register_invalid_max_calls",
            RegisterError::AlreadyRegistered { .. } => "register_duplicate",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RegisterError::EmptyEvent => "empty event name".to_string(),
            RegisterError::InvalidMaxCalls { event } => format!("max_calls=0 for event={event}"),
            RegisterError::AlreadyRegistered { event } => format!("duplicate event={event}"),
        }
    }
}

/// # Errors produced by transport implementations.
///
/// The supervisor only ever looks at the [`Display`](std::fmt::Display) text of
/// these: it becomes the `message` of the emitted error event.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The session could not be started (browser launch, login page, ...).
    #[error("{error}")]
    Launch {
        /// The underlying error message.
        error: String,
    },

    /// The session is no longer usable.
    #[error("session closed")]
    Closed,

    /// A request on a live session failed.
    #[error("request failed: {error}")]
    Request {
        /// The underlying error message.
        error: String,
    },
}

impl TransportError {
    /// Shorthand for [`TransportError::Launch`].
    pub fn launch(error: impl Into<String>) -> Self {
        TransportError::Launch {
            error: error.into(),
        }
    }

    /// Shorthand for [`TransportError::Request`].
    pub fn request(error: impl Into<String>) -> Self {
        TransportError::Request {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::Launch { .. } => "transport_launch",
            TransportError::Closed => "transport_closed",
            TransportError::Request { .. } => "transport_request",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TransportError::Launch { error } => format!("launch: {error}"),
            TransportError::Closed => "closed".to_string(),
            TransportError::Request { error } => format!("request: {error}"),
        }
    }
}

/// # Errors from pass-through operations on the session handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SessionError {
    /// No live session handle (not created yet, creation failed, or reconnecting).
    #[error("no live session")]
    NotLive,

    /// The transport rejected the operation.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SessionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SessionError::NotLive => "session_not_live",
            SessionError::Transport(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SessionError::NotLive => "no live session".to_string(),
            SessionError::Transport(e) => e.as_message(),
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config contents are not valid JSON for [`Config`](crate::Config).
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io(_) => "config_io",
            ConfigError::Parse(_) => "config_parse",
        }
    }
}

/// # Errors produced by the supervisor run loop.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The live session did not close within the grace period.
    #[error("session close exceeded grace {grace:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// Registering OS signal listeners failed.
    #[error("failed to install signal handlers: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use wavisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace } => format!("grace exceeded after {grace:?}"),
            RuntimeError::Signal(e) => format!("signal: {e}"),
        }
    }
}
