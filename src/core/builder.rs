//! # Builder for a [`Supervisor`] with handlers registered up front.
//!
//! ```rust
//! use std::sync::Arc;
//! use wavisor::{Config, DeliveryPolicy, LogWriter, Supervisor, TransportRef};
//!
//! fn build(transport: TransportRef) -> Result<Arc<Supervisor>, wavisor::RegisterError> {
//!     Supervisor::builder(Config::default(), transport)
//!         .with_handler("status", Arc::new(LogWriter))
//!         .with_handler_policy("connect", Arc::new(LogWriter), DeliveryPolicy::bounded(1))
//!         .build()
//! }
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::error::RegisterError;
use crate::events::EventName;
use crate::handlers::HandlerRef;
use crate::policies::DeliveryPolicy;
use crate::transport::TransportRef;

use super::supervisor::Supervisor;

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: Config,
    transport: TransportRef,
    handlers: Vec<(EventName, HandlerRef, Option<DeliveryPolicy>)>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration and transport.
    pub fn new(cfg: Config, transport: TransportRef) -> Self {
        Self {
            cfg,
            transport,
            handlers: Vec::new(),
        }
    }

    /// Adds a handler using the configured default delivery policy.
    pub fn with_handler(mut self, event: impl Into<EventName>, handler: HandlerRef) -> Self {
        self.handlers.push((event.into(), handler, None));
        self
    }

    /// Adds a handler with an explicit delivery policy.
    pub fn with_handler_policy(
        mut self,
        event: impl Into<EventName>,
        handler: HandlerRef,
        policy: DeliveryPolicy,
    ) -> Self {
        self.handlers.push((event.into(), handler, Some(policy)));
        self
    }

    /// Builds the supervisor and registers handlers in insertion order.
    ///
    /// ### Errors
    /// The first [`RegisterError`] hit (duplicate name, empty name, `max_calls = 0`).
    pub fn build(self) -> Result<Arc<Supervisor>, RegisterError> {
        let sup = Supervisor::new(self.cfg, self.transport);
        for (event, handler, policy) in self.handlers {
            match policy {
                Some(policy) => sup.register_with_policy(event, handler, policy)?,
                None => sup.register(event, handler)?,
            }
        }
        Ok(sup)
    }
}
