//! # Logging handler for debugging and demos.
//!
//! [`LogWriter`] records every delivered event through `tracing` under the
//! `wavisor::events` target.
//!
//! ## Output (with the `fmt` subscriber)
//! ```text
//! INFO wavisor::events: connect attempts=1 code=None
//! INFO wavisor::events: status status=qrReadSuccess session=main
//! INFO wavisor::events: message payload={"body":"hi"}
//! WARN wavisor::events: error message=Failed to launch the browser process!
//! ```
//!
//! Register it for as many event names as needed; each registration is an
//! independent managed subscription.

use tracing::{debug, info, warn};

use crate::events::Event;
use crate::handlers::Handler;

/// Logs events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl Handler for LogWriter {
    fn on_event(&self, e: &Event) {
        match e {
            Event::Connect(info) => {
                info!(
                    target: "wavisor::events",
                    attempts = ?info.attempts,
                    code = ?info.code,
                    "connect"
                );
                if let Some(qr) = &info.qr {
                    debug!(target: "wavisor::events", "qr:\n{qr}");
                }
            }
            Event::Status(info) => {
                info!(
                    target: "wavisor::events",
                    status = %info.status,
                    session = %info.session,
                    "status"
                );
            }
            Event::Message(payload) => {
                info!(target: "wavisor::events", %payload, "message");
            }
            Event::Ack(payload) => {
                debug!(target: "wavisor::events", %payload, "ack");
            }
            Event::Error(info) => {
                warn!(target: "wavisor::events", message = %info.message, "error");
            }
        }
    }

    fn name(&self) -> &str {
        "log_writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ConnectInfo;
    use serde_json::json;

    #[test]
    fn logs_every_variant_without_subscriber() {
        let w = LogWriter;
        w.on_event(&Event::Connect(ConnectInfo::qr("b64", "##", 1)));
        w.on_event(&Event::status("serverClose", "main"));
        w.on_event(&Event::Message(json!({"body": "hi"})));
        w.on_event(&Event::Ack(json!({"ack": 3})));
        w.on_event(&Event::error("boom"));
        assert_eq!(w.name(), "log_writer");
    }
}
