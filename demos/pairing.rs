//! # Example: pairing, status relay and one server-side closure
//!
//! Drives a supervisor with a scripted in-memory transport:
//! - first session pairs via link code, logs in, then is closed by the server;
//! - the supervisor recreates it; the second session receives a message and replies.
//!
//! Run with:
//! ```bash
//! cargo run --example pairing --features logging
//! RUST_LOG=debug cargo run --example pairing --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use wavisor::{
    AsyncHandlerFn, Config, Event, HandlerFn, LaunchOptions, LogWriter, PayloadHook,
    SendOptions, Session, SessionRef, StartHooks, Supervisor, Transport, TransportError,
};

/// Fake client: every session logs in; the first one is closed by the server.
struct ScriptedTransport {
    launched: AtomicU32,
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn start(
        &self,
        options: LaunchOptions,
        hooks: StartHooks,
    ) -> Result<SessionRef, TransportError> {
        let n = self.launched.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::info!(launch = n, options = %serde_json::Value::Object(options.to_json()), "launching browser");

        tokio::time::sleep(Duration::from_millis(200)).await;
        if hooks.wants_link_code() {
            hooks.fire_link_code("K7PQ2M9X");
        } else {
            hooks.fire_qr("data:image/png;base64,iVBORw0KGgo=", "█▀▀▀▀▀█ ▄▀▄ █▀▀▀▀▀█", 1);
        }

        let session = Arc::new(ScriptedSession::default());
        let hooks = Arc::new(hooks);
        let sess = Arc::clone(&session);
        let first = n == 1;
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            hooks.fire_status("qrReadSuccess", "demo");
            hooks.fire_status("isLogged", "demo");
            tokio::time::sleep(Duration::from_millis(300)).await;
            if first {
                hooks.fire_status("serverClose", "demo");
            } else {
                sess.deliver(json!({ "id": "in-1", "from": "123@c.us", "body": "ping" }));
            }
        });
        Ok(session)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
struct ScriptedSession {
    message: Mutex<Option<PayloadHook>>,
    ack: Mutex<Option<PayloadHook>>,
}

impl ScriptedSession {
    fn deliver(&self, payload: Value) {
        if let Some(hook) = &*self.message.lock() {
            hook(payload);
        }
    }
}

#[async_trait]
impl Session for ScriptedSession {
    fn on_message(&self, callback: PayloadHook) {
        *self.message.lock() = Some(callback);
    }

    fn on_ack(&self, callback: PayloadHook) {
        *self.ack.lock() = Some(callback);
    }

    async fn start_typing(&self, chat: &str) -> Result<(), TransportError> {
        tracing::info!(chat, "typing...");
        Ok(())
    }

    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<Value, TransportError> {
        tracing::info!(chat, text, quoted = ?options.quoted, "sent");
        if let Some(hook) = &*self.ack.lock() {
            hook(json!({ "id": "out-1", "ack": 1 }));
        }
        Ok(json!({ "id": "out-1", "to": chat }))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Config::from_json(
        r#"{
            "session": "demo",
            "phone_number": "6281234567890",
            "logger": "info"
        }"#,
    )?;
    wavisor::logging::init(cfg.log_filter()).map_err(|e| anyhow::anyhow!(e))?;

    let transport = Arc::new(ScriptedTransport {
        launched: AtomicU32::new(0),
    });

    let sup = Supervisor::builder(cfg, transport)
        .with_handler("connect", Arc::new(LogWriter))
        .with_handler("status", Arc::new(LogWriter))
        .with_handler("ack", Arc::new(LogWriter))
        .with_handler("error", Arc::new(LogWriter))
        .build()?;

    // First registration wins; this one is rejected.
    if let Err(e) = sup.register(
        "connect",
        HandlerFn::arc("second-connect", |_ev: &Event| {}),
    ) {
        tracing::warn!(label = e.as_label(), "{}", e.as_message());
    }

    let replier = Arc::downgrade(&sup);
    sup.register(
        "message",
        AsyncHandlerFn::arc("auto-reply", move |ev: Event| {
            let replier = replier.clone();
            async move {
                let (Event::Message(msg), Some(sup)) = (ev, replier.upgrade()) else {
                    return;
                };
                let chat = msg["from"].as_str().unwrap_or_default().to_string();
                let quoted = msg["id"].as_str().map(str::to_string);
                if let Err(e) = sup.reply(&chat, "pong", quoted.as_deref()).await {
                    tracing::error!(error = %e, "reply failed");
                }
            }
        }),
    )?;

    let stopper = Arc::clone(&sup);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        stopper.cancel();
    });

    sup.run().await?;
    Ok(())
}
