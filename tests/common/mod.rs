#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Notify;
use wavisor::{
    Event, EventKind, Handler, LaunchOptions, PayloadHook, SendOptions, Session, SessionRef,
    StartHooks, Transport, TransportError,
};

/// What the next `Transport::start` call does.
pub enum Step {
    /// Fires the given pairing material, then returns a session.
    Succeed {
        link_code: Option<String>,
        qr: Option<(String, String, u32)>,
    },
    /// Returns a launch error.
    Fail(String),
    /// Panics inside the start future.
    Panic(String),
    /// Waits for the notify, then returns a session.
    Gate(Arc<Notify>),
}

impl Step {
    pub fn ok() -> Self {
        Step::Succeed {
            link_code: None,
            qr: None,
        }
    }

    pub fn link_code(code: &str) -> Self {
        Step::Succeed {
            link_code: Some(code.to_string()),
            qr: None,
        }
    }

    pub fn qr(base64: &str, ascii: &str, attempts: u32) -> Self {
        Step::Succeed {
            link_code: None,
            qr: Some((base64.to_string(), ascii.to_string(), attempts)),
        }
    }
}

/// Scripted in-memory transport. Unscripted starts succeed.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Step>>,
    starts: AtomicUsize,
    hooks: Mutex<Vec<Arc<StartHooks>>>,
    sessions: Mutex<Vec<Arc<MockSession>>>,
    options: Mutex<Vec<LaunchOptions>>,
    close_delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new(script: impl IntoIterator<Item = Step>) -> Arc<Self> {
        let t = Self::default();
        t.script.lock().extend(script);
        Arc::new(t)
    }

    /// Sessions created from now on take `delay` to close.
    pub fn slow_close(&self, delay: Duration) {
        *self.close_delay.lock() = Some(delay);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn session(&self, index: usize) -> Arc<MockSession> {
        Arc::clone(&self.sessions.lock()[index])
    }

    pub fn sessions(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn options(&self, index: usize) -> LaunchOptions {
        self.options.lock()[index].clone()
    }

    pub fn hooks(&self, index: usize) -> Arc<StartHooks> {
        Arc::clone(&self.hooks.lock()[index])
    }

    /// Fires the status hook handed to the `index`-th start call.
    pub fn fire_status(&self, index: usize, status: &str) {
        let hooks = self.hooks(index);
        hooks.fire_status(status, "test-session");
    }

    fn new_session(&self) -> SessionRef {
        let session = Arc::new(MockSession::new(*self.close_delay.lock()));
        self.sessions.lock().push(Arc::clone(&session));
        session
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn start(
        &self,
        options: LaunchOptions,
        hooks: StartHooks,
    ) -> Result<SessionRef, TransportError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.options.lock().push(options);
        let hooks = Arc::new(hooks);
        self.hooks.lock().push(Arc::clone(&hooks));

        let step = self.script.lock().pop_front().unwrap_or_else(Step::ok);
        match step {
            Step::Succeed { link_code, qr } => {
                if let Some(code) = link_code {
                    hooks.fire_link_code(&code);
                }
                if let Some((base64, ascii, attempts)) = qr {
                    hooks.fire_qr(&base64, &ascii, attempts);
                }
                Ok(self.new_session())
            }
            Step::Fail(msg) => Err(TransportError::launch(msg)),
            Step::Panic(msg) => panic!("{msg}"),
            Step::Gate(gate) => {
                gate.notified().await;
                Ok(self.new_session())
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Session that records outbound calls and lets tests push inbound payloads.
pub struct MockSession {
    calls: Mutex<Vec<String>>,
    message: Mutex<Option<PayloadHook>>,
    ack: Mutex<Option<PayloadHook>>,
    closes: AtomicUsize,
    close_delay: Option<Duration>,
}

impl MockSession {
    fn new(close_delay: Option<Duration>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            message: Mutex::new(None),
            ack: Mutex::new(None),
            closes: AtomicUsize::new(0),
            close_delay,
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn push_message(&self, payload: Value) {
        if let Some(hook) = &*self.message.lock() {
            hook(payload);
        }
    }

    pub fn push_ack(&self, payload: Value) {
        if let Some(hook) = &*self.ack.lock() {
            hook(payload);
        }
    }
}

#[async_trait]
impl Session for MockSession {
    fn on_message(&self, callback: PayloadHook) {
        *self.message.lock() = Some(callback);
    }

    fn on_ack(&self, callback: PayloadHook) {
        *self.ack.lock() = Some(callback);
    }

    async fn start_typing(&self, chat: &str) -> Result<(), TransportError> {
        self.calls.lock().push(format!("typing:{chat}"));
        Ok(())
    }

    async fn send_text(
        &self,
        chat: &str,
        text: &str,
        options: SendOptions,
    ) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .push(format!("send:{chat}:{text}:{:?}", options.quoted));
        Ok(json!({ "id": "sent-1", "to": chat, "body": text }))
    }

    async fn close(&self) -> Result<(), TransportError> {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Handler that keeps every event it receives.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.lock().iter().filter(|e| e.kind() == kind).count()
    }
}

impl Handler for Recorder {
    fn on_event(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Polls `cond` until it holds; false after ten (virtual) seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .is_ok()
}

/// Lets spawned tasks run for a moment.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
