//! # Closure-backed handlers
//!
//! - [`HandlerFn`] wraps `F: Fn(&Event)` and calls it inline on every delivery.
//! - [`AsyncHandlerFn`] wraps `F: Fn(Event) -> Fut` and spawns a fresh future per
//!   delivery on the current tokio runtime, so a handler that awaits transport
//!   operations does not hold up delivery of other events.
//!
//! ## Concurrency semantics
//! - `HandlerFn`: deliveries for one event name never overlap.
//! - `AsyncHandlerFn`: futures are *spawned* in emission order; the runtime may
//!   start and interleave them in any order. Share state explicitly with
//!   `Arc<...>` inside the closure.
//! - `AsyncHandlerFn` remembers the runtime it was created on, so deliveries
//!   published from a transport's own thread still reach it.
//!
//! ## Example
//! ```rust
//! use wavisor::{Event, HandlerFn, HandlerRef};
//!
//! let h: HandlerRef = HandlerFn::arc("print-status", |ev: &Event| {
//!     if let Event::Status(info) = ev {
//!         println!("status={}", info.status);
//!     }
//! });
//! assert_eq!(h.name(), "print-status");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::warn;

use crate::events::Event;
use crate::handlers::handler::Handler;

/// Synchronous function-backed handler.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event) {
        (self.f)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handler that runs each delivery as a spawned task.
///
/// Spawns on the runtime of the publishing thread, or else on the runtime that
/// was current when the handler was created. Without either the delivery is
/// dropped with a warning.
#[derive(Debug)]
pub struct AsyncHandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
    runtime: Option<Handle>,
}

impl<F> AsyncHandlerFn<F> {
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            runtime: Handle::try_current().ok(),
        }
    }

    /// Spawns deliveries on `runtime` when the publishing thread has none.
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Creates the handler and returns it as a shared handle.
    ///
    /// ```rust
    /// use wavisor::{AsyncHandlerFn, Event, HandlerRef};
    ///
    /// let h: HandlerRef = AsyncHandlerFn::arc("on-message", |ev: Event| async move {
    ///     let _ = ev;
    /// });
    /// assert_eq!(h.name(), "on-message");
    /// ```
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

impl<F, Fut> Handler for AsyncHandlerFn<F>
where
    F: Fn(Event) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn on_event(&self, event: &Event) {
        match Handle::try_current().ok().or_else(|| self.runtime.clone()) {
            Some(rt) => {
                rt.spawn((self.f)(event.clone()));
            }
            None => {
                warn!(handler = %self.name, event = event.name(), "no tokio runtime; delivery dropped");
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn handler_fn_calls_closure_inline() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handler = HandlerFn::new("count", move |_ev: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        handler.on_event(&Event::error("boom"));
        handler.on_event(&Event::error("boom"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(Handler::name(&handler), "count");
    }

    #[tokio::test]
    async fn async_handler_runs_on_runtime() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handler = AsyncHandlerFn::new("forward", move |ev: Event| {
            let tx = tx.clone();
            async move {
                tokio::task::yield_now().await;
                let _ = tx.send(ev);
            }
        });

        handler.on_event(&Event::error("late"));
        let got = rx.recv().await.unwrap();
        assert_eq!(got, Event::error("late"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn async_handler_accepts_deliveries_from_foreign_threads() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handler = Arc::new(AsyncHandlerFn::new("forward", move |ev: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(ev);
            }
        }));

        let h = Arc::clone(&handler);
        std::thread::spawn(move || h.on_event(&Event::Message(serde_json::json!({"n": 1}))))
            .join()
            .unwrap();

        let got = tokio::time::timeout(std::time::Duration::from_secs(2), rx.recv())
            .await
            .unwrap();
        assert_eq!(got, Some(Event::Message(serde_json::json!({"n": 1}))));
    }

    #[test]
    fn explicit_runtime_serves_handlers_built_outside_one() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handler = AsyncHandlerFn::new("late-bound", move |ev: Event| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(ev);
            }
        })
        .with_runtime(rt.handle().clone());

        handler.on_event(&Event::error("routed"));
        let got = rt.block_on(rx.recv());
        assert_eq!(got, Some(Event::error("routed")));
    }

    #[test]
    fn async_handler_without_runtime_drops_delivery() {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handler = AsyncHandlerFn::new("orphan", move |_ev: Event| {
            let h = Arc::clone(&h);
            async move {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });

        handler.on_event(&Event::error("nowhere"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
