//! # Listener registry: one managed subscription per event name.
//!
//! The registry owns, per [`EventName`], at most one managed subscription: the
//! caller's [`Handler`], its [`DeliveryPolicy`], a delivery counter and the
//! identity of the bus listener currently backing it.
//!
//! ## Architecture
//! ```text
//! register(name, handler, policy)
//!     └─► entries[name] = { handler, policy, call_count: 0, generation: 0 }
//!         bus.subscribe(name, wrapper(gen 0))
//!
//! Bus.publish(ev) ──► wrapper(gen g) ──► Registry::deliver(name, g, ev)
//!   under the registry lock:
//!     1. entry missing or detached       → ignore
//!     2. call_count += 1
//!     3. call_count == max_calls
//!          ├─ reset_after = true         → call_count = 0, g += 1,
//!          │                               bus.replace(old listener, wrapper(g))
//!          └─ reset_after = false        → bus.unsubscribe(listener), detach forever
//!   after the lock is released:
//!     4. handler.on_event(ev)
//! ```
//!
//! ## Rules
//! - **First registration wins**: a second `register` for the same name returns
//!   [`RegisterError::AlreadyRegistered`] and changes nothing.
//! - **Bounded counter**: `0 <= call_count <= max_calls` at all times.
//! - **Exactly once**: every occurrence reaches exactly one wrapper, because
//!   renewal swaps the bus listener in place. Counting and renewal happen in one
//!   critical section, so concurrent publishers never observe a used-up cycle.
//! - **Identity**: each wrapper carries the generation it was attached under. A
//!   wrapper from an older generation (captured in a bus snapshot taken before a
//!   renewal) delivers to the current subscription.
//! - The registry lock is never held while a handler runs.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::core::panic_message;
use crate::error::RegisterError;
use crate::events::{Bus, Event, EventName, Listener, ListenerId};
use crate::handlers::{Handler, HandlerRef};
use crate::policies::DeliveryPolicy;

/// Registry-owned record behind one event name.
struct Managed {
    handler: HandlerRef,
    policy: DeliveryPolicy,
    /// Deliveries since the last renewal.
    call_count: u32,
    /// Bumped on every renewal; identifies the live wrapper.
    generation: u64,
    /// Bus listener backing the entry; `None` once permanently detached.
    listener: Option<ListenerId>,
}

impl Managed {
    #[inline]
    fn is_armed(&self) -> bool {
        self.listener.is_some()
    }
}

/// Point-in-time view of a managed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionState {
    /// Deliveries since the last renewal.
    pub call_count: u32,
    pub policy: DeliveryPolicy,
    /// False once a `reset_after = false` subscription used up its deliveries.
    pub armed: bool,
    /// Number of renewals so far.
    pub generation: u64,
}

/// Per-event-name registry of managed subscriptions on top of a [`Bus`].
pub struct Registry {
    entries: Mutex<HashMap<EventName, Managed>>,
    bus: Bus,
    me: Weak<Registry>,
}

impl Registry {
    /// Creates an empty registry attached to `bus`.
    pub fn new(bus: Bus) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            entries: Mutex::new(HashMap::new()),
            bus,
            me: me.clone(),
        })
    }

    /// Registers `handler` for `event` with `policy`.
    ///
    /// ### Errors
    /// - [`RegisterError::EmptyEvent`] for an empty name
    /// - [`RegisterError::InvalidMaxCalls`] for `max_calls == 0`
    /// - [`RegisterError::AlreadyRegistered`] if the name already has a handler
    pub fn register(
        &self,
        event: impl Into<EventName>,
        handler: HandlerRef,
        policy: DeliveryPolicy,
    ) -> Result<(), RegisterError> {
        let name = event.into();
        if name.is_empty() {
            return Err(RegisterError::EmptyEvent);
        }
        if !policy.is_valid() {
            return Err(RegisterError::InvalidMaxCalls {
                event: name.to_string(),
            });
        }

        let mut entries = self.entries.lock();
        if entries.contains_key(&name) {
            debug!(event = %name, handler = handler.name(), "duplicate registration ignored");
            return Err(RegisterError::AlreadyRegistered {
                event: name.to_string(),
            });
        }

        let listener = self.attach(&name, 0);
        debug!(
            event = %name,
            handler = handler.name(),
            max_calls = policy.max_calls,
            reset_after = policy.reset_after,
            "handler registered"
        );
        entries.insert(
            name,
            Managed {
                handler,
                policy,
                call_count: 0,
                generation: 0,
                listener: Some(listener),
            },
        );
        Ok(())
    }

    /// True if a subscription exists for `event` (armed or exhausted).
    pub fn contains(&self, event: &str) -> bool {
        self.entries.lock().contains_key(event)
    }

    /// Returns a snapshot of the subscription for `event`.
    pub fn state(&self, event: &str) -> Option<SubscriptionState> {
        self.entries.lock().get(event).map(|m| SubscriptionState {
            call_count: m.call_count,
            policy: m.policy,
            armed: m.is_armed(),
            generation: m.generation,
        })
    }

    /// Returns sorted list of registered event names.
    pub fn list(&self) -> Vec<String> {
        let entries = self.entries.lock();
        let mut names: Vec<String> = entries.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Detaches and removes every subscription.
    pub fn clear(&self) {
        let drained: Vec<(EventName, Managed)> = self.entries.lock().drain().collect();
        for (name, managed) in drained {
            if let Some(id) = managed.listener {
                self.bus.unsubscribe(name.as_str(), id);
            }
        }
    }

    /// Attaches a delivery wrapper for `name` tagged with `generation`.
    fn attach(&self, name: &EventName, generation: u64) -> ListenerId {
        self.bus.subscribe(name, self.wrapper(name, generation))
    }

    fn wrapper(&self, name: &EventName, generation: u64) -> Listener {
        let me = self.me.clone();
        let key = name.clone();
        Arc::new(move |ev: &Event| {
            if let Some(registry) = me.upgrade() {
                registry.deliver(&key, generation, ev);
            }
        })
    }

    /// Delivery wrapper body: count and renew or retire, then invoke.
    fn deliver(&self, name: &EventName, generation: u64, ev: &Event) {
        let handler = {
            let mut entries = self.entries.lock();
            let Some(sub) = entries.get_mut(name) else {
                return;
            };
            let Some(current) = sub.listener else {
                return;
            };
            if sub.generation != generation {
                debug!(
                    event = %name,
                    from = generation,
                    to = sub.generation,
                    "stale wrapper forwarded to current subscription"
                );
            }

            sub.call_count += 1;
            if sub.call_count >= sub.policy.max_calls {
                if sub.policy.reset_after {
                    sub.call_count = 0;
                    sub.generation += 1;
                    let fresh = self.wrapper(name, sub.generation);
                    let id = self.bus.replace(name, current, fresh);
                    sub.listener = Some(id);
                    debug!(
                        event = %name,
                        generation = sub.generation,
                        listener = id.get(),
                        "subscription renewed"
                    );
                } else {
                    self.bus.unsubscribe(name.as_str(), current);
                    sub.listener = None;
                    debug!(event = %name, listener = current.get(), "subscription exhausted; detached permanently");
                }
            }
            Arc::clone(&sub.handler)
        };

        invoke(name, handler.as_ref(), ev);
    }
}

/// Runs a handler, isolating panics.
fn invoke(name: &EventName, handler: &dyn Handler, ev: &Event) {
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| handler.on_event(ev))) {
        error!(
            event = %name,
            handler = handler.name(),
            panic = %panic_message(payload.as_ref()),
            "handler panicked"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerFn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, HandlerRef) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handler: HandlerRef = HandlerFn::arc("counter", move |_ev: &Event| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, handler)
    }

    fn status() -> Event {
        Event::status("isLogged", "main")
    }

    #[test]
    fn renewing_policy_delivers_every_occurrence_once() {
        for max_calls in [1, 2, 3, 7] {
            let bus = Bus::new();
            let reg = Registry::new(bus.clone());
            let (hits, handler) = counter();
            reg.register("status", handler, DeliveryPolicy::renewing(max_calls))
                .unwrap();

            for occurrence in 1..=50 {
                bus.publish(&status());
                assert_eq!(hits.load(Ordering::SeqCst), occurrence, "max_calls={max_calls}");
            }
            assert_eq!(bus.listener_count("status"), 1);
        }
    }

    #[test]
    fn bounded_policy_delivers_exactly_max_calls() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (hits, handler) = counter();
        reg.register("status", handler, DeliveryPolicy::bounded(3))
            .unwrap();

        for _ in 0..10 {
            bus.publish(&status());
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(bus.listener_count("status"), 0);

        let state = reg.state("status").unwrap();
        assert!(!state.armed);
        assert_eq!(state.call_count, 3);
    }

    fn slow_counter() -> (Arc<AtomicUsize>, HandlerRef) {
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let handler: HandlerRef = HandlerFn::arc("slow", move |_ev: &Event| {
            std::thread::sleep(Duration::from_millis(1));
            h.fetch_add(1, Ordering::SeqCst);
        });
        (hits, handler)
    }

    fn publish_from_threads(bus: &Bus, threads: usize, per_thread: usize) {
        let publishers: Vec<_> = (0..threads)
            .map(|_| {
                let bus = bus.clone();
                std::thread::spawn(move || {
                    for i in 0..per_thread {
                        bus.publish(&Event::Message(serde_json::json!({ "n": i })));
                    }
                })
            })
            .collect();
        for publisher in publishers {
            publisher.join().unwrap();
        }
    }

    #[test]
    fn concurrent_publishers_deliver_every_occurrence_once() {
        for policy in [
            DeliveryPolicy::default(),
            DeliveryPolicy::renewing(1),
            DeliveryPolicy::renewing(3),
        ] {
            let bus = Bus::new();
            let reg = Registry::new(bus.clone());
            let (hits, handler) = slow_counter();
            reg.register("message", handler, policy).unwrap();

            publish_from_threads(&bus, 4, 50);

            assert_eq!(hits.load(Ordering::SeqCst), 200, "{policy:?}");
            assert_eq!(bus.listener_count("message"), 1);
            let state = reg.state("message").unwrap();
            assert!(state.armed);
            assert!(state.call_count < policy.max_calls);
        }
    }

    #[test]
    fn concurrent_publishers_respect_bounded_policy() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (hits, handler) = slow_counter();
        reg.register("message", handler, DeliveryPolicy::bounded(7))
            .unwrap();

        publish_from_threads(&bus, 4, 50);

        assert_eq!(hits.load(Ordering::SeqCst), 7);
        assert_eq!(bus.listener_count("message"), 0);
    }

    #[test]
    fn stale_wrapper_delivers_to_current_subscription() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (hits, handler) = counter();
        reg.register("status", handler, DeliveryPolicy::renewing(1))
            .unwrap();

        // A wrapper captured before a renewal, as a concurrent bus snapshot would hold it.
        let stale = reg.wrapper(&"status".into(), 0);
        bus.publish(&status());
        assert_eq!(reg.state("status").unwrap().generation, 1);

        stale(&status());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(reg.state("status").unwrap().generation, 2);
    }

    #[test]
    fn first_registration_wins() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (first, h1) = counter();
        let (second, h2) = counter();

        reg.register("status", h1, DeliveryPolicy::default()).unwrap();
        let err = reg
            .register("status", h2, DeliveryPolicy::default())
            .unwrap_err();
        assert_eq!(
            err,
            RegisterError::AlreadyRegistered {
                event: "status".into()
            }
        );

        for _ in 0..5 {
            bus.publish(&status());
        }
        assert_eq!(first.load(Ordering::SeqCst), 5);
        assert_eq!(second.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn exhausted_name_still_rejects_new_handlers() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (_hits, h1) = counter();
        let (late, h2) = counter();
        reg.register("ack", h1, DeliveryPolicy::bounded(1)).unwrap();
        bus.publish(&Event::Ack(serde_json::json!({"ack": 1})));

        assert!(reg.register("ack", h2, DeliveryPolicy::default()).is_err());
        bus.publish(&Event::Ack(serde_json::json!({"ack": 2})));
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn renewal_churns_listener_identity() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (_hits, handler) = counter();
        reg.register("status", handler, DeliveryPolicy::renewing(2))
            .unwrap();

        bus.publish(&status());
        let s = reg.state("status").unwrap();
        assert_eq!((s.call_count, s.generation), (1, 0));

        bus.publish(&status());
        let s = reg.state("status").unwrap();
        assert_eq!((s.call_count, s.generation), (0, 1));
        assert!(s.armed);

        for _ in 0..4 {
            bus.publish(&status());
        }
        assert_eq!(reg.state("status").unwrap().generation, 3);
    }

    #[test]
    fn rejects_invalid_registrations() {
        let reg = Registry::new(Bus::new());
        let (_hits, handler) = counter();

        assert_eq!(
            reg.register("", Arc::clone(&handler), DeliveryPolicy::default()),
            Err(RegisterError::EmptyEvent)
        );
        assert_eq!(
            reg.register("status", handler, DeliveryPolicy::renewing(0)),
            Err(RegisterError::InvalidMaxCalls {
                event: "status".into()
            })
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn panicking_handler_does_not_stop_delivery() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&calls);
        let handler: HandlerRef = HandlerFn::arc("flaky", move |_ev: &Event| {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first delivery blows up");
            }
        });
        reg.register("status", handler, DeliveryPolicy::default())
            .unwrap();

        for _ in 0..4 {
            bus.publish(&status());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn handler_may_register_other_events() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (acks, ack_handler) = counter();

        let reg_inner = Arc::clone(&reg);
        let pending = Mutex::new(Some(ack_handler));
        let handler: HandlerRef = HandlerFn::arc("bootstrap", move |_ev: &Event| {
            if let Some(h) = pending.lock().take() {
                reg_inner
                    .register("ack", h, DeliveryPolicy::default())
                    .unwrap();
            }
        });
        reg.register("status", handler, DeliveryPolicy::default())
            .unwrap();

        bus.publish(&status());
        bus.publish(&Event::Ack(serde_json::json!({})));
        assert_eq!(acks.load(Ordering::SeqCst), 1);
        assert_eq!(reg.list(), vec!["ack".to_string(), "status".to_string()]);
    }

    #[test]
    fn clear_detaches_everything() {
        let bus = Bus::new();
        let reg = Registry::new(bus.clone());
        let (hits, handler) = counter();
        reg.register("status", handler, DeliveryPolicy::default())
            .unwrap();

        reg.clear();
        bus.publish(&status());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(reg.is_empty());
        assert_eq!(bus.listener_count("status"), 0);
    }

    #[test]
    fn dropped_registry_stops_delivery() {
        let bus = Bus::new();
        let (hits, handler) = counter();
        {
            let reg = Registry::new(bus.clone());
            reg.register("status", handler, DeliveryPolicy::default())
                .unwrap();
        }
        bus.publish(&status());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
