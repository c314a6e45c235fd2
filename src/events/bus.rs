//! # Synchronous event bus.
//!
//! [`Bus`] routes an [`Event`] to every listener subscribed under its name,
//! on the publishing thread, before `publish` returns.
//!
//! ## Architecture
//! ```text
//! Publishers:                          Listeners (per name):
//!   StartHooks (link code/QR/status) ─┐
//!   Session.on_message ───────────────┼──► Bus ──► "status"  ─► [L1, L2, ...]
//!   Session.on_ack ───────────────────┤            "connect" ─► [L3]
//!   Supervisor (creation failure) ────┘            "error"   ─► [L4]
//! ```
//!
//! ## Rules
//! - **In-order**: listeners of one name run in subscription order.
//! - **Snapshot dispatch**: the listener list is copied before dispatch, so
//!   listeners attached or detached while an event is being delivered take effect
//!   from the next `publish` on.
//! - **No lock across calls**: listeners may re-enter `subscribe`/`unsubscribe`/`publish`.
//! - **No persistence**: events with no listeners are dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::event::{Event, EventName};

/// Callback attached to the bus.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Identity of one bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Raw id, for logs.
    pub fn get(self) -> u64 {
        self.0
    }
}

struct Inner {
    listeners: Mutex<HashMap<EventName, Vec<(ListenerId, Listener)>>>,
    next_id: AtomicU64,
}

/// Named publish/subscribe channel with synchronous delivery.
///
/// Cheap to clone; clones share the same listener table.
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Bus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                listeners: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Attaches `listener` under `name` and returns its identity.
    pub fn subscribe(&self, name: &EventName, listener: Listener) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .listeners
            .lock()
            .entry(name.clone())
            .or_default()
            .push((id, listener));
        id
    }

    /// Detaches the listener `id` from `name`.
    ///
    /// Returns `false` if it was not attached.
    pub fn unsubscribe(&self, name: &str, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.lock();
        let Some(list) = listeners.get_mut(name) else {
            return false;
        };
        let before = list.len();
        list.retain(|(lid, _)| *lid != id);
        let removed = list.len() != before;
        if list.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    /// Swaps listener `old` under `name` for `listener`, in place.
    ///
    /// A concurrent `publish` sees either the old or the new listener, never both
    /// and never neither. If `old` is not attached, `listener` is appended.
    pub fn replace(&self, name: &EventName, old: ListenerId, listener: Listener) -> ListenerId {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.inner.listeners.lock();
        let list = listeners.entry(name.clone()).or_default();
        match list.iter_mut().find(|(lid, _)| *lid == old) {
            Some(slot) => *slot = (id, listener),
            None => list.push((id, listener)),
        }
        id
    }

    /// Delivers `ev` to every listener currently attached under its name.
    ///
    /// Returns the number of listeners invoked.
    pub fn publish(&self, ev: &Event) -> usize {
        let snapshot: Vec<Listener> = match self.inner.listeners.lock().get(ev.name()) {
            Some(list) => list.iter().map(|(_, l)| Arc::clone(l)).collect(),
            None => return 0,
        };
        for listener in &snapshot {
            listener(ev);
        }
        snapshot.len()
    }

    /// Number of listeners attached under `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .listeners
            .lock()
            .get(name)
            .map_or(0, |list| list.len())
    }

    /// Detaches every listener.
    pub fn clear(&self) {
        self.inner.listeners.lock().clear();
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.inner.listeners.lock();
        let mut names: Vec<&str> = listeners.keys().map(|n| n.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Bus").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn status() -> Event {
        Event::status("isLogged", "main")
    }

    #[test]
    fn delivers_in_subscription_order() {
        let bus = Bus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(
                &"status".into(),
                Arc::new(move |_ev: &Event| seen.lock().push(tag)),
            );
        }

        assert_eq!(bus.publish(&status()), 3);
        assert_eq!(*seen.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn routes_by_event_name() {
        let bus = Bus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        bus.subscribe(
            &"connect".into(),
            Arc::new(move |_ev: &Event| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(bus.publish(&status()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_detaches_only_that_listener() {
        let bus = Bus::new();
        let name: EventName = "status".into();
        let a = bus.subscribe(&name, Arc::new(|_ev: &Event| {}));
        let _b = bus.subscribe(&name, Arc::new(|_ev: &Event| {}));

        assert!(bus.unsubscribe("status", a));
        assert!(!bus.unsubscribe("status", a));
        assert_eq!(bus.listener_count("status"), 1);
    }

    #[test]
    fn listener_attached_during_dispatch_sees_next_event_only() {
        let bus = Bus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let bus_inner = bus.clone();
        let hits = Arc::clone(&late_hits);
        let attached = Arc::new(AtomicUsize::new(0));
        let attached_flag = Arc::clone(&attached);
        bus.subscribe(
            &"status".into(),
            Arc::new(move |_ev: &Event| {
                if attached_flag.fetch_add(1, Ordering::SeqCst) == 0 {
                    let hits = Arc::clone(&hits);
                    bus_inner.subscribe(
                        &"status".into(),
                        Arc::new(move |_ev: &Event| {
                            hits.fetch_add(1, Ordering::SeqCst);
                        }),
                    );
                }
            }),
        );

        bus.publish(&status());
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);
        bus.publish(&status());
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn replace_keeps_position_and_issues_new_id() {
        let bus = Bus::new();
        let name: EventName = "status".into();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let tagged = |tag: &'static str| -> Listener {
            let seen = Arc::clone(&seen);
            Arc::new(move |_ev: &Event| seen.lock().push(tag))
        };
        let old = bus.subscribe(&name, tagged("old"));
        bus.subscribe(&name, tagged("last"));

        let fresh = bus.replace(&name, old, tagged("fresh"));
        assert_ne!(fresh, old);
        assert!(!bus.unsubscribe("status", old));
        bus.publish(&status());
        assert_eq!(*seen.lock(), vec!["fresh", "last"]);
    }

    #[test]
    fn listener_ids_are_unique() {
        let bus = Bus::new();
        let a = bus.subscribe(&"a".into(), Arc::new(|_ev: &Event| {}));
        let b = bus.subscribe(&"b".into(), Arc::new(|_ev: &Event| {}));
        assert_ne!(a, b);
        bus.clear();
        assert_eq!(bus.listener_count("a"), 0);
    }
}
