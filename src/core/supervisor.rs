//! # Supervisor: owns one transport session, relays its events, recreates it.
//!
//! The [`Supervisor`] owns the [`Bus`], the [`Registry`] of handlers, the
//! [`Transport`](crate::Transport) and the current session handle. It runs
//! creation rounds, translates transport callbacks into [`Event`]s, and starts a
//! new round whenever the server closes the session.
//!
//! ## High-level architecture
//! ```text
//! start() / create()
//!   └─► Lifecycle::begin() ──► Round { generation: g }
//!         └─► drive(round):
//!               [reconnect only] sleep(reconnect_backoff.next(streak))  (cancellable)
//!               close previous session (bounded by cfg.grace)
//!               transport.start(cfg.launch_options(), hooks(g))         (panic-safe)
//!                 ├─ Ok(session)  → store handle, wire on_message/on_ack → Live
//!                 └─ Err / panic  → publish Event::Error                 → Failed
//!               Lifecycle::complete(g) ── pending reconnect? ──► next round
//!
//! Hooks of generation g (called by the transport):
//!   link code ──► publish Connect { code: "ABCD-1234" }     (phone number set)
//!   qr        ──► publish Connect { attempts, qr, base64 }  (otherwise)
//!   status    ──► publish Status { status, session }
//!                 ├─ isLogged / inChat → reset reconnect streak
//!                 └─ serverClose       → Lifecycle::server_closed(g)
//!                                          ├─ Live, current g → spawn drive(next round)
//!                                          ├─ Creating        → pending (coalesced)
//!                                          └─ older g         → ignored (stale)
//!
//! Session callbacks:
//!   on_message ──► publish Message(payload)
//!   on_ack     ──► publish Ack(payload)
//!
//! Shutdown:
//!   token.cancel() → Lifecycle::shutdown() → registry.clear()
//!                  → session.close() within cfg.grace
//! ```
//!
//! ## Rules
//! - Creation never returns an error; every failure becomes **one** error event.
//! - A failed creation is not retried automatically.
//! - Only `serverClose` triggers automatic recreation.
//! - The status event is published **before** the reconnect is requested.
//!
//! ## Example
//! ```rust,no_run
//! use wavisor::{Config, Event, HandlerFn, Supervisor, TransportRef};
//!
//! async fn serve(transport: TransportRef) -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new(Config::default(), transport);
//!     sup.register("connect", HandlerFn::arc("pairing", |ev: &Event| {
//!         if let Event::Connect(info) = ev {
//!             println!("{:?}", info.qr);
//!         }
//!     }))?;
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{Config, Pairing};
use crate::core::lifecycle::{Admission, Lifecycle, Round, SessionState};
use crate::core::registry::Registry;
use crate::core::{panic_message, shutdown};
use crate::error::{RegisterError, RuntimeError, SessionError};
use crate::events::{Bus, ConnectInfo, Event, EventName, SessionStatus};
use crate::handlers::HandlerRef;
use crate::policies::DeliveryPolicy;
use crate::transport::{
    LinkCodeHook, QrHook, SendOptions, SessionRef, StartHooks, StatusHook, TransportRef,
};

/// Supervises one messaging session: creation, event relay and reconnection.
pub struct Supervisor {
    cfg: Config,
    bus: Bus,
    registry: Arc<Registry>,
    transport: TransportRef,
    session: RwLock<Option<SessionRef>>,
    lifecycle: Mutex<Lifecycle>,
    token: CancellationToken,
}

impl Supervisor {
    /// Creates an idle supervisor. Nothing starts until [`start`](Self::start),
    /// [`create`](Self::create) or [`run`](Self::run).
    pub fn new(cfg: Config, transport: TransportRef) -> Arc<Self> {
        let bus = Bus::new();
        let registry = Registry::new(bus.clone());
        Arc::new(Self {
            cfg,
            bus,
            registry,
            transport,
            session: RwLock::new(None),
            lifecycle: Mutex::new(Lifecycle::new()),
            token: CancellationToken::new(),
        })
    }

    /// Returns a builder for registering handlers up front.
    pub fn builder(cfg: Config, transport: TransportRef) -> super::SupervisorBuilder {
        super::SupervisorBuilder::new(cfg, transport)
    }

    /// Registers `handler` for `event` with the configured default
    /// [`DeliveryPolicy`] (`cfg.delivery`).
    ///
    /// The first registration for a name wins; later ones return
    /// [`RegisterError::AlreadyRegistered`].
    pub fn register(
        &self,
        event: impl Into<EventName>,
        handler: HandlerRef,
    ) -> Result<(), RegisterError> {
        self.registry.register(event, handler, self.cfg.delivery)
    }

    /// Registers `handler` for `event` with an explicit policy.
    pub fn register_with_policy(
        &self,
        event: impl Into<EventName>,
        handler: HandlerRef,
        policy: DeliveryPolicy,
    ) -> Result<(), RegisterError> {
        self.registry.register(event, handler, policy)
    }

    /// Spawns the creation routine on the current tokio runtime.
    ///
    /// Must be called from within a runtime.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let me = Arc::clone(self);
        tokio::spawn(async move { me.create().await })
    }

    /// Runs the creation routine to completion, including any reconnect that was
    /// requested while it was in flight.
    ///
    /// Never fails: creation errors are published as [`Event::Error`]. A call
    /// made while a creation is already running is folded into it.
    pub async fn create(self: &Arc<Self>) {
        let admission = self.lifecycle.lock().begin();
        match admission {
            Admission::Begin(round) => self.drive(round).await,
            Admission::Coalesced => debug!("start coalesced into in-flight creation"),
            Admission::Closed => warn!("start refused: supervisor is shut down"),
            Admission::Stale => {}
        }
    }

    /// Starts the session, waits for a termination signal or
    /// [`cancel`](Self::cancel), then shuts down.
    pub async fn run(self: &Arc<Self>) -> Result<(), RuntimeError> {
        let _creation = self.start();
        let cause = shutdown::wait_for_shutdown(&self.token).await?;
        info!(cause = cause.as_str(), "shutdown requested");
        self.shutdown().await
    }

    /// Requests [`run`](Self::run) to return.
    ///
    /// Also interrupts an in-flight creation or reconnect backoff; no new
    /// session is created afterwards.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Stops the supervisor: refuses further creation, detaches every handler
    /// and closes the live session within `cfg.grace`.
    ///
    /// ### Errors
    /// [`RuntimeError::GraceExceeded`] if the session did not close in time.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.token.cancel();
        self.lifecycle.lock().shutdown();
        let session = self.session.write().take();
        self.registry.clear();

        let Some(session) = session else {
            info!("supervisor stopped");
            return Ok(());
        };
        let grace = self.cfg.grace;
        match tokio::time::timeout(grace, session.close()).await {
            Ok(Ok(())) => {
                info!("supervisor stopped; session closed");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "session close failed during shutdown");
                Ok(())
            }
            Err(_elapsed) => {
                warn!(grace = ?grace, "session close exceeded grace");
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }

    /// Signals typing in `chat`, then sends `text` (quoting `quoted` if given).
    ///
    /// ### Errors
    /// - [`SessionError::NotLive`] when no session handle exists
    /// - [`SessionError::Transport`] when either call fails
    pub async fn reply(
        &self,
        chat: &str,
        text: &str,
        quoted: Option<&str>,
    ) -> Result<Value, SessionError> {
        let session = self.session().ok_or(SessionError::NotLive)?;
        session.start_typing(chat).await?;
        let options = quoted.map(SendOptions::quoting).unwrap_or_default();
        Ok(session.send_text(chat, text, options).await?)
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.lifecycle.lock().state()
    }

    /// Generation of the latest creation round (0 before the first).
    pub fn generation(&self) -> u64 {
        self.lifecycle.lock().generation()
    }

    /// Live session handle, if any.
    pub fn session(&self) -> Option<SessionRef> {
        self.session.read().clone()
    }

    /// Handler registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Event bus the transport callbacks publish to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Runs `round` and every follow-up round queued while it was in flight.
    async fn drive(self: &Arc<Self>, mut round: Round) {
        loop {
            if let Some(streak) = round.reconnect {
                let delay = self.cfg.reconnect_backoff.next(streak);
                if !delay.is_zero() {
                    info!(generation = round.generation, streak, delay = ?delay, "reconnect delayed");
                    tokio::select! {
                        _ = self.token.cancelled() => return,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }

            self.discard_session().await;
            let ok = self.create_once(round.generation).await;

            let next = self.lifecycle.lock().complete(round.generation, ok);
            match next {
                Some(next) => {
                    info!(generation = next.generation, "running coalesced reconnect");
                    round = next;
                }
                None => return,
            }
        }
    }

    /// One transport start attempt; true if the session went live.
    async fn create_once(self: &Arc<Self>, generation: u64) -> bool {
        let options = self.cfg.launch_options();
        info!(
            session = %options.session,
            generation,
            transport = self.transport.name(),
            "creating session"
        );
        let hooks = self.hooks(generation);

        let started = tokio::select! {
            _ = self.token.cancelled() => {
                debug!(generation, "creation abandoned: shutting down");
                return false;
            }
            res = AssertUnwindSafe(self.transport.start(options, hooks)).catch_unwind() => res,
        };

        let result = match started {
            Ok(res) => res.map_err(|e| e.to_string()),
            Err(payload) => Err(panic_message(payload.as_ref())),
        };

        match result {
            Ok(session) => self.install(generation, session).await,
            Err(message) => {
                error!(generation, error = %message, "session creation failed");
                self.bus.publish(&Event::error(message));
                false
            }
        }
    }

    /// Wires the session callbacks and stores the handle if round `generation`
    /// is still current.
    async fn install(&self, generation: u64, session: SessionRef) -> bool {
        let bus = self.bus.clone();
        session.on_message(Box::new(move |payload| {
            bus.publish(&Event::Message(payload));
        }));
        let bus = self.bus.clone();
        session.on_ack(Box::new(move |payload| {
            bus.publish(&Event::Ack(payload));
        }));

        let accepted = {
            let lifecycle = self.lifecycle.lock();
            let current = !lifecycle.is_closed() && lifecycle.generation() == generation;
            if current {
                *self.session.write() = Some(Arc::clone(&session));
            }
            current
        };

        if accepted {
            info!(generation, "session live");
        } else {
            debug!(generation, "session superseded; closing it");
            if let Err(e) = session.close().await {
                debug!(generation, error = %e, "closing superseded session failed");
            }
        }
        accepted
    }

    /// Takes the previous handle out of the slot and closes it.
    async fn discard_session(&self) {
        let Some(old) = self.session.write().take() else {
            return;
        };
        match tokio::time::timeout(self.cfg.grace, old.close()).await {
            Ok(Ok(())) => debug!("previous session closed"),
            Ok(Err(e)) => debug!(error = %e, "previous session close failed"),
            Err(_elapsed) => warn!(grace = ?self.cfg.grace, "previous session close timed out"),
        }
    }

    /// Builds the transport callbacks for round `generation`.
    fn hooks(self: &Arc<Self>, generation: u64) -> StartHooks {
        let (link_code, qr): (Option<LinkCodeHook>, Option<QrHook>) = match self.cfg.pairing() {
            Pairing::LinkCode { .. } => {
                let bus = self.bus.clone();
                let hook: LinkCodeHook = Box::new(move |raw: &str| {
                    bus.publish(&Event::Connect(ConnectInfo::link_code(raw)));
                });
                (Some(hook), None)
            }
            Pairing::Qr => {
                let bus = self.bus.clone();
                let hook: QrHook = Box::new(move |base64: &str, ascii: &str, attempts: u32| {
                    bus.publish(&Event::Connect(ConnectInfo::qr(base64, ascii, attempts)));
                });
                (None, Some(hook))
            }
        };

        let bus = self.bus.clone();
        let me: Weak<Supervisor> = Arc::downgrade(self);
        let runtime = Handle::try_current().ok();
        let status: StatusHook = Box::new(move |status: &str, session: &str| {
            let status = SessionStatus::from(status);
            bus.publish(&Event::status(status.clone(), session));
            if let Some(sup) = me.upgrade() {
                sup.on_status(generation, &status, runtime.as_ref());
            }
        });

        StartHooks {
            link_code,
            qr,
            status,
        }
    }

    /// Reacts to a status reported by the session of round `generation`.
    fn on_status(
        self: &Arc<Self>,
        generation: u64,
        status: &SessionStatus,
        runtime: Option<&Handle>,
    ) {
        if status.is_logged_in() {
            self.lifecycle.lock().logged_in();
            return;
        }
        if !status.is_server_close() {
            return;
        }

        let admission = self.lifecycle.lock().server_closed(generation);
        match admission {
            Admission::Begin(round) => {
                info!(from = generation, to = round.generation, "server closed session; recreating");
                self.spawn_round(round, runtime);
            }
            Admission::Coalesced => debug!(generation, "server close coalesced into in-flight creation"),
            Admission::Stale => debug!(generation, "stale server close ignored"),
            Admission::Closed => debug!(generation, "server close after shutdown ignored"),
        }
    }

    fn spawn_round(self: &Arc<Self>, round: Round, runtime: Option<&Handle>) {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => match runtime {
                Some(handle) => handle.clone(),
                None => {
                    error!(generation = round.generation, "no tokio runtime to recreate session");
                    self.lifecycle.lock().complete(round.generation, false);
                    return;
                }
            },
        };
        let me = Arc::clone(self);
        handle.spawn(async move { me.drive(round).await });
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("session", &self.cfg.session)
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("handlers", &self.registry.list())
            .finish_non_exhaustive()
    }
}
