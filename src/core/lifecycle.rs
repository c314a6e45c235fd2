//! # Session state machine with generation-tagged creation rounds.
//!
//! Tracks which state the supervised session is in and decides, for every
//! start request and every server-closure signal, whether a creation round
//! should begin.
//!
//! ## States
//! ```text
//!            begin()                 complete(ok)
//!   Idle ───────────────► Creating ───────────────► Live
//!    ▲                     │   ▲                     │
//!    │ shutdown()          │   │ server_closed(gen)  │
//!    │ (any state)         │   └─────────────────────┘
//!    │                     │ complete(err)
//!    │                     ▼
//!    │                  Failed ── begin() ──► Creating
//! ```
//!
//! ## Rules
//! - Every round gets a fresh **generation**; hooks of a session carry the
//!   generation they were created under.
//! - `server_closed` with an older generation is **stale** and ignored.
//! - `server_closed` while `Creating` sets a single **pending** flag; any number
//!   of signals coalesce into one follow-up round, started after the in-flight
//!   round completes successfully.
//! - `begin` while `Creating` is coalesced into the in-flight round.
//! - After `shutdown` nothing starts again.

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session and no creation in progress.
    Idle,
    /// Waiting for the transport to start a session.
    Creating,
    /// Session handle established; events flowing.
    Live,
    /// Last creation failed; no handle.
    Failed,
}

/// One creation attempt the supervisor should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Round {
    pub generation: u64,
    /// Position in the current reconnect streak (`None` for explicit starts).
    pub reconnect: Option<u32>,
}

/// Outcome of a start or reconnect request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Admission {
    /// Run this round.
    Begin(Round),
    /// Folded into the round already in flight.
    Coalesced,
    /// Signal came from a session that has already been replaced.
    Stale,
    /// Supervisor is shut down.
    Closed,
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    state: SessionState,
    generation: u64,
    pending_reconnect: bool,
    /// Consecutive reconnects since the last logged-in status.
    streak: u32,
    closed: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            generation: 0,
            pending_reconnect: false,
            streak: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Explicit start request.
    pub fn begin(&mut self) -> Admission {
        if self.closed {
            return Admission::Closed;
        }
        if self.state == SessionState::Creating {
            return Admission::Coalesced;
        }
        Admission::Begin(self.next_round(None))
    }

    /// Server-closure signal from the session created in round `generation`.
    pub fn server_closed(&mut self, generation: u64) -> Admission {
        if self.closed {
            return Admission::Closed;
        }
        if generation != self.generation {
            return Admission::Stale;
        }
        match self.state {
            SessionState::Creating => {
                self.pending_reconnect = true;
                Admission::Coalesced
            }
            SessionState::Live => {
                let streak = self.bump_streak();
                Admission::Begin(self.next_round(Some(streak)))
            }
            // No live session to rebuild.
            SessionState::Idle | SessionState::Failed => Admission::Stale,
        }
    }

    /// Records the outcome of round `generation`; returns a follow-up round if a
    /// closure was signalled while it was in flight.
    pub fn complete(&mut self, generation: u64, ok: bool) -> Option<Round> {
        if generation != self.generation || self.closed {
            return None;
        }
        let pending = std::mem::take(&mut self.pending_reconnect);
        if !ok {
            self.state = SessionState::Failed;
            return None;
        }
        self.state = SessionState::Live;
        if pending {
            let streak = self.bump_streak();
            return Some(self.next_round(Some(streak)));
        }
        None
    }

    /// A logged-in status resets the reconnect streak.
    pub fn logged_in(&mut self) {
        self.streak = 0;
    }

    pub fn shutdown(&mut self) {
        self.closed = true;
        self.pending_reconnect = false;
        self.state = SessionState::Idle;
    }

    fn next_round(&mut self, reconnect: Option<u32>) -> Round {
        self.generation += 1;
        self.state = SessionState::Creating;
        self.pending_reconnect = false;
        Round {
            generation: self.generation,
            reconnect,
        }
    }

    /// Returns the streak position of the reconnect about to start.
    fn bump_streak(&mut self) -> u32 {
        let position = self.streak;
        self.streak = self.streak.saturating_add(1);
        position
    }
}
