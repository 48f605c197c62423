//! Client-side game core: the board store, the turn timer, notifications, and
//! the two entry points that mutate them (inbound dispatch and local intents).
//!
//! Everything in here is synchronous and owned by a single loop. Time is passed
//! in explicitly; the loop sleeps until [`Game::next_deadline`] and then calls
//! [`Game::advance`].

pub mod controller;
pub mod dispatcher;
pub mod notice;
pub mod rules;
pub mod store;
pub mod timer;

use tokio::time::Instant;

use crate::game::notice::Notifier;
use crate::game::rules::BLOCKED_EXIT_DELAY;
use crate::game::store::BoardStore;
use crate::game::timer::{TickOutcome, TurnTimer};
use crate::protocol::{GameStatus, OutboundEvent};
use crate::session::Session;

/// Where intents go. The connection implements this; tests record into a Vec.
pub trait Outbox {
    /// Fire-and-forget: there is no acknowledgment and no retry.
    fn emit(&self, event: OutboundEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user chose to leave.
    Left,
    /// The server blocked the account.
    Blocked,
}

/// What happened during one [`Game::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub ticked: Option<TickOutcome>,
    pub notice_cleared: bool,
    pub session_end: Option<SessionEnd>,
}

impl Progress {
    pub fn changed(&self) -> bool {
        self.ticked.is_some_and(|t| t != TickOutcome::Stale)
            || self.notice_cleared
            || self.session_end.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    store: BoardStore,
    timer: TurnTimer,
    notices: Notifier,
    connected: bool,
    exit_at: Option<Instant>,
}

impl Game {
    pub fn new(session: &Session) -> Self {
        Self::with_parts(BoardStore::new(session), TurnTimer::default(), Notifier::default())
    }

    pub fn with_parts(store: BoardStore, timer: TurnTimer, notices: Notifier) -> Self {
        Self { store, timer, notices, connected: false, exit_at: None }
    }

    /// Shows the placeholder board until the server sends the real one.
    pub fn begin(&mut self) {
        self.store.show_placeholder();
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    pub fn notices(&self) -> &Notifier {
        &self.notices
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_ending(&self) -> bool {
        self.exit_at.is_some()
    }

    /// Earliest instant at which [`Game::advance`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.timer.deadline().map(|(_, at)| at),
            self.notices.deadline(),
            self.exit_at,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Runs every deadline that is due at `now`.
    pub fn advance(&mut self, now: Instant) -> Progress {
        let mut progress = Progress::default();
        if let Some((epoch, at)) = self.timer.deadline() {
            if at <= now {
                progress.ticked = Some(self.timer.tick(epoch));
            }
        }
        progress.notice_cleared = self.notices.expire(now);
        if self.exit_at.is_some_and(|at| at <= now) {
            progress.session_end = Some(SessionEnd::Blocked);
        }
        progress
    }

    /// Discards server state and stops every countdown.
    pub fn teardown(&mut self) {
        self.timer.cancel();
        self.store.clear();
        self.exit_at = None;
        self.connected = false;
    }

    fn sync_timer(&mut self, now: Instant) {
        let playing = self.store.status() == GameStatus::Playing;
        self.timer.sync(self.store.is_your_turn(), playing, now);
    }

    /// A snapshot naming us while playing is a new turn, even if the previous
    /// one was ours too.
    fn restart_turn_if_ours(&mut self, now: Instant) {
        if self.store.is_your_turn() && self.store.status() == GameStatus::Playing {
            self.timer.restart(now);
        }
    }

    fn schedule_exit(&mut self, now: Instant) {
        if self.exit_at.is_none() {
            self.exit_at = Some(now + BLOCKED_EXIT_DELAY);
        }
    }
}
