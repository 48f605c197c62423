//! Countdown for the local participant's turn.
//!
//! The timer never sleeps on its own. It exposes the deadline of its next tick
//! and the client loop calls [`TurnTimer::tick`] when that deadline passes. Every
//! start bumps the epoch, and a tick carrying an older epoch is discarded, so a
//! countdown that was cancelled cannot come back.

use std::time::Duration;

use tokio::time::Instant;

use crate::game::rules::{TICK, TURN_COUNTDOWN};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTransition {
    Unchanged,
    Started { epoch: u64 },
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick belongs to a countdown that is no longer running.
    Stale,
    Counted { remaining: u32 },
    /// Local turn-timeout: the countdown reached zero.
    Expired,
}

#[derive(Debug, Clone)]
pub struct TurnTimer {
    phase: TimerPhase,
    remaining: u32,
    epoch: u64,
    next_tick: Option<Instant>,
    armed: bool,
    countdown: u32,
    unit: Duration,
}

impl Default for TurnTimer {
    fn default() -> Self {
        Self::new(TURN_COUNTDOWN, TICK)
    }
}

impl TurnTimer {
    pub fn new(countdown: u32, unit: Duration) -> Self {
        Self {
            phase: TimerPhase::Idle,
            remaining: countdown,
            epoch: 0,
            next_tick: None,
            armed: false,
            countdown,
            unit,
        }
    }

    /// Follows the turn state. Only edges of `is_your_turn && playing` act: a
    /// rising edge starts a fresh countdown, a falling edge cancels it.
    pub fn sync(&mut self, is_your_turn: bool, playing: bool, now: Instant) -> TimerTransition {
        let should_run = is_your_turn && playing;
        match (self.armed, should_run) {
            (false, true) => self.restart(now),
            (true, false) => {
                self.cancel();
                TimerTransition::Stopped
            }
            _ => TimerTransition::Unchanged,
        }
    }

    /// Starts a fresh countdown whatever state the timer is in. Used when the
    /// server hands us the turn again, so a running or expired countdown from
    /// the previous turn does not carry over.
    pub fn restart(&mut self, now: Instant) -> TimerTransition {
        self.armed = true;
        self.epoch += 1;
        self.phase = TimerPhase::Running;
        self.remaining = self.countdown;
        self.next_tick = Some(now + self.unit);
        tracing::debug!(epoch = self.epoch, remaining = self.remaining, "turn countdown started");
        TimerTransition::Started { epoch: self.epoch }
    }

    pub fn tick(&mut self, epoch: u64) -> TickOutcome {
        if self.phase != TimerPhase::Running || epoch != self.epoch {
            return TickOutcome::Stale;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.phase = TimerPhase::Expired;
            self.next_tick = None;
            tracing::info!("local turn countdown expired");
            return TickOutcome::Expired;
        }
        self.next_tick = self.next_tick.map(|at| at + self.unit);
        TickOutcome::Counted { remaining: self.remaining }
    }

    /// Back to idle with no pending tick.
    pub fn cancel(&mut self) {
        if self.phase == TimerPhase::Running {
            tracing::debug!(epoch = self.epoch, "turn countdown cancelled");
        }
        self.armed = false;
        self.epoch += 1;
        self.phase = TimerPhase::Idle;
        self.remaining = self.countdown;
        self.next_tick = None;
    }

    /// Epoch and due time of the next tick, if a countdown is running.
    pub fn deadline(&self) -> Option<(u64, Instant)> {
        self.next_tick.map(|at| (self.epoch, at))
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn remaining(&self) -> u32 {
        match self.phase {
            TimerPhase::Expired => 0,
            _ => self.remaining,
        }
    }
}
