//! Inbound events → store and timer mutations plus notices.

use tokio::time::Instant;

use crate::game::notice::{format_points, NoticeKind};
use crate::game::store::RevealOutcome;
use crate::game::{Game, Outbox};
use crate::protocol::{InboundEvent, OutboundEvent, TileReveal, TurnTimeout};

pub const MSG_WAIT_TURN: &str = "Wait for your turn!";
pub const MSG_TIME_UP: &str = "Your time is up!";
pub const MSG_BLOCKED: &str = "Your account has been blocked by the administrator.";

impl Game {
    pub fn dispatch(&mut self, event: InboundEvent, out: &impl Outbox, now: Instant) {
        if self.is_ending() {
            tracing::debug!(event = event.name(), "session ending, event dropped");
            return;
        }
        tracing::debug!(event = event.name(), "dispatch");

        match event {
            InboundEvent::Connect => {
                tracing::info!("connected to game server, joining");
                self.connected = true;
                out.emit(OutboundEvent::JoinGame);
            }
            InboundEvent::ConnectError(detail) => {
                self.connected = false;
                self.notices.post(
                    NoticeKind::Error,
                    format!("Connection error with the server: {detail}"),
                    now,
                );
            }
            InboundEvent::GameState(snapshot) => {
                let update = self.store.apply_snapshot(snapshot);
                tracing::debug!(?update, your_turn = self.store.is_your_turn(), "snapshot applied");
                self.restart_turn_if_ours(now);
            }
            InboundEvent::TileSelected(reveal) => self.on_tile_selected(reveal, now),
            InboundEvent::TurnTimeout(TurnTimeout { player_id }) => {
                if player_id != *self.store.me() {
                    tracing::debug!(%player_id, "turn timeout for another player");
                } else if self.store.clear_current_player_if(&player_id) {
                    self.notices.post(NoticeKind::Warning, MSG_TIME_UP, now);
                } else {
                    tracing::debug!("stale turn timeout, turn already moved on");
                }
            }
            InboundEvent::ScoreUpdate(score) => self.store.set_score(score),
            InboundEvent::Blocked => {
                tracing::warn!("account blocked by the server");
                self.notices.post_sticky(NoticeKind::Error, MSG_BLOCKED);
                self.schedule_exit(now);
            }
            InboundEvent::Message(text) => self.notices.post(NoticeKind::Info, text, now),
        }

        self.sync_timer(now);
    }

    fn on_tile_selected(&mut self, reveal: TileReveal, now: Instant) {
        let TileReveal { tile_index, tile_value, player_id, new_score } = reveal;
        match self.store.apply_tile_reveal(tile_index, tile_value, &player_id, new_score) {
            RevealOutcome::Ignored => {
                tracing::debug!(tile_index, "reveal outside the board ignored");
            }
            outcome => {
                if outcome == RevealOutcome::Unplaced {
                    tracing::debug!(tile_index, "reveal arrived before the board");
                }
                if player_id == *self.store.me() {
                    let points = format_points(tile_value.abs());
                    // A zero tile counts as a loss.
                    if tile_value > 0 {
                        self.notices.post(NoticeKind::Gain, format!("You won {points} points!"), now);
                    } else {
                        self.notices.post(NoticeKind::Loss, format!("You lost {points} points"), now);
                    }
                }
            }
        }
    }
}
