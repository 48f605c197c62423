//! Local intents, validated against local state before they reach the network.

use tokio::time::Instant;

use crate::game::dispatcher::MSG_WAIT_TURN;
use crate::game::notice::NoticeKind;
use crate::game::rules::BOARD_SIZE;
use crate::game::{Game, Outbox};
use crate::protocol::{GameStatus, OutboundEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    OutOfRange,
    AlreadyRevealed,
    NotYourTurn,
    NotPlaying,
    SessionEnding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Sent,
    Rejected(Rejection),
}

impl Game {
    /// Asks the server to reveal `index`.
    ///
    /// The tile is not marked revealed here; the board only changes when the
    /// server's `tileSelected` comes back.
    pub fn submit_selection(&mut self, index: usize, out: &impl Outbox, now: Instant) -> Selection {
        let rejection = if self.is_ending() {
            Some(Rejection::SessionEnding)
        } else if index >= BOARD_SIZE {
            Some(Rejection::OutOfRange)
        } else if self.store.tile(index).is_some_and(|t| t.revealed) {
            Some(Rejection::AlreadyRevealed)
        } else if !self.store.is_your_turn() {
            self.notices.post(NoticeKind::Warning, MSG_WAIT_TURN, now);
            Some(Rejection::NotYourTurn)
        } else if self.store.status() != GameStatus::Playing {
            Some(Rejection::NotPlaying)
        } else {
            None
        };

        match rejection {
            Some(reason) => {
                tracing::debug!(index, ?reason, "selection rejected locally");
                Selection::Rejected(reason)
            }
            None => {
                tracing::debug!(index, "selection sent");
                out.emit(OutboundEvent::SelectTile { tile_index: index });
                Selection::Sent
            }
        }
    }

    /// Re-sends `joinGame` while the real board has not arrived yet.
    pub fn retry_join(&self, out: &impl Outbox) -> bool {
        if self.store.has_board() || self.is_ending() {
            return false;
        }
        tracing::info!("retrying join");
        out.emit(OutboundEvent::JoinGame);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::store::tests::snapshot;
    use crate::game::testing::{game, Recorder};
    use crate::protocol::{InboundEvent, TileReveal};
    use crate::util::id::PlayerId;

    fn playing_our_turn(out: &Recorder, now: Instant) -> Game {
        let mut g = game();
        g.dispatch(InboundEvent::GameState(snapshot(Some("me"), GameStatus::Playing)), out, now);
        out.take();
        g
    }

    #[test]
    fn valid_selection_emits_intent_without_touching_board() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = playing_our_turn(&out, now);
        assert_eq!(g.submit_selection(7, &out, now), Selection::Sent);
        assert_eq!(out.take(), vec![OutboundEvent::SelectTile { tile_index: 7 }]);
        assert!(!g.store().board()[7].revealed);
    }

    #[test]
    fn revealed_tile_is_rejected_silently() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = playing_our_turn(&out, now);
        g.dispatch(
            InboundEvent::TileSelected(TileReveal {
                tile_index: 3,
                tile_value: 1000,
                player_id: PlayerId::new("rival"),
                new_score: 0,
            }),
            &out,
            now,
        );
        assert_eq!(g.submit_selection(3, &out, now), Selection::Rejected(Rejection::AlreadyRevealed));
        assert!(out.take().is_empty());
        assert!(g.notices().current().is_none());
    }

    #[test]
    fn revealed_check_comes_before_turn_check() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = game();
        let mut snap = snapshot(Some("rival"), GameStatus::Playing);
        snap.board[0].revealed = true;
        g.dispatch(InboundEvent::GameState(snap), &out, now);
        assert_eq!(g.submit_selection(0, &out, now), Selection::Rejected(Rejection::AlreadyRevealed));
        assert!(g.notices().current().is_none());
    }

    #[test]
    fn out_of_turn_selection_asks_to_wait() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = game();
        g.dispatch(InboundEvent::GameState(snapshot(Some("rival"), GameStatus::Playing)), &out, now);
        assert_eq!(g.submit_selection(1, &out, now), Selection::Rejected(Rejection::NotYourTurn));
        assert_eq!(g.notices().text(), Some(MSG_WAIT_TURN));
        assert!(out.take().is_empty());
    }

    #[test]
    fn selection_outside_play_is_rejected_silently() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = game();
        g.dispatch(InboundEvent::GameState(snapshot(Some("me"), GameStatus::Finished)), &out, now);
        assert_eq!(g.submit_selection(1, &out, now), Selection::Rejected(Rejection::NotPlaying));
        assert!(g.notices().current().is_none());
        assert!(out.take().is_empty());
    }

    #[test]
    fn index_past_the_board_is_rejected() {
        let out = Recorder::default();
        let now = Instant::now();
        let mut g = playing_our_turn(&out, now);
        assert_eq!(g.submit_selection(16, &out, now), Selection::Rejected(Rejection::OutOfRange));
        assert!(out.take().is_empty());
    }

    #[test]
    fn retry_join_only_before_board_arrives() {
        let out = Recorder::default();
        let now = Instant::now();
        let g = game();
        assert!(g.retry_join(&out));
        assert_eq!(out.take(), vec![OutboundEvent::JoinGame]);

        let g = playing_our_turn(&out, now);
        assert!(!g.retry_join(&out));
        assert!(out.take().is_empty());
    }
}
