//! Locally-known board, turn and roster.

use std::collections::HashSet;

use crate::game::rules::{BOARD_SIZE, PLACEHOLDER_VALUE};
use crate::protocol::{GameSnapshot, GameStatus, Player, Tile};
use crate::session::Session;
use crate::util::id::PlayerId;

/// What a snapshot did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardUpdate {
    Replaced,
    /// The snapshot carried no board; the current one stays.
    Kept,
    /// The snapshot board had an impossible length and was ignored.
    Rejected { len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed,
    /// The real board has not arrived yet. The placeholder is left alone but
    /// our own score still follows the reveal.
    Unplaced,
    /// Index outside the board.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct BoardStore {
    me: PlayerId,
    score: i64,
    board: Vec<Tile>,
    authoritative: bool,
    current_player: Option<Player>,
    players: Vec<Player>,
    status: GameStatus,
}

impl BoardStore {
    pub fn new(session: &Session) -> Self {
        Self {
            me: session.id.clone(),
            score: session.score,
            board: Vec::new(),
            authoritative: false,
            current_player: None,
            players: Vec::new(),
            status: GameStatus::Waiting,
        }
    }

    /// Fills an empty board with the loading placeholder: the first half worth
    /// `+PLACEHOLDER_VALUE`, the rest `-PLACEHOLDER_VALUE`, all hidden.
    pub fn show_placeholder(&mut self) {
        if self.authoritative {
            return;
        }
        self.board = (0..BOARD_SIZE)
            .map(|i| {
                let value = if i < BOARD_SIZE / 2 { PLACEHOLDER_VALUE } else { -PLACEHOLDER_VALUE };
                Tile::hidden(value)
            })
            .collect();
    }

    pub fn apply_snapshot(&mut self, snapshot: GameSnapshot) -> BoardUpdate {
        let GameSnapshot { board, current_player, players, status } = snapshot;

        let update = match board.len() {
            BOARD_SIZE => {
                self.board = board;
                self.authoritative = true;
                BoardUpdate::Replaced
            }
            0 => BoardUpdate::Kept,
            len => {
                tracing::warn!(len, "ignoring snapshot board of unexpected size");
                BoardUpdate::Rejected { len }
            }
        };

        let mut seen = HashSet::new();
        self.players = players.into_iter().filter(|p| seen.insert(p.id.clone())).collect();
        self.current_player = current_player;
        self.status = status;
        update
    }

    /// Reveals exactly one tile. The local score follows `new_score` only when
    /// the reveal was ours; other players' scores come from snapshots alone.
    pub fn apply_tile_reveal(
        &mut self,
        index: usize,
        value: i64,
        revealing_player: &PlayerId,
        new_score: i64,
    ) -> RevealOutcome {
        if index >= BOARD_SIZE {
            return RevealOutcome::Ignored;
        }
        if *revealing_player == self.me {
            self.score = new_score;
        }
        match self.board.get_mut(index) {
            Some(tile) if self.authoritative => {
                *tile = Tile { value, revealed: true };
                RevealOutcome::Revealed
            }
            _ => RevealOutcome::Unplaced,
        }
    }

    pub fn set_score(&mut self, score: i64) {
        self.score = score;
    }

    /// Drops the current turn holder, but only if it is still `player`. A
    /// timeout that arrives after a newer snapshot moved the turn on is stale.
    pub fn clear_current_player_if(&mut self, player: &PlayerId) -> bool {
        match &self.current_player {
            Some(current) if current.id == *player => {
                self.current_player = None;
                true
            }
            _ => false,
        }
    }

    /// Discards everything learned from the server.
    pub fn clear(&mut self) {
        self.board.clear();
        self.authoritative = false;
        self.current_player = None;
        self.players.clear();
        self.status = GameStatus::Waiting;
    }

    pub fn me(&self) -> &PlayerId {
        &self.me
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn board(&self) -> &[Tile] {
        &self.board
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.board.get(index)
    }

    /// True once a real board from the server has replaced the placeholder.
    pub fn has_board(&self) -> bool {
        self.authoritative
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player.as_ref()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_your_turn(&self) -> bool {
        self.current_player.as_ref().is_some_and(|p| p.id == self.me)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn player(id: &str) -> Player {
        Player { id: PlayerId::new(id), username: format!("user-{id}"), score: 0, is_blocked: false }
    }

    pub(crate) fn board() -> Vec<Tile> {
        (0..BOARD_SIZE as i64).map(|i| Tile::hidden((i - 8) * 1000)).collect()
    }

    pub(crate) fn snapshot(current: Option<&str>, status: GameStatus) -> GameSnapshot {
        GameSnapshot {
            board: board(),
            current_player: current.map(player),
            players: vec![player("me"), player("rival")],
            status,
        }
    }

    fn store() -> BoardStore {
        BoardStore::new(&Session::new("me", "ana", 10_000))
    }

    #[test]
    fn snapshot_is_read_back_exactly() {
        let mut s = store();
        let snap = snapshot(Some("rival"), GameStatus::Playing);
        assert_eq!(s.apply_snapshot(snap.clone()), BoardUpdate::Replaced);
        assert_eq!(s.board(), snap.board.as_slice());
        assert_eq!(s.players(), snap.players.as_slice());
        assert_eq!(s.current_player(), snap.current_player.as_ref());
        assert_eq!(s.status(), GameStatus::Playing);
        assert!(!s.is_your_turn());
    }

    #[test]
    fn placeholder_is_replaced_not_merged() {
        let mut s = store();
        s.show_placeholder();
        assert_eq!(s.board().len(), BOARD_SIZE);
        assert!(!s.has_board());
        assert_eq!(s.board()[0].value, PLACEHOLDER_VALUE);
        assert_eq!(s.board()[15].value, -PLACEHOLDER_VALUE);

        s.apply_snapshot(snapshot(None, GameStatus::Waiting));
        assert!(s.has_board());
        assert_eq!(s.board(), board().as_slice());
    }

    #[test]
    fn reveal_before_real_board_keeps_placeholder_but_takes_our_score() {
        let mut s = store();
        s.show_placeholder();
        let before = s.board().to_vec();
        assert_eq!(s.apply_tile_reveal(2, 5000, &PlayerId::new("rival"), 1), RevealOutcome::Unplaced);
        assert_eq!(s.score(), 10_000);
        assert_eq!(s.apply_tile_reveal(2, 5000, &PlayerId::new("me"), 15_000), RevealOutcome::Unplaced);
        assert_eq!(s.board(), before.as_slice());
        assert_eq!(s.score(), 15_000);
        assert!(!s.has_board());
    }

    #[test]
    fn empty_or_odd_boards_keep_the_current_board() {
        let mut s = store();
        s.apply_snapshot(snapshot(None, GameStatus::Waiting));

        let mut empty = snapshot(Some("me"), GameStatus::Playing);
        empty.board.clear();
        assert_eq!(s.apply_snapshot(empty), BoardUpdate::Kept);
        assert_eq!(s.board(), board().as_slice());
        assert!(s.is_your_turn());

        let mut short = snapshot(None, GameStatus::Playing);
        short.board.truncate(5);
        assert_eq!(s.apply_snapshot(short), BoardUpdate::Rejected { len: 5 });
        assert_eq!(s.board().len(), BOARD_SIZE);
    }

    #[test]
    fn reveal_touches_only_its_tile() {
        for i in 0..BOARD_SIZE {
            let mut s = store();
            s.apply_snapshot(snapshot(None, GameStatus::Playing));
            let before = s.board().to_vec();
            assert_eq!(s.apply_tile_reveal(i, 9000, &PlayerId::new("rival"), 1), RevealOutcome::Revealed);
            for (j, tile) in s.board().iter().enumerate() {
                if j == i {
                    assert_eq!(*tile, Tile { value: 9000, revealed: true });
                } else {
                    assert_eq!(*tile, before[j]);
                }
            }
        }
    }

    #[test]
    fn repeated_reveal_is_idempotent() {
        let mut s = store();
        s.apply_snapshot(snapshot(None, GameStatus::Playing));
        s.apply_tile_reveal(4, -2000, &PlayerId::new("rival"), 0);
        let once = s.board().to_vec();
        s.apply_tile_reveal(4, -2000, &PlayerId::new("rival"), 0);
        assert_eq!(s.board(), once.as_slice());
    }

    #[test]
    fn out_of_bounds_reveal_is_a_no_op() {
        let mut s = store();
        s.apply_snapshot(snapshot(None, GameStatus::Playing));
        assert_eq!(s.apply_tile_reveal(16, 1, &PlayerId::new("me"), 99), RevealOutcome::Ignored);
        assert_eq!(s.board(), board().as_slice());
        assert_eq!(s.score(), 10_000);
    }

    #[test]
    fn score_follows_only_our_own_reveals() {
        let mut s = store();
        s.apply_snapshot(snapshot(None, GameStatus::Playing));
        s.apply_tile_reveal(1, 5000, &PlayerId::new("rival"), 55_000);
        assert_eq!(s.score(), 10_000);
        s.apply_tile_reveal(2, 5000, &PlayerId::new("me"), 15_000);
        assert_eq!(s.score(), 15_000);
        s.set_score(3);
        assert_eq!(s.score(), 3);
    }

    #[test]
    fn duplicate_roster_ids_keep_first() {
        let mut s = store();
        let mut snap = snapshot(None, GameStatus::Waiting);
        let mut dup = player("me");
        dup.username = "impostor".into();
        snap.players.push(dup);
        s.apply_snapshot(snap);
        assert_eq!(s.players().len(), 2);
        assert_eq!(s.players()[0].username, "user-me");
    }

    #[test]
    fn stale_timeout_does_not_clear_newer_turn() {
        let mut s = store();
        s.apply_snapshot(snapshot(Some("rival"), GameStatus::Playing));
        assert!(!s.clear_current_player_if(&PlayerId::new("me")));
        assert_eq!(s.current_player().map(|p| p.id.as_str()), Some("rival"));
        assert!(s.clear_current_player_if(&PlayerId::new("rival")));
        assert!(s.current_player().is_none());
    }

    #[test]
    fn clear_discards_server_state() {
        let mut s = store();
        s.apply_snapshot(snapshot(Some("me"), GameStatus::Playing));
        s.clear();
        assert!(s.board().is_empty());
        assert!(s.players().is_empty());
        assert!(!s.is_your_turn());
        assert_eq!(s.status(), GameStatus::Waiting);
    }
}
