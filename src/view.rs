//! Plain-text rendering of the current game state for the terminal binary.

use std::fmt::Write;

use crate::game::notice::format_points;
use crate::game::Game;
use crate::protocol::Tile;

const ROW_ICONS: [&str; 4] = ["💎", "💰", "🔴", "🏆"];
const COLUMNS: usize = 4;

/// Face of one tile: the row icon while hidden, the signed value once revealed.
pub fn tile_label(index: usize, tile: &Tile) -> String {
    if !tile.revealed {
        return ROW_ICONS.get(index / COLUMNS).copied().unwrap_or("?").to_string();
    }
    if tile.value > 0 {
        format!("+{}", format_points(tile.value))
    } else {
        format_points(tile.value)
    }
}

pub fn render(game: &Game, username: &str) -> String {
    let store = game.store();
    let mut out = String::new();

    let _ = writeln!(out, "Player: {username}");
    // A zero score is masked, as the account front-end does.
    match store.score() {
        0 => out.push_str("Score: *****\n"),
        score => {
            let _ = writeln!(out, "Score: {score}");
        }
    }
    if !game.is_connected() {
        out.push_str("(offline, reconnecting)\n");
    }

    match store.current_player() {
        Some(current) if store.is_your_turn() => {
            let _ = writeln!(out, "Current player: {} (your turn!)", current.username);
            let _ = writeln!(out, "Time left: {} seconds", game.timer().remaining());
        }
        Some(current) => {
            let _ = writeln!(out, "Current player: {}", current.username);
            let _ = writeln!(out, "Turn of {}", current.username);
        }
        None => out.push_str("Waiting for players...\n"),
    }

    if let Some(text) = game.notices().text() {
        let _ = writeln!(out, ">> {text}");
    }

    out.push('\n');
    if store.board().is_empty() {
        out.push_str("Loading board... (type `retry` to ask again)\n");
    } else {
        for (row, tiles) in store.board().chunks(COLUMNS).enumerate() {
            let cells: Vec<String> = tiles
                .iter()
                .enumerate()
                .map(|(col, tile)| {
                    let index = row * COLUMNS + col;
                    format!("{index:>2}:{:<5}", tile_label(index, tile))
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join(" "));
        }
        if !store.has_board() {
            out.push_str("(loading, type `retry` to ask again)\n");
        }
    }

    out.push_str("\nConnected players\n");
    let current = store.current_player().map(|p| &p.id);
    for player in store.players() {
        let marker = if Some(&player.id) == current { '>' } else { ' ' };
        let _ = writeln!(out, "{marker} {} ({})", player.username, player.score);
    }
    out
}
