//! The one loop that owns the game.
//!
//! Inbound events, local commands and the game's own deadlines are handled one
//! at a time on the same task. The sleep is rebuilt from
//! [`Game::next_deadline`] on every iteration, so a countdown or notice expiry
//! that was cancelled in the meantime never fires.

use std::future;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::game::{Game, Outbox, SessionEnd};
use crate::net::connection::{Connection, ConnectionConfig};
use crate::net::transport::Identity;
use crate::protocol::InboundEvent;
use crate::session::Session;

/// Local user intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select(usize),
    Retry,
    Quit,
}

impl Command {
    /// `3` selects tile 3, `retry` asks to join again, `quit` leaves.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim() {
            "q" | "quit" | "exit" => Some(Command::Quit),
            "r" | "retry" => Some(Command::Retry),
            other => other.parse().ok().map(Command::Select),
        }
    }
}

/// Connects, plays until the session ends, then tears everything down.
pub async fn play(
    config: ConnectionConfig,
    session: &Session,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    on_change: impl FnMut(&Game),
) -> SessionEnd {
    let mut game = Game::new(session);
    game.begin();

    info!(endpoint = %config.endpoint, "connecting");
    let (connection, mut events) = Connection::connect(config, Identity::from(session));
    let end = run(&mut game, &connection, &mut events, commands, on_change).await;

    // Stop listening before saying goodbye, so nothing is applied mid-teardown.
    events.close();
    drop(events);
    connection.close().await;
    game.teardown();
    info!(?end, "session over");
    end
}

/// Drives `game` until the user quits, the account is blocked, or the event
/// stream ends.
pub async fn run(
    game: &mut Game,
    out: &impl Outbox,
    events: &mut mpsc::UnboundedReceiver<InboundEvent>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    mut on_change: impl FnMut(&Game),
) -> SessionEnd {
    on_change(game);
    loop {
        let deadline = game.next_deadline();
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    debug!("event stream closed");
                    return SessionEnd::Left;
                };
                game.dispatch(event, out, Instant::now());
                on_change(game);
            }
            command = commands.recv() => {
                match command {
                    Some(Command::Select(index)) => {
                        game.submit_selection(index, out, Instant::now());
                    }
                    Some(Command::Retry) => {
                        game.retry_join(out);
                    }
                    Some(Command::Quit) | None => return SessionEnd::Left,
                }
                on_change(game);
            }
            _ = wait_for(deadline) => {
                let progress = game.advance(Instant::now());
                if let Some(end) = progress.session_end {
                    return end;
                }
                if progress.changed() {
                    on_change(game);
                }
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}
