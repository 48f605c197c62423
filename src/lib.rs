//! Client core for a turn-based, shared-board tile matching game.
//!
//! The server owns the game. This crate keeps a local copy of the board, the
//! turn and the scores in step with it, runs the local turn countdown, and
//! validates tile selections before sending them.

pub mod client;
pub mod config;
pub mod game;
pub mod net;
pub mod protocol;
pub mod session;
pub mod telemetry;
pub mod util;
pub mod view;

pub use client::{play, Command};
pub use game::{Game, Outbox, SessionEnd};
pub use protocol::{GameSnapshot, GameStatus, InboundEvent, OutboundEvent, Player, Tile};
pub use session::Session;
