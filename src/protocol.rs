//! Wire model shared with the game server.
//!
//! Every frame on the wire is a JSON object `{"event": <name>, "data": <payload>}`;
//! `data` is absent for events without a payload.

use serde::{Deserialize, Serialize};

use crate::util::id::PlayerId;

// ========== Board and roster ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Signed point value, in whole points (multiples of a thousand in practice).
    pub value: i64,
    #[serde(default)]
    pub revealed: bool,
}

impl Tile {
    pub fn hidden(value: i64) -> Self {
        Self { value, revealed: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    #[default]
    Waiting,
    Playing,
    Finished,
}

// ========== Inbound ==========

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    #[serde(default)]
    pub board: Vec<Tile>,
    #[serde(default)]
    pub current_player: Option<Player>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileReveal {
    pub tile_index: usize,
    pub tile_value: i64,
    pub player_id: PlayerId,
    pub new_score: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnTimeout {
    pub player_id: PlayerId,
}

/// Everything the client can be told, by the server or by its own transport.
///
/// `Connect` and `ConnectError` never travel on the wire; the connection task
/// synthesises them from transport lifecycle changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    #[serde(skip)]
    Connect,
    #[serde(skip)]
    ConnectError(String),
    GameState(GameSnapshot),
    TileSelected(TileReveal),
    TurnTimeout(TurnTimeout),
    ScoreUpdate(i64),
    Blocked,
    Message(String),
}

impl InboundEvent {
    /// Decodes one text frame. Unknown event names are an error like any other
    /// malformed frame; callers log and drop them.
    pub fn from_frame(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::Connect => "connect",
            InboundEvent::ConnectError(_) => "connect_error",
            InboundEvent::GameState(_) => "gameState",
            InboundEvent::TileSelected(_) => "tileSelected",
            InboundEvent::TurnTimeout(_) => "turnTimeout",
            InboundEvent::ScoreUpdate(_) => "scoreUpdate",
            InboundEvent::Blocked => "blocked",
            InboundEvent::Message(_) => "message",
        }
    }
}

// ========== Outbound ==========

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    JoinGame,
    SelectTile {
        #[serde(rename = "tileIndex")]
        tile_index: usize,
    },
    LeaveGame,
}

impl OutboundEvent {
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_game_state_frame() {
        let frame = json!({
            "event": "gameState",
            "data": {
                "board": [{"value": 15000, "revealed": false}, {"value": -3000, "revealed": true}],
                "currentPlayer": {"id": "u1", "username": "ana", "score": 0, "isBlocked": false},
                "players": [{"id": "u1", "username": "ana", "score": 0}],
                "status": "playing"
            }
        })
        .to_string();

        let InboundEvent::GameState(snapshot) = InboundEvent::from_frame(&frame).unwrap() else {
            panic!("expected gameState");
        };
        assert_eq!(snapshot.board.len(), 2);
        assert!(snapshot.board[1].revealed);
        assert_eq!(snapshot.current_player.unwrap().id, PlayerId::new("u1"));
        assert_eq!(snapshot.status, GameStatus::Playing);
        assert!(!snapshot.players[0].is_blocked);
    }

    #[test]
    fn decodes_payloadless_and_scalar_events() {
        assert_eq!(InboundEvent::from_frame(r#"{"event":"blocked"}"#).unwrap(), InboundEvent::Blocked);
        assert_eq!(
            InboundEvent::from_frame(r#"{"event":"scoreUpdate","data":9000}"#).unwrap(),
            InboundEvent::ScoreUpdate(9000)
        );
        assert_eq!(
            InboundEvent::from_frame(r#"{"event":"message","data":"hola"}"#).unwrap(),
            InboundEvent::Message("hola".into())
        );
    }

    #[test]
    fn decodes_tile_selected_with_numeric_player_id() {
        let frame = r#"{"event":"tileSelected","data":{"tileIndex":5,"tileValue":-3000,"playerId":7,"newScore":7000}}"#;
        assert_eq!(
            InboundEvent::from_frame(frame).unwrap(),
            InboundEvent::TileSelected(TileReveal {
                tile_index: 5,
                tile_value: -3000,
                player_id: PlayerId::new("7"),
                new_score: 7000,
            })
        );
    }

    #[test]
    fn transport_only_events_are_not_accepted_from_the_wire() {
        assert!(InboundEvent::from_frame(r#"{"event":"connect"}"#).is_err());
        assert!(InboundEvent::from_frame(r#"{"event":"testResponse","data":{}}"#).is_err());
    }

    #[test]
    fn encodes_outbound_events() {
        assert_eq!(OutboundEvent::JoinGame.to_frame().unwrap(), r#"{"event":"joinGame"}"#);
        assert_eq!(
            OutboundEvent::SelectTile { tile_index: 3 }.to_frame().unwrap(),
            r#"{"event":"selectTile","data":{"tileIndex":3}}"#
        );
        assert_eq!(OutboundEvent::LeaveGame.to_frame().unwrap(), r#"{"event":"leaveGame"}"#);
    }

    #[test]
    fn missing_status_defaults_to_waiting() {
        let snapshot: GameSnapshot = serde_json::from_str(r#"{"board":[],"currentPlayer":null}"#).unwrap();
        assert_eq!(snapshot.status, GameStatus::Waiting);
        assert!(snapshot.players.is_empty());
    }
}
