//! WebSocket protocol messages for Quarto matches.

use quarto_core::{GameSnapshot, PlayerId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Ask to be paired with the next waiting player
    Join { player_name: String },

    /// Submit an encoded move, e.g. `{"pos": 8, "nextPiece": 2}`
    Move { payload: String },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned connection ID
    Welcome { player_id: Uuid },

    /// Joined the lobby, no opponent yet
    Waiting,

    /// Paired with an opponent
    GameStarted {
        room_id: Uuid,
        player_index: PlayerId,
        opponent_name: String,
    },

    /// It is your turn to move on this state
    YourTurn { state: GameSnapshot },

    /// A move was applied
    StateChanged { state: GameSnapshot, mover: PlayerId },

    /// Your move was refused; the state is unchanged and you move again
    MoveRejected { reason: String },

    /// Game finished. `winner` is `None` for a draw.
    GameOver {
        winner: Option<PlayerId>,
        winner_name: Option<String>,
    },

    /// The opponent disconnected; the room is closed
    OpponentLeft,

    /// Protocol-level error (unreadable envelope, not in a game, ...)
    Error { message: String },

    /// Pong response
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_format() {
        let msg = ClientMessage::Move {
            payload: r#"{"nextPiece":3}"#.to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "Move", "payload": {"payload": "{\"nextPiece\":3}"}})
        );

        let ping: ClientMessage = serde_json::from_str(r#"{"type": "Ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping);
    }

    #[test]
    fn test_server_message_round_trip() {
        let msg = ServerMessage::GameOver {
            winner: None,
            winner_name: None,
        };
        let text = serde_json::to_string(&msg).unwrap();
        assert_eq!(serde_json::from_str::<ServerMessage>(&text).unwrap(), msg);
    }
}
