//! The move a player submits each turn, and its wire encoding.
//!
//! A move is a JSON object with three optional keys:
//!
//! ```text
//! { "pos": 8, "nextPiece": 2, "quarto": true }
//! ```
//!
//! Values are kept as signed integers so that a negative position decodes
//! cleanly and is then rejected as out of range by the move applier, instead
//! of failing as a malformed encoding.

use crate::game::InvalidMove;
use serde::{Deserialize, Serialize};

/// One player's move
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// Cell for the piece received from the opponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<i64>,
    /// Index into the remaining pieces of the piece handed to the opponent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_piece: Option<i64>,
    /// Quarto announcement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarto: Option<bool>,
}

impl Move {
    /// Opening move: nothing to place, only a piece to hand over
    pub fn offer(next_piece: usize) -> Self {
        Self {
            next_piece: Some(next_piece as i64),
            ..Self::default()
        }
    }

    /// Place the pending piece and hand over the next one
    pub fn place(pos: usize, next_piece: usize) -> Self {
        Self {
            pos: Some(pos as i64),
            next_piece: Some(next_piece as i64),
            quarto: None,
        }
    }

    /// Place the last piece; nothing is left to hand over
    pub fn place_last(pos: usize) -> Self {
        Self {
            pos: Some(pos as i64),
            ..Self::default()
        }
    }

    pub fn with_quarto(mut self) -> Self {
        self.quarto = Some(true);
        self
    }

    /// Encode to wire text
    pub fn encode(&self) -> String {
        // A struct of optional integers and a bool always serializes
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode wire text. Any failure is an invalid move.
    pub fn decode(text: &str) -> Result<Self, InvalidMove> {
        serde_json::from_str(text).map_err(|e| InvalidMove::MalformedEncoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_skips_absent_keys() {
        assert_eq!(Move::offer(3).encode(), r#"{"nextPiece":3}"#);
        assert_eq!(
            Move::place(8, 2).with_quarto().encode(),
            r#"{"pos":8,"nextPiece":2,"quarto":true}"#
        );
        assert_eq!(Move::default().encode(), "{}");
    }

    #[test]
    fn test_decode_full_move() {
        let mv = Move::decode(r#"{"pos": 8, "quarto": true, "nextPiece": 2}"#).unwrap();
        assert_eq!(mv, Move::place(8, 2).with_quarto());
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let mv = Move::decode(r#"{"nextPiece": 0, "comment": "hi"}"#).unwrap();
        assert_eq!(mv, Move::offer(0));
    }

    #[test]
    fn test_decode_keeps_negative_values() {
        let mv = Move::decode(r#"{"pos": -1}"#).unwrap();
        assert_eq!(mv.pos, Some(-1));
    }

    #[test]
    fn test_decode_failures_are_malformed_encoding() {
        for text in ["", "not json", "42", r#"{"pos": "eight"}"#, r#"{"quarto": 1}"#] {
            assert!(
                matches!(Move::decode(text), Err(InvalidMove::MalformedEncoding(_))),
                "{:?} should be malformed",
                text
            );
        }
    }

    #[test]
    fn test_round_trip() {
        let moves = [
            Move::default(),
            Move::offer(15),
            Move::place(0, 0),
            Move::place_last(15).with_quarto(),
            Move {
                pos: Some(4),
                next_piece: None,
                quarto: Some(false),
            },
        ];
        for mv in moves {
            assert_eq!(Move::decode(&mv.encode()).unwrap(), mv);
        }
    }
}
