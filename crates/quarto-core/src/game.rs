//! Core game state machine.
//!
//! This module contains the main `GameState` struct, move validation and
//! atomic application, and snapshot resumption.

use crate::actions::Move;
use crate::board::{Board, Outcome, PlayerId, CELL_COUNT};
use crate::piece::{Piece, PIECE_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Moves are being exchanged
    InProgress,
    /// A quarto was announced and confirmed
    Won { winner: PlayerId },
    /// Board filled up without a quarto
    Draw,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GamePhase::InProgress)
    }
}

impl From<Outcome> for GamePhase {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Won(winner) => GamePhase::Won { winner },
            Outcome::Draw => GamePhase::Draw,
            Outcome::Continue => GamePhase::InProgress,
        }
    }
}

/// Reasons a move is refused. The state is never changed by a refused move.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvalidMove {
    #[error("The position {0} is not free")]
    PositionOccupied(usize),

    #[error("Your move should contain a \"pos\" key in range(16)")]
    PositionOutOfRange,

    #[error("You must specify the next piece to play as an index into the remaining pieces")]
    NextPieceOutOfRange,

    #[error("There is no Quarto!")]
    FalseQuarto,

    #[error("A valid move must be a valid JSON string: {0}")]
    MalformedEncoding(String),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,
}

/// Errors when resuming a game from a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Expected {expected} pieces across board and remaining pieces, found {found}")]
    WrongPieceCount { expected: usize, found: usize },

    #[error("Piece {0} appears more than once")]
    DuplicatePiece(Piece),

    #[error("Piece to play {index} is not an index into {remaining} remaining pieces")]
    PieceToPlayOutOfRange { index: usize, remaining: usize },

    #[error("No piece to play although the game has started")]
    MissingPieceToPlay,

    #[error("Player {0} does not exist")]
    UnknownPlayer(PlayerId),

    #[error("Quarto announced but no line qualifies")]
    UnverifiedQuarto,
}

/// The visible state exchanged between players.
///
/// This is the serialized form of a game; `GameState::from_snapshot` checks
/// it before play resumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board: Board,
    pub remaining_pieces: Vec<Piece>,
    pub piece_to_play: Option<usize>,
    pub quarto_announced: bool,
    pub current_player: PlayerId,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    board: Board,
    remaining_pieces: Vec<Piece>,
    /// Index into `remaining_pieces`
    piece_to_play: Option<usize>,
    quarto_announced: bool,
    current_player: PlayerId,
    phase: GamePhase,
}

impl GameState {
    /// Create a new game with a random starting player
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self::with_first_player(rng.gen_range(0..2))
    }

    /// Create a new game where `player` moves first
    pub fn with_first_player(player: PlayerId) -> Self {
        Self {
            board: Board::new(),
            remaining_pieces: Piece::catalog(),
            piece_to_play: None,
            quarto_announced: false,
            current_player: player % 2,
            phase: GamePhase::InProgress,
        }
    }

    /// Resume a game from its visible state
    pub fn from_snapshot(snapshot: GameSnapshot) -> Result<Self, SnapshotError> {
        let GameSnapshot {
            board,
            remaining_pieces,
            piece_to_play,
            quarto_announced,
            current_player,
        } = snapshot;

        if current_player > 1 {
            return Err(SnapshotError::UnknownPlayer(current_player));
        }

        let found = board.pieces().count() + remaining_pieces.len();
        if found != PIECE_COUNT {
            return Err(SnapshotError::WrongPieceCount {
                expected: PIECE_COUNT,
                found,
            });
        }

        // 16 distinct pieces can only be the whole catalog
        let mut seen = HashSet::new();
        for piece in board.pieces().chain(remaining_pieces.iter().copied()) {
            if !seen.insert(piece) {
                return Err(SnapshotError::DuplicatePiece(piece));
            }
        }

        match piece_to_play {
            Some(index) if index >= remaining_pieces.len() => {
                return Err(SnapshotError::PieceToPlayOutOfRange {
                    index,
                    remaining: remaining_pieces.len(),
                });
            }
            None if !remaining_pieces.is_empty() && board.pieces().next().is_some() => {
                return Err(SnapshotError::MissingPieceToPlay);
            }
            _ => {}
        }

        if quarto_announced && !board.has_quarto() {
            return Err(SnapshotError::UnverifiedQuarto);
        }

        let phase = board.outcome(quarto_announced, current_player).into();
        Ok(Self {
            board,
            remaining_pieces,
            piece_to_play,
            quarto_announced,
            current_player,
            phase,
        })
    }

    /// Capture the visible state
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            remaining_pieces: self.remaining_pieces.clone(),
            piece_to_play: self.piece_to_play,
            quarto_announced: self.quarto_announced,
            current_player: self.current_player,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn remaining_pieces(&self) -> &[Piece] {
        &self.remaining_pieces
    }

    /// The piece the current player has to place, if any
    pub fn piece_to_play(&self) -> Option<Piece> {
        self.piece_to_play
            .and_then(|index| self.remaining_pieces.get(index))
            .copied()
    }

    pub fn piece_to_play_index(&self) -> Option<usize> {
        self.piece_to_play
    }

    pub fn quarto_announced(&self) -> bool {
        self.quarto_announced
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Check if the game is finished
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Get the winner if the game is won
    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Won { winner } => Some(winner),
            _ => None,
        }
    }

    /// Run win detection on the current board
    pub fn outcome(&self) -> Outcome {
        self.board.outcome(self.quarto_announced, self.current_player)
    }

    /// Hand the turn to the other player
    pub fn advance_turn(&mut self) {
        self.current_player = 1 - self.current_player;
    }

    /// Validate and apply a move for the current player.
    ///
    /// All steps run on a working copy that replaces the state only when
    /// every step succeeded, so a refused move leaves no trace.
    pub fn apply_move(&mut self, mv: &Move) -> Result<Outcome, InvalidMove> {
        match self.try_move(mv) {
            Ok((working, outcome)) => {
                *self = working;
                Ok(outcome)
            }
            Err(e) => {
                let encoded = mv.encode();
                debug!(player = self.current_player, %encoded, "Rejected move: {}", e);
                Err(e)
            }
        }
    }

    /// Report what `mv` would do without applying it
    pub fn check_move(&self, mv: &Move) -> Result<Outcome, InvalidMove> {
        self.try_move(mv).map(|(_, outcome)| outcome)
    }

    fn try_move(&self, mv: &Move) -> Result<(GameState, Outcome), InvalidMove> {
        if self.is_finished() {
            return Err(InvalidMove::GameOver);
        }

        let mut working = self.clone();
        let outcome = working.apply_steps(mv)?;
        working.phase = outcome.into();
        Ok((working, outcome))
    }

    fn apply_steps(&mut self, mv: &Move) -> Result<Outcome, InvalidMove> {
        // Place the piece received from the opponent
        if let Some(index) = self.piece_to_play {
            let pos = mv
                .pos
                .and_then(|pos| usize::try_from(pos).ok())
                .filter(|&pos| pos < CELL_COUNT)
                .ok_or(InvalidMove::PositionOutOfRange)?;
            let piece = *self
                .remaining_pieces
                .get(index)
                .ok_or(InvalidMove::NextPieceOutOfRange)?;

            self.board.place(pos, piece)?;
            self.remaining_pieces.remove(index);
        }

        // Choose the piece for the opponent
        self.piece_to_play = if self.remaining_pieces.is_empty() {
            None
        } else {
            let next = mv
                .next_piece
                .and_then(|next| usize::try_from(next).ok())
                .filter(|&next| next < self.remaining_pieces.len())
                .ok_or(InvalidMove::NextPieceOutOfRange)?;
            Some(next)
        };

        match mv.quarto {
            Some(announced) => {
                self.quarto_announced = announced;
                match self.outcome() {
                    won @ Outcome::Won(_) => Ok(won),
                    _ => Err(InvalidMove::FalseQuarto),
                }
            }
            None => {
                self.quarto_announced = false;
                Ok(self.outcome())
            }
        }
    }

    /// Decode and apply a move on behalf of `player`, then pass the turn
    /// unless the game just ended.
    pub fn submit(&mut self, player: PlayerId, encoded: &str) -> Result<Outcome, InvalidMove> {
        if self.is_finished() {
            return Err(InvalidMove::GameOver);
        }
        if player != self.current_player {
            return Err(InvalidMove::NotYourTurn);
        }

        let mv = Move::decode(encoded)?;
        let outcome = self.apply_move(&mv)?;
        if outcome == Outcome::Continue {
            self.advance_turn();
        }
        Ok(outcome)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board:")?;
        write!(f, "{}", self.board)?;

        writeln!(f, "\nRemaining Pieces:")?;
        let remaining: Vec<String> = self.remaining_pieces.iter().map(Piece::to_string).collect();
        writeln!(f, "{}", remaining.join(", "))?;

        if let Some(piece) = self.piece_to_play() {
            writeln!(f, "\nPiece to Play:")?;
            writeln!(f, "{}", piece)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Color, Filling, Height, Shape};
    use pretty_assertions::assert_eq;

    fn catalog_index(piece: Piece) -> usize {
        Piece::catalog().iter().position(|p| *p == piece).unwrap()
    }

    #[test]
    fn test_new_game() {
        let game = GameState::with_first_player(1);
        assert_eq!(game.current_player(), 1);
        assert_eq!(game.remaining_pieces().len(), 16);
        assert!(game.piece_to_play().is_none());
        assert!(!game.quarto_announced());
        assert_eq!(game.phase(), GamePhase::InProgress);

        let random = GameState::new();
        assert!(random.current_player() <= 1);
    }

    #[test]
    fn test_first_move_only_offers() {
        let mut game = GameState::with_first_player(0);
        let outcome = game.apply_move(&Move::offer(5)).unwrap();

        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(game.piece_to_play_index(), Some(5));
        assert_eq!(game.piece_to_play(), Some(Piece::catalog()[5]));
        assert_eq!(game.remaining_pieces().len(), 16);
    }

    #[test]
    fn test_first_move_ignores_position() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::place(3, 5)).unwrap();
        assert_eq!(game.board().empty_cells().len(), 16);
    }

    #[test]
    fn test_placement_moves_piece_to_board() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(5)).unwrap();
        game.apply_move(&Move::place(10, 0)).unwrap();

        assert_eq!(game.board().get(10), Some(Piece::catalog()[5]));
        assert_eq!(game.remaining_pieces().len(), 15);
        assert!(!game.remaining_pieces().contains(&Piece::catalog()[5]));
        assert_eq!(game.piece_to_play(), Some(Piece::catalog()[0]));
    }

    #[test]
    fn test_occupied_position_rejected_without_change() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        game.apply_move(&Move::place(7, 0)).unwrap();

        let before = game.clone();
        let err = game.apply_move(&Move::place(7, 1)).unwrap_err();
        assert_eq!(err, InvalidMove::PositionOccupied(7));
        assert_eq!(game, before);
    }

    #[test]
    fn test_missing_or_bad_position_rejected() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        let before = game.clone();

        for mv in [
            Move::offer(1),
            Move {
                pos: Some(16),
                next_piece: Some(0),
                quarto: None,
            },
            Move {
                pos: Some(-1),
                next_piece: Some(0),
                quarto: None,
            },
        ] {
            assert_eq!(game.apply_move(&mv), Err(InvalidMove::PositionOutOfRange));
            assert_eq!(game, before);
        }
    }

    #[test]
    fn test_bad_next_piece_rolls_back_placement() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        let before = game.clone();

        // 15 pieces remain after placing, so 15 is out of range
        let err = game.apply_move(&Move::place(0, 15)).unwrap_err();
        assert_eq!(err, InvalidMove::NextPieceOutOfRange);
        assert_eq!(game, before);

        let err = game.apply_move(&Move::place_last(0)).unwrap_err();
        assert_eq!(err, InvalidMove::NextPieceOutOfRange);
        assert_eq!(game, before);
    }

    #[test]
    fn test_false_quarto_rolls_back_everything() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        let before = game.clone();

        let err = game.apply_move(&Move::place(0, 0).with_quarto()).unwrap_err();
        assert_eq!(err, InvalidMove::FalseQuarto);
        assert_eq!(game, before);
        assert!(game.board().get(0).is_none());
    }

    #[test]
    fn test_explicit_false_quarto_is_still_a_claim() {
        let mut game = GameState::with_first_player(0);
        let before = game.clone();
        let mv = Move {
            quarto: Some(false),
            ..Move::offer(0)
        };
        assert_eq!(game.apply_move(&mv), Err(InvalidMove::FalseQuarto));
        assert_eq!(game, before);
    }

    #[test]
    fn test_check_move_never_changes_state() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        let before = game.clone();

        let claim = Move::place(0, 0).with_quarto();
        assert_eq!(game.check_move(&claim), Err(InvalidMove::FalseQuarto));
        assert_eq!(game.check_move(&Move::place(0, 0)), Ok(Outcome::Continue));
        assert_eq!(game, before);
        assert!(game.board().get(0).is_none());
    }

    #[test]
    fn test_row_of_round_pieces_wins() {
        let round = [
            Piece::new(Shape::Round, Color::Dark, Height::Low, Filling::Empty),
            Piece::new(Shape::Round, Color::Light, Height::High, Filling::Full),
            Piece::new(Shape::Round, Color::Dark, Height::High, Filling::Empty),
            Piece::new(Shape::Round, Color::Light, Height::Low, Filling::Full),
        ];

        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(catalog_index(round[0]))).unwrap();
        for (pos, pair) in round.windows(2).enumerate() {
            let next = game
                .remaining_pieces()
                .iter()
                .filter(|p| **p != pair[0])
                .position(|p| *p == pair[1])
                .unwrap();
            game.apply_move(&Move::place(pos, next)).unwrap();
            game.advance_turn();
        }

        let mover = game.current_player();
        let outcome = game.apply_move(&Move::place(3, 0).with_quarto()).unwrap();
        assert_eq!(outcome, Outcome::Won(mover));
        assert_eq!(game.winner(), Some(mover));
        assert!(game.quarto_announced());
        assert!(game.is_finished());

        // Absorbing: nothing is accepted any more
        let before = game.clone();
        assert_eq!(game.apply_move(&Move::place(4, 0)), Err(InvalidMove::GameOver));
        assert_eq!(game, before);
    }

    #[test]
    fn test_submit_enforces_turns() {
        let mut game = GameState::with_first_player(0);
        assert_eq!(game.submit(1, r#"{"nextPiece": 0}"#), Err(InvalidMove::NotYourTurn));

        let outcome = game.submit(0, r#"{"nextPiece": 0}"#).unwrap();
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(game.current_player(), 1);

        let err = game.submit(1, "{pos: 1").unwrap_err();
        assert!(matches!(err, InvalidMove::MalformedEncoding(_)));
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut game = GameState::with_first_player(0);
        game.submit(0, r#"{"nextPiece": 3}"#).unwrap();
        game.submit(1, r#"{"pos": 6, "nextPiece": 0}"#).unwrap();

        let restored = GameState::from_snapshot(game.snapshot()).unwrap();
        assert_eq!(restored, game);
    }

    #[test]
    fn test_snapshot_json_uses_camel_case() {
        let game = GameState::with_first_player(1);
        let json = serde_json::to_value(game.snapshot()).unwrap();
        assert_eq!(json["pieceToPlay"], serde_json::Value::Null);
        assert_eq!(json["quartoAnnounced"], false);
        assert_eq!(json["currentPlayer"], 1);
        assert_eq!(json["board"].as_array().unwrap().len(), 16);
        assert_eq!(json["remainingPieces"].as_array().unwrap().len(), 16);
    }

    #[test]
    fn test_snapshot_validation() {
        let good = GameState::with_first_player(0).snapshot();

        let mut missing = good.clone();
        missing.remaining_pieces.pop();
        assert_eq!(
            GameState::from_snapshot(missing),
            Err(SnapshotError::WrongPieceCount {
                expected: 16,
                found: 15
            })
        );

        let mut duplicate = good.clone();
        duplicate.remaining_pieces[1] = duplicate.remaining_pieces[0];
        assert!(matches!(
            GameState::from_snapshot(duplicate),
            Err(SnapshotError::DuplicatePiece(_))
        ));

        let mut bad_index = good.clone();
        bad_index.piece_to_play = Some(16);
        assert!(matches!(
            GameState::from_snapshot(bad_index),
            Err(SnapshotError::PieceToPlayOutOfRange { .. })
        ));

        let mut mid_game = GameState::with_first_player(0);
        mid_game.apply_move(&Move::offer(0)).unwrap();
        mid_game.apply_move(&Move::place(5, 0)).unwrap();
        let mut no_pending = mid_game.snapshot();
        no_pending.piece_to_play = None;
        assert_eq!(
            GameState::from_snapshot(no_pending),
            Err(SnapshotError::MissingPieceToPlay)
        );

        let mut bad_player = good.clone();
        bad_player.current_player = 2;
        assert_eq!(
            GameState::from_snapshot(bad_player),
            Err(SnapshotError::UnknownPlayer(2))
        );

        let mut unverified = good;
        unverified.quarto_announced = true;
        assert_eq!(
            GameState::from_snapshot(unverified),
            Err(SnapshotError::UnverifiedQuarto)
        );
    }

    #[test]
    fn test_display_lists_pieces() {
        let mut game = GameState::with_first_player(0);
        game.apply_move(&Move::offer(0)).unwrap();
        let text = game.to_string();
        assert!(text.starts_with("Board:\n"));
        assert!(text.contains("Remaining Pieces:"));
        assert!(text.contains("Piece to Play:\n (ED) "));
    }
}
