//! Rule-based automated opponent.
//!
//! Each turn has two decisions:
//! - Placement: complete a quarto with the received piece if any threat
//!   allows it, otherwise pick a random empty cell
//! - Offer: hand over a random piece that cannot complete any threat, or any
//!   random piece when none is safe
//!
//! Random choices are drawn from explicit candidate lists through an
//! injectable `Rng`, so a seeded player is fully reproducible.

use crate::actions::Move;
use crate::board::Board;
use crate::game::GameState;
use crate::piece::Piece;
use rand::prelude::*;
use std::collections::HashSet;
use tracing::trace;

/// Cells where placing `piece` completes a quarto
pub fn winning_cells(board: &Board, piece: &Piece) -> Vec<usize> {
    board
        .threats()
        .into_iter()
        .filter(|threat| threat.completed_by(piece))
        .map(|threat| threat.empty_cell)
        .collect()
}

/// Indices into `remaining` of the pieces that cannot complete any threat
pub fn safe_pieces(board: &Board, remaining: &[Piece]) -> Vec<usize> {
    let threats = board.threats();
    let dangerous: HashSet<usize> = remaining
        .iter()
        .enumerate()
        .filter(|(_, piece)| threats.iter().any(|threat| threat.completed_by(piece)))
        .map(|(index, _)| index)
        .collect();

    (0..remaining.len())
        .filter(|index| !dangerous.contains(index))
        .collect()
}

/// A heuristic player that can decide on moves
pub struct HeuristicPlayer<R = StdRng> {
    rng: R,
}

impl HeuristicPlayer<StdRng> {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for HeuristicPlayer<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> HeuristicPlayer<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Choose the cell for `piece`. `None` only when the board is full.
    pub fn choose_placement(&mut self, board: &Board, piece: &Piece) -> Option<usize> {
        if let Some(&pos) = winning_cells(board, piece).first() {
            trace!(pos, %piece, "Placement completes a quarto");
            return Some(pos);
        }
        board.empty_cells().choose(&mut self.rng).copied()
    }

    /// Choose the index of the piece to hand over. `None` when nothing is left.
    pub fn choose_offer(&mut self, board: &Board, remaining: &[Piece]) -> Option<usize> {
        let safe = safe_pieces(board, remaining);
        if let Some(&index) = safe.choose(&mut self.rng) {
            return Some(index);
        }
        trace!("No safe piece left to offer");
        (0..remaining.len()).collect::<Vec<_>>().choose(&mut self.rng).copied()
    }

    /// Decide the full move for the player whose turn it is in `game`.
    ///
    /// Returns `None` when the game is over.
    pub fn choose_move(&mut self, game: &GameState) -> Option<Move> {
        if game.is_finished() {
            return None;
        }

        let mut draft = TurnDraft::new(game);
        draft.place(self, game)?;
        draft.offer(self);
        Some(draft.finish(game))
    }
}

/// A move assembled step by step on a private copy of the board.
///
/// The offer is computed on the board as it stands after the placement.
pub(crate) struct TurnDraft {
    board: Board,
    remaining: Vec<Piece>,
    mv: Move,
}

impl TurnDraft {
    pub(crate) fn new(game: &GameState) -> Self {
        Self {
            board: game.board().clone(),
            remaining: game.remaining_pieces().to_vec(),
            mv: Move::default(),
        }
    }

    /// Put the received piece on the board. Nothing to do on the opening
    /// move; `None` when no cell is free.
    pub(crate) fn place<R: Rng>(
        &mut self,
        player: &mut HeuristicPlayer<R>,
        game: &GameState,
    ) -> Option<()> {
        let (Some(index), Some(piece)) = (game.piece_to_play_index(), game.piece_to_play()) else {
            return Some(());
        };
        let pos = player.choose_placement(&self.board, &piece)?;
        self.board.place(pos, piece).ok()?;
        self.remaining.remove(index);
        self.mv.pos = Some(pos as i64);
        Some(())
    }

    pub(crate) fn offer<R: Rng>(&mut self, player: &mut HeuristicPlayer<R>) {
        self.mv.next_piece = player
            .choose_offer(&self.board, &self.remaining)
            .map(|i| i as i64);
    }

    pub(crate) fn finish(&self, game: &GameState) -> Move {
        confirm_quarto(game, self.mv)
    }
}

/// Announce a quarto only if the move actually makes one.
///
/// The move is checked against `game` without applying it.
pub fn confirm_quarto(game: &GameState, mv: Move) -> Move {
    let claim = mv.with_quarto();
    match game.check_move(&claim) {
        Ok(_) => claim,
        Err(_) => Move {
            quarto: None,
            ..mv
        },
    }
}
