//! Per-game lifecycle of an automated player.
//!
//! A session follows one game from the player's point of view:
//!
//! ```text
//! NotStarted -> InProgress(WaitForPiece -> ChoosePlacement -> WaitForOffer
//!                          -> ChooseOffer -> CheckWin -> WaitForPiece ...)
//!            -> Won(player) | Draw
//! ```
//!
//! `Won` and `Draw` are absorbing: once reached the session never proposes
//! another move.

use crate::actions::Move;
use crate::board::PlayerId;
use crate::bot::{HeuristicPlayer, TurnDraft};
use crate::game::{GamePhase, GameState};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Steps within one of our turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnStep {
    /// Opponent is moving; we are waiting for the piece they hand us
    WaitForPiece,
    /// Picking a cell for the received piece
    ChoosePlacement,
    /// Placement settled, the offer is still open
    WaitForOffer,
    /// Picking the piece for the opponent
    ChooseOffer,
    /// Dry-running the move to decide on a quarto announcement
    CheckWin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    NotStarted,
    InProgress(TurnStep),
    Won(PlayerId),
    Draw,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Won(_) | SessionPhase::Draw)
    }
}

/// One automated player's view of one game
pub struct PlayerSession<R = StdRng> {
    me: PlayerId,
    player: HeuristicPlayer<R>,
    phase: SessionPhase,
}

impl<R: Rng> PlayerSession<R> {
    pub fn new(me: PlayerId, player: HeuristicPlayer<R>) -> Self {
        Self {
            me,
            player,
            phase: SessionPhase::NotStarted,
        }
    }

    pub fn me(&self) -> PlayerId {
        self.me
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Enter the game. Has no effect once started.
    pub fn start(&mut self) {
        if self.phase == SessionPhase::NotStarted {
            self.phase = SessionPhase::InProgress(TurnStep::WaitForPiece);
        }
    }

    /// Record the end of the game as reported by the transport
    pub fn finish(&mut self, winner: Option<PlayerId>) {
        if self.is_finished() {
            return;
        }
        self.phase = match winner {
            Some(player) => SessionPhase::Won(player),
            None => SessionPhase::Draw,
        };
    }

    /// Feed the latest visible state. Returns the move to send when it is
    /// our turn, `None` otherwise.
    pub fn on_state(&mut self, game: &GameState) -> Option<Move> {
        if self.is_finished() {
            return None;
        }
        self.start();

        match game.phase() {
            GamePhase::Won { winner } => {
                self.finish(Some(winner));
                return None;
            }
            GamePhase::Draw => {
                self.finish(None);
                return None;
            }
            GamePhase::InProgress => {}
        }

        if game.current_player() != self.me {
            self.phase = SessionPhase::InProgress(TurnStep::WaitForPiece);
            return None;
        }

        self.play_turn(game)
    }

    fn play_turn(&mut self, game: &GameState) -> Option<Move> {
        let mut draft = TurnDraft::new(game);
        self.phase = SessionPhase::InProgress(TurnStep::WaitForPiece);

        loop {
            let SessionPhase::InProgress(step) = self.phase else {
                return None;
            };

            let next = match step {
                TurnStep::WaitForPiece => {
                    if game.piece_to_play().is_some() {
                        TurnStep::ChoosePlacement
                    } else {
                        TurnStep::WaitForOffer
                    }
                }
                TurnStep::ChoosePlacement => {
                    draft.place(&mut self.player, game)?;
                    TurnStep::WaitForOffer
                }
                TurnStep::WaitForOffer => TurnStep::ChooseOffer,
                TurnStep::ChooseOffer => {
                    draft.offer(&mut self.player);
                    TurnStep::CheckWin
                }
                TurnStep::CheckWin => {
                    let mv = draft.finish(game);
                    debug!(player = self.me, encoded = %mv.encode(), "Move chosen");
                    self.phase = SessionPhase::InProgress(TurnStep::WaitForPiece);
                    return Some(mv);
                }
            };
            self.phase = SessionPhase::InProgress(next);
        }
    }
}
