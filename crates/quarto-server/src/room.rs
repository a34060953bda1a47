//! Game room management.

use quarto_core::{GameSnapshot, GameState, InvalidMove, Outcome, PlayerId};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid move: {0}")]
    InvalidMove(#[from] InvalidMove),
}

/// Room status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    InGame,
    Finished,
}

/// A player in a game room.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    /// Index in the game (0 or 1)
    pub index: PlayerId,
}

/// A room hosting one game between two players. Each room owns its game
/// state; nothing is shared between rooms.
pub struct GameRoom {
    pub id: Uuid,
    pub status: RoomStatus,
    /// Players ordered by game index
    pub players: [RoomPlayer; 2],
    game: GameState,
}

impl GameRoom {
    /// Open a room for two paired players. The starting player is random.
    pub fn new(id: Uuid, first: (Uuid, String), second: (Uuid, String)) -> Self {
        Self::with_game(id, first, second, GameState::new())
    }

    pub fn with_game(
        id: Uuid,
        (first_id, first_name): (Uuid, String),
        (second_id, second_name): (Uuid, String),
        game: GameState,
    ) -> Self {
        Self {
            id,
            status: RoomStatus::InGame,
            players: [
                RoomPlayer {
                    id: first_id,
                    name: first_name,
                    index: 0,
                },
                RoomPlayer {
                    id: second_id,
                    name: second_name,
                    index: 1,
                },
            ],
            game,
        }
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    pub fn player(&self, player_id: Uuid) -> Option<&RoomPlayer> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn opponent_of(&self, player_id: Uuid) -> Option<&RoomPlayer> {
        self.player(player_id)?;
        self.players.iter().find(|p| p.id != player_id)
    }

    /// Connection whose turn it is
    pub fn current_player(&self) -> &RoomPlayer {
        &self.players[self.game.current_player() as usize]
    }

    pub fn is_finished(&self) -> bool {
        self.status == RoomStatus::Finished
    }

    /// Relay one encoded move from a connection to the game
    pub fn apply_move(&mut self, player_id: Uuid, payload: &str) -> Result<Outcome, RoomError> {
        let index = self.player(player_id).ok_or(RoomError::PlayerNotInRoom)?.index;

        if self.game.is_finished() {
            return Err(RoomError::GameOver);
        }
        if self.game.current_player() != index {
            return Err(RoomError::NotYourTurn);
        }

        let outcome = self.game.submit(index, payload)?;

        if self.game.is_finished() {
            self.status = RoomStatus::Finished;
        }

        Ok(outcome)
    }

    pub fn get_winner(&self) -> Option<(PlayerId, String)> {
        let winner = self.game.winner()?;
        let name = self.players.get(winner as usize)?.name.clone();
        Some((winner, name))
    }
}
