//! Quarto - rules engine and automated opponent
//!
//! This crate provides the core game logic for Quarto, including:
//! - The 16-piece catalog and its four binary attributes
//! - Board representation with the ten winning lines
//! - Atomic move validation and application
//! - Win detection and threat analysis
//! - A heuristic player and its per-game session state machine
//!
//! # Architecture
//!
//! The game engine is platform-agnostic and performs no I/O. Connection
//! handling, turn relaying and display live in `quarto-server`. It can be
//! compiled to:
//! - Native Rust for server-side game hosting and bot clients
//! - WebAssembly for client-side play (feature `wasm`)
//!
//! # Modules
//!
//! - [`piece`]: Pieces, attributes and the catalog
//! - [`board`]: Cells, lines, threats and win detection
//! - [`actions`]: The move type and its wire encoding
//! - [`game`]: Game state machine and move application
//! - [`bot`]: Heuristic placement and offer decisions
//! - [`session`]: One automated player's lifecycle within a game

pub mod actions;
pub mod board;
pub mod bot;
pub mod game;
pub mod piece;
pub mod session;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::Move;
pub use board::{Board, Line, Outcome, PlayerId, Threat, CELL_COUNT, LINES};
pub use bot::HeuristicPlayer;
pub use game::{GamePhase, GameSnapshot, GameState, InvalidMove, SnapshotError};
pub use piece::{Attribute, Color, Filling, Height, Piece, Shape, PIECE_COUNT};
pub use session::{PlayerSession, SessionPhase, TurnStep};
