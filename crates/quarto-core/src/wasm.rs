//! WebAssembly bindings for the Quarto engine.
//!
//! This module exposes the game engine to JavaScript through wasm-bindgen.

use wasm_bindgen::prelude::*;

use crate::bot::HeuristicPlayer;
use crate::game::{GameSnapshot, GameState};

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game with a random starting player
    #[wasm_bindgen(constructor)]
    pub fn new() -> WasmGame {
        WasmGame {
            state: GameState::new(),
        }
    }

    /// Resume a game from its visible state JSON
    #[wasm_bindgen(js_name = fromSnapshot)]
    pub fn from_snapshot(snapshot_json: &str) -> Result<WasmGame, JsValue> {
        let snapshot: GameSnapshot = serde_json::from_str(snapshot_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid snapshot: {}", e)))?;
        let state = GameState::from_snapshot(snapshot)
            .map_err(|e| JsValue::from_str(&format!("Invalid snapshot: {}", e)))?;
        Ok(WasmGame { state })
    }

    /// Get the current game state as JSON
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> String {
        serde_json::to_string(&self.state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Get the current player ID
    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> u8 {
        self.state.current_player()
    }

    /// Submit an encoded move for a player, returns the outcome JSON or error
    #[wasm_bindgen(js_name = submitMove)]
    pub fn submit_move(&mut self, player: u8, move_json: &str) -> Result<String, JsValue> {
        match self.state.submit(player, move_json) {
            Ok(outcome) => {
                Ok(serde_json::to_string(&outcome).unwrap_or_else(|_| "null".to_string()))
            }
            Err(e) => Err(JsValue::from_str(&format!("Move failed: {}", e))),
        }
    }

    /// Check if the game is finished
    #[wasm_bindgen(js_name = isFinished)]
    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// Get the winner (if the game was won)
    #[wasm_bindgen(js_name = getWinner)]
    pub fn get_winner(&self) -> Option<u8> {
        self.state.winner()
    }

    /// Get the board rendered as text
    #[wasm_bindgen(js_name = render)]
    pub fn render(&self) -> String {
        self.state.to_string()
    }

    /// Get the heuristic player's suggested move for the current player
    #[wasm_bindgen(js_name = getBotMove)]
    pub fn get_bot_move(&self) -> String {
        let mut bot = HeuristicPlayer::new();
        match bot.choose_move(&self.state) {
            Some(mv) => mv.encode(),
            None => "null".to_string(),
        }
    }
}

impl Default for WasmGame {
    fn default() -> Self {
        Self::new()
    }
}
