//! Automated WebSocket client playing with the heuristic player.

use crate::protocol::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use quarto_core::{GameState, HeuristicPlayer, PlayerSession};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// Connect to a server, join a game and play it to the end.
pub async fn run_client(name: &str, url: &str, seed: Option<u64>) -> anyhow::Result<()> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("Connected to {}", url);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let join = ClientMessage::Join {
        player_name: name.to_string(),
    };
    ws_sender
        .send(Message::Text(serde_json::to_string(&join)?))
        .await?;

    let mut session: Option<PlayerSession> = None;

    while let Some(msg) = ws_receiver.next().await {
        let text = match msg? {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        let server_msg: ServerMessage = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Unreadable server message ({}): {}", e, text);
                continue;
            }
        };

        match server_msg {
            ServerMessage::Welcome { player_id } => {
                debug!(%player_id, "Welcomed by server");
            }
            ServerMessage::Waiting => info!("Waiting for an opponent"),
            ServerMessage::GameStarted {
                room_id,
                player_index,
                opponent_name,
            } => {
                info!(%room_id, "Playing as player {} against {}", player_index, opponent_name);
                let player = match seed {
                    Some(seed) => HeuristicPlayer::with_seed(seed),
                    None => HeuristicPlayer::new(),
                };
                let mut new_session = PlayerSession::new(player_index, player);
                new_session.start();
                session = Some(new_session);
            }
            ServerMessage::YourTurn { state } => {
                let Some(session) = session.as_mut() else {
                    warn!("Asked to move before the game started");
                    continue;
                };
                let game = match GameState::from_snapshot(state) {
                    Ok(game) => game,
                    Err(e) => {
                        warn!("Server sent an inconsistent state: {}", e);
                        continue;
                    }
                };
                debug!("\n{}", game);
                if let Some(mv) = session.on_state(&game) {
                    let reply = ClientMessage::Move {
                        payload: mv.encode(),
                    };
                    ws_sender
                        .send(Message::Text(serde_json::to_string(&reply)?))
                        .await?;
                }
            }
            ServerMessage::StateChanged { mover, .. } => {
                debug!("Player {} moved", mover);
            }
            ServerMessage::MoveRejected { reason } => {
                warn!("Move rejected: {}", reason);
            }
            ServerMessage::GameOver {
                winner,
                winner_name,
            } => {
                if let Some(session) = session.as_mut() {
                    session.finish(winner);
                }
                match (winner, winner_name) {
                    (Some(index), Some(name)) => {
                        info!("Game over: {} (player {}) wins", name, index)
                    }
                    (Some(index), None) => info!("Game over: player {} wins", index),
                    _ => info!("Game over: draw"),
                }
                break;
            }
            ServerMessage::OpponentLeft => {
                info!("Opponent left the game");
                break;
            }
            ServerMessage::Error { message } => warn!("Server error: {}", message),
            ServerMessage::Pong => {}
        }
    }

    Ok(())
}
