//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use quarto_core::Outcome;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// A connection waiting for an opponent
type LobbyEntry = (Uuid, String);

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<Uuid, GameRoom>,
    /// Mapping from player ID to their room ID
    pub player_rooms: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// At most one player waits for a partner
    lobby: Mutex<Option<LobbyEntry>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            player_senders: DashMap::new(),
            lobby: Mutex::new(None),
        }
    }

    fn lobby(&self) -> MutexGuard<'_, Option<LobbyEntry>> {
        // The guarded value is a plain Option, always consistent
        self.lobby.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to both players of a room.
    pub fn broadcast_to_room(&self, room_id: Uuid, msg: ServerMessage) {
        let players: Vec<Uuid> = match self.rooms.get(&room_id) {
            Some(room) => room.players.iter().map(|p| p.id).collect(),
            None => return,
        };
        for player_id in players {
            self.send_to_player(player_id, msg.clone());
        }
    }

    /// Remove a room and forget its players.
    fn close_room(&self, room_id: Uuid) {
        if let Some((_, room)) = self.rooms.remove(&room_id) {
            for player in &room.players {
                self.player_rooms.remove(&player.id);
            }
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: &str, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Quarto server listening on {}", listener.local_addr()?);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a player ID
    let player_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text)).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(player_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", player_id, text);
                    state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: format!("Unreadable message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::Join { player_name } => handle_join(player_id, player_name, state),

        ClientMessage::Move { payload } => handle_move(player_id, &payload, state),

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Pair the joining player with the waiting one, or make them wait.
fn handle_join(player_id: Uuid, player_name: String, state: &Arc<ServerState>) {
    if state.player_rooms.contains_key(&player_id) {
        state.send_to_player(
            player_id,
            ServerMessage::Error {
                message: "Already in a game".to_string(),
            },
        );
        return;
    }

    // Pairing and room registration happen under the lobby lock, so a
    // disconnect finds the waiting player either in the lobby or in a room
    let mut lobby = state.lobby();
    match lobby.take() {
        Some(first) if first.0 != player_id && state.player_senders.contains_key(&first.0) => {
            open_room(state, first, (player_id, player_name));
        }
        _ => {
            info!("{} ({}) is waiting for an opponent", player_name, player_id);
            *lobby = Some((player_id, player_name));
            state.send_to_player(player_id, ServerMessage::Waiting);
        }
    }
}

/// Register a room for two paired players and tell both the game is on.
fn open_room(state: &ServerState, first: LobbyEntry, second: LobbyEntry) {
    let room_id = Uuid::new_v4();
    let room = GameRoom::new(room_id, first, second);
    let players = room.players.clone();
    let snapshot = room.snapshot();
    let to_move = room.current_player().id;

    state.rooms.insert(room_id, room);
    for player in &players {
        state.player_rooms.insert(player.id, room_id);
    }

    info!(
        %room_id,
        "Game started: {} vs {}", players[0].name, players[1].name
    );

    for (player, opponent) in [(&players[0], &players[1]), (&players[1], &players[0])] {
        state.send_to_player(
            player.id,
            ServerMessage::GameStarted {
                room_id,
                player_index: player.index,
                opponent_name: opponent.name.clone(),
            },
        );
    }
    state.send_to_player(to_move, ServerMessage::YourTurn { state: snapshot });
}

/// Relay a move to the player's room and report the result.
fn handle_move(player_id: Uuid, payload: &str, state: &Arc<ServerState>) {
    let Some(room_id) = state.player_rooms.get(&player_id).map(|r| *r) else {
        state.send_to_player(
            player_id,
            ServerMessage::Error {
                message: "Not in a game".to_string(),
            },
        );
        return;
    };
    let Some(mut room) = state.rooms.get_mut(&room_id) else {
        return;
    };

    match room.apply_move(player_id, payload) {
        Ok(outcome) => {
            let snapshot = room.snapshot();
            let mover = room.player(player_id).map(|p| p.index).unwrap_or_default();
            let next = room.current_player().id;
            let winner = room.get_winner();
            debug!(%room_id, "State after move by player {}:\n{}", mover, room.game());

            // Release lock before broadcasting
            drop(room);

            state.broadcast_to_room(
                room_id,
                ServerMessage::StateChanged {
                    state: snapshot.clone(),
                    mover,
                },
            );

            match outcome {
                Outcome::Continue => {
                    state.send_to_player(next, ServerMessage::YourTurn { state: snapshot });
                }
                Outcome::Won(_) | Outcome::Draw => {
                    let (winner, winner_name) = match winner {
                        Some((index, name)) => (Some(index), Some(name)),
                        None => (None, None),
                    };
                    info!(%room_id, ?winner, "Game over");
                    state.broadcast_to_room(
                        room_id,
                        ServerMessage::GameOver {
                            winner,
                            winner_name,
                        },
                    );
                    state.close_room(room_id);
                }
            }
        }
        Err(RoomError::InvalidMove(e)) => {
            let snapshot = room.snapshot();
            drop(room);

            info!(%room_id, %player_id, "Move rejected: {}", e);
            state.send_to_player(
                player_id,
                ServerMessage::MoveRejected {
                    reason: e.to_string(),
                },
            );
            // Recoverable: the same player moves again on the unchanged state
            state.send_to_player(player_id, ServerMessage::YourTurn { state: snapshot });
        }
        Err(e) => {
            drop(room);
            state.send_to_player(
                player_id,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    {
        let mut lobby = state.lobby();
        if matches!(&*lobby, Some((waiting_id, _)) if *waiting_id == player_id) {
            *lobby = None;
        }
    }

    let Some(room_id) = state.player_rooms.get(&player_id).map(|r| *r) else {
        return;
    };
    let opponent = state
        .rooms
        .get(&room_id)
        .and_then(|room| room.opponent_of(player_id).map(|p| p.id));

    if let Some(opponent_id) = opponent {
        state.send_to_player(opponent_id, ServerMessage::OpponentLeft);
    }
    info!(%room_id, "Player {} left, closing room", player_id);
    state.close_room(room_id);
}
