//! WebSocket gateway and connection handling.
//!
//! Every connection is one player. Client intents are turned into registry
//! calls; the resulting events and per-player views are fanned out to
//! everyone seated in the affected game.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::registry::{SessionRegistry, SessionUpdate};
use crate::stats::{MatchResult, StatsStore};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use uno_core::{GameError, Player, SessionId, UserId};
use uuid::Uuid;

/// Errors reported back to the client that sent the intent
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not in a game")]
    NotInGame,

    #[error("Already in a game")]
    AlreadyInGame,

    #[error("Only the host can start the game")]
    NotHost,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Server state shared across all connections.
pub struct ServerState {
    /// All live games
    pub registry: SessionRegistry,
    /// Mapping from player ID to the game they are seated in
    pub player_sessions: DashMap<UserId, SessionId>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<UserId, mpsc::UnboundedSender<ServerMessage>>,
    pub stats: Arc<dyn StatsStore>,
}

impl ServerState {
    pub fn new(registry: SessionRegistry, stats: Arc<dyn StatsStore>) -> Self {
        Self {
            registry,
            player_sessions: DashMap::new(),
            player_senders: DashMap::new(),
            stats,
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, user_id: &str, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(user_id) {
            let _ = sender.send(msg);
        }
    }

    /// Send a message to each of the given players.
    pub fn broadcast<'a>(&self, recipients: impl IntoIterator<Item = &'a str>, msg: ServerMessage) {
        for user_id in recipients {
            self.send_to_player(user_id, msg.clone());
        }
    }

    fn current_game(&self, user_id: &str) -> Result<SessionId, GatewayError> {
        self.player_sessions
            .get(user_id)
            .map(|entry| *entry.value())
            .ok_or(GatewayError::NotInGame)
    }

    /// Forget seat mappings that point at `session_id`
    fn release_seats<'a>(&self, session_id: SessionId, users: impl IntoIterator<Item = &'a str>) {
        for user_id in users {
            self.player_sessions
                .remove_if(user_id, |_, seated_in| *seated_in == session_id);
        }
    }

    /// Fan out the outcome of one operation
    fn publish(&self, update: SessionUpdate) {
        for event in &update.events {
            self.broadcast(update.recipients(), ServerMessage::from(event.clone()));
        }

        for view in &update.views {
            self.send_to_player(&view.user_id, ServerMessage::GameState { view: view.clone() });
        }

        if update.closed {
            self.release_seats(update.session_id, update.recipients());
            return;
        }

        if let Some(winner_id) = update.winner() {
            self.finish_game(&update, winner_id.clone());
        }
    }

    /// Record a completed game and retire its session
    fn finish_game(&self, update: &SessionUpdate, winner_id: UserId) {
        let result = MatchResult {
            session_id: update.session_id,
            player_ids: update.members.clone(),
            winner_id,
        };

        match self.stats.record_match(&result) {
            Ok(()) => info!(
                "Game {} won by {} ({} players)",
                result.session_id,
                result.winner_id,
                result.player_ids.len()
            ),
            Err(e) => error!("Failed to record game {}: {}", result.session_id, e),
        }

        self.registry.remove(update.session_id);
        self.release_seats(update.session_id, update.recipients());
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("UNO server listening on {}", addr);

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

    // Identity normally comes from the auth layer; one per connection here
    let user_id = Uuid::new_v4().to_string();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(user_id.clone(), tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome {
        user_id: user_id.clone(),
    };
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
                Ok(client_msg) => handle_message(&user_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", user_id, e);
                    state.send_to_player(
                        &user_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", user_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", user_id, e);
                break;
            }
            _ => {}
        }
    }

    // A dropped connection is an ordinary leave
    handle_disconnect(&user_id, &state);
    state.player_senders.remove(&user_id);
    send_task.abort();

    info!("Connection closed for {}", user_id);
    Ok(())
}

/// Handle a client message; failures go back to the sender only.
pub fn handle_message(user_id: &str, msg: ClientMessage, state: &ServerState) {
    if let Err(e) = process_message(user_id, msg, state) {
        debug!("Rejected intent from {}: {}", user_id, e);
        state.send_to_player(
            user_id,
            ServerMessage::Error {
                message: e.to_string(),
            },
        );
    }
}

fn process_message(
    user_id: &str,
    msg: ClientMessage,
    state: &ServerState,
) -> Result<(), GatewayError> {
    match msg {
        ClientMessage::CreateGame { name, avatar } => {
            if state.player_sessions.contains_key(user_id) {
                return Err(GatewayError::AlreadyInGame);
            }

            let host = Player::new(user_id, name).with_avatar(avatar);
            let update = state.registry.create(host);
            state
                .player_sessions
                .insert(user_id.to_string(), update.session_id);

            state.send_to_player(
                user_id,
                ServerMessage::GameCreated {
                    game_id: update.session_id,
                },
            );
            state.publish(update);
        }

        ClientMessage::JoinGame {
            game_id,
            name,
            avatar,
        } => {
            if let Ok(current) = state.current_game(user_id) {
                if current != game_id {
                    return Err(GatewayError::AlreadyInGame);
                }
            }

            let player = Player::new(user_id, name).with_avatar(avatar);
            let update = state.registry.join(game_id, player)?;
            state.player_sessions.insert(user_id.to_string(), game_id);
            info!("{} joined game {}", user_id, game_id);
            state.publish(update);
        }

        ClientMessage::LeaveGame => {
            leave_current_game(user_id, state)?;
            state.send_to_player(user_id, ServerMessage::LeftGame);
        }

        ClientMessage::StartGame => {
            let game_id = state.current_game(user_id)?;
            if state.registry.public_view(game_id)?.host_id != user_id {
                return Err(GatewayError::NotHost);
            }

            let update = state.registry.start(game_id)?;
            info!("Game {} started by {}", game_id, user_id);
            state.publish(update);
        }

        ClientMessage::PlayCard {
            card_id,
            chosen_color,
        } => {
            let game_id = state.current_game(user_id)?;
            let update = state
                .registry
                .play_card(game_id, user_id, card_id, chosen_color)?;
            state.publish(update);
        }

        ClientMessage::DrawCard => {
            let game_id = state.current_game(user_id)?;
            let update = state.registry.draw_card(game_id, user_id)?;
            state.publish(update);
        }

        ClientMessage::ListGames => {
            let games = state.registry.list_waiting();
            state.send_to_player(user_id, ServerMessage::GameList { games });
        }

        ClientMessage::RequestState => {
            let game_id = state.current_game(user_id)?;
            let view = state.registry.player_view(game_id, user_id)?;
            state.send_to_player(user_id, ServerMessage::GameState { view });
        }

        ClientMessage::GetStats => {
            let stats = state.stats.player_stats(user_id).unwrap_or_default();
            state.send_to_player(user_id, ServerMessage::Stats { stats });
        }

        ClientMessage::GetLeaderboard { limit } => {
            let entries = state.stats.leaderboard(limit);
            state.send_to_player(user_id, ServerMessage::Leaderboard { entries });
        }

        ClientMessage::GetMatchHistory { limit } => {
            let matches = state.stats.match_history(user_id, limit);
            state.send_to_player(user_id, ServerMessage::MatchHistory { matches });
        }

        ClientMessage::Ping => {
            state.send_to_player(user_id, ServerMessage::Pong);
        }
    }

    Ok(())
}

fn leave_current_game(user_id: &str, state: &ServerState) -> Result<(), GatewayError> {
    let (_, game_id) = state
        .player_sessions
        .remove(user_id)
        .ok_or(GatewayError::NotInGame)?;

    let update = state.registry.leave(game_id, user_id)?;
    info!("{} left game {}", user_id, game_id);
    state.publish(update);
    Ok(())
}

/// Handle player disconnect.
fn handle_disconnect(user_id: &str, state: &ServerState) {
    match leave_current_game(user_id, state) {
        Ok(()) | Err(GatewayError::NotInGame) => {}
        Err(e) => warn!("Cleanup for {} failed: {}", user_id, e),
    }
}
