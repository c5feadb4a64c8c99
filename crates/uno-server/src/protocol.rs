//! WebSocket protocol messages for the game gateway.

use crate::registry::SessionSummary;
use crate::stats::{MatchRecord, PlayerStats};
use serde::{Deserialize, Serialize};
use uno_core::{Card, CardColor, CardId, Direction, GameEvent, PlayerView, SessionId, UserId};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Open a new game with the sender as host
    CreateGame {
        name: String,
        avatar: Option<String>,
    },

    /// Take a seat in an existing game
    JoinGame {
        game_id: SessionId,
        name: String,
        avatar: Option<String>,
    },

    /// Leave the current game
    LeaveGame,

    /// Deal the cards (host only)
    StartGame,

    /// Play a card; wild cards need a colour
    PlayCard {
        card_id: CardId,
        chosen_color: Option<CardColor>,
    },

    /// Draw one card
    DrawCard,

    /// Request the list of joinable games
    ListGames,

    /// Re-send the current game state to the sender
    RequestState,

    /// The sender's win/loss record
    GetStats,

    GetLeaderboard { limit: usize },

    GetMatchHistory { limit: usize },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with the identity assigned to this connection
    Welcome { user_id: UserId },

    /// Game created successfully
    GameCreated { game_id: SessionId },

    /// Game state as seen by the recipient
    GameState { view: PlayerView },

    PlayerJoined {
        user_id: UserId,
        name: String,
        avatar: Option<String>,
    },

    PlayerLeft { user_id: UserId },

    HostChanged { user_id: UserId },

    GameStarted,

    CardPlayed { user_id: UserId, card: Card },

    CardDrawn { user_id: UserId, count: usize },

    DirectionChanged { direction: Direction },

    TurnChanged { user_id: UserId },

    GameEnded { winner_id: UserId },

    /// The game was torn down
    GameClosed,

    /// Left the game successfully
    LeftGame,

    /// Joinable games
    GameList { games: Vec<SessionSummary> },

    Stats { stats: PlayerStats },

    Leaderboard { entries: Vec<(UserId, PlayerStats)> },

    MatchHistory { matches: Vec<MatchRecord> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

impl From<GameEvent> for ServerMessage {
    fn from(event: GameEvent) -> Self {
        match event {
            GameEvent::PlayerJoined {
                user_id,
                name,
                avatar,
            } => ServerMessage::PlayerJoined {
                user_id,
                name,
                avatar,
            },
            GameEvent::PlayerLeft { user_id } => ServerMessage::PlayerLeft { user_id },
            GameEvent::HostChanged { user_id } => ServerMessage::HostChanged { user_id },
            GameEvent::GameStarted => ServerMessage::GameStarted,
            GameEvent::CardPlayed { user_id, card } => ServerMessage::CardPlayed { user_id, card },
            GameEvent::CardDrawn { user_id, count } => ServerMessage::CardDrawn { user_id, count },
            GameEvent::DirectionChanged { direction } => {
                ServerMessage::DirectionChanged { direction }
            }
            GameEvent::TurnChanged { user_id } => ServerMessage::TurnChanged { user_id },
            GameEvent::GameEnded { winner_id } => ServerMessage::GameEnded { winner_id },
            GameEvent::SessionClosed => ServerMessage::GameClosed,
        }
    }
}
