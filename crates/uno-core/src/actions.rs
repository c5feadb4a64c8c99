//! Events produced by session operations.
//!
//! Every successful mutation of a [`GameSession`](crate::game::GameSession)
//! reports what changed as a list of events, in the order they happened.
//! Events never carry private hand contents of other players.

use crate::card::Card;
use crate::player::UserId;
use crate::rules::Direction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A player took a seat
    PlayerJoined {
        user_id: UserId,
        name: String,
        avatar: Option<String>,
    },

    /// A player left the session
    PlayerLeft { user_id: UserId },

    /// The host role moved to another player
    HostChanged { user_id: UserId },

    /// Cards were dealt and the first card flipped
    GameStarted,

    /// A card went onto the discard pile (wild colour already applied)
    CardPlayed { user_id: UserId, card: Card },

    /// A player drew cards, by choice or as a penalty
    CardDrawn { user_id: UserId, count: usize },

    /// Play direction flipped
    DirectionChanged { direction: Direction },

    /// It is now this player's turn
    TurnChanged { user_id: UserId },

    /// A player emptied their hand
    GameEnded { winner_id: UserId },

    /// The session was torn down and must be discarded
    SessionClosed,
}
