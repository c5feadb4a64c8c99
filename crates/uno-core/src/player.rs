//! Player state.

use crate::card::{Card, CardId};
use serde::{Deserialize, Serialize};

/// Opaque user identity issued by the authentication layer
pub type UserId = String;

/// A seated player and their private hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub user_id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub hand: Vec<Card>,
    /// Set once the player draws during their turn; cleared on every turn change
    pub has_drawn_this_turn: bool,
}

impl Player {
    /// Create a player with an empty hand
    pub fn new(user_id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            avatar: None,
            hand: Vec::new(),
            has_drawn_this_turn: false,
        }
    }

    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    pub fn has_card(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }

    /// Look up a card in hand without removing it
    pub fn card(&self, card_id: CardId) -> Option<&Card> {
        self.hand.iter().find(|c| c.id == card_id)
    }

    /// Remove a card from hand
    pub fn take_card(&mut self, card_id: CardId) -> Option<Card> {
        let position = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(position))
    }

    pub fn receive(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.hand.extend(cards);
    }
}
