//! Outward projections of a session.
//!
//! Neither view carries the draw pile or any hand other than the viewer's own.

use crate::card::Card;
use crate::game::{GameSession, GameStatus, SessionId};
use crate::player::{Player, UserId};
use crate::rules::Direction;
use serde::{Deserialize, Serialize};

/// What everyone at the table may know about a seat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub user_id: UserId,
    pub name: String,
    pub avatar: Option<String>,
    pub hand_size: usize,
    pub has_drawn_this_turn: bool,
}

impl From<&Player> for PublicPlayer {
    fn from(player: &Player) -> Self {
        Self {
            user_id: player.user_id.clone(),
            name: player.name.clone(),
            avatar: player.avatar.clone(),
            hand_size: player.hand.len(),
            has_drawn_this_turn: player.has_drawn_this_turn,
        }
    }
}

/// Session state safe to show to anyone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicView {
    pub id: SessionId,
    pub players: Vec<PublicPlayer>,
    pub current_player_index: usize,
    pub direction: Direction,
    pub status: GameStatus,
    pub host_id: UserId,
    pub winner_id: Option<UserId>,
    pub discard_pile: Vec<Card>,
}

/// Public state plus the viewer's own hand
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    #[serde(flatten)]
    pub public: PublicView,
    pub user_id: UserId,
    /// Empty for anyone not seated in the session
    pub hand: Vec<Card>,
}

impl GameSession {
    pub fn public_view(&self) -> PublicView {
        PublicView {
            id: self.id,
            players: self.players.iter().map(PublicPlayer::from).collect(),
            current_player_index: self.current_player_index,
            direction: self.direction,
            status: self.status,
            host_id: self.host_id.clone(),
            winner_id: self.winner_id.clone(),
            discard_pile: self.discard_pile.clone(),
        }
    }

    pub fn player_view(&self, user_id: &str) -> PlayerView {
        let hand = self
            .get_player(user_id)
            .map(|p| p.hand.clone())
            .unwrap_or_default();

        PlayerView {
            public: self.public_view(),
            user_id: user_id.to_string(),
            hand,
        }
    }

    /// One view per seated player, in seat order
    pub fn player_views(&self) -> Vec<PlayerView> {
        self.players
            .iter()
            .map(|p| self.player_view(&p.user_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn started_game() -> GameSession {
        let mut game = GameSession::with_seed(Uuid::new_v4(), Player::new("a", "Alice"), 9);
        game.join(Player::new("b", "Bob")).unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_public_view_hides_hands_and_deck() {
        let game = started_game();
        let view = game.public_view();

        assert_eq!(view.players.len(), 2);
        assert!(view.players.iter().all(|p| p.hand_size == 7));

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("deck").is_none());
        assert!(json["players"][0].get("hand").is_none());
    }

    #[test]
    fn test_player_view_discloses_only_own_hand() {
        let game = started_game();
        let view = game.player_view("b");

        assert_eq!(view.hand, game.players[1].hand);

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("deck").is_none());
        // Flattened public fields sit beside the private hand
        assert_eq!(json["host_id"], "a");

        let foreign: Vec<u64> = game.players[0]
            .hand
            .iter()
            .map(|c| u64::from(c.id))
            .collect();
        let shown: Vec<u64> = json["hand"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_u64().unwrap())
            .collect();
        assert!(shown.iter().all(|id| !foreign.contains(id)));
    }

    #[test]
    fn test_outsider_sees_no_cards() {
        let game = started_game();
        let view = game.player_view("mallory");
        assert!(view.hand.is_empty());
    }

    #[test]
    fn test_player_views_cover_every_seat() {
        let game = started_game();
        let views = game.player_views();
        let ids: Vec<&str> = views.iter().map(|v| v.user_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
