//! Core session state machine.
//!
//! A `GameSession` owns everything about one table: seats, deck, discard pile
//! and turn pointer. It moves through `Waiting -> Playing -> Finished`, and is
//! marked closed once it has to be torn down.

use crate::actions::GameEvent;
use crate::card::{Card, CardColor, CardId, DECK_SIZE};
use crate::deck;
use crate::player::{Player, UserId};
use crate::rules::{self, Direction};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identifier of a session
pub type SessionId = Uuid;

/// Fewest players needed to start
pub const MIN_PLAYERS: usize = 2;

/// Most players a session can seat
pub const MAX_PLAYERS: usize = 4;

/// Cards dealt to each player at the start
pub const HAND_SIZE: usize = 7;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Lobby: players may join
    Waiting,
    Playing,
    Finished,
}

/// Errors that can occur when operating on a session
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Game not found")]
    NotFound,

    #[error("Action not allowed in the current game state")]
    InvalidState,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Card not in hand")]
    CardNotOwned,

    #[error("Invalid card play")]
    IllegalPlay,

    #[error("Must choose a color for wild card")]
    MissingColorChoice,

    #[error("Already drew this turn")]
    AlreadyDrawn,

    #[error("Game is full")]
    RoomFull,

    #[error("Player not in game")]
    NotInSession,

    #[error("No cards left to draw")]
    DeckExhausted,
}

/// The complete, authoritative state of one game
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: SessionId,
    /// Seats in join order; this is the turn-order ring
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub direction: Direction,
    pub status: GameStatus,
    pub host_id: UserId,
    pub winner_id: Option<UserId>,
    /// Draw pile, drawn from the front
    pub deck: Vec<Card>,
    /// Discard pile; the last card is the one to match
    pub discard_pile: Vec<Card>,
    closed: bool,
    rng: StdRng,
}

impl GameSession {
    /// Create a session with `host` already seated
    pub fn new(id: SessionId, host: Player) -> Self {
        Self::with_rng(id, host, StdRng::from_entropy())
    }

    /// Create a session whose shuffles are reproducible from `seed`
    pub fn with_seed(id: SessionId, host: Player, seed: u64) -> Self {
        Self::with_rng(id, host, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: SessionId, host: Player, rng: StdRng) -> Self {
        Self {
            id,
            host_id: host.user_id.clone(),
            players: vec![host],
            current_player_index: 0,
            direction: Direction::Clockwise,
            status: GameStatus::Waiting,
            winner_id: None,
            deck: Vec::new(),
            discard_pile: Vec::new(),
            closed: false,
            rng,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    /// Whether the session has been torn down
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_player(&self, user_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.user_id == user_id)
    }

    pub fn player_index(&self, user_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.user_id == user_id)
    }

    /// The player whose turn it is, while a game is running
    pub fn current_player(&self) -> Option<&Player> {
        if self.status != GameStatus::Playing {
            return None;
        }
        self.players.get(self.current_player_index)
    }

    pub fn discard_top(&self) -> Option<&Card> {
        self.discard_pile.last()
    }

    /// Cards across deck, discard pile and every hand
    pub fn card_total(&self) -> usize {
        self.deck.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    /// Seat a player
    pub fn join(&mut self, player: Player) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_open()?;

        // Re-joining is accepted as-is
        if self.player_index(&player.user_id).is_some() {
            return Ok(Vec::new());
        }
        if self.status != GameStatus::Waiting {
            return Err(GameError::InvalidState);
        }
        if self.is_full() {
            return Err(GameError::RoomFull);
        }

        let event = GameEvent::PlayerJoined {
            user_id: player.user_id.clone(),
            name: player.name.clone(),
            avatar: player.avatar.clone(),
        };
        self.players.push(player);

        Ok(vec![event])
    }

    /// Remove a player, tearing the session down if it can no longer continue
    pub fn leave(&mut self, user_id: &str) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_open()?;

        let seat = self.player_index(user_id).ok_or(GameError::NotInSession)?;
        let leaver = self.players.remove(seat);
        let playing = self.status == GameStatus::Playing;
        let mut events = vec![GameEvent::PlayerLeft {
            user_id: leaver.user_id.clone(),
        }];

        if self.players.is_empty() || (playing && self.players.len() < MIN_PLAYERS) {
            self.closed = true;
            events.push(GameEvent::SessionClosed);
            return Ok(events);
        }

        if self.host_id == leaver.user_id {
            self.host_id = self.players[0].user_id.clone();
            events.push(GameEvent::HostChanged {
                user_id: self.host_id.clone(),
            });
        }

        if playing {
            // Cards in the departed hand go back into the draw pile
            self.deck.extend(leaver.hand);
            deck::shuffle(&mut self.deck, &mut self.rng);

            let count = self.players.len();
            if seat < self.current_player_index {
                self.current_player_index -= 1;
            } else if seat == self.current_player_index {
                // The vacated index now holds the clockwise neighbour
                self.current_player_index = match self.direction {
                    Direction::Clockwise => seat % count,
                    Direction::Counterclockwise => (seat + count - 1) % count,
                };
                self.clear_draw_flags();
                events.push(self.turn_changed());
            }

            self.assert_invariants();
        }

        Ok(events)
    }

    /// Deal and flip the first card
    pub fn start(&mut self) -> Result<Vec<GameEvent>, GameError> {
        self.ensure_open()?;

        if self.status != GameStatus::Waiting {
            return Err(GameError::InvalidState);
        }
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len()) {
            return Err(GameError::InvalidState);
        }

        let mut cards = deck::standard_deck();
        deck::shuffle(&mut cards, &mut self.rng);

        let hands: Vec<Vec<Card>> = self
            .players
            .iter()
            .map(|_| deck::deal(&mut cards, HAND_SIZE))
            .collect();

        // The opening card must carry a real colour; wild cards stay in the deck
        let flip_at = cards
            .iter()
            .position(|c| !c.is_wild_family())
            .ok_or(GameError::DeckExhausted)?;
        let first = cards.remove(flip_at);

        for (player, hand) in self.players.iter_mut().zip(hands) {
            player.hand = hand;
            player.has_drawn_this_turn = false;
        }
        self.deck = cards;
        self.discard_pile = vec![first];
        self.direction = Direction::Clockwise;
        self.current_player_index = 0;
        self.winner_id = None;
        self.status = GameStatus::Playing;

        self.assert_invariants();

        Ok(vec![GameEvent::GameStarted, self.turn_changed()])
    }

    /// Play a card from the current player's hand
    pub fn play_card(
        &mut self,
        user_id: &str,
        card_id: CardId,
        chosen_color: Option<CardColor>,
    ) -> Result<Vec<GameEvent>, GameError> {
        let mover = self.validate_mover(user_id)?;

        let card = *self.players[mover]
            .card(card_id)
            .ok_or(GameError::CardNotOwned)?;
        let top = *self.discard_top().ok_or(GameError::InvalidState)?;

        if !rules::is_legal_play(&card, &top) {
            return Err(GameError::IllegalPlay);
        }

        let mut played = card;
        if card.is_wild_family() {
            match chosen_color {
                Some(color) if color.is_concrete() => played.color = color,
                _ => return Err(GameError::MissingColorChoice),
            }
        }

        let player = &mut self.players[mover];
        player.take_card(card_id);
        player.has_drawn_this_turn = false;
        let hand_empty = player.hand.is_empty();
        self.discard_pile.push(played);

        let mut events = vec![GameEvent::CardPlayed {
            user_id: user_id.to_string(),
            card: played,
        }];

        if hand_empty {
            self.status = GameStatus::Finished;
            self.winner_id = Some(user_id.to_string());
            events.push(GameEvent::GameEnded {
                winner_id: user_id.to_string(),
            });
            return Ok(events);
        }

        let effect = rules::resolve_effect(&played, self.players.len());

        if effect.reverse {
            self.direction = self.direction.reversed();
            events.push(GameEvent::DirectionChanged {
                direction: self.direction,
            });
        }

        if effect.penalty_draw > 0 {
            let victim = rules::next_index(mover, self.direction, self.players.len());
            let count = self.draw_into(victim, effect.penalty_draw);
            events.push(GameEvent::CardDrawn {
                user_id: self.players[victim].user_id.clone(),
                count,
            });
        }

        self.advance_turn(effect.steps);
        events.push(self.turn_changed());

        self.assert_invariants();

        Ok(events)
    }

    /// Draw one card. The turn does not pass; the player may still play.
    pub fn draw_card(&mut self, user_id: &str) -> Result<Vec<GameEvent>, GameError> {
        let mover = self.validate_mover(user_id)?;

        if self.players[mover].has_drawn_this_turn {
            return Err(GameError::AlreadyDrawn);
        }

        let count = self.draw_into(mover, 1);
        if count == 0 {
            return Err(GameError::DeckExhausted);
        }
        self.players[mover].has_drawn_this_turn = true;

        self.assert_invariants();

        Ok(vec![GameEvent::CardDrawn {
            user_id: user_id.to_string(),
            count,
        }])
    }

    // ==================== Helper Methods ====================

    fn ensure_open(&self) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::NotFound);
        }
        Ok(())
    }

    /// Check the game is running and `user_id` holds the turn; returns their seat
    fn validate_mover(&self, user_id: &str) -> Result<usize, GameError> {
        self.ensure_open()?;

        if self.status != GameStatus::Playing {
            return Err(GameError::InvalidState);
        }

        let mover = self.current_player_index;
        if self.players[mover].user_id != user_id {
            return Err(GameError::NotYourTurn);
        }

        Ok(mover)
    }

    /// Move up to `n` cards into a seat's hand, recycling the discard pile when
    /// the deck runs dry. Returns how many were actually drawn.
    fn draw_into(&mut self, seat: usize, n: usize) -> usize {
        let mut drawn = 0;

        while drawn < n {
            if self.deck.is_empty() {
                let fresh = deck::reshuffle_from_discard(&mut self.discard_pile, &mut self.rng);
                if fresh.is_empty() {
                    break;
                }
                self.deck = fresh;
            }

            let cards = deck::deal(&mut self.deck, n - drawn);
            drawn += cards.len();
            self.players[seat].receive(cards);
        }

        drawn
    }

    fn advance_turn(&mut self, steps: usize) {
        let count = self.players.len();
        for _ in 0..steps {
            self.current_player_index =
                rules::next_index(self.current_player_index, self.direction, count);
        }
        self.clear_draw_flags();
    }

    fn clear_draw_flags(&mut self) {
        for player in &mut self.players {
            player.has_drawn_this_turn = false;
        }
    }

    fn turn_changed(&self) -> GameEvent {
        GameEvent::TurnChanged {
            user_id: self.players[self.current_player_index].user_id.clone(),
        }
    }

    /// Panics if the running game is internally inconsistent
    fn assert_invariants(&self) {
        if self.status != GameStatus::Playing {
            return;
        }

        assert_eq!(
            self.card_total(),
            DECK_SIZE,
            "card conservation violated in session {}",
            self.id
        );
        assert!(
            self.current_player_index < self.players.len(),
            "turn index {} out of range for {} players",
            self.current_player_index,
            self.players.len()
        );

        let top = self
            .discard_top()
            .unwrap_or_else(|| panic!("session {} has an empty discard pile", self.id));
        assert!(top.color.is_concrete(), "discard top {} has no colour", top);

        for (seat, player) in self.players.iter().enumerate() {
            assert!(
                seat == self.current_player_index || !player.has_drawn_this_turn,
                "{} holds a draw flag out of turn",
                player.user_id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardRank;
    use pretty_assertions::assert_eq;

    fn session_with(names: &[&str]) -> GameSession {
        let mut game = GameSession::with_seed(Uuid::new_v4(), Player::new(names[0], names[0]), 42);
        for name in &names[1..] {
            game.join(Player::new(*name, *name)).unwrap();
        }
        game
    }

    /// Give the current player a specific card, taken from the deck or another hand
    fn hand_to_current(game: &mut GameSession, color: CardColor, rank: CardRank) -> CardId {
        let wanted = |c: &Card| c.rank == rank && (rank.is_wild_family() || c.color == color);
        let seat = game.current_player_index;

        let card = match game.deck.iter().position(|c| wanted(c)) {
            Some(position) => game.deck.remove(position),
            None => {
                let (other, position) = game
                    .players
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != seat)
                    .find_map(|(i, p)| p.hand.iter().position(|c| wanted(c)).map(|pos| (i, pos)))
                    .expect("card available outside the current hand");
                game.players[other].hand.remove(position)
            }
        };
        game.players[seat].hand.push(card);
        card.id
    }

    #[test]
    fn test_new_session_seats_host() {
        let game = session_with(&["alice"]);
        assert_eq!(game.player_count(), 1);
        assert_eq!(game.host_id, "alice");
        assert_eq!(game.status, GameStatus::Waiting);
    }

    #[test]
    fn test_join_limits() {
        let mut game = session_with(&["a", "b", "c", "d"]);
        assert!(game.is_full());
        assert_eq!(
            game.join(Player::new("e", "e")).unwrap_err(),
            GameError::RoomFull
        );

        // Re-joining is a silent success
        assert!(game.join(Player::new("b", "b")).unwrap().is_empty());
        assert_eq!(game.player_count(), 4);
    }

    #[test]
    fn test_join_after_start_rejected() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();
        assert_eq!(
            game.join(Player::new("c", "c")).unwrap_err(),
            GameError::InvalidState
        );
    }

    #[test]
    fn test_start_requires_two_players() {
        let mut game = session_with(&["a"]);
        assert_eq!(game.start().unwrap_err(), GameError::InvalidState);

        game.join(Player::new("b", "b")).unwrap();
        let events = game.start().unwrap();
        assert_eq!(
            events,
            vec![
                GameEvent::GameStarted,
                GameEvent::TurnChanged {
                    user_id: "a".into()
                }
            ]
        );
        assert_eq!(game.start().unwrap_err(), GameError::InvalidState);
    }

    #[test]
    fn test_start_deals_hands() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();

        for player in &game.players {
            assert_eq!(player.hand_size(), HAND_SIZE);
        }
        assert_eq!(game.discard_pile.len(), 1);
        assert!(game.discard_top().unwrap().color.is_concrete());
        assert_eq!(game.deck.len(), DECK_SIZE - 3 * HAND_SIZE - 1);
        assert_eq!(game.current_player_index, 0);
        assert_eq!(game.direction, Direction::Clockwise);
    }

    #[test]
    fn test_seeded_sessions_deal_identically() {
        let mut a = session_with(&["a", "b"]);
        let mut b = session_with(&["a", "b"]);
        a.start().unwrap();
        b.start().unwrap();
        assert_eq!(a.players, b.players);
        assert_eq!(a.discard_pile, b.discard_pile);
    }

    #[test]
    fn test_not_your_turn() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();

        let card = game.players[1].hand[0].id;
        assert_eq!(
            game.play_card("b", card, None).unwrap_err(),
            GameError::NotYourTurn
        );
        assert_eq!(game.draw_card("b").unwrap_err(), GameError::NotYourTurn);
    }

    #[test]
    fn test_card_not_owned() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();

        let foreign = game.players[1].hand[0].id;
        assert_eq!(
            game.play_card("a", foreign, None).unwrap_err(),
            GameError::CardNotOwned
        );
    }

    #[test]
    fn test_wild_requires_color() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();
        let wild = hand_to_current(&mut game, CardColor::Wild, CardRank::Wild);
        let hand_before = game.players[0].hand_size();

        assert_eq!(
            game.play_card("a", wild, None).unwrap_err(),
            GameError::MissingColorChoice
        );
        assert_eq!(
            game.play_card("a", wild, Some(CardColor::Wild)).unwrap_err(),
            GameError::MissingColorChoice
        );
        // Rejected plays leave the hand untouched
        assert_eq!(game.players[0].hand_size(), hand_before);
        assert!(game.players[0].has_card(wild));

        game.play_card("a", wild, Some(CardColor::Green)).unwrap();
        let top = game.discard_top().unwrap();
        assert_eq!(top.id, wild);
        assert_eq!(top.color, CardColor::Green);
        assert_eq!(game.current_player_index, 1);
    }

    #[test]
    fn test_draw_twice_rejected() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();

        game.draw_card("a").unwrap();
        assert!(game.players[0].has_drawn_this_turn);
        assert_eq!(game.players[0].hand_size(), HAND_SIZE + 1);
        assert_eq!(game.draw_card("a").unwrap_err(), GameError::AlreadyDrawn);
        // Drawing does not pass the turn
        assert_eq!(game.current_player_index, 0);
    }

    #[test]
    fn test_draw_reshuffles_discard() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();

        // Move the whole deck onto the discard pile beneath the top card
        let top = game.discard_pile.pop().unwrap();
        game.discard_pile.append(&mut game.deck);
        game.discard_pile.push(top);

        game.draw_card("a").unwrap();

        assert_eq!(game.discard_pile, vec![top]);
        assert_eq!(game.deck.len(), DECK_SIZE - 2 * HAND_SIZE - 2);
        assert_eq!(game.card_total(), DECK_SIZE);
    }

    #[test]
    fn test_draw_with_nothing_left() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();

        let rest: Vec<Card> = game.deck.drain(..).collect();
        game.players[1].receive(rest);

        assert_eq!(game.draw_card("a").unwrap_err(), GameError::DeckExhausted);
        assert!(!game.players[0].has_drawn_this_turn);
    }

    #[test]
    fn test_reverse_with_three_players() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();
        let top_color = game.discard_top().unwrap().color;
        let reverse = hand_to_current(&mut game, top_color, CardRank::Reverse);

        let events = game.play_card("a", reverse, None).unwrap();

        assert_eq!(game.direction, Direction::Counterclockwise);
        assert_eq!(game.current_player_index, 2);
        assert!(events.contains(&GameEvent::DirectionChanged {
            direction: Direction::Counterclockwise
        }));
    }

    #[test]
    fn test_skip_passes_over_next_player() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();
        let top_color = game.discard_top().unwrap().color;
        let skip = hand_to_current(&mut game, top_color, CardRank::Skip);

        game.play_card("a", skip, None).unwrap();

        assert_eq!(game.current_player_index, 2);
    }

    #[test]
    fn test_wild_draw_four_penalty() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();
        let card = hand_to_current(&mut game, CardColor::Wild, CardRank::WildDrawFour);

        let events = game.play_card("a", card, Some(CardColor::Red)).unwrap();

        assert_eq!(game.players[1].hand_size(), HAND_SIZE + 4);
        assert_eq!(game.current_player_index, 2);
        assert!(events.contains(&GameEvent::CardDrawn {
            user_id: "b".into(),
            count: 4
        }));
    }

    #[test]
    fn test_leave_while_on_turn_passes_turn() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();

        let events = game.leave("a").unwrap();

        assert!(!game.is_closed());
        assert_eq!(game.current_player().unwrap().user_id, "b");
        assert_eq!(game.host_id, "b");
        assert_eq!(game.card_total(), DECK_SIZE);
        assert_eq!(
            events,
            vec![
                GameEvent::PlayerLeft {
                    user_id: "a".into()
                },
                GameEvent::HostChanged {
                    user_id: "b".into()
                },
                GameEvent::TurnChanged {
                    user_id: "b".into()
                },
            ]
        );
    }

    #[test]
    fn test_leave_counterclockwise_passes_turn_backwards() {
        let mut game = session_with(&["a", "b", "c", "d"]);
        game.start().unwrap();
        game.direction = Direction::Counterclockwise;
        game.current_player_index = 1;

        game.leave("b").unwrap();

        assert_eq!(game.current_player().unwrap().user_id, "a");
    }

    #[test]
    fn test_leave_before_current_keeps_turn_holder() {
        let mut game = session_with(&["a", "b", "c"]);
        game.start().unwrap();
        game.current_player_index = 2;

        game.leave("a").unwrap();

        assert_eq!(game.current_player().unwrap().user_id, "c");
        assert_eq!(game.current_player_index, 1);
    }

    #[test]
    fn test_leave_unknown_player() {
        let mut game = session_with(&["a", "b"]);
        assert_eq!(game.leave("zed").unwrap_err(), GameError::NotInSession);
    }

    #[test]
    fn test_closed_session_rejects_everything() {
        let mut game = session_with(&["a"]);
        let events = game.leave("a").unwrap();
        assert_eq!(events.last(), Some(&GameEvent::SessionClosed));
        assert!(game.is_closed());

        assert_eq!(
            game.join(Player::new("b", "b")).unwrap_err(),
            GameError::NotFound
        );
        assert_eq!(game.start().unwrap_err(), GameError::NotFound);
    }

    #[test]
    #[should_panic(expected = "card conservation")]
    fn test_conservation_violation_panics() {
        let mut game = session_with(&["a", "b"]);
        game.start().unwrap();
        game.deck.pop();
        let _ = game.draw_card("a");
    }
}
