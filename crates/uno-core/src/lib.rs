//! UNO-style card game engine
//!
//! This crate provides the authoritative game logic, including:
//! - The 108-card deck and how it is shuffled, dealt and recycled
//! - Play legality and special card effects
//! - The per-session state machine (join, leave, start, play, draw)
//! - Public and per-player projections of a session
//!
//! # Architecture
//!
//! The engine performs no I/O. Every operation is synchronous and reports
//! what happened as a list of [`GameEvent`]s, leaving transport, fan-out and
//! persistence to the caller.
//!
//! # Modules
//!
//! - [`card`]: Card model
//! - [`deck`]: Deck construction, shuffling and dealing
//! - [`rules`]: Legality checks and card effects
//! - [`game`]: Session state machine
//! - [`view`]: Outward projections

pub mod actions;
pub mod card;
pub mod deck;
pub mod game;
pub mod player;
pub mod rules;
pub mod view;

// Re-export commonly used types
pub use actions::GameEvent;
pub use card::{Card, CardColor, CardId, CardRank, DECK_SIZE};
pub use game::{GameError, GameSession, GameStatus, SessionId, HAND_SIZE, MAX_PLAYERS, MIN_PLAYERS};
pub use player::{Player, UserId};
pub use rules::{CardEffect, Direction};
pub use view::{PlayerView, PublicPlayer, PublicView};
