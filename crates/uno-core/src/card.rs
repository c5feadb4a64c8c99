//! Card model.
//!
//! A standard deck holds 108 cards: per colour one 0, two of each 1-9, and two
//! each of Skip, Reverse and Draw Two, plus four Wild and four Wild Draw Four.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Total number of cards in play for a running game
pub const DECK_SIZE: usize = 108;

/// Identifier of a single physical card, unique within one deck
pub type CardId = u32;

/// Card colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardColor {
    Red,
    Blue,
    Green,
    Yellow,
    /// Neutral colour carried by wild-family cards until they are played
    Wild,
}

impl CardColor {
    /// The four colours a player may name when playing a wild card
    pub const CONCRETE: [CardColor; 4] = [
        CardColor::Red,
        CardColor::Blue,
        CardColor::Green,
        CardColor::Yellow,
    ];

    pub fn is_concrete(&self) -> bool {
        !matches!(self, CardColor::Wild)
    }
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardColor::Red => "red",
            CardColor::Blue => "blue",
            CardColor::Green => "green",
            CardColor::Yellow => "yellow",
            CardColor::Wild => "wild",
        };
        f.write_str(name)
    }
}

/// Card rank (face value or action)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardRank {
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

impl CardRank {
    /// Wild and Wild Draw Four
    pub fn is_wild_family(&self) -> bool {
        matches!(self, CardRank::Wild | CardRank::WildDrawFour)
    }
}

impl fmt::Display for CardRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardRank::Number(n) => write!(f, "{}", n),
            CardRank::Skip => f.write_str("skip"),
            CardRank::Reverse => f.write_str("reverse"),
            CardRank::DrawTwo => f.write_str("+2"),
            CardRank::Wild => f.write_str("wild"),
            CardRank::WildDrawFour => f.write_str("wild +4"),
        }
    }
}

/// A single card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: CardColor,
    pub rank: CardRank,
}

impl Card {
    pub fn new(id: CardId, color: CardColor, rank: CardRank) -> Self {
        Self { id, color, rank }
    }

    pub fn is_wild_family(&self) -> bool {
        self.rank.is_wild_family()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_wild_family() && self.color == CardColor::Wild {
            write!(f, "{}", self.rank)
        } else {
            write!(f, "{} {}", self.color, self.rank)
        }
    }
}
