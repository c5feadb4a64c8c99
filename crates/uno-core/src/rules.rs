//! Play legality and card effects.
//!
//! Everything here is a pure function of its inputs; `GameSession` applies
//! the resulting [`CardEffect`] to its own state.

use crate::card::{Card, CardRank};
use serde::{Deserialize, Serialize};

/// Direction of travel around the turn-order ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Clockwise,
    Counterclockwise,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Clockwise => Direction::Counterclockwise,
            Direction::Counterclockwise => Direction::Clockwise,
        }
    }
}

/// What happens to the table after a card is played
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardEffect {
    /// Flip the direction before moving the turn pointer
    pub reverse: bool,
    /// Cards the next player in turn order must draw
    pub penalty_draw: usize,
    /// Ring steps the turn pointer moves, in the (possibly flipped) direction
    pub steps: usize,
}

impl CardEffect {
    /// A plain card: the turn passes to the next player
    pub const PASS: CardEffect = CardEffect {
        reverse: false,
        penalty_draw: 0,
        steps: 1,
    };
}

/// Whether `card` may be played on top of `top`
pub fn is_legal_play(card: &Card, top: &Card) -> bool {
    if card.is_wild_family() {
        return true;
    }
    card.color == top.color || card.rank == top.rank
}

/// The effect of playing `card` at a table of `player_count` players
pub fn resolve_effect(card: &Card, player_count: usize) -> CardEffect {
    match card.rank {
        CardRank::Skip => CardEffect {
            steps: 2,
            ..CardEffect::PASS
        },
        CardRank::Reverse => CardEffect {
            reverse: true,
            // Heads-up, a reverse hands the turn straight back
            steps: if player_count == 2 { 2 } else { 1 },
            penalty_draw: 0,
        },
        CardRank::DrawTwo => CardEffect {
            reverse: false,
            penalty_draw: 2,
            steps: 2,
        },
        CardRank::WildDrawFour => CardEffect {
            reverse: false,
            penalty_draw: 4,
            steps: 2,
        },
        CardRank::Number(_) | CardRank::Wild => CardEffect::PASS,
    }
}

/// Index of the seat one step from `current` in `direction`
pub fn next_index(current: usize, direction: Direction, player_count: usize) -> usize {
    assert!(player_count > 0, "turn ring is empty");
    match direction {
        Direction::Clockwise => (current + 1) % player_count,
        Direction::Counterclockwise => (current + player_count - 1) % player_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardColor;
    use rstest::rstest;

    fn card(color: CardColor, rank: CardRank) -> Card {
        Card::new(0, color, rank)
    }

    #[rstest]
    #[case(card(CardColor::Red, CardRank::Number(3)), true)]
    #[case(card(CardColor::Blue, CardRank::Number(5)), true)]
    #[case(card(CardColor::Blue, CardRank::Number(6)), false)]
    #[case(card(CardColor::Red, CardRank::Skip), true)]
    #[case(card(CardColor::Green, CardRank::Skip), false)]
    #[case(card(CardColor::Wild, CardRank::Wild), true)]
    #[case(card(CardColor::Wild, CardRank::WildDrawFour), true)]
    fn test_legality_against_red_five(#[case] played: Card, #[case] legal: bool) {
        let top = card(CardColor::Red, CardRank::Number(5));
        assert_eq!(is_legal_play(&played, &top), legal);
    }

    #[test]
    fn test_action_ranks_match_across_colors() {
        let top = card(CardColor::Yellow, CardRank::DrawTwo);
        assert!(is_legal_play(&card(CardColor::Green, CardRank::DrawTwo), &top));
        assert!(!is_legal_play(&card(CardColor::Green, CardRank::Reverse), &top));
    }

    #[rstest]
    #[case(CardRank::Number(7), 3, CardEffect::PASS)]
    #[case(CardRank::Wild, 3, CardEffect::PASS)]
    #[case(CardRank::Skip, 3, CardEffect { reverse: false, penalty_draw: 0, steps: 2 })]
    #[case(CardRank::Reverse, 3, CardEffect { reverse: true, penalty_draw: 0, steps: 1 })]
    #[case(CardRank::Reverse, 2, CardEffect { reverse: true, penalty_draw: 0, steps: 2 })]
    #[case(CardRank::DrawTwo, 4, CardEffect { reverse: false, penalty_draw: 2, steps: 2 })]
    #[case(CardRank::WildDrawFour, 2, CardEffect { reverse: false, penalty_draw: 4, steps: 2 })]
    fn test_resolve_effect(
        #[case] rank: CardRank,
        #[case] players: usize,
        #[case] expected: CardEffect,
    ) {
        assert_eq!(resolve_effect(&card(CardColor::Red, rank), players), expected);
    }

    #[rstest]
    #[case(0, Direction::Clockwise, 4, 1)]
    #[case(3, Direction::Clockwise, 4, 0)]
    #[case(0, Direction::Counterclockwise, 4, 3)]
    #[case(2, Direction::Counterclockwise, 3, 1)]
    #[case(1, Direction::Clockwise, 2, 0)]
    fn test_next_index(
        #[case] current: usize,
        #[case] direction: Direction,
        #[case] count: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(next_index(current, direction, count), expected);
    }
}
