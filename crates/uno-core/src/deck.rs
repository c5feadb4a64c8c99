//! Deck construction, shuffling and dealing.

use crate::card::{Card, CardColor, CardId, CardRank, DECK_SIZE};
use rand::seq::SliceRandom;
use rand::Rng;

/// Build the standard 108-card deck in a fixed, unshuffled order
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    let mut next_id: CardId = 0;
    let mut push = |deck: &mut Vec<Card>, color, rank| {
        deck.push(Card::new(next_id, color, rank));
        next_id += 1;
    };

    for color in CardColor::CONCRETE {
        push(&mut deck, color, CardRank::Number(0));

        for value in 1..=9 {
            push(&mut deck, color, CardRank::Number(value));
            push(&mut deck, color, CardRank::Number(value));
        }

        for _ in 0..2 {
            push(&mut deck, color, CardRank::Skip);
            push(&mut deck, color, CardRank::Reverse);
            push(&mut deck, color, CardRank::DrawTwo);
        }
    }

    for _ in 0..4 {
        push(&mut deck, CardColor::Wild, CardRank::Wild);
        push(&mut deck, CardColor::Wild, CardRank::WildDrawFour);
    }

    deck
}

/// Shuffle a deck in place.
///
/// Wild-family cards lose any colour chosen when they were last played.
pub fn shuffle<R: Rng>(deck: &mut [Card], rng: &mut R) {
    deck.shuffle(rng);
    for card in deck.iter_mut().filter(|c| c.is_wild_family()) {
        card.color = CardColor::Wild;
    }
}

/// Remove up to `n` cards from the head of the deck
pub fn deal(deck: &mut Vec<Card>, n: usize) -> Vec<Card> {
    let n = n.min(deck.len());
    deck.drain(..n).collect()
}

/// Turn everything under the discard top into a fresh shuffled deck.
///
/// The top card stays on the discard pile.
pub fn reshuffle_from_discard<R: Rng>(discard: &mut Vec<Card>, rng: &mut R) -> Vec<Card> {
    if discard.len() <= 1 {
        return Vec::new();
    }

    let below_top = discard.len() - 1;
    let mut fresh: Vec<Card> = discard.drain(..below_top).collect();
    shuffle(&mut fresh, rng);
    fresh
}
