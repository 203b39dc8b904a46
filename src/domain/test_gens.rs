//! Proptest strategies for domain values.

use proptest::prelude::*;
use proptest::sample;

use super::cards_types::{Card, Rank, Suit, Trump};
use super::dealing::fresh_deck;

pub fn suit() -> impl Strategy<Value = Suit> {
    sample::select(&Suit::ALL[..])
}

pub fn rank() -> impl Strategy<Value = Rank> {
    sample::select(&Rank::ALL[..])
}

pub fn trump() -> impl Strategy<Value = Trump> {
    sample::select(&Trump::ALL[..])
}

/// Up to `max` distinct cards drawn from the deck.
pub fn unique_cards_up_to(max: usize) -> impl Strategy<Value = Vec<Card>> {
    sample::subsequence(fresh_deck(), 0..=max)
}

/// A non-empty hand of up to eight distinct cards.
pub fn hand() -> impl Strategy<Value = Vec<Card>> {
    sample::subsequence(fresh_deck(), 1..=8)
}

/// A hand guaranteed void in `void_suit`.
pub fn hand_without_suit(void_suit: Suit) -> impl Strategy<Value = Vec<Card>> {
    let pool: Vec<Card> = fresh_deck()
        .into_iter()
        .filter(|c| c.suit != void_suit)
        .collect();
    sample::subsequence(pool, 1..=8)
}
