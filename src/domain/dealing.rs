//! Deterministic deck construction, shuffling, and dealing.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::cards_types::{Card, Rank, Suit};
use super::state::{next_seat, Seat, HAND_SIZE, SEATS};
use crate::errors::domain::DomainError;

pub const DECK_SIZE: usize = 32;

/// The 3-2-3 packet pattern the ruleset prescribes for dealing.
const PACKETS: [usize; 3] = [3, 2, 3];

/// Generate the full 32-card deck in canonical order.
pub fn fresh_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card { suit, rank });
        }
    }
    deck
}

/// A freshly shuffled deck for the given seed.
///
/// All randomness in a game flows from its creation seed so a deal can be
/// reproduced exactly from (seed, deal number).
pub fn shuffled_deck(seed: u64) -> Vec<Card> {
    let mut deck = fresh_deck();
    let mut rng = StdRng::seed_from_u64(seed);
    deck.shuffle(&mut rng);
    deck
}

/// Derive the per-deal seed from the game seed and the running deal count.
///
/// SplitMix64 finalizer; cheap and well distributed.
pub fn derive_dealing_seed(game_seed: u64, deal_no: u32) -> u64 {
    let mut z = game_seed
        .wrapping_add(0x9E3779B97F4A7C15u64.wrapping_mul(deal_no as u64 + 1));
    z ^= z >> 30;
    z = z.wrapping_mul(0xBF58476D1CE4E5B9);
    z ^= z >> 27;
    z = z.wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Deal a 32-card deck into four 8-card hands, 3-2-3, starting at the seat
/// left of the dealer.
pub fn deal_hands(deck: &[Card], dealer: Seat) -> Result<[Vec<Card>; SEATS], DomainError> {
    if deck.len() != DECK_SIZE {
        return Err(DomainError::invariant(format!(
            "deal requires {DECK_SIZE} cards, got {}",
            deck.len()
        )));
    }
    let mut hands: [Vec<Card>; SEATS] = Default::default();
    let mut cursor = 0usize;
    for packet in PACKETS {
        let mut seat = next_seat(dealer);
        for _ in 0..SEATS {
            hands[seat as usize].extend_from_slice(&deck[cursor..cursor + packet]);
            cursor += packet;
            seat = next_seat(seat);
        }
    }
    debug_assert_eq!(cursor, DECK_SIZE);
    debug_assert!(hands.iter().all(|h| h.len() == HAND_SIZE));
    Ok(hands)
}
