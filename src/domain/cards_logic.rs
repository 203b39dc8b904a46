//! Card ranking, point values, and trick comparison.
//!
//! Two ranking tables exist: one for trump cards and one for plain cards.
//! Under all-trump every card uses the trump table; under no-trump every
//! card uses the plain table. Strength values are ordered so that a higher
//! number wins; they are never exposed outside the kernel.

use super::cards_types::{Card, Rank, Suit, Trump};
use super::state::Seat;

/// Trump ranking, strongest first: J, 9, A, 10, K, Q, 8, 7.
pub(crate) const fn trump_strength(rank: Rank) -> u8 {
    match rank {
        Rank::Jack => 7,
        Rank::Nine => 6,
        Rank::Ace => 5,
        Rank::Ten => 4,
        Rank::King => 3,
        Rank::Queen => 2,
        Rank::Eight => 1,
        Rank::Seven => 0,
    }
}

/// Plain ranking, strongest first: A, 10, K, Q, J, 9, 8, 7.
pub(crate) const fn plain_strength(rank: Rank) -> u8 {
    match rank {
        Rank::Ace => 7,
        Rank::Ten => 6,
        Rank::King => 5,
        Rank::Queen => 4,
        Rank::Jack => 3,
        Rank::Nine => 2,
        Rank::Eight => 1,
        Rank::Seven => 0,
    }
}

const fn trump_value(rank: Rank) -> u16 {
    match rank {
        Rank::Jack => 20,
        Rank::Nine => 14,
        Rank::Ace => 11,
        Rank::Ten => 10,
        Rank::King => 4,
        Rank::Queen => 3,
        Rank::Eight | Rank::Seven => 0,
    }
}

const fn plain_value(rank: Rank) -> u16 {
    match rank {
        Rank::Ace => 11,
        Rank::Ten => 10,
        Rank::King => 4,
        Rank::Queen => 3,
        Rank::Jack => 2,
        Rank::Nine | Rank::Eight | Rank::Seven => 0,
    }
}

/// Whether `card` counts as a trump under the contract mode.
///
/// Under all-trump a card only outranks cards of its own suit, so the
/// trump suit is effectively the led suit; `beating_suit` captures that.
fn beating_suit(trump: Trump, lead: Suit) -> Option<Suit> {
    match trump {
        Trump::NoTrump => None,
        Trump::AllTrump => Some(lead),
        suited => suited.suit(),
    }
}

/// Point value of a card under the contract mode.
pub fn card_points(card: Card, trump: Trump) -> u16 {
    match trump {
        Trump::AllTrump => trump_value(card.rank),
        Trump::NoTrump => plain_value(card.rank),
        suited => {
            if Some(card.suit) == suited.suit() {
                trump_value(card.rank)
            } else {
                plain_value(card.rank)
            }
        }
    }
}

/// True if the hand contains at least one card of `suit`.
pub fn hand_has_suit(hand: &[Card], suit: Suit) -> bool {
    hand.iter().any(|c| c.suit == suit)
}

/// Whether `challenger` beats `incumbent` given the led suit and contract
/// mode. Asymmetric: a card that neither trumps nor follows the led suit
/// never beats anything.
pub fn card_beats(challenger: Card, incumbent: Card, lead: Suit, trump: Trump) -> bool {
    let trump_suit = beating_suit(trump, lead);
    let challenger_trump = Some(challenger.suit) == trump_suit;
    let incumbent_trump = Some(incumbent.suit) == trump_suit;
    match (challenger_trump, incumbent_trump) {
        (true, true) => trump_strength(challenger.rank) > trump_strength(incumbent.rank),
        (true, false) => true,
        (false, true) => false,
        (false, false) => {
            challenger.suit == lead
                && (incumbent.suit != lead
                    || plain_strength(challenger.rank) > plain_strength(incumbent.rank))
        }
    }
}

/// Winner of a (possibly partial) trick: the seat whose card currently
/// stands. Ties are impossible with distinct cards.
pub fn trick_winner(plays: &[(Seat, Card)], trump: Trump) -> Option<(Seat, Card)> {
    let (first_seat, first_card) = *plays.first()?;
    let lead = first_card.suit;
    let mut best = (first_seat, first_card);
    for &(seat, card) in &plays[1..] {
        if card_beats(card, best.1, lead, trump) {
            best = (seat, card);
        }
    }
    Some(best)
}

/// Total point value of a trick's cards under the contract mode.
pub fn trick_points(plays: &[(Seat, Card)], trump: Trump) -> u16 {
    plays.iter().map(|&(_, c)| card_points(c, trump)).sum()
}
