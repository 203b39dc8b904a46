//! Trick play: legality, the overtrump obligation, and resolution.

use serde::Serialize;

use super::cards_logic::{trick_points, trick_winner, trump_strength};
use super::cards_types::{Card, Suit, Trump};
use super::state::{partner_of, Seat};
use crate::errors::domain::{DomainError, RuleViolation};

/// A finalized trick with its winner and point value under the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedTrick {
    pub plays: Vec<(Seat, Card)>,
    pub winner: Seat,
    pub points: u16,
}

impl CompletedTrick {
    /// Resolve a full trick into its completed form.
    pub fn resolve(plays: Vec<(Seat, Card)>, trump: Trump) -> Result<Self, DomainError> {
        let (winner, _) = trick_winner(&plays, trump)
            .ok_or_else(|| DomainError::invariant("cannot resolve an empty trick"))?;
        let points = trick_points(&plays, trump);
        Ok(Self {
            plays,
            winner,
            points,
        })
    }
}

/// The suit that cuts this trick, given the contract mode.
///
/// Under all-trump the led suit plays that role; under no-trump nothing
/// does.
fn cutting_suit(trump: Trump, lead: Suit) -> Option<Suit> {
    match trump {
        Trump::NoTrump => None,
        Trump::AllTrump => Some(lead),
        suited => suited.suit(),
    }
}

/// Strongest trump already lying in the trick, if any.
fn highest_trump_in_trick(trick: &[(Seat, Card)], trump_suit: Suit) -> Option<Card> {
    trick
        .iter()
        .map(|&(_, c)| c)
        .filter(|c| c.suit == trump_suit)
        .max_by_key(|c| trump_strength(c.rank))
}

/// Compute the set of cards `seat` may legally play.
///
/// Encodes the full obligation chain: follow suit, overtrump when the led
/// suit is trump, cut when void (unless the partner is winning), and
/// overcut when the trick already holds a trump.
pub fn legal_plays(hand: &[Card], seat: Seat, trick: &[(Seat, Card)], trump: Trump) -> Vec<Card> {
    if trick.is_empty() {
        return hand.to_vec();
    }
    let lead = trick[0].1.suit;
    let trump_suit = cutting_suit(trump, lead);

    let lead_cards: Vec<Card> = hand.iter().copied().filter(|c| c.suit == lead).collect();
    if !lead_cards.is_empty() {
        // Must follow. When the led suit is trump, must also overtrump a
        // standing trump if able.
        if trump_suit == Some(lead) {
            if let Some(best) = highest_trump_in_trick(trick, lead) {
                let beating: Vec<Card> = lead_cards
                    .iter()
                    .copied()
                    .filter(|c| trump_strength(c.rank) > trump_strength(best.rank))
                    .collect();
                if !beating.is_empty() {
                    return beating;
                }
            }
        }
        return lead_cards;
    }

    // Void in the led suit: free discard while the partner is winning.
    if let Some((winning_seat, _)) = trick_winner(trick, trump) {
        if winning_seat == partner_of(seat) {
            return hand.to_vec();
        }
    }

    let Some(ts) = trump_suit else {
        // No-trump: a void hand discards freely.
        return hand.to_vec();
    };
    let trumps_in_hand: Vec<Card> = hand.iter().copied().filter(|c| c.suit == ts).collect();
    if trumps_in_hand.is_empty() {
        return hand.to_vec();
    }

    // Must cut; must overcut a standing trump if able.
    if let Some(best) = highest_trump_in_trick(trick, ts) {
        let beating: Vec<Card> = trumps_in_hand
            .iter()
            .copied()
            .filter(|c| trump_strength(c.rank) > trump_strength(best.rank))
            .collect();
        if !beating.is_empty() {
            return beating;
        }
    }
    trumps_in_hand
}

/// Validate one specific card against the legality rules, naming the
/// violated obligation on rejection.
pub fn check_play(
    hand: &[Card],
    seat: Seat,
    trick: &[(Seat, Card)],
    trump: Trump,
    card: Card,
) -> Result<(), DomainError> {
    if !hand.contains(&card) {
        return Err(DomainError::illegal(RuleViolation::CardNotInHand));
    }
    let legal = legal_plays(hand, seat, trick, trump);
    if legal.contains(&card) {
        return Ok(());
    }

    // Diagnose: which obligation did the card break?
    let lead = trick[0].1.suit;
    let trump_suit = cutting_suit(trump, lead);
    let mut violations = Vec::new();
    if card.suit != lead && hand.iter().any(|c| c.suit == lead) {
        violations.push(RuleViolation::MustFollowSuit(lead));
    } else if Some(card.suit) == trump_suit || trump_suit == Some(lead) {
        violations.push(RuleViolation::MustOvertrump);
    } else {
        violations.push(RuleViolation::MustTrump);
    }
    Err(DomainError::IllegalMove(violations))
}

/// Winner of the in-progress trick, if any card has been played.
pub fn current_winner(trick: &[(Seat, Card)], trump: Trump) -> Option<(Seat, Card)> {
    trick_winner(trick, trump)
}

/// True when every seat has contributed a card.
pub fn is_complete(trick: &[(Seat, Card)]) -> bool {
    trick.len() == super::state::SEATS
}
