//! Auction rule tests: domination, coinche, surcoinche.

use time::OffsetDateTime;

use super::bidding::{Bid, BiddingState, MIN_BID};
use super::cards_types::Trump;
use super::state::Seat;
use crate::errors::domain::{DomainError, RuleViolation};

fn bid(seat: Seat, trump: Trump, value: u16) -> Bid {
    Bid {
        seat,
        trump,
        value,
        placed_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn auction_with(seat: Seat, trump: Trump, value: u16) -> BiddingState {
    let mut state = BiddingState::fresh();
    state.place(bid(seat, trump, value));
    state
}

#[test]
fn first_bid_must_reach_eighty() {
    let state = BiddingState::fresh();
    assert!(matches!(
        state.check_bid(Trump::Spades, 79),
        Err(DomainError::IllegalMove(v))
            if v == vec![RuleViolation::BidBelowMinimum { minimum: MIN_BID }]
    ));
    assert!(state.check_bid(Trump::Spades, 80).is_ok());
}

#[test]
fn follow_on_bid_must_dominate_by_value() {
    let state = auction_with(0, Trump::Spades, 90);
    assert!(state.check_bid(Trump::Clubs, 100).is_ok());
    assert!(state.check_bid(Trump::Clubs, 90).is_err());
    assert!(state.check_bid(Trump::Clubs, 80).is_err());
}

#[test]
fn equal_value_requires_higher_priority() {
    // clubs < diamonds < hearts < spades < no-trump < all-trump
    let state = auction_with(0, Trump::Hearts, 90);
    assert!(state.check_bid(Trump::Spades, 90).is_ok());
    assert!(state.check_bid(Trump::NoTrump, 90).is_ok());
    assert!(state.check_bid(Trump::AllTrump, 90).is_ok());
    assert!(state.check_bid(Trump::Diamonds, 90).is_err());
    assert!(state.check_bid(Trump::Hearts, 90).is_err());
}

#[test]
fn double_closes_the_auction_to_further_bids() {
    let mut state = auction_with(0, Trump::Spades, 80);
    state.doubled = true;
    state.doubled_by = Some(1);
    assert!(matches!(
        state.check_bid(Trump::AllTrump, 200),
        Err(DomainError::IllegalMove(v)) if v == vec![RuleViolation::BiddingClosed]
    ));
}

#[test]
fn coinche_requires_a_live_opposing_bid() {
    // No bid yet: nothing to double.
    assert!(BiddingState::fresh().check_coinche(1).is_err());

    let state = auction_with(0, Trump::Spades, 80);
    // Declarer's own team cannot coinche.
    assert!(state.check_coinche(0).is_err());
    assert!(state.check_coinche(2).is_err());
    // Opponents can.
    assert!(state.check_coinche(1).is_ok());
    assert!(state.check_coinche(3).is_ok());
}

#[test]
fn coinche_cannot_stack() {
    let mut state = auction_with(0, Trump::Spades, 80);
    state.doubled = true;
    state.doubled_by = Some(1);
    assert!(state.check_coinche(3).is_err());
}

#[test]
fn surcoinche_only_by_declaring_team_after_double() {
    let mut state = auction_with(0, Trump::Spades, 80);
    // Not doubled yet.
    assert!(state.check_surcoinche(0).is_err());

    state.doubled = true;
    state.doubled_by = Some(1);
    assert!(state.check_surcoinche(0).is_ok());
    assert!(state.check_surcoinche(2).is_ok());
    // Doubling team cannot redouble.
    assert!(state.check_surcoinche(1).is_err());
    assert!(state.check_surcoinche(3).is_err());

    state.redoubled = true;
    assert!(state.check_surcoinche(0).is_err(), "already redoubled");
}

#[test]
fn pass_counter_resets_on_bid() {
    let mut state = BiddingState::fresh();
    assert_eq!(state.pass(1), 1);
    assert_eq!(state.pass(2), 2);
    state.place(bid(3, Trump::Hearts, 80));
    assert_eq!(state.consecutive_passes, 0);
    assert_eq!(state.pass(0), 1);
}

#[test]
fn contract_reflects_the_frozen_bid_and_doubles() {
    let mut state = auction_with(2, Trump::AllTrump, 110);
    state.doubled = true;
    state.doubled_by = Some(3);
    state.close();
    let contract = state.winning_contract().unwrap();
    assert_eq!(contract.declarer, 2);
    assert_eq!(contract.trump, Trump::AllTrump);
    assert_eq!(contract.value, 110);
    assert!(contract.doubled);
    assert!(!contract.redoubled);
    assert_eq!(contract.multiplier(), 2);
}
