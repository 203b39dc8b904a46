//! Full-round playout tests driven entirely by the rules kernel.

use std::collections::HashSet;

use super::cards_types::{Card, Trump};
use super::dealing::{deal_hands, shuffled_deck, DECK_SIZE};
use super::state::{next_seat, Seat, ROUND_TRICKS, SEATS};
use super::tricks::{is_complete, legal_plays, CompletedTrick};

/// Play a full round from a deal: every seat plays its first legal card.
/// Returns the eight completed tricks.
pub(super) fn simulate_round(mut hands: [Vec<Card>; SEATS], trump: Trump) -> Vec<CompletedTrick> {
    let mut completed = Vec::with_capacity(ROUND_TRICKS);
    let mut leader: Seat = 0;
    for _ in 0..ROUND_TRICKS {
        let mut trick: Vec<(Seat, Card)> = Vec::with_capacity(SEATS);
        let mut seat = leader;
        while !is_complete(&trick) {
            let hand = &mut hands[seat as usize];
            let legal = legal_plays(hand, seat, &trick, trump);
            assert!(!legal.is_empty(), "seat {seat} has no legal play");
            let card = legal[0];
            let pos = hand.iter().position(|&c| c == card).unwrap();
            hand.remove(pos);
            trick.push((seat, card));
            seat = next_seat(seat);
        }
        let resolved = CompletedTrick::resolve(trick, trump).unwrap();
        leader = resolved.winner;
        completed.push(resolved);
    }
    assert!(hands.iter().all(|h| h.is_empty()));
    completed
}

#[test]
fn simulated_rounds_conserve_all_32_cards() {
    for seed in [1u64, 7, 42, 1337] {
        for trump in Trump::ALL {
            let hands = deal_hands(&shuffled_deck(seed), 0).unwrap();
            let tricks = simulate_round(hands, trump);
            let played: HashSet<Card> = tricks
                .iter()
                .flat_map(|t| t.plays.iter().map(|&(_, c)| c))
                .collect();
            assert_eq!(played.len(), DECK_SIZE, "seed {seed} trump {trump}");
        }
    }
}

#[test]
fn suit_contract_rounds_total_152_card_points() {
    for seed in [3u64, 99, 2024] {
        let hands = deal_hands(&shuffled_deck(seed), 2).unwrap();
        let tricks = simulate_round(hands, Trump::Hearts);
        let total: u16 = tricks.iter().map(|t| t.points).sum();
        assert_eq!(total, 152);
    }
}

#[test]
fn all_trump_round_totals_248_card_points() {
    let hands = deal_hands(&shuffled_deck(11), 0).unwrap();
    let tricks = simulate_round(hands, Trump::AllTrump);
    let total: u16 = tricks.iter().map(|t| t.points).sum();
    assert_eq!(total, 248, "four suits of the 62-point trump table");
}

#[test]
fn no_trump_round_totals_120_card_points() {
    let hands = deal_hands(&shuffled_deck(11), 0).unwrap();
    let tricks = simulate_round(hands, Trump::NoTrump);
    let total: u16 = tricks.iter().map(|t| t.points).sum();
    assert_eq!(total, 120, "four suits of the 30-point plain table");
}

#[test]
fn every_trick_winner_holds_the_standing_card() {
    let hands = deal_hands(&shuffled_deck(5), 1).unwrap();
    let tricks = simulate_round(hands, Trump::Clubs);
    for trick in &tricks {
        assert!(trick.plays.iter().any(|&(s, _)| s == trick.winner));
        assert_eq!(trick.plays.len(), SEATS);
    }
}
