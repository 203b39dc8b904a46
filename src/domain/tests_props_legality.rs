//! Property-based tests for play-legality rules.

use std::collections::HashSet;

use proptest::prelude::*;

use super::cards_types::{Card, Trump};
use super::state::{partner_of, Seat};
use super::test_gens;
use super::tricks::{current_winner, legal_plays};

/// Build a partial trick from distinct cards not present in the hand.
fn trick_from(cards: &[Card], hand: &[Card], len: usize) -> Vec<(Seat, Card)> {
    cards
        .iter()
        .filter(|c| !hand.contains(c))
        .take(len)
        .enumerate()
        .map(|(i, &c)| (i as Seat, c))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 65536, ..ProptestConfig::default() })]
    /// Legal plays are always a non-empty subset of the hand with no
    /// duplicates, for every trick shape and contract mode.
    #[test]
    fn prop_legal_plays_nonempty_subset(
        hand in test_gens::hand(),
        pool in test_gens::unique_cards_up_to(16),
        trick_len in 0usize..=3,
        trump in test_gens::trump(),
    ) {
        let trick = trick_from(&pool, &hand, trick_len);
        let legal = legal_plays(&hand, 3, &trick, trump);

        prop_assert!(!legal.is_empty(), "a non-empty hand always has a legal play");
        let set: HashSet<Card> = legal.iter().copied().collect();
        prop_assert_eq!(set.len(), legal.len(), "no duplicates");
        for card in &legal {
            prop_assert!(hand.contains(card), "legal play {:?} must come from the hand", card);
        }
    }

    /// Follow-suit: while the hand holds the led suit, every legal play is
    /// of that suit, unless freed by the partner-winning exception (which
    /// only applies when void).
    #[test]
    fn prop_follow_suit(
        hand in test_gens::hand(),
        pool in test_gens::unique_cards_up_to(16),
        trick_len in 1usize..=3,
        trump in test_gens::trump(),
    ) {
        let trick = trick_from(&pool, &hand, trick_len);
        prop_assume!(!trick.is_empty());
        let lead = trick[0].1.suit;
        prop_assume!(hand.iter().any(|c| c.suit == lead));

        let legal = legal_plays(&hand, 3, &trick, trump);
        for card in &legal {
            prop_assert_eq!(card.suit, lead, "must follow {}", lead);
        }
    }

    /// Void with the partner winning: the whole hand is legal.
    #[test]
    fn prop_partner_winning_frees_discard(
        (lead, hand) in test_gens::suit().prop_flat_map(|s| {
            (Just(s), test_gens::hand_without_suit(s))
        }),
        pool in test_gens::unique_cards_up_to(16),
        trump in test_gens::trump(),
        seat in 0u8..4,
    ) {
        let lead_cards: Vec<Card> = pool.iter().copied()
            .filter(|c| c.suit == lead && !hand.contains(c))
            .take(2)
            .collect();
        prop_assume!(lead_cards.len() == 2);
        // The partner leads and is currently winning.
        let partner = partner_of(seat);
        let trick = vec![(partner, lead_cards[0]), (seat_after(partner), lead_cards[1])];
        prop_assume!(matches!(current_winner(&trick, trump), Some((w, _)) if w == partner));

        let legal = legal_plays(&hand, seat, &trick, trump);
        prop_assert_eq!(legal.len(), hand.len(), "free discard when partner wins");
    }

    /// Under no-trump a void hand is never forced: all cards are legal.
    #[test]
    fn prop_no_trump_void_is_free(
        (lead, hand) in test_gens::suit().prop_flat_map(|s| {
            (Just(s), test_gens::hand_without_suit(s))
        }),
        lead_rank in test_gens::rank(),
    ) {
        let trick = vec![(0 as Seat, Card { suit: lead, rank: lead_rank })];
        let legal = legal_plays(&hand, 1, &trick, Trump::NoTrump);
        prop_assert_eq!(legal.len(), hand.len());
    }

    /// The winner of any trick either trumped or followed the led suit.
    #[test]
    fn prop_winner_followed_or_cut(
        pool in test_gens::unique_cards_up_to(8),
        trump in test_gens::trump(),
    ) {
        prop_assume!(pool.len() >= 4);
        let trick: Vec<(Seat, Card)> = pool[..4]
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as Seat, c))
            .collect();
        let lead = trick[0].1.suit;
        let (_, card) = current_winner(&trick, trump).unwrap();
        let cut_suit = match trump {
            Trump::NoTrump => None,
            Trump::AllTrump => Some(lead),
            suited => suited.suit(),
        };
        prop_assert!(
            card.suit == lead || Some(card.suit) == cut_suit,
            "winner {:?} neither followed {} nor cut", card, lead
        );
    }
}

fn seat_after(seat: Seat) -> Seat {
    super::state::next_seat(seat)
}
