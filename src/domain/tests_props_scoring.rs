//! Property-based tests for the scoring laws over generated playouts.

use proptest::prelude::*;

use super::bidding::Contract;
use super::cards_types::Trump;
use super::dealing::{deal_hands, shuffled_deck};
use super::scoring::{round_to_ten, score_round};
use super::state::Team;
use super::test_gens;
use super::tests_tricks::simulate_round;

fn suit_trump() -> impl Strategy<Value = Trump> {
    proptest::sample::select(&[Trump::Clubs, Trump::Diamonds, Trump::Hearts, Trump::Spades][..])
}

proptest! {
    /// The 162-point law: under a suit contract the raw team totals always
    /// sum to 152 card points plus the 10-point dix-de-der.
    #[test]
    fn prop_round_totals_162(seed in any::<u64>(), trump in suit_trump()) {
        let hands = deal_hands(&shuffled_deck(seed), 0).unwrap();
        let tricks = simulate_round(hands, trump);
        let contract = Contract { trump, value: 80, doubled: false, redoubled: false, declarer: 0 };
        let outcome = score_round(&contract, &tricks).unwrap();
        prop_assert_eq!(outcome.card_points[0] + outcome.card_points[1], 162);
    }

    /// Awarded scores are always multiples of ten.
    #[test]
    fn prop_awards_are_round(
        seed in any::<u64>(),
        trump in test_gens::trump(),
        value in (8u16..=16).prop_map(|v| v * 10),
        declarer in 0u8..4,
        doubled in any::<bool>(),
    ) {
        let hands = deal_hands(&shuffled_deck(seed), 0).unwrap();
        let tricks = simulate_round(hands, trump);
        let contract = Contract { trump, value, doubled, redoubled: false, declarer };
        let outcome = score_round(&contract, &tricks).unwrap();
        prop_assert_eq!(outcome.awarded[0] % 10, 0);
        prop_assert_eq!(outcome.awarded[1] % 10, 0);
    }

    /// A failed contract without capot awards the declaring team nothing
    /// and the defenders the fixed 160 + card points + dix-de-der pot.
    #[test]
    fn prop_failed_contract_pot(seed in any::<u64>(), trump in suit_trump(), declarer in 0u8..4) {
        let hands = deal_hands(&shuffled_deck(seed), 0).unwrap();
        let tricks = simulate_round(hands, trump);
        // An unreachable commitment guarantees failure.
        let contract = Contract { trump, value: 400, doubled: false, redoubled: false, declarer };
        let outcome = score_round(&contract, &tricks).unwrap();
        prop_assume!(outcome.capot.is_none());
        prop_assert!(!outcome.fulfilled);
        let declaring = Team::of(declarer);
        prop_assert_eq!(outcome.awarded[declaring.index()], 0);
        prop_assert_eq!(
            outcome.awarded[declaring.opponent().index()],
            round_to_ten(160 + 152 + 10)
        );
    }

    /// Capot totals are fixed regardless of how the card points fell.
    #[test]
    fn prop_capot_totals_are_fixed(seed in any::<u64>(), trump in suit_trump()) {
        let hands = deal_hands(&shuffled_deck(seed), 0).unwrap();
        let tricks = simulate_round(hands, trump);
        let contract = Contract { trump, value: 80, doubled: false, redoubled: false, declarer: 0 };
        let outcome = score_round(&contract, &tricks).unwrap();
        if let Some(team) = outcome.capot {
            let expected = if team == contract.declaring_team() { 250 } else { 500 };
            prop_assert_eq!(outcome.awarded[team.index()], expected);
            prop_assert_eq!(outcome.awarded[team.opponent().index()], 0);
        }
    }
}
