//! Round-scoring tests, including the reference rounds used to validate
//! the scoring pipeline end to end at the kernel level.

use super::bidding::Contract;
use super::cards_types::{Suit, Trump};
use super::scoring::{game_winner, round_to_ten, score_round, RoundOutcome};
use super::state::{Seat, Team};
use super::tricks::CompletedTrick;

fn ct(entries: &[(Seat, &str)], trump: Trump) -> CompletedTrick {
    let plays = entries
        .iter()
        .map(|&(s, tok)| (s, tok.parse().unwrap()))
        .collect();
    CompletedTrick::resolve(plays, trump).unwrap()
}

fn contract(trump: Trump, value: u16, declarer: Seat) -> Contract {
    Contract {
        trump,
        value,
        doubled: false,
        redoubled: false,
        declarer,
    }
}

/// Reference round, spades trump: team A takes 82 card points and the
/// last trick, team B takes 70. Exercises every card in the deck once.
fn reference_round() -> Vec<CompletedTrick> {
    let t = Trump::Spades;
    vec![
        ct(&[(0, "JS"), (1, "9S"), (2, "7C"), (3, "8C")], t), // 34 -> A
        ct(&[(2, "AS"), (3, "TS"), (0, "9C"), (1, "JC")], t), // 23 -> A
        ct(&[(0, "KS"), (1, "QS"), (2, "AH"), (3, "7H")], t), // 18 -> A
        ct(&[(1, "TH"), (2, "JH"), (3, "9H"), (0, "8H")], t), // 12 -> B
        ct(&[(3, "AD"), (0, "TD"), (1, "KD"), (2, "QD")], t), // 28 -> B
        ct(&[(1, "AC"), (2, "TC"), (3, "JD"), (0, "9D")], t), // 23 -> B
        ct(&[(3, "8S"), (0, "KC"), (1, "7S"), (2, "QC")], t), // 7  -> B
        ct(&[(2, "KH"), (3, "QH"), (0, "7D"), (1, "8D")], t), // 7  -> A
    ]
}

/// Same playout, every trick rewired to a team-A winner.
fn capot_round() -> Vec<CompletedTrick> {
    let t = Trump::Spades;
    vec![
        ct(&[(0, "JS"), (1, "9S"), (2, "7C"), (3, "8C")], t),
        ct(&[(2, "AS"), (3, "TS"), (0, "9C"), (1, "JC")], t),
        ct(&[(0, "KS"), (1, "QS"), (2, "AH"), (3, "7H")], t),
        ct(&[(2, "TH"), (3, "JH"), (0, "9H"), (1, "8H")], t),
        ct(&[(0, "AD"), (1, "TD"), (2, "KD"), (3, "QD")], t),
        ct(&[(2, "AC"), (3, "TC"), (0, "JD"), (1, "9D")], t),
        ct(&[(0, "8S"), (1, "KC"), (2, "7S"), (3, "QC")], t),
        ct(&[(2, "KH"), (3, "QH"), (0, "7D"), (1, "8D")], t),
    ]
}

#[test]
fn reference_round_conserves_the_162_points() {
    let tricks = reference_round();
    let outcome = score_round(&contract(Trump::Spades, 80, 0), &tricks).unwrap();
    assert_eq!(outcome.card_points[0] + outcome.card_points[1], 162);
}

#[test]
fn fulfilled_minimum_contract() {
    // Team A declares spades 80, takes 82 card points plus dix-de-der.
    let outcome = score_round(&contract(Trump::Spades, 80, 0), &reference_round()).unwrap();
    assert!(outcome.fulfilled);
    assert_eq!(outcome.card_points, [92, 70]);
    assert_eq!(outcome.last_trick_winner, Team::A);
    assert_eq!(outcome.awarded, [90, 70], "92 rounds to 90; 70 is exact");
    assert!(outcome.belote.is_empty());
    assert!(outcome.capot.is_none());
}

#[test]
fn failed_contract_awards_everything_to_defenders() {
    // Same playout, but the commitment was 100: 92 falls short.
    let outcome = score_round(&contract(Trump::Spades, 100, 0), &reference_round()).unwrap();
    assert!(!outcome.fulfilled);
    // Defenders collect 160 + all card points + dix-de-der = 322, rounded.
    assert_eq!(outcome.awarded, [0, 320]);
}

#[test]
fn coinche_doubles_both_awards() {
    let mut c = contract(Trump::Spades, 80, 0);
    c.doubled = true;
    let outcome = score_round(&c, &reference_round()).unwrap();
    assert!(outcome.fulfilled);
    // Pre-multiplier 92 / 70; x2 then rounded: 184 -> 180, 140 -> 140.
    assert_eq!(outcome.awarded, [180, 140]);
}

#[test]
fn surcoinche_quadruples_both_awards() {
    let mut c = contract(Trump::Spades, 80, 0);
    c.doubled = true;
    c.redoubled = true;
    let outcome = score_round(&c, &reference_round()).unwrap();
    assert_eq!(outcome.awarded, [round_to_ten(92 * 4), round_to_ten(70 * 4)]);
}

#[test]
fn capot_by_declarer_scores_250() {
    let outcome = score_round(&contract(Trump::Spades, 100, 0), &capot_round()).unwrap();
    assert_eq!(outcome.capot, Some(Team::A));
    assert!(outcome.fulfilled);
    assert_eq!(outcome.awarded, [250, 0]);
}

#[test]
fn capot_by_defenders_scores_500() {
    // Team B declared, team A still swept every trick.
    let outcome = score_round(&contract(Trump::Spades, 100, 1), &capot_round()).unwrap();
    assert_eq!(outcome.capot, Some(Team::A));
    assert!(!outcome.fulfilled, "declarer took no trick");
    assert_eq!(outcome.awarded, [500, 0]);
}

#[test]
fn capot_with_coinche_multiplies_after_reassignment() {
    let mut c = contract(Trump::Spades, 100, 1);
    c.doubled = true;
    let outcome = score_round(&c, &capot_round()).unwrap();
    assert_eq!(outcome.awarded, [1000, 0]);
}

#[test]
fn belote_awards_twenty_to_the_holder_team() {
    let t = Trump::Spades;
    // Seat 0 plays both the king and queen of trump across two tricks.
    let tricks = vec![
        ct(&[(0, "JS"), (1, "9S"), (2, "7C"), (3, "8C")], t),
        ct(&[(2, "AS"), (3, "TS"), (0, "9C"), (1, "JC")], t),
        ct(&[(0, "KS"), (1, "8S"), (2, "AH"), (3, "7H")], t),
        ct(&[(1, "TH"), (2, "JH"), (3, "9H"), (0, "8H")], t),
        ct(&[(3, "AD"), (0, "TD"), (1, "KD"), (2, "QD")], t),
        ct(&[(1, "AC"), (2, "TC"), (3, "JD"), (0, "9D")], t),
        ct(&[(0, "QS"), (1, "7S"), (2, "KC"), (3, "QC")], t),
        ct(&[(2, "KH"), (3, "QH"), (0, "7D"), (1, "8D")], t),
    ];
    let outcome = score_round(&contract(t, 80, 0), &tricks).unwrap();
    assert_eq!(outcome.belote, vec![(0, Suit::Spades)]);
    assert!(outcome.fulfilled);
    // Awarded includes the 20-point bonus on top of the raw card points.
    assert_eq!(
        outcome.awarded[0],
        round_to_ten(u32::from(outcome.card_points[0]) + 20)
    );
}

#[test]
fn no_belote_under_no_trump() {
    let t = Trump::NoTrump;
    let tricks = vec![
        ct(&[(0, "KS"), (1, "9S"), (2, "7C"), (3, "8C")], t),
        ct(&[(0, "QS"), (1, "TS"), (2, "9C"), (3, "JC")], t),
        ct(&[(0, "AS"), (1, "JS"), (2, "AH"), (3, "7H")], t),
        ct(&[(0, "8S"), (1, "TH"), (2, "JH"), (3, "9H")], t),
        ct(&[(3, "AD"), (0, "TD"), (1, "KD"), (2, "QD")], t),
        ct(&[(1, "AC"), (2, "TC"), (3, "JD"), (0, "9D")], t),
        ct(&[(0, "8H"), (1, "7S"), (2, "KC"), (3, "QC")], t),
        ct(&[(2, "KH"), (3, "QH"), (0, "7D"), (1, "8D")], t),
    ];
    let outcome = score_round(&contract(t, 80, 0), &tricks).unwrap();
    assert!(
        outcome.belote.is_empty(),
        "belote requires a real trump suit"
    );
}

#[test]
fn all_trump_belote_applies_per_suit_held() {
    let t = Trump::AllTrump;
    // Seat 0 plays K and Q of spades; seat 3 plays K and Q of hearts.
    let tricks = vec![
        ct(&[(0, "JS"), (1, "9S"), (2, "7C"), (3, "8C")], t),
        ct(&[(2, "AS"), (3, "TS"), (0, "9C"), (1, "JC")], t),
        ct(&[(0, "KS"), (1, "8S"), (2, "AH"), (3, "KH")], t),
        ct(&[(1, "TH"), (2, "JH"), (3, "QH"), (0, "8H")], t),
        ct(&[(3, "AD"), (0, "TD"), (1, "KD"), (2, "QD")], t),
        ct(&[(1, "AC"), (2, "TC"), (3, "JD"), (0, "9D")], t),
        ct(&[(0, "QS"), (1, "7S"), (2, "KC"), (3, "QC")], t),
        ct(&[(2, "9H"), (3, "7H"), (0, "7D"), (1, "8D")], t),
    ];
    let outcome = score_round(&contract(t, 80, 0), &tricks).unwrap();
    assert!(outcome.belote.contains(&(0, Suit::Spades)));
    assert!(outcome.belote.contains(&(3, Suit::Hearts)));
}

#[test]
fn scoring_rejects_incomplete_rounds() {
    let tricks = &reference_round()[..7];
    assert!(score_round(&contract(Trump::Spades, 80, 0), tricks).is_err());
}

#[test]
fn rounding_goes_to_nearest_ten_halves_up() {
    assert_eq!(round_to_ten(92), 90);
    assert_eq!(round_to_ten(95), 100);
    assert_eq!(round_to_ten(94), 90);
    assert_eq!(round_to_ten(0), 0);
    assert_eq!(round_to_ten(165), 170);
}

#[test]
fn game_ends_only_when_target_reached_and_strictly_ahead() {
    assert_eq!(game_winner([1000, 990], 1000), Some(Team::A));
    assert_eq!(game_winner([990, 1000], 1000), Some(Team::B));
    assert_eq!(game_winner([990, 990], 1000), None);
    assert_eq!(game_winner([1010, 1010], 1000), None, "ties continue play");
    assert_eq!(game_winner([1050, 1020], 1000), Some(Team::A));
    assert_eq!(game_winner([0, 0], 1000), None);
}

#[test]
fn outcome_serializes_for_event_payloads() {
    let outcome: RoundOutcome =
        score_round(&contract(Trump::Spades, 80, 0), &reference_round()).unwrap();
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["awarded"][0], 90);
    assert_eq!(json["fulfilled"], true);
}
