//! Round scoring: card totals, bonuses, capot, fulfilment, multipliers.

use serde::{Deserialize, Serialize};

use super::bidding::Contract;
use super::cards_types::{Rank, Suit, Trump};
use super::state::{Seat, Team, ROUND_TRICKS};
use super::tricks::CompletedTrick;
use crate::errors::domain::DomainError;

/// Dix-de-der: bonus for winning the last trick of a round.
pub const LAST_TRICK_BONUS: u16 = 10;
/// Belote/Rebelote: one seat playing both K and Q of trump.
pub const BELOTE_BONUS: u16 = 20;
/// Capot totals, before multipliers.
pub const CAPOT_DECLARER: u16 = 250;
pub const CAPOT_DEFENDER: u16 = 500;
/// Base awarded to defenders of a failed contract.
pub const FAILED_CONTRACT_BASE: u16 = 160;

/// Everything the scorer determined about a finished round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Raw card points per team, dix-de-der included, before bonuses and
    /// reassignments. Indexed by `Team::index`.
    pub card_points: [u16; 2],
    /// Final awarded scores per team after capot, fulfilment, multiplier,
    /// and rounding.
    pub awarded: [u32; 2],
    pub fulfilled: bool,
    pub capot: Option<Team>,
    /// Belote holders: seat and the trump suit the pair was played in.
    pub belote: Vec<(Seat, Suit)>,
    pub last_trick_winner: Team,
}

/// Round the awarded score to the nearest ten, halves up.
pub fn round_to_ten(x: u32) -> u32 {
    (x + 5) / 10 * 10
}

/// Suits in which a K/Q pair counts as Belote under the contract mode.
fn belote_suits(trump: Trump) -> &'static [Suit] {
    match trump {
        Trump::Clubs => &[Suit::Clubs],
        Trump::Diamonds => &[Suit::Diamonds],
        Trump::Hearts => &[Suit::Hearts],
        Trump::Spades => &[Suit::Spades],
        Trump::NoTrump => &[],
        Trump::AllTrump => &Suit::ALL,
    }
}

/// Find every (seat, suit) pair where one seat played both the king and
/// queen of a belote-eligible suit during the round.
fn detect_belote(tricks: &[CompletedTrick], trump: Trump) -> Vec<(Seat, Suit)> {
    let mut found = Vec::new();
    for &suit in belote_suits(trump) {
        let mut king: Option<Seat> = None;
        let mut queen: Option<Seat> = None;
        for trick in tricks {
            for &(seat, card) in &trick.plays {
                if card.suit != suit {
                    continue;
                }
                match card.rank {
                    Rank::King => king = Some(seat),
                    Rank::Queen => queen = Some(seat),
                    _ => {}
                }
            }
        }
        if let (Some(k), Some(q)) = (king, queen) {
            if k == q {
                found.push((k, suit));
            }
        }
    }
    found
}

/// Score a completed round of eight tricks.
///
/// Applies, in order: card totals per team, dix-de-der, belote, capot
/// reassignment, the fulfilment check, the coinche multiplier, and
/// rounding to the nearest ten. The caller adds the awarded values to the
/// cumulative scores.
pub fn score_round(contract: &Contract, tricks: &[CompletedTrick]) -> Result<RoundOutcome, DomainError> {
    if tricks.len() != ROUND_TRICKS {
        return Err(DomainError::invariant(format!(
            "scoring requires {ROUND_TRICKS} completed tricks, got {}",
            tricks.len()
        )));
    }

    let declarer = contract.declaring_team();
    let defenders = declarer.opponent();

    // 1. Card totals per team.
    let mut card_points = [0u16; 2];
    for trick in tricks {
        card_points[Team::of(trick.winner).index()] += trick.points;
    }
    let all_trick_points: u16 = tricks.iter().map(|t| t.points).sum();

    // 2. Dix-de-der.
    let last_trick_winner = Team::of(tricks[ROUND_TRICKS - 1].winner);
    card_points[last_trick_winner.index()] += LAST_TRICK_BONUS;

    // 3. Belote/Rebelote.
    let belote = detect_belote(tricks, contract.trump);
    let mut totals = card_points;
    for &(seat, _) in &belote {
        totals[Team::of(seat).index()] += BELOTE_BONUS;
    }

    // 4. Capot reassignment.
    let capot = {
        let winners: Vec<Team> = tricks.iter().map(|t| Team::of(t.winner)).collect();
        let first = winners[0];
        winners.iter().all(|&t| t == first).then_some(first)
    };
    if let Some(team) = capot {
        totals[team.index()] = if team == declarer {
            CAPOT_DECLARER
        } else {
            CAPOT_DEFENDER
        };
        totals[team.opponent().index()] = 0;
    }

    // 5. Fulfilment check. The comparison coefficient for no-trump and
    // all-trump contracts is 1 in ruleset coinche-v1.
    let fulfilled = u32::from(totals[declarer.index()]) >= u32::from(contract.value);
    if !fulfilled && capot != Some(defenders) {
        totals[declarer.index()] = 0;
        totals[defenders.index()] = FAILED_CONTRACT_BASE + all_trick_points + LAST_TRICK_BONUS;
    }

    // 6-7. Multiplier, then rounding.
    let multiplier = contract.multiplier();
    let awarded = [
        round_to_ten(u32::from(totals[0]) * multiplier),
        round_to_ten(u32::from(totals[1]) * multiplier),
    ];

    Ok(RoundOutcome {
        card_points,
        awarded,
        fulfilled,
        capot,
        belote,
        last_trick_winner,
    })
}

/// Game-over check: the higher cumulative score must reach the target and
/// strictly exceed the other team's. Equal scores continue play.
pub fn game_winner(cumulative: [u32; 2], target: u32) -> Option<Team> {
    let [a, b] = cumulative;
    if a >= target && a > b {
        Some(Team::A)
    } else if b >= target && b > a {
        Some(Team::B)
    } else {
        None
    }
}
