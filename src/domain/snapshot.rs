//! Public snapshot API for observing game state without exposing hands.
//!
//! The snapshot is built by projection: only public fields are ever
//! materialized, and hands are translated to counts. Nothing reachable
//! from a `GameSnapshot` references a seat's unplayed cards.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::bidding::{BiddingState, Contract};
use super::cards_types::{Card, Trump};
use super::state::{GameId, GameState, Phase, PlayerId, RoomId, Seat, SEATS};

/// Public view of the resolved contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractPublic {
    pub trump: Trump,
    pub value: u16,
    pub doubled: bool,
    pub redoubled: bool,
    pub declarer_seat: Seat,
}

impl From<&Contract> for ContractPublic {
    fn from(c: &Contract) -> Self {
        Self {
            trump: c.trump,
            value: c.value,
            doubled: c.doubled,
            redoubled: c.redoubled,
            declarer_seat: c.declarer,
        }
    }
}

/// Public view of the auction in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BiddingPublic {
    pub current_bid: Option<BidPublic>,
    pub doubled: bool,
    pub redoubled: bool,
    pub consecutive_passes: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BidPublic {
    pub seat: Seat,
    pub trump: Trump,
    pub value: u16,
}

impl From<&BiddingState> for BiddingPublic {
    fn from(b: &BiddingState) -> Self {
        Self {
            current_bid: b.current_bid.map(|bid| BidPublic {
                seat: bid.seat,
                trump: bid.trump,
                value: bid.value,
            }),
            doubled: b.doubled,
            redoubled: b.redoubled,
            consecutive_passes: b.consecutive_passes,
        }
    }
}

/// Publicly visible card containers: everything on the table, counts for
/// everything hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicContainers {
    pub draw_pile_count: u8,
    pub current_trick: Vec<(Seat, Card)>,
    pub trick_history_count: u8,
    pub hand_counts: [u8; SEATS],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamScore {
    pub team_a: u32,
    pub team_b: u32,
}

/// The public game state snapshot handed to any observer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub status: Phase,
    pub round_no: u32,
    pub dealer: Seat,
    pub turn_seat: Option<Seat>,
    pub turn_id: Option<PlayerId>,
    pub turn_order: [PlayerId; SEATS],
    pub state_version: u64,
    pub cumulative_score: TeamScore,
    pub contract: Option<ContractPublic>,
    pub bidding: Option<BiddingPublic>,
    pub public_containers: PublicContainers,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_at: OffsetDateTime,
}

/// Produce the public snapshot of the current game state.
pub fn snapshot(state: &GameState) -> GameSnapshot {
    let mut hand_counts = [0u8; SEATS];
    let mut turn_order = [0 as PlayerId; SEATS];
    for seat in 0..SEATS {
        hand_counts[seat] = state.hands[seat].len() as u8;
        turn_order[seat] = state.seats[seat].player;
    }

    GameSnapshot {
        game_id: state.game_id,
        room_id: state.room_id,
        status: state.phase,
        round_no: state.round_no,
        dealer: state.dealer,
        turn_seat: state.turn,
        turn_id: state.turn_player(),
        turn_order,
        state_version: state.state_version,
        cumulative_score: TeamScore {
            team_a: state.cumulative[0],
            team_b: state.cumulative[1],
        },
        contract: state.contract.as_ref().map(ContractPublic::from),
        bidding: state.bidding.as_ref().map(BiddingPublic::from),
        public_containers: PublicContainers {
            // All 32 cards are dealt at round start; no stock remains.
            draw_pile_count: 0,
            current_trick: state.current_trick.clone(),
            trick_history_count: state.completed_tricks.len() as u8,
            hand_counts,
        },
        last_updated_at: state.last_updated_at,
    }
}

/// A seat's private hand, accessible only to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivateHand {
    pub player: PlayerId,
    pub seat: Seat,
    pub game_id: GameId,
    pub cards: Vec<Card>,
    pub hand_version: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated_at: OffsetDateTime,
}

/// Project the private hand view for one seat.
pub fn private_hand(state: &GameState, seat: Seat) -> PrivateHand {
    let hand = &state.hands[seat as usize];
    PrivateHand {
        player: state.seats[seat as usize].player,
        seat,
        game_id: state.game_id,
        cards: hand.cards().to_vec(),
        hand_version: hand.version(),
        last_updated_at: state.last_updated_at,
    }
}
