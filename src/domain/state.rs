//! The Game aggregate and seat/turn math.
//!
//! Seat math lives here so every layer (services, views, the bot driver)
//! shares a single source of truth for rotation and "who acts next".

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::bidding::{BiddingState, Contract};
use super::cards_types::Card;
use super::dealing;
use super::tricks::CompletedTrick;
use crate::errors::domain::DomainError;

pub type PlayerId = i64;
pub type GameId = i64;
pub type RoomId = i64;
pub type Seat = u8; // 0..=3

pub const SEATS: usize = 4;
pub const ROUND_TRICKS: usize = 8;
pub const HAND_SIZE: usize = 8;

/// Returns the seat `delta` steps clockwise (positive) from `seat`.
#[inline]
pub fn seat_offset(seat: Seat, delta: i8) -> Seat {
    ((seat as i16 + delta as i16).rem_euclid(SEATS as i16)) as Seat
}

/// Returns the next seat clockwise (0 → 1 → 2 → 3 → 0).
#[inline]
pub fn next_seat(seat: Seat) -> Seat {
    seat_offset(seat, 1)
}

/// The partner sits two seats away.
#[inline]
pub fn partner_of(seat: Seat) -> Seat {
    seat_offset(seat, 2)
}

/// Round-start seat (player to the left of the dealer).
#[inline]
pub fn first_leader(dealer: Seat) -> Seat {
    next_seat(dealer)
}

/// Fixed two-team partnership: even seats are team A, odd seats team B.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    A,
    B,
}

impl Team {
    #[inline]
    pub fn of(seat: Seat) -> Team {
        if seat % 2 == 0 {
            Team::A
        } else {
            Team::B
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Team::A => 0,
            Team::B => 1,
        }
    }

    #[inline]
    pub const fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }
}

/// Overall game progression phases.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Between rounds; no round in flight.
    Init,
    /// Players place bids in fixed turn order.
    Bidding,
    /// Trick play under a resolved contract.
    Playing,
    /// Round scoring in progress.
    Scoring,
    /// Terminal: target reached, cancelled, or aborted.
    Completed,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    Human,
    Bot,
}

/// Who occupies a seat for the duration of a game.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SeatAssignment {
    pub player: PlayerId,
    pub kind: PlayerKind,
}

impl SeatAssignment {
    pub fn is_bot(&self) -> bool {
        self.kind == PlayerKind::Bot
    }
}

/// A seat's private cards plus the per-seat change counter.
#[derive(Debug, Clone, Default)]
pub struct Hand {
    cards: Vec<Card>,
    version: u64,
}

impl Hand {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: Card) -> bool {
        self.cards.contains(&card)
    }

    /// Replace the hand contents for a fresh deal.
    pub fn deal(&mut self, mut cards: Vec<Card>) {
        cards.sort();
        self.cards = cards;
        self.version += 1;
    }

    /// Remove a card; returns false when the card is absent.
    pub fn remove(&mut self, card: Card) -> bool {
        match self.cards.iter().position(|&c| c == card) {
            Some(pos) => {
                self.cards.remove(pos);
                self.version += 1;
                true
            }
            None => false,
        }
    }
}

/// Why a game reached the terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    TargetReached { winner: Team },
    Cancelled { by: PlayerId, reason: String },
    Aborted { detail: String },
}

/// Entire game aggregate, sufficient for all domain operations.
///
/// The services layer serializes every mutation of a `GameState` behind a
/// per-game token; nothing here is shared or locked.
#[derive(Debug, Clone)]
pub struct GameState {
    pub game_id: GameId,
    pub room_id: RoomId,
    /// Host retained for admin-scoped operations (cancel, invalidate).
    pub host: PlayerId,
    pub seats: [SeatAssignment; SEATS],
    pub hands: [Hand; SEATS],
    /// Present only while phase is Bidding.
    pub bidding: Option<BiddingState>,
    /// Present once bidding resolves, until the round is torn down.
    pub contract: Option<Contract>,
    pub current_trick: Vec<(Seat, Card)>,
    pub completed_tricks: Vec<CompletedTrick>,
    /// 1-based; 0 before the first deal.
    pub round_no: u32,
    pub dealer: Seat,
    /// Deals attempted (including redeals); feeds seed derivation.
    pub deals_dealt: u32,
    pub rng_seed: u64,
    pub cumulative: [u32; 2],
    /// Seat expected to act; None when nobody can act.
    pub turn: Option<Seat>,
    pub phase: Phase,
    pub state_version: u64,
    pub target_score: u32,
    pub end: Option<EndReason>,
    pub last_updated_at: OffsetDateTime,
}

impl GameState {
    pub fn new(
        game_id: GameId,
        room_id: RoomId,
        host: PlayerId,
        seats: [SeatAssignment; SEATS],
        rng_seed: u64,
        target_score: u32,
        first_dealer: Seat,
        now: OffsetDateTime,
    ) -> Self {
        Self {
            game_id,
            room_id,
            host,
            seats,
            hands: Default::default(),
            bidding: None,
            contract: None,
            current_trick: Vec::with_capacity(SEATS),
            completed_tricks: Vec::with_capacity(ROUND_TRICKS),
            round_no: 0,
            dealer: first_dealer,
            deals_dealt: 0,
            rng_seed,
            cumulative: [0, 0],
            turn: None,
            phase: Phase::Init,
            state_version: 0,
            target_score,
            end: None,
            last_updated_at: now,
        }
    }

    /// Bump the authoritative version. Called exactly once per committed
    /// transition by the state machine.
    pub fn bump_version(&mut self, now: OffsetDateTime) -> u64 {
        self.state_version += 1;
        self.last_updated_at = now;
        self.state_version
    }

    /// Resolve a caller identity to their seat.
    pub fn seat_of(&self, player: PlayerId) -> Option<Seat> {
        self.seats
            .iter()
            .position(|s| s.player == player)
            .map(|i| i as Seat)
    }

    pub fn seat_assignment(&self, seat: Seat) -> &SeatAssignment {
        &self.seats[seat as usize]
    }

    pub fn turn_player(&self) -> Option<PlayerId> {
        self.turn.map(|s| self.seats[s as usize].player)
    }

    pub fn is_completed(&self) -> bool {
        self.phase == Phase::Completed
    }

    /// Card conservation: hands, the current trick, and completed tricks
    /// must partition the 32-card deck mid-round. Checked after every
    /// mutation in debug builds and by the consistency tests.
    pub fn check_card_conservation(&self) -> Result<(), DomainError> {
        if self.round_no == 0 || !matches!(self.phase, Phase::Bidding | Phase::Playing) {
            return Ok(());
        }
        let mut seen: HashSet<Card> = HashSet::with_capacity(32);
        let mut total = 0usize;
        let mut insert = |card: Card| -> Result<(), DomainError> {
            total += 1;
            if !seen.insert(card) {
                return Err(DomainError::invariant(format!("duplicate card {card:?}")));
            }
            Ok(())
        };
        for hand in &self.hands {
            for &card in hand.cards() {
                insert(card)?;
            }
        }
        for &(_, card) in &self.current_trick {
            insert(card)?;
        }
        for trick in &self.completed_tricks {
            for &(_, card) in &trick.plays {
                insert(card)?;
            }
        }
        if total != dealing::DECK_SIZE {
            return Err(DomainError::invariant(format!(
                "card count {total} != {}",
                dealing::DECK_SIZE
            )));
        }
        Ok(())
    }
}
