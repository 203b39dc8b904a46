//! Domain-level error type used across the rules kernel and services.
//!
//! This error type is transport-agnostic. Service entry points return
//! `Result<T, crate::error::AppError>` and convert from `DomainError`
//! using the provided `From<DomainError> for AppError` implementation.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::domain::cards_types::Suit;
use crate::domain::state::Seat;
use crate::errors::ErrorCode;

/// A single rule the rules kernel found violated by an action.
///
/// Violations are collected into `DomainError::IllegalMove` so the caller
/// sees every reason an action was rejected, not just the first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleViolation {
    /// Player must play a card of the led suit.
    MustFollowSuit(Suit),
    /// Player holds a trump able to beat the trick and must play it.
    MustOvertrump,
    /// Player is void in the led suit and must play a trump.
    MustTrump,
    /// The card is not in the player's hand.
    CardNotInHand,
    /// First bid must reach the minimum contract value.
    BidBelowMinimum { minimum: u16 },
    /// A follow-on bid must strictly dominate the standing bid.
    BidDoesNotDominate,
    /// Bidding was closed by a double or redouble.
    BiddingClosed,
    /// No live bid to double, the bid is already doubled, or the caller's
    /// team declared it.
    CannotDouble,
    /// The bid is not doubled, is already redoubled, or the caller is not
    /// on the declaring team.
    CannotRedouble,
}

impl RuleViolation {
    pub fn code(&self) -> ErrorCode {
        match self {
            RuleViolation::MustFollowSuit(_) => ErrorCode::MustFollowSuit,
            RuleViolation::MustOvertrump => ErrorCode::MustOvertrump,
            RuleViolation::MustTrump => ErrorCode::MustTrump,
            RuleViolation::CardNotInHand => ErrorCode::CardNotInHand,
            RuleViolation::BidBelowMinimum { .. } => ErrorCode::InvalidBid,
            RuleViolation::BidDoesNotDominate => ErrorCode::InvalidBid,
            RuleViolation::BiddingClosed => ErrorCode::BiddingClosed,
            RuleViolation::CannotDouble => ErrorCode::InvalidDouble,
            RuleViolation::CannotRedouble => ErrorCode::InvalidDouble,
        }
    }
}

impl Display for RuleViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RuleViolation::MustFollowSuit(suit) => write!(f, "must follow {suit}"),
            RuleViolation::MustOvertrump => write!(f, "must overtrump"),
            RuleViolation::MustTrump => write!(f, "must play a trump"),
            RuleViolation::CardNotInHand => write!(f, "card not in hand"),
            RuleViolation::BidBelowMinimum { minimum } => {
                write!(f, "first bid must be at least {minimum}")
            }
            RuleViolation::BidDoesNotDominate => {
                write!(f, "bid must exceed the standing bid in value or priority")
            }
            RuleViolation::BiddingClosed => write!(f, "bidding is closed"),
            RuleViolation::CannotDouble => write!(f, "coinche not available"),
            RuleViolation::CannotRedouble => write!(f, "surcoinche not available"),
        }
    }
}

/// Central domain error type.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Caller-supplied data is malformed (unparseable card, bad contract).
    InvalidPayload(ErrorCode, String),
    /// The action is valid in shape but rejected by the rules kernel.
    IllegalMove(Vec<RuleViolation>),
    /// The action arrived out of turn.
    OutOfTurn { expected: Seat },
    /// The operation is not valid in the current phase.
    PhaseMismatch { detail: String },
    /// Internal invariant violated; fatal for the affected game.
    Invariant(String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::InvalidPayload(code, d) => write!(f, "invalid payload {code}: {d}"),
            DomainError::IllegalMove(violations) => {
                write!(f, "illegal move:")?;
                for v in violations {
                    write!(f, " [{v}]")?;
                }
                Ok(())
            }
            DomainError::OutOfTurn { expected } => {
                write!(f, "out of turn: seat {expected} is expected to act")
            }
            DomainError::PhaseMismatch { detail } => write!(f, "phase mismatch: {detail}"),
            DomainError::Invariant(d) => write!(f, "invariant violated: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn invalid_payload(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::InvalidPayload(code, detail.into())
    }

    pub fn illegal(violation: RuleViolation) -> Self {
        Self::IllegalMove(vec![violation])
    }

    pub fn phase_mismatch(detail: impl Into<String>) -> Self {
        Self::PhaseMismatch {
            detail: detail.into(),
        }
    }

    pub fn invariant(detail: impl Into<String>) -> Self {
        Self::Invariant(detail.into())
    }
}
