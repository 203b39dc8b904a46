//! Error codes for the Coinche core API.
//!
//! This module defines all error codes used throughout the crate.
//! Add new codes here; never pass ad-hoc strings as error codes.
//!
//! All error codes are SCREAMING_SNAKE_CASE and map 1:1 to the strings
//! the transport layer puts on the wire.

use core::fmt;

/// Centralized error codes for the Coinche core.
///
/// Each variant maps to a canonical SCREAMING_SNAKE_CASE string. The five
/// caller-facing kinds (invalid payload, unauthorized/forbidden, not found,
/// version conflict, illegal move) each own a group of codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Caller identity
    /// Caller identity unknown
    Unauthorized,
    /// Caller lacks the required role (host, player-on-turn, admin)
    Forbidden,
    /// Caller is not seated in the game
    NotASeatHolder,

    // Payload validation
    /// Unparseable card token
    ParseCard,
    /// Malformed contract descriptor
    InvalidContract,
    /// General malformed payload
    InvalidPayload,

    // Resource lookup
    /// Room not found
    RoomNotFound,
    /// Game not found
    GameNotFound,
    /// Seat not found or empty
    SeatNotFound,
    /// Move not found
    MoveNotFound,

    // Optimistic concurrency
    /// Caller's expected state version does not match the game's
    VersionConflict,

    // Rules engine rejections
    /// Bid does not dominate the standing bid
    InvalidBid,
    /// Bidding already closed by a double or redouble
    BiddingClosed,
    /// Coinche/surcoinche preconditions not met
    InvalidDouble,
    /// Must follow the led suit
    MustFollowSuit,
    /// Must play a higher trump
    MustOvertrump,
    /// Must play a trump card
    MustTrump,
    /// Card not in the caller's hand
    CardNotInHand,
    /// Not the caller's turn
    OutOfTurn,
    /// Operation not valid in the current phase
    PhaseMismatch,

    // Room lifecycle conflicts
    /// Seat already taken
    SeatTaken,
    /// Room is locked
    RoomLocked,
    /// Start preconditions not met
    RoomNotReady,

    // System
    /// Internal invariant violation; the game has been aborted
    InternalError,
}

impl ErrorCode {
    /// Canonical SCREAMING_SNAKE_CASE string for this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotASeatHolder => "NOT_A_SEAT_HOLDER",
            ErrorCode::ParseCard => "PARSE_CARD",
            ErrorCode::InvalidContract => "INVALID_CONTRACT",
            ErrorCode::InvalidPayload => "INVALID_PAYLOAD",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::GameNotFound => "GAME_NOT_FOUND",
            ErrorCode::SeatNotFound => "SEAT_NOT_FOUND",
            ErrorCode::MoveNotFound => "MOVE_NOT_FOUND",
            ErrorCode::VersionConflict => "VERSION_CONFLICT",
            ErrorCode::InvalidBid => "INVALID_BID",
            ErrorCode::BiddingClosed => "BIDDING_CLOSED",
            ErrorCode::InvalidDouble => "INVALID_DOUBLE",
            ErrorCode::MustFollowSuit => "MUST_FOLLOW_SUIT",
            ErrorCode::MustOvertrump => "MUST_OVERTRUMP",
            ErrorCode::MustTrump => "MUST_TRUMP",
            ErrorCode::CardNotInHand => "CARD_NOT_IN_HAND",
            ErrorCode::OutOfTurn => "OUT_OF_TURN",
            ErrorCode::PhaseMismatch => "PHASE_MISMATCH",
            ErrorCode::SeatTaken => "SEAT_TAKEN",
            ErrorCode::RoomLocked => "ROOM_LOCKED",
            ErrorCode::RoomNotReady => "ROOM_NOT_READY",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
