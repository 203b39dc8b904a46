//! Authoritative server core for the Coinche (Belote-Coinchée) card game.
//!
//! The crate owns every mutation of room and game state: it enforces the
//! rules of bidding and trick play, redacts hidden information, drives
//! bot-controlled seats, and fans out versioned events to subscribers.
//! Transport framing (HTTP/WebSocket), identity exchange, and persistence
//! are external concerns; they consume the services exposed here.

pub mod ai;
pub mod domain;
pub mod error;
pub mod errors;
pub mod events;
pub mod services;

pub use error::AppError;
pub use errors::domain::{DomainError, RuleViolation};
pub use services::game_flow::{ActionRequest, GameConfig, GameFlowService, MoveResult};
pub use services::rooms::RoomService;
