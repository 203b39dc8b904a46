//! Bot player trait definition.
//!
//! Bots receive only what a human in the same seat could see: their own
//! hand plus the public table state. The coordinator revalidates every
//! returned action inside the game's serialization token, so a buggy bot
//! can never corrupt a game.

use std::fmt;

use crate::domain::bidding::{Bid, Contract};
use crate::domain::cards_types::{Card, Trump};
use crate::domain::state::{Phase, Seat};

/// Errors that can occur during bot decision-making.
#[derive(Debug)]
pub enum BotError {
    /// Bot produced no decision (empty legal set, poisoned RNG).
    Internal(String),
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::Internal(msg) => write!(f, "bot internal error: {msg}"),
        }
    }
}

impl std::error::Error for BotError {}

/// Everything a bot may look at when deciding.
#[derive(Debug, Clone)]
pub struct BotView {
    pub seat: Seat,
    pub phase: Phase,
    pub hand: Vec<Card>,
    pub current_bid: Option<Bid>,
    pub contract: Option<Contract>,
    pub current_trick: Vec<(Seat, Card)>,
    /// Cards the bot may legally play right now (empty outside trick play).
    pub legal_plays: Vec<Card>,
}

/// What a bot decided to do on its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Pass,
    Bid { trump: Trump, value: u16 },
    Play(Card),
}

/// Trait for bot players.
///
/// Implementations must be `Send + Sync`; the scheduler may invoke them
/// from any worker thread. Use interior mutability for RNG state. Never
/// panic; return `BotError` instead.
pub trait BotPlayer: Send + Sync {
    /// Decide a bidding-phase action. Bots never coinche or surcoinche.
    fn choose_bid_action(&self, view: &BotView) -> Result<BotAction, BotError>;

    /// Decide which card to play. Must pick from `view.legal_plays`.
    fn choose_play(&self, view: &BotView) -> Result<Card, BotError>;
}
