//! Bids, contracts, and the bidding-phase rules.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::cards_types::Trump;
use super::state::{Seat, Team};
use crate::errors::domain::{DomainError, RuleViolation};

/// The lowest value a contract may name.
pub const MIN_BID: u16 = 80;

/// A placed bid: who, what mode, how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bid {
    pub seat: Seat,
    pub trump: Trump,
    pub value: u16,
    pub placed_at: OffsetDateTime,
}

impl Bid {
    /// Strict domination: higher value, or equal value with higher
    /// contract priority.
    pub fn dominates(&self, prior: &Bid) -> bool {
        self.value > prior.value
            || (self.value == prior.value && self.trump.priority() > prior.trump.priority())
    }
}

/// The resolved commitment of the declaring team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub trump: Trump,
    pub value: u16,
    pub doubled: bool,
    pub redoubled: bool,
    pub declarer: Seat,
}

impl Contract {
    pub fn declaring_team(&self) -> Team {
        Team::of(self.declarer)
    }

    /// Stake multiplier: x2 for coinche, x4 for surcoinche.
    pub fn multiplier(&self) -> u32 {
        if self.redoubled {
            4
        } else if self.doubled {
            2
        } else {
            1
        }
    }
}

/// One entry in the auction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BidEntry {
    Bid(Bid),
    Pass { seat: Seat },
    Coinche { seat: Seat },
    Surcoinche { seat: Seat },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiddingPhase {
    Active,
    Ended,
    Redeal,
}

/// Auction state, present on the aggregate only during the bidding phase.
#[derive(Debug, Clone)]
pub struct BiddingState {
    pub current_bid: Option<Bid>,
    pub doubled: bool,
    pub doubled_by: Option<Seat>,
    pub redoubled: bool,
    pub consecutive_passes: u8,
    pub bid_log: Vec<BidEntry>,
    pub phase: BiddingPhase,
    pub winning_bid: Option<Bid>,
}

impl BiddingState {
    pub fn fresh() -> Self {
        Self {
            current_bid: None,
            doubled: false,
            doubled_by: None,
            redoubled: false,
            consecutive_passes: 0,
            bid_log: Vec::new(),
            phase: BiddingPhase::Active,
            winning_bid: None,
        }
    }

    /// Validate a bid against the auction so far.
    pub fn check_bid(&self, trump: Trump, value: u16) -> Result<(), DomainError> {
        if self.doubled || self.redoubled {
            return Err(DomainError::illegal(RuleViolation::BiddingClosed));
        }
        match &self.current_bid {
            None => {
                if value < MIN_BID {
                    return Err(DomainError::illegal(RuleViolation::BidBelowMinimum {
                        minimum: MIN_BID,
                    }));
                }
            }
            Some(prior) => {
                if value < MIN_BID {
                    return Err(DomainError::illegal(RuleViolation::BidBelowMinimum {
                        minimum: MIN_BID,
                    }));
                }
                let dominates = value > prior.value
                    || (value == prior.value && trump.priority() > prior.trump.priority());
                if !dominates {
                    return Err(DomainError::illegal(RuleViolation::BidDoesNotDominate));
                }
            }
        }
        Ok(())
    }

    /// A coinche requires a live bid, not already doubled, from the
    /// opposing team.
    pub fn check_coinche(&self, caller: Seat) -> Result<(), DomainError> {
        let Some(bid) = &self.current_bid else {
            return Err(DomainError::illegal(RuleViolation::CannotDouble));
        };
        if self.doubled || Team::of(caller) == Team::of(bid.seat) {
            return Err(DomainError::illegal(RuleViolation::CannotDouble));
        }
        Ok(())
    }

    /// A surcoinche requires a doubled, not-yet-redoubled bid, from the
    /// declaring team itself.
    pub fn check_surcoinche(&self, caller: Seat) -> Result<(), DomainError> {
        let Some(bid) = &self.current_bid else {
            return Err(DomainError::illegal(RuleViolation::CannotRedouble));
        };
        if !self.doubled || self.redoubled || Team::of(caller) != Team::of(bid.seat) {
            return Err(DomainError::illegal(RuleViolation::CannotRedouble));
        }
        Ok(())
    }

    /// Record an accepted bid.
    pub fn place(&mut self, bid: Bid) {
        self.current_bid = Some(bid);
        self.consecutive_passes = 0;
        self.bid_log.push(BidEntry::Bid(bid));
    }

    /// Record a pass; returns the updated consecutive-pass count.
    pub fn pass(&mut self, seat: Seat) -> u8 {
        self.consecutive_passes += 1;
        self.bid_log.push(BidEntry::Pass { seat });
        self.consecutive_passes
    }

    /// Freeze the standing bid as the auction winner.
    pub fn close(&mut self) {
        self.winning_bid = self.current_bid;
        self.phase = BiddingPhase::Ended;
    }

    /// Build the contract from the frozen winning bid.
    pub fn winning_contract(&self) -> Option<Contract> {
        self.winning_bid.map(|bid| Contract {
            trump: bid.trump,
            value: bid.value,
            doubled: self.doubled,
            redoubled: self.redoubled,
            declarer: bid.seat,
        })
    }
}
