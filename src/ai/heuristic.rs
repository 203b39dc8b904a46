//! Default bot policy: conservative bidder, greedy card player.

use std::sync::Mutex;

use rand::prelude::*;

use super::trait_def::{BotAction, BotError, BotPlayer, BotView};
use crate::domain::bidding::MIN_BID;
use crate::domain::cards_logic::{plain_strength, trump_strength};
use crate::domain::cards_types::{Card, Rank, Suit, Trump};
use crate::domain::state::partner_of;
use crate::domain::tricks::current_winner;

/// Probability of opening the auction with a strong hand.
const OPEN_PROBABILITY: f64 = 0.2;
/// High cards counted toward the opening threshold.
const OPEN_THRESHOLD: usize = 4;

/// The stock bot: passes unless its hand is strong, then opens at the
/// minimum on a random suit; plays greedily, dumping low cards when its
/// partner already holds the trick.
pub struct HeuristicBot {
    rng: Mutex<StdRng>,
}

impl HeuristicBot {
    pub const NAME: &'static str = "HeuristicBot";

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }

    fn lock_rng(&self) -> Result<std::sync::MutexGuard<'_, StdRng>, BotError> {
        self.rng
            .lock()
            .map_err(|e| BotError::Internal(format!("rng lock poisoned: {e}")))
    }
}

fn is_high(rank: Rank) -> bool {
    matches!(rank, Rank::Ace | Rank::Ten | Rank::King | Rank::Jack)
}

/// Contract-aware strength for greedy comparisons. Trumps dominate.
fn strength(card: Card, trump: Option<Trump>) -> u8 {
    match trump {
        Some(Trump::AllTrump) => trump_strength(card.rank),
        Some(t) if t.suit() == Some(card.suit) => trump_strength(card.rank) + 8,
        _ => plain_strength(card.rank),
    }
}

fn highest(cards: &[Card], trump: Option<Trump>) -> Option<Card> {
    cards.iter().copied().max_by_key(|&c| strength(c, trump))
}

fn lowest(cards: &[Card], trump: Option<Trump>) -> Option<Card> {
    cards.iter().copied().min_by_key(|&c| strength(c, trump))
}

impl BotPlayer for HeuristicBot {
    fn choose_bid_action(&self, view: &BotView) -> Result<BotAction, BotError> {
        if view.current_bid.is_some() {
            return Ok(BotAction::Pass);
        }
        let high_cards = view.hand.iter().filter(|c| is_high(c.rank)).count();
        if high_cards < OPEN_THRESHOLD {
            return Ok(BotAction::Pass);
        }
        let mut rng = self.lock_rng()?;
        if !rng.gen_bool(OPEN_PROBABILITY) {
            return Ok(BotAction::Pass);
        }
        let suit = *Suit::ALL
            .choose(&mut *rng)
            .ok_or_else(|| BotError::Internal("empty suit set".into()))?;
        Ok(BotAction::Bid {
            trump: Trump::from(suit),
            value: MIN_BID,
        })
    }

    fn choose_play(&self, view: &BotView) -> Result<Card, BotError> {
        let legal = &view.legal_plays;
        if legal.is_empty() {
            return Err(BotError::Internal("no legal plays available".into()));
        }
        let trump = view.contract.map(|c| c.trump);

        if view.current_trick.is_empty() {
            // Leading: strongest suit first, then the top card in it.
            let best_suit = Suit::ALL
                .iter()
                .copied()
                .max_by_key(|&s| {
                    legal
                        .iter()
                        .filter(|c| c.suit == s)
                        .map(|&c| strength(c, trump) as u32 + 1)
                        .sum::<u32>()
                })
                .unwrap_or(Suit::Clubs);
            let in_suit: Vec<Card> = legal.iter().copied().filter(|c| c.suit == best_suit).collect();
            let pool = if in_suit.is_empty() { legal.clone() } else { in_suit };
            return highest(&pool, trump)
                .ok_or_else(|| BotError::Internal("failed to choose a lead".into()));
        }

        let partner_winning = matches!(
            current_winner(&view.current_trick, trump.unwrap_or(Trump::NoTrump)),
            Some((winner, _)) if winner == partner_of(view.seat)
        );
        let choice = if partner_winning {
            lowest(legal, trump)
        } else {
            highest(legal, trump)
        };
        choice.ok_or_else(|| BotError::Internal("failed to choose a card".into()))
    }
}
