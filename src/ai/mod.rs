//! Bot players for bot-owned seats.

mod heuristic;
mod trait_def;

pub use heuristic::HeuristicBot;
pub use trait_def::{BotAction, BotError, BotPlayer, BotView};

/// Construct a bot by registry name. Unknown names yield None.
pub fn create_bot(name: &str, seed: Option<u64>) -> Option<Box<dyn BotPlayer>> {
    match name {
        HeuristicBot::NAME => Some(Box::new(HeuristicBot::new(seed))),
        _ => None,
    }
}
