//! Domain layer: pure game logic types and helpers.
//!
//! Nothing in this module performs I/O, reads clocks, or touches shared
//! state; the services layer owns all of that. Keeping the kernel pure is
//! what makes the legality and scoring laws property-testable.

pub mod bidding;
pub mod cards_logic;
pub mod cards_parsing;
pub mod cards_serde;
pub mod cards_types;
pub mod dealing;
pub mod scoring;
pub mod snapshot;
pub mod state;
pub mod tricks;

#[cfg(test)]
mod test_gens;
#[cfg(test)]
mod tests_bidding;
#[cfg(test)]
mod tests_props_legality;
#[cfg(test)]
mod tests_props_scoring;
#[cfg(test)]
mod tests_scoring;
#[cfg(test)]
mod tests_tricks;

// Re-exports for ergonomics
pub use cards_logic::{card_beats, card_points, hand_has_suit, trick_points, trick_winner};
pub use cards_types::{Card, Rank, Suit, Trump};
pub use dealing::{deal_hands, derive_dealing_seed, fresh_deck, shuffled_deck};
pub use state::{GameId, GameState, Phase, PlayerId, RoomId, Seat, Team};
