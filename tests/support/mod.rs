//! Shared fixtures for the service-level integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use coinche_core::domain::cards_parsing::try_parse_cards;
use coinche_core::domain::cards_types::Card;
use coinche_core::domain::state::{GameId, PlayerId, RoomId, Seat};
use coinche_core::events::EventHub;
use coinche_core::services::game_flow::{ActionRequest, GameConfig, GameFlowService};
use coinche_core::services::rooms::{CreateRoom, RoomService};

pub const PLAYERS: [PlayerId; 4] = [100, 101, 102, 103];

pub fn service_stack() -> (Arc<GameFlowService>, Arc<RoomService>) {
    let hub = Arc::new(EventHub::new());
    let game_flow = Arc::new(GameFlowService::new(hub));
    let rooms = Arc::new(RoomService::new(game_flow.clone()));
    (game_flow, rooms)
}

/// A config with no bot thinking delay, a fixed seed, and the dealer at
/// seat 3 so seat 0 opens the auction.
pub fn test_config() -> GameConfig {
    GameConfig {
        rng_seed: Some(0xC0FFEE),
        bot_delay_ms: (0, 0),
        first_dealer: 3,
        ..GameConfig::default()
    }
}

/// Create a room with the four fixture humans, ready them all, and start
/// the game with the given config.
pub async fn start_game(
    rooms: &RoomService,
    config: GameConfig,
) -> Result<(RoomId, GameId), coinche_core::AppError> {
    let info = rooms.create(PLAYERS[0], CreateRoom::default());
    let room_id = info.room_id;
    for (idx, player) in PLAYERS.iter().enumerate().skip(1) {
        rooms.join(room_id, *player, Some(idx as Seat), false).await?;
    }
    for player in PLAYERS {
        rooms.toggle_ready(room_id, player).await?;
    }
    let game_id = rooms
        .start_with_config(room_id, PLAYERS[0], Some(config))
        .await?;
    Ok((room_id, game_id))
}

/// Unique action request for test submissions.
pub fn request(tag: &str) -> ActionRequest {
    ActionRequest::new(format!("test:{tag}"))
}

/// Build a deck that the 3-2-3 deal reassembles into the given per-seat
/// hands. Inverse of the dealing pattern for the given dealer.
pub fn deck_for_hands(hands: [[&str; 8]; 4], dealer: Seat) -> Vec<Card> {
    let parsed: Vec<Vec<Card>> = hands
        .iter()
        .map(|h| try_parse_cards(h.iter().copied()).unwrap())
        .collect();
    let mut deck = Vec::with_capacity(32);
    let mut cursors = [0usize; 4];
    for packet in [3usize, 2, 3] {
        for offset in 0..4u8 {
            let seat = ((dealer + 1 + offset) % 4) as usize;
            let start = cursors[seat];
            deck.extend_from_slice(&parsed[seat][start..start + packet]);
            cursors[seat] += packet;
        }
    }
    deck
}

/// Poll until the game reports completed, or panic after the deadline.
pub async fn wait_for_completion(game_flow: &GameFlowService, game_id: GameId, deadline: Duration) {
    let started = std::time::Instant::now();
    loop {
        if game_flow.is_game_completed(game_id) == Some(true) {
            return;
        }
        if started.elapsed() > deadline {
            panic!("game {game_id} did not complete within {deadline:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
