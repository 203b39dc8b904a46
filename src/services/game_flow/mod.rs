//! Game flow service: the sole writer to every game aggregate.
//!
//! Each game lives behind its own serialization token (a `tokio::sync::Mutex`
//! around the aggregate plus its event log and idempotency index). Mutations
//! across different games never contend; mutations within one game are
//! strictly ordered, and the event log order equals the version order.

mod ai_coordinator;
mod mutation;
mod player_actions;
mod round_lifecycle;

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::cards_types::Card;
use crate::domain::snapshot::{self, GameSnapshot, PrivateHand};
use crate::domain::state::{
    GameId, GameState, PlayerId, PlayerKind, RoomId, Seat, SeatAssignment, SEATS,
};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::events::{Channel, Event, EventHub, EventLog, EventType, Scope};

/// Per-game configuration fixed at creation.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Entropy root; all shuffles derive from it. None draws from the OS.
    pub rng_seed: Option<u64>,
    /// Cumulative score a team must reach (and strictly exceed the
    /// opponent) to win.
    pub target_score: u32,
    pub first_dealer: Seat,
    /// Bot thinking delay bounds in milliseconds.
    pub bot_delay_ms: (u64, u64),
    /// Optional per-turn deadline; expiry forfeits the turn through the
    /// bot policy on the absent player's behalf.
    pub turn_timeout: Option<Duration>,
    /// Predetermined decks consumed by the next deals, in order. Used by
    /// fixtures and tournament replays; empty for normal play.
    pub deck_plan: Vec<Vec<Card>>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            target_score: 1000,
            first_dealer: 0,
            bot_delay_ms: (1000, 2000),
            turn_timeout: None,
            deck_plan: Vec::new(),
        }
    }
}

/// Caller-supplied envelope accompanying every player action.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    /// Idempotency key; resubmitting it returns the original result.
    pub client_action_id: String,
    /// When set, the action is rejected unless it matches the game's
    /// current state version.
    pub expected_version: Option<u64>,
}

impl ActionRequest {
    pub fn new(client_action_id: impl Into<String>) -> Self {
        Self {
            client_action_id: client_action_id.into(),
            expected_version: None,
        }
    }

    pub fn at_version(client_action_id: impl Into<String>, expected_version: u64) -> Self {
        Self {
            client_action_id: client_action_id.into(),
            expected_version: Some(expected_version),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveStatus {
    Accepted,
    /// Reserved for transports that surface rejections as results; the
    /// core reports rejections as typed errors instead.
    Rejected,
}

/// Returned from every successful player action.
#[derive(Debug, Clone, Serialize)]
pub struct MoveResult {
    pub move_id: Uuid,
    pub client_action_id: String,
    pub status: MoveStatus,
    /// Player expected to act after this mutation settled.
    pub turn_id: Option<PlayerId>,
    pub state_version: u64,
    /// Event types emitted by this mutation, in order.
    pub effects: Vec<EventType>,
    pub system_generated: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
}

/// Who acts next, with the version the answer was read at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TurnInfo {
    pub seat: Option<Seat>,
    pub player: Option<PlayerId>,
    pub phase: crate::domain::state::Phase,
    pub state_version: u64,
}

pub(crate) struct GameInner {
    pub(crate) state: GameState,
    pub(crate) log: EventLog,
    pub(crate) idempotency: HashMap<String, MoveResult>,
    pub(crate) deck_plan: VecDeque<Vec<Card>>,
}

/// One live game: the serialization token plus lock-free side tables.
pub(crate) struct GameHandle {
    pub(crate) game_id: GameId,
    pub(crate) inner: Mutex<GameInner>,
    /// Seat occupancy never changes for a game's lifetime, so the bot
    /// scheduler can read it without the token.
    pub(crate) players: [PlayerId; SEATS],
    pub(crate) kinds: [PlayerKind; SEATS],
    /// Single-in-flight guard: at most one pending scheduled action per
    /// bot seat. Cleared on action entry.
    pub(crate) bot_scheduled: [AtomicBool; SEATS],
    /// Mirrors `state.phase == Completed` for lock-free status reads.
    pub(crate) completed: AtomicBool,
    pub(crate) config: GameConfig,
}

/// Registry and entry point for all game mutations and reads.
pub struct GameFlowService {
    games: DashMap<GameId, Arc<GameHandle>>,
    hub: Arc<EventHub>,
    next_game_id: AtomicI64,
}

impl GameFlowService {
    pub fn new(hub: Arc<EventHub>) -> Self {
        Self {
            games: DashMap::new(),
            hub,
            next_game_id: AtomicI64::new(1),
        }
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub(crate) fn require_game(&self, game_id: GameId) -> Result<Arc<GameHandle>, AppError> {
        self.games
            .get(&game_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| {
                AppError::not_found(ErrorCode::GameNotFound, format!("game {game_id}"))
            })
    }

    /// Create a game from a started room's seat order and run the first
    /// deal. Returns the new game id.
    pub async fn create_game(
        self: &Arc<Self>,
        room_id: RoomId,
        host: PlayerId,
        seats: [SeatAssignment; SEATS],
        config: GameConfig,
    ) -> Result<GameId, AppError> {
        let game_id = self.next_game_id.fetch_add(1, Ordering::Relaxed);
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let now = OffsetDateTime::now_utc();
        let state = GameState::new(
            game_id,
            room_id,
            host,
            seats,
            seed,
            config.target_score,
            config.first_dealer,
            now,
        );
        let handle = Arc::new(GameHandle {
            game_id,
            inner: Mutex::new(GameInner {
                state,
                log: EventLog::new(),
                idempotency: HashMap::new(),
                deck_plan: config.deck_plan.iter().cloned().collect(),
            }),
            players: seats.map(|s| s.player),
            kinds: seats.map(|s| s.kind),
            bot_scheduled: Default::default(),
            completed: AtomicBool::new(false),
            config,
        });
        self.games.insert(game_id, handle.clone());
        tracing::info!(game_id, room_id, "game created");

        self.run_system_mutation(&handle, |inner, em| {
            round_lifecycle::start_round(inner, em, false)
        })
        .await?;
        Ok(game_id)
    }

    /// Public snapshot of the game state.
    pub async fn get_state(&self, game_id: GameId) -> Result<GameSnapshot, AppError> {
        let handle = self.require_game(game_id)?;
        let inner = handle.inner.lock().await;
        Ok(snapshot::snapshot(&inner.state))
    }

    /// Snapshot only if the game has advanced past `version`.
    pub async fn get_state_since(
        &self,
        game_id: GameId,
        version: u64,
    ) -> Result<Option<GameSnapshot>, AppError> {
        let handle = self.require_game(game_id)?;
        let inner = handle.inner.lock().await;
        if inner.state.state_version > version {
            Ok(Some(snapshot::snapshot(&inner.state)))
        } else {
            Ok(None)
        }
    }

    pub async fn get_turn(&self, game_id: GameId) -> Result<TurnInfo, AppError> {
        let handle = self.require_game(game_id)?;
        let inner = handle.inner.lock().await;
        Ok(TurnInfo {
            seat: inner.state.turn,
            player: inner.state.turn_player(),
            phase: inner.state.phase,
            state_version: inner.state.state_version,
        })
    }

    /// A seat's private hand; only its owner may read it.
    pub async fn get_private_hand(
        &self,
        game_id: GameId,
        caller: PlayerId,
    ) -> Result<PrivateHand, AppError> {
        let handle = self.require_game(game_id)?;
        let inner = handle.inner.lock().await;
        let seat = inner.state.seat_of(caller).ok_or_else(|| {
            AppError::forbidden(format!("player {caller} holds no seat in game {game_id}"))
        })?;
        Ok(snapshot::private_hand(&inner.state, seat))
    }

    /// Replay the event log after the given cursor. Private events are
    /// included only for the caller's own seat.
    pub async fn list_events(
        &self,
        game_id: GameId,
        after: Option<Uuid>,
        caller: Option<PlayerId>,
    ) -> Result<Vec<Event>, AppError> {
        let handle = self.require_game(game_id)?;
        let inner = handle.inner.lock().await;
        let viewer = caller.filter(|p| inner.state.seat_of(*p).is_some());
        Ok(inner.log.replay(after, viewer))
    }

    /// Subscribe to a game's public channel.
    pub fn subscribe_public(
        &self,
        game_id: GameId,
    ) -> Result<(Uuid, tokio::sync::mpsc::UnboundedReceiver<Event>), AppError> {
        self.require_game(game_id)?;
        Ok(self.hub.subscribe(Channel::Game(game_id), Scope::Public))
    }

    /// Subscribe with a seat identity: public events plus that seat's
    /// private events.
    pub async fn subscribe_private(
        &self,
        game_id: GameId,
        caller: PlayerId,
    ) -> Result<(Uuid, tokio::sync::mpsc::UnboundedReceiver<Event>), AppError> {
        let handle = self.require_game(game_id)?;
        {
            let inner = handle.inner.lock().await;
            if inner.state.seat_of(caller).is_none() {
                return Err(AppError::forbidden(format!(
                    "player {caller} holds no seat in game {game_id}"
                )));
            }
        }
        Ok(self
            .hub
            .subscribe(Channel::Game(game_id), Scope::Private(caller)))
    }

    pub fn unsubscribe(&self, game_id: GameId, token: Uuid) {
        self.hub.unsubscribe(Channel::Game(game_id), token);
    }

    /// Lock-free completion check; None when the game is unknown.
    pub fn is_game_completed(&self, game_id: GameId) -> Option<bool> {
        self.games
            .get(&game_id)
            .map(|entry| entry.completed.load(Ordering::Acquire))
    }
}
