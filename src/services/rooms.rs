//! Room lifecycle: the pre-game state.
//!
//! Rooms fill seats with humans and bots, track readiness, and hand a
//! complete table over to the game flow service on start. Room events fan
//! out on the room's own channel; once a game starts, game events take
//! over on the game channel.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use super::game_flow::{GameConfig, GameFlowService};
use crate::domain::state::{GameId, PlayerId, PlayerKind, RoomId, Seat, SeatAssignment, SEATS};
use crate::error::AppError;
use crate::errors::ErrorCode;
use crate::events::protocol::{RoomEventPayload, RoomGameStartedPayload};
use crate::events::{Channel, Event, EventHub, EventType, Scope};

pub const RULESET_VERSION: &str = "coinche-v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    Lobby,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatOccupant {
    pub player: PlayerId,
    pub kind: PlayerKind,
    pub ready: bool,
}

#[derive(Debug)]
struct Room {
    room_id: RoomId,
    game_type: String,
    visibility: RoomVisibility,
    status: RoomStatus,
    locked: bool,
    host: PlayerId,
    seats: [Option<SeatOccupant>; SEATS],
    spectators: Vec<PlayerId>,
    game_id: Option<GameId>,
    turn_timeout: Option<Duration>,
    target_score: u32,
    created_at: OffsetDateTime,
}

/// Public projection of a room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub game_type: String,
    pub visibility: RoomVisibility,
    pub status: RoomStatus,
    pub locked: bool,
    pub host: PlayerId,
    pub ruleset_version: &'static str,
    pub seats: [Option<SeatInfo>; SEATS],
    pub spectator_count: usize,
    pub game_id: Option<GameId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SeatInfo {
    pub player: PlayerId,
    pub kind: PlayerKind,
    pub ready: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CreateRoom {
    pub game_type: String,
    pub visibility: Option<RoomVisibility>,
    pub turn_timeout: Option<Duration>,
    pub target_score: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub game_type: Option<String>,
    pub visibility: Option<RoomVisibility>,
    pub status: Option<RoomStatus>,
}

/// Registry and entry point for pre-game operations.
pub struct RoomService {
    rooms: DashMap<RoomId, Arc<Mutex<Room>>>,
    next_room_id: AtomicI64,
    /// Bot identities are negative and process-unique.
    next_bot_id: AtomicI64,
    game_flow: Arc<GameFlowService>,
    hub: Arc<EventHub>,
}

impl RoomService {
    pub fn new(game_flow: Arc<GameFlowService>) -> Self {
        let hub = game_flow.hub().clone();
        Self {
            rooms: DashMap::new(),
            next_room_id: AtomicI64::new(1),
            next_bot_id: AtomicI64::new(-1),
            game_flow,
            hub,
        }
    }

    fn require_room(&self, room_id: RoomId) -> Result<Arc<Mutex<Room>>, AppError> {
        self.rooms
            .get(&room_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::not_found(ErrorCode::RoomNotFound, format!("room {room_id}")))
    }

    fn emit_room_event(
        &self,
        room: &Room,
        event_type: EventType,
        player: Option<PlayerId>,
        seat: Option<Seat>,
    ) {
        let payload = RoomEventPayload {
            room_id: room.room_id,
            player,
            seat,
        };
        let event = Event::new(
            event_type,
            room.game_id,
            0,
            serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null),
            None,
            OffsetDateTime::now_utc(),
        );
        self.hub
            .publish(Channel::Room(room.room_id), std::slice::from_ref(&event));
    }

    fn room_info(&self, room: &Room) -> RoomInfo {
        let mut status = room.status;
        // A finished game flips the room to completed lazily.
        if status == RoomStatus::InProgress {
            if let Some(true) = room.game_id.and_then(|id| self.game_flow.is_game_completed(id)) {
                status = RoomStatus::Completed;
            }
        }
        RoomInfo {
            room_id: room.room_id,
            game_type: room.game_type.clone(),
            visibility: room.visibility,
            status,
            locked: room.locked,
            host: room.host,
            ruleset_version: RULESET_VERSION,
            seats: room.seats.map(|s| {
                s.map(|o| SeatInfo {
                    player: o.player,
                    kind: o.kind,
                    ready: o.ready,
                })
            }),
            spectator_count: room.spectators.len(),
            game_id: room.game_id,
            created_at: room.created_at,
        }
    }

    /// Create a room; the host takes seat 0.
    pub fn create(&self, host: PlayerId, request: CreateRoom) -> RoomInfo {
        let room_id = self.next_room_id.fetch_add(1, Ordering::Relaxed);
        let mut seats: [Option<SeatOccupant>; SEATS] = Default::default();
        seats[0] = Some(SeatOccupant {
            player: host,
            kind: PlayerKind::Human,
            ready: false,
        });
        let room = Room {
            room_id,
            game_type: if request.game_type.is_empty() {
                "coinche".to_string()
            } else {
                request.game_type
            },
            visibility: request.visibility.unwrap_or(RoomVisibility::Public),
            status: RoomStatus::Lobby,
            locked: false,
            host,
            seats,
            spectators: Vec::new(),
            game_id: None,
            turn_timeout: request.turn_timeout,
            target_score: request.target_score.unwrap_or(1000),
            created_at: OffsetDateTime::now_utc(),
        };
        info!(room_id, host, "room created");
        let info = self.room_info(&room);
        self.rooms.insert(room_id, Arc::new(Mutex::new(room)));
        info
    }

    /// Paginated, filtered listing.
    pub async fn list(&self, filter: RoomFilter, offset: usize, limit: usize) -> Vec<RoomInfo> {
        let handles: Vec<Arc<Mutex<Room>>> =
            self.rooms.iter().map(|e| e.value().clone()).collect();
        let mut infos = Vec::new();
        for handle in handles {
            let room = handle.lock().await;
            let info = self.room_info(&room);
            if let Some(ref game_type) = filter.game_type {
                if &info.game_type != game_type {
                    continue;
                }
            }
            if let Some(visibility) = filter.visibility {
                if info.visibility != visibility {
                    continue;
                }
            }
            if let Some(status) = filter.status {
                if info.status != status {
                    continue;
                }
            }
            infos.push(info);
        }
        infos.sort_by_key(|i| i.room_id);
        infos.into_iter().skip(offset).take(limit).collect()
    }

    pub async fn get(&self, room_id: RoomId) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let room = handle.lock().await;
        Ok(self.room_info(&room))
    }

    /// Join a room, optionally at a specific seat or as a spectator.
    pub async fn join(
        &self,
        room_id: RoomId,
        player: PlayerId,
        seat: Option<Seat>,
        spectator: bool,
    ) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if spectator {
            if !room.spectators.contains(&player) {
                room.spectators.push(player);
            }
            self.emit_room_event(&room, EventType::RoomPlayerJoined, Some(player), None);
            return Ok(self.room_info(&room));
        }
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "room is not accepting players",
            ));
        }
        if room.locked {
            return Err(AppError::invalid_payload(
                ErrorCode::RoomLocked,
                "room is locked",
            ));
        }
        if room.seats.iter().flatten().any(|o| o.player == player) {
            return Err(AppError::invalid_payload(
                ErrorCode::SeatTaken,
                "player already seated",
            ));
        }
        let seat_idx = match seat {
            Some(idx) => {
                let idx = idx as usize;
                if idx >= SEATS {
                    return Err(AppError::invalid_payload(
                        ErrorCode::InvalidPayload,
                        format!("seat index {idx} out of range"),
                    ));
                }
                if room.seats[idx].is_some() {
                    return Err(AppError::invalid_payload(
                        ErrorCode::SeatTaken,
                        format!("seat {idx} is taken"),
                    ));
                }
                idx
            }
            None => room
                .seats
                .iter()
                .position(|s| s.is_none())
                .ok_or_else(|| {
                    AppError::invalid_payload(ErrorCode::SeatTaken, "room is full")
                })?,
        };
        room.seats[seat_idx] = Some(SeatOccupant {
            player,
            kind: PlayerKind::Human,
            ready: false,
        });
        info!(room_id, player, seat = seat_idx, "player joined room");
        self.emit_room_event(
            &room,
            EventType::RoomPlayerJoined,
            Some(player),
            Some(seat_idx as Seat),
        );
        Ok(self.room_info(&room))
    }

    pub async fn leave(&self, room_id: RoomId, player: PlayerId) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if let Some(pos) = room.spectators.iter().position(|&p| p == player) {
            room.spectators.remove(pos);
            self.emit_room_event(&room, EventType::RoomPlayerLeft, Some(player), None);
            return Ok(self.room_info(&room));
        }
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "cannot leave a started room",
            ));
        }
        let seat_idx = room
            .seats
            .iter()
            .position(|s| s.as_ref().is_some_and(|o| o.player == player))
            .ok_or_else(|| {
                AppError::not_found(ErrorCode::SeatNotFound, format!("player {player} not seated"))
            })?;
        room.seats[seat_idx] = None;
        // The host seat passing to the next human keeps the room usable.
        if room.host == player {
            if let Some(next_host) = room
                .seats
                .iter()
                .flatten()
                .find(|o| o.kind == PlayerKind::Human)
            {
                room.host = next_host.player;
            }
        }
        info!(room_id, player, seat = seat_idx, "player left room");
        self.emit_room_event(
            &room,
            EventType::RoomPlayerLeft,
            Some(player),
            Some(seat_idx as Seat),
        );
        Ok(self.room_info(&room))
    }

    /// Host-only: clear a seat.
    pub async fn remove_seat(
        &self,
        room_id: RoomId,
        caller: PlayerId,
        seat: Seat,
    ) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if room.host != caller {
            return Err(AppError::forbidden("only the host may remove players"));
        }
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "cannot kick from a started room",
            ));
        }
        let idx = seat as usize;
        if idx >= SEATS {
            return Err(AppError::invalid_payload(
                ErrorCode::InvalidPayload,
                format!("seat index {idx} out of range"),
            ));
        }
        let occupant = room.seats[idx].take().ok_or_else(|| {
            AppError::not_found(ErrorCode::SeatNotFound, format!("seat {idx} is empty"))
        })?;
        info!(room_id, player = occupant.player, seat = idx, "seat cleared by host");
        self.emit_room_event(
            &room,
            EventType::RoomPlayerLeft,
            Some(occupant.player),
            Some(seat),
        );
        Ok(self.room_info(&room))
    }

    pub async fn toggle_ready(
        &self,
        room_id: RoomId,
        player: PlayerId,
    ) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "room already started",
            ));
        }
        let occupant = room
            .seats
            .iter_mut()
            .flatten()
            .find(|o| o.player == player)
            .ok_or_else(|| {
                AppError::not_found(ErrorCode::SeatNotFound, format!("player {player} not seated"))
            })?;
        occupant.ready = !occupant.ready;
        self.emit_room_event(&room, EventType::RoomUpdated, Some(player), None);
        Ok(self.room_info(&room))
    }

    pub async fn set_locked(
        &self,
        room_id: RoomId,
        caller: PlayerId,
        locked: bool,
    ) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if room.host != caller {
            return Err(AppError::forbidden("only the host may lock or unlock"));
        }
        room.locked = locked;
        self.emit_room_event(&room, EventType::RoomUpdated, Some(caller), None);
        Ok(self.room_info(&room))
    }

    /// Fill every empty seat with an auto-readied bot.
    pub async fn fill_with_bots(
        &self,
        room_id: RoomId,
        caller: PlayerId,
    ) -> Result<RoomInfo, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if room.host != caller {
            return Err(AppError::forbidden("only the host may add bots"));
        }
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "room already started",
            ));
        }
        for idx in 0..SEATS {
            if room.seats[idx].is_none() {
                let bot = self.next_bot_id.fetch_sub(1, Ordering::Relaxed);
                room.seats[idx] = Some(SeatOccupant {
                    player: bot,
                    kind: PlayerKind::Bot,
                    ready: true,
                });
                info!(room_id, bot, seat = idx, "bot seated");
                self.emit_room_event(
                    &room,
                    EventType::RoomPlayerJoined,
                    Some(bot),
                    Some(idx as Seat),
                );
            }
        }
        Ok(self.room_info(&room))
    }

    /// Start the game with the room's own settings.
    pub async fn start(&self, room_id: RoomId, caller: PlayerId) -> Result<GameId, AppError> {
        self.start_with_config(room_id, caller, None).await
    }

    /// Start, overriding the derived game configuration (fixtures and
    /// deterministic replays).
    pub async fn start_with_config(
        &self,
        room_id: RoomId,
        caller: PlayerId,
        config: Option<GameConfig>,
    ) -> Result<GameId, AppError> {
        let handle = self.require_room(room_id)?;
        let mut room = handle.lock().await;
        if room.host != caller {
            return Err(AppError::forbidden("only the host may start the game"));
        }
        if room.status != RoomStatus::Lobby {
            return Err(AppError::invalid_payload(
                ErrorCode::PhaseMismatch,
                "room already started",
            ));
        }
        if room.locked {
            return Err(AppError::invalid_payload(
                ErrorCode::RoomLocked,
                "unlock the room before starting",
            ));
        }
        let mut seats: [Option<SeatAssignment>; SEATS] = Default::default();
        for (idx, occupant) in room.seats.iter().enumerate() {
            match occupant {
                Some(o) if o.ready => {
                    seats[idx] = Some(SeatAssignment {
                        player: o.player,
                        kind: o.kind,
                    });
                }
                Some(_) => {
                    return Err(AppError::invalid_payload(
                        ErrorCode::RoomNotReady,
                        format!("seat {idx} is not ready"),
                    ));
                }
                None => {
                    return Err(AppError::invalid_payload(
                        ErrorCode::RoomNotReady,
                        format!("seat {idx} is empty"),
                    ));
                }
            }
        }
        let seats = seats.map(|s| s.expect("all seats checked above"));

        let config = config.unwrap_or_else(|| GameConfig {
            turn_timeout: room.turn_timeout,
            target_score: room.target_score,
            ..GameConfig::default()
        });
        let game_id = self
            .game_flow
            .create_game(room_id, room.host, seats, config)
            .await?;

        room.status = RoomStatus::InProgress;
        room.locked = true;
        room.game_id = Some(game_id);
        for occupant in room.seats.iter_mut().flatten() {
            occupant.ready = false;
        }
        info!(room_id, game_id, "room started");
        self.emit_room_event(&room, EventType::RoomUpdated, None, None);
        let started = Event::new(
            EventType::RoomGameStarted,
            Some(game_id),
            0,
            serde_json::to_value(RoomGameStartedPayload { room_id, game_id })
                .unwrap_or(serde_json::Value::Null),
            None,
            OffsetDateTime::now_utc(),
        );
        self.hub
            .publish(Channel::Room(room_id), std::slice::from_ref(&started));
        Ok(game_id)
    }

    /// Subscribe to a room's public channel.
    pub fn subscribe(
        &self,
        room_id: RoomId,
    ) -> Result<(Uuid, tokio::sync::mpsc::UnboundedReceiver<Event>), AppError> {
        self.require_room(room_id)?;
        Ok(self.hub.subscribe(Channel::Room(room_id), Scope::Public))
    }
}
