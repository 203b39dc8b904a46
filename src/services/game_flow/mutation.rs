//! The serialized mutation pipeline every game write goes through.
//!
//! Order inside the token: idempotency lookup, version check, seat
//! resolution, the action itself, the card-conservation invariant, then
//! log append and fan-out. Rejections leave the aggregate untouched and
//! emit nothing; invariant violations abort the game without escaping to
//! other games.

use std::sync::Arc;

use serde::Serialize;
use time::OffsetDateTime;
use tracing::{error, warn};
use uuid::Uuid;

use super::{ActionRequest, GameFlowService, GameHandle, GameInner, MoveResult, MoveStatus};
use crate::domain::state::{EndReason, GameId, Phase, PlayerId, Seat};
use crate::error::AppError;
use crate::events::protocol::GameAbortedPayload;
use crate::events::{Channel, Event, EventType};

/// Collects the events a mutation produces, stamped with the state version
/// current at emit time.
pub(super) struct Emitter {
    game_id: GameId,
    now: OffsetDateTime,
    move_id: Uuid,
    system_generated: bool,
    events: Vec<Event>,
}

impl Emitter {
    pub(super) fn new(game_id: GameId, now: OffsetDateTime, system_generated: bool) -> Self {
        Self {
            game_id,
            now,
            move_id: Uuid::new_v4(),
            system_generated,
            events: Vec::new(),
        }
    }

    pub(super) fn move_id(&self) -> Uuid {
        self.move_id
    }

    pub(super) fn now(&self) -> OffsetDateTime {
        self.now
    }

    pub(super) fn system_generated(&self) -> bool {
        self.system_generated
    }

    /// Emit a public event at the aggregate's current version.
    pub(super) fn emit<P: Serialize>(
        &mut self,
        state: &crate::domain::state::GameState,
        event_type: EventType,
        payload: &P,
    ) {
        self.push(state.state_version, event_type, payload, None);
    }

    /// Emit a private event addressed to one player.
    pub(super) fn emit_private<P: Serialize>(
        &mut self,
        state: &crate::domain::state::GameState,
        event_type: EventType,
        payload: &P,
        recipient: PlayerId,
    ) {
        self.push(state.state_version, event_type, payload, Some(recipient));
    }

    fn push<P: Serialize>(
        &mut self,
        version: u64,
        event_type: EventType,
        payload: &P,
        recipient: Option<PlayerId>,
    ) {
        let payload = serde_json::to_value(payload).unwrap_or_else(|err| {
            error!(game_id = self.game_id, %err, "event payload serialization failed");
            serde_json::Value::Null
        });
        self.events.push(Event::new(
            event_type,
            Some(self.game_id),
            version,
            payload,
            recipient,
            self.now,
        ));
    }

    pub(super) fn effects(&self) -> Vec<EventType> {
        self.events.iter().map(|e| e.event_type).collect()
    }

    pub(super) fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl GameFlowService {
    /// Run a player-submitted action through the serialization token.
    pub(super) async fn run_action<F>(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        system_generated: bool,
        action: F,
    ) -> Result<MoveResult, AppError>
    where
        F: FnOnce(&mut GameInner, Seat, &mut Emitter) -> Result<(), AppError>,
    {
        let handle = self.require_game(game_id)?;
        let now = OffsetDateTime::now_utc();
        let mut inner = handle.inner.lock().await;

        // At-most-once: a known client action id replays its prior result.
        if let Some(prior) = inner.idempotency.get(&request.client_action_id) {
            return Ok(prior.clone());
        }

        let current = inner.state.state_version;
        if let Some(expected) = request.expected_version {
            if expected != current {
                return Err(AppError::version_conflict(current));
            }
        }
        if inner.state.is_completed() {
            return Err(AppError::invalid_payload(
                crate::errors::ErrorCode::PhaseMismatch,
                format!("game {game_id} is completed"),
            ));
        }
        let seat = inner.state.seat_of(caller).ok_or_else(|| {
            AppError::forbidden(format!("player {caller} holds no seat in game {game_id}"))
        })?;

        let mut em = Emitter::new(game_id, now, system_generated);
        if let Err(err) = action(&mut inner, seat, &mut em) {
            if matches!(err, AppError::Internal { .. }) {
                self.abort_game(&handle, &mut inner, &err, now);
            }
            return Err(err.with_state_version(inner.state.state_version));
        }
        if let Err(violation) = inner.state.check_card_conservation() {
            let err = AppError::from(violation);
            self.abort_game(&handle, &mut inner, &err, now);
            return Err(err);
        }

        let result = MoveResult {
            move_id: em.move_id(),
            client_action_id: request.client_action_id.clone(),
            status: MoveStatus::Accepted,
            turn_id: inner.state.turn_player(),
            state_version: inner.state.state_version,
            effects: em.effects(),
            system_generated,
            occurred_at: now,
        };
        inner
            .idempotency
            .insert(request.client_action_id, result.clone());

        self.commit_events(&handle, &mut inner, em.into_events());

        let turn = inner.state.turn;
        let version = inner.state.state_version;
        let completed = inner.state.is_completed();
        if completed {
            handle
                .completed
                .store(true, std::sync::atomic::Ordering::Release);
        }
        drop(inner);
        if !completed {
            self.schedule_followups(&handle, turn, version);
        }
        Ok(result)
    }

    /// Run an internally originated mutation (initial deal, cancellation).
    pub(super) async fn run_system_mutation<F>(
        self: &Arc<Self>,
        handle: &Arc<GameHandle>,
        action: F,
    ) -> Result<u64, AppError>
    where
        F: FnOnce(&mut GameInner, &mut Emitter) -> Result<(), AppError>,
    {
        let now = OffsetDateTime::now_utc();
        let mut inner = handle.inner.lock().await;
        let mut em = Emitter::new(handle.game_id, now, true);
        if let Err(err) = action(&mut inner, &mut em) {
            if matches!(err, AppError::Internal { .. }) {
                self.abort_game(handle, &mut inner, &err, now);
            }
            return Err(err.with_state_version(inner.state.state_version));
        }
        if let Err(violation) = inner.state.check_card_conservation() {
            let err = AppError::from(violation);
            self.abort_game(handle, &mut inner, &err, now);
            return Err(err);
        }
        self.commit_events(handle, &mut inner, em.into_events());

        let turn = inner.state.turn;
        let version = inner.state.state_version;
        let completed = inner.state.is_completed();
        if completed {
            handle
                .completed
                .store(true, std::sync::atomic::Ordering::Release);
        }
        drop(inner);
        if !completed {
            self.schedule_followups(handle, turn, version);
        }
        Ok(version)
    }

    fn commit_events(&self, handle: &Arc<GameHandle>, inner: &mut GameInner, events: Vec<Event>) {
        for event in &events {
            inner.log.append(event.clone());
        }
        // Fan-out is non-blocking; a slow subscriber cannot stall the token.
        self.hub.publish(Channel::Game(handle.game_id), &events);
    }

    /// Invariant violations are fatal for this game only: mark it
    /// completed, emit `game.aborted`, leave every other game untouched.
    fn abort_game(
        &self,
        handle: &Arc<GameHandle>,
        inner: &mut GameInner,
        err: &AppError,
        now: OffsetDateTime,
    ) {
        warn!(game_id = handle.game_id, %err, "aborting game on invariant violation");
        let detail = err.to_string();
        inner.state.phase = Phase::Completed;
        inner.state.end = Some(EndReason::Aborted {
            detail: detail.clone(),
        });
        inner.state.turn = None;
        inner.state.bump_version(now);
        handle
            .completed
            .store(true, std::sync::atomic::Ordering::Release);
        let mut em = Emitter::new(handle.game_id, now, true);
        em.emit(
            &inner.state,
            EventType::GameAborted,
            &GameAbortedPayload { detail },
        );
        self.commit_events(handle, inner, em.into_events());
    }
}
