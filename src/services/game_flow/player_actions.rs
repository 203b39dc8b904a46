//! Player-facing actions: bids, passes, doubles, card plays, and the
//! administrative escape hatches.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::mutation::Emitter;
use super::{round_lifecycle, ActionRequest, GameFlowService, GameInner, MoveResult};
use crate::domain::bidding::Bid;
use crate::domain::cards_types::{Card, Trump};
use crate::domain::state::{next_seat, EndReason, first_leader, GameId, Phase, PlayerId, Seat, Team, ROUND_TRICKS};
use crate::domain::tricks::{self, CompletedTrick};
use crate::error::AppError;
use crate::errors::domain::DomainError;
use crate::errors::ErrorCode;
use crate::events::protocol::{
    BidDoubledPayload, BidPassedPayload, BidPlacedPayload, ContractFinalizedPayload,
    GameCancelledPayload, MoveAcceptedPayload, MoveInvalidatedPayload, RedealRequiredPayload,
    TrickCompletedPayload, TurnChangedPayload,
};
use crate::events::EventType;

fn require_phase(inner: &GameInner, phase: Phase) -> Result<(), AppError> {
    if inner.state.phase != phase {
        return Err(DomainError::phase_mismatch(format!(
            "expected {phase:?}, game is in {:?}",
            inner.state.phase
        ))
        .into());
    }
    Ok(())
}

fn require_turn(inner: &GameInner, seat: Seat) -> Result<(), AppError> {
    match inner.state.turn {
        Some(expected) if expected == seat => Ok(()),
        Some(expected) => Err(DomainError::OutOfTurn { expected }.into()),
        None => Err(DomainError::phase_mismatch("nobody may act right now").into()),
    }
}

fn emit_turn_changed(em: &mut Emitter, inner: &GameInner) {
    if let Some(seat) = inner.state.turn {
        em.emit(
            &inner.state,
            EventType::TurnChanged,
            &TurnChangedPayload {
                seat,
                player: inner.state.seats[seat as usize].player,
                phase: inner.state.phase,
            },
        );
    }
}

/// Close the auction into a contract and open trick play.
fn finalize_contract(inner: &mut GameInner, em: &mut Emitter) -> Result<(), AppError> {
    let state = &mut inner.state;
    let bidding = state
        .bidding
        .as_mut()
        .ok_or_else(|| AppError::internal("finalize_contract without bidding state"))?;
    bidding.close();
    let contract = bidding
        .winning_contract()
        .ok_or_else(|| AppError::internal("auction closed without a winning bid"))?;
    state.contract = Some(contract);
    state.bidding = None;
    state.phase = Phase::Playing;
    state.turn = Some(first_leader(state.dealer));
    state.bump_version(em.now());
    info!(
        game_id = state.game_id,
        declarer = contract.declarer,
        trump = %contract.trump,
        value = contract.value,
        doubled = contract.doubled,
        "contract finalized"
    );
    em.emit(
        state,
        EventType::ContractFinalized,
        &ContractFinalizedPayload {
            contract: (&contract).into(),
        },
    );
    emit_turn_changed(em, inner);
    Ok(())
}

impl GameFlowService {
    /// Submit a bid naming a contract mode and value.
    pub async fn submit_bid(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        trump: Trump,
        value: u16,
    ) -> Result<MoveResult, AppError> {
        self.bid_inner(game_id, caller, request, false, trump, value)
            .await
    }

    pub(super) async fn bid_inner(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        system_generated: bool,
        trump: Trump,
        value: u16,
    ) -> Result<MoveResult, AppError> {
        self.run_action(game_id, caller, request, system_generated, move |inner, seat, em| {
            require_phase(inner, Phase::Bidding)?;
            require_turn(inner, seat)?;
            let state = &mut inner.state;
            let bidding = state
                .bidding
                .as_mut()
                .ok_or_else(|| AppError::internal("bidding phase without bidding state"))?;
            bidding.check_bid(trump, value)?;
            bidding.place(Bid {
                seat,
                trump,
                value,
                placed_at: em.now(),
            });
            state.turn = Some(next_seat(seat));
            state.bump_version(em.now());
            debug!(game_id, seat, %trump, value, "bid placed");
            em.emit(
                state,
                EventType::BidPlaced,
                &BidPlacedPayload { seat, trump, value },
            );
            emit_turn_changed(em, inner);
            Ok(())
        })
        .await
    }

    /// Pass. Three passes after a bid finalize the contract; four passes
    /// with no bid force a redeal.
    pub async fn submit_pass(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
    ) -> Result<MoveResult, AppError> {
        self.pass_inner(game_id, caller, request, false).await
    }

    pub(super) async fn pass_inner(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        system_generated: bool,
    ) -> Result<MoveResult, AppError> {
        self.run_action(game_id, caller, request, system_generated, move |inner, seat, em| {
            require_phase(inner, Phase::Bidding)?;
            require_turn(inner, seat)?;
            let state = &mut inner.state;
            let bidding = state
                .bidding
                .as_mut()
                .ok_or_else(|| AppError::internal("bidding phase without bidding state"))?;
            let passes = bidding.pass(seat);
            let has_bid = bidding.current_bid.is_some();
            state.turn = Some(next_seat(seat));
            state.bump_version(em.now());
            em.emit(
                &inner.state,
                EventType::BidPassed,
                &BidPassedPayload {
                    seat,
                    consecutive_passes: passes,
                },
            );

            if !has_bid && passes as usize == crate::domain::state::SEATS {
                em.emit(
                    &inner.state,
                    EventType::RedealRequired,
                    &RedealRequiredPayload {
                        round_no: inner.state.round_no,
                        next_dealer: next_seat(inner.state.dealer),
                    },
                );
                return round_lifecycle::redeal(inner, em);
            }
            if has_bid && passes == 3 {
                return finalize_contract(inner, em);
            }
            emit_turn_changed(em, inner);
            Ok(())
        })
        .await
    }

    /// Coinche: out-of-turn double that closes the auction immediately.
    pub async fn submit_coinche(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
    ) -> Result<MoveResult, AppError> {
        self.run_action(game_id, caller, request, false, move |inner, seat, em| {
            require_phase(inner, Phase::Bidding)?;
            let state = &mut inner.state;
            let bidding = state
                .bidding
                .as_mut()
                .ok_or_else(|| AppError::internal("bidding phase without bidding state"))?;
            bidding.check_coinche(seat)?;
            bidding.doubled = true;
            bidding.doubled_by = Some(seat);
            bidding
                .bid_log
                .push(crate::domain::bidding::BidEntry::Coinche { seat });
            state.bump_version(em.now());
            info!(game_id, seat, "bid doubled");
            em.emit(&inner.state, EventType::BidDoubled, &BidDoubledPayload { seat });
            finalize_contract(inner, em)
        })
        .await
    }

    /// Surcoinche: the declaring team redoubles a coinched contract before
    /// the first card is played.
    pub async fn submit_surcoinche(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
    ) -> Result<MoveResult, AppError> {
        self.run_action(game_id, caller, request, false, move |inner, seat, em| {
            let state = &mut inner.state;
            let contract = state
                .contract
                .as_mut()
                .ok_or_else(|| DomainError::phase_mismatch("no contract to redouble"))?;
            if state.phase != Phase::Playing
                || !state.current_trick.is_empty()
                || !state.completed_tricks.is_empty()
            {
                return Err(DomainError::phase_mismatch(
                    "surcoinche is only available before the first card",
                )
                .into());
            }
            if !contract.doubled || contract.redoubled {
                return Err(DomainError::illegal(
                    crate::errors::domain::RuleViolation::CannotRedouble,
                )
                .into());
            }
            if Team::of(seat) != contract.declaring_team() {
                return Err(DomainError::illegal(
                    crate::errors::domain::RuleViolation::CannotRedouble,
                )
                .into());
            }
            contract.redoubled = true;
            state.bump_version(em.now());
            info!(game_id, seat, "bid redoubled");
            em.emit(&inner.state, EventType::BidRedoubled, &BidDoubledPayload { seat });
            Ok(())
        })
        .await
    }

    /// Play a card. Completing the eighth trick scores the round in the
    /// same mutation.
    pub async fn submit_play(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        card: Card,
    ) -> Result<MoveResult, AppError> {
        self.play_card_inner(game_id, caller, request, false, card).await
    }

    pub(super) async fn play_card_inner(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        system_generated: bool,
        card: Card,
    ) -> Result<MoveResult, AppError> {
        self.run_action(
            game_id,
            caller,
            request,
            system_generated,
            move |inner, seat, em| {
                require_phase(inner, Phase::Playing)?;
                require_turn(inner, seat)?;
                let state = &mut inner.state;
                let contract = state
                    .contract
                    .ok_or_else(|| AppError::internal("playing phase without a contract"))?;

                tricks::check_play(
                    state.hands[seat as usize].cards(),
                    seat,
                    &state.current_trick,
                    contract.trump,
                    card,
                )?;

                // Committed: move the card from the hand to the table.
                state.hands[seat as usize].remove(card);
                state.current_trick.push((seat, card));
                state.turn = Some(next_seat(seat));
                state.bump_version(em.now());
                debug!(game_id, seat, "card played");
                em.emit(
                    state,
                    EventType::MoveAccepted,
                    &MoveAcceptedPayload {
                        seat,
                        card,
                        move_id: em.move_id(),
                        system_generated: em.system_generated(),
                    },
                );
                let hand = &state.hands[seat as usize];
                let hand_payload = crate::events::protocol::HandUpdatedPayload {
                    seat,
                    cards: hand.cards().to_vec(),
                    hand_version: hand.version(),
                };
                em.emit_private(
                    state,
                    EventType::HandUpdated,
                    &hand_payload,
                    state.seats[seat as usize].player,
                );

                if !tricks::is_complete(&state.current_trick) {
                    emit_turn_changed(em, inner);
                    return Ok(());
                }

                // Trick complete: resolve it before anything else may act.
                let plays = std::mem::take(&mut state.current_trick);
                let completed = CompletedTrick::resolve(plays, contract.trump)?;
                state.turn = Some(completed.winner);
                state.completed_tricks.push(completed.clone());
                state.bump_version(em.now());
                info!(
                    game_id,
                    trick_no = state.completed_tricks.len(),
                    winner = completed.winner,
                    points = completed.points,
                    "trick completed"
                );
                em.emit(
                    state,
                    EventType::TrickCompleted,
                    &TrickCompletedPayload {
                        trick_no: state.completed_tricks.len() as u8,
                        winner: completed.winner,
                        points: completed.points,
                        plays: completed.plays.clone(),
                    },
                );

                if state.completed_tricks.len() < ROUND_TRICKS {
                    emit_turn_changed(em, inner);
                    return Ok(());
                }

                // Eighth trick: score atomically with this mutation.
                round_lifecycle::finish_round(inner, em)
            },
        )
        .await
    }

    /// Tournament-only escape hatch: record that an operator invalidated a
    /// move. No rollback is attempted.
    pub async fn invalidate_move(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        request: ActionRequest,
        move_id: Uuid,
    ) -> Result<MoveResult, AppError> {
        self.run_action(game_id, caller, request, false, move |inner, _seat, em| {
            if inner.state.host != caller {
                return Err(AppError::forbidden(format!(
                    "player {caller} is not the host of game {game_id}"
                )));
            }
            if !inner
                .idempotency
                .values()
                .any(|result| result.move_id == move_id)
            {
                return Err(AppError::not_found(
                    ErrorCode::MoveNotFound,
                    format!("move {move_id} in game {game_id}"),
                ));
            }
            inner.state.bump_version(em.now());
            info!(game_id, %move_id, "move invalidated by operator");
            em.emit(
                &inner.state,
                EventType::MoveInvalidated,
                &MoveInvalidatedPayload {
                    move_id,
                    invalidated_by: caller,
                },
            );
            Ok(())
        })
        .await
    }

    /// Cancel a running game. Host-only; in-flight bot schedules fizzle on
    /// their precondition checks.
    pub async fn cancel_game(
        self: &Arc<Self>,
        game_id: GameId,
        caller: PlayerId,
        reason: impl Into<String>,
    ) -> Result<u64, AppError> {
        let handle = self.require_game(game_id)?;
        let reason = reason.into();
        self.run_system_mutation(&handle, move |inner, em| {
            if inner.state.host != caller {
                return Err(AppError::forbidden(format!(
                    "player {caller} is not the host of game {game_id}"
                )));
            }
            if inner.state.is_completed() {
                return Err(DomainError::phase_mismatch("game already completed").into());
            }
            let state = &mut inner.state;
            state.phase = Phase::Completed;
            state.end = Some(EndReason::Cancelled {
                by: caller,
                reason: reason.clone(),
            });
            state.turn = None;
            state.bump_version(em.now());
            info!(game_id, by = caller, "game cancelled");
            em.emit(
                state,
                EventType::GameCancelled,
                &GameCancelledPayload { by: caller, reason },
            );
            Ok(())
        })
        .await
    }
}
