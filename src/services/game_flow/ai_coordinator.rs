//! Scheduling of bot turns and turn-deadline forfeits.
//!
//! After every committed mutation the service inspects the turn cursor.
//! A bot-owned seat gets a deferred action with a bounded random delay; a
//! human seat gets a forfeit timer when the room configured one. Both
//! re-enter the state machine through the normal serialized entry points
//! and re-check every precondition inside the token, so a stale schedule
//! simply fizzles.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::{ActionRequest, GameFlowService, GameHandle};
use crate::ai::{create_bot, BotAction, BotView, HeuristicBot};
use crate::domain::state::{PlayerKind, Seat};
use crate::domain::tricks::legal_plays;
use crate::error::AppError;

impl GameFlowService {
    /// Post-mutation hook: schedule whatever the new turn cursor needs.
    pub(super) fn schedule_followups(
        self: &Arc<Self>,
        handle: &Arc<GameHandle>,
        turn: Option<Seat>,
        version: u64,
    ) {
        let Some(seat) = turn else {
            return;
        };
        match handle.kinds[seat as usize] {
            PlayerKind::Bot => self.schedule_bot(handle, seat),
            PlayerKind::Human => self.schedule_turn_timeout(handle, seat, version),
        }
    }

    /// Defer a bot action with a thinking delay. The per-seat flag keeps
    /// at most one schedule in flight; it is cleared on action entry.
    fn schedule_bot(self: &Arc<Self>, handle: &Arc<GameHandle>, seat: Seat) {
        let guard = &handle.bot_scheduled[seat as usize];
        if guard
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(game_id = handle.game_id, seat, "bot already scheduled");
            return;
        }
        let (lo, hi) = handle.config.bot_delay_ms;
        let delay = if hi > lo {
            rand::thread_rng().gen_range(lo..=hi)
        } else {
            lo
        };
        let service = Arc::clone(self);
        let handle = Arc::clone(handle);
        tokio::spawn(async move {
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            handle.bot_scheduled[seat as usize].store(false, Ordering::Release);
            // Bots act on whatever the world looks like after the delay;
            // the fresh read under the token handles staleness.
            service.run_scheduled_action(&handle, seat, None).await;
        });
    }

    /// Arm the per-turn deadline for an absent human, when configured.
    fn schedule_turn_timeout(self: &Arc<Self>, handle: &Arc<GameHandle>, seat: Seat, version: u64) {
        let Some(deadline) = handle.config.turn_timeout else {
            return;
        };
        let service = Arc::clone(self);
        let handle = Arc::clone(handle);
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            debug!(game_id = handle.game_id, seat, "turn deadline expired");
            // A forfeit fires only if nothing happened since it was armed.
            service.run_scheduled_action(&handle, seat, Some(version)).await;
        });
    }

    /// Execute a deferred action for a seat: re-validate under the token,
    /// decide via the bot policy, and submit through the normal path.
    /// Failed preconditions are logged and swallowed; no retry.
    async fn run_scheduled_action(
        self: &Arc<Self>,
        handle: &Arc<GameHandle>,
        seat: Seat,
        armed_version: Option<u64>,
    ) {
        let (view, version) = {
            let inner = handle.inner.lock().await;
            let state = &inner.state;
            // The world may have moved during the delay.
            if state.is_completed() || state.turn != Some(seat) {
                debug!(
                    game_id = handle.game_id,
                    seat, "scheduled action is stale, discarding"
                );
                return;
            }
            if let Some(armed) = armed_version {
                if state.state_version != armed {
                    debug!(
                        game_id = handle.game_id,
                        seat, "deadline overtaken by a newer mutation, discarding"
                    );
                    return;
                }
            }
            let contract = state.contract;
            let view = BotView {
                seat,
                phase: state.phase,
                hand: state.hands[seat as usize].cards().to_vec(),
                current_bid: state.bidding.as_ref().and_then(|b| b.current_bid),
                contract,
                current_trick: state.current_trick.clone(),
                legal_plays: contract
                    .map(|c| {
                        legal_plays(
                            state.hands[seat as usize].cards(),
                            seat,
                            &state.current_trick,
                            c.trump,
                        )
                    })
                    .unwrap_or_default(),
            };
            (view, state.state_version)
        };

        let Some(bot) = create_bot(HeuristicBot::NAME, None) else {
            warn!(game_id = handle.game_id, "default bot missing from registry");
            return;
        };
        let player = handle.players[seat as usize];
        let request = ActionRequest::at_version(
            format!("system:{}:{}:{}", handle.game_id, seat, version),
            version,
        );

        let result = match view.phase {
            crate::domain::state::Phase::Bidding => match bot.choose_bid_action(&view) {
                Ok(BotAction::Pass) => {
                    self.pass_inner(handle.game_id, player, request, true).await
                }
                Ok(BotAction::Bid { trump, value }) => {
                    self.bid_inner(handle.game_id, player, request, true, trump, value)
                        .await
                }
                Ok(BotAction::Play(_)) => {
                    warn!(game_id = handle.game_id, seat, "bot played a card while bidding");
                    return;
                }
                Err(err) => {
                    warn!(game_id = handle.game_id, seat, %err, "bot bid decision failed");
                    return;
                }
            },
            crate::domain::state::Phase::Playing => match bot.choose_play(&view) {
                Ok(card) => {
                    self.play_card_inner(handle.game_id, player, request, true, card)
                        .await
                }
                Err(err) => {
                    warn!(game_id = handle.game_id, seat, %err, "bot play decision failed");
                    return;
                }
            },
            _ => return,
        };

        match result {
            Ok(move_result) => {
                debug!(
                    game_id = handle.game_id,
                    seat,
                    version = move_result.state_version,
                    "scheduled action committed"
                );
            }
            Err(AppError::VersionConflict { current }) => {
                debug!(
                    game_id = handle.game_id,
                    seat, current, "scheduled action lost the race, discarding"
                );
            }
            Err(err) => {
                warn!(game_id = handle.game_id, seat, %err, "scheduled action rejected");
            }
        }
    }
}
