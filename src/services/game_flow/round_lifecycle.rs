//! Round boundaries: dealing, redeals, scoring, and game completion.

use tracing::{debug, info};

use super::mutation::Emitter;
use super::GameInner;
use crate::domain::bidding::BiddingState;
use crate::domain::dealing::{deal_hands, derive_dealing_seed, shuffled_deck, DECK_SIZE};
use crate::domain::scoring::{game_winner, score_round};
use crate::domain::state::{first_leader, next_seat, EndReason, GameState, Phase, SEATS};
use crate::error::AppError;
use crate::events::protocol::{
    GameCompletedPayload, HandDealtPayload, RoundCompletedPayload, RoundStartedPayload,
};
use crate::events::EventType;

/// Deal a fresh round: shuffle, 3-2-3 deal, fresh auction, cursor to the
/// seat left of the dealer. On a redeal the round number stands and the
/// dealer has already been advanced by the caller.
pub(super) fn start_round(
    inner: &mut GameInner,
    em: &mut Emitter,
    is_redeal: bool,
) -> Result<(), AppError> {
    let state = &mut inner.state;
    if !matches!(state.phase, Phase::Init) {
        return Err(AppError::internal(format!(
            "start_round in phase {:?}",
            state.phase
        )));
    }
    if !is_redeal {
        state.round_no += 1;
    }
    state.deals_dealt += 1;

    let deck = match inner.deck_plan.pop_front() {
        Some(planned) if planned.len() == DECK_SIZE => planned,
        Some(short) => {
            return Err(AppError::internal(format!(
                "planned deck has {} cards",
                short.len()
            )))
        }
        None => shuffled_deck(derive_dealing_seed(state.rng_seed, state.deals_dealt)),
    };
    let dealt = deal_hands(&deck, state.dealer)?;
    for (seat, cards) in dealt.into_iter().enumerate() {
        state.hands[seat].deal(cards);
    }

    state.bidding = Some(BiddingState::fresh());
    state.contract = None;
    state.current_trick.clear();
    state.completed_tricks.clear();
    state.turn = Some(first_leader(state.dealer));

    state.phase = Phase::Bidding;
    state.bump_version(em.now());

    info!(
        game_id = state.game_id,
        round_no = state.round_no,
        dealer = state.dealer,
        is_redeal,
        "round dealt"
    );

    em.emit(
        state,
        EventType::RoundStarted,
        &RoundStartedPayload {
            round_no: state.round_no,
            dealer: state.dealer,
            first_to_act: first_leader(state.dealer),
        },
    );
    for seat in 0..SEATS {
        let hand = &state.hands[seat];
        let payload = HandDealtPayload {
            seat: seat as u8,
            cards: hand.cards().to_vec(),
            hand_version: hand.version(),
        };
        em.emit_private(
            state,
            EventType::HandDealt,
            &payload,
            state.seats[seat].player,
        );
    }
    Ok(())
}

/// Close out a round whose eighth trick just completed: score it, update
/// the cumulative totals, then either finish the game or deal the next
/// round with the dealer advanced. Runs under the same token acquisition
/// as the triggering play; observers never see eight completed tricks in
/// the playing phase.
pub(super) fn finish_round(inner: &mut GameInner, em: &mut Emitter) -> Result<(), AppError> {
    let state = &mut inner.state;
    let contract = state
        .contract
        .ok_or_else(|| AppError::internal("finish_round without a contract"))?;

    let outcome = score_round(&contract, &state.completed_tricks)?;
    state.cumulative[0] += outcome.awarded[0];
    state.cumulative[1] += outcome.awarded[1];
    state.phase = Phase::Scoring;
    state.turn = None;
    state.bump_version(em.now());

    info!(
        game_id = state.game_id,
        round_no = state.round_no,
        awarded_a = outcome.awarded[0],
        awarded_b = outcome.awarded[1],
        fulfilled = outcome.fulfilled,
        "round scored"
    );

    em.emit(
        state,
        EventType::RoundCompleted,
        &RoundCompletedPayload {
            round_no: state.round_no,
            contract,
            outcome: outcome.clone(),
            cumulative: state.cumulative,
        },
    );

    if let Some(winner) = game_winner(state.cumulative, state.target_score) {
        state.phase = Phase::Completed;
        state.end = Some(EndReason::TargetReached { winner });
        state.contract = None;
        state.bump_version(em.now());
        info!(game_id = state.game_id, ?winner, "game completed");
        em.emit(
            state,
            EventType::GameCompleted,
            &GameCompletedPayload {
                winner,
                cumulative: state.cumulative,
            },
        );
        return Ok(());
    }

    // Next round: rotate the dealer and deal again.
    teardown_round(state);
    state.dealer = next_seat(state.dealer);
    debug!(game_id = state.game_id, "dealer rotated, dealing next round");
    start_round(inner, em, false)
}

/// Reset the per-round containers between rounds; cumulative score and
/// round number persist.
fn teardown_round(state: &mut GameState) {
    state.bidding = None;
    state.contract = None;
    state.current_trick.clear();
    state.completed_tricks.clear();
    state.phase = Phase::Init;
    state.turn = None;
}

/// Four passes with no standing bid: redeal with the dealer advanced.
pub(super) fn redeal(inner: &mut GameInner, em: &mut Emitter) -> Result<(), AppError> {
    let state = &mut inner.state;
    teardown_round(state);
    state.dealer = next_seat(state.dealer);
    info!(
        game_id = state.game_id,
        next_dealer = state.dealer,
        "redeal after four passes"
    );
    start_round(inner, em, true)
}
