//! Per-game append-only event log with replay-by-cursor.

use uuid::Uuid;

use super::protocol::{Event, EventType, RoundCompletedPayload};
use crate::domain::state::PlayerId;

/// Monotonically ordered event history for one game.
///
/// Appends happen under the owning game's serialization token, so versions
/// arrive strictly increasing. Heartbeats are never appended.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) {
        debug_assert!(
            event.event_type != EventType::SystemHeartbeat,
            "heartbeats are not replayable"
        );
        debug_assert!(
            self.events
                .last()
                .map(|last| last.version <= event.version)
                .unwrap_or(true),
            "log versions must be monotonic"
        );
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_version(&self) -> u64 {
        self.events.last().map(|e| e.version).unwrap_or(0)
    }

    /// Replay the suffix following `after`. An unknown or absent cursor
    /// returns the whole log: the caller has lost context and needs a
    /// fresh baseline.
    ///
    /// `viewer` filters private events: a public viewer sees none of them,
    /// a seat-holder sees only their own.
    pub fn replay(&self, after: Option<Uuid>, viewer: Option<PlayerId>) -> Vec<Event> {
        let start = after
            .and_then(|id| self.events.iter().position(|e| e.event_id == id))
            .map(|pos| pos + 1)
            .unwrap_or(0);
        self.events[start..]
            .iter()
            .filter(|e| match e.recipient {
                None => true,
                Some(owner) => viewer == Some(owner),
            })
            .cloned()
            .collect()
    }

    /// Reconstruct the final cumulative score by folding the round results
    /// out of the log. Used to verify that a completed game's history is
    /// self-contained.
    pub fn replay_cumulative_score(&self) -> [u32; 2] {
        let mut cumulative = [0u32; 2];
        for event in &self.events {
            if event.event_type == EventType::RoundCompleted {
                if let Ok(payload) =
                    serde_json::from_value::<RoundCompletedPayload>(event.payload.clone())
                {
                    cumulative = payload.cumulative;
                }
            }
        }
        cumulative
    }
}
