//! Event envelope, the event type enumeration, and payload shapes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::bidding::Contract;
use crate::domain::cards_types::{Card, Trump};
use crate::domain::scoring::RoundOutcome;
use crate::domain::snapshot::ContractPublic;
use crate::domain::state::{GameId, Phase, PlayerId, RoomId, Seat};

/// Every kind of event the core emits, public and private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    RoomUpdated,
    RoomPlayerJoined,
    RoomPlayerLeft,
    RoomGameStarted,
    RoundStarted,
    HandDealt,
    BidPlaced,
    BidPassed,
    BidDoubled,
    BidRedoubled,
    ContractFinalized,
    RedealRequired,
    MoveAccepted,
    MoveRejected,
    HandUpdated,
    TrickCompleted,
    TurnChanged,
    RoundCompleted,
    GameCompleted,
    GameCancelled,
    GameAborted,
    MoveInvalidated,
    SystemHeartbeat,
}

impl EventType {
    pub const fn as_str(self) -> &'static str {
        match self {
            EventType::RoomUpdated => "room.updated",
            EventType::RoomPlayerJoined => "room.player_joined",
            EventType::RoomPlayerLeft => "room.player_left",
            EventType::RoomGameStarted => "room.game_started",
            EventType::RoundStarted => "round.started",
            EventType::HandDealt => "hand.dealt",
            EventType::BidPlaced => "bid.placed",
            EventType::BidPassed => "bid.passed",
            EventType::BidDoubled => "bid.doubled",
            EventType::BidRedoubled => "bid.redoubled",
            EventType::ContractFinalized => "contract.finalized",
            EventType::RedealRequired => "redeal.required",
            EventType::MoveAccepted => "move.accepted",
            EventType::MoveRejected => "move.rejected",
            EventType::HandUpdated => "hand.updated",
            EventType::TrickCompleted => "trick.completed",
            EventType::TurnChanged => "turn.changed",
            EventType::RoundCompleted => "round.completed",
            EventType::GameCompleted => "game.completed",
            EventType::GameCancelled => "game.cancelled",
            EventType::GameAborted => "game.aborted",
            EventType::MoveInvalidated => "move.invalidated",
            EventType::SystemHeartbeat => "system.heartbeat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let t = match s {
            "room.updated" => EventType::RoomUpdated,
            "room.player_joined" => EventType::RoomPlayerJoined,
            "room.player_left" => EventType::RoomPlayerLeft,
            "room.game_started" => EventType::RoomGameStarted,
            "round.started" => EventType::RoundStarted,
            "hand.dealt" => EventType::HandDealt,
            "bid.placed" => EventType::BidPlaced,
            "bid.passed" => EventType::BidPassed,
            "bid.doubled" => EventType::BidDoubled,
            "bid.redoubled" => EventType::BidRedoubled,
            "contract.finalized" => EventType::ContractFinalized,
            "redeal.required" => EventType::RedealRequired,
            "move.accepted" => EventType::MoveAccepted,
            "move.rejected" => EventType::MoveRejected,
            "hand.updated" => EventType::HandUpdated,
            "trick.completed" => EventType::TrickCompleted,
            "turn.changed" => EventType::TurnChanged,
            "round.completed" => EventType::RoundCompleted,
            "game.completed" => EventType::GameCompleted,
            "game.cancelled" => EventType::GameCancelled,
            "game.aborted" => EventType::GameAborted,
            "move.invalidated" => EventType::MoveInvalidated,
            "system.heartbeat" => EventType::SystemHeartbeat,
            _ => return None,
        };
        Some(t)
    }

    /// Private events are delivered only to the seat they concern.
    pub const fn is_private(self) -> bool {
        matches!(self, EventType::HandDealt | EventType::HandUpdated)
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EventType::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown event type: {s}")))
    }
}

/// The envelope appended to logs and fanned out to subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub event_type: EventType,
    #[serde(with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
    pub source: String,
    /// Absent on pre-game room events.
    pub game_id: Option<GameId>,
    pub payload: serde_json::Value,
    /// State version produced by the causing mutation. Informational
    /// events (heartbeats, room events) carry the last known version.
    pub version: u64,
    /// Delivery restriction; None is public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<PlayerId>,
}

impl Event {
    pub fn new(
        event_type: EventType,
        game_id: Option<GameId>,
        version: u64,
        payload: serde_json::Value,
        recipient: Option<PlayerId>,
        occurred_at: OffsetDateTime,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type,
            occurred_at,
            source: "coinche-core".to_string(),
            game_id,
            payload,
            version,
            recipient,
        }
    }
}

// Payload shapes. Kept as plain structs so tests and the replay path can
// deserialize them back out of the envelope's JSON value.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundStartedPayload {
    pub round_no: u32,
    pub dealer: Seat,
    pub first_to_act: Seat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandDealtPayload {
    pub seat: Seat,
    pub cards: Vec<Card>,
    pub hand_version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPlacedPayload {
    pub seat: Seat,
    pub trump: Trump,
    pub value: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidPassedPayload {
    pub seat: Seat,
    pub consecutive_passes: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidDoubledPayload {
    pub seat: Seat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractFinalizedPayload {
    pub contract: ContractPublic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedealRequiredPayload {
    pub round_no: u32,
    pub next_dealer: Seat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveAcceptedPayload {
    pub seat: Seat,
    pub card: Card,
    pub move_id: Uuid,
    pub system_generated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandUpdatedPayload {
    pub seat: Seat,
    pub cards: Vec<Card>,
    pub hand_version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrickCompletedPayload {
    pub trick_no: u8,
    pub winner: Seat,
    pub points: u16,
    pub plays: Vec<(Seat, Card)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnChangedPayload {
    pub seat: Seat,
    pub player: PlayerId,
    pub phase: Phase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCompletedPayload {
    pub round_no: u32,
    pub contract: Contract,
    pub outcome: RoundOutcome,
    pub cumulative: [u32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCompletedPayload {
    pub winner: crate::domain::state::Team,
    pub cumulative: [u32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCancelledPayload {
    pub by: PlayerId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameAbortedPayload {
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveInvalidatedPayload {
    pub move_id: Uuid,
    pub invalidated_by: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomEventPayload {
    pub room_id: RoomId,
    pub player: Option<PlayerId>,
    pub seat: Option<Seat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomGameStartedPayload {
    pub room_id: RoomId,
    pub game_id: GameId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_strings_round_trip() {
        let all = [
            EventType::RoomUpdated,
            EventType::RoomPlayerJoined,
            EventType::RoomPlayerLeft,
            EventType::RoomGameStarted,
            EventType::RoundStarted,
            EventType::HandDealt,
            EventType::BidPlaced,
            EventType::BidPassed,
            EventType::BidDoubled,
            EventType::BidRedoubled,
            EventType::ContractFinalized,
            EventType::RedealRequired,
            EventType::MoveAccepted,
            EventType::MoveRejected,
            EventType::HandUpdated,
            EventType::TrickCompleted,
            EventType::TurnChanged,
            EventType::RoundCompleted,
            EventType::GameCompleted,
            EventType::GameCancelled,
            EventType::GameAborted,
            EventType::MoveInvalidated,
            EventType::SystemHeartbeat,
        ];
        for t in all {
            assert_eq!(EventType::parse(t.as_str()), Some(t));
        }
        assert_eq!(EventType::parse("no.such.event"), None);
    }

    #[test]
    fn only_hand_events_are_private() {
        assert!(EventType::HandDealt.is_private());
        assert!(EventType::HandUpdated.is_private());
        assert!(!EventType::MoveAccepted.is_private());
        assert!(!EventType::TrickCompleted.is_private());
    }

    #[test]
    fn envelope_serializes_with_dotted_type() {
        let event = Event::new(
            EventType::BidPlaced,
            Some(7),
            3,
            serde_json::json!({"seat": 0}),
            None,
            OffsetDateTime::UNIX_EPOCH,
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "bid.placed");
        assert_eq!(json["version"], 3);
        assert!(json.get("recipient").is_none());
    }
}
