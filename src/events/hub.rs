//! Subscriber registry and fan-out.
//!
//! Delivery uses unbounded channels so a slow subscriber never blocks the
//! serialization token holder. A closed channel drops the subscriber on
//! the next publish. Ordering per subscriber follows publish order, which
//! under the per-game token equals version order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::protocol::{Event, EventType, HeartbeatPayload};
use crate::domain::state::{GameId, PlayerId, RoomId};

/// Cadence of `system.heartbeat` to live subscribers.
pub const HEARTBEAT_PERIOD: Duration = Duration::from_secs(15);

/// Where a subscription listens: a game channel or a pre-game room channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Game(GameId),
    Room(RoomId),
}

/// What a subscriber is entitled to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Public,
    /// Public events plus the private events addressed to this player.
    Private(PlayerId),
}

struct Subscriber {
    scope: Scope,
    tx: mpsc::UnboundedSender<Event>,
}

impl Subscriber {
    fn wants(&self, event: &Event) -> bool {
        match event.recipient {
            None => true,
            Some(owner) => matches!(self.scope, Scope::Private(p) if p == owner),
        }
    }
}

/// Fan-out hub shared across games. Subscription registries are
/// partitioned per channel; publishing touches only the owning channel.
pub struct EventHub {
    channels: DashMap<Channel, DashMap<Uuid, Subscriber>>,
    last_versions: DashMap<Channel, u64>,
    active_subscribers: AtomicUsize,
}

impl EventHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            last_versions: DashMap::new(),
            active_subscribers: AtomicUsize::new(0),
        }
    }

    /// Register a subscriber; returns its token and the receiving end.
    pub fn subscribe(
        &self,
        channel: Channel,
        scope: Scope,
    ) -> (Uuid, mpsc::UnboundedReceiver<Event>) {
        let token = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.channels
            .entry(channel)
            .or_default()
            .insert(token, Subscriber { scope, tx });
        let active = self.active_subscribers.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(?channel, %token, active_subscribers = active, "subscriber registered");
        (token, rx)
    }

    pub fn unsubscribe(&self, channel: Channel, token: Uuid) {
        let (was_present, now_empty) = match self.channels.get_mut(&channel) {
            Some(entry) => {
                let was_present = entry.remove(&token).is_some();
                (was_present, entry.is_empty())
            }
            None => (false, false),
        };
        if now_empty {
            self.channels.remove(&channel);
        }
        if was_present {
            self.active_subscribers.fetch_sub(1, Ordering::Relaxed);
            debug!(?channel, %token, "subscriber unregistered");
        } else {
            warn!(?channel, %token, "unsubscribe for unknown subscriber");
        }
    }

    /// Deliver a batch of events in order. Dead subscribers are collected
    /// and dropped after the batch; delivery never blocks.
    pub fn publish(&self, channel: Channel, events: &[Event]) {
        if let Some(last) = events.last() {
            self.last_versions.insert(channel, last.version);
        }
        let Some(entry) = self.channels.get(&channel) else {
            return;
        };
        let mut dead: Vec<Uuid> = Vec::new();
        for sub in entry.iter() {
            for event in events {
                if !sub.value().wants(event) {
                    continue;
                }
                if sub.value().tx.send(event.clone()).is_err() {
                    dead.push(*sub.key());
                    break;
                }
            }
        }
        drop(entry);
        for token in dead {
            info!(?channel, %token, "dropping disconnected subscriber");
            self.unsubscribe(channel, token);
        }
    }

    pub fn active_subscriber_count(&self) -> usize {
        self.active_subscribers.load(Ordering::Relaxed)
    }

    /// Emit `system.heartbeat` to every live subscriber of every channel.
    /// Heartbeats carry the channel's last known version and are not
    /// appended to any log.
    pub fn broadcast_heartbeat(&self, now: OffsetDateTime) {
        let channels: Vec<Channel> = self.channels.iter().map(|e| *e.key()).collect();
        for channel in channels {
            let version = self
                .last_versions
                .get(&channel)
                .map(|v| *v)
                .unwrap_or_default();
            let game_id = match channel {
                Channel::Game(id) => Some(id),
                Channel::Room(_) => None,
            };
            let payload = serde_json::to_value(HeartbeatPayload { version })
                .unwrap_or(serde_json::Value::Null);
            let event = Event::new(
                EventType::SystemHeartbeat,
                game_id,
                version,
                payload,
                None,
                now,
            );
            self.publish(channel, std::slice::from_ref(&event));
        }
    }

    /// Spawn the periodic heartbeat task, normally at [`HEARTBEAT_PERIOD`].
    /// The task runs until the hub is dropped by every holder.
    pub fn spawn_heartbeat(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let hub = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(hub) = hub.upgrade() else {
                    break;
                };
                hub.broadcast_heartbeat(OffsetDateTime::now_utc());
            }
        })
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(event_type: EventType, version: u64, recipient: Option<PlayerId>) -> Event {
        Event::new(
            event_type,
            Some(1),
            version,
            serde_json::Value::Null,
            recipient,
            OffsetDateTime::UNIX_EPOCH,
        )
    }

    #[tokio::test]
    async fn public_subscriber_receives_in_order() {
        let hub = EventHub::new();
        let (_token, mut rx) = hub.subscribe(Channel::Game(1), Scope::Public);
        let batch = vec![
            event(EventType::BidPlaced, 1, None),
            event(EventType::BidPassed, 2, None),
            event(EventType::ContractFinalized, 3, None),
        ];
        hub.publish(Channel::Game(1), &batch);
        for expected in 1..=3u64 {
            let got = rx.recv().await.unwrap();
            assert_eq!(got.version, expected);
        }
    }

    #[tokio::test]
    async fn private_events_reach_only_their_owner() {
        let hub = EventHub::new();
        let (_t1, mut public_rx) = hub.subscribe(Channel::Game(1), Scope::Public);
        let (_t2, mut owner_rx) = hub.subscribe(Channel::Game(1), Scope::Private(10));
        let (_t3, mut other_rx) = hub.subscribe(Channel::Game(1), Scope::Private(11));

        hub.publish(
            Channel::Game(1),
            &[
                event(EventType::RoundStarted, 1, None),
                event(EventType::HandDealt, 1, Some(10)),
            ],
        );

        assert_eq!(owner_rx.recv().await.unwrap().event_type, EventType::RoundStarted);
        assert_eq!(owner_rx.recv().await.unwrap().event_type, EventType::HandDealt);

        assert_eq!(public_rx.recv().await.unwrap().event_type, EventType::RoundStarted);
        assert!(public_rx.try_recv().is_err(), "public sees no hand");

        assert_eq!(other_rx.recv().await.unwrap().event_type, EventType::RoundStarted);
        assert!(other_rx.try_recv().is_err(), "other seat sees no hand");
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_publish() {
        let hub = EventHub::new();
        let (_token, rx) = hub.subscribe(Channel::Game(1), Scope::Public);
        assert_eq!(hub.active_subscriber_count(), 1);
        drop(rx);
        hub.publish(Channel::Game(1), &[event(EventType::BidPlaced, 1, None)]);
        assert_eq!(hub.active_subscriber_count(), 0);
    }

    #[tokio::test]
    async fn channels_are_isolated() {
        let hub = EventHub::new();
        let (_t1, mut rx1) = hub.subscribe(Channel::Game(1), Scope::Public);
        let (_t2, mut rx2) = hub.subscribe(Channel::Game(2), Scope::Public);
        hub.publish(Channel::Game(1), &[event(EventType::BidPlaced, 1, None)]);
        assert!(rx1.recv().await.is_some());
        assert!(rx2.try_recv().is_err());
    }

    #[tokio::test]
    async fn heartbeat_task_ticks_on_its_period() {
        let hub = Arc::new(EventHub::new());
        let (_token, mut rx) = hub.subscribe(Channel::Game(1), Scope::Public);
        let _task = hub.spawn_heartbeat(Duration::from_millis(20));
        let hb = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("heartbeat within the deadline")
            .expect("channel open");
        assert_eq!(hb.event_type, EventType::SystemHeartbeat);
    }

    #[tokio::test]
    async fn heartbeat_carries_last_known_version() {
        let hub = EventHub::new();
        let (_token, mut rx) = hub.subscribe(Channel::Game(1), Scope::Public);
        hub.publish(Channel::Game(1), &[event(EventType::BidPlaced, 7, None)]);
        let _ = rx.recv().await;
        hub.broadcast_heartbeat(OffsetDateTime::UNIX_EPOCH);
        let hb = rx.recv().await.unwrap();
        assert_eq!(hb.event_type, EventType::SystemHeartbeat);
        assert_eq!(hb.version, 7);
    }
}
