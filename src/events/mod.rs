//! Event fabric: per-game append-only logs and the fan-out hub.

pub mod hub;
pub mod log;
pub mod protocol;

pub use hub::{Channel, EventHub, Scope};
pub use log::EventLog;
pub use protocol::{Event, EventType};
