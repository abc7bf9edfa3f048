//! Broadcast event bus carrying hub lifecycle events

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default channel capacity for event subscriptions
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Fired once when the hub has finished starting
pub const HUB_START: &str = "hub_start";

/// Fired exactly once when the hub begins shutting down
///
/// Integrations holding external connections subscribe to this and tear
/// down when it arrives.
pub const HUB_STOP: &str = "hub_stop";

/// Event type identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventType(String);

impl EventType {
    /// Create a new event type
    pub fn new(event_type: impl Into<String>) -> Self {
        Self(event_type.into())
    }

    /// The event type as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event fired on the bus
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// The type of event
    pub event_type: EventType,

    /// Free-form event payload
    pub data: serde_json::Value,

    /// When the event was fired
    pub time_fired: DateTime<Utc>,
}

impl Event {
    /// Create a new event with the current timestamp
    pub fn new(event_type: impl Into<EventType>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            time_fired: Utc::now(),
        }
    }
}

/// The hub's pub/sub broker
///
/// Each event type gets its own broadcast channel; firing delivers to every
/// current subscriber of that type. Send errors just mean nobody is
/// listening and are ignored.
pub struct EventBus {
    listeners: DashMap<EventType, broadcast::Sender<Event>>,
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with the given channel capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            listeners: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe(&self, event_type: impl Into<EventType>) -> broadcast::Receiver<Event> {
        let event_type = event_type.into();
        trace!(event_type = %event_type, "subscribing to event type");

        self.listeners
            .entry(event_type)
            .or_insert_with(|| {
                let (tx, _) = broadcast::channel(self.capacity);
                tx
            })
            .subscribe()
    }

    /// Fire an event to all subscribers of its type
    pub fn fire(&self, event: Event) {
        debug!(event_type = %event.event_type, "firing event");
        if let Some(sender) = self.listeners.get(&event.event_type) {
            let _ = sender.send(event);
        }
    }

    /// Fire an event type with an empty payload
    pub fn fire_empty(&self, event_type: impl Into<EventType>) {
        self.fire(Event::new(event_type, serde_json::Value::Null));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_subscribe_and_fire() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe("test_event");

        bus.fire(Event::new("test_event", json!({"key": "value"})));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event_type.as_str(), "test_event");
        assert_eq!(received.data["key"], "value");
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe(HUB_STOP);
        let mut rx2 = bus.subscribe(HUB_STOP);

        bus.fire_empty(HUB_STOP);

        assert_eq!(rx1.recv().await.unwrap().event_type.as_str(), HUB_STOP);
        assert_eq!(rx2.recv().await.unwrap().event_type.as_str(), HUB_STOP);
    }

    #[tokio::test]
    async fn test_no_cross_event_delivery() {
        let bus = EventBus::new();
        let mut rx_stop = bus.subscribe(HUB_STOP);

        bus.fire_empty(HUB_START);

        assert!(rx_stop.try_recv().is_err());
    }

    #[test]
    fn test_fire_without_subscribers_is_ok() {
        let bus = EventBus::new();
        bus.fire_empty(HUB_STOP);
    }
}
