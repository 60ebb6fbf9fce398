//! Request lifecycle events
//!
//! Every store publishes what it does to an [`EventBus`]: when a request is
//! issued, when it settles, and when a late list response is dropped by the
//! stale fence. Observers (loading bars, audit logs, tests) subscribe to the
//! bus instead of polling store state.
//!
//! ```text
//! EntityStore<Incident> ──┐
//!                         ├──▶ EventBus::publish() ──▶ broadcast channel ──▶ subscribers
//! EntityStore<Patient>  ──┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut rx = client.events().subscribe();
//! client.incidents().create(incident).await?;
//!
//! while let Ok(envelope) = rx.try_recv() {
//!     println!("{:?}", envelope.event);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// The operation a request performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    List,
    FilteredList,
    Single,
    Create,
    Update,
    PartialUpdate,
    Delete,
}

impl RequestKind {
    /// Whether this request drives the `updating` flag (as opposed to `loading`)
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            RequestKind::Create
                | RequestKind::Update
                | RequestKind::PartialUpdate
                | RequestKind::Delete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::List => "list",
            RequestKind::FilteredList => "filtered_list",
            RequestKind::Single => "single",
            RequestKind::Create => "create",
            RequestKind::Update => "update",
            RequestKind::PartialUpdate => "partial_update",
            RequestKind::Delete => "delete",
        }
    }
}

/// How a request ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure { code: String, message: String },
}

/// Events emitted by an entity store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A request was handed to the transport
    Issued {
        resource: String,
        kind: RequestKind,
        ticket: u64,
    },
    /// A request settled and its transition was applied
    Settled {
        resource: String,
        kind: RequestKind,
        ticket: u64,
        outcome: Outcome,
    },
    /// A list response arrived after a newer one had been applied
    Discarded {
        resource: String,
        ticket: u64,
        applied_ticket: u64,
    },
    /// The store was reset to its defaults
    Reset { resource: String },
}

impl StoreEvent {
    /// The resource this event relates to
    pub fn resource(&self) -> &str {
        match self {
            StoreEvent::Issued { resource, .. }
            | StoreEvent::Settled { resource, .. }
            | StoreEvent::Discarded { resource, .. }
            | StoreEvent::Reset { resource } => resource,
        }
    }

    /// The request kind, for request lifecycle events
    pub fn kind(&self) -> Option<RequestKind> {
        match self {
            StoreEvent::Issued { kind, .. } | StoreEvent::Settled { kind, .. } => Some(*kind),
            StoreEvent::Discarded { .. } => Some(RequestKind::List),
            StoreEvent::Reset { .. } => None,
        }
    }

    /// Get the action name (issued, settled, discarded, reset)
    pub fn action(&self) -> &str {
        match self {
            StoreEvent::Issued { .. } => "issued",
            StoreEvent::Settled { .. } => "settled",
            StoreEvent::Discarded { .. } => "discarded",
            StoreEvent::Reset { .. } => "reset",
        }
    }
}

/// Envelope wrapping a store event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event occurred
    pub timestamp: DateTime<Utc>,
    /// The actual event
    pub event: StoreEvent,
}

impl EventEnvelope {
    pub fn new(event: StoreEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus shared by all stores of a client
///
/// The bus is cheap to clone and can be shared across tasks. Slow receivers
/// get `Lagged` on their next `recv()` once the buffer overflows.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never fails; with no subscribers the event is dropped. Returns the
    /// number of receivers that will see it.
    pub fn publish(&self, event: StoreEvent) -> usize {
        self.sender.send(EventEnvelope::new(event)).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_kind_is_mutation() {
        assert!(!RequestKind::List.is_mutation());
        assert!(!RequestKind::FilteredList.is_mutation());
        assert!(!RequestKind::Single.is_mutation());
        assert!(RequestKind::Create.is_mutation());
        assert!(RequestKind::PartialUpdate.is_mutation());
        assert!(RequestKind::Delete.is_mutation());
    }

    #[test]
    fn test_store_event_serialization() {
        let event = StoreEvent::Settled {
            resource: "incidents".to_string(),
            kind: RequestKind::PartialUpdate,
            ticket: 3,
            outcome: Outcome::Failure {
                code: "SERVER_ERROR".to_string(),
                message: "boom".to_string(),
            },
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "settled");
        assert_eq!(json["kind"], "partial_update");
        assert_eq!(json["outcome"]["status"], "failure");
        assert_eq!(event.resource(), "incidents");
        assert_eq!(event.kind(), Some(RequestKind::PartialUpdate));
    }

    #[tokio::test]
    async fn test_event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let receivers = bus.publish(StoreEvent::Issued {
            resource: "patients".to_string(),
            kind: RequestKind::List,
            ticket: 1,
        });
        assert_eq!(receivers, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.event.action(), "issued");
        assert_eq!(received.event.resource(), "patients");
    }

    #[test]
    fn test_event_bus_publish_without_subscribers() {
        let bus = EventBus::default();
        let receivers = bus.publish(StoreEvent::Reset {
            resource: "incidents".to_string(),
        });
        assert_eq!(receivers, 0);
    }
}
