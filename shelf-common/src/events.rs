//! Domain event bus
//!
//! Lifecycle operations publish a [`DomainEvent`] after their changes are
//! durable. Consumers (search indexing, thumbnailing, UI streams) subscribe
//! through [`EventBus::subscribe`]; none of them are part of this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Entity lifecycle events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    PublisherAdded {
        publisher_id: String,
        library_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
    PersonAdded {
        person_id: String,
        library_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
    ContributorRoleAdded {
        role_id: String,
        library_id: String,
        name: String,
        timestamp: DateTime<Utc>,
    },
    BookAdded {
        book_id: String,
        library_id: String,
        timestamp: DateTime<Utc>,
    },
    BookUpdated {
        book_id: String,
        library_id: String,
        timestamp: DateTime<Utc>,
    },
    BookCoverAdded {
        book_id: String,
        image_id: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Event name, as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::PublisherAdded { .. } => "PublisherAdded",
            DomainEvent::PersonAdded { .. } => "PersonAdded",
            DomainEvent::ContributorRoleAdded { .. } => "ContributorRoleAdded",
            DomainEvent::BookAdded { .. } => "BookAdded",
            DomainEvent::BookUpdated { .. } => "BookUpdated",
            DomainEvent::BookCoverAdded { .. } => "BookCoverAdded",
        }
    }
}

/// Broadcast channel for domain events
///
/// Cloning the bus shares the same underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DomainEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// `capacity` is the number of events buffered per subscriber before the
    /// oldest ones are dropped.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: DomainEvent) {
        tracing::debug!(event = event.name(), "Publishing domain event");
        let _ = self.tx.send(event);
    }

    /// Emit a batch of events in order
    pub fn emit_all(&self, events: impl IntoIterator<Item = DomainEvent>) {
        for event in events {
            self.emit_lossy(event);
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
