//! In-process event bus
//!
//! Services announce refreshed collections and mutation results here so any
//! number of front ends can react (status lines, toasts, logs). The bus is a
//! `tokio::sync::broadcast` channel: emitting never blocks, events are dropped
//! when nobody listens, and a lagging subscriber loses the oldest events.
//!
//! # Example
//!
//! ```
//! use libgradebook::service::events::{Event, EventBus};
//! use libgradebook::EntityKind;
//!
//! # async fn example() {
//! let bus = EventBus::new(100);
//! let mut receiver = bus.subscribe();
//!
//! bus.emit(Event::CollectionRefreshed {
//!     entity: EntityKind::Students,
//!     count: 12,
//! });
//!
//! if let Ok(event) = receiver.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::EntityKind;

pub type EventReceiver = broadcast::Receiver<Event>;

/// Broadcast bus; clones share the same channel
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// `capacity` events are buffered per subscriber before the oldest drop
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: Event) {
        // Err only means nobody is subscribed
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A collection cache was replaced with a fresh server snapshot
    CollectionRefreshed { entity: EntityKind, count: usize },

    MutationSucceeded {
        workflow: String,
        /// Confirmation text, empty for workflows that show none
        notice: String,
    },

    MutationFailed { workflow: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_emission_and_subscription() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        bus.emit(Event::MutationSucceeded {
            workflow: "delete_student".to_string(),
            notice: "Student successfully deleted.".to_string(),
        });

        match receiver.recv().await.unwrap() {
            Event::MutationSucceeded { workflow, notice } => {
                assert_eq!(workflow, "delete_student");
                assert_eq!(notice, "Student successfully deleted.");
            }
            other => panic!("Wrong event received: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_each_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let event = Event::CollectionRefreshed {
            entity: EntityKind::Modules,
            count: 3,
        };
        bus.emit(event.clone());

        assert_eq!(first.recv().await.unwrap(), event);
        assert_eq!(second.recv().await.unwrap(), event);
    }

    #[test]
    fn test_emit_without_subscribers_is_dropped() {
        let bus = EventBus::default();
        bus.emit(Event::MutationFailed {
            workflow: "add_grade".to_string(),
            message: "Grade was not found.".to_string(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_serialization_uses_type_tag() {
        let event = Event::CollectionRefreshed {
            entity: EntityKind::Grades,
            count: 100,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "collection_refreshed", "entity": "grades", "count": 100})
        );

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn test_zero_capacity_is_raised_to_one() {
        let bus = EventBus::new(0);
        let mut receiver = bus.subscribe();

        bus.emit(Event::CollectionRefreshed {
            entity: EntityKind::Modules,
            count: 2,
        });

        assert_eq!(
            receiver.recv().await.unwrap(),
            Event::CollectionRefreshed {
                entity: EntityKind::Modules,
                count: 2,
            }
        );
    }
}
