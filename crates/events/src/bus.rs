//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use deckgen_core::types::DbId;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// A visual batch was submitted for a presentation.
pub const BATCH_SUBMITTED: &str = "batch.submitted";
/// The finalizer settled a batch (success or failure).
pub const BATCH_FINALIZED: &str = "batch.finalized";
/// A running batch was cancelled by its owner.
pub const BATCH_CANCELLED: &str = "batch.cancelled";
/// One slide image was generated and persisted.
pub const SLIDE_IMAGE_GENERATED: &str = "slide.image_generated";
/// Credits were refunded to a user.
pub const CREDITS_REFUNDED: &str = "credits.refunded";

// ---------------------------------------------------------------------------
// DeckEvent
// ---------------------------------------------------------------------------

/// A pipeline progress event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckEvent {
    /// Dot-separated event name, e.g. [`SLIDE_IMAGE_GENERATED`].
    pub name: String,

    /// Presentation the event concerns, when there is one.
    pub presentation_id: Option<DbId>,

    /// Owner of the affected presentation or credit balance.
    pub user_id: Option<DbId>,

    /// Event-specific data (slide numbers, refund amounts, final status).
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DeckEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            presentation_id: None,
            user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn for_presentation(mut self, presentation_id: DbId) -> Self {
        self.presentation_id = Some(presentation_id);
        self
    }

    pub fn for_user(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus, shared as `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<DeckEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// With zero subscribers the event is dropped; progress events are
    /// advisory and the database remains the source of truth.
    pub fn publish(&self, event: DeckEvent) {
        tracing::trace!(name = %event.name, presentation_id = ?event.presentation_id, "Event published");
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            DeckEvent::new(SLIDE_IMAGE_GENERATED)
                .for_presentation(42)
                .for_user(7)
                .with_payload(serde_json::json!({"slide_number": 3})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.name, SLIDE_IMAGE_GENERATED);
        assert_eq!(received.presentation_id, Some(42));
        assert_eq!(received.user_id, Some(7));
        assert_eq!(received.payload["slide_number"], 3);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(DeckEvent::new(BATCH_FINALIZED).for_presentation(1));

        assert_eq!(rx1.recv().await.unwrap().name, BATCH_FINALIZED);
        assert_eq!(rx2.recv().await.unwrap().name, BATCH_FINALIZED);
    }

    #[test]
    fn publish_without_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(DeckEvent::new(BATCH_SUBMITTED));
    }
}
