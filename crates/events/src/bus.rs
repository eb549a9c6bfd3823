//! In-process event bus backed by a `tokio::sync::broadcast` channel.

use tokio::sync::broadcast;

use crate::event::CheckinEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers (WebSocket
/// relay, tests) independently receive every published [`CheckinEvent`].
/// Designed to be shared via `Arc<EventBus>`.
pub struct EventBus {
    sender: broadcast::Sender<CheckinEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed messages are dropped
    /// and slow receivers observe `RecvError::Lagged`. Acceptable here:
    /// every full-state event is an idempotent snapshot, so a lagging
    /// client recovers on the next one.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Broadcast is best-effort by contract: a zero-receiver send error is
    /// ignored and must never affect the transaction that produced the
    /// event.
    pub fn publish(&self, event: CheckinEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::trace!(event = ?e.0.kind(), "No subscribers for event");
        }
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<CheckinEvent> {
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
    use crate::event::EventKind;
    use frontdesk_core::session::Actor;
    use frontdesk_core::tier::RentalType;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(CheckinEvent::SelectionProposed {
            lane: "lane-1".into(),
            rental_type: RentalType::Locker,
            proposed_by: Actor::Customer,
        });

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.kind(), EventKind::SelectionProposed);
        assert_eq!(received.lane(), Some("lane-1"));
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(CheckinEvent::CustomerConfirmed {
            lane: "lane-3".into(),
        });

        assert_eq!(
            rx1.recv().await.unwrap().kind(),
            EventKind::CustomerConfirmed
        );
        assert_eq!(
            rx2.recv().await.unwrap().kind(),
            EventKind::CustomerConfirmed
        );
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(CheckinEvent::InventoryUpdated {
            availability: vec![],
        });
    }
}
