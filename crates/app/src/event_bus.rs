//! In-process fan-out of accessory events.
//!
//! Backed by a tokio [`broadcast`] channel. Subscribers that fall more than
//! `capacity` events behind lose the oldest ones and see
//! [`RecvError::Lagged`](broadcast::error::RecvError::Lagged) once.

use std::future::Future;

use tokio::sync::broadcast;

use switchbridge_domain::error::BridgeError;
use switchbridge_domain::event::Event;

use crate::ports::EventPublisher;

pub struct InProcessEventBus {
    sender: broadcast::Sender<Event>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BridgeError>> + Send {
        tracing::trace!(kind = event.kind.as_str(), device_id = %event.device_id, "publishing event");
        // no subscriber is not an error
        let _ = self.sender.send(event);
        async { Ok(()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    use switchbridge_domain::event::EventKind;
    use switchbridge_domain::id::DeviceId;

    fn event(kind: EventKind) -> Event {
        Event::new(
            kind,
            DeviceId::new("C1A2B3C4D5E6").unwrap(),
            serde_json::json!({"CurrentPosition": 40}),
        )
    }

    #[tokio::test]
    async fn should_fan_out_to_every_subscriber() {
        let bus = InProcessEventBus::new(16);
        let mut mqtt = bus.subscribe();
        let mut other = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let published = event(EventKind::StateUpdated);
        bus.publish(published.clone()).await.unwrap();

        assert_eq!(mqtt.recv().await.unwrap(), published);
        assert_eq!(other.recv().await.unwrap(), published);
    }

    #[tokio::test]
    async fn should_accept_events_nobody_listens_to() {
        let bus = InProcessEventBus::new(16);
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.publish(event(EventKind::CommandFailed)).await.is_ok());
    }

    #[tokio::test]
    async fn should_only_deliver_events_after_subscription() {
        let bus = InProcessEventBus::new(16);
        bus.publish(event(EventKind::StateUpdated)).await.unwrap();

        let mut rx = bus.subscribe();
        bus.publish(event(EventKind::CommandSucceeded)).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().kind, EventKind::CommandSucceeded);
    }

    #[tokio::test]
    async fn should_report_lag_to_slow_subscribers() {
        let bus = InProcessEventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..3 {
            bus.publish(event(EventKind::StateUpdated)).await.unwrap();
        }

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        assert!(rx.recv().await.is_ok());
    }
}
