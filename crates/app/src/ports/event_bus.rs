//! Event port: where accessory state changes and command outcomes go.

use std::future::Future;

use switchbridge_domain::error::BridgeError;
use switchbridge_domain::event::Event;

/// Sink for accessory events.
///
/// The accessory service publishes a `state_updated` event after every
/// refresh or local write, and a command outcome after every push. A
/// publisher with no listeners must still succeed.
pub trait EventPublisher {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: Event) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).publish(event)
    }
}
