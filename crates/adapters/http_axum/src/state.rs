//! Shared application state for axum handlers.

use std::sync::Arc;

use switchbridge_app::ports::{BleLink, CloudApi, EventPublisher};
use switchbridge_app::services::accessory_service::AccessoryService;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so the port types themselves do not need
/// to be `Clone`; only the `Arc` is cloned.
pub struct AppState<C, B, P> {
    pub accessory_service: Arc<AccessoryService<C, B, P>>,
}

impl<C, B, P> Clone for AppState<C, B, P> {
    fn clone(&self) -> Self {
        Self {
            accessory_service: Arc::clone(&self.accessory_service),
        }
    }
}

impl<C, B, P> AppState<C, B, P>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    /// Wrap a service shared with the polling tasks.
    pub fn new(accessory_service: Arc<AccessoryService<C, B, P>>) -> Self {
        Self { accessory_service }
    }
}
