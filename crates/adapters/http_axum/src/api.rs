//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod accessories;

use axum::Router;
use axum::routing::{get, post};

use switchbridge_app::ports::{BleLink, CloudApi, EventPublisher};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<C, B, P>() -> Router<AppState<C, B, P>>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/accessories", get(accessories::list::<C, B, P>))
        .route("/accessories/{device_id}", get(accessories::get::<C, B, P>))
        .route(
            "/accessories/{device_id}/refresh",
            post(accessories::refresh::<C, B, P>),
        )
        .route(
            "/accessories/{device_id}/characteristics/{name}",
            get(accessories::read_characteristic::<C, B, P>)
                .put(accessories::write_characteristic::<C, B, P>),
        )
}
