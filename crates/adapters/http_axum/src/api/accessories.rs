//! JSON REST handlers for accessories and their characteristics.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use switchbridge_app::ports::{BleLink, CloudApi, EventPublisher};
use switchbridge_app::services::accessory_service::WriteOutcome;
use switchbridge_domain::accessory::AccessorySnapshot;
use switchbridge_domain::connection::Transport;
use switchbridge_domain::error::{BridgeError, NotFoundError};
use switchbridge_domain::homekit::{Characteristic, CharacteristicValue};
use switchbridge_domain::id::DeviceId;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for a characteristic write.
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub value: CharacteristicValue,
}

/// A single characteristic value.
#[derive(Debug, Serialize)]
pub struct CharacteristicResponse {
    pub device_id: DeviceId,
    pub characteristic: Characteristic,
    pub value: CharacteristicValue,
}

/// Result of a characteristic write.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    /// `pushed` or `coalesced`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<Transport>,
}

impl From<WriteOutcome> for WriteResponse {
    fn from(outcome: WriteOutcome) -> Self {
        match outcome {
            WriteOutcome::Pushed(transport) => Self {
                outcome: "pushed",
                transport: Some(transport),
            },
            WriteOutcome::Coalesced => Self {
                outcome: "coalesced",
                transport: None,
            },
        }
    }
}

/// `GET /api/accessories`
pub async fn list<C, B, P>(State(state): State<AppState<C, B, P>>) -> Json<Vec<AccessorySnapshot>>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    Json(state.accessory_service.list())
}

/// `GET /api/accessories/{device_id}`
pub async fn get<C, B, P>(
    State(state): State<AppState<C, B, P>>,
    Path(device_id): Path<String>,
) -> Result<Json<AccessorySnapshot>, ApiError>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = DeviceId::new(device_id)?;
    Ok(Json(state.accessory_service.get(&id)?))
}

/// `POST /api/accessories/{device_id}/refresh`
pub async fn refresh<C, B, P>(
    State(state): State<AppState<C, B, P>>,
    Path(device_id): Path<String>,
) -> Result<Json<AccessorySnapshot>, ApiError>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = DeviceId::new(device_id)?;
    Ok(Json(state.accessory_service.refresh(&id).await?))
}

/// `GET /api/accessories/{device_id}/characteristics/{name}`
pub async fn read_characteristic<C, B, P>(
    State(state): State<AppState<C, B, P>>,
    Path((device_id, name)): Path<(String, String)>,
) -> Result<Json<CharacteristicResponse>, ApiError>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = DeviceId::new(device_id)?;
    let characteristic: Characteristic = name.parse()?;
    let snapshot = state.accessory_service.get(&id)?;
    let value = snapshot.get(characteristic).ok_or_else(|| {
        BridgeError::from(NotFoundError {
            entity: "Characteristic",
            id: format!("{id}/{characteristic}"),
        })
    })?;
    Ok(Json(CharacteristicResponse {
        device_id: id,
        characteristic,
        value,
    }))
}

/// `PUT /api/accessories/{device_id}/characteristics/{name}`
///
/// Answers once the debounced push has completed or been superseded.
pub async fn write_characteristic<C, B, P>(
    State(state): State<AppState<C, B, P>>,
    Path((device_id, name)): Path<(String, String)>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<WriteResponse>, ApiError>
where
    C: CloudApi + Send + Sync + 'static,
    B: BleLink + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    let id = DeviceId::new(device_id)?;
    let characteristic: Characteristic = name.parse()?;
    let outcome = state
        .accessory_service
        .set_characteristic(&id, characteristic, request.value)
        .await?;
    Ok(Json(outcome.into()))
}
