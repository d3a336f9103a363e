use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use commerce_dispatch::DispatchStatsSnapshot;
use commerce_fabric::{BusEvent, FabricError};
use commerce_types::CampaignId;

use crate::router::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body of `POST /v1/events`.
#[derive(Debug, Deserialize)]
pub struct InboundEvent {
    pub event_type: String,
    #[serde(default)]
    pub entity_key: String,
    #[serde(default)]
    pub campaign_id: CampaignId,
    #[serde(default)]
    pub payload: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishReceipt {
    pub id: String,
    pub delivered: usize,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let resources: Vec<&str> = state.dispatcher.registry().resources().collect();
    Json(json!({
        "name": "commerced",
        "version": env!("CARGO_PKG_VERSION"),
        "service_version": state.service_version,
        "resources": resources,
        "subscribers": state.bus.subscriber_count(),
        "published": state.bus.published_count(),
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<DispatchStatsSnapshot> {
    Json(state.dispatcher.stats())
}

/// Publish an inbound command event onto the bus. Routing happens
/// asynchronously in the dispatch workers.
pub async fn publish_handler(
    State(state): State<AppState>,
    Json(inbound): Json<InboundEvent>,
) -> Result<(StatusCode, Json<PublishReceipt>), ApiError> {
    if inbound.event_type.trim().is_empty() {
        return Err(ApiError::BadRequest("event_type is required".into()));
    }
    let mut event = BusEvent::new(inbound.event_type)
        .with_entity_key(inbound.entity_key)
        .with_campaign(inbound.campaign_id);
    event.payload = inbound.payload;
    let id = event.id.to_string();
    match state.bus.publish(event) {
        Ok(delivered) => {
            debug!(id = %id, delivered, "inbound event accepted");
            Ok((StatusCode::ACCEPTED, Json(PublishReceipt { id, delivered })))
        }
        Err(FabricError::Shutdown) => Err(ApiError::Unavailable("event bus is shut down".into())),
        Err(err) => {
            warn!(error = %err, "inbound event rejected");
            Err(ApiError::Unavailable(err.to_string()))
        }
    }
}
