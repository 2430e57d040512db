//! HTTP request handlers.

use super::AppState;
use crate::db::Station;
use crate::monitor::{Diagnostics, MonitorError, StationRequest, StationView};

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;

// ============================================================================
// Errors
// ============================================================================

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        let status = match &self {
            MonitorError::NotFound(_) => StatusCode::NOT_FOUND,
            MonitorError::Validation(_) => StatusCode::BAD_REQUEST,
            MonitorError::ProbeTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            MonitorError::ProbeFailure(_) => StatusCode::BAD_GATEWAY,
            MonitorError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for MonitorError {
    fn from(rejection: JsonRejection) -> Self {
        MonitorError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for MonitorError {
    fn from(rejection: PathRejection) -> Self {
        MonitorError::Validation(rejection.body_text())
    }
}

type ApiResult<T> = Result<Json<T>, MonitorError>;

// ============================================================================
// API: Stations
// ============================================================================

pub async fn handle_get_stations(State(state): State<AppState>) -> ApiResult<Vec<Station>> {
    state.monitor.list_stations().map(Json)
}

pub async fn handle_create_station(
    State(state): State<AppState>,
    payload: Result<Json<StationRequest>, JsonRejection>,
) -> ApiResult<Station> {
    let Json(req) = payload?;
    state.monitor.add_station(&req).map(Json)
}

pub async fn handle_update_station(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<StationRequest>, JsonRejection>,
) -> ApiResult<Station> {
    let Path(id) = id?;
    let Json(req) = payload?;
    state.monitor.edit_station(id, &req).map(Json)
}

pub async fn handle_delete_station(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Station> {
    let Path(id) = id?;
    state.monitor.delete_station(id).map(Json)
}

// ============================================================================
// API: Health & Diagnostics
// ============================================================================

pub async fn handle_refresh_station(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<StationView> {
    let Path(id) = id?;
    state.monitor.refresh_station_status(id).await.map(Json)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsRequest {
    /// Run the health script now instead of returning the stored report.
    #[serde(default)]
    pub provide_latest: bool,
}

impl DiagnosticsRequest {
    /// An empty body asks for the stored report.
    fn from_body(body: &[u8]) -> Result<Self, MonitorError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| MonitorError::Validation(format!("invalid diagnostics request: {}", e)))
    }
}

pub async fn handle_run_diagnostics(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    body: Bytes,
) -> ApiResult<Diagnostics> {
    let Path(id) = id?;
    let req = DiagnosticsRequest::from_body(&body)?;
    state
        .monitor
        .get_diagnostics(id, req.provide_latest)
        .await
        .map(Json)
}

// ============================================================================
// Liveness
// ============================================================================

pub async fn handle_healthz() -> impl IntoResponse {
    Json("OK")
}
