//! Quarantine incident endpoints, nested under `/api/incidents`

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use imis_core::{GraphEncoder, QuarantineIncidentInput};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::extractors::ValidJson;
use crate::http::server::AppState;

/// GET /api/incidents/selected-for-quarantine
async fn selected_for_quarantine(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let batch = state.incidents.selected_for_quarantine().await?;
    Ok(Json(GraphEncoder::incidents_document(&batch)?))
}

/// POST /api/incidents/quarantine - create or update by id
async fn save_quarantine(
    State(state): State<Arc<AppState>>,
    ValidJson(input): ValidJson<QuarantineIncidentInput>,
) -> Result<Json<Value>, ApiError> {
    let (incident, patient) = state.incidents.save(input).await?;
    Ok(Json(GraphEncoder::incident_document(&incident, Some(&patient))?))
}

/// Incident routes, relative to the nest point
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/selected-for-quarantine", get(selected_for_quarantine))
        .route("/quarantine", post(save_quarantine))
}
