//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{state::ApiState, types::HealthResponse};

/// GET /api/v1/health
///
/// Reports liveness and the number of the last finished tick
pub async fn health_check(State(state): State<ApiState>) -> Json<HealthResponse> {
    let last_tick = state.refresh.latest().await.map(|payload| payload.tick);

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        last_tick,
    })
}
