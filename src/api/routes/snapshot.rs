//! Render payload endpoints

use axum::{Json, extract::State};

use crate::actors::messages::RenderPayload;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
};

/// GET /api/v1/snapshot
///
/// Returns the payload of the most recent tick
pub async fn get_snapshot(State(state): State<ApiState>) -> ApiResult<Json<RenderPayload>> {
    state
        .refresh
        .latest()
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no refresh has completed yet".to_string()))
}

/// POST /api/v1/refresh
pub async fn refresh_now(State(state): State<ApiState>) -> ApiResult<Json<RenderPayload>> {
    let payload = state.refresh.refresh_now().await?;
    Ok(Json(payload))
}
