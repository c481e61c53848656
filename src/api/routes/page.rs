//! Dashboard page

use axum::{extract::State, response::Html};

use crate::api::state::ApiState;
use crate::render::render_page;

/// GET /
pub async fn index(State(state): State<ApiState>) -> Html<String> {
    let payload = state.refresh.latest().await;
    Html(render_page(payload.as_ref(), state.refresh_interval_secs))
}
