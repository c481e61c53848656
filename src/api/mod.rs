//! HTTP surface of the dashboard
//!
//! ## Endpoints
//!
//! - `GET /` - Auto-refreshing HTML dashboard
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/snapshot` - Latest render payload as JSON
//! - `POST /api/v1/refresh` - Run a tick now and return its payload
//! - `GET /api/v1/stream` - WebSocket stream of new payloads

pub mod error;
pub mod routes;
pub mod state;
pub mod types;

pub use error::{ApiError, ApiResult};
pub use state::ApiState;
pub use types::HealthResponse;

use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8050")
    pub bind_addr: SocketAddr,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(routes::page::index))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/snapshot", get(routes::snapshot::get_snapshot))
        .route("/api/v1/refresh", post(routes::snapshot::refresh_now))
        .route("/api/v1/stream", get(routes::stream::payload_stream))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
