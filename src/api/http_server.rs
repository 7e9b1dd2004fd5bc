//! Router construction and server startup.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{extract::State, Router};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::NodeConfig;
use crate::vision::Detector;

use super::predict::handler::predict_handler;

/// Shared request-handler state. The detector is loaded once at startup and
/// never mutated, so cloning the state is just an `Arc` bump.
#[derive(Clone)]
pub struct AppState {
    pub detector: Arc<dyn Detector>,
}

/// Builds the application router.
///
/// CORS is wide open: the endpoint is consumed by browser front ends served
/// from arbitrary origins.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        // Uploads are capped at 10MB by the decoder; leave headroom for
        // multipart framing.
        .layer(DefaultBodyLimit::max(12 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the listener and serves requests until the process exits.
pub async fn start_server(config: &NodeConfig, detector: Arc<dyn Detector>) -> anyhow::Result<()> {
    let app = build_router(AppState { detector });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("API server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(json!({
        "status": "ok",
        "model": state.detector.model_name(),
    }))
}
