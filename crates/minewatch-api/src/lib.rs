//! Minewatch API /v1: REST endpoints over the normalizer and metrics
pub mod config;
pub mod handlers;
pub mod metrics;
pub mod middleware;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use config::ApiConfig;
pub use metrics::ApiMetrics;

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new() -> Result<Self, prometheus::Error> {
        Ok(Self { metrics: Arc::new(ApiMetrics::new()?) })
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/v1/normalize", post(handlers::normalize_results))
        .route("/v1/metrics/tiles", post(handlers::tile_metrics))
        .route("/v1/metrics/confidence", post(handlers::confidence_metrics))
        .route("/v1/summary", post(handlers::summary))
        .route("/v1/mine-blocks", post(handlers::mine_blocks))
        .route("/v1/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics_text))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::request_log))
        .layer(middleware::cors())
        .layer(TraceLayer::new_for_http())
}

pub async fn run(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Minewatch API listening on {}", addr);
    axum::serve(listener, app).await
}
