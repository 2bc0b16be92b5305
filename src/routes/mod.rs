// HTTP routes

mod http;
mod metrics;
pub mod response;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::metric_repo::MetricRepo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) repo: Arc<MetricRepo>,
    pub(crate) config: AppConfig,
}

pub fn app(repo: Arc<MetricRepo>, config: AppConfig) -> Router {
    let state = AppState { repo, config };
    Router::new()
        .route("/", get(|| async { "Tracely metrics service" })) // GET /
        .route("/health", get(http::health_handler)) // GET /health
        .route("/version", get(http::version_handler)) // GET /version
        .route(
            "/api/metrics",
            get(metrics::list_handler).post(metrics::create_handler),
        ) // GET, POST /api/metrics
        .route("/api/metrics/chart", get(metrics::chart_handler)) // GET /api/metrics/chart
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
