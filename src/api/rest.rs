//! REST API router and configuration.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::analytics::AnalyticsEngine;
use crate::api::handlers::{ask_handler, health_handler, metrics_handler, refresh_handler, ApiState};
use crate::config::ServerConfig;

/// Create the REST API router.
///
/// Endpoints:
/// - POST /ask      - Answer a free-text question
/// - POST /refresh  - Reload the dataset snapshot
/// - GET  /health   - Liveness probe
/// - GET  /metrics  - Prometheus exposition
pub fn create_rest_router(engine: Arc<AnalyticsEngine>, config: &ServerConfig) -> Router {
    let state = Arc::new(ApiState::new(engine));

    let router = Router::new()
        .route("/ask", post(ask_handler))
        .route("/refresh", post(refresh_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state);

    if config.enable_cors {
        let origin = if config.cors_origins.iter().any(|o| o == "*") {
            AllowOrigin::from(Any)
        } else {
            AllowOrigin::list(
                config
                    .cors_origins
                    .iter()
                    .filter_map(|o| o.parse::<HeaderValue>().ok()),
            )
        };
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
            .allow_origin(origin);

        router.layer(cors)
    } else {
        router
    }
}
