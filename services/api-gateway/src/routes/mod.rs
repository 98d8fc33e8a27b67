use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::handlers::*;
use crate::middleware::*;
use crate::AppState;

pub fn create_api_routes() -> Router<AppState> {
    Router::new()
        .route("/health/detailed", get(detailed_health_check))
        .route("/import/preview", post(preview_import))
        .route("/import/execute", post(execute_import))
        .route("/import/templates/:type", get(import_template))
        .route("/export/:type", get(export_entities))
}

pub fn create_app(state: AppState) -> Router {
    let server = &state.config.server;

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ACTOR_HEADER)]),
                )
                .layer(TimeoutLayer::new(Duration::from_secs(server.timeout_seconds)))
                .layer(DefaultBodyLimit::max(server.max_request_size))
                .layer(axum::middleware::from_fn(error_handling_middleware)),
        )
        .with_state(state)
}
