use axum::{extract::State, http::StatusCode, response::{IntoResponse, Json, Response}};
use fieldops_database::postgres_health_check;
use serde_json::{json, Value};

use crate::middleware::ApiError;
use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "fieldops-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn detailed_health_check(State(state): State<AppState>) -> Json<Value> {
    let postgres_status = match postgres_health_check(&state.pool).await {
        Ok(_) => json!({"status": "healthy", "message": "Connected"}),
        Err(e) => json!({"status": "unhealthy", "message": format!("{:#}", e)}),
    };

    let status = if postgres_status["status"] == "healthy" { "healthy" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "fieldops-api-gateway",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "postgres": postgres_status
        }
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Response {
    if !state.config.monitoring.metrics_enabled {
        return StatusCode::NOT_FOUND.into_response();
    }

    match state.metrics.render() {
        Ok(body) => body.into_response(),
        Err(e) => ApiError(fieldops_utils::FieldOpsError::internal(format!(
            "Error encoding metrics: {}",
            e
        )))
        .into_response(),
    }
}
