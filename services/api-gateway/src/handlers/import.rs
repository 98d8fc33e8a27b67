//! Bulk import and export endpoints.
//!
//! Request problems (unknown type, missing actor) answer with an
//! `ErrorResponse`. Once an import starts, every outcome is an
//! `ImportResult` body, including parse and storage failures.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use fieldops_models::{EntityKind, ImportResult};
use fieldops_utils::import::{export_from, failure_result, template};
use fieldops_utils::{log_error, validate_model, validate_uuid, FieldOpsError, FieldOpsResult};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::metrics::ImportMode;
use crate::middleware::{error_handling::status_of, ApiError};
use crate::AppState;

pub const ACTOR_HEADER: &str = "x-actor-id";

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 32))]
    pub kind: String,
    pub content: String,
}

fn parse_kind(value: &str) -> FieldOpsResult<EntityKind> {
    value
        .parse()
        .map_err(|err: fieldops_models::UnknownVariant| FieldOpsError::validation("type", err.to_string()))
}

fn actor_from(headers: &HeaderMap) -> FieldOpsResult<Uuid> {
    let raw = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| FieldOpsError::validation(ACTOR_HEADER, "Missing actor header"))?;

    validate_uuid(raw).map_err(|_| FieldOpsError::validation(ACTOR_HEADER, "Actor id must be a UUID"))
}

fn import_response(
    state: &AppState,
    kind: EntityKind,
    mode: ImportMode,
    outcome: FieldOpsResult<ImportResult>,
) -> Response {
    match outcome {
        Ok(result) => {
            state.metrics.observe(kind, mode, &result);
            (StatusCode::OK, Json(result)).into_response()
        }
        Err(err) => {
            state.metrics.observe_failure(kind, mode);
            log_error!(err, "Import aborted", kind = %kind, mode = mode.as_str());
            (status_of(&err), Json(failure_result(&err))).into_response()
        }
    }
}

/// POST /api/v1/import/preview
pub async fn preview_import(
    State(state): State<AppState>,
    Json(request): Json<ImportRequest>,
) -> Result<Response, ApiError> {
    validate_model(&request)?;
    let kind = parse_kind(&request.kind)?;

    let outcome = state.engine.preview(kind, &request.content).await;
    Ok(import_response(&state, kind, ImportMode::Preview, outcome))
}

/// POST /api/v1/import/execute
///
/// The caller identifies itself through the `x-actor-id` header; the id is
/// recorded on the audit entry of the commit.
pub async fn execute_import(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ImportRequest>,
) -> Result<Response, ApiError> {
    validate_model(&request)?;
    let kind = parse_kind(&request.kind)?;
    let actor = actor_from(&headers)?;

    let outcome = state.engine.commit(kind, &request.content, actor).await;
    Ok(import_response(&state, kind, ImportMode::Execute, outcome))
}

/// GET /api/v1/import/templates/:type
pub async fn import_template(Path(kind): Path<String>) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    Ok(([(header::CONTENT_TYPE, CSV_CONTENT_TYPE)], template(kind)).into_response())
}

/// GET /api/v1/export/:type
pub async fn export_entities(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, ApiError> {
    let kind = parse_kind(&kind)?;
    let body = export_from(state.engine.store(), kind).await?;

    let disposition = format!("attachment; filename=\"{}.csv\"", kind);
    Ok((
        [
            (header::CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
