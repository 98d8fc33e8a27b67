use axum::{
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use fieldops_utils::{ErrorResponse, FieldOpsError};

/// Request-level failure rendered as an `ErrorResponse` body.
#[derive(Debug)]
pub struct ApiError(pub FieldOpsError);

impl From<FieldOpsError> for ApiError {
    fn from(error: FieldOpsError) -> Self {
        Self(error)
    }
}

pub fn status_of(error: &FieldOpsError) -> StatusCode {
    StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_of(&self.0);
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}

pub async fn error_handling_middleware(
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() {
        tracing::error!(%method, %path, status = status.as_u16(), "Request failed");
    } else if status.is_client_error() {
        tracing::debug!(%method, %path, status = status.as_u16(), "Request rejected");
    }

    response
}
