use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use platform_core::HttpError;
use platform_db::{ModelError, SessionError};

/// Error returned by handlers; renders as a JSON error body.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] HttpError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn detail(&self) -> &str {
        &self.0.detail
    }
}

impl From<ModelError> for ApiError {
    fn from(err: ModelError) -> Self {
        Self(err.into_http())
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ModelError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), detail = %self.0.detail, "request failed");
        }
        json_error(status, error_code(status), self.0.detail)
    }
}

pub fn model_error_to_response(err: ModelError) -> axum::response::Response {
    ApiError::from(err).into_response()
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::NOT_FOUND => "not_found",
        StatusCode::UNAUTHORIZED => "unauthorized",
        StatusCode::FORBIDDEN => "forbidden",
        StatusCode::UNPROCESSABLE_ENTITY => "validation_error",
        s if s.is_client_error() => "bad_request",
        _ => "internal_error",
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
