use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use diesel::r2d2::PoolError;
use foodgram_core::{FieldErrors, PageError};
use serde_json::json;

use crate::auth::SessionError;

pub type ApiResult<T> = Result<T, ApiError>;

pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Per-field messages, rendered as `{"field": ["message"]}`.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Rule violations that are not tied to a field, rendered as `{"errors": "..."}`.
    #[error("{0}")]
    BadRequest(String),

    #[error("malformed request body: {0}")]
    Malformed(String),

    #[error("permission denied")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("invalid page")]
    InvalidPage,

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("database pool error: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::single(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) | ApiError::Malformed(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound | ApiError::InvalidPage => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ApiError::NotFound,
            other => ApiError::Database(other),
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<PageError> for ApiError {
    fn from(_: PageError) -> Self {
        ApiError::InvalidPage
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Database(e) => ApiError::Database(e),
            SessionError::Token(e) => ApiError::Internal(e.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(errors) => json!(errors),
            ApiError::BadRequest(message) => json!({ "errors": message }),
            ApiError::Malformed(message) => json!({ "detail": message }),
            ApiError::Forbidden => json!({ "detail": PERMISSION_DENIED }),
            ApiError::NotFound => json!({ "detail": "Not found." }),
            ApiError::InvalidPage => json!({ "detail": "Invalid page." }),
            err @ (ApiError::Database(_) | ApiError::Pool(_) | ApiError::Internal(_)) => {
                tracing::error!("Request failed: {}", err);
                json!({ "detail": "Internal server error." })
            }
        };

        (status, Json(body)).into_response()
    }
}
