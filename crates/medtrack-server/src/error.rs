use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use medtrack_store::{Entity, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input. `message` names what was being parsed,
    /// `detail` says what was wrong with it.
    #[error("{message}: {detail}")]
    Validation { message: &'static str, detail: String },

    #[error("{0} not found")]
    NotFound(Entity),

    /// Logged server-side; the caller only sees `message`.
    #[error("{message}: {detail}")]
    Internal { message: &'static str, detail: String },
}

impl ApiError {
    pub fn invalid(message: &'static str, detail: impl Into<String>) -> Self {
        ApiError::Validation {
            message,
            detail: detail.into(),
        }
    }

    /// Translate a store failure. `message` is used for the caller-facing
    /// text of validation and internal failures.
    pub fn from_store(err: StoreError, message: &'static str) -> Self {
        match err {
            StoreError::Validation(e) => ApiError::Validation {
                message,
                detail: e.to_string(),
            },
            StoreError::NotFound { entity, .. } => ApiError::NotFound(entity),
            other @ StoreError::Poisoned => ApiError::Internal {
                message,
                detail: other.to_string(),
            },
        }
    }
}

/// Attach a caller-facing message to a store result.
pub trait StoreResultExt<T> {
    fn or_api(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn or_api(self, message: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_store(e, message))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation { message, detail } => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "message": message, "error": detail }),
            ),
            ApiError::NotFound(_) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "message": self.to_string() }),
            ),
            ApiError::Internal { message, detail } => {
                tracing::error!(error = %detail, "{message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "message": message }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
