use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the auth and article services.
///
/// Domain variants map to distinct HTTP statuses so clients can tell
/// "who are you" (401) from "not yours" (403) and "not there" (404).
/// Storage, hashing and signing failures collapse into `Infrastructure`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid credentials")]
    AuthenticationFailed,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Article not found")]
    NotFound,

    #[error("Only the author can modify the article")]
    NotOwner,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::AuthenticationFailed | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::NotOwner => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthenticationFailed => "authentication_failed",
            AppError::DuplicateEmail => "duplicate_email",
            AppError::InvalidToken => "invalid_token",
            AppError::NotFound => "not_found",
            AppError::NotOwner => "not_owner",
            AppError::Validation(_) => "validation_failed",
            AppError::Infrastructure(_) => "internal",
        }
    }
}

/// Bodies that fail to parse are input errors like any other.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Infrastructure(e) => {
                error!(error = %e, "request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            Json(json!({ "error": self.code(), "message": message })),
        )
            .into_response()
    }
}
