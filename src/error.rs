//! Application error type.
//!
//! Every handler returns `Result<_, AppError>`. The `IntoResponse` impl is the
//! single place where errors are translated into HTTP status codes and bodies:
//!
//! - `Validation` → 400 `{ "message": ... }`
//! - `NotFound` → 404 `{ "message": "Resource not found" }`
//! - `Unauthorized` → 401 with an empty body
//! - `InvalidCredentials` → 401 `{ "message": ... }`
//! - `Conflict` → 409 `{ "message": ... }`
//! - `Database` with SQLSTATE `22P02` → 404, everything else → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// SQLSTATE for "invalid text representation", raised when a malformed
/// identifier literal reaches the database.
const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// SQLSTATE for a unique constraint violation.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(messages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let messages: Vec<String> = messages.into_iter().map(Into::into).collect();
        Self::Validation(messages.join(", "))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(err) if is_invalid_identifier(err) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Returns the SQLSTATE code of a database error, if there is one.
pub(crate) fn sqlstate(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().map(|code| code.into_owned()),
        _ => None,
    }
}

fn is_invalid_identifier(err: &sqlx::Error) -> bool {
    sqlstate(err).as_deref() == Some(INVALID_TEXT_REPRESENTATION)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match self {
            Self::Unauthorized => status.into_response(),
            Self::NotFound => not_found(),
            Self::Database(ref err) if is_invalid_identifier(err) => {
                tracing::debug!("invalid identifier reached the database: {err}");
                not_found()
            }
            Self::Database(_) | Self::Internal(_) => {
                tracing::error!("request failed: {self}");
                (status, "Internal Server Error").into_response()
            }
            Self::Validation(message) | Self::Conflict(message) => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            Self::InvalidCredentials => {
                (status, Json(json!({ "message": self.to_string() }))).into_response()
            }
        }
    }
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": "Resource not found" })),
    )
        .into_response()
}
