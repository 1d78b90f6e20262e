//! Error types for the inventory server
//!
//! All errors use thiserror for structured error handling.
//! Routes turn them into the `{isSuccess, payload, message}` envelope.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Multipart error: {0}")]
    Multipart(String),
}

impl AppError {
    /// Message for a required field that is absent or blank
    pub fn required(field: &str) -> Self {
        AppError::Validation(format!("\"{}\" is required", field))
    }

    /// Message for a field present with an unparseable value
    pub fn invalid(field: &str, kind: &str) -> Self {
        AppError::Validation(format!("\"{}\" must be {}", field, kind))
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} not found: {}", entity, id))
    }

    /// Validation failures keep the 500 status the web client already expects.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_)
            | AppError::Database(_)
            | AppError::Io(_)
            | AppError::Serialization(_)
            | AppError::Multipart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.body_text())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_message() {
        let err = AppError::required("name");
        assert_eq!(err.to_string(), "\"name\" is required");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            AppError::not_found("Space", 7).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("dup".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Multipart("bad boundary".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(AppError::not_found("Grid", 3).to_string(), "Grid not found: 3");
    }
}
