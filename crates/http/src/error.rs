//! Error handling for the bookshelf HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Body of every error response: `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a service unavailable error
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();

        let message = match self {
            AppError::Validation { message }
            | AppError::NotFound { message }
            | AppError::BadRequest { message }
            | AppError::Unavailable { message } => {
                tracing::warn!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    %message,
                    "request rejected"
                );
                message
            }
            AppError::Internal(e) => {
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?e,
                    "request failed"
                );
                // Release builds never leak internal error details
                if cfg!(debug_assertions) {
                    format!("{e:#}")
                } else {
                    "An internal server error occurred".to_string()
                }
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorBody {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error() {
        match AppError::validation("Missing title or author") {
            AppError::Validation { message } => assert_eq!(message, "Missing title or author"),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_not_found_response() {
        let response = AppError::not_found("Book not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_of(response).await,
            ErrorBody {
                error: "Book not found".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_validation_maps_to_bad_request() {
        let response = AppError::validation("Missing title or author").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_of(response).await.error, "Missing title or author");
    }

    #[tokio::test]
    async fn test_internal_error_mapping() {
        let error = AppError::from(anyhow::anyhow!("Database connection failed"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        if cfg!(debug_assertions) {
            assert!(body.error.contains("Database connection failed"));
        } else {
            assert_eq!(body.error, "An internal server error occurred");
        }
    }

    #[test]
    fn test_unavailable_status() {
        assert_eq!(
            AppError::unavailable("database unreachable").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
