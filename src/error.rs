//! Error handling module
//!
//! Provides unified error types and handling for the entire application.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<String>) {
        match self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "DATABASE_ERROR",
                    "A database error occurred while reading metadata".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Pool(e) => {
                error!("Pool error: {:?}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "POOL_ERROR",
                    "Could not obtain a database connection".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Connection(msg) => (
                StatusCode::BAD_GATEWAY,
                "CONNECTION_ERROR",
                "Could not connect to the target database".to_string(),
                Some(msg.clone()),
            ),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                msg.clone(),
                None,
            ),
            AppError::Render(msg) => {
                error!("Render error: {}", msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "RENDER_ERROR",
                    "Diagram rendering failed".to_string(),
                    Some(msg.clone()),
                )
            }
            AppError::Config(msg) => {
                error!("Configuration error: {}", msg);
                (
                    StatusCode::BAD_REQUEST,
                    "CONFIG_ERROR",
                    "Invalid connection configuration".to_string(),
                    Some(msg.clone()),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = self.parts();

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

/// Helper function to create a not found error
pub fn not_found_error(msg: impl Into<String>) -> AppError {
    AppError::NotFound(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_keeps_message_verbatim() {
        let (status, code, _, details) = AppError::Render("mermaid build failed: x".to_string()).parts();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(code, "RENDER_ERROR");
        assert_eq!(details.as_deref(), Some("mermaid build failed: x"));
    }

    #[test]
    fn test_pool_error_is_service_unavailable() {
        let response = AppError::Pool(deadpool_postgres::PoolError::Closed).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_validation_error_status() {
        let response = validation_error("connectionUrl is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
