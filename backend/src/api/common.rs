//! Error handling utilities for API responses.
//!
//! Provides structured error responses and conversion between service-layer
//! errors and HTTP responses.
//!
//! # Response Format
//! All responses share a consistent JSON envelope containing:
//! - `success`: whether the request succeeded
//! - `data`: payload (present on success)
//! - `message`: human-readable message
//! - `error`: machine-readable error category (present on failure)
//!
//! # Error Handling Flow
//! 1. Service layer returns a domain-specific `ServiceError`
//! 2. `service_error_to_http` converts it to the appropriate HTTP response
//! 3. Raw database error text never reaches the client; it is logged and
//!    replaced with an opaque message

use crate::errors::ServiceError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Error details (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
    /// Request timestamp
    pub timestamp: String,
}

/// Error details for failed requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error type identifier
    pub error_type: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>, error_type: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message: message.into(),
            error: Some(ErrorDetails {
                error_type: error_type.into(),
            }),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Converts ServiceError to appropriate HTTP response with standard format
pub fn service_error_to_http(error: ServiceError) -> (StatusCode, String) {
    let (status, error_type, message) = match error {
        ServiceError::Validation { message } => {
            (StatusCode::BAD_REQUEST, "validation_error", message)
        }
        ServiceError::Unauthorized { message } => {
            (StatusCode::UNAUTHORIZED, "unauthorized", message)
        }
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            "not_found",
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            "already_exists",
            format!("{} '{}' already exists", entity, identifier),
        ),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "database_error",
                "Internal server error".to_string(),
            )
        }
        ServiceError::ExternalService { message } => {
            (StatusCode::BAD_GATEWAY, "external_service_error", message)
        }
        ServiceError::InternalError { message } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
        }
    };

    let error_response = ApiResponse::<()>::error(message, error_type);
    (status, serde_json::to_string(&error_response).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(error: ServiceError) -> StatusCode {
        service_error_to_http(error).0
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            status_of(ServiceError::validation("bad input")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::unauthorized("no token")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ServiceError::not_found("User", "u1")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::already_exists("User", "alice")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::external_service("media host down")),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(ServiceError::internal_error("token minting failed")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_database_errors_are_opaque() {
        let error = ServiceError::Database {
            source: anyhow::anyhow!("UNIQUE constraint failed: users.username"),
        };
        let (status, body) = service_error_to_http(error);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("UNIQUE constraint"));
        assert!(body.contains("Internal server error"));
    }

    #[test]
    fn test_unauthorized_cause_is_forwarded() {
        let (_, body) =
            service_error_to_http(ServiceError::unauthorized("Refresh token is expired or used"));
        let parsed: ApiResponse<()> = serde_json::from_str(&body).unwrap();

        assert!(!parsed.success);
        assert_eq!(parsed.message, "Refresh token is expired or used");
        assert_eq!(parsed.error.unwrap().error_type, "unauthorized");
    }
}
