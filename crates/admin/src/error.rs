//! Unified error handling for the back-office API.
//!
//! Same envelope as the storefront: `{"success": false, "error": "...",
//! "details": ...}`. Server-side failures go to Sentry and are reported to
//! the client without internals.

use axum::{
    Json,
    extract::multipart::MultipartError,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use pazar_core::{DiscountError, FieldError, VariantError};

use crate::db::RepositoryError;
use crate::storage::StorageError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Object store or upload check failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Input failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Discount definition is invalid.
    #[error("{0}")]
    Discount(#[from] DiscountError),

    /// Variant generation request is invalid.
    #[error("{0}")]
    Variant(#[from] VariantError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or wrong API token.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body exceeded the transport limit.
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Vec<FieldError>> for AppError {
    fn from(fields: Vec<FieldError>) -> Self {
        Self::Validation(fields)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(err.body_text())
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) | Self::Storage(StorageError::Io(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Storage(StorageError::TooLarge { .. }) | Self::PayloadTooLarge => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::Storage(StorageError::UnsupportedType(_)) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Storage(StorageError::InvalidKey(_) | StorageError::Empty)
            | Self::Discount(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) | Self::Variant(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Storage(StorageError::Io(_))
                | Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = self.status();
        let unauthorized = matches!(self, Self::Unauthorized);

        let (error, details) = match self {
            Self::Database(RepositoryError::NotFound) => ("Not found".to_string(), None),
            Self::Database(RepositoryError::Conflict(msg)) => (msg, None),
            Self::Database(_) | Self::Internal(_) | Self::Storage(StorageError::Io(_)) => {
                ("Internal server error".to_string(), None)
            }
            Self::Storage(e) => (e.to_string(), None),
            Self::Validation(fields) => (
                "Validation failed".to_string(),
                serde_json::to_value(fields).ok(),
            ),
            Self::Discount(e) => (e.to_string(), None),
            Self::Variant(e) => (e.to_string(), None),
            Self::NotFound(what) => (format!("Not found: {what}"), None),
            Self::Unauthorized => ("Unauthorized".to_string(), None),
            Self::BadRequest(msg) => (msg, None),
            Self::PayloadTooLarge => ("File is too large".to_string(), None),
        };

        let body = ErrorBody {
            success: false,
            error,
            details,
        };

        let mut response = (status, Json(body)).into_response();
        if unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                header::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Success envelope: `{"success": true, "data": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap `data` in a success envelope.
    pub fn ok(data: T) -> crate::extract::Json<Self> {
        crate::extract::Json(Self {
            success: true,
            data,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::Database(RepositoryError::Conflict("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Storage(StorageError::UnsupportedType("text/html".into())).status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            AppError::Storage(StorageError::TooLarge { size: 2, limit: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            AppError::Variant(VariantError::TooManyCombinations { count: 900 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Discount(DiscountError::InvalidPercentage).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_unauthorized_has_challenge() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_validation_details() {
        let (status, body) =
            body_json(AppError::Validation(vec![FieldError::new("sku", "is required")])).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "sku");
    }

    #[tokio::test]
    async fn test_storage_io_hidden() {
        let io = std::io::Error::other("disk at /var/pazar is full");
        let (status, body) = body_json(AppError::Storage(StorageError::Io(io))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }
}
