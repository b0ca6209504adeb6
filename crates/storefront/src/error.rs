//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the JSON
//! envelope `{"success": false, "error": "..."}`, with a `details` field when
//! there is structured information the client can act on (invalid fields,
//! out-of-stock lines). Server-side failures are captured to Sentry and never
//! leak their internals to the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use pazar_core::{CheckoutError, DiscountError, FieldError};

use crate::db::{OrderError, RepositoryError};
use crate::models::CartIssue;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Checkout input failed validation.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Some cart lines cannot be ordered.
    #[error("Some items are unavailable")]
    Cart(Vec<CartIssue>),

    /// A discount code cannot be applied.
    #[error("{0}")]
    Discount(#[from] DiscountError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Invalid(fields) => Self::Validation(fields),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Repository(e) => Self::Database(e),
            OrderError::Cart(issues) => Self::Cart(issues),
            OrderError::UnknownDiscount => Self::NotFound("discount code".to_string()),
            OrderError::Discount(e) => Self::Discount(e),
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
            Self::Database(RepositoryError::Conflict(_)) | Self::Cart(_) => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Discount(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let (error, details) = match self {
            Self::Database(RepositoryError::NotFound) => ("Not found".to_string(), None),
            Self::Database(RepositoryError::Conflict(msg)) => (msg, None),
            Self::Database(_) => ("Internal server error".to_string(), None),
            Self::Validation(fields) => (
                "Please correct the highlighted fields".to_string(),
                serde_json::to_value(fields).ok(),
            ),
            Self::Cart(issues) => (
                "Some items in your cart are unavailable".to_string(),
                serde_json::to_value(issues).ok(),
            ),
            Self::Discount(e) => (e.to_string(), None),
            Self::NotFound(what) => (format!("Not found: {what}"), None),
            Self::BadRequest(msg) => (msg, None),
            Self::RateLimited => ("Too many requests".to_string(), None),
        };

        let body = ErrorBody {
            success: false,
            error,
            details,
        };

        (status, Json(body)).into_response()
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

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pazar_core::VariantId;

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
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::BadRequest("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            AppError::Validation(vec![]).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::Cart(vec![]).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Discount(DiscountError::Expired).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Database(RepositoryError::DataCorruption("x".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret path /etc".into()));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_rate_limited_envelope() {
        let (status, body) = body_json(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Too many requests");
    }

    #[tokio::test]
    async fn test_cart_issues_in_details() {
        let (status, body) = body_json(AppError::Cart(vec![CartIssue::Unavailable {
            variant_id: VariantId::new(7),
        }]))
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["details"][0]["kind"], "unavailable");
        assert_eq!(body["details"][0]["variant_id"], 7);
    }

    #[test]
    fn test_order_error_mapping() {
        let err: AppError = OrderError::UnknownDiscount.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err: AppError = OrderError::Discount(DiscountError::UsageLimitReached).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
