//! Order placement.

use axum::{Router, extract::State, http::StatusCode, routing::post};
use chrono::Utc;

use pazar_core::{CheckoutForm, DeliveryDetails, FieldError};

use crate::db::OrderRepository;
use crate::econt::EcontDirectory;
use crate::error::{ApiResponse, AppError, Result, add_breadcrumb};
use crate::extract::Json;
use crate::middleware::checkout_rate_limiter;
use crate::models::PlacedOrder;
use crate::state::AppState;

/// Checkout router, rate limited per client IP.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/checkout", post(place_order))
        .layer(checkout_rate_limiter())
}

/// Office delivery must name an office that exists.
fn check_office(econt: &EcontDirectory, delivery: &DeliveryDetails) -> Result<()> {
    if let DeliveryDetails::EcontOffice { office_code } = delivery
        && econt.find(office_code).is_none()
    {
        return Err(AppError::Validation(vec![FieldError::new(
            "econt_office_code",
            "unknown Econt office",
        )]));
    }
    Ok(())
}

/// Validate the checkout form and create the order.
#[tracing::instrument(skip(state, form))]
pub async fn place_order(
    State(state): State<AppState>,
    Json(form): Json<CheckoutForm>,
) -> Result<(StatusCode, Json<ApiResponse<PlacedOrder>>)> {
    let checkout = form.validate()?;
    check_office(state.econt(), &checkout.delivery)?;

    add_breadcrumb(
        "checkout",
        "Placing order",
        &[("delivery", checkout.delivery.method().as_str())],
    );

    let order = OrderRepository::new(state.pool())
        .place_order(&checkout, Utc::now())
        .await?;

    // Stock changed; stale product pages would overstate availability
    for line in &order.lines {
        state.product_cache().invalidate(&line.product_id).await;
    }

    Ok((StatusCode::CREATED, ApiResponse::ok(order)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_check_office() {
        let econt = EcontDirectory::load().unwrap();
        let known = DeliveryDetails::EcontOffice {
            office_code: "1000".to_string(),
        };
        assert!(check_office(&econt, &known).is_ok());

        let unknown = DeliveryDetails::EcontOffice {
            office_code: "9999".to_string(),
        };
        let err = check_office(&econt, &unknown).unwrap_err();
        assert!(matches!(err, AppError::Validation(ref f) if f[0].field == "econt_office_code"));

        assert!(check_office(&econt, &DeliveryDetails::Pickup).is_ok());
    }
}
