//! Cart pricing, discount preview and delivery options.
//!
//! The cart itself lives in the browser; these endpoints only price it
//! against current stock so the UI can flag problems before checkout.

use axum::{Router, extract::State, routing::{get, post}};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pazar_core::{
    CartLine, DeliveryOption, DiscountError, DiscountKind, delivery_options, merge_lines,
    normalize_code,
};

use crate::db::{CatalogRepository, DiscountRepository};
use crate::error::{ApiResponse, AppError, Result, add_breadcrumb};
use crate::extract::Json;
use crate::models::{CartSummary, price_cart};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart/validate", post(validate))
        .route("/api/discounts/validate", post(validate_discount))
        .route("/api/delivery/options", get(options))
}

#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub lines: Vec<CartLine>,
}

/// Price a cart. Stock problems are reported in `issues`, not as an error.
#[tracing::instrument(skip(state, body), fields(lines = body.lines.len()))]
pub async fn validate(
    State(state): State<AppState>,
    Json(body): Json<CartRequest>,
) -> Result<Json<ApiResponse<CartSummary>>> {
    let lines = merge_lines(&body.lines)?;
    let ids: Vec<_> = lines.iter().map(|l| l.variant_id).collect();
    let stock = CatalogRepository::new(state.pool())
        .variant_stock(&ids)
        .await?;

    let mut summary = price_cart(&lines, &stock);
    summary.resolve_media(&state.config().media_base_url);
    Ok(ApiResponse::ok(summary))
}

#[derive(Debug, Deserialize)]
pub struct DiscountRequest {
    pub code: String,
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct DiscountPreview {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub discount_amount: Decimal,
    pub subtotal_after: Decimal,
}

/// Check a discount code against a subtotal without consuming it.
#[tracing::instrument(skip(state, body))]
pub async fn validate_discount(
    State(state): State<AppState>,
    Json(body): Json<DiscountRequest>,
) -> Result<Json<ApiResponse<DiscountPreview>>> {
    let code = normalize_code(&body.code);
    if code.is_empty() {
        return Err(AppError::Discount(DiscountError::InvalidCode));
    }
    if body.subtotal.is_sign_negative() {
        return Err(AppError::BadRequest("subtotal must not be negative".to_string()));
    }

    add_breadcrumb("discount", "Discount code checked", &[("code", &code)]);

    let (_, rule) = DiscountRepository::new(state.pool())
        .find_by_code(&code)
        .await?
        .ok_or_else(|| AppError::NotFound("discount code".to_string()))?;

    let discount_amount = rule.evaluate(Utc::now(), body.subtotal)?;

    Ok(ApiResponse::ok(DiscountPreview {
        code: rule.code,
        kind: rule.kind,
        value: rule.value,
        discount_amount,
        subtotal_after: body.subtotal - discount_amount,
    }))
}

/// Delivery methods with their fixed prices.
pub async fn options() -> Json<ApiResponse<Vec<DeliveryOption>>> {
    ApiResponse::ok(delivery_options())
}
