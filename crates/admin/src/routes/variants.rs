//! Variants, variant generation and stock levels.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post, put},
};
use serde::Deserialize;

use pazar_core::{ProductId, VariantId, combination_count};

use crate::db::VariantRepository;
use crate::error::{ApiResponse, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{
    GenerateVariantsRequest, GeneratedVariants, LowStockItem, StockChange, Variant, VariantInput,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/products/{id}/variants",
            get(index).post(create),
        )
        .route("/api/admin/products/{id}/variants/generate", post(generate))
        .route("/api/admin/variants/{id}", put(update).delete(destroy))
        .route("/api/admin/variants/{id}/stock", patch(change_stock))
        .route("/api/admin/stock", get(low_stock))
}

#[tracing::instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ApiResponse<Vec<Variant>>>> {
    let variants = VariantRepository::new(state.pool())
        .list_for_product(product_id)
        .await?;
    Ok(ApiResponse::ok(variants))
}

#[tracing::instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(input): Json<VariantInput>,
) -> Result<(StatusCode, Json<ApiResponse<Variant>>)> {
    input.validate()?;
    let variant = VariantRepository::new(state.pool())
        .create(product_id, &input)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(variant)))
}

/// Create every missing combination of the selected property values.
#[tracing::instrument(skip(state, request))]
async fn generate(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<GenerateVariantsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedVariants>>)> {
    request.validate()?;
    let count = combination_count(&request.option_sets)?;
    tracing::debug!(count, "Generating variant combinations");

    let generated = VariantRepository::new(state.pool())
        .generate(product_id, &request)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(generated)))
}

#[tracing::instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<VariantId>,
    Json(input): Json<VariantInput>,
) -> Result<Json<ApiResponse<Variant>>> {
    input.validate()?;
    let variant = VariantRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(ApiResponse::ok(variant))
}

#[tracing::instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<VariantId>) -> Result<StatusCode> {
    VariantRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `{"set": 10}` or `{"adjust": -2}`.
#[tracing::instrument(skip(state))]
async fn change_stock(
    State(state): State<AppState>,
    Path(id): Path<VariantId>,
    Json(change): Json<StockChange>,
) -> Result<Json<ApiResponse<Variant>>> {
    change.validate()?;
    let variant = VariantRepository::new(state.pool())
        .change_stock(id, change)
        .await?;
    Ok(ApiResponse::ok(variant))
}

#[derive(Debug, Default, Deserialize)]
struct StockQuery {
    threshold: Option<i32>,
}

/// Variants at or below the threshold (configured default when omitted).
#[tracing::instrument(skip(state))]
async fn low_stock(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<ApiResponse<Vec<LowStockItem>>>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config().low_stock_threshold)
        .max(0);
    let items = VariantRepository::new(state.pool())
        .low_stock(threshold)
        .await?;
    Ok(ApiResponse::ok(items))
}
