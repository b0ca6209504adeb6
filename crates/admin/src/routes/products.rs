//! Product CRUD.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use pazar_core::ProductId;

use crate::db::{PageWindow, ProductRepository, VariantRepository};
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{Page, Product, ProductInput, ProductQuery, ProductWithVariants};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/products", get(index).post(create))
        .route(
            "/api/admin/products/{id}",
            get(show).put(update).delete(destroy),
        )
}

#[tracing::instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<Page<Product>>>> {
    let window = PageWindow::new(query.page, query.per_page);
    let (items, total) = ProductRepository::new(state.pool())
        .list(&query, window)
        .await?;

    Ok(ApiResponse::ok(Page {
        items,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}

#[tracing::instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ApiResponse<ProductWithVariants>>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let variants = VariantRepository::new(state.pool())
        .list_for_product(id)
        .await?;

    Ok(ApiResponse::ok(ProductWithVariants { product, variants }))
}

#[tracing::instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>)> {
    input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(product)))
}

#[tracing::instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ApiResponse<Product>>> {
    input.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(ApiResponse::ok(product))
}

#[tracing::instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<ProductId>) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
