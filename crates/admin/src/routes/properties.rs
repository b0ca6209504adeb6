//! Properties, their values, and product types.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};

use pazar_core::{ProductTypeId, PropertyId, PropertyValueId};

use crate::db::{ProductTypeRepository, PropertyRepository};
use crate::error::{ApiResponse, Result};
use crate::extract::{Json, Path};
use crate::models::{
    ProductType, ProductTypeInput, Property, PropertyInput, PropertyValue, PropertyValueInput,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/properties", get(index).post(create))
        .route("/api/admin/properties/{id}", put(update).delete(destroy))
        .route("/api/admin/properties/{id}/values", post(add_value))
        .route("/api/admin/property-values/{id}", delete(destroy_value))
        .route(
            "/api/admin/product-types",
            get(list_types).post(create_type),
        )
        .route(
            "/api/admin/product-types/{id}",
            put(update_type).delete(destroy_type),
        )
}

// =============================================================================
// Properties
// =============================================================================

async fn index(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Property>>>> {
    let properties = PropertyRepository::new(state.pool()).list().await?;
    Ok(ApiResponse::ok(properties))
}

#[tracing::instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    Json(input): Json<PropertyInput>,
) -> Result<(StatusCode, Json<ApiResponse<Property>>)> {
    input.validate()?;
    let property = PropertyRepository::new(state.pool()).create(&input).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(property)))
}

#[tracing::instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
    Json(input): Json<PropertyInput>,
) -> Result<Json<ApiResponse<Property>>> {
    input.validate()?;
    let property = PropertyRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(ApiResponse::ok(property))
}

#[tracing::instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<PropertyId>) -> Result<StatusCode> {
    PropertyRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip(state, input))]
async fn add_value(
    State(state): State<AppState>,
    Path(id): Path<PropertyId>,
    Json(input): Json<PropertyValueInput>,
) -> Result<(StatusCode, Json<ApiResponse<PropertyValue>>)> {
    input.validate()?;
    let value = PropertyRepository::new(state.pool())
        .add_value(id, &input)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(value)))
}

#[tracing::instrument(skip(state))]
async fn destroy_value(
    State(state): State<AppState>,
    Path(id): Path<PropertyValueId>,
) -> Result<StatusCode> {
    PropertyRepository::new(state.pool())
        .delete_value(id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Product types
// =============================================================================

async fn list_types(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ProductType>>>> {
    let types = ProductTypeRepository::new(state.pool()).list().await?;
    Ok(ApiResponse::ok(types))
}

#[tracing::instrument(skip(state, input))]
async fn create_type(
    State(state): State<AppState>,
    Json(input): Json<ProductTypeInput>,
) -> Result<(StatusCode, Json<ApiResponse<ProductType>>)> {
    input.validate()?;
    let product_type = ProductTypeRepository::new(state.pool())
        .create(&input)
        .await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(product_type)))
}

#[tracing::instrument(skip(state, input))]
async fn update_type(
    State(state): State<AppState>,
    Path(id): Path<ProductTypeId>,
    Json(input): Json<ProductTypeInput>,
) -> Result<Json<ApiResponse<ProductType>>> {
    input.validate()?;
    let product_type = ProductTypeRepository::new(state.pool())
        .update(id, &input)
        .await?;
    Ok(ApiResponse::ok(product_type))
}

#[tracing::instrument(skip(state))]
async fn destroy_type(
    State(state): State<AppState>,
    Path(id): Path<ProductTypeId>,
) -> Result<StatusCode> {
    ProductTypeRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
