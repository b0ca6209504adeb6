//! Discount code management.

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use pazar_core::{DiscountId, generate_code};

use crate::db::DiscountRepository;
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::discount::GENERATED_CODE_LEN;
use crate::models::{Discount, DiscountInput, DiscountQuery, GenerateCodeQuery};
use crate::state::AppState;

/// Attempts at finding an unused random code before giving up.
const GENERATE_ATTEMPTS: usize = 5;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/discounts", get(index).post(create))
        .route("/api/admin/discounts/generate-code", post(generate))
        .route(
            "/api/admin/discounts/{id}",
            get(show).put(update).delete(destroy),
        )
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<DiscountQuery>,
) -> Result<Json<ApiResponse<Vec<Discount>>>> {
    let discounts = DiscountRepository::new(state.pool()).list(&query).await?;
    Ok(ApiResponse::ok(discounts))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<DiscountId>,
) -> Result<Json<ApiResponse<Discount>>> {
    let discount = DiscountRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("discount {id}")))?;
    Ok(ApiResponse::ok(discount))
}

#[tracing::instrument(skip(state, input))]
async fn create(
    State(state): State<AppState>,
    Json(input): Json<DiscountInput>,
) -> Result<(StatusCode, Json<ApiResponse<Discount>>)> {
    let rule = input.into_rule(0)?;
    let discount = DiscountRepository::new(state.pool()).create(&rule).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(discount)))
}

/// Replace a discount's definition, keeping how often it has been used.
#[tracing::instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Path(id): Path<DiscountId>,
    Json(input): Json<DiscountInput>,
) -> Result<Json<ApiResponse<Discount>>> {
    let repo = DiscountRepository::new(state.pool());
    let current = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("discount {id}")))?;

    let rule = input.into_rule(current.rule.usage_count)?;
    let discount = repo.update(id, &rule).await?;
    Ok(ApiResponse::ok(discount))
}

#[tracing::instrument(skip(state))]
async fn destroy(State(state): State<AppState>, Path(id): Path<DiscountId>) -> Result<StatusCode> {
    DiscountRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct GeneratedCode {
    code: String,
}

/// Suggest a random code that is not in use yet.
async fn generate(
    State(state): State<AppState>,
    Query(query): Query<GenerateCodeQuery>,
) -> Result<Json<ApiResponse<GeneratedCode>>> {
    let len = query.length.unwrap_or(GENERATED_CODE_LEN);
    let repo = DiscountRepository::new(state.pool());

    for _ in 0..GENERATE_ATTEMPTS {
        let code = generate_code(len);
        if !repo.code_exists(&code).await? {
            return Ok(ApiResponse::ok(GeneratedCode { code }));
        }
    }
    Err(AppError::Internal(
        "could not find an unused discount code".to_string(),
    ))
}
