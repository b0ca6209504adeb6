//! Econt office lookup for the checkout form.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use crate::econt::{DEFAULT_SEARCH_LIMIT, EcontOffice};
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/econt/offices", get(search))
        .route("/api/econt/offices/{code}", get(show))
        .route("/api/econt/cities", get(cities))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub city: Option<String>,
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// Offices filtered by city and free text.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<EcontOffice>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, DEFAULT_SEARCH_LIMIT);
    let offices = state
        .econt()
        .search(query.city.as_deref(), query.q.as_deref(), limit)
        .into_iter()
        .cloned()
        .collect();
    ApiResponse::ok(offices)
}

/// A single office by code.
pub async fn show(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<EcontOffice>>> {
    state
        .econt()
        .find(&code)
        .cloned()
        .map(ApiResponse::ok)
        .ok_or_else(|| AppError::NotFound(format!("Econt office {code}")))
}

/// Cities that have at least one office.
pub async fn cities(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    ApiResponse::ok(state.econt().cities().into_iter().map(String::from).collect())
}
