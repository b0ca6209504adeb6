//! Store settings and reporting.

use axum::{
    Router,
    extract::State,
    routing::get,
};

use crate::db::{AnalyticsRepository, SettingsRepository};
use crate::error::{ApiResponse, Result};
use crate::extract::{Json, Query};
use crate::models::{AnalyticsQuery, AnalyticsSummary, StoreSettings, StoreSettingsInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/store-settings", get(show).put(update))
        .route("/api/admin/analytics/summary", get(analytics))
}

async fn show(State(state): State<AppState>) -> Result<Json<ApiResponse<StoreSettings>>> {
    let settings = SettingsRepository::new(state.pool()).get().await?;
    Ok(ApiResponse::ok(settings))
}

/// Replace all settings. The storefront picks the change up when its
/// settings cache expires.
#[tracing::instrument(skip(state, input))]
async fn update(
    State(state): State<AppState>,
    Json(input): Json<StoreSettingsInput>,
) -> Result<Json<ApiResponse<StoreSettings>>> {
    let input = input.normalize()?;
    let settings = SettingsRepository::new(state.pool())
        .upsert(&input)
        .await?;
    Ok(ApiResponse::ok(settings))
}

#[tracing::instrument(skip(state))]
async fn analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<ApiResponse<AnalyticsSummary>>> {
    let summary = AnalyticsRepository::new(state.pool())
        .summary(query.days())
        .await?;
    Ok(ApiResponse::ok(summary))
}
