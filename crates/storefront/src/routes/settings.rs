//! Public store settings (branding, contacts, social links).

use axum::{Router, extract::State, routing::get};

use crate::db::SettingsRepository;
use crate::error::{ApiResponse, Result};
use crate::extract::Json;
use crate::models::StoreSettings;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/store-settings", get(show))
}

/// Current store settings, cached for a minute.
pub async fn show(State(state): State<AppState>) -> Result<Json<ApiResponse<StoreSettings>>> {
    if let Some(settings) = state.settings_cache().get(&()).await {
        return Ok(ApiResponse::ok(settings));
    }

    let mut settings = SettingsRepository::new(state.pool()).get().await?;
    settings.resolve_media(&state.config().media_base_url);
    state.settings_cache().insert((), settings.clone()).await;
    Ok(ApiResponse::ok(settings))
}
