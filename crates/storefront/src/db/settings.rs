//! Store settings (single row with `id = 1`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pazar_core::CurrencyCode;

use super::RepositoryError;
use crate::models::{SocialLinks, StoreSettings};

#[derive(Debug, sqlx::FromRow)]
struct StoreSettingsRow {
    store_name: String,
    logo_url: Option<String>,
    hero_image_url: Option<String>,
    primary_color: String,
    accent_color: String,
    language: String,
    currency: String,
    banner_text: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    facebook_url: Option<String>,
    instagram_url: Option<String>,
    tiktok_url: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StoreSettingsRow> for StoreSettings {
    type Error = RepositoryError;

    fn try_from(row: StoreSettingsRow) -> Result<Self, Self::Error> {
        let currency = row
            .currency
            .parse::<CurrencyCode>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            store_name: row.store_name,
            logo_url: row.logo_url,
            hero_image_url: row.hero_image_url,
            primary_color: row.primary_color,
            accent_color: row.accent_color,
            language: row.language,
            currency,
            banner_text: row.banner_text,
            contact_email: row.contact_email,
            contact_phone: row.contact_phone,
            social: SocialLinks {
                facebook: row.facebook_url,
                instagram: row.instagram_url,
                tiktok: row.tiktok_url,
            },
            updated_at: Some(row.updated_at),
        })
    }
}

/// Repository for reading store settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the store settings, falling back to defaults when none were saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<StoreSettings, RepositoryError> {
        let row = sqlx::query_as::<_, StoreSettingsRow>(
            r"
            SELECT store_name, logo_url, hero_image_url, primary_color, accent_color,
                   language, currency, banner_text, contact_email, contact_phone,
                   facebook_url, instagram_url, tiktok_url, updated_at
            FROM store_settings
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool)
        .await?;

        row.map_or_else(|| Ok(StoreSettings::default()), StoreSettings::try_from)
    }
}
