//! Store settings (single row with `id = 1`).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pazar_core::CurrencyCode;

use super::RepositoryError;
use crate::models::{StoreSettings, StoreSettingsInput};

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
            facebook_url: row.facebook_url,
            instagram_url: row.instagram_url,
            tiktok_url: row.tiktok_url,
            updated_at: Some(row.updated_at),
        })
    }
}

const COLUMNS: &str = r"
    store_name, logo_url, hero_image_url, primary_color, accent_color, language,
    currency, banner_text, contact_email, contact_phone, facebook_url,
    instagram_url, tiktok_url, updated_at
";

/// Repository for reading and replacing store settings.
pub struct SettingsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SettingsRepository<'a> {
    /// Create a new settings repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current settings, or the defaults if the row was never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for an unknown currency.
    pub async fn get(&self) -> Result<StoreSettings, RepositoryError> {
        let sql = format!("SELECT {COLUMNS} FROM store_settings WHERE id = 1");
        let row = sqlx::query_as::<_, StoreSettingsRow>(&sql)
            .fetch_optional(self.pool)
            .await?;
        row.map_or_else(|| Ok(StoreSettings::default()), StoreSettings::try_from)
    }

    /// Replace the settings row with normalized input.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    #[tracing::instrument(skip_all)]
    pub async fn upsert(&self, input: &StoreSettingsInput) -> Result<StoreSettings, RepositoryError> {
        let sql = format!(
            r"
            INSERT INTO store_settings (
                id, store_name, logo_url, hero_image_url, primary_color, accent_color,
                language, currency, banner_text, contact_email, contact_phone,
                facebook_url, instagram_url, tiktok_url, updated_at
            )
            VALUES (1, $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, NOW())
            ON CONFLICT (id) DO UPDATE SET
                store_name = EXCLUDED.store_name,
                logo_url = EXCLUDED.logo_url,
                hero_image_url = EXCLUDED.hero_image_url,
                primary_color = EXCLUDED.primary_color,
                accent_color = EXCLUDED.accent_color,
                language = EXCLUDED.language,
                currency = EXCLUDED.currency,
                banner_text = EXCLUDED.banner_text,
                contact_email = EXCLUDED.contact_email,
                contact_phone = EXCLUDED.contact_phone,
                facebook_url = EXCLUDED.facebook_url,
                instagram_url = EXCLUDED.instagram_url,
                tiktok_url = EXCLUDED.tiktok_url,
                updated_at = NOW()
            RETURNING {COLUMNS}
            "
        );

        let row = sqlx::query_as::<_, StoreSettingsRow>(&sql)
            .bind(&input.store_name)
            .bind(input.logo_url.as_deref())
            .bind(input.hero_image_url.as_deref())
            .bind(&input.primary_color)
            .bind(&input.accent_color)
            .bind(&input.language)
            .bind(input.currency.code())
            .bind(input.banner_text.as_deref())
            .bind(input.contact_email.as_deref())
            .bind(input.contact_phone.as_deref())
            .bind(input.facebook_url.as_deref())
            .bind(input.instagram_url.as_deref())
            .bind(input.tiktok_url.as_deref())
            .fetch_one(self.pool)
            .await?;

        tracing::info!("Store settings updated");
        StoreSettings::try_from(row)
    }
}
