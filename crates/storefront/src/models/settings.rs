//! Public store settings: branding, theme and contact details.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pazar_core::CurrencyCode;

#[derive(Debug, Clone, Serialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub logo_url: Option<String>,
    pub hero_image_url: Option<String>,
    pub primary_color: String,
    pub accent_color: String,
    pub language: String,
    pub currency: CurrencyCode,
    pub banner_text: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub social: SocialLinks,
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoreSettings {
    /// Rewrite the logo and hero image against the public media URL.
    pub fn resolve_media(&mut self, media_base_url: &str) {
        super::catalog::resolve(media_base_url, &mut self.logo_url);
        super::catalog::resolve(media_base_url, &mut self.hero_image_url);
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialLinks {
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub tiktok: Option<String>,
}

impl Default for StoreSettings {
    /// Settings used before an admin has saved any.
    fn default() -> Self {
        Self {
            store_name: "Pazar".to_string(),
            logo_url: None,
            hero_image_url: None,
            primary_color: "#111827".to_string(),
            accent_color: "#f59e0b".to_string(),
            language: "bg".to_string(),
            currency: CurrencyCode::default(),
            banner_text: None,
            contact_email: None,
            contact_phone: None,
            social: SocialLinks::default(),
            updated_at: None,
        }
    }
}
