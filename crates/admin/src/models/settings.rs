//! Store settings as edited in the back office.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use pazar_core::{CurrencyCode, Email, FieldError, Phone};

/// Languages the storefront UI ships translations for.
pub const SUPPORTED_LANGUAGES: &[&str] = &["bg", "en"];

const MAX_STORE_NAME_LEN: usize = 100;
const MAX_BANNER_LEN: usize = 300;

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#[0-9a-fA-F]{6}$").expect("hex color regex is valid")
});

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
    pub facebook_url: Option<String>,
    pub instagram_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for StoreSettings {
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
            facebook_url: None,
            instagram_url: None,
            tiktok_url: None,
            updated_at: None,
        }
    }
}

/// Full replacement of the settings row.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettingsInput {
    pub store_name: String,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    pub primary_color: String,
    pub accent_color: String,
    pub language: String,
    pub currency: CurrencyCode,
    #[serde(default)]
    pub banner_text: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub facebook_url: Option<String>,
    #[serde(default)]
    pub instagram_url: Option<String>,
    #[serde(default)]
    pub tiktok_url: Option<String>,
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_url(errors: &mut Vec<FieldError>, field: &'static str, value: Option<&String>) {
    if let Some(v) = value {
        match url::Url::parse(v) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            _ => errors.push(FieldError::new(field, "must be an http(s) URL")),
        }
    }
}

impl StoreSettingsInput {
    /// Trim optional fields, then validate and normalize everything.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn normalize(self) -> Result<Self, Vec<FieldError>> {
        let mut s = Self {
            store_name: self.store_name.trim().to_string(),
            logo_url: blank_to_none(self.logo_url),
            hero_image_url: blank_to_none(self.hero_image_url),
            primary_color: self.primary_color.trim().to_lowercase(),
            accent_color: self.accent_color.trim().to_lowercase(),
            language: self.language.trim().to_lowercase(),
            currency: self.currency,
            banner_text: blank_to_none(self.banner_text),
            contact_email: blank_to_none(self.contact_email),
            contact_phone: blank_to_none(self.contact_phone),
            facebook_url: blank_to_none(self.facebook_url),
            instagram_url: blank_to_none(self.instagram_url),
            tiktok_url: blank_to_none(self.tiktok_url),
        };

        let mut errors = Vec::new();
        let name_len = s.store_name.chars().count();
        if name_len == 0 || name_len > MAX_STORE_NAME_LEN {
            errors.push(FieldError::new(
                "store_name",
                format!("must be 1 to {MAX_STORE_NAME_LEN} characters"),
            ));
        }
        for (field, color) in [
            ("primary_color", &s.primary_color),
            ("accent_color", &s.accent_color),
        ] {
            if !HEX_COLOR.is_match(color) {
                errors.push(FieldError::new(field, "must be a #rrggbb color"));
            }
        }
        if !SUPPORTED_LANGUAGES.contains(&s.language.as_str()) {
            errors.push(FieldError::new("language", "unsupported language"));
        }
        if s
            .banner_text
            .as_ref()
            .is_some_and(|b| b.chars().count() > MAX_BANNER_LEN)
        {
            errors.push(FieldError::new(
                "banner_text",
                format!("must be at most {MAX_BANNER_LEN} characters"),
            ));
        }
        match s.contact_email.as_deref().map(Email::parse) {
            Some(Ok(email)) => s.contact_email = Some(email.into_inner()),
            Some(Err(e)) => errors.push(FieldError::new("contact_email", e.to_string())),
            None => {}
        }
        match s.contact_phone.as_deref().map(Phone::parse) {
            Some(Ok(phone)) => s.contact_phone = Some(phone.as_str().to_string()),
            Some(Err(e)) => errors.push(FieldError::new("contact_phone", e.to_string())),
            None => {}
        }
        check_url(&mut errors, "logo_url", s.logo_url.as_ref());
        check_url(&mut errors, "hero_image_url", s.hero_image_url.as_ref());
        check_url(&mut errors, "facebook_url", s.facebook_url.as_ref());
        check_url(&mut errors, "instagram_url", s.instagram_url.as_ref());
        check_url(&mut errors, "tiktok_url", s.tiktok_url.as_ref());

        if errors.is_empty() { Ok(s) } else { Err(errors) }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input() -> StoreSettingsInput {
        StoreSettingsInput {
            store_name: " Pazar Shop ".to_string(),
            logo_url: Some(String::new()),
            hero_image_url: None,
            primary_color: "#1A2B3C".to_string(),
            accent_color: "#ffffff".to_string(),
            language: "BG".to_string(),
            currency: CurrencyCode::EUR,
            banner_text: None,
            contact_email: Some(" Shop@Example.com ".to_string()),
            contact_phone: Some("0888 123 456".to_string()),
            facebook_url: Some("https://facebook.com/pazar".to_string()),
            instagram_url: None,
            tiktok_url: None,
        }
    }

    #[test]
    fn test_normalize_valid_settings() {
        let s = input().normalize().unwrap();
        assert_eq!(s.store_name, "Pazar Shop");
        assert_eq!(s.logo_url, None);
        assert_eq!(s.primary_color, "#1a2b3c");
        assert_eq!(s.language, "bg");
        assert_eq!(s.contact_email.as_deref(), Some("shop@example.com"));
        assert_eq!(s.contact_phone.as_deref(), Some("+359888123456"));
    }

    #[test]
    fn test_normalize_collects_errors() {
        let mut bad = input();
        bad.primary_color = "red".to_string();
        bad.language = "de".to_string();
        bad.facebook_url = Some("javascript:alert(1)".to_string());
        bad.contact_phone = Some("12345".to_string());
        let fields: Vec<_> = bad
            .normalize()
            .unwrap_err()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec!["primary_color", "language", "contact_phone", "facebook_url"]
        );
    }
}
