//! Seed reference data for a fresh store.
//!
//! Safe to run repeatedly: existing settings and product types are left as
//! they are.

use pazar_admin::db::{ProductTypeRepository, PropertyRepository, SettingsRepository};
use pazar_admin::models::{
    ProductTypeInput, PropertyInput, PropertyValueInput, StoreSettings, StoreSettingsInput,
};
use sqlx::PgPool;

use super::{CliError, connect};

const DEMO_PRODUCT_TYPE: &str = "Apparel";

/// Properties of the demo product type with their values, in display order.
const DEMO_PROPERTIES: &[(&str, &[&str])] = &[
    ("Size", &["S", "M", "L", "XL"]),
    ("Color", &["Black", "White"]),
];

/// Insert default store settings and a demo product type.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    seed_settings(&pool).await?;
    seed_product_type(&pool).await?;

    tracing::info!("Seeding complete!");
    Ok(())
}

async fn seed_settings(pool: &PgPool) -> Result<(), CliError> {
    let repo = SettingsRepository::new(pool);
    // No row yet means `get` returned the built-in defaults.
    if repo.get().await?.updated_at.is_some() {
        tracing::info!("Store settings already present, skipping");
        return Ok(());
    }

    repo.upsert(&default_settings_input()).await?;
    tracing::info!("Default store settings inserted");
    Ok(())
}

async fn seed_product_type(pool: &PgPool) -> Result<(), CliError> {
    let types = ProductTypeRepository::new(pool);
    if types
        .list()
        .await?
        .iter()
        .any(|t| t.name.eq_ignore_ascii_case(DEMO_PRODUCT_TYPE))
    {
        tracing::info!(name = DEMO_PRODUCT_TYPE, "Product type already present, skipping");
        return Ok(());
    }

    let product_type = types
        .create(&ProductTypeInput {
            name: DEMO_PRODUCT_TYPE.to_string(),
            description: Some("Demo type for clothing with size and color".to_string()),
        })
        .await?;

    let properties = PropertyRepository::new(pool);
    for (name, values) in DEMO_PROPERTIES {
        let property = properties
            .create(&PropertyInput {
                name: (*name).to_string(),
                description: None,
                product_type_ids: vec![product_type.id],
            })
            .await?;

        for value in *values {
            properties
                .add_value(
                    property.id,
                    &PropertyValueInput {
                        value: (*value).to_string(),
                        sort_order: None,
                    },
                )
                .await?;
        }
        tracing::info!(property = name, values = values.len(), "Property created");
    }

    tracing::info!(id = %product_type.id, name = DEMO_PRODUCT_TYPE, "Demo product type created");
    Ok(())
}

fn default_settings_input() -> StoreSettingsInput {
    let defaults = StoreSettings::default();
    StoreSettingsInput {
        store_name: defaults.store_name,
        logo_url: defaults.logo_url,
        hero_image_url: defaults.hero_image_url,
        primary_color: defaults.primary_color,
        accent_color: defaults.accent_color,
        language: defaults.language,
        currency: defaults.currency,
        banner_text: defaults.banner_text,
        contact_email: defaults.contact_email,
        contact_phone: defaults.contact_phone,
        facebook_url: defaults.facebook_url,
        instagram_url: defaults.instagram_url,
        tiktok_url: defaults.tiktok_url,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        let input = default_settings_input().normalize().unwrap();
        assert_eq!(input.store_name, "Pazar");
    }
}
