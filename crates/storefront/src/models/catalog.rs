//! Catalog read models served to shoppers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use pazar_core::{Price, ProductId, ProductTypeId, PropertyId, PropertyValueId, VariantId};

/// Public URL for a stored image reference.
///
/// Admin uploads are stored as absolute URLs and pass through unchanged.
/// Anything else is a path inside the media directory, with or without a
/// leading `/media/`.
#[must_use]
pub fn media_url(media_base_url: &str, stored: &str) -> String {
    if stored.starts_with("http://") || stored.starts_with("https://") || stored.starts_with("//")
    {
        return stored.to_string();
    }
    let path = stored.trim_start_matches('/');
    let path = path.strip_prefix("media/").unwrap_or(path);
    format!("{}/{path}", media_base_url.trim_end_matches('/'))
}

pub(crate) fn resolve(media_base_url: &str, image: &mut Option<String>) {
    if let Some(stored) = image.as_deref() {
        *image = Some(media_url(media_base_url, stored));
    }
}

/// A product as it appears in listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub product_type_id: Option<ProductTypeId>,
    pub product_type: Option<String>,
    pub is_featured: bool,
    /// Lowest price among visible variants.
    pub price_from: Price,
    pub image_url: Option<String>,
    pub in_stock: bool,
}

impl ProductSummary {
    /// Rewrite the image reference against the public media URL.
    pub fn resolve_media(&mut self, media_base_url: &str) {
        resolve(media_base_url, &mut self.image_url);
    }
}

/// A product page: the product, its visible variants and the selectable options.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub product_type_id: Option<ProductTypeId>,
    pub product_type: Option<String>,
    pub is_featured: bool,
    pub options: Vec<ProductOption>,
    pub variants: Vec<VariantView>,
    pub created_at: DateTime<Utc>,
}

impl ProductDetail {
    /// Rewrite every variant image against the public media URL.
    pub fn resolve_media(&mut self, media_base_url: &str) {
        for variant in &mut self.variants {
            resolve(media_base_url, &mut variant.image_url);
        }
    }
}

/// A purchasable variant.
#[derive(Debug, Clone, Serialize)]
pub struct VariantView {
    pub id: VariantId,
    pub sku: String,
    pub price: Price,
    pub quantity: i32,
    pub in_stock: bool,
    pub image_url: Option<String>,
    pub is_primary_image: bool,
    pub options: Vec<VariantOption>,
}

/// One property assignment of a variant, e.g. `Color = Red`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOption {
    pub property_id: PropertyId,
    pub property: String,
    pub value_id: PropertyValueId,
    pub value: String,
}

/// A property with every value used by at least one visible variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductOption {
    pub property_id: PropertyId,
    pub name: String,
    pub values: Vec<OptionValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionValue {
    pub id: PropertyValueId,
    pub value: String,
}

/// Gather the selectable options of a product from its variants.
///
/// Properties keep the order of first appearance, as do their values.
#[must_use]
pub fn collect_options(variants: &[VariantView]) -> Vec<ProductOption> {
    let mut options: Vec<ProductOption> = Vec::new();
    for variant in variants {
        for opt in &variant.options {
            let idx = match options.iter().position(|o| o.property_id == opt.property_id) {
                Some(idx) => idx,
                None => {
                    options.push(ProductOption {
                        property_id: opt.property_id,
                        name: opt.property.clone(),
                        values: Vec::new(),
                    });
                    options.len() - 1
                }
            };
            if let Some(option) = options.get_mut(idx)
                && !option.values.iter().any(|v| v.id == opt.value_id)
            {
                option.values.push(OptionValue {
                    id: opt.value_id,
                    value: opt.value.clone(),
                });
            }
        }
    }
    options
}

/// A category shoppers can filter by.
#[derive(Debug, Clone, Serialize)]
pub struct ProductTypeView {
    pub id: ProductTypeId,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
}

/// Query parameters for product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub product_type_id: Option<ProductTypeId>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// A page of results.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}

/// Current price and stock of a variant, used to price a cart.
#[derive(Debug, Clone)]
pub struct VariantStock {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub price: Decimal,
    pub quantity: i32,
    pub is_visible: bool,
    pub image_url: Option<String>,
}
