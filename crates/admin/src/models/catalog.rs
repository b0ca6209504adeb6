//! Catalog entities as managed by the back office: products, variants,
//! properties and product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pazar_core::{
    FieldError, OptionSet, ProductId, ProductTypeId, PropertyId, PropertyValueId, VariantId,
};

const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 64;
const MAX_DESCRIPTION_LEN: usize = 20_000;

/// Upper bound for a stock level and for one adjustment.
pub const MAX_STOCK: i32 = 1_000_000;

fn check_required(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    let len = value.trim().chars().count();
    if len == 0 {
        errors.push(FieldError::new(field, "is required"));
    } else if len > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

fn check_sku(errors: &mut Vec<FieldError>, sku: &str) {
    check_required(errors, "sku", sku, MAX_SKU_LEN);
    if sku
        .trim()
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        errors.push(FieldError::new(
            "sku",
            "may only contain letters, digits, '-', '_' and '.'",
        ));
    }
}

fn into_result(errors: Vec<FieldError>) -> Result<(), Vec<FieldError>> {
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

// =============================================================================
// Products
// =============================================================================

/// A product row with aggregate variant information.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub product_type_id: Option<ProductTypeId>,
    pub product_type: Option<String>,
    pub is_featured: bool,
    pub variant_count: i64,
    pub total_stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product with its variants.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: Product,
    pub variants: Vec<Variant>,
}

/// Create/update payload for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_type_id: Option<ProductTypeId>,
    #[serde(default)]
    pub is_featured: bool,
}

impl ProductInput {
    /// Check field lengths and SKU characters.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_required(&mut errors, "name", &self.name, MAX_NAME_LEN);
        check_sku(&mut errors, &self.sku);
        if self
            .description
            .as_ref()
            .is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN)
        {
            errors.push(FieldError::new("description", "is too long"));
        }
        into_result(errors)
    }
}

/// Filters for the product list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<i32>,
    pub featured: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

// =============================================================================
// Variants
// =============================================================================

/// One property/value pair of a variant, with labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantOption {
    pub property_id: PropertyId,
    pub property: String,
    pub value_id: PropertyValueId,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Variant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub sku: String,
    pub price: Decimal,
    pub quantity: i32,
    pub is_visible: bool,
    pub image_url: Option<String>,
    pub is_primary_image: bool,
    pub options: Vec<VariantOption>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a property value when creating a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRef {
    pub property_id: PropertyId,
    pub value_id: PropertyValueId,
}

fn default_true() -> bool {
    true
}

/// Create/update payload for a variant.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    pub sku: String,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_primary_image: bool,
    #[serde(default)]
    pub options: Vec<OptionRef>,
}

impl VariantInput {
    /// Check SKU, price, quantity and that no property repeats.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_sku(&mut errors, &self.sku);
        check_price(&mut errors, self.price);
        check_quantity(&mut errors, self.quantity);
        let mut seen: Vec<PropertyId> = Vec::with_capacity(self.options.len());
        for option in &self.options {
            if seen.contains(&option.property_id) {
                errors.push(FieldError::new(
                    "options",
                    format!("property {} listed twice", option.property_id),
                ));
            }
            seen.push(option.property_id);
        }
        into_result(errors)
    }
}

fn check_price(errors: &mut Vec<FieldError>, price: Decimal) {
    if price.is_sign_negative() {
        errors.push(FieldError::new("price", "must not be negative"));
    } else if price.scale() > 2 && price.round_dp(2) != price {
        errors.push(FieldError::new("price", "must have at most 2 decimal places"));
    }
}

/// Request to create every combination of the chosen property values.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateVariantsRequest {
    pub option_sets: Vec<OptionSet>,
    pub price: Decimal,
    #[serde(default)]
    pub quantity: i32,
    /// SKU base; defaults to the product SKU.
    #[serde(default)]
    pub sku_base: Option<String>,
}

impl GenerateVariantsRequest {
    /// Check price and quantity.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_price(&mut errors, self.price);
        check_quantity(&mut errors, self.quantity);
        into_result(errors)
    }
}

/// Outcome of variant generation.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedVariants {
    pub created: Vec<Variant>,
    /// Combinations that already existed on the product.
    pub skipped: usize,
}

fn check_quantity(errors: &mut Vec<FieldError>, quantity: i32) {
    if quantity < 0 {
        errors.push(FieldError::new("quantity", "must not be negative"));
    } else if quantity > MAX_STOCK {
        errors.push(FieldError::new("quantity", format!("must be at most {MAX_STOCK}")));
    }
}

/// Stock change: either an absolute level or a relative adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockChange {
    Set(i32),
    Adjust(i32),
}

impl StockChange {
    /// # Errors
    ///
    /// Returns a field error for a negative level, or for a level or
    /// adjustment larger than [`MAX_STOCK`].
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        match *self {
            Self::Set(n) if n < 0 => Err(vec![FieldError::new("set", "must not be negative")]),
            Self::Set(n) if n > MAX_STOCK => Err(vec![FieldError::new(
                "set",
                format!("must be at most {MAX_STOCK}"),
            )]),
            Self::Adjust(delta) if delta.unsigned_abs() > MAX_STOCK.unsigned_abs() => {
                Err(vec![FieldError::new(
                    "adjust",
                    format!("must be between -{MAX_STOCK} and {MAX_STOCK}"),
                )])
            }
            _ => Ok(()),
        }
    }
}

/// A variant at or below the low-stock threshold.
#[derive(Debug, Clone, Serialize)]
pub struct LowStockItem {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub is_visible: bool,
}

// =============================================================================
// Properties & product types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PropertyValue {
    pub id: PropertyValueId,
    pub value: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<PropertyValue>,
    pub product_type_ids: Vec<ProductTypeId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub product_type_ids: Vec<ProductTypeId>,
}

impl PropertyInput {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_required(&mut errors, "name", &self.name, MAX_NAME_LEN);
        into_result(errors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyValueInput {
    pub value: String,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl PropertyValueInput {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_required(&mut errors, "value", &self.value, MAX_NAME_LEN);
        into_result(errors)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub name: String,
    pub description: Option<String>,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductTypeInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl ProductTypeInput {
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_required(&mut errors, "name", &self.name, MAX_NAME_LEN);
        into_result(errors)
    }
}
