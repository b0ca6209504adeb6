//! Request and response types for the back-office API.

pub mod analytics;
pub mod catalog;
pub mod discount;
pub mod media;
pub mod order;
pub mod settings;

use serde::Serialize;

pub use analytics::{AnalyticsQuery, AnalyticsSummary, DailyPoint, StatusCount, TopProduct};
pub use catalog::{
    GenerateVariantsRequest, GeneratedVariants, LowStockItem, OptionRef, Product, ProductInput,
    ProductQuery, ProductType, ProductTypeInput, ProductWithVariants, Property, PropertyInput,
    PropertyValue, PropertyValueInput, StockChange, Variant, VariantInput, VariantOption,
};
pub use discount::{Discount, DiscountInput, DiscountQuery, GenerateCodeQuery};
pub use media::{BulkDeleteReport, BulkDeleteRequest, MediaFile, MediaQuery, NewMediaFile};
pub use order::{
    Customer, CustomerQuery, OrderDetail, OrderItem, OrderQuery, OrderSummary,
    StatusChangeRequest,
};
pub use settings::{StoreSettings, StoreSettingsInput};

/// One page of a list, with the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
}
