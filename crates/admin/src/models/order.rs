//! Orders and customers as seen by the back office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pazar_core::{DeliveryMethod, OrderId, OrderItemId, OrderStatus, VariantId};

/// Row in the order list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub total: Decimal,
    pub item_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// `None` once the variant has been deleted.
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    pub id: OrderId,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_method: DeliveryMethod,
    pub econt_office_code: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub note: Option<String>,
    pub discount_code: Option<String>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub delivery_cost: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub stock_released: bool,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusChangeRequest {
    pub status: OrderStatus,
}

/// Customer aggregated from orders by email address.
#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub email: String,
    /// Name and phone from the most recent order.
    pub name: String,
    pub phone: String,
    pub order_count: i64,
    /// Excludes cancelled orders.
    pub total_spent: Decimal,
    pub first_order_at: DateTime<Utc>,
    pub last_order_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerQuery {
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}
