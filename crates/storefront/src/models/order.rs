//! Orders as created by checkout.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pazar_core::{DeliveryMethod, OrderId, OrderStatus, OrderTotals};

use super::cart::PricedLine;

/// Confirmation returned to the shopper after a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub discount_code: Option<String>,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub lines: Vec<PricedLine>,
    pub created_at: DateTime<Utc>,
}
