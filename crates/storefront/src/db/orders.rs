//! Order placement.
//!
//! Placing an order is one transaction: lock the variants, price the cart,
//! apply and count the discount, insert the order and its items, then take
//! the units out of stock. Any failure rolls everything back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use pazar_core::checkout::DeliveryDetails;
use pazar_core::{
    DiscountError, OrderId, OrderStatus, OrderTotals, ValidCheckout, VariantId, delivery_cost,
};

use super::{RepositoryError, catalog, discounts};
use crate::models::{CartIssue, CartSummary, PlacedOrder, price_cart};

/// Reasons checkout can refuse to create an order.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("cart cannot be ordered: {}", describe_issues(.0))]
    Cart(Vec<CartIssue>),

    #[error("unknown discount code")]
    UnknownDiscount,

    #[error(transparent)]
    Discount(#[from] DiscountError),
}

fn describe_issues(issues: &[CartIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Refuse a priced cart with issues or nothing left to buy.
fn ensure_orderable(cart: CartSummary) -> Result<CartSummary, OrderError> {
    if cart.is_orderable() {
        Ok(cart)
    } else {
        Err(OrderError::Cart(cart.issues))
    }
}

impl From<sqlx::Error> for OrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for creating orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order from a validated checkout.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Cart` when a variant is unavailable or short on
    /// stock, `OrderError::UnknownDiscount` / `OrderError::Discount` when the
    /// discount code cannot be applied, and `OrderError::Repository` for
    /// database failures.
    #[tracing::instrument(skip(self, checkout), fields(lines = checkout.lines.len()))]
    pub async fn place_order(
        &self,
        checkout: &ValidCheckout,
        now: DateTime<Utc>,
    ) -> Result<PlacedOrder, OrderError> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<VariantId> = checkout.lines.iter().map(|l| l.variant_id).collect();
        let stock = catalog::lock_variant_stock(&mut tx, &ids).await?;
        let cart = ensure_orderable(price_cart(&checkout.lines, &stock))?;

        let (discount_id, discount_amount) = match checkout.discount_code.as_deref() {
            Some(code) => {
                let (id, rule) = discounts::lock_by_code(&mut tx, code)
                    .await?
                    .ok_or(OrderError::UnknownDiscount)?;
                let amount = rule.evaluate(now, cart.subtotal)?;
                if !discounts::record_use(&mut tx, id).await? {
                    return Err(DiscountError::UsageLimitReached.into());
                }
                (Some(id), amount)
            }
            None => (None, Decimal::ZERO),
        };

        let method = checkout.delivery.method();
        let totals = OrderTotals::compute(cart.subtotal, discount_amount, delivery_cost(method));

        let (office_code, city, address, postal_code) = match &checkout.delivery {
            DeliveryDetails::EcontOffice { office_code } => {
                (Some(office_code.as_str()), None, None, None)
            }
            DeliveryDetails::EcontAddress {
                city,
                address,
                postal_code,
            } => (
                None,
                Some(city.as_str()),
                Some(address.as_str()),
                postal_code.as_deref(),
            ),
            DeliveryDetails::Pickup => (None, None, None, None),
        };

        let (order_id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO orders (
                customer_name, email, phone, delivery_method, econt_office_code,
                city, address, postal_code, note, discount_id, discount_code,
                subtotal, discount_amount, delivery_cost, total, status, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $17)
            RETURNING id, created_at
            ",
        )
        .bind(&checkout.customer_name)
        .bind(checkout.email.as_str())
        .bind(checkout.phone.as_str())
        .bind(method.as_str())
        .bind(office_code)
        .bind(city)
        .bind(address)
        .bind(postal_code)
        .bind(checkout.note.as_deref())
        .bind(discount_id.map(|id| id.as_i32()))
        .bind(checkout.discount_code.as_deref())
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.delivery)
        .bind(totals.total)
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        for line in &cart.lines {
            let quantity = i32::try_from(line.quantity).map_err(|_| {
                RepositoryError::DataCorruption(format!("quantity out of range: {}", line.quantity))
            })?;

            sqlx::query(
                r"
                INSERT INTO order_items (order_id, variant_id, product_name, sku, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(order_id)
            .bind(line.variant_id.as_i32())
            .bind(&line.product_name)
            .bind(&line.sku)
            .bind(line.unit_price)
            .bind(quantity)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r"
                UPDATE product_variants
                SET quantity = quantity - $2, updated_at = NOW()
                WHERE id = $1 AND quantity >= $2
                ",
            )
            .bind(line.variant_id.as_i32())
            .bind(quantity)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() != 1 {
                return Err(OrderError::Cart(vec![CartIssue::InsufficientStock {
                    variant_id: line.variant_id,
                    requested: line.quantity,
                    available: line.available,
                }]));
            }
        }

        tx.commit().await?;

        tracing::info!(
            order_id,
            total = %totals.total,
            delivery = %method,
            discounted = discount_id.is_some(),
            "Order placed"
        );

        Ok(PlacedOrder {
            id: OrderId::new(order_id),
            status: OrderStatus::Pending,
            delivery_method: method,
            discount_code: checkout.discount_code.clone(),
            totals,
            lines: cart.lines,
            created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pazar_core::{CartLine, ProductId};

    use super::*;
    use crate::models::VariantStock;

    fn stock(id: i32, quantity: i32) -> VariantStock {
        VariantStock {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(id),
            product_name: "Mug".to_string(),
            sku: format!("MUG-{id}"),
            price: Decimal::new(1250, 2),
            quantity,
            is_visible: true,
            image_url: None,
        }
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_orderable_cart_passes() {
        let cart = ensure_orderable(price_cart(&[line(1, 2)], &[stock(1, 5)])).unwrap();
        assert_eq!(cart.item_count, 2);
    }

    #[test]
    fn test_short_stock_is_refused() {
        let err = ensure_orderable(price_cart(&[line(1, 9)], &[stock(1, 5)])).unwrap_err();
        assert!(matches!(err, OrderError::Cart(issues) if issues.len() == 1));
    }

    #[test]
    fn test_empty_cart_is_refused() {
        let err = ensure_orderable(price_cart(&[], &[])).unwrap_err();
        assert!(matches!(err, OrderError::Cart(_)));
    }
}
