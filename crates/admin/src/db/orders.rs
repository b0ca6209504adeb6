//! Order list, detail and status changes.
//!
//! Stock was taken when the order was placed. Cancelling gives it back,
//! guarded by `orders.stock_released` so a retried request cannot release
//! the same order twice.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pazar_core::{DeliveryMethod, OrderId, OrderItemId, OrderStatus, VariantId};

use super::{PageWindow, RepositoryError, contains_pattern};
use crate::models::{OrderDetail, OrderItem, OrderQuery, OrderSummary};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Status (`$1`) and search (`$2` pattern, `$3` order number) filter.
const ORDER_FILTER: &str = r"
    WHERE ($1::TEXT IS NULL OR o.status = $1)
      AND ($2::TEXT IS NULL
           OR o.customer_name ILIKE $2 OR o.email ILIKE $2 OR o.phone ILIKE $2
           OR o.id = $3)
";

fn parse_status(value: &str) -> Result<OrderStatus, RepositoryError> {
    value
        .parse::<OrderStatus>()
        .map_err(RepositoryError::DataCorruption)
}

fn parse_method(value: &str) -> Result<DeliveryMethod, RepositoryError> {
    value
        .parse::<DeliveryMethod>()
        .map_err(RepositoryError::DataCorruption)
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    customer_name: String,
    email: String,
    phone: String,
    status: String,
    delivery_method: String,
    total: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
    total_count: i64,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            customer_name: row.customer_name,
            email: row.email,
            phone: row.phone,
            status: parse_status(&row.status)?,
            delivery_method: parse_method(&row.delivery_method)?,
            total: row.total,
            item_count: row.item_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    customer_name: String,
    email: String,
    phone: String,
    delivery_method: String,
    econt_office_code: Option<String>,
    city: Option<String>,
    address: Option<String>,
    postal_code: Option<String>,
    note: Option<String>,
    discount_code: Option<String>,
    subtotal: Decimal,
    discount_amount: Decimal,
    delivery_cost: Decimal,
    total: Decimal,
    status: String,
    stock_released: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    variant_id: Option<i32>,
    product_name: String,
    sku: String,
    unit_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            variant_id: row.variant_id.map(VariantId::new),
            product_name: row.product_name,
            sku: row.sku,
            unit_price: row.unit_price,
            quantity: row.quantity,
            line_total: row.line_total,
        }
    }
}

impl OrderRow {
    fn into_detail(self, items: Vec<OrderItem>) -> Result<OrderDetail, RepositoryError> {
        Ok(OrderDetail {
            id: OrderId::new(self.id),
            customer_name: self.customer_name,
            email: self.email,
            phone: self.phone,
            delivery_method: parse_method(&self.delivery_method)?,
            econt_office_code: self.econt_office_code,
            city: self.city,
            address: self.address,
            postal_code: self.postal_code,
            note: self.note,
            discount_code: self.discount_code,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            delivery_cost: self.delivery_cost,
            total: self.total,
            status: parse_status(&self.status)?,
            stock_released: self.stock_released,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

async fn fetch_detail(
    conn: &mut PgConnection,
    id: i32,
) -> Result<Option<OrderDetail>, RepositoryError> {
    let Some(order) = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, customer_name, email, phone, delivery_method, econt_office_code,
               city, address, postal_code, note, discount_code, subtotal,
               discount_amount, delivery_cost, total, status, stock_released,
               created_at, updated_at
        FROM orders
        WHERE id = $1
        ",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, variant_id, product_name, sku, unit_price, quantity, line_total
        FROM order_items
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    order
        .into_detail(items.into_iter().map(OrderItem::from).collect())
        .map(Some)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for back-office order management.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, newest first. `q` matches name, email, phone or the
    /// order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for unknown status or
    /// delivery values in the database.
    pub async fn list(
        &self,
        query: &OrderQuery,
        window: PageWindow,
    ) -> Result<(Vec<OrderSummary>, i64), RepositoryError> {
        let term = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let order_number = term.and_then(|t| t.trim_start_matches('#').parse::<i32>().ok());

        let status = query.status.map(|s| s.as_str());
        let search = term.map(contains_pattern);

        let sql = format!(
            r"
            SELECT o.id, o.customer_name, o.email, o.phone, o.status, o.delivery_method,
                   o.total,
                   (SELECT COALESCE(SUM(i.quantity), 0)::BIGINT
                      FROM order_items i WHERE i.order_id = o.id) AS item_count,
                   o.created_at,
                   COUNT(*) OVER () AS total_count
            FROM orders o
            {ORDER_FILTER}
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $4 OFFSET $5
            "
        );
        let rows = sqlx::query_as::<_, OrderSummaryRow>(&sql)
            .bind(status)
            .bind(search.as_deref())
            .bind(order_number)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        let total = match window.window_total(rows.first().map(|r| r.total_count)) {
            Some(total) => total,
            None => {
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders o {ORDER_FILTER}"))
                    .bind(status)
                    .bind(search.as_deref())
                    .bind(order_number)
                    .fetch_one(self.pool)
                    .await?
            }
        };
        let orders = rows
            .into_iter()
            .map(OrderSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((orders, total))
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_detail(&mut conn, id.as_i32()).await
    }

    /// Move an order to `next`.
    ///
    /// Moving to `Cancelled` returns each item's quantity to its variant,
    /// once per order. Items whose variant has been deleted are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order and
    /// `RepositoryError::Conflict` when the transition is not allowed.
    #[tracing::instrument(skip(self), fields(order_id = %id, next = %next))]
    pub async fn change_status(
        &self,
        id: OrderId,
        next: OrderStatus,
    ) -> Result<OrderDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let current = parse_status(&current.ok_or(RepositoryError::NotFound)?)?;

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot change order status from {current} to {next}"
            )));
        }

        sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id.as_i32())
            .bind(next.as_str())
            .execute(&mut *tx)
            .await?;

        if !next.holds_stock() {
            release_stock(&mut tx, id.as_i32()).await?;
        }

        let detail = fetch_detail(&mut tx, id.as_i32())
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        tracing::info!(from = %current, "Order status changed");
        Ok(detail)
    }
}

/// Return an order's quantities to stock unless that already happened.
async fn release_stock(conn: &mut PgConnection, order_id: i32) -> Result<(), RepositoryError> {
    let claimed = sqlx::query(
        r"
        UPDATE orders SET stock_released = TRUE
        WHERE id = $1 AND NOT stock_released
        ",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    if claimed.rows_affected() == 0 {
        tracing::debug!(order_id, "Stock already released");
        return Ok(());
    }

    let restored = sqlx::query(
        r"
        UPDATE product_variants v
        SET quantity = v.quantity + i.quantity, updated_at = NOW()
        FROM (
            SELECT variant_id, SUM(quantity)::INT AS quantity
            FROM order_items
            WHERE order_id = $1 AND variant_id IS NOT NULL
            GROUP BY variant_id
        ) i
        WHERE v.id = i.variant_id
        ",
    )
    .bind(order_id)
    .execute(&mut *conn)
    .await?;

    tracing::info!(
        order_id,
        variants = restored.rows_affected(),
        "Stock released"
    );
    Ok(())
}
