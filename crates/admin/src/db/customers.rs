//! Customers derived from orders, grouped by email address.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{PageWindow, RepositoryError, contains_pattern};
use crate::models::{Customer, CustomerQuery};

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    email: String,
    name: String,
    phone: String,
    order_count: i64,
    total_spent: Decimal,
    first_order_at: DateTime<Utc>,
    last_order_at: DateTime<Utc>,
    total_count: i64,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            email: row.email,
            name: row.name,
            phone: row.phone,
            order_count: row.order_count,
            total_spent: row.total_spent,
            first_order_at: row.first_order_at,
            last_order_at: row.last_order_at,
        }
    }
}

/// Read-only customer view over `orders`.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Customers ordered by most recent order. Name and phone come from the
    /// latest order; spend excludes cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: &CustomerQuery,
        window: PageWindow,
    ) -> Result<(Vec<Customer>, i64), RepositoryError> {
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(contains_pattern);

        let rows = sqlx::query_as::<_, CustomerRow>(
            r"
            WITH grouped AS (
                SELECT email,
                       COUNT(*) AS order_count,
                       COALESCE(SUM(total) FILTER (WHERE status <> 'cancelled'), 0) AS total_spent,
                       MIN(created_at) AS first_order_at,
                       MAX(created_at) AS last_order_at
                FROM orders
                GROUP BY email
            ),
            latest AS (
                SELECT DISTINCT ON (email) email, customer_name, phone
                FROM orders
                ORDER BY email, created_at DESC, id DESC
            )
            SELECT g.email, l.customer_name AS name, l.phone, g.order_count,
                   g.total_spent, g.first_order_at, g.last_order_at,
                   COUNT(*) OVER () AS total_count
            FROM grouped g
            JOIN latest l ON l.email = g.email
            WHERE ($1::TEXT IS NULL
                   OR g.email ILIKE $1 OR l.customer_name ILIKE $1 OR l.phone ILIKE $1)
            ORDER BY g.last_order_at DESC, g.email
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(search.as_deref())
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        let total = match window.window_total(rows.first().map(|r| r.total_count)) {
            Some(total) => total,
            None => {
                sqlx::query_scalar(
                    r"
                    SELECT COUNT(*)
                    FROM (SELECT DISTINCT ON (email) email, customer_name, phone
                          FROM orders
                          ORDER BY email, created_at DESC, id DESC) l
                    WHERE ($1::TEXT IS NULL
                           OR l.email ILIKE $1 OR l.customer_name ILIKE $1 OR l.phone ILIKE $1)
                    ",
                )
                .bind(search.as_deref())
                .fetch_one(self.pool)
                .await?
            }
        };
        Ok((rows.into_iter().map(Customer::from).collect(), total))
    }
}
