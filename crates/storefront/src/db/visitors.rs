//! Anonymous visitor page views.

use sqlx::PgPool;

use pazar_core::ProductId;

use super::RepositoryError;

/// A page view to record. The visitor is identified only by a salted hash.
#[derive(Debug, Clone)]
pub struct VisitorEvent {
    pub visitor_hash: String,
    pub path: String,
    pub referrer: Option<String>,
    pub product_id: Option<ProductId>,
}

/// Repository for visitor tracking.
pub struct VisitorRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VisitorRepository<'a> {
    /// Create a new visitor repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a page view.
    ///
    /// A `product_id` that no longer exists is stored as `NULL`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn record(&self, event: &VisitorEvent) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO visitor_events (visitor_hash, path, referrer, product_id)
            VALUES ($1, $2, $3, (SELECT id FROM products WHERE id = $4))
            ",
        )
        .bind(&event.visitor_hash)
        .bind(&event.path)
        .bind(event.referrer.as_deref())
        .bind(event.product_id.map(|id| id.as_i32()))
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
