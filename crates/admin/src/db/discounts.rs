//! Discount code repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pazar_core::{DiscountId, DiscountKind, DiscountRule};

use super::{RepositoryError, contains_pattern};
use crate::models::{Discount, DiscountQuery};

#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: i32,
    code: String,
    kind: String,
    value: Decimal,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    usage_limit: Option<i32>,
    usage_count: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DiscountRow {
    fn into_discount(self, now: DateTime<Utc>) -> Result<Discount, RepositoryError> {
        let kind = self
            .kind
            .parse::<DiscountKind>()
            .map_err(RepositoryError::DataCorruption)?;

        let rule = DiscountRule {
            code: self.code,
            kind,
            value: self.value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            usage_limit: self.usage_limit,
            usage_count: self.usage_count,
            is_active: self.is_active,
        };
        Ok(Discount {
            id: DiscountId::new(self.id),
            is_usable: is_usable(&rule, now),
            rule,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Whether the code would be accepted at `now` for any positive subtotal.
fn is_usable(rule: &DiscountRule, now: DateTime<Utc>) -> bool {
    rule.evaluate(now, Decimal::ONE).is_ok()
}

const SELECT_DISCOUNTS: &str = r"
    SELECT id, code, kind, value, starts_at, ends_at, usage_limit, usage_count,
           is_active, created_at, updated_at
    FROM discounts
";

const CODE_CONFLICT: &str = "discount code already exists";

/// Repository for discount CRUD.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    /// Create a new discount repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List discounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` for an unknown kind in the
    /// database.
    pub async fn list(&self, query: &DiscountQuery) -> Result<Vec<Discount>, RepositoryError> {
        let search = query
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(contains_pattern);
        let sql = format!(
            r"{SELECT_DISCOUNTS}
            WHERE ($1::TEXT IS NULL OR code ILIKE $1)
              AND ($2::BOOLEAN IS NULL OR is_active = $2)
            ORDER BY created_at DESC, id DESC
            "
        );
        let rows = sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(search)
            .bind(query.active)
            .fetch_all(self.pool)
            .await?;

        let now = Utc::now();
        rows.into_iter().map(|r| r.into_discount(now)).collect()
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: DiscountId) -> Result<Option<Discount>, RepositoryError> {
        let sql = format!("{SELECT_DISCOUNTS} WHERE id = $1");
        sqlx::query_as::<_, DiscountRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?
            .map(|r| r.into_discount(Utc::now()))
            .transpose()
    }

    /// Store a new, already validated rule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    #[tracing::instrument(skip(self, rule), fields(code = %rule.code))]
    pub async fn create(&self, rule: &DiscountRule) -> Result<Discount, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO discounts (code, kind, value, starts_at, ends_at, usage_limit, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&rule.code)
        .bind(rule.kind.as_str())
        .bind(rule.value)
        .bind(rule.starts_at)
        .bind(rule.ends_at)
        .bind(rule.usage_limit)
        .bind(rule.is_active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, CODE_CONFLICT))?;

        tracing::info!(discount_id = id, "Discount created");
        self.get(DiscountId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a discount's definition. The usage count is left untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the discount does not exist and
    /// `RepositoryError::Conflict` if the new code is taken.
    pub async fn update(
        &self,
        id: DiscountId,
        rule: &DiscountRule,
    ) -> Result<Discount, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE discounts
            SET code = $2, kind = $3, value = $4, starts_at = $5, ends_at = $6,
                usage_limit = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(&rule.code)
        .bind(rule.kind.as_str())
        .bind(rule.value)
        .bind(rule.starts_at)
        .bind(rule.ends_at)
        .bind(rule.usage_limit)
        .bind(rule.is_active)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, CODE_CONFLICT))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a discount. Orders keep the code they were placed with.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the discount does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: DiscountId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM discounts WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!("Discount deleted");
        Ok(())
    }

    /// Whether a code is already stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn code_exists(&self, code: &str) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM discounts WHERE code = $1)")
                .bind(code)
                .fetch_one(self.pool)
                .await?;
        Ok(exists)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn rule() -> DiscountRule {
        DiscountRule {
            code: "SPRING".to_string(),
            kind: DiscountKind::Percentage,
            value: Decimal::TEN,
            starts_at: None,
            ends_at: None,
            usage_limit: Some(2),
            usage_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_is_usable() {
        let now = Utc::now();
        assert!(is_usable(&rule(), now));

        let mut exhausted = rule();
        exhausted.usage_count = 2;
        assert!(!is_usable(&exhausted, now));

        let mut expired = rule();
        expired.ends_at = Some(now - Duration::hours(1));
        assert!(!is_usable(&expired, now));

        let mut inactive = rule();
        inactive.is_active = false;
        assert!(!is_usable(&inactive, now));
    }
}
