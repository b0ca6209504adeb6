//! Discount code lookups.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pazar_core::{DiscountId, DiscountKind, DiscountRule};

use super::RepositoryError;

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
}

impl DiscountRow {
    fn into_rule(self) -> Result<(DiscountId, DiscountRule), RepositoryError> {
        let kind = self
            .kind
            .parse::<DiscountKind>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok((
            DiscountId::new(self.id),
            DiscountRule {
                code: self.code,
                kind,
                value: self.value,
                starts_at: self.starts_at,
                ends_at: self.ends_at,
                usage_limit: self.usage_limit,
                usage_count: self.usage_count,
                is_active: self.is_active,
            },
        ))
    }
}

const SELECT_DISCOUNT: &str = r"
    SELECT id, code, kind, value, starts_at, ends_at, usage_limit, usage_count, is_active
    FROM discounts
    WHERE code = $1
";

/// Repository for discount lookups.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    /// Create a new discount repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a discount by its normalized code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` for an unknown stored kind.
    pub async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<(DiscountId, DiscountRule)>, RepositoryError> {
        let row = sqlx::query_as::<_, DiscountRow>(SELECT_DISCOUNT)
            .bind(code)
            .fetch_optional(self.pool)
            .await?;

        row.map(DiscountRow::into_rule).transpose()
    }
}

/// Lock a discount row for the rest of the checkout transaction.
pub(super) async fn lock_by_code(
    conn: &mut sqlx::PgConnection,
    code: &str,
) -> Result<Option<(DiscountId, DiscountRule)>, RepositoryError> {
    let sql = format!("{SELECT_DISCOUNT} FOR UPDATE");
    let row = sqlx::query_as::<_, DiscountRow>(&sql)
        .bind(code)
        .fetch_optional(conn)
        .await?;

    row.map(DiscountRow::into_rule).transpose()
}

/// Count one use of a discount, refusing to pass its usage limit.
///
/// Returns `false` when the limit was already reached.
pub(super) async fn record_use(
    conn: &mut sqlx::PgConnection,
    id: DiscountId,
) -> Result<bool, RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE discounts
        SET usage_count = usage_count + 1, updated_at = NOW()
        WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)
        ",
    )
    .bind(id.as_i32())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
