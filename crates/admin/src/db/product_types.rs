//! Product type repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pazar_core::ProductTypeId;

use super::RepositoryError;
use crate::models::{ProductType, ProductTypeInput};

#[derive(Debug, sqlx::FromRow)]
struct ProductTypeRow {
    id: i32,
    name: String,
    description: Option<String>,
    product_count: i64,
    created_at: DateTime<Utc>,
}

impl From<ProductTypeRow> for ProductType {
    fn from(row: ProductTypeRow) -> Self {
        Self {
            id: ProductTypeId::new(row.id),
            name: row.name,
            description: row.description,
            product_count: row.product_count,
            created_at: row.created_at,
        }
    }
}

const SELECT_TYPES: &str = r"
    SELECT t.id, t.name, t.description,
           (SELECT COUNT(*) FROM products p WHERE p.product_type_id = t.id) AS product_count,
           t.created_at
    FROM product_types t
";

const NAME_CONFLICT: &str = "product type name already exists";

fn description(input: &ProductTypeInput) -> Option<&str> {
    input
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
}

/// Repository for product types.
pub struct ProductTypeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductTypeRepository<'a> {
    /// Create a new product type repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ProductType>, RepositoryError> {
        let sql = format!("{SELECT_TYPES} ORDER BY t.name");
        let rows = sqlx::query_as::<_, ProductTypeRow>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(ProductType::from).collect())
    }

    async fn get(&self, id: i32) -> Result<ProductType, RepositoryError> {
        let sql = format!("{SELECT_TYPES} WHERE t.id = $1");
        sqlx::query_as::<_, ProductTypeRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .map(ProductType::from)
            .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate name.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductTypeInput) -> Result<ProductType, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            "INSERT INTO product_types (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.name.trim())
        .bind(description(input))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, NAME_CONFLICT))?;

        tracing::info!(product_type_id = id, "Product type created");
        self.get(id).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist and
    /// `RepositoryError::Conflict` for a duplicate name.
    pub async fn update(
        &self,
        id: ProductTypeId,
        input: &ProductTypeInput,
    ) -> Result<ProductType, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE product_types SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(input.name.trim())
        .bind(description(input))
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, NAME_CONFLICT))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id.as_i32()).await
    }

    /// Delete a type. Its products become untyped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist.
    pub async fn delete(&self, id: ProductTypeId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_types WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
