//! Product repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pazar_core::{ProductId, ProductTypeId};

use super::{PageWindow, RepositoryError, contains_pattern};
use crate::models::{Product, ProductInput, ProductQuery};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    sku: String,
    description: Option<String>,
    product_type_id: Option<i32>,
    product_type_name: Option<String>,
    is_featured: bool,
    variant_count: i64,
    total_stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    total_count: i64,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            sku: row.sku,
            description: row.description,
            product_type_id: row.product_type_id.map(ProductTypeId::new),
            product_type: row.product_type_name,
            is_featured: row.is_featured,
            variant_count: row.variant_count,
            total_stock: row.total_stock,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PRODUCTS: &str = r"
    SELECT p.id, p.name, p.sku, p.description, p.product_type_id,
           pt.name AS product_type_name, p.is_featured,
           (SELECT COUNT(*) FROM product_variants v WHERE v.product_id = p.id) AS variant_count,
           (SELECT COALESCE(SUM(v.quantity), 0)::BIGINT
              FROM product_variants v WHERE v.product_id = p.id) AS total_stock,
           p.created_at, p.updated_at,
           COUNT(*) OVER () AS total_count
    FROM products p
    LEFT JOIN product_types pt ON pt.id = p.product_type_id
";

const SKU_CONFLICT: &str = "SKU already exists";
const UNKNOWN_PRODUCT_TYPE: &str = "product type does not exist";

/// Search (`$1`), product type (`$2`) and featured (`$3`) filter.
const PRODUCT_FILTER: &str = r"
    WHERE ($1::TEXT IS NULL OR p.name ILIKE $1 OR p.sku ILIKE $1)
      AND ($2::INT IS NULL OR p.product_type_id = $2)
      AND ($3::BOOLEAN IS NULL OR p.is_featured = $3)
";

fn trimmed(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product CRUD.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `query`, newest first, with the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        query: &ProductQuery,
        window: PageWindow,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let search = trimmed(query.q.as_ref()).map(contains_pattern);
        let sql = format!(
            r"{SELECT_PRODUCTS}
            {PRODUCT_FILTER}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $4 OFFSET $5
            "
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(search.as_deref())
            .bind(query.product_type)
            .bind(query.featured)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(self.pool)
            .await?;

        let total = match window.window_total(rows.first().map(|r| r.total_count)) {
            Some(total) => total,
            None => {
                sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p {PRODUCT_FILTER}"))
                    .bind(search.as_deref())
                    .bind(query.product_type)
                    .bind(query.featured)
                    .fetch_one(self.pool)
                    .await?
            }
        };
        Ok((rows.into_iter().map(Product::from).collect(), total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{SELECT_PRODUCTS} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.as_i32())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Product::from))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate SKU or unknown
    /// product type.
    #[tracing::instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO products (name, sku, description, product_type_id, is_featured)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(input.name.trim())
        .bind(input.sku.trim())
        .bind(trimmed(input.description.as_ref()))
        .bind(input.product_type_id.map(|id| id.as_i32()))
        .bind(input.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write_refs(e, SKU_CONFLICT, UNKNOWN_PRODUCT_TYPE))?;

        tracing::info!(product_id = id, "Product created");
        self.get(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Conflict` for a duplicate SKU.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2, sku = $3, description = $4, product_type_id = $5,
                is_featured = $6, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(input.name.trim())
        .bind(input.sku.trim())
        .bind(trimmed(input.description.as_ref()))
        .bind(input.product_type_id.map(|id| id.as_i32()))
        .bind(input.is_featured)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write_refs(e, SKU_CONFLICT, UNKNOWN_PRODUCT_TYPE))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product and its variants. Order items keep their snapshot.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!("Product deleted");
        Ok(())
    }
}
