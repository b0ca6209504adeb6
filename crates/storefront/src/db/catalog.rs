//! Catalog reads: visible products, their variants and product types.
//!
//! A product is visible when at least one of its variants is visible.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use pazar_core::{Price, ProductId, ProductTypeId, PropertyId, PropertyValueId, VariantId};

use super::{RepositoryError, contains_pattern};
use crate::models::{
    ProductDetail, ProductFilter, ProductSummary, ProductTypeView, VariantOption, VariantStock,
    VariantView, collect_options,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    name: String,
    sku: String,
    description: Option<String>,
    product_type_id: Option<i32>,
    product_type_name: Option<String>,
    is_featured: bool,
    price_from: Decimal,
    total_quantity: i64,
    image_url: Option<String>,
}

impl TryFrom<ProductSummaryRow> for ProductSummary {
    type Error = RepositoryError;

    fn try_from(row: ProductSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            sku: row.sku,
            description: row.description,
            product_type_id: row.product_type_id.map(ProductTypeId::new),
            product_type: row.product_type_name,
            is_featured: row.is_featured,
            price_from: to_price(row.price_from)?,
            image_url: row.image_url,
            in_stock: row.total_quantity > 0,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    sku: String,
    description: Option<String>,
    product_type_id: Option<i32>,
    product_type_name: Option<String>,
    is_featured: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    sku: String,
    price: Decimal,
    quantity: i32,
    image_url: Option<String>,
    is_primary_image: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantOptionRow {
    variant_id: i32,
    property_id: i32,
    property_name: String,
    value_id: i32,
    value: String,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantStockRow {
    id: i32,
    product_id: i32,
    product_name: String,
    sku: String,
    price: Decimal,
    quantity: i32,
    is_visible: bool,
    image_url: Option<String>,
}

impl From<VariantStockRow> for VariantStock {
    fn from(row: VariantStockRow) -> Self {
        Self {
            variant_id: VariantId::new(row.id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            sku: row.sku,
            price: row.price,
            quantity: row.quantity,
            is_visible: row.is_visible,
            image_url: row.image_url,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductTypeRow {
    id: i32,
    name: String,
    description: Option<String>,
    product_count: i64,
}

impl From<ProductTypeRow> for ProductTypeView {
    fn from(row: ProductTypeRow) -> Self {
        Self {
            id: ProductTypeId::new(row.id),
            name: row.name,
            description: row.description,
            product_count: row.product_count,
        }
    }
}

fn to_price(amount: Decimal) -> Result<Price, RepositoryError> {
    Price::new(amount)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid price in database: {e}")))
}

const LISTING_WHERE: &str = r"
    WHERE ($1::INT IS NULL OR p.product_type_id = $1)
      AND ($2::BOOL IS NULL OR p.is_featured = $2)
      AND ($3::TEXT IS NULL OR p.name ILIKE $3 OR p.sku ILIKE $3 OR p.description ILIKE $3)
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List visible products matching `filter`, with the total match count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<ProductSummary>, i64), RepositoryError> {
        let search = filter.search.as_deref().map(contains_pattern);
        let type_id = filter.product_type_id.map(|id| id.as_i32());

        let list_sql = format!(
            r"
            SELECT p.id, p.name, p.sku, p.description, p.product_type_id,
                   pt.name AS product_type_name, p.is_featured,
                   MIN(v.price) AS price_from,
                   COALESCE(SUM(v.quantity), 0)::BIGINT AS total_quantity,
                   (ARRAY_AGG(v.image_url ORDER BY v.is_primary_image DESC, v.id)
                       FILTER (WHERE v.image_url IS NOT NULL))[1] AS image_url
            FROM products p
            JOIN product_variants v ON v.product_id = p.id AND v.is_visible
            LEFT JOIN product_types pt ON pt.id = p.product_type_id
            {LISTING_WHERE}
            GROUP BY p.id, pt.name
            ORDER BY p.is_featured DESC, p.created_at DESC, p.id DESC
            LIMIT $4 OFFSET $5
            "
        );

        let rows = sqlx::query_as::<_, ProductSummaryRow>(&list_sql)
            .bind(type_id)
            .bind(filter.featured)
            .bind(search.as_deref())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(self.pool)
            .await?;

        let count_sql = format!(
            r"
            SELECT COUNT(DISTINCT p.id)
            FROM products p
            JOIN product_variants v ON v.product_id = p.id AND v.is_visible
            {LISTING_WHERE}
            "
        );

        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(type_id)
            .bind(filter.featured)
            .bind(search.as_deref())
            .fetch_one(self.pool)
            .await?;

        let products = rows
            .into_iter()
            .map(ProductSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((products, total))
    }

    /// Get a visible product with its visible variants and their options.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` for a negative stored price.
    pub async fn get_product(
        &self,
        id: ProductId,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.sku, p.description, p.product_type_id,
                   pt.name AS product_type_name, p.is_featured, p.created_at
            FROM products p
            LEFT JOIN product_types pt ON pt.id = p.product_type_id
            WHERE p.id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let variant_rows = sqlx::query_as::<_, VariantRow>(
            r"
            SELECT id, sku, price, quantity, image_url, is_primary_image
            FROM product_variants
            WHERE product_id = $1 AND is_visible
            ORDER BY is_primary_image DESC, id
            ",
        )
        .bind(id.as_i32())
        .fetch_all(self.pool)
        .await?;

        if variant_rows.is_empty() {
            return Ok(None);
        }

        let variant_ids: Vec<i32> = variant_rows.iter().map(|v| v.id).collect();
        let option_rows = sqlx::query_as::<_, VariantOptionRow>(
            r"
            SELECT vpv.variant_id, pr.id AS property_id, pr.name AS property_name,
                   pv.id AS value_id, pv.value
            FROM variant_property_values vpv
            JOIN properties pr ON pr.id = vpv.property_id
            JOIN property_values pv ON pv.id = vpv.property_value_id
            WHERE vpv.variant_id = ANY($1)
            ORDER BY pr.name, pv.sort_order, pv.id
            ",
        )
        .bind(&variant_ids)
        .fetch_all(self.pool)
        .await?;

        let variants = variant_rows
            .into_iter()
            .map(|v| {
                let options = option_rows
                    .iter()
                    .filter(|o| o.variant_id == v.id)
                    .map(|o| VariantOption {
                        property_id: PropertyId::new(o.property_id),
                        property: o.property_name.clone(),
                        value_id: PropertyValueId::new(o.value_id),
                        value: o.value.clone(),
                    })
                    .collect();
                Ok(VariantView {
                    id: VariantId::new(v.id),
                    sku: v.sku,
                    price: to_price(v.price)?,
                    quantity: v.quantity,
                    in_stock: v.quantity > 0,
                    image_url: v.image_url,
                    is_primary_image: v.is_primary_image,
                    options,
                })
            })
            .collect::<Result<Vec<_>, RepositoryError>>()?;

        Ok(Some(ProductDetail {
            id: ProductId::new(product.id),
            name: product.name,
            sku: product.sku,
            description: product.description,
            product_type_id: product.product_type_id.map(ProductTypeId::new),
            product_type: product.product_type_name,
            is_featured: product.is_featured,
            options: collect_options(&variants),
            variants,
            created_at: product.created_at,
        }))
    }

    /// Current price and stock for a set of variants, hidden ones included.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variant_stock(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<VariantStock>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, VariantStockRow>(
            r"
            SELECT v.id, v.product_id, p.name AS product_name, v.sku, v.price,
                   v.quantity, v.is_visible, v.image_url
            FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.id = ANY($1)
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(VariantStock::from).collect())
    }

    /// Product types with the number of visible products in each.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_product_types(&self) -> Result<Vec<ProductTypeView>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductTypeRow>(
            r"
            SELECT pt.id, pt.name, pt.description,
                   COUNT(DISTINCT p.id) FILTER (
                       WHERE EXISTS (
                           SELECT 1 FROM product_variants v
                           WHERE v.product_id = p.id AND v.is_visible
                       )
                   ) AS product_count
            FROM product_types pt
            LEFT JOIN products p ON p.product_type_id = pt.id
            GROUP BY pt.id
            ORDER BY pt.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(ProductTypeView::from).collect())
    }
}

/// Lock variants for an order and return their current price and stock.
///
/// Runs inside the checkout transaction so stock cannot change underneath it.
pub(super) async fn lock_variant_stock(
    tx: &mut sqlx::PgConnection,
    ids: &[VariantId],
) -> Result<Vec<VariantStock>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
    let rows = sqlx::query_as::<_, VariantStockRow>(
        r"
        SELECT v.id, v.product_id, p.name AS product_name, v.sku, v.price,
               v.quantity, v.is_visible, v.image_url
        FROM product_variants v
        JOIN products p ON p.id = v.product_id
        WHERE v.id = ANY($1)
        ORDER BY v.id
        FOR UPDATE OF v
        ",
    )
    .bind(&ids)
    .fetch_all(tx)
    .await?;

    Ok(rows.into_iter().map(VariantStock::from).collect())
}
