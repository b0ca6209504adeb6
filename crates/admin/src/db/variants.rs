//! Variant and stock repository.
//!
//! A variant's options are rows in `variant_property_values`, at most one per
//! property. Option values are checked to belong to their property on write.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use pazar_core::{
    Combination, OptionSet, ProductId, PropertyId, PropertyValueId, VariantId,
    generate_combinations, suggest_sku,
};

use super::RepositoryError;
use crate::models::catalog::MAX_STOCK;
use crate::models::{
    GenerateVariantsRequest, GeneratedVariants, LowStockItem, OptionRef, StockChange, Variant,
    VariantInput, VariantOption,
};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i32,
    product_id: i32,
    sku: String,
    price: Decimal,
    quantity: i32,
    is_visible: bool,
    image_url: Option<String>,
    is_primary_image: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl VariantRow {
    fn into_variant(self, options: Vec<VariantOption>) -> Variant {
        Variant {
            id: VariantId::new(self.id),
            product_id: ProductId::new(self.product_id),
            sku: self.sku,
            price: self.price,
            quantity: self.quantity,
            is_visible: self.is_visible,
            image_url: self.image_url,
            is_primary_image: self.is_primary_image,
            options,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OptionRow {
    variant_id: i32,
    property_id: i32,
    property_name: String,
    value_id: i32,
    value: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LowStockRow {
    variant_id: i32,
    product_id: i32,
    product_name: String,
    sku: String,
    quantity: i32,
    is_visible: bool,
}

impl From<LowStockRow> for LowStockItem {
    fn from(row: LowStockRow) -> Self {
        Self {
            variant_id: VariantId::new(row.variant_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            sku: row.sku,
            quantity: row.quantity,
            is_visible: row.is_visible,
        }
    }
}

const SELECT_VARIANTS: &str = r"
    SELECT id, product_id, sku, price, quantity, is_visible, image_url,
           is_primary_image, created_at, updated_at
    FROM product_variants
";

const SKU_CONFLICT: &str = "SKU already exists";

// =============================================================================
// Helpers (shared with transactions)
// =============================================================================

async fn load_options(
    conn: &mut PgConnection,
    variant_ids: &[i32],
) -> Result<HashMap<i32, Vec<VariantOption>>, RepositoryError> {
    let rows = sqlx::query_as::<_, OptionRow>(
        r"
        SELECT vpv.variant_id, vpv.property_id, p.name AS property_name,
               vpv.property_value_id AS value_id, pv.value
        FROM variant_property_values vpv
        JOIN properties p ON p.id = vpv.property_id
        JOIN property_values pv ON pv.id = vpv.property_value_id
        WHERE vpv.variant_id = ANY($1)
        ORDER BY p.name, pv.sort_order, pv.value
        ",
    )
    .bind(variant_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut by_variant: HashMap<i32, Vec<VariantOption>> = HashMap::new();
    for row in rows {
        by_variant.entry(row.variant_id).or_default().push(VariantOption {
            property_id: PropertyId::new(row.property_id),
            property: row.property_name,
            value_id: PropertyValueId::new(row.value_id),
            value: row.value,
        });
    }
    Ok(by_variant)
}

async fn attach_options(
    conn: &mut PgConnection,
    rows: Vec<VariantRow>,
) -> Result<Vec<Variant>, RepositoryError> {
    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let mut options = load_options(conn, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let opts = options.remove(&row.id).unwrap_or_default();
            row.into_variant(opts)
        })
        .collect())
}

async fn fetch_variant(
    conn: &mut PgConnection,
    id: i32,
) -> Result<Option<Variant>, RepositoryError> {
    let sql = format!("{SELECT_VARIANTS} WHERE id = $1");
    let Some(row) = sqlx::query_as::<_, VariantRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };
    Ok(attach_options(conn, vec![row]).await?.pop())
}

/// Replace a variant's options, checking each value belongs to its property.
async fn write_options(
    conn: &mut PgConnection,
    variant_id: i32,
    options: &[OptionRef],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM variant_property_values WHERE variant_id = $1")
        .bind(variant_id)
        .execute(&mut *conn)
        .await?;

    for option in options {
        let inserted = sqlx::query(
            r"
            INSERT INTO variant_property_values (variant_id, property_id, property_value_id)
            SELECT $1, pv.property_id, pv.id
            FROM property_values pv
            WHERE pv.id = $3 AND pv.property_id = $2
            ",
        )
        .bind(variant_id)
        .bind(option.property_id.as_i32())
        .bind(option.value_id.as_i32())
        .execute(&mut *conn)
        .await?;

        if inserted.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "value {} does not belong to property {}",
                option.value_id, option.property_id
            )));
        }
    }
    Ok(())
}

/// Only one variant per product carries the primary image.
async fn clear_other_primary(
    conn: &mut PgConnection,
    product_id: i32,
    keep: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        UPDATE product_variants SET is_primary_image = FALSE
        WHERE product_id = $1 AND id <> $2 AND is_primary_image
        ",
    )
    .bind(product_id)
    .bind(keep)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn insert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    input: &VariantInput,
) -> Result<i32, RepositoryError> {
    let id: i32 = sqlx::query_scalar(
        r"
        INSERT INTO product_variants
            (product_id, sku, price, quantity, is_visible, image_url, is_primary_image)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        ",
    )
    .bind(product_id.as_i32())
    .bind(input.sku.trim())
    .bind(input.price)
    .bind(input.quantity)
    .bind(input.is_visible)
    .bind(input.image_url.as_deref())
    .bind(input.is_primary_image)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::from_write(e, SKU_CONFLICT))?;

    write_options(conn, id, &input.options).await?;
    if input.is_primary_image {
        clear_other_primary(conn, product_id.as_i32(), id).await?;
    }
    Ok(id)
}

fn combination_key(pairs: impl Iterator<Item = (i32, i32)>) -> Vec<(i32, i32)> {
    let mut key: Vec<(i32, i32)> = pairs.collect();
    key.sort_unstable();
    key
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for variants and stock levels.
pub struct VariantRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VariantRepository<'a> {
    /// Create a new variant repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Variants of a product with their options, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_product(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<Variant>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("{SELECT_VARIANTS} WHERE product_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(product_id.as_i32())
            .fetch_all(&mut *conn)
            .await?;
        attach_options(&mut conn, rows).await
    }

    /// Get a variant by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: VariantId) -> Result<Option<Variant>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_variant(&mut conn, id.as_i32()).await
    }

    /// Create a variant with its options.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product and
    /// `RepositoryError::Conflict` for a duplicate SKU or mismatched option.
    #[tracing::instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create(
        &self,
        product_id: ProductId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(product_id.as_i32())
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(RepositoryError::NotFound);
        }

        let id = insert_variant(&mut tx, product_id, input).await?;
        let variant = fetch_variant(&mut tx, id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        tracing::info!(variant_id = id, "Variant created");
        Ok(variant)
    }

    /// Replace a variant's fields and options.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not exist and
    /// `RepositoryError::Conflict` for a duplicate SKU or mismatched option.
    pub async fn update(
        &self,
        id: VariantId,
        input: &VariantInput,
    ) -> Result<Variant, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_id: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE product_variants
            SET sku = $2, price = $3, quantity = $4, is_visible = $5, image_url = $6,
                is_primary_image = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING product_id
            ",
        )
        .bind(id.as_i32())
        .bind(input.sku.trim())
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.is_visible)
        .bind(input.image_url.as_deref())
        .bind(input.is_primary_image)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, SKU_CONFLICT))?;

        let product_id = product_id.ok_or(RepositoryError::NotFound)?;
        write_options(&mut tx, id.as_i32(), &input.options).await?;
        if input.is_primary_image {
            clear_other_primary(&mut tx, product_id, id.as_i32()).await?;
        }

        let variant = fetch_variant(&mut tx, id.as_i32())
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(variant)
    }

    /// Delete a variant. Order items keep their snapshot with a null variant.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variant does not exist.
    pub async fn delete(&self, id: VariantId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM product_variants WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set or adjust a variant's stock level.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown variant and
    /// `RepositoryError::Conflict` when an adjustment would leave the range
    /// `0..=MAX_STOCK`.
    #[tracing::instrument(skip(self))]
    pub async fn change_stock(
        &self,
        id: VariantId,
        change: StockChange,
    ) -> Result<Variant, RepositoryError> {
        let updated: Option<i32> = match change {
            StockChange::Set(quantity) => {
                sqlx::query_scalar(
                    r"
                    UPDATE product_variants SET quantity = $2, updated_at = NOW()
                    WHERE id = $1
                    RETURNING quantity
                    ",
                )
                .bind(id.as_i32())
                .bind(quantity)
                .fetch_optional(self.pool)
                .await?
            }
            StockChange::Adjust(delta) => {
                sqlx::query_scalar(
                    r"
                    UPDATE product_variants SET quantity = quantity + $2, updated_at = NOW()
                    WHERE id = $1 AND quantity::BIGINT + $2 BETWEEN 0 AND $3
                    RETURNING quantity
                    ",
                )
                .bind(id.as_i32())
                .bind(delta)
                .bind(i64::from(MAX_STOCK))
                .fetch_optional(self.pool)
                .await?
            }
        };

        let Some(quantity) = updated else {
            let exists = self.get(id).await?.is_some();
            return Err(if exists {
                RepositoryError::Conflict(format!("stock must stay between 0 and {MAX_STOCK}"))
            } else {
                RepositoryError::NotFound
            });
        };

        tracing::info!(quantity, "Stock changed");
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Variants at or below `threshold`, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<LowStockItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r"
            SELECT v.id AS variant_id, v.product_id, p.name AS product_name, v.sku,
                   v.quantity, v.is_visible
            FROM product_variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.quantity <= $1
            ORDER BY v.quantity, p.name, v.sku
            ",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(LowStockItem::from).collect())
    }

    /// Create one variant per combination of the requested option values,
    /// skipping combinations the product already has.
    ///
    /// All variants are created in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product and
    /// `RepositoryError::Conflict` when a value does not belong to its
    /// property or a generated SKU is taken.
    #[tracing::instrument(skip(self, request), fields(sets = request.option_sets.len()))]
    pub async fn generate(
        &self,
        product_id: ProductId,
        request: &GenerateVariantsRequest,
    ) -> Result<GeneratedVariants, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product_sku: Option<String> =
            sqlx::query_scalar("SELECT sku FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let product_sku = product_sku.ok_or(RepositoryError::NotFound)?;
        let sku_base = request
            .sku_base
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&product_sku)
            .to_string();

        let labels = value_labels(&mut tx, &request.option_sets).await?;

        let existing: Vec<(i32, i32, i32)> = sqlx::query_as(
            r"
            SELECT vpv.variant_id, vpv.property_id, vpv.property_value_id
            FROM variant_property_values vpv
            JOIN product_variants v ON v.id = vpv.variant_id
            WHERE v.product_id = $1
            ",
        )
        .bind(product_id.as_i32())
        .fetch_all(&mut *tx)
        .await?;

        let mut by_variant: HashMap<i32, Vec<(i32, i32)>> = HashMap::new();
        for (variant_id, property_id, value_id) in existing {
            by_variant
                .entry(variant_id)
                .or_default()
                .push((property_id, value_id));
        }
        let existing_keys: HashSet<Vec<(i32, i32)>> = by_variant
            .into_values()
            .map(|pairs| combination_key(pairs.into_iter()))
            .collect();

        let mut created_ids = Vec::new();
        let mut skipped = 0;
        for combination in generate_combinations(&request.option_sets) {
            let key = combination_key(
                combination
                    .iter()
                    .map(|(p, v)| (p.as_i32(), v.as_i32())),
            );
            if existing_keys.contains(&key) {
                skipped += 1;
                continue;
            }

            let input = VariantInput {
                sku: combination_sku(&sku_base, &combination, &labels),
                price: request.price,
                quantity: request.quantity,
                is_visible: true,
                image_url: None,
                is_primary_image: false,
                options: combination
                    .iter()
                    .map(|&(property_id, value_id)| OptionRef {
                        property_id,
                        value_id,
                    })
                    .collect(),
            };
            created_ids.push(insert_variant(&mut tx, product_id, &input).await?);
        }

        let sql = format!("{SELECT_VARIANTS} WHERE id = ANY($1) ORDER BY id");
        let rows = sqlx::query_as::<_, VariantRow>(&sql)
            .bind(&created_ids)
            .fetch_all(&mut *tx)
            .await?;
        let created = attach_options(&mut tx, rows).await?;
        tx.commit().await?;

        tracing::info!(created = created.len(), skipped, "Variants generated");
        Ok(GeneratedVariants { created, skipped })
    }
}

/// Labels of every requested value, keyed by value ID.
///
/// Fails if a value does not exist or belongs to a different property.
async fn value_labels(
    conn: &mut PgConnection,
    sets: &[OptionSet],
) -> Result<HashMap<PropertyValueId, String>, RepositoryError> {
    let ids: Vec<i32> = sets
        .iter()
        .flat_map(|s| s.values.iter().map(PropertyValueId::as_i32))
        .collect();

    let rows: Vec<(i32, i32, String)> = sqlx::query_as(
        "SELECT id, property_id, value FROM property_values WHERE id = ANY($1)",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let owners: HashMap<i32, (i32, String)> = rows
        .into_iter()
        .map(|(id, property_id, value)| (id, (property_id, value)))
        .collect();

    let mut labels = HashMap::new();
    for set in sets {
        for value_id in &set.values {
            match owners.get(&value_id.as_i32()) {
                Some((owner, label)) if *owner == set.property_id.as_i32() => {
                    labels.insert(*value_id, label.clone());
                }
                _ => {
                    return Err(RepositoryError::Conflict(format!(
                        "value {value_id} does not belong to property {}",
                        set.property_id
                    )));
                }
            }
        }
    }
    Ok(labels)
}

fn combination_sku(
    base: &str,
    combination: &Combination,
    labels: &HashMap<PropertyValueId, String>,
) -> String {
    let parts: Vec<&str> = combination
        .iter()
        .filter_map(|(_, value_id)| labels.get(value_id).map(String::as_str))
        .collect();
    suggest_sku(base, &parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combination_key_is_order_independent() {
        let a = combination_key([(2, 20), (1, 10)].into_iter());
        let b = combination_key([(1, 10), (2, 20)].into_iter());
        assert_eq!(a, b);
    }

    #[test]
    fn test_combination_sku_uses_labels_in_order() {
        let labels = HashMap::from([
            (PropertyValueId::new(10), "Red".to_string()),
            (PropertyValueId::new(20), "M".to_string()),
        ]);
        let combination = vec![
            (PropertyId::new(1), PropertyValueId::new(10)),
            (PropertyId::new(2), PropertyValueId::new(20)),
        ];
        assert_eq!(combination_sku("TEE", &combination, &labels), "TEE-RED-M");
    }
}
