//! Property repository (e.g. "Color", "Size") with values and product type links.

use std::collections::HashMap;

use sqlx::{PgConnection, PgPool};

use pazar_core::{ProductTypeId, PropertyId, PropertyValueId};

use super::RepositoryError;
use crate::models::{Property, PropertyInput, PropertyValue, PropertyValueInput};

#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: i32,
    name: String,
    description: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct PropertyValueRow {
    id: i32,
    property_id: i32,
    value: String,
    sort_order: i32,
}

impl From<PropertyValueRow> for PropertyValue {
    fn from(row: PropertyValueRow) -> Self {
        Self {
            id: PropertyValueId::new(row.id),
            value: row.value,
            sort_order: row.sort_order,
        }
    }
}

const NAME_CONFLICT: &str = "property name already exists";
const UNKNOWN_PRODUCT_TYPE: &str = "product type does not exist";

async fn load_properties(
    conn: &mut PgConnection,
    only: Option<i32>,
) -> Result<Vec<Property>, RepositoryError> {
    let rows = sqlx::query_as::<_, PropertyRow>(
        r"
        SELECT id, name, description FROM properties
        WHERE ($1::INT IS NULL OR id = $1)
        ORDER BY name
        ",
    )
    .bind(only)
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();

    let values = sqlx::query_as::<_, PropertyValueRow>(
        r"
        SELECT id, property_id, value, sort_order FROM property_values
        WHERE property_id = ANY($1)
        ORDER BY sort_order, value
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let links: Vec<(i32, i32)> = sqlx::query_as(
        r"
        SELECT property_id, product_type_id FROM property_product_types
        WHERE property_id = ANY($1)
        ORDER BY product_type_id
        ",
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut values_by: HashMap<i32, Vec<PropertyValue>> = HashMap::new();
    for row in values {
        values_by
            .entry(row.property_id)
            .or_default()
            .push(row.into());
    }
    let mut types_by: HashMap<i32, Vec<ProductTypeId>> = HashMap::new();
    for (property_id, type_id) in links {
        types_by
            .entry(property_id)
            .or_default()
            .push(ProductTypeId::new(type_id));
    }

    Ok(rows
        .into_iter()
        .map(|row| Property {
            id: PropertyId::new(row.id),
            values: values_by.remove(&row.id).unwrap_or_default(),
            product_type_ids: types_by.remove(&row.id).unwrap_or_default(),
            name: row.name,
            description: row.description,
        })
        .collect())
}

async fn write_links(
    conn: &mut PgConnection,
    property_id: i32,
    type_ids: &[ProductTypeId],
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM property_product_types WHERE property_id = $1")
        .bind(property_id)
        .execute(&mut *conn)
        .await?;

    let ids: Vec<i32> = type_ids.iter().map(ProductTypeId::as_i32).collect();
    sqlx::query(
        r"
        INSERT INTO property_product_types (property_id, product_type_id)
        SELECT $1, type_id FROM UNNEST($2::INT[]) AS type_id
        ON CONFLICT DO NOTHING
        ",
    )
    .bind(property_id)
    .bind(&ids)
    .execute(&mut *conn)
    .await
    .map_err(|e| RepositoryError::from_write_refs(e, NAME_CONFLICT, UNKNOWN_PRODUCT_TYPE))?;
    Ok(())
}

/// Repository for properties and their values.
pub struct PropertyRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PropertyRepository<'a> {
    /// Create a new property repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All properties with values and linked product types, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self) -> Result<Vec<Property>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_properties(&mut conn, None).await
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_properties(&mut conn, Some(id.as_i32())).await?.pop())
    }

    /// Create a property and link it to product types.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a duplicate name or unknown
    /// product type.
    #[tracing::instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &PropertyInput) -> Result<Property, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO properties (name, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(input.name.trim())
        .bind(input.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, NAME_CONFLICT))?;

        write_links(&mut tx, id, &input.product_type_ids).await?;
        let property = load_properties(&mut tx, Some(id))
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        tracing::info!(property_id = id, "Property created");
        Ok(property)
    }

    /// Rename a property and replace its product type links.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the property does not exist and
    /// `RepositoryError::Conflict` for a duplicate name or unknown product type.
    pub async fn update(
        &self,
        id: PropertyId,
        input: &PropertyInput,
    ) -> Result<Property, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE properties SET name = $2, description = $3, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .bind(input.name.trim())
        .bind(input.description.as_deref().map(str::trim).filter(|d| !d.is_empty()))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, NAME_CONFLICT))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        write_links(&mut tx, id.as_i32(), &input.product_type_ids).await?;
        let property = load_properties(&mut tx, Some(id.as_i32()))
            .await?
            .pop()
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;
        Ok(property)
    }

    /// Delete a property. Variant options using it go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the property does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: PropertyId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM properties WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!("Property deleted");
        Ok(())
    }

    /// Add a value. Without an explicit sort order it goes last.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown property and
    /// `RepositoryError::Conflict` if the value already exists on it.
    pub async fn add_value(
        &self,
        property_id: PropertyId,
        input: &PropertyValueInput,
    ) -> Result<PropertyValue, RepositoryError> {
        let row = sqlx::query_as::<_, PropertyValueRow>(
            r"
            INSERT INTO property_values (property_id, value, sort_order)
            SELECT p.id, $2,
                   COALESCE($3, (SELECT COALESCE(MAX(sort_order) + 1, 0)
                                 FROM property_values WHERE property_id = p.id))
            FROM properties p
            WHERE p.id = $1
            RETURNING id, property_id, value, sort_order
            ",
        )
        .bind(property_id.as_i32())
        .bind(input.value.trim())
        .bind(input.sort_order)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "value already exists on this property"))?;

        row.map(PropertyValue::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a value. Variants using it lose that option.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the value does not exist.
    pub async fn delete_value(&self, id: PropertyValueId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM property_values WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
