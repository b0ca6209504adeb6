//! Catalog read endpoints.

use axum::{Router, extract::State, routing::get};
use serde::Deserialize;

use pazar_core::{ProductId, ProductTypeId};

use crate::db::CatalogRepository;
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{Page, ProductDetail, ProductFilter, ProductSummary, ProductTypeView};
use crate::state::AppState;

pub const DEFAULT_PER_PAGE: u32 = 24;
pub const MAX_PER_PAGE: u32 = 100;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(index))
        .route("/api/products/{id}", get(show))
        .route("/api/product-types", get(product_types))
}

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub product_type: Option<i32>,
    pub featured: Option<bool>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListQuery {
    /// 1-based page and clamped page size.
    fn window(&self) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self
            .per_page
            .unwrap_or(DEFAULT_PER_PAGE)
            .clamp(1, MAX_PER_PAGE);
        (page, per_page)
    }

    fn to_filter(&self) -> ProductFilter {
        let (page, per_page) = self.window();
        ProductFilter {
            product_type_id: self.product_type.map(ProductTypeId::new),
            featured: self.featured,
            search: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from),
            limit: i64::from(per_page),
            offset: i64::from(page - 1) * i64::from(per_page),
        }
    }
}

/// List visible products.
#[tracing::instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Page<ProductSummary>>>> {
    let (page, per_page) = query.window();
    let (mut items, total) = CatalogRepository::new(state.pool())
        .list_products(&query.to_filter())
        .await?;
    for item in &mut items {
        item.resolve_media(&state.config().media_base_url);
    }

    Ok(ApiResponse::ok(Page {
        items,
        page,
        per_page,
        total,
    }))
}

/// Product detail, served from the product cache when fresh.
#[tracing::instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProductDetail>>> {
    let id = ProductId::new(id);

    if let Some(product) = state.product_cache().get(&id).await {
        return Ok(ApiResponse::ok(product));
    }

    let mut product = CatalogRepository::new(state.pool())
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    product.resolve_media(&state.config().media_base_url);

    state.product_cache().insert(id, product.clone()).await;
    Ok(ApiResponse::ok(product))
}

/// Product types that have something to show.
pub async fn product_types(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ProductTypeView>>>> {
    let types = CatalogRepository::new(state.pool())
        .list_product_types()
        .await?;
    Ok(ApiResponse::ok(types))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_and_clamps() {
        assert_eq!(ListQuery::default().window(), (1, DEFAULT_PER_PAGE));

        let query = ListQuery {
            page: Some(0),
            per_page: Some(10_000),
            ..ListQuery::default()
        };
        assert_eq!(query.window(), (1, MAX_PER_PAGE));
    }

    #[test]
    fn test_filter_offset_and_search() {
        let query = ListQuery {
            product_type: Some(3),
            q: Some("  ".to_string()),
            page: Some(3),
            per_page: Some(10),
            ..ListQuery::default()
        };
        let filter = query.to_filter();
        assert_eq!(filter.product_type_id, Some(ProductTypeId::new(3)));
        assert_eq!(filter.search, None);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.offset, 20);
    }
}
