//! Orders and customers.

use axum::{
    Router,
    extract::State,
    routing::{get, patch},
};

use pazar_core::OrderId;

use crate::db::{CustomerRepository, OrderRepository, PageWindow};
use crate::error::{ApiResponse, AppError, Result};
use crate::extract::{Json, Path, Query};
use crate::models::{
    Customer, CustomerQuery, OrderDetail, OrderQuery, OrderSummary, Page, StatusChangeRequest,
};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orders", get(index))
        .route("/api/admin/orders/{id}", get(show))
        .route("/api/admin/orders/{id}/status", patch(change_status))
        .route("/api/admin/customers", get(customers))
}

#[tracing::instrument(skip(state))]
async fn index(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<Page<OrderSummary>>>> {
    let window = PageWindow::new(query.page, query.per_page);
    let (items, total) = OrderRepository::new(state.pool())
        .list(&query, window)
        .await?;

    Ok(ApiResponse::ok(Page {
        items,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}

#[tracing::instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    Ok(ApiResponse::ok(order))
}

/// Move an order along its lifecycle. Cancelling returns stock.
#[tracing::instrument(skip(state))]
async fn change_status(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<ApiResponse<OrderDetail>>> {
    let order = OrderRepository::new(state.pool())
        .change_status(id, request.status)
        .await?;
    Ok(ApiResponse::ok(order))
}

#[tracing::instrument(skip(state))]
async fn customers(
    State(state): State<AppState>,
    Query(query): Query<CustomerQuery>,
) -> Result<Json<ApiResponse<Page<Customer>>>> {
    let window = PageWindow::new(query.page, query.per_page);
    let (items, total) = CustomerRepository::new(state.pool())
        .list(&query, window)
        .await?;

    Ok(ApiResponse::ok(Page {
        items,
        page: window.page,
        per_page: window.per_page,
        total,
    }))
}
