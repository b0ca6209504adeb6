//! Order placement on the storefront and its effect on admin data.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - Both servers running against it, admin with `ADMIN_API_TOKEN`
//!
//! Checkout is rate limited per client, so keep the number of orders placed
//! here small.
//!
//! Run with: cargo test -p pazar-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use pazar_integration_tests::{TestContext, amount, expect_data, pickup_checkout, unique_sku};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_order_lifecycle_moves_stock() {
    let ctx = TestContext::from_env();
    let (product_id, variant_id) = ctx.create_product_with_stock("12.50", 5).await;

    let resp = ctx
        .storefront
        .post(ctx.storefront("/api/checkout"))
        .json(&pickup_checkout(variant_id, 2, None))
        .send()
        .await
        .unwrap();
    let order = expect_data(resp, StatusCode::CREATED).await;
    assert_eq!(order["status"], "pending");
    assert!((amount(&order["totals"]["subtotal"]) - 25.0).abs() < f64::EPSILON);
    assert!(amount(&order["totals"]["delivery"]).abs() < f64::EPSILON);
    let order_id = order["id"].as_i64().unwrap();

    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 3);

    // Cancelling returns the stock, once
    let status_url = ctx.admin(&format!("/api/admin/orders/{order_id}/status"));
    let resp = ctx
        .admin
        .patch(&status_url)
        .json(&json!({ "status": "cancelled" }))
        .send()
        .await
        .unwrap();
    let cancelled = expect_data(resp, StatusCode::OK).await;
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 5);

    let resp = ctx
        .admin
        .patch(&status_url)
        .json(&json!({ "status": "confirmed" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 5);

    ctx.delete_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_checkout_rejects_overselling() {
    let ctx = TestContext::from_env();
    let (product_id, variant_id) = ctx.create_product_with_stock("9.90", 1).await;

    let resp = ctx
        .storefront
        .post(ctx.storefront("/api/checkout"))
        .json(&pickup_checkout(variant_id, 2, None))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 1);

    ctx.delete_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_single_use_discount() {
    let ctx = TestContext::from_env();
    let (product_id, variant_id) = ctx.create_product_with_stock("40.00", 10).await;
    let code = unique_sku("ONCE");

    let resp = ctx
        .admin
        .post(ctx.admin("/api/admin/discounts"))
        .json(&json!({ "code": code, "kind": "percentage", "value": "25", "usage_limit": 1 }))
        .send()
        .await
        .unwrap();
    let discount = expect_data(resp, StatusCode::CREATED).await;
    let discount_id = discount["id"].as_i64().unwrap();

    let resp = ctx
        .storefront
        .post(ctx.storefront("/api/checkout"))
        .json(&pickup_checkout(variant_id, 1, Some(&code)))
        .send()
        .await
        .unwrap();
    let order = expect_data(resp, StatusCode::CREATED).await;
    assert!((amount(&order["totals"]["discount"]) - 10.0).abs() < f64::EPSILON);
    assert!((amount(&order["totals"]["total"]) - 30.0).abs() < f64::EPSILON);

    // The only use is spent
    let resp = ctx
        .storefront
        .post(ctx.storefront("/api/discounts/validate"))
        .json(&json!({ "code": code, "subtotal": "40.00" }))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_client_error());

    let resp = ctx
        .admin
        .get(ctx.admin(&format!("/api/admin/discounts/{discount_id}")))
        .send()
        .await
        .unwrap();
    let discount = expect_data(resp, StatusCode::OK).await;
    assert_eq!(discount["usage_count"], 1);
    assert_eq!(discount["is_usable"], false);

    ctx.delete_product(product_id).await;
}
