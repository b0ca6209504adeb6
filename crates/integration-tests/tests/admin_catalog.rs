//! Catalog management through the admin API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - The admin server running with `ADMIN_API_TOKEN`
//!
//! Run with: cargo test -p pazar-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use pazar_integration_tests::{TestContext, expect_data, unique_sku};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_health_endpoints() {
    let ctx = TestContext::from_env();

    let resp = reqwest::get(ctx.admin("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = reqwest::get(ctx.admin("/health/ready")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_api_rejects_missing_token() {
    let ctx = TestContext::from_env();

    let resp = reqwest::get(ctx.admin("/api/admin/products")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_duplicate_sku_conflicts() {
    let ctx = TestContext::from_env();
    let sku = unique_sku("DUP");

    let first = ctx
        .admin
        .post(ctx.admin("/api/admin/products"))
        .json(&json!({ "name": "First", "sku": sku }))
        .send()
        .await
        .unwrap();
    let product = expect_data(first, StatusCode::CREATED).await;

    let second = ctx
        .admin
        .post(ctx.admin("/api/admin/products"))
        .json(&json!({ "name": "Second", "sku": sku }))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    ctx.delete_product(product["id"].as_i64().unwrap()).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_generate_variants_skips_existing_combinations() {
    let ctx = TestContext::from_env();
    let suffix = unique_sku("P");

    // Two properties with two values each
    let mut option_sets = Vec::new();
    for (name, values) in [("Size", ["S", "M"]), ("Color", ["Red", "Blue"])] {
        let resp = ctx
            .admin
            .post(ctx.admin("/api/admin/properties"))
            .json(&json!({ "name": format!("{name} {suffix}") }))
            .send()
            .await
            .unwrap();
        let property = expect_data(resp, StatusCode::CREATED).await;
        let property_id = property["id"].as_i64().unwrap();

        let mut value_ids = Vec::new();
        for value in values {
            let resp = ctx
                .admin
                .post(ctx.admin(&format!("/api/admin/properties/{property_id}/values")))
                .json(&json!({ "value": value }))
                .send()
                .await
                .unwrap();
            value_ids.push(expect_data(resp, StatusCode::CREATED).await["id"].clone());
        }
        option_sets.push(json!({ "property_id": property_id, "values": value_ids }));
    }

    let resp = ctx
        .admin
        .post(ctx.admin("/api/admin/products"))
        .json(&json!({ "name": "Generated tee", "sku": suffix }))
        .send()
        .await
        .unwrap();
    let product_id = expect_data(resp, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap();

    let request = json!({ "price": "25.00", "quantity": 3, "option_sets": option_sets });
    let url = ctx.admin(&format!("/api/admin/products/{product_id}/variants/generate"));

    let resp = ctx.admin.post(&url).json(&request).send().await.unwrap();
    let generated = expect_data(resp, StatusCode::CREATED).await;
    assert_eq!(generated["created"].as_array().unwrap().len(), 4);
    assert_eq!(generated["skipped"], 0);

    // Running it again creates nothing new
    let resp = ctx.admin.post(&url).json(&request).send().await.unwrap();
    let generated = expect_data(resp, StatusCode::CREATED).await;
    assert!(generated["created"].as_array().unwrap().is_empty());
    assert_eq!(generated["skipped"], 4);

    ctx.delete_product(product_id).await;
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_stock_cannot_go_negative() {
    let ctx = TestContext::from_env();
    let (product_id, variant_id) = ctx.create_product_with_stock("10.00", 2).await;
    let url = ctx.admin(&format!("/api/admin/variants/{variant_id}/stock"));

    let resp = ctx
        .admin
        .patch(&url)
        .json(&json!({ "adjust": -3 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 2);

    let resp = ctx
        .admin
        .patch(&url)
        .json(&json!({ "adjust": 5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.variant_quantity(product_id, variant_id).await, 7);

    ctx.delete_product(product_id).await;
}
