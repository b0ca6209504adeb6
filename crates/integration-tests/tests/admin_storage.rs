//! Media uploads through the admin API, served back by the storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database
//! - Both servers running with the same `PAZAR_MEDIA_DIR`
//!
//! Run with: cargo test -p pazar-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use pazar_integration_tests::{TestContext, expect_data};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;

/// Smallest valid PNG: one transparent pixel.
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn png_form(name: &str) -> Form {
    let part = Part::bytes(PIXEL_PNG.to_vec())
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap();
    Form::new().part("file", part)
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers"]
async fn test_upload_serve_and_delete() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .admin
        .post(ctx.admin("/api/storage/upload?kind=media&folder=integration"))
        .multipart(png_form("Pixel Test.PNG"))
        .send()
        .await
        .unwrap();
    let file = expect_data(resp, StatusCode::CREATED).await;
    assert_eq!(file["folder"], "integration");
    assert_eq!(file["content_type"], "image/png");
    let id = file["id"].as_i64().unwrap();
    let url = file["url"].as_str().unwrap().to_string();

    // The storefront serves what the admin stored
    let served = reqwest::get(&url).await.unwrap();
    assert_eq!(served.status(), StatusCode::OK);
    assert_eq!(served.bytes().await.unwrap().as_ref(), PIXEL_PNG);

    let resp = ctx
        .admin
        .get(ctx.admin("/api/storage/files?folder=integration"))
        .send()
        .await
        .unwrap();
    let files = expect_data(resp, StatusCode::OK).await;
    assert!(files.as_array().unwrap().iter().any(|f| f["id"] == id));

    let resp = ctx
        .admin
        .delete(ctx.admin(&format!("/api/storage/files/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let served = reqwest::get(&url).await.unwrap();
    assert_eq!(served.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_bulk_delete_reports_each_file() {
    let ctx = TestContext::from_env();

    let resp = ctx
        .admin
        .post(ctx.admin("/api/storage/upload?folder=integration"))
        .multipart(png_form("bulk.png"))
        .send()
        .await
        .unwrap();
    let id = expect_data(resp, StatusCode::CREATED).await["id"]
        .as_i64()
        .unwrap();

    let resp = ctx
        .admin
        .post(ctx.admin("/api/storage/bulk-delete"))
        .json(&json!({ "ids": [id, i32::MAX] }))
        .send()
        .await
        .unwrap();
    let report = expect_data(resp, StatusCode::OK).await;
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["failed"], 1);
}
