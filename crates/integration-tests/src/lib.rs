//! Integration tests for Pazar.
//!
//! # Running Tests
//!
//! ```bash
//! # Database with migrations applied
//! cargo run -p pazar-cli -- migrate
//!
//! # Both servers, sharing the same database and media directory
//! cargo run -p pazar-storefront &
//! ADMIN_API_TOKEN=... cargo run -p pazar-admin &
//!
//! # Ignored by default because they need the running stack
//! ADMIN_API_TOKEN=... cargo test -p pazar-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_URL` - default `http://localhost:3000`
//! - `ADMIN_URL` - default `http://localhost:3001`
//! - `ADMIN_API_TOKEN` - bearer token the admin server was started with

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Clients and base URLs for both servers.
pub struct TestContext {
    pub storefront: Client,
    pub admin: Client,
    pub storefront_url: String,
    pub admin_url: String,
}

impl TestContext {
    /// Build clients from the environment.
    ///
    /// # Panics
    ///
    /// Panics if `ADMIN_API_TOKEN` is missing or not a valid header value.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn from_env() -> Self {
        let token = std::env::var("ADMIN_API_TOKEN").expect("ADMIN_API_TOKEN must be set");
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("token is a valid header"),
        );

        Self {
            storefront: Client::new(),
            admin: Client::builder()
                .default_headers(headers)
                .build()
                .expect("Failed to create HTTP client"),
            storefront_url: std::env::var("STOREFRONT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_url: std::env::var("ADMIN_URL")
                .unwrap_or_else(|_| "http://localhost:3001".to_string()),
        }
    }

    #[must_use]
    pub fn storefront(&self, path: &str) -> String {
        format!("{}{path}", self.storefront_url)
    }

    #[must_use]
    pub fn admin(&self, path: &str) -> String {
        format!("{}{path}", self.admin_url)
    }

    /// Create a product with one variant and return `(product_id, variant_id)`.
    ///
    /// # Panics
    ///
    /// Panics if the admin server rejects either request.
    pub async fn create_product_with_stock(&self, price: &str, quantity: i32) -> (i64, i64) {
        let sku = unique_sku("IT");
        let product = self
            .admin
            .post(self.admin("/api/admin/products"))
            .json(&json!({ "name": format!("Test product {sku}"), "sku": sku }))
            .send()
            .await
            .expect("create product request");
        let product = expect_data(product, StatusCode::CREATED).await;
        let product_id = product["id"].as_i64().expect("product id");

        let variant = self
            .admin
            .post(self.admin(&format!("/api/admin/products/{product_id}/variants")))
            .json(&json!({ "sku": format!("{sku}-V"), "price": price, "quantity": quantity }))
            .send()
            .await
            .expect("create variant request");
        let variant = expect_data(variant, StatusCode::CREATED).await;

        (product_id, variant["id"].as_i64().expect("variant id"))
    }

    /// Current stock of a variant as the admin sees it.
    ///
    /// # Panics
    ///
    /// Panics if the product or variant cannot be found.
    pub async fn variant_quantity(&self, product_id: i64, variant_id: i64) -> i64 {
        let response = self
            .admin
            .get(self.admin(&format!("/api/admin/products/{product_id}/variants")))
            .send()
            .await
            .expect("list variants request");
        let variants = expect_data(response, StatusCode::OK).await;
        variants
            .as_array()
            .and_then(|vs| vs.iter().find(|v| v["id"].as_i64() == Some(variant_id)))
            .and_then(|v| v["quantity"].as_i64())
            .expect("variant present")
    }

    /// Delete a product created by a test. Failures are ignored.
    pub async fn delete_product(&self, product_id: i64) {
        let _ = self
            .admin
            .delete(self.admin(&format!("/api/admin/products/{product_id}")))
            .send()
            .await;
    }
}

/// A SKU no other test run will use.
#[must_use]
pub fn unique_sku(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", id.get(..10).unwrap_or(&id).to_uppercase())
}

/// Assert the status and return the `data` field of a success envelope.
///
/// # Panics
///
/// Panics on an unexpected status or a body without `data`.
#[allow(clippy::expect_used)]
pub async fn expect_data(response: Response, status: StatusCode) -> Value {
    let actual = response.status();
    let body: Value = response.json().await.expect("JSON body");
    assert_eq!(actual, status, "unexpected status, body: {body}");
    assert_eq!(body["success"], true, "body: {body}");
    body["data"].clone()
}

/// Checkout body for store pickup.
#[must_use]
pub fn pickup_checkout(variant_id: i64, quantity: u32, discount_code: Option<&str>) -> Value {
    json!({
        "customer_name": "Иван Петров",
        "email": "ivan.petrov@example.bg",
        "phone": "0888 123 456",
        "delivery_method": "pickup",
        "discount_code": discount_code,
        "lines": [{ "variant_id": variant_id, "quantity": quantity }],
    })
}

/// Parse a money amount serialized as a decimal string.
///
/// # Panics
///
/// Panics if the value is not a numeric string.
#[must_use]
#[allow(clippy::expect_used)]
pub fn amount(value: &Value) -> f64 {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .expect("decimal string")
}
