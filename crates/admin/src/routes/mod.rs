//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! Everything under `/api` requires `Authorization: Bearer <token>`.
//!
//! ```text
//! GET    /health                                 - Liveness
//! GET    /health/ready                           - Readiness (database reachable)
//!
//! # Catalog
//! GET    /api/admin/products                     - Product list (q, type, featured, page, per_page)
//! POST   /api/admin/products                     - Create product
//! GET    /api/admin/products/{id}                - Product with variants
//! PUT    /api/admin/products/{id}                - Update product
//! DELETE /api/admin/products/{id}                - Delete product
//! GET    /api/admin/products/{id}/variants       - Variants of a product
//! POST   /api/admin/products/{id}/variants       - Create variant
//! POST   /api/admin/products/{id}/variants/generate - Create all missing combinations
//! PUT    /api/admin/variants/{id}                - Update variant
//! DELETE /api/admin/variants/{id}                - Delete variant
//! PATCH  /api/admin/variants/{id}/stock          - Set or adjust stock
//! GET    /api/admin/stock                        - Low-stock list (threshold)
//! GET    /api/admin/properties                   - Properties with values
//! POST   /api/admin/properties                   - Create property
//! PUT    /api/admin/properties/{id}              - Update property
//! DELETE /api/admin/properties/{id}              - Delete property
//! POST   /api/admin/properties/{id}/values       - Add value
//! DELETE /api/admin/property-values/{id}         - Delete value
//! GET    /api/admin/product-types                - Product types
//! POST   /api/admin/product-types                - Create product type
//! PUT    /api/admin/product-types/{id}           - Update product type
//! DELETE /api/admin/product-types/{id}           - Delete product type
//!
//! # Discounts
//! GET    /api/admin/discounts                    - Discount list (q, active)
//! POST   /api/admin/discounts                    - Create discount
//! POST   /api/admin/discounts/generate-code      - Suggest an unused code
//! GET    /api/admin/discounts/{id}               - Discount
//! PUT    /api/admin/discounts/{id}               - Update discount
//! DELETE /api/admin/discounts/{id}               - Delete discount
//!
//! # Orders
//! GET    /api/admin/orders                       - Order list (status, q, page, per_page)
//! GET    /api/admin/orders/{id}                  - Order with items
//! PATCH  /api/admin/orders/{id}/status           - Change status
//! GET    /api/admin/customers                    - Customers by email (q, page, per_page)
//!
//! # Store
//! GET    /api/admin/analytics/summary            - Sales and traffic (days)
//! GET    /api/admin/store-settings               - Settings
//! PUT    /api/admin/store-settings               - Replace settings
//!
//! # Storage
//! POST   /api/storage/upload                     - Upload (kind, folder)
//! GET    /api/storage/files                      - Media library (folder)
//! DELETE /api/storage/files/{id}                 - Delete file
//! POST   /api/storage/bulk-delete                - Delete many files
//! ```

pub mod discounts;
pub mod orders;
pub mod products;
pub mod properties;
pub mod settings;
pub mod storage;
pub mod variants;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware as axum_middleware,
    routing::get,
};
use tower_http::cors::CorsLayer;

use crate::middleware::{RequireAdminAuth, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// All authenticated API routes, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(variants::router())
        .merge(properties::router())
        .merge(discounts::router())
        .merge(orders::router())
        .merge(settings::router())
        .merge(storage::router())
}

/// CORS for the admin UI origin. Without a configured origin, cross-origin
/// requests are not allowed at all.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("ADMIN_CORS_ORIGIN is not a valid header value, CORS disabled");
            base
        }
        None => base,
    }
}

/// The complete admin application.
pub fn app(state: AppState) -> Router {
    let api = routes().route_layer(axum_middleware::from_extractor_with_state::<
        RequireAdminAuth,
        _,
    >(state.clone()));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(api)
        .layer(cors_layer(state.config().cors_origin.as_deref()))
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn readiness(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    sqlx::query("SELECT 1")
        .execute(state.pool())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        })?;
    Ok("ready")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;

    const TOKEN: &str = "k8Zq2mW9vR4tY7uB1nC5xE3aF6hJ0pLs";

    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pazar_test")
            .unwrap();
        app(AppState::new(test_config(), pool))
    }

    fn authed(method: Method, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request<Body> {
        authed(method, uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let response = test_app()
            .oneshot(
                Request::get("/api/admin/products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let (status, body) = send(
            Request::get("/api/storage/files")
                .header(header::AUTHORIZATION, "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_invalid_product_is_rejected() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/admin/products",
            r#"{"name": "", "sku": "bad sku"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["name", "sku"]);
    }

    #[tokio::test]
    async fn test_negative_stock_set_is_rejected() {
        let (status, _) = send(json_request(
            Method::PATCH,
            "/api/admin/variants/1/stock",
            r#"{"set": -3}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_huge_stock_adjustment_is_rejected() {
        let (status, body) = send(json_request(
            Method::PATCH,
            "/api/admin/variants/1/stock",
            r#"{"adjust": 2147483647}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "adjust");
    }

    #[tokio::test]
    async fn test_generate_rejects_repeated_property() {
        let (status, body) = send(json_request(
            Method::POST,
            "/api/admin/products/1/variants/generate",
            r#"{"price": "10.00", "option_sets": [
                {"property_id": 1, "values": [1, 2]},
                {"property_id": 1, "values": [3]}
            ]}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("more than once"));
    }

    #[tokio::test]
    async fn test_invalid_discount_definition() {
        let (status, _) = send(json_request(
            Method::POST,
            "/api/admin/discounts",
            r#"{"code": "HALF", "kind": "percentage", "value": "150"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_settings() {
        let (status, body) = send(json_request(
            Method::PUT,
            "/api/admin/store-settings",
            r##"{"store_name": "Pazar", "primary_color": "blue", "accent_color": "#ffffff",
                "language": "bg", "currency": "BGN"}"##,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "primary_color");
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_type() {
        let boundary = "pazar-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"notes.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             hello\r\n\
             --{boundary}--\r\n"
        );
        let request = authed(Method::POST, "/api/storage/upload?kind=media")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(body["error"].as_str().unwrap().contains("text/plain"));
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_ids() {
        let (status, _) = send(json_request(
            Method::POST,
            "/api/storage/bulk-delete",
            r#"{"ids": []}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cors_layer_accepts_bad_origin() {
        // An unusable origin must not panic at startup.
        let _ = cors_layer(Some("bad\norigin"));
        let _ = cors_layer(None);
    }

    #[tokio::test]
    async fn test_extractor_rejections_use_envelope() {
        let (status, body) = send(json_request(
            Method::PATCH,
            "/api/admin/variants/abc/stock",
            r#"{"adjust": 1}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(json_request(
            Method::PATCH,
            "/api/admin/variants/1/stock",
            r#"{"set": "lots"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["details"][0]["field"], "body");

        let (status, body) = send(
            authed(Method::GET, "/api/admin/orders?page=first")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);

        let (status, body) = send(
            authed(Method::POST, "/api/storage/upload")
                .header(header::CONTENT_TYPE, "multipart/form-data")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
