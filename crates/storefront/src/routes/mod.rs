//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness
//! GET  /health/ready               - Readiness (database reachable)
//!
//! # Catalog
//! GET  /api/products               - Product listing (type, featured, q, page, per_page)
//! GET  /api/products/{id}          - Product detail with variants and options
//! GET  /api/product-types          - Product types
//! GET  /api/store-settings         - Branding and contact settings
//!
//! # Econt
//! GET  /api/econt/offices          - Office search (city, q, limit)
//! GET  /api/econt/offices/{code}   - Office by code
//! GET  /api/econt/cities           - Cities with offices
//!
//! # Cart & checkout
//! POST /api/cart/validate          - Price a cart against current stock
//! POST /api/discounts/validate     - Preview a discount code
//! GET  /api/delivery/options       - Delivery methods and prices
//! POST /api/checkout               - Place an order (rate limited)
//!
//! # Tracking
//! POST /api/track                  - Record a page view (rate limited)
//!
//! GET  /media/*                    - Uploaded media files
//! ```

pub mod cart;
pub mod checkout;
pub mod econt;
pub mod products;
pub mod settings;
pub mod track;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware as axum_middleware,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, services::ServeDir,
    set_header::SetResponseHeaderLayer,
};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// JSON bodies are small; checkout with 100 lines fits comfortably.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// All API routes, without state.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(products::router())
        .merge(settings::router())
        .merge(econt::router())
        .merge(cart::router())
        .merge(checkout::router())
        .merge(track::router())
}

/// The complete storefront application.
pub fn app(state: AppState) -> Router {
    let media = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=86400"),
        ))
        .service(ServeDir::new(&state.config().media_dir));

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes())
        .nest_service("/media", media)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(axum_middleware::from_fn(security_headers_middleware))
        .layer(axum_middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, header::CONTENT_TYPE};
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::config::test_config;
    use crate::econt::EcontDirectory;

    fn test_app() -> Router {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pazar_test")
            .unwrap();
        let state = AppState::new(test_config(), pool, EcontDirectory::load().unwrap());
        app(state)
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header("x-request-id", "abc-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }

    #[tokio::test]
    async fn test_delivery_options() {
        let response = test_app()
            .oneshot(Request::get("/api/delivery/options").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["method"], "econt_office");
        assert_eq!(body["data"][0]["cost"], "5.90");
    }

    #[tokio::test]
    async fn test_econt_lookup() {
        let response = test_app()
            .oneshot(
                Request::get("/api/econt/offices?city=Plovdiv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json(response).await;
        let offices = body["data"].as_array().unwrap();
        assert!(!offices.is_empty());
        assert!(offices.iter().all(|o| o["city"] == "Plovdiv"));

        let response = test_app()
            .oneshot(
                Request::get("/api/econt/offices/0000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["success"], false);
    }

    #[tokio::test]
    async fn test_checkout_rejects_invalid_form_before_database() {
        let response = test_app()
            .oneshot(post_json(
                "/api/checkout",
                r#"{"customer_name":"","email":"nope","phone":"123","lines":[]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        let fields: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"customer_name"));
        assert!(fields.contains(&"email"));
        assert!(fields.contains(&"phone"));
        assert!(fields.contains(&"lines"));
    }

    #[tokio::test]
    async fn test_checkout_rejects_unknown_office() {
        let response = test_app()
            .oneshot(post_json(
                "/api/checkout",
                r#"{
                    "customer_name": "Ivan Petrov",
                    "email": "ivan@example.com",
                    "phone": "0888 123 456",
                    "delivery_method": "econt_office",
                    "econt_office_code": "9999",
                    "lines": [{"variant_id": 1, "quantity": 1}]
                }"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json(response).await["details"][0]["field"], "econt_office_code");
    }

    #[tokio::test]
    async fn test_cart_validate_rejects_zero_quantity() {
        let response = test_app()
            .oneshot(post_json(
                "/api/cart/validate",
                r#"{"lines":[{"variant_id":1,"quantity":0}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_track_rejects_external_path() {
        let response = test_app()
            .oneshot(post_json("/api/track", r#"{"path":"http://elsewhere"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_extractor_rejections_use_envelope() {
        let response = test_app()
            .oneshot(post_json(
                "/api/checkout",
                r#"{"customer_name":"Ivan","email":"ivan@example.com","phone":"0888123456",
                    "lines":[{"variant_id":1,"quantity":-1}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["details"][0]["field"], "body");

        let response = test_app()
            .oneshot(Request::get("/api/products/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(json(response).await["success"], false);

        let response = test_app()
            .oneshot(
                Request::get("/api/econt/offices?limit=many")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["success"], false);
    }
}
