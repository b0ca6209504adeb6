//! HTTP middleware for the admin API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, HTTP context)
//! 2. `TraceLayer` (request span)
//! 3. Request ID
//! 4. Security headers
//! 5. CORS (admin UI origin only)
//! 6. `RequireAdminAuth` as a route layer on `/api/*`

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::RequireAdminAuth;
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
