//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors and transactions)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (recorded into the span, echoed back)
//! 4. Security headers
//! 5. CORS and body size limit
//! 6. Rate limiting on checkout and tracking routes (governor)

pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use rate_limit::{checkout_rate_limiter, client_ip, tracking_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
