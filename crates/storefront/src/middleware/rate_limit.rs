//! Rate limiting for public write endpoints, using governor and `tower_governor`.
//!
//! - `checkout_rate_limiter`: strict, ~10 orders per minute per IP
//! - `tracking_rate_limiter`: relaxed, ~120 page views per minute per IP

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Headers checked for the real client IP, most trusted first.
const CLIENT_IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Real client IP from proxy headers.
///
/// `X-Forwarded-For` contributes its first (client-most) entry.
#[must_use]
pub fn client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
    })
}

/// Key extractor using [`client_ip`], falling back to the socket peer
/// address when the server runs without a proxy in front.
#[derive(Clone, Copy)]
pub struct ProxyIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ProxyIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req.headers())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Render a governor rejection as the JSON error envelope.
///
/// The `retry-after` and `x-ratelimit-*` headers governor computes are kept.
pub fn rate_limit_response(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { headers, .. } => {
            let mut response = AppError::RateLimited.into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::BadRequest("Unable to determine client address".to_string()).into_response()
        }
        GovernorError::Other { msg, headers, .. } => {
            let message = msg.unwrap_or_else(|| "Request rejected".to_string());
            let mut response = AppError::BadRequest(message).into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ProxyIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for checkout: 1 token every 6 seconds, burst of 5.
///
/// # Panics
///
/// Does not panic: the period and burst are fixed positive integers, which
/// `GovernorConfigBuilder` always accepts.
#[must_use]
pub fn checkout_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_response)
}

/// Rate limiter for visitor tracking: 2 tokens per second, burst of 30.
///
/// # Panics
///
/// Does not panic: the period and burst are fixed positive integers.
#[must_use]
pub fn tracking_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ProxyIpKeyExtractor)
        .per_millisecond(500)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_millisecond(500) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_response)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, StatusCode, header::CONTENT_TYPE};

    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_cloudflare_header_wins() {
        let h = headers(&[
            ("cf-connecting-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.1"),
        ]);
        assert_eq!(client_ip(&h).unwrap().to_string(), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_first_entry() {
        let h = headers(&[("x-forwarded-for", "198.51.100.1, 10.0.0.1")]);
        assert_eq!(client_ip(&h).unwrap().to_string(), "198.51.100.1");
    }

    #[test]
    fn test_invalid_values_are_skipped() {
        let h = headers(&[("cf-connecting-ip", "garbage"), ("x-real-ip", "2001:db8::1")]);
        assert_eq!(client_ip(&h).unwrap().to_string(), "2001:db8::1");
        assert!(client_ip(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn test_too_many_requests_uses_envelope() {
        let response = rate_limit_response(GovernorError::TooManyRequests {
            wait_time: 6,
            headers: Some(headers(&[("retry-after", "6")])),
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["retry-after"], "6");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Too many requests");
    }

    #[test]
    fn test_missing_key_is_bad_request() {
        let response = rate_limit_response(GovernorError::UnableToExtractKey);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
