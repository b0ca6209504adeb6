//! Anonymous page-view tracking.
//!
//! Visitors are counted by a daily hash of salt, client IP and user agent.
//! The hash rotates at midnight UTC and the raw IP is never stored.

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    routing::post,
};
use chrono::{NaiveDate, Utc};
use secrecy::ExposeSecret;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use pazar_core::ProductId;

use crate::db::{VisitorEvent, VisitorRepository};
use crate::error::{AppError, Result};
use crate::extract::Json;
use crate::middleware::{client_ip, tracking_rate_limiter};
use crate::state::AppState;

const MAX_PATH_LEN: usize = 512;
const MAX_REFERRER_LEN: usize = 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/track", post(track))
        .layer(tracking_rate_limiter())
}

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub path: String,
    pub referrer: Option<String>,
    pub product_id: Option<i32>,
}

/// Daily visitor fingerprint, hex encoded.
#[must_use]
pub fn visitor_hash(salt: &str, ip: &str, user_agent: &str, day: NaiveDate) -> String {
    let day = day.to_string();
    let mut hasher = Sha256::new();
    for part in [salt, ip, user_agent, day.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

fn validate(body: TrackRequest) -> Result<(String, Option<String>, Option<ProductId>)> {
    let path = body.path.trim();
    if !path.starts_with('/') || path.len() > MAX_PATH_LEN {
        return Err(AppError::BadRequest(
            "path must be an absolute site path".to_string(),
        ));
    }
    let referrer = body
        .referrer
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty() && r.len() <= MAX_REFERRER_LEN);

    Ok((
        path.to_string(),
        referrer,
        body.product_id.map(ProductId::new),
    ))
}

/// Record a page view.
pub async fn track(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<TrackRequest>,
) -> Result<StatusCode> {
    let (path, referrer, product_id) = validate(body)?;

    let ip = client_ip(&headers).map(|ip| ip.to_string()).unwrap_or_default();
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = VisitorEvent {
        visitor_hash: visitor_hash(
            state.config().visitor_salt.expose_secret(),
            &ip,
            user_agent,
            Utc::now().date_naive(),
        ),
        path,
        referrer,
        product_id,
    };

    VisitorRepository::new(state.pool()).record(&event).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    #[test]
    fn test_visitor_hash_is_stable_within_a_day() {
        let a = visitor_hash("salt", "203.0.113.7", "Firefox", day(1));
        let b = visitor_hash("salt", "203.0.113.7", "Firefox", day(1));
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_visitor_hash_rotates_and_depends_on_inputs() {
        let base = visitor_hash("salt", "203.0.113.7", "Firefox", day(1));
        assert_ne!(base, visitor_hash("salt", "203.0.113.7", "Firefox", day(2)));
        assert_ne!(base, visitor_hash("pepper", "203.0.113.7", "Firefox", day(1)));
        assert_ne!(base, visitor_hash("salt", "203.0.113.8", "Firefox", day(1)));
    }

    #[test]
    fn test_validate_path_and_referrer() {
        let ok = validate(TrackRequest {
            path: " /products/4 ".to_string(),
            referrer: Some(String::new()),
            product_id: Some(4),
        })
        .unwrap();
        assert_eq!(ok.0, "/products/4");
        assert_eq!(ok.1, None);
        assert_eq!(ok.2, Some(ProductId::new(4)));

        assert!(
            validate(TrackRequest {
                path: "https://evil.example".to_string(),
                referrer: None,
                product_id: None,
            })
            .is_err()
        );
    }
}
