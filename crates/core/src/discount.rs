//! Discount codes and how they reduce an order subtotal.
//!
//! A [`DiscountRule`] carries the stored definition of a code. The servers
//! load it from the database, call [`DiscountRule::evaluate`] against the
//! current cart subtotal and persist the usage themselves.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// Characters used in generated codes. `0`, `O`, `1`, `I` and `L` are left out
/// so codes survive being read aloud or copied from print.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

/// Shortest code [`generate_code`] will produce.
pub const MIN_CODE_LEN: usize = 4;
/// Longest accepted code, generated or typed.
pub const MAX_CODE_LEN: usize = 32;

/// Whether a discount takes a percentage or a fixed amount off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

impl DiscountKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for DiscountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscountKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("invalid discount kind: {s}")),
        }
    }
}

/// Reasons a discount cannot be defined or applied.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscountError {
    #[error("discount code is not active")]
    Inactive,
    #[error("discount code is not valid yet")]
    NotStarted,
    #[error("discount code has expired")]
    Expired,
    #[error("discount code has reached its usage limit")]
    UsageLimitReached,
    #[error("cart is empty")]
    EmptySubtotal,
    #[error("discount code must be {MIN_CODE_LEN}-{MAX_CODE_LEN} letters, digits, '-' or '_'")]
    InvalidCode,
    #[error("percentage must be greater than 0 and at most 100")]
    InvalidPercentage,
    #[error("fixed amount must be greater than 0")]
    InvalidAmount,
    #[error("end date must be after start date")]
    InvalidWindow,
    #[error("usage limit cannot be negative")]
    InvalidUsageLimit,
}

/// A stored discount definition together with its usage so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub code: String,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// `None` means unlimited.
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub is_active: bool,
}

impl DiscountRule {
    /// Check that the definition itself makes sense, independent of time or usage.
    ///
    /// # Errors
    ///
    /// Returns the first problem found with the code, value, window or limit.
    pub fn validate_definition(&self) -> Result<(), DiscountError> {
        if !is_valid_code(&self.code) {
            return Err(DiscountError::InvalidCode);
        }

        match self.kind {
            DiscountKind::Percentage => {
                if self.value <= Decimal::ZERO || self.value > Decimal::ONE_HUNDRED {
                    return Err(DiscountError::InvalidPercentage);
                }
            }
            DiscountKind::Fixed => {
                if self.value <= Decimal::ZERO {
                    return Err(DiscountError::InvalidAmount);
                }
            }
        }

        if let (Some(starts), Some(ends)) = (self.starts_at, self.ends_at)
            && ends <= starts
        {
            return Err(DiscountError::InvalidWindow);
        }

        if self.usage_limit.is_some_and(|limit| limit < 0) {
            return Err(DiscountError::InvalidUsageLimit);
        }

        Ok(())
    }

    /// Whether another use would exceed the usage limit.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.usage_limit
            .is_some_and(|limit| self.usage_count >= limit)
    }

    /// Amount to take off `subtotal` at time `now`.
    ///
    /// Percentage discounts are rounded to two decimals. Fixed discounts are
    /// capped at the subtotal, so the result never exceeds it.
    ///
    /// # Errors
    ///
    /// Returns why the code cannot be applied right now.
    pub fn evaluate(&self, now: DateTime<Utc>, subtotal: Decimal) -> Result<Decimal, DiscountError> {
        if !self.is_active {
            return Err(DiscountError::Inactive);
        }
        if self.starts_at.is_some_and(|starts| now < starts) {
            return Err(DiscountError::NotStarted);
        }
        if self.ends_at.is_some_and(|ends| now >= ends) {
            return Err(DiscountError::Expired);
        }
        if self.is_exhausted() {
            return Err(DiscountError::UsageLimitReached);
        }
        if subtotal <= Decimal::ZERO {
            return Err(DiscountError::EmptySubtotal);
        }

        let amount = match self.kind {
            DiscountKind::Percentage => round_money(subtotal * self.value / Decimal::ONE_HUNDRED),
            DiscountKind::Fixed => round_money(self.value),
        };

        Ok(amount.min(subtotal))
    }
}

/// Canonical form of a code as typed by a customer: trimmed and upper-cased.
///
/// ```
/// use pazar_core::normalize_code;
///
/// assert_eq!(normalize_code("  summer10 "), "SUMMER10");
/// ```
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn is_valid_code(code: &str) -> bool {
    (MIN_CODE_LEN..=MAX_CODE_LEN).contains(&code.len())
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

/// Generate a random code of `len` characters from an unambiguous alphabet.
///
/// `len` is clamped to [`MIN_CODE_LEN`]..=[`MAX_CODE_LEN`].
#[must_use]
pub fn generate_code(len: usize) -> String {
    let len = len.clamp(MIN_CODE_LEN, MAX_CODE_LEN);
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            char::from(CODE_ALPHABET[idx])
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn rule(kind: DiscountKind, value: &str) -> DiscountRule {
        DiscountRule {
            code: "SUMMER10".to_string(),
            kind,
            value: dec(value),
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            usage_count: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_percentage_is_rounded() {
        let r = rule(DiscountKind::Percentage, "15");
        assert_eq!(r.evaluate(now(), dec("33.33")).unwrap(), dec("5.00"));
        assert_eq!(r.evaluate(now(), dec("10.10")).unwrap(), dec("1.52"));
    }

    #[test]
    fn test_fixed_is_capped_at_subtotal() {
        let r = rule(DiscountKind::Fixed, "20");
        assert_eq!(r.evaluate(now(), dec("50")).unwrap(), dec("20"));
        assert_eq!(r.evaluate(now(), dec("12.40")).unwrap(), dec("12.40"));
    }

    #[test]
    fn test_full_percentage_takes_everything() {
        let r = rule(DiscountKind::Percentage, "100");
        assert_eq!(r.evaluate(now(), dec("42.10")).unwrap(), dec("42.10"));
    }

    #[test]
    fn test_inactive() {
        let mut r = rule(DiscountKind::Fixed, "5");
        r.is_active = false;
        assert_eq!(r.evaluate(now(), dec("10")), Err(DiscountError::Inactive));
    }

    #[test]
    fn test_window() {
        let mut r = rule(DiscountKind::Fixed, "5");
        r.starts_at = Some(now() + Duration::hours(1));
        assert_eq!(r.evaluate(now(), dec("10")), Err(DiscountError::NotStarted));

        r.starts_at = Some(now() - Duration::days(2));
        r.ends_at = Some(now());
        assert_eq!(r.evaluate(now(), dec("10")), Err(DiscountError::Expired));

        r.ends_at = Some(now() + Duration::seconds(1));
        assert!(r.evaluate(now(), dec("10")).is_ok());
    }

    #[test]
    fn test_usage_limit() {
        let mut r = rule(DiscountKind::Fixed, "5");
        r.usage_limit = Some(3);
        r.usage_count = 2;
        assert!(r.evaluate(now(), dec("10")).is_ok());
        r.usage_count = 3;
        assert_eq!(
            r.evaluate(now(), dec("10")),
            Err(DiscountError::UsageLimitReached)
        );
    }

    #[test]
    fn test_empty_subtotal() {
        let r = rule(DiscountKind::Percentage, "10");
        assert_eq!(
            r.evaluate(now(), Decimal::ZERO),
            Err(DiscountError::EmptySubtotal)
        );
    }

    #[test]
    fn test_validate_definition() {
        assert!(rule(DiscountKind::Percentage, "100").validate_definition().is_ok());
        assert_eq!(
            rule(DiscountKind::Percentage, "100.01").validate_definition(),
            Err(DiscountError::InvalidPercentage)
        );
        assert_eq!(
            rule(DiscountKind::Percentage, "0").validate_definition(),
            Err(DiscountError::InvalidPercentage)
        );
        assert_eq!(
            rule(DiscountKind::Fixed, "-1").validate_definition(),
            Err(DiscountError::InvalidAmount)
        );

        let mut r = rule(DiscountKind::Fixed, "5");
        r.starts_at = Some(now());
        r.ends_at = Some(now());
        assert_eq!(r.validate_definition(), Err(DiscountError::InvalidWindow));

        let mut r = rule(DiscountKind::Fixed, "5");
        r.code = "ab".to_string();
        assert_eq!(r.validate_definition(), Err(DiscountError::InvalidCode));
    }

    #[test]
    fn test_generate_code() {
        let code = generate_code(8);
        assert_eq!(code.len(), 8);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert_eq!(generate_code(1).len(), MIN_CODE_LEN);
        assert_eq!(generate_code(500).len(), MAX_CODE_LEN);
        assert!(is_valid_code(&generate_code(10)));
    }

    #[test]
    fn test_kind_text() {
        assert_eq!("fixed".parse::<DiscountKind>().unwrap(), DiscountKind::Fixed);
        assert!("bogo".parse::<DiscountKind>().is_err());
    }
}
