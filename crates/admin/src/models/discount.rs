//! Discount codes as managed by the back office.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pazar_core::{
    DiscountError, DiscountId, DiscountKind, DiscountRule, generate_code, normalize_code,
};

/// Length of codes generated when none is supplied.
pub const GENERATED_CODE_LEN: usize = 8;

#[derive(Debug, Clone, Serialize)]
pub struct Discount {
    pub id: DiscountId,
    #[serde(flatten)]
    pub rule: DiscountRule,
    /// Whether the code would be accepted right now (ignoring subtotal).
    pub is_usable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload. A missing code is generated on create.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountInput {
    #[serde(default)]
    pub code: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub usage_limit: Option<i32>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl DiscountInput {
    /// Build a validated rule. `usage_count` is carried over from the stored
    /// discount on update and zero on create.
    ///
    /// # Errors
    ///
    /// Returns the first rule violation.
    pub fn into_rule(self, usage_count: i32) -> Result<DiscountRule, DiscountError> {
        let code = self
            .code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| generate_code(GENERATED_CODE_LEN));

        let rule = DiscountRule {
            code,
            kind: self.kind,
            value: self.value,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            usage_limit: self.usage_limit,
            usage_count,
            is_active: self.is_active,
        };
        rule.validate_definition()?;
        Ok(rule)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountQuery {
    pub q: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateCodeQuery {
    pub length: Option<usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(code: Option<&str>, kind: DiscountKind, value: &str) -> DiscountInput {
        DiscountInput {
            code: code.map(String::from),
            kind,
            value: value.parse().unwrap(),
            starts_at: None,
            ends_at: None,
            usage_limit: None,
            is_active: true,
        }
    }

    #[test]
    fn test_code_is_normalized() {
        let rule = input(Some(" spring-10 "), DiscountKind::Percentage, "10")
            .into_rule(0)
            .unwrap();
        assert_eq!(rule.code, "SPRING-10");
    }

    #[test]
    fn test_missing_code_is_generated() {
        let rule = input(None, DiscountKind::Fixed, "5")
            .into_rule(0)
            .unwrap();
        assert_eq!(rule.code.len(), GENERATED_CODE_LEN);

        let blank = input(Some("   "), DiscountKind::Fixed, "5")
            .into_rule(0)
            .unwrap();
        assert_eq!(blank.code.len(), GENERATED_CODE_LEN);
    }

    #[test]
    fn test_invalid_definitions_rejected() {
        assert_eq!(
            input(Some("BIG"), DiscountKind::Percentage, "150").into_rule(0),
            Err(DiscountError::InvalidCode)
        );
        assert_eq!(
            input(Some("BIGSALE"), DiscountKind::Percentage, "150").into_rule(0),
            Err(DiscountError::InvalidPercentage)
        );
        assert_eq!(
            input(Some("ZERO"), DiscountKind::Fixed, "0").into_rule(0),
            Err(DiscountError::InvalidAmount)
        );
    }

    #[test]
    fn test_usage_count_carried_over() {
        let rule = input(Some("KEEP"), DiscountKind::Fixed, "2")
            .into_rule(7)
            .unwrap();
        assert_eq!(rule.usage_count, 7);
    }
}
