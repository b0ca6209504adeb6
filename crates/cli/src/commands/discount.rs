//! Discount code management.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use pazar_admin::db::DiscountRepository;
use pazar_admin::models::DiscountInput;
use pazar_core::DiscountKind;

use super::{CliError, connect};

/// Arguments of `discount create`.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub code: Option<String>,
    pub kind: DiscountKind,
    pub value: Decimal,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<NewDiscount> for DiscountInput {
    fn from(d: NewDiscount) -> Self {
        Self {
            code: d.code,
            kind: d.kind,
            value: d.value,
            starts_at: d.starts_at,
            ends_at: d.ends_at,
            usage_limit: d.usage_limit,
            is_active: d.is_active,
        }
    }
}

/// Validate and insert a discount, logging the final code.
///
/// # Errors
///
/// Returns an error for an invalid definition, a duplicate code or a
/// database failure.
pub async fn create(discount: NewDiscount) -> Result<(), CliError> {
    // Validate before touching the database.
    let rule = DiscountInput::from(discount).into_rule(0)?;

    let pool = connect().await?;
    let created = DiscountRepository::new(&pool).create(&rule).await?;

    tracing::info!(
        id = %created.id,
        code = %created.rule.code,
        kind = created.rule.kind.as_str(),
        value = %created.rule.value,
        "Discount created"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_discount(kind: DiscountKind, value: Decimal) -> NewDiscount {
        NewDiscount {
            code: Some(" spring10 ".to_string()),
            kind,
            value,
            usage_limit: None,
            starts_at: None,
            ends_at: None,
            is_active: true,
        }
    }

    #[test]
    fn test_code_is_normalized() {
        let rule = DiscountInput::from(new_discount(DiscountKind::Percentage, Decimal::TEN))
            .into_rule(0)
            .unwrap();
        assert_eq!(rule.code, "SPRING10");
        assert_eq!(rule.usage_count, 0);
    }

    #[test]
    fn test_invalid_percentage_is_rejected() {
        let result = DiscountInput::from(new_discount(
            DiscountKind::Percentage,
            Decimal::from(101),
        ))
        .into_rule(0);
        assert!(result.is_err());
    }
}
