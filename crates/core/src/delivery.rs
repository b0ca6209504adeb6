//! Delivery methods and their fixed prices.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::round_money;

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Courier to an Econt office chosen by the customer.
    EcontOffice,
    /// Econt courier to a street address.
    EcontAddress,
    /// Collected from the shop.
    Pickup,
}

impl DeliveryMethod {
    /// All methods, in the order they are offered at checkout.
    pub const ALL: [Self; 3] = [Self::EcontOffice, Self::EcontAddress, Self::Pickup];

    /// Text representation stored in `orders.delivery_method`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::EcontOffice => "econt_office",
            Self::EcontAddress => "econt_address",
            Self::Pickup => "pickup",
        }
    }

    /// Label shown to customers.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::EcontOffice => "Econt office",
            Self::EcontAddress => "Econt to address",
            Self::Pickup => "Pickup from store",
        }
    }

    /// Whether an Econt office code must be supplied.
    #[must_use]
    pub const fn requires_office(&self) -> bool {
        matches!(self, Self::EcontOffice)
    }

    /// Whether a city and street address must be supplied.
    #[must_use]
    pub const fn requires_address(&self) -> bool {
        matches!(self, Self::EcontAddress)
    }
}

impl std::fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "econt_office" => Ok(Self::EcontOffice),
            "econt_address" => Ok(Self::EcontAddress),
            "pickup" => Ok(Self::Pickup),
            _ => Err(format!("invalid delivery method: {s}")),
        }
    }
}

/// Delivery price for a method.
#[must_use]
pub fn delivery_cost(method: DeliveryMethod) -> Decimal {
    let amount = match method {
        DeliveryMethod::EcontOffice => Decimal::new(590, 2),
        DeliveryMethod::EcontAddress => Decimal::new(890, 2),
        DeliveryMethod::Pickup => Decimal::ZERO,
    };
    round_money(amount)
}

/// A delivery option as presented at checkout.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOption {
    pub method: DeliveryMethod,
    pub label: &'static str,
    pub cost: Decimal,
    pub requires_office: bool,
    pub requires_address: bool,
}

/// Every delivery option with its price.
#[must_use]
pub fn delivery_options() -> Vec<DeliveryOption> {
    DeliveryMethod::ALL
        .into_iter()
        .map(|method| DeliveryOption {
            method,
            label: method.label(),
            cost: delivery_cost(method),
            requires_office: method.requires_office(),
            requires_address: method.requires_address(),
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_table() {
        assert_eq!(
            delivery_cost(DeliveryMethod::EcontOffice),
            Decimal::new(590, 2)
        );
        assert_eq!(
            delivery_cost(DeliveryMethod::EcontAddress),
            Decimal::new(890, 2)
        );
        assert!(delivery_cost(DeliveryMethod::Pickup).is_zero());
    }

    #[test]
    fn test_requirements() {
        assert!(DeliveryMethod::EcontOffice.requires_office());
        assert!(!DeliveryMethod::EcontOffice.requires_address());
        assert!(DeliveryMethod::EcontAddress.requires_address());
        assert!(!DeliveryMethod::Pickup.requires_office());
        assert!(!DeliveryMethod::Pickup.requires_address());
    }

    #[test]
    fn test_text_roundtrip() {
        for method in DeliveryMethod::ALL {
            assert_eq!(method.as_str().parse::<DeliveryMethod>().unwrap(), method);
        }
        let json = serde_json::to_string(&DeliveryMethod::EcontAddress).unwrap();
        assert_eq!(json, "\"econt_address\"");
    }

    #[test]
    fn test_options_cover_every_method() {
        let options = delivery_options();
        assert_eq!(options.len(), 3);
        assert_eq!(options.first().unwrap().method, DeliveryMethod::EcontOffice);
    }
}
