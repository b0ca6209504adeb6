//! Cart handling, checkout form validation and order totals.
//!
//! Validation collects every failing field rather than stopping at the
//! first one, so the storefront can mark all of them at once.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::delivery::DeliveryMethod;
use crate::discount::normalize_code;
use crate::types::{Email, Phone, VariantId, round_money};

/// Most units of a single variant allowed in one order.
pub const MAX_LINE_QUANTITY: u32 = 99;

const MAX_NAME_LEN: usize = 100;
const MAX_ADDRESS_LEN: usize = 200;
const MAX_NOTE_LEN: usize = 1000;

/// A requested quantity of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// A validation failure tied to a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("invalid checkout: {}", summarize(.0))]
    Invalid(Vec<FieldError>),
}

impl CheckoutError {
    /// The individual field failures.
    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        match self {
            Self::Invalid(fields) => fields,
        }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Combine lines for the same variant and check quantities.
///
/// Order of first appearance is preserved.
///
/// # Errors
///
/// Returns [`CheckoutError::Invalid`] for an empty cart, a zero quantity, or
/// a merged quantity above [`MAX_LINE_QUANTITY`].
pub fn merge_lines(lines: &[CartLine]) -> Result<Vec<CartLine>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::Invalid(vec![FieldError::new(
            "lines",
            "cart is empty",
        )]));
    }

    let mut merged: Vec<CartLine> = Vec::with_capacity(lines.len());
    let mut errors = Vec::new();

    for line in lines {
        if line.quantity == 0 {
            errors.push(FieldError::new(
                "lines",
                format!("quantity for variant {} must be at least 1", line.variant_id),
            ));
            continue;
        }
        match merged.iter_mut().find(|m| m.variant_id == line.variant_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
            }
            None => merged.push(*line),
        }
    }

    for line in &merged {
        if line.quantity > MAX_LINE_QUANTITY {
            errors.push(FieldError::new(
                "lines",
                format!(
                    "quantity for variant {} cannot exceed {MAX_LINE_QUANTITY}",
                    line.variant_id
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(merged)
    } else {
        Err(CheckoutError::Invalid(errors))
    }
}

/// Checkout form as submitted by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub delivery_method: Option<DeliveryMethod>,
    pub econt_office_code: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub note: Option<String>,
    pub discount_code: Option<String>,
    pub lines: Vec<CartLine>,
}

/// Where an order goes, with the fields each method needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DeliveryDetails {
    EcontOffice {
        office_code: String,
    },
    EcontAddress {
        city: String,
        address: String,
        postal_code: Option<String>,
    },
    Pickup,
}

impl DeliveryDetails {
    #[must_use]
    pub const fn method(&self) -> DeliveryMethod {
        match self {
            Self::EcontOffice { .. } => DeliveryMethod::EcontOffice,
            Self::EcontAddress { .. } => DeliveryMethod::EcontAddress,
            Self::Pickup => DeliveryMethod::Pickup,
        }
    }
}

/// A checkout form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCheckout {
    pub customer_name: String,
    pub email: Email,
    pub phone: Phone,
    pub delivery: DeliveryDetails,
    pub note: Option<String>,
    /// Normalized with [`normalize_code`].
    pub discount_code: Option<String>,
    /// Merged, one entry per variant.
    pub lines: Vec<CartLine>,
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_len(errors: &mut Vec<FieldError>, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
}

impl CheckoutForm {
    /// Validate every field and normalize the result.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Invalid`] listing each field that failed.
    pub fn validate(&self) -> Result<ValidCheckout, CheckoutError> {
        let mut errors = Vec::new();

        let customer_name = self.customer_name.trim().to_string();
        if customer_name.is_empty() {
            errors.push(FieldError::new("customer_name", "name is required"));
        }
        check_len(&mut errors, "customer_name", &customer_name, MAX_NAME_LEN);

        let email = Email::parse(&self.email)
            .map_err(|e| errors.push(FieldError::new("email", e.to_string())))
            .ok();
        let phone = Phone::parse(&self.phone)
            .map_err(|e| errors.push(FieldError::new("phone", e.to_string())))
            .ok();

        let delivery = match self.delivery_method {
            None => {
                errors.push(FieldError::new(
                    "delivery_method",
                    "delivery method is required",
                ));
                None
            }
            Some(DeliveryMethod::Pickup) => Some(DeliveryDetails::Pickup),
            Some(DeliveryMethod::EcontOffice) => {
                if let Some(office_code) = non_blank(self.econt_office_code.as_ref()) {
                    Some(DeliveryDetails::EcontOffice { office_code })
                } else {
                    errors.push(FieldError::new(
                        "econt_office_code",
                        "choose an Econt office",
                    ));
                    None
                }
            }
            Some(DeliveryMethod::EcontAddress) => {
                let city = non_blank(self.city.as_ref());
                let address = non_blank(self.address.as_ref());
                if city.is_none() {
                    errors.push(FieldError::new("city", "city is required"));
                }
                if address.is_none() {
                    errors.push(FieldError::new("address", "address is required"));
                }
                match (city, address) {
                    (Some(city), Some(address)) => {
                        check_len(&mut errors, "city", &city, MAX_ADDRESS_LEN);
                        check_len(&mut errors, "address", &address, MAX_ADDRESS_LEN);
                        Some(DeliveryDetails::EcontAddress {
                            city,
                            address,
                            postal_code: non_blank(self.postal_code.as_ref()),
                        })
                    }
                    _ => None,
                }
            }
        };

        let note = non_blank(self.note.as_ref());
        if let Some(note) = &note {
            check_len(&mut errors, "note", note, MAX_NOTE_LEN);
        }

        let discount_code = self
            .discount_code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());

        let lines = merge_lines(&self.lines)
            .map_err(|e| errors.extend(e.fields().iter().cloned()))
            .ok();

        match (email, phone, delivery, lines) {
            (Some(email), Some(phone), Some(delivery), Some(lines)) if errors.is_empty() => {
                Ok(ValidCheckout {
                    customer_name,
                    email,
                    phone,
                    delivery,
                    note,
                    discount_code,
                    lines,
                })
            }
            _ => Err(CheckoutError::Invalid(errors)),
        }
    }
}

/// Money summary of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// `total = subtotal - discount + delivery`.
    ///
    /// The discount is clamped to `0..=subtotal`, so the total is never negative
    /// and never below the delivery cost.
    #[must_use]
    pub fn compute(subtotal: Decimal, discount: Decimal, delivery: Decimal) -> Self {
        let subtotal = round_money(subtotal.max(Decimal::ZERO));
        let discount = round_money(discount.clamp(Decimal::ZERO, subtotal));
        let delivery = round_money(delivery.max(Decimal::ZERO));
        Self {
            subtotal,
            discount,
            delivery,
            total: subtotal - discount + delivery,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(variant: i32, quantity: u32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(variant),
            quantity,
        }
    }

    fn form() -> CheckoutForm {
        CheckoutForm {
            customer_name: " Maria Ivanova ".to_string(),
            email: "Maria@Example.BG".to_string(),
            phone: "0888 123 456".to_string(),
            delivery_method: Some(DeliveryMethod::EcontOffice),
            econt_office_code: Some("1000".to_string()),
            discount_code: Some(" summer10 ".to_string()),
            lines: vec![line(1, 2)],
            ..CheckoutForm::default()
        }
    }

    fn fields(err: &CheckoutError) -> Vec<&'static str> {
        err.fields().iter().map(|f| f.field).collect()
    }

    #[test]
    fn test_merge_sums_duplicates_in_order() {
        let merged = merge_lines(&[line(2, 1), line(1, 3), line(2, 4)]).unwrap();
        assert_eq!(merged, vec![line(2, 5), line(1, 3)]);
    }

    #[test]
    fn test_merge_rejects_bad_quantities() {
        assert!(merge_lines(&[]).is_err());
        assert!(merge_lines(&[line(1, 0)]).is_err());
        assert!(merge_lines(&[line(1, 99)]).is_ok());
        assert!(merge_lines(&[line(1, 50), line(1, 50)]).is_err());
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.customer_name, "Maria Ivanova");
        assert_eq!(valid.email.as_str(), "maria@example.bg");
        assert_eq!(valid.phone.as_str(), "+359888123456");
        assert_eq!(valid.discount_code.as_deref(), Some("SUMMER10"));
        assert_eq!(
            valid.delivery,
            DeliveryDetails::EcontOffice {
                office_code: "1000".to_string()
            }
        );
    }

    #[test]
    fn test_collects_all_field_errors() {
        let bad = CheckoutForm {
            customer_name: "  ".to_string(),
            email: "nope".to_string(),
            phone: "12345".to_string(),
            delivery_method: None,
            ..CheckoutForm::default()
        };
        let err = bad.validate().unwrap_err();
        assert_eq!(
            fields(&err),
            vec!["customer_name", "email", "phone", "delivery_method", "lines"]
        );
    }

    #[test]
    fn test_office_requires_code() {
        let mut f = form();
        f.econt_office_code = Some("   ".to_string());
        assert_eq!(fields(&f.validate().unwrap_err()), vec!["econt_office_code"]);
    }

    #[test]
    fn test_address_requires_city_and_address() {
        let mut f = form();
        f.delivery_method = Some(DeliveryMethod::EcontAddress);
        f.city = Some("Plovdiv".to_string());
        assert_eq!(fields(&f.validate().unwrap_err()), vec!["address"]);

        f.address = Some("ul. Glavna 1".to_string());
        let valid = f.validate().unwrap();
        assert_eq!(valid.delivery.method(), DeliveryMethod::EcontAddress);
    }

    #[test]
    fn test_pickup_needs_no_address() {
        let mut f = form();
        f.delivery_method = Some(DeliveryMethod::Pickup);
        f.econt_office_code = None;
        assert_eq!(f.validate().unwrap().delivery, DeliveryDetails::Pickup);
    }

    #[test]
    fn test_blank_discount_code_is_dropped() {
        let mut f = form();
        f.discount_code = Some("   ".to_string());
        assert!(f.validate().unwrap().discount_code.is_none());
    }

    #[test]
    fn test_totals() {
        let t = OrderTotals::compute(dec("100"), dec("15"), dec("5.90"));
        assert_eq!(t.total, dec("90.90"));

        let capped = OrderTotals::compute(dec("10"), dec("25"), dec("8.90"));
        assert_eq!(capped.discount, dec("10"));
        assert_eq!(capped.total, dec("8.90"));

        let negative = OrderTotals::compute(dec("10"), dec("-3"), Decimal::ZERO);
        assert_eq!(negative.discount, Decimal::ZERO);
        assert_eq!(negative.total, dec("10"));
    }
}
