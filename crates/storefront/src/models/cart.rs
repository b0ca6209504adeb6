//! Pricing a cart against current variant prices and stock.

use rust_decimal::Decimal;
use serde::Serialize;

use pazar_core::{CartLine, ProductId, VariantId, round_money};

use super::catalog::VariantStock;

/// A cart line priced at the current variant price.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub image_url: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub available: i32,
}

/// Why a cart line cannot be bought as requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartIssue {
    /// The variant does not exist or is hidden.
    Unavailable { variant_id: VariantId },
    /// Not enough units in stock.
    InsufficientStock {
        variant_id: VariantId,
        requested: u32,
        available: i32,
    },
}

impl std::fmt::Display for CartIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable { variant_id } => {
                write!(f, "variant {variant_id} is no longer available")
            }
            Self::InsufficientStock {
                variant_id,
                requested,
                available,
            } => write!(
                f,
                "variant {variant_id}: requested {requested}, only {available} in stock"
            ),
        }
    }
}

/// A priced cart with any problems found.
#[derive(Debug, Clone, Serialize)]
pub struct CartSummary {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
    pub issues: Vec<CartIssue>,
}

impl CartSummary {
    /// Rewrite line images against the public media URL.
    pub fn resolve_media(&mut self, media_base_url: &str) {
        for line in &mut self.lines {
            super::catalog::resolve(media_base_url, &mut line.image_url);
        }
    }

    /// The cart can be ordered as-is.
    #[must_use]
    pub fn is_orderable(&self) -> bool {
        self.issues.is_empty() && !self.lines.is_empty()
    }
}

/// Price merged cart lines against current stock.
///
/// Lines whose variant is missing or hidden are reported and left out of the
/// subtotal. Lines short on stock are priced but reported.
#[must_use]
pub fn price_cart(lines: &[CartLine], stock: &[VariantStock]) -> CartSummary {
    let mut priced = Vec::with_capacity(lines.len());
    let mut issues = Vec::new();

    for line in lines {
        let Some(variant) = stock
            .iter()
            .find(|v| v.variant_id == line.variant_id && v.is_visible)
        else {
            issues.push(CartIssue::Unavailable {
                variant_id: line.variant_id,
            });
            continue;
        };

        if i64::from(line.quantity) > i64::from(variant.quantity) {
            issues.push(CartIssue::InsufficientStock {
                variant_id: line.variant_id,
                requested: line.quantity,
                available: variant.quantity.max(0),
            });
        }

        priced.push(PricedLine {
            variant_id: variant.variant_id,
            product_id: variant.product_id,
            product_name: variant.product_name.clone(),
            sku: variant.sku.clone(),
            image_url: variant.image_url.clone(),
            unit_price: variant.price,
            quantity: line.quantity,
            line_total: round_money(variant.price * Decimal::from(line.quantity)),
            available: variant.quantity,
        });
    }

    CartSummary {
        subtotal: priced.iter().map(|l| l.line_total).sum(),
        item_count: priced.iter().map(|l| l.quantity).sum(),
        lines: priced,
        issues,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stock(id: i32, price: &str, quantity: i32) -> VariantStock {
        VariantStock {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(100 + id),
            product_name: format!("Product {id}"),
            sku: format!("SKU-{id}"),
            price: price.parse().unwrap(),
            quantity,
            is_visible: true,
            image_url: None,
        }
    }

    fn line(id: i32, quantity: u32) -> CartLine {
        CartLine {
            variant_id: VariantId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_prices_lines_and_subtotal() {
        let summary = price_cart(
            &[line(1, 2), line(2, 1)],
            &[stock(1, "12.50", 10), stock(2, "3.99", 5)],
        );
        assert!(summary.is_orderable());
        assert_eq!(summary.subtotal, "28.99".parse::<Decimal>().unwrap());
        assert_eq!(summary.item_count, 3);
    }

    #[test]
    fn test_line_images_resolve_against_media_url() {
        let mut with_image = stock(1, "4.00", 3);
        with_image.image_url = Some("mugs/blue.png".to_string());
        let mut summary = price_cart(&[line(1, 1)], &[with_image]);
        summary.resolve_media("https://shop.example.com/media");
        assert_eq!(
            summary.lines[0].image_url.as_deref(),
            Some("https://shop.example.com/media/mugs/blue.png")
        );
    }

    #[test]
    fn test_reports_missing_and_hidden() {
        let mut hidden = stock(2, "5", 5);
        hidden.is_visible = false;
        let summary = price_cart(&[line(1, 1), line(2, 1), line(3, 1)], &[stock(1, "5", 5), hidden]);
        assert_eq!(summary.lines.len(), 1);
        assert_eq!(
            summary.issues,
            vec![
                CartIssue::Unavailable {
                    variant_id: VariantId::new(2)
                },
                CartIssue::Unavailable {
                    variant_id: VariantId::new(3)
                },
            ]
        );
        assert!(!summary.is_orderable());
    }

    #[test]
    fn test_reports_insufficient_stock() {
        let summary = price_cart(&[line(1, 4)], &[stock(1, "2", 3)]);
        assert_eq!(
            summary.issues,
            vec![CartIssue::InsufficientStock {
                variant_id: VariantId::new(1),
                requested: 4,
                available: 3,
            }]
        );
        assert_eq!(summary.lines.len(), 1);
    }

    #[test]
    fn test_empty_cart_is_not_orderable() {
        assert!(!price_cart(&[], &[]).is_orderable());
    }
}
