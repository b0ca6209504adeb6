//! Pazar Core - domain types and business rules.
//!
//! This crate is shared by every Pazar component:
//! - `storefront` - Public JSON API (catalog, checkout, tracking)
//! - `admin` - Back-office JSON API (catalog, stock, orders, media)
//! - `cli` - Migrations, seeding and one-off management commands
//!
//! # Architecture
//!
//! The core crate holds types and pure functions only - no HTTP and no
//! runtime database access. The optional `postgres` feature adds `sqlx`
//! encode/decode impls for the newtypes so the servers can bind them directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, phones and statuses
//! - [`delivery`] - Delivery methods and their fixed costs
//! - [`discount`] - Discount rules and code handling
//! - [`variants`] - Variant combination generation
//! - [`checkout`] - Cart merging, checkout form validation and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod checkout;
pub mod delivery;
pub mod discount;
pub mod types;
pub mod variants;

pub use checkout::{
    CartLine, CheckoutError, CheckoutForm, DeliveryDetails, FieldError, OrderTotals,
    ValidCheckout, merge_lines,
};
pub use delivery::{DeliveryMethod, DeliveryOption, delivery_cost, delivery_options};
pub use discount::{DiscountError, DiscountKind, DiscountRule, generate_code, normalize_code};
pub use types::*;
pub use variants::{
    Combination, OptionSet, VariantError, combination_count, generate_combinations, suggest_sku,
};
