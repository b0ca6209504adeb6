//! Domain models for the storefront API.
//!
//! These are the shapes returned to shoppers. Database row types stay private
//! to the `db` module and convert into these.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod settings;

pub use cart::{CartIssue, CartSummary, PricedLine, price_cart};
pub use catalog::{
    Page, ProductDetail, ProductFilter, ProductOption, ProductSummary, ProductTypeView,
    VariantOption, VariantStock, VariantView, collect_options, media_url,
};
pub use order::PlacedOrder;
pub use settings::{SocialLinks, StoreSettings};
