//! Pazar storefront library.
//!
//! Public JSON API for the shop: catalog reads, cart pricing, discount
//! previews, Econt office lookup, checkout and anonymous visitor tracking.
//! The binary in `main.rs` wires these modules into a server; tests and the
//! integration suite build the same router through [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod econt;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
