//! Pazar admin library.
//!
//! Back-office JSON API: catalog and variant management, stock, discounts,
//! orders and customers, analytics, store settings and the media library.
//!
//! # Security
//!
//! Every `/api` route requires the bearer token from `ADMIN_API_TOKEN`.
//! This crate writes to the catalog and to uploaded media; keep it off the
//! public internet.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod storage;
