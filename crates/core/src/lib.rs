//! Flash Core - Shared types and pure storefront logic.
//!
//! This crate provides the types and calculations used by the Flash client:
//! - `flash-storefront` - Session coordinator, service traits and backends
//! - `flash-integration-tests` - Cross-crate tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no async,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Items, prices, ids, phone numbers, OTP codes and status enums
//! - [`catalog`] - Category filtering
//! - [`cart`] - Display grouping of cart entries
//! - [`bill`] - Checkout bill computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bill;
pub mod cart;
pub mod catalog;
pub mod types;

pub use bill::Bill;
pub use cart::{CartLine, group_for_display};
pub use catalog::{count_in_category, filter_by_category};
pub use types::*;
