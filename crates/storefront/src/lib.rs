//! Flash Storefront - headless client core for the Flash grocery app.
//!
//! Everything the screens need lives behind a [`session::Session`]: catalog
//! download, category browsing, phone sign-in, the cart mirrored to a
//! realtime store, and the bill. Rendering is left to the embedding app,
//! which observes the session's watch channels.
//!
//! # Backends
//!
//! Each external service sits behind a trait with an HTTP implementation and
//! an in-memory one:
//!
//! | Service | Trait | HTTP | In-memory |
//! |---------|-------|------|-----------|
//! | Catalog | [`catalog::CatalogSource`] | [`catalog::CatalogClient`] | [`catalog::StaticCatalog`] |
//! | Cart store | [`cart::RemoteCart`] | [`cart::RealtimeDbCart`] | [`cart::InMemoryCart`] |
//! | Phone auth | [`auth::AuthProvider`] | [`auth::IdentityToolkitAuth`] | [`auth::InMemoryAuth`] |

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod navigation;
pub mod session;
pub mod splash;
pub mod telemetry;

pub use session::{CatalogOutcome, Session};
