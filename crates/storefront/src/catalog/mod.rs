//! Catalog fetching.
//!
//! # Architecture
//!
//! - The catalog is a flat JSON array served from a fixed URL
//! - One `GET` per fetch; no retry loop, no cache - the user retries manually
//! - [`CatalogSource`] is the seam the session depends on; [`CatalogClient`]
//!   is the HTTP implementation and [`StaticCatalog`] serves a fixed list

mod client;

pub use client::CatalogClient;

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use flash_core::CatalogItem;
use thiserror::Error;

/// Errors that can occur when fetching the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-success status.
    #[error("Catalog endpoint returned {status}")]
    Status {
        /// HTTP status code.
        status: u16,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that can produce the full catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every item. Callers re-invoke on error.
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogError>;
}

/// A fixed, in-process catalog.
///
/// Can be switched offline to exercise the error path.
#[derive(Debug, Default)]
pub struct StaticCatalog {
    items: Vec<CatalogItem>,
    offline: AtomicBool,
}

impl StaticCatalog {
    #[must_use]
    pub const fn new(items: Vec<CatalogItem>) -> Self {
        Self {
            items,
            offline: AtomicBool::new(false),
        }
    }

    /// Make subsequent fetches fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CatalogError::Status { status: 503 });
        }
        Ok(self.items.clone())
    }
}
