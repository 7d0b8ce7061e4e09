//! HTTP catalog client.

use std::sync::Arc;

use async_trait::async_trait;
use flash_core::CatalogItem;
use tracing::instrument;
use url::Url;

use super::{CatalogError, CatalogSource};

/// Client for the catalog JSON endpoint.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    url: Url,
}

impl CatalogClient {
    /// Create a new catalog client for `url`.
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    /// Create a catalog client sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, url: Url) -> Self {
        Self {
            inner: Arc::new(CatalogClientInner { client, url }),
        }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    #[instrument(skip(self), fields(url = %self.inner.url))]
    async fn fetch(&self) -> Result<Vec<CatalogItem>, CatalogError> {
        let response = self.inner.client.get(self.inner.url.clone()).send().await?;

        let status = response.status();
        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Catalog endpoint returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        let items: Vec<CatalogItem> = match serde_json::from_str(&body) {
            Ok(items) => items,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %body.chars().take(500).collect::<String>(),
                    "Failed to parse catalog response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        tracing::info!(count = items.len(), "Catalog fetched");
        Ok(items)
    }
}
