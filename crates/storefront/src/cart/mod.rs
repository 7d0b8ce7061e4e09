//! The signed-in user's cart.
//!
//! # Architecture
//!
//! - The cart is a flat list with one [`CatalogItem`] per unit added
//! - [`Cart`] keeps a local copy in a watch channel and mirrors every change
//!   to a [`RemoteCart`] under the user's id
//! - While a listener is attached, every remote snapshot replaces the local
//!   copy wholesale, so the remote store is the source of truth
//! - Removing deletes exactly one remote record, the first equal one in store
//!   order

mod memory;
mod realtime;

pub use memory::InMemoryCart;
pub use realtime::RealtimeDbCart;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flash_core::{Bill, CartLine, CatalogItem, RecordKey, group_for_display};
use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::auth::User;
use crate::error::capture_background;

/// First wait before subscribing again after the change stream ends.
const INITIAL_RESUBSCRIBE_DELAY: Duration = Duration::from_millis(500);

/// Max wait between resubscribe attempts.
const MAX_RESUBSCRIBE_DELAY: Duration = Duration::from_secs(30);

/// Errors that can occur when talking to the remote cart store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Store answered with a non-success status.
    #[error("Store returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The change stream broke or was cancelled by the store.
    #[error("Stream error: {0}")]
    Stream(String),

    /// The store refused the user's credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A cart operation was attempted with nobody signed in.
    #[error("No user is signed in")]
    NotSignedIn,
}

/// One stored cart entry and the key the store assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRecord {
    pub key: RecordKey,
    pub item: CatalogItem,
}

/// Stream of full cart snapshots, in store order.
pub type SnapshotStream = BoxStream<'static, Result<Vec<CartRecord>, StoreError>>;

/// Per-user remote storage of cart entries.
#[async_trait]
pub trait RemoteCart: Send + Sync {
    /// Store one entry under a fresh key.
    async fn push(&self, user: &User, item: &CatalogItem) -> Result<RecordKey, StoreError>;

    /// Every entry for `user`, in store order.
    async fn children(&self, user: &User) -> Result<Vec<CartRecord>, StoreError>;

    /// Delete the entry stored under `key`.
    async fn delete(&self, user: &User, key: &RecordKey) -> Result<(), StoreError>;

    /// Current snapshot followed by one snapshot per change.
    fn subscribe(&self, user: &User) -> SnapshotStream;
}

/// Local cart mirrored to a [`RemoteCart`].
pub struct Cart {
    remote: Arc<dyn RemoteCart>,
    user: Option<User>,
    items: Arc<watch::Sender<Vec<CatalogItem>>>,
    last_error: Arc<watch::Sender<Option<String>>>,
    listener: Option<JoinHandle<()>>,
}

impl Cart {
    /// An empty cart with no user bound.
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteCart>) -> Self {
        let (items, _) = watch::channel(Vec::new());
        let (last_error, _) = watch::channel(None);
        Self {
            remote,
            user: None,
            items: Arc::new(items),
            last_error: Arc::new(last_error),
            listener: None,
        }
    }

    /// Attach the cart to `user`. A different user drops the old listener.
    pub fn bind(&mut self, user: User) {
        if self.user.as_ref().is_some_and(|u| u.uid != user.uid) {
            self.detach();
        }
        self.user = Some(user);
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Append one unit locally, then store it remotely.
    ///
    /// The local entry stays even if the remote write fails; the failure is
    /// recorded and returned.
    #[instrument(skip(self, item), fields(item = %item.name))]
    pub async fn add(&mut self, item: CatalogItem) -> Result<RecordKey, StoreError> {
        let user = self.user.clone().ok_or(StoreError::NotSignedIn)?;

        self.items.send_modify(|items| items.push(item.clone()));

        match self.remote.push(&user, &item).await {
            Ok(key) => {
                tracing::debug!(key = %key, "Cart entry stored");
                Ok(key)
            }
            Err(e) => {
                self.record_error(&e);
                Err(e)
            }
        }
    }

    /// Delete one stored entry equal to `item`.
    ///
    /// Returns `Ok(false)` when no stored entry matches.
    #[instrument(skip(self, item), fields(item = %item.name))]
    pub async fn remove(&mut self, item: &CatalogItem) -> Result<bool, StoreError> {
        let user = self.user.clone().ok_or(StoreError::NotSignedIn)?;

        let records = match self.remote.children(&user).await {
            Ok(records) => records,
            Err(e) => {
                self.record_error(&e);
                return Err(e);
            }
        };

        let Some(record) = records.into_iter().find(|r| &r.item == item) else {
            tracing::debug!("No stored entry matches");
            return Ok(false);
        };

        if let Err(e) = self.remote.delete(&user, &record.key).await {
            self.record_error(&e);
            return Err(e);
        }

        // Without a listener nothing else will update the local copy.
        if !self.is_listening() {
            self.items.send_modify(|items| {
                if let Some(pos) = items.iter().position(|i| i == item) {
                    items.remove(pos);
                }
            });
        }

        tracing::debug!(key = %record.key, "Cart entry deleted");
        Ok(true)
    }

    /// Start listening for remote changes.
    ///
    /// The listener subscribes again with exponential backoff whenever the
    /// change stream ends, until [`Self::detach`] or drop.
    ///
    /// Returns `Ok(false)` if a listener is already running.
    pub fn sync(&mut self) -> Result<bool, StoreError> {
        let user = self.user.clone().ok_or(StoreError::NotSignedIn)?;
        if self.is_listening() {
            return Ok(false);
        }

        let remote = Arc::clone(&self.remote);
        let items = Arc::clone(&self.items);
        let last_error = Arc::clone(&self.last_error);

        self.listener = Some(tokio::spawn(async move {
            let mut reconnect_delay = INITIAL_RESUBSCRIBE_DELAY;
            loop {
                let mut snapshots = remote.subscribe(&user);
                while let Some(snapshot) = snapshots.next().await {
                    match snapshot {
                        Ok(records) => {
                            tracing::debug!(user = %user.uid, entries = records.len(), "Cart snapshot");
                            items.send_replace(records.into_iter().map(|r| r.item).collect());
                            reconnect_delay = INITIAL_RESUBSCRIBE_DELAY;
                        }
                        Err(e) => {
                            last_error.send_replace(Some(e.to_string()));
                            capture_background("cart listener", &e);
                        }
                    }
                }

                tracing::warn!(
                    user = %user.uid,
                    delay_ms = u64::try_from(reconnect_delay.as_millis()).unwrap_or(u64::MAX),
                    "Cart change stream ended, resubscribing"
                );
                tokio::time::sleep(reconnect_delay).await;
                reconnect_delay = (reconnect_delay * 2).min(MAX_RESUBSCRIBE_DELAY);
            }
        }));

        Ok(true)
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.listener.as_ref().is_some_and(|l| !l.is_finished())
    }

    /// Stop listening, empty the local copy and unbind the user.
    pub fn detach(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        self.items.send_replace(Vec::new());
        self.user = None;
    }

    /// Snapshot of the local entries.
    #[must_use]
    pub fn items(&self) -> Vec<CatalogItem> {
        self.items.borrow().clone()
    }

    /// Observe the local entries.
    #[must_use]
    pub fn watch_items(&self) -> watch::Receiver<Vec<CatalogItem>> {
        self.items.subscribe()
    }

    /// Entries grouped for display.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        group_for_display(&self.items.borrow())
    }

    /// Number of units in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// The bill, or `None` for an empty cart.
    #[must_use]
    pub fn bill(&self) -> Option<Bill> {
        let items = self.items.borrow();
        (!items.is_empty()).then(|| Bill::from_items(&items))
    }

    /// Most recent remote failure, kept until cleared.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    #[must_use]
    pub fn watch_error(&self) -> watch::Receiver<Option<String>> {
        self.last_error.subscribe()
    }

    pub fn clear_error(&self) {
        self.last_error.send_replace(None);
    }

    fn record_error(&self, err: &StoreError) {
        self.last_error.send_replace(Some(err.to_string()));
        capture_background("cart write", err);
    }
}

impl Drop for Cart {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}
