//! In-process cart store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_stream::stream;
use async_trait::async_trait;
use flash_core::{CatalogItem, RecordKey, UserId};
use futures::StreamExt;
use tokio::sync::watch;

use super::{CartRecord, RemoteCart, SnapshotStream, StoreError};
use crate::auth::User;

type Records = BTreeMap<RecordKey, CatalogItem>;

/// A [`RemoteCart`] held in memory, shared between clones.
///
/// Keys are zero-padded counters, so store order is insertion order. Can be
/// switched offline to exercise write failures.
#[derive(Clone, Default)]
pub struct InMemoryCart {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    next_key: AtomicU64,
    offline: AtomicBool,
    carts: Mutex<HashMap<UserId, Arc<watch::Sender<Records>>>>,
}

impl InMemoryCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent reads and writes fail (or succeed again).
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// End every open subscription. Stored entries are kept.
    pub fn disconnect(&self) {
        let mut carts = self
            .inner
            .carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for sender in carts.values_mut() {
            let records = sender.borrow().clone();
            *sender = Arc::new(watch::channel(records).0);
        }
    }

    /// Number of entries stored for `uid`.
    #[must_use]
    pub fn record_count(&self, uid: &UserId) -> usize {
        self.cart(uid).borrow().len()
    }

    fn cart(&self, uid: &UserId) -> Arc<watch::Sender<Records>> {
        let mut carts = self
            .inner
            .carts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            carts
                .entry(uid.clone())
                .or_insert_with(|| Arc::new(watch::channel(Records::new()).0)),
        )
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                message: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

fn to_records(records: &Records) -> Vec<CartRecord> {
    records
        .iter()
        .map(|(key, item)| CartRecord {
            key: key.clone(),
            item: item.clone(),
        })
        .collect()
}

#[async_trait]
impl RemoteCart for InMemoryCart {
    async fn push(&self, user: &User, item: &CatalogItem) -> Result<RecordKey, StoreError> {
        self.ensure_online()?;
        let n = self.inner.next_key.fetch_add(1, Ordering::SeqCst);
        let key = RecordKey::new(format!("-{n:019}"));
        self.cart(&user.uid).send_modify(|records| {
            records.insert(key.clone(), item.clone());
        });
        Ok(key)
    }

    async fn children(&self, user: &User) -> Result<Vec<CartRecord>, StoreError> {
        self.ensure_online()?;
        Ok(to_records(&self.cart(&user.uid).borrow()))
    }

    async fn delete(&self, user: &User, key: &RecordKey) -> Result<(), StoreError> {
        self.ensure_online()?;
        self.cart(&user.uid).send_modify(|records| {
            records.remove(key);
        });
        Ok(())
    }

    fn subscribe(&self, user: &User) -> SnapshotStream {
        let mut rx = self.cart(&user.uid).subscribe();
        stream! {
            loop {
                let snapshot = to_records(&rx.borrow_and_update());
                yield Ok(snapshot);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        }
        .boxed()
    }
}
