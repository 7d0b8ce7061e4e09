//! Realtime Database REST backend.
//!
//! Entries live at `users/{uid}/cart/{pushKey}`. Writes use the REST API and
//! change notifications use its `text/event-stream` endpoint. Every `put` or
//! `patch` event triggers a fresh read of the whole cart, so snapshots are
//! always complete lists rather than patches.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_stream::stream;
use async_trait::async_trait;
use flash_core::{CatalogItem, RecordKey};
use futures::StreamExt;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

use super::{CartRecord, RemoteCart, SnapshotStream, StoreError};
use crate::auth::User;

/// Cart store backed by a Realtime Database instance.
#[derive(Clone)]
pub struct RealtimeDbCart {
    inner: Arc<RealtimeDbCartInner>,
}

struct RealtimeDbCartInner {
    client: reqwest::Client,
    base_url: Url,
}

/// Response to a push (`POST`).
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Server-sent events the change stream produces.
#[derive(Debug, PartialEq, Eq)]
enum StreamEvent {
    /// Data under the cart changed.
    Changed,
    KeepAlive,
    /// The server closed the stream, e.g. after a rules change.
    Cancel(String),
    /// The auth token expired or was revoked.
    AuthRevoked,
}

impl RealtimeDbCart {
    /// Create a store client for the database at `base_url`.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self {
            inner: Arc::new(RealtimeDbCartInner { client, base_url }),
        }
    }

    fn cart_url(&self, user: &User) -> String {
        format!(
            "{}/users/{}/cart.json",
            self.inner.base_url.as_str().trim_end_matches('/'),
            user.uid
        )
    }

    fn entry_url(&self, user: &User, key: &RecordKey) -> String {
        format!(
            "{}/users/{}/cart/{}.json",
            self.inner.base_url.as_str().trim_end_matches('/'),
            user.uid,
            key
        )
    }

    fn authorize(request: reqwest::RequestBuilder, user: &User) -> reqwest::RequestBuilder {
        match user.id_token() {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        }
    }

    /// Read the body, mapping error statuses.
    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await?;

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(StoreError::Unauthorized(body));
        }
        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Cart store returned non-success status"
            );
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl RemoteCart for RealtimeDbCart {
    #[instrument(skip(self, user, item), fields(user = %user.uid))]
    async fn push(&self, user: &User, item: &CatalogItem) -> Result<RecordKey, StoreError> {
        let request = self.inner.client.post(self.cart_url(user)).json(item);
        let response = Self::authorize(request, user).send().await?;
        let body = Self::read_body(response).await?;

        let pushed: PushResponse = serde_json::from_str(&body)?;
        Ok(RecordKey::new(pushed.name))
    }

    #[instrument(skip(self, user), fields(user = %user.uid))]
    async fn children(&self, user: &User) -> Result<Vec<CartRecord>, StoreError> {
        let request = self.inner.client.get(self.cart_url(user));
        let response = Self::authorize(request, user).send().await?;
        let body = Self::read_body(response).await?;

        // An empty cart reads as `null`.
        let records: Option<BTreeMap<String, CatalogItem>> = serde_json::from_str(&body)?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(|(key, item)| CartRecord {
                key: RecordKey::new(key),
                item,
            })
            .collect())
    }

    #[instrument(skip(self, user), fields(user = %user.uid))]
    async fn delete(&self, user: &User, key: &RecordKey) -> Result<(), StoreError> {
        let request = self.inner.client.delete(self.entry_url(user, key));
        let response = Self::authorize(request, user).send().await?;
        Self::read_body(response).await?;
        Ok(())
    }

    fn subscribe(&self, user: &User) -> SnapshotStream {
        let store = self.clone();
        let user = user.clone();

        stream! {
            let request = store
                .inner
                .client
                .get(store.cart_url(&user))
                .header(reqwest::header::ACCEPT, "text/event-stream");
            let response = match Self::authorize(request, &user).send().await {
                Ok(response) => response,
                Err(e) => {
                    yield Err(StoreError::Http(e));
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let err = match Self::read_body(response).await {
                    Err(e) => e,
                    Ok(body) => StoreError::Status { status: status.as_u16(), message: body },
                };
                yield Err(err);
                return;
            }

            // Bytes, not text: a chunk may end inside a multi-byte character.
            let mut buffer: Vec<u8> = Vec::new();
            let mut byte_stream = std::pin::pin!(response.bytes_stream());

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(StoreError::Stream(e.to_string()));
                        return;
                    }
                };
                buffer.extend(chunk.iter().filter(|&&b| b != b'\r'));

                while let Some(raw) = extract_sse_event(&mut buffer) {
                    let event = match String::from_utf8(raw) {
                        Ok(event) => event,
                        Err(e) => {
                            yield Err(StoreError::Stream(format!("Invalid UTF-8: {e}")));
                            continue;
                        }
                    };
                    match parse_sse_event(&event) {
                        Some(StreamEvent::Changed) => {
                            yield store.children(&user).await;
                        }
                        Some(StreamEvent::KeepAlive) | None => {}
                        Some(StreamEvent::Cancel(reason)) => {
                            yield Err(StoreError::Stream(format!("cancelled: {reason}")));
                            return;
                        }
                        Some(StreamEvent::AuthRevoked) => {
                            yield Err(StoreError::Unauthorized("auth revoked".to_string()));
                            return;
                        }
                    }
                }
            }
        }
        .boxed()
    }
}

/// Take one complete event (terminated by a blank line) off the buffer.
fn extract_sse_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let idx = buffer.windows(2).position(|w| w == b"\n\n")?;
    let event: Vec<u8> = buffer.drain(..idx).collect();
    buffer.drain(..2);
    Some(event)
}

fn parse_sse_event(event: &str) -> Option<StreamEvent> {
    let mut name = None;
    let mut data = None;

    for line in event.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            name = Some(value.trim());
        } else if let Some(value) = line.strip_prefix("data:") {
            data = Some(value.trim());
        }
    }

    match name? {
        "put" | "patch" => Some(StreamEvent::Changed),
        "keep-alive" => Some(StreamEvent::KeepAlive),
        "cancel" => Some(StreamEvent::Cancel(data.unwrap_or_default().to_string())),
        "auth_revoked" => Some(StreamEvent::AuthRevoked),
        other => {
            tracing::debug!(event = other, "Ignoring unknown stream event");
            None
        }
    }
}
