//! Realtime Database stand-in.
//!
//! Implements the REST subset the cart store uses: push, read, delete and the
//! `text/event-stream` change feed.

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, Copy)]
enum Change {
    Updated,
    Revoked,
}

#[derive(Debug, Deserialize)]
struct AuthQuery {
    auth: Option<String>,
}

#[derive(Default)]
struct DbState {
    next_key: u64,
    carts: HashMap<String, BTreeMap<String, Value>>,
}

/// In-memory database with an optional required auth token.
#[derive(Clone)]
pub struct MockRealtimeDb {
    state: Arc<Mutex<DbState>>,
    changes: broadcast::Sender<Change>,
    token: Option<String>,
}

impl MockRealtimeDb {
    /// A database that requires `?auth=token` when `token` is set.
    #[must_use]
    pub fn new(token: Option<&str>) -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            state: Arc::new(Mutex::new(DbState::default())),
            changes,
            token: token.map(str::to_string),
        }
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/users/{uid}/cart.json", get(read_cart).post(push_entry))
            .route("/users/{uid}/cart/{file}", delete(delete_entry))
            .with_state(self.clone())
    }

    /// Entries stored for `uid`, in key order.
    #[must_use]
    pub fn entries(&self, uid: &str) -> Vec<Value> {
        self.lock()
            .carts
            .get(uid)
            .map(|cart| cart.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Tell every open change feed that its credential was revoked.
    pub fn revoke(&self) {
        let _ = self.changes.send(Change::Revoked);
    }

    fn lock(&self) -> MutexGuard<'_, DbState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn authorized(&self, query: &AuthQuery) -> bool {
        self.token
            .as_deref()
            .is_none_or(|token| query.auth.as_deref() == Some(token))
    }

    fn snapshot(&self, uid: &str) -> Value {
        self.lock()
            .carts
            .get(uid)
            .filter(|cart| !cart.is_empty())
            .map_or(Value::Null, |cart| json!(cart))
    }
}

fn permission_denied() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        axum::Json(json!({"error": "Permission denied"})),
    )
        .into_response()
}

async fn read_cart(
    State(db): State<MockRealtimeDb>,
    Path(uid): Path<String>,
    Query(query): Query<AuthQuery>,
    headers: HeaderMap,
) -> Response {
    if !db.authorized(&query) {
        return permission_denied();
    }

    let wants_stream = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/event-stream"));
    if !wants_stream {
        return axum::Json(db.snapshot(&uid)).into_response();
    }

    // Subscribe before reading so no change between the two is lost.
    let rx = db.changes.subscribe();
    let initial = Event::default()
        .event("put")
        .data(json!({"path": "/", "data": db.snapshot(&uid)}).to_string());
    let keep_alive = Event::default().event("keep-alive").data("null");

    let updates = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(Change::Updated) => {
                    let event = Event::default()
                        .event("put")
                        .data(r#"{"path":"/","data":null}"#);
                    return Some((event, rx));
                }
                Ok(Change::Revoked) => {
                    let event = Event::default()
                        .event("auth_revoked")
                        .data("credential is no longer valid");
                    return Some((event, rx));
                }
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    });

    let events = futures::stream::iter([keep_alive, initial])
        .chain(updates)
        .map(Ok::<_, Infallible>);
    Sse::new(events).into_response()
}

async fn push_entry(
    State(db): State<MockRealtimeDb>,
    Path(uid): Path<String>,
    Query(query): Query<AuthQuery>,
    axum::Json(item): axum::Json<Value>,
) -> Response {
    if !db.authorized(&query) {
        return permission_denied();
    }

    let key = {
        let mut state = db.lock();
        state.next_key += 1;
        let key = format!("-Mock{:08}", state.next_key);
        state
            .carts
            .entry(uid)
            .or_default()
            .insert(key.clone(), item);
        key
    };
    let _ = db.changes.send(Change::Updated);

    axum::Json(json!({"name": key})).into_response()
}

async fn delete_entry(
    State(db): State<MockRealtimeDb>,
    Path((uid, file)): Path<(String, String)>,
    Query(query): Query<AuthQuery>,
) -> Response {
    if !db.authorized(&query) {
        return permission_denied();
    }

    let key = file.strip_suffix(".json").unwrap_or(&file);
    if let Some(cart) = db.lock().carts.get_mut(&uid) {
        cart.remove(key);
    }
    let _ = db.changes.send(Change::Updated);

    axum::Json(Value::Null).into_response()
}
