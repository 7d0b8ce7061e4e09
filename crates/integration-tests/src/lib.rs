//! Integration tests for Flash.
//!
//! The storefront talks to three HTTP services. This crate provides local
//! `axum` stand-ins for each of them so the HTTP backends can be exercised
//! end to end without external network access.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p flash-integration-tests
//! ```
//!
//! # Mocks
//!
//! - [`catalog`] - static catalog JSON endpoint
//! - [`realtime`] - Realtime Database REST and event-stream dialect
//! - [`identity`] - Identity Toolkit phone sign-in endpoints

pub mod catalog;
pub mod identity;
pub mod realtime;

use axum::Router;
use url::Url;

/// API key accepted by the identity mock; strong enough to pass config validation.
pub const TEST_API_KEY: &str = "AIzaSyB3$xY9mK2nL5pQ7rT0uW4zC6vD8fG1hJ";

/// Code the identity mock accepts.
pub const TEST_CODE: &str = "123456";

/// ID token the identity mock issues and the realtime mock expects.
pub const TEST_ID_TOKEN: &str = "mock-id-token";

/// Serve `router` on an ephemeral local port and return its base URL.
///
/// # Panics
///
/// Panics if the listener cannot be bound.
pub async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local address");

    tokio::spawn(async move {
        axum::serve(listener, router)
            .await
            .expect("Test server failed");
    });

    Url::parse(&format!("http://{addr}/")).expect("Invalid test server URL")
}
