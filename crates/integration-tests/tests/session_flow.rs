//! End-to-end session tests.
//!
//! The first group wires a session from configuration against the local HTTP
//! mocks; the second uses the in-memory backends.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flash_core::{AuthStep, CatalogItem, Price, Screen};
use flash_integration_tests::identity::MockIdentityToolkit;
use flash_integration_tests::realtime::MockRealtimeDb;
use flash_integration_tests::{TEST_API_KEY, TEST_CODE, TEST_ID_TOKEN, catalog, serve};
use flash_storefront::auth::{AuthError, InMemoryAuth};
use flash_storefront::cart::InMemoryCart;
use flash_storefront::catalog::StaticCatalog;
use flash_storefront::config::{FlashConfig, TimingConfig};
use flash_storefront::error::AppError;
use flash_storefront::{CatalogOutcome, Session};
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

async fn wait_for_len(rx: &mut watch::Receiver<Vec<CatalogItem>>, len: usize) {
    tokio::time::timeout(WAIT, rx.wait_for(|items| items.len() == len))
        .await
        .expect("timed out waiting for cart snapshot")
        .expect("cart channel closed");
}

// ============================================================================
// HTTP backends
// ============================================================================

struct Services {
    db: MockRealtimeDb,
    identity: MockIdentityToolkit,
    config: FlashConfig,
}

async fn services() -> Services {
    let catalog_base = serve(catalog::router(catalog::sample_catalog())).await;
    let db = MockRealtimeDb::new(Some(TEST_ID_TOKEN));
    let db_base = serve(db.router()).await;
    let identity = MockIdentityToolkit::new();
    let identity_base = serve(identity.router()).await;

    let vars: HashMap<&str, String> = HashMap::from([
        ("FLASH_CATALOG_URL", format!("{catalog_base}items.json")),
        ("FLASH_DATABASE_URL", db_base.to_string()),
        ("FLASH_AUTH_BASE_URL", identity_base.to_string()),
        ("FLASH_API_KEY", TEST_API_KEY.to_string()),
        ("FLASH_SPLASH_DELAY_MS", "50".to_string()),
    ]);
    let config = FlashConfig::from_lookup(|key| vars.get(key).cloned()).expect("valid config");

    Services {
        db,
        identity,
        config,
    }
}

#[tokio::test]
async fn test_full_flow_over_http() {
    let services = services().await;
    let mut session = Session::from_config(&services.config);

    assert_eq!(session.start().await, CatalogOutcome::Loaded(4));
    assert_eq!(session.auth().step(), AuthStep::PhoneEntry);

    session.submit_phone_number("9876543210").await.expect("dispatch failed");
    assert_eq!(services.identity.codes_sent(), 1);
    session.submit_otp(TEST_CODE).await.expect("sign-in failed");
    assert!(session.cart().is_listening());

    session.select_category("fresh fruits");
    let fruits = session.visible_items();
    assert_eq!(fruits.len(), 2);
    assert_eq!(session.category_count(), 2);

    let mut rx = session.cart().watch_items();
    for item in &fruits {
        session.add_to_cart(item.clone()).await.expect("add failed");
    }
    let banana = fruits.first().expect("banana").clone();
    session.add_to_cart(banana).await.expect("add failed");
    wait_for_len(&mut rx, 3).await;
    assert_eq!(services.db.entries("uid-919876543210").len(), 3);

    // Banana 100 x2 + apple 250 -> 75 + 75 + 187 = 337, handling 3.
    let bill = session.bill().expect("bill for non-empty cart");
    assert_eq!(bill.item_total, Price::new(337));
    assert_eq!(bill.handling_charge, Price::new(3));
    assert_eq!(bill.grand_total, Price::new(370));

    session.open_cart();
    assert_eq!(session.current_screen(), Screen::Cart);
    assert_eq!(session.cart_lines().len(), 2);

    session.request_logout();
    session.confirm_logout().await.expect("logout failed");
    assert_eq!(session.auth().step(), AuthStep::PhoneEntry);
    assert_eq!(session.cart_count(), 0);
    assert_eq!(session.current_screen(), Screen::Start);

    // Entries survive logout on the server.
    assert_eq!(services.db.entries("uid-919876543210").len(), 3);
}

#[tokio::test]
async fn test_cart_reloads_on_next_sign_in() {
    let services = services().await;

    let mut first = Session::from_config(&services.config);
    first.submit_phone_number("9876543210").await.expect("dispatch failed");
    first.submit_otp(TEST_CODE).await.expect("sign-in failed");
    first.refresh_catalog().await;
    first.select_category("Beverages");
    let pepsi = first.visible_items().remove(0);
    first.add_to_cart(pepsi).await.expect("add failed");
    drop(first);

    let mut second = Session::from_config(&services.config);
    let mut rx = second.cart().watch_items();
    second.submit_phone_number("9876543210").await.expect("dispatch failed");
    second.submit_otp(TEST_CODE).await.expect("sign-in failed");
    wait_for_len(&mut rx, 1).await;
    assert_eq!(second.cart_count(), 1);
}

#[tokio::test]
async fn test_catalog_failure_over_http() {
    let mut services = services().await;
    let broken = services
        .config
        .catalog_url
        .join("error.json")
        .expect("valid url");
    services.config.catalog_url = broken;

    let mut session = Session::from_config(&services.config);
    let outcome = session.start().await;
    assert_eq!(outcome, CatalogOutcome::Failed { skip_intro: true });
    assert!(!session.splash().is_visible());
    assert!(session.catalog_state().is_error());
}

// ============================================================================
// In-memory backends
// ============================================================================

fn offline_session(auth: &InMemoryAuth) -> Session {
    let catalog = StaticCatalog::new(vec![
        CatalogItem::new("Banana Robusta", "Fresh Fruits", "1 Kg", 100, "b"),
        CatalogItem::new("Dairy Milk", "Sweet Tooth", "1", 250, "d"),
        CatalogItem::new("Lays", "Munchies", "1", 150, "l"),
    ]);
    Session::new(
        Arc::new(catalog),
        Arc::new(InMemoryCart::new()),
        Arc::new(auth.clone()),
        TimingConfig::default(),
    )
}

#[tokio::test]
async fn test_reference_bill_offline() {
    let auth = InMemoryAuth::new(TEST_CODE);
    let mut session = offline_session(&auth);
    session.refresh_catalog().await;
    session.submit_phone_number("9876543210").await.expect("dispatch failed");
    session.submit_otp(TEST_CODE).await.expect("sign-in failed");

    assert!(session.bill().is_none());

    let mut rx = session.cart().watch_items();
    for category in ["Fresh Fruits", "Sweet Tooth", "Munchies"] {
        session.select_category(category);
        let item = session.visible_items().remove(0);
        session.add_to_cart(item).await.expect("add failed");
    }
    wait_for_len(&mut rx, 3).await;

    let bill = session.bill().expect("bill for non-empty cart");
    assert_eq!(bill.item_total, Price::new(374));
    assert_eq!(bill.handling_charge, Price::new(3));
    assert_eq!(bill.delivery_fee, Price::new(30));
    assert_eq!(bill.grand_total, Price::new(407));
}

#[tokio::test]
async fn test_empty_otp_never_reaches_provider() {
    let auth = InMemoryAuth::new(TEST_CODE);
    let mut session = offline_session(&auth);
    session.submit_phone_number("9876543210").await.expect("dispatch failed");

    let err = session.submit_otp("").await.expect_err("expected rejection");
    assert!(matches!(err, AppError::Auth(AuthError::EmptyOtp)));
    assert_eq!(err.user_message(), "Please enter OTP");
    assert_eq!(auth.sign_in_calls(), 0);
    assert_eq!(session.auth().step(), AuthStep::CodeSent);
}

#[tokio::test]
async fn test_navigation_through_session() {
    let auth = InMemoryAuth::new(TEST_CODE);
    let mut session = offline_session(&auth);

    session.select_category("Munchies");
    session.open_cart();
    session.open_cart();
    assert!(session.navigate_up());
    assert_eq!(session.current_screen(), Screen::Items);
    session.go_home();
    assert!(!session.navigator().can_navigate_back());
    assert!(!session.navigate_up());
}
