//! The session coordinator.
//!
//! One [`Session`] owns every piece of client state: the catalog, the splash
//! gate, navigation, the sign-in flow and the cart. All mutation goes through
//! it and the rendering layer observes the watch channels it exposes.

use std::sync::Arc;

use flash_core::{
    Bill, CartLine, CatalogItem, CatalogState, CategoryKey, Screen, count_in_category,
    filter_by_category,
};
use tokio::sync::watch;
use tracing::instrument;

use crate::auth::{AuthFlow, AuthProvider, IdentityToolkitAuth, User};
use crate::cart::{Cart, RealtimeDbCart, RemoteCart, StoreError};
use crate::catalog::{CatalogClient, CatalogSource};
use crate::config::{FlashConfig, TimingConfig};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::navigation::Navigator;
use crate::splash::SplashGate;

pub const NOTICE_ADDED_TO_CART: &str = "Added to Cart";

/// Result of a catalog refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOutcome {
    /// The catalog loaded with this many items.
    Loaded(usize),
    /// The fetch failed. `skip_intro` asks for the splash to be dismissed so
    /// the retry screen is reachable.
    Failed { skip_intro: bool },
}

/// Client state for one running instance.
pub struct Session {
    catalog: Arc<dyn CatalogSource>,
    catalog_state: watch::Sender<CatalogState>,
    splash: SplashGate,
    navigator: Navigator,
    auth: AuthFlow,
    cart: Cart,
    logout_requested: watch::Sender<bool>,
    notice: Option<&'static str>,
    timing: TimingConfig,
}

impl Session {
    /// Build a session over explicit backends.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        remote: Arc<dyn RemoteCart>,
        provider: Arc<dyn AuthProvider>,
        timing: TimingConfig,
    ) -> Self {
        let (catalog_state, _) = watch::channel(CatalogState::Loading);
        let (logout_requested, _) = watch::channel(false);
        Self {
            catalog,
            catalog_state,
            splash: SplashGate::new(),
            navigator: Navigator::new(),
            auth: AuthFlow::new(provider, timing.otp_resend_secs, timing.verification_timeout),
            cart: Cart::new(remote),
            logout_requested,
            notice: None,
            timing,
        }
    }

    /// Build a session over the HTTP backends named in `config`.
    #[must_use]
    pub fn from_config(config: &FlashConfig) -> Self {
        let client = reqwest::Client::new();
        Self::new(
            Arc::new(CatalogClient::with_client(
                client.clone(),
                config.catalog_url.clone(),
            )),
            Arc::new(RealtimeDbCart::with_client(
                client.clone(),
                config.database_url.clone(),
            )),
            Arc::new(IdentityToolkitAuth::with_client(client, &config.auth)),
            config.timing,
        )
    }

    /// Launch: restore a previous sign-in, show the splash and load the catalog.
    pub async fn start(&mut self) -> CatalogOutcome {
        self.restore();
        self.splash.start(self.timing.splash_delay);
        self.refresh_catalog().await
    }

    /// Adopt a user still signed in with the provider and load their cart.
    pub fn restore(&mut self) -> Option<User> {
        let user = self.auth.restore()?;
        self.attach_cart(user.clone());
        Some(user)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog
    // ─────────────────────────────────────────────────────────────────────────

    /// Fetch the catalog. Also the retry action of the error screen.
    #[instrument(skip(self))]
    pub async fn refresh_catalog(&mut self) -> CatalogOutcome {
        self.catalog_state.send_replace(CatalogState::Loading);

        match self.catalog.fetch().await {
            Ok(items) => {
                let count = items.len();
                self.catalog_state.send_replace(CatalogState::Success(items));
                CatalogOutcome::Loaded(count)
            }
            Err(e) => {
                AppError::from(e).report();
                self.catalog_state.send_replace(CatalogState::Error);
                self.splash.close();
                CatalogOutcome::Failed { skip_intro: true }
            }
        }
    }

    #[must_use]
    pub fn catalog_state(&self) -> CatalogState {
        self.catalog_state.borrow().clone()
    }

    #[must_use]
    pub fn watch_catalog(&self) -> watch::Receiver<CatalogState> {
        self.catalog_state.subscribe()
    }

    /// Select a category and open its item list.
    pub fn select_category(&mut self, category: &str) {
        self.navigator.select_category(CategoryKey::new(category));
    }

    /// Items of the selected category, in catalog order.
    #[must_use]
    pub fn visible_items(&self) -> Vec<CatalogItem> {
        let state = self.catalog_state.borrow();
        match (self.navigator.category(), state.items()) {
            (Some(category), Some(items)) => filter_by_category(items, category.as_str()),
            _ => Vec::new(),
        }
    }

    /// Number of items in the selected category.
    #[must_use]
    pub fn category_count(&self) -> usize {
        let state = self.catalog_state.borrow();
        match (self.navigator.category(), state.items()) {
            (Some(category), Some(items)) => count_in_category(items, category.as_str()),
            _ => 0,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sign-in
    // ─────────────────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    pub fn set_phone_input(&mut self, input: &str) {
        self.auth.set_phone_input(input);
    }

    pub fn set_otp(&mut self, input: &str) {
        self.auth.set_otp(input);
    }

    /// Leave code entry and return to the phone number field.
    pub fn back_to_phone_entry(&mut self) {
        self.auth.back();
    }

    /// Request a code for `number`.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed number or a refused dispatch.
    pub async fn submit_phone_number(&mut self, number: &str) -> Result<()> {
        self.auth.submit_phone_number(number).await.map_err(|e| {
            let err = AppError::from(e);
            err.report();
            err
        })
    }

    /// Request another code once the countdown has run out.
    ///
    /// # Errors
    ///
    /// Returns an error while the countdown is still running.
    pub async fn resend_otp(&mut self) -> Result<()> {
        self.auth.resend().await.map_err(|e| {
            let err = AppError::from(e);
            err.report();
            err
        })
    }

    /// Verify `code`; on success bind and sync the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredential` for a rejected code.
    pub async fn submit_otp(&mut self, code: &str) -> Result<User> {
        let user = self.auth.submit_otp(code).await.map_err(|e| {
            let err = AppError::from(e);
            err.report();
            err
        })?;
        self.attach_cart(user.clone());
        Ok(user)
    }

    fn attach_cart(&mut self, user: User) {
        self.cart.bind(user);
        if let Err(e) = self.cart.sync() {
            AppError::from(e).report();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cart
    // ─────────────────────────────────────────────────────────────────────────

    /// Add one unit of `item`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteStore` if the entry could not be stored; it stays in the
    /// local cart.
    pub async fn add_to_cart(&mut self, item: CatalogItem) -> Result<()> {
        let name = item.name.clone();
        let result = self.cart.add(item).await;
        // The local entry exists unless nobody was signed in.
        if !matches!(result, Err(StoreError::NotSignedIn)) {
            add_breadcrumb("cart", "Added item", Some(&[("name", name.as_str())]));
        }
        result?;
        self.notice = Some(NOTICE_ADDED_TO_CART);
        Ok(())
    }

    /// Remove one unit of `item`. Returns whether an entry was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RemoteStore` if the store could not be read or written.
    pub async fn remove_from_cart(&mut self, item: &CatalogItem) -> Result<bool> {
        let removed = self.cart.remove(item).await?;
        if removed {
            add_breadcrumb("cart", "Removed item", Some(&[("name", item.name.as_str())]));
        }
        Ok(removed)
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.cart.lines()
    }

    /// Badge count on the cart button.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        self.cart.len()
    }

    /// The bill, shown only for a non-empty cart.
    #[must_use]
    pub fn bill(&self) -> Option<Bill> {
        self.cart.bill()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    #[must_use]
    pub fn current_screen(&self) -> Screen {
        self.navigator.current()
    }

    pub fn open_cart(&mut self) {
        self.navigator.open_cart();
    }

    pub fn go_home(&mut self) {
        self.navigator.go_home();
    }

    pub fn navigate_up(&mut self) -> bool {
        self.navigator.navigate_up()
    }

    #[must_use]
    pub const fn splash(&self) -> &SplashGate {
        &self.splash
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Logout
    // ─────────────────────────────────────────────────────────────────────────

    /// Show the logout confirmation.
    pub fn request_logout(&self) {
        self.logout_requested.send_replace(true);
    }

    pub fn cancel_logout(&self) {
        self.logout_requested.send_replace(false);
    }

    #[must_use]
    pub fn is_logout_requested(&self) -> bool {
        *self.logout_requested.borrow()
    }

    #[must_use]
    pub fn watch_logout_requested(&self) -> watch::Receiver<bool> {
        self.logout_requested.subscribe()
    }

    /// Confirm the pending logout.
    ///
    /// # Errors
    ///
    /// See [`Session::logout`].
    pub async fn confirm_logout(&mut self) -> Result<()> {
        self.logout_requested.send_replace(false);
        self.logout().await
    }

    /// Sign out, drop the cart listener and return to the start screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider failed to sign out. Local state is
    /// cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        let result = self.auth.logout().await;
        self.cart.detach();
        self.cart.clear_error();
        self.navigator.go_home();
        self.notice = None;
        result.map_err(AppError::from)
    }

    /// Take the pending transient notice, if any.
    pub fn take_notice(&mut self) -> Option<&'static str> {
        self.notice.take().or_else(|| self.auth.take_notice())
    }
}
