//! Unified error handling with Sentry integration.
//!
//! Every component has its own error enum; `AppError` unifies them for the
//! session and decides what the user is shown. Nothing here is fatal: every
//! error hands control back to an interactive screen.

use thiserror::Error;

use crate::auth::AuthError;
use crate::cart::StoreError;
use crate::catalog::CatalogError;
use crate::config::ConfigError;

/// Shown when a one-time code is rejected by the provider.
pub const INVALID_OTP_MESSAGE: &str = "The OTP you have entered is Invalid. Please try again.";

/// Application-level error type for the storefront session.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog fetch failed; the items screen shows a retry button.
    #[error("Network error: {0}")]
    Network(#[from] CatalogError),

    /// Code dispatch failed; the user stays on phone entry.
    #[error("Verification failed: {0}")]
    AuthDispatch(String),

    /// The entered code or verification handle was rejected.
    #[error("Invalid credential")]
    InvalidCredential,

    /// Any other authentication failure.
    #[error("Auth error: {0}")]
    Auth(AuthError),

    /// Remote cart read or write failed.
    #[error("Cart store error: {0}")]
    RemoteStore(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Dispatch(message) => Self::AuthDispatch(message),
            AuthError::InvalidCredential => Self::InvalidCredential,
            other => Self::Auth(other),
        }
    }
}

impl AppError {
    /// Transient message for the user.
    ///
    /// Internal details of network and store failures are never exposed.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Unable to load items. Check your connection and retry.".to_string(),
            Self::AuthDispatch(message) => format!("Verification failed: {message}"),
            Self::InvalidCredential => INVALID_OTP_MESSAGE.to_string(),
            Self::Auth(err) => match err {
                AuthError::EmptyOtp => "Please enter OTP".to_string(),
                AuthError::InvalidPhoneNumber(_) => "Please enter a valid phone number".to_string(),
                AuthError::ResendNotReady { remaining } => {
                    format!("You can resend the OTP in {remaining} seconds")
                }
                AuthError::NoVerification => "Request an OTP first".to_string(),
                _ => "Authentication error".to_string(),
            },
            Self::RemoteStore(_) => "Could not update your cart. Please try again.".to_string(),
            Self::Config(_) => "The app is not configured correctly".to_string(),
        }
    }

    /// Log the error and capture infrastructure failures to Sentry.
    pub fn report(&self) {
        if matches!(self, Self::Network(_) | Self::RemoteStore(_) | Self::Config(_)) {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Session error"
            );
        } else {
            tracing::debug!(error = %self, "User-facing session error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Record a failure that does not interrupt the user flow.
///
/// Used for background work (cart listener, best-effort writes) where there is
/// no caller left to return the error to.
pub fn capture_background(context: &str, err: &(dyn std::error::Error + 'static)) {
    let event_id = sentry::capture_error(err);
    tracing::warn!(
        context,
        error = %err,
        sentry_event_id = %event_id,
        "Background operation failed"
    );
}

/// Set the Sentry user context after sign-in.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("name", "Banana")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
