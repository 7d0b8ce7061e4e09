//! The OTP sign-in state machine.
//!
//! ```text
//! PhoneEntry --submit_phone_number--> CodeSent --submit_otp--> Verifying --ok--> SignedIn
//!     ^                                  |                         |
//!     +-------------- back --------------+-------------------------+
//! ```
//!
//! The step is derived from what is stored rather than kept as a separate
//! field, so it cannot disagree with the data.

use std::sync::Arc;
use std::time::Duration;

use flash_core::{AuthStep, OtpCode, PhoneNumber, UserId, VerificationId};
use tokio::sync::watch;
use tracing::instrument;

use super::{AuthError, AuthProvider, Countdown, PhoneCredential, ProviderError, User, VerificationEvent};
use crate::error::{clear_sentry_user, set_sentry_user};

pub const NOTICE_OTP_SENT: &str = "OTP Sent";
pub const NOTICE_AUTO_VERIFIED: &str = "Successfully verified";
pub const NOTICE_SIGNED_IN: &str = "Verification Successful";

/// Observable snapshot of the sign-in screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    pub step: AuthStep,
    pub phone_number: String,
    pub otp: String,
    pub loading: bool,
    pub uid: Option<UserId>,
}

/// Drives phone verification against an [`AuthProvider`].
pub struct AuthFlow {
    provider: Arc<dyn AuthProvider>,
    phone_input: String,
    phone: Option<PhoneNumber>,
    verification_id: Option<VerificationId>,
    otp: OtpCode,
    submitted: bool,
    loading: bool,
    user: Option<User>,
    countdown: Countdown,
    notice: Option<&'static str>,
    timeout: Duration,
    view: watch::Sender<AuthView>,
}

impl AuthFlow {
    #[must_use]
    pub fn new(provider: Arc<dyn AuthProvider>, resend_secs: u64, timeout: Duration) -> Self {
        let (view, _) = watch::channel(AuthView::default());
        Self {
            provider,
            phone_input: String::new(),
            phone: None,
            verification_id: None,
            otp: OtpCode::default(),
            submitted: false,
            loading: false,
            user: None,
            countdown: Countdown::new(resend_secs),
            notice: None,
            timeout,
            view,
        }
    }

    #[must_use]
    pub const fn step(&self) -> AuthStep {
        if self.user.is_some() {
            AuthStep::SignedIn
        } else if self.verification_id.is_none() {
            AuthStep::PhoneEntry
        } else if self.submitted {
            AuthStep::Verifying
        } else {
            AuthStep::CodeSent
        }
    }

    /// Keep the phone field in sync with what the user typed.
    pub fn set_phone_input(&mut self, input: &str) {
        self.phone_input = input.to_string();
        self.publish();
    }

    #[must_use]
    pub fn phone_input(&self) -> &str {
        &self.phone_input
    }

    /// Validate `number` and ask the provider to send a code.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPhoneNumber` without contacting the provider when the
    /// number is malformed, and `Dispatch` when the provider refuses.
    #[instrument(skip(self, number))]
    pub async fn submit_phone_number(&mut self, number: &str) -> Result<(), AuthError> {
        let phone = PhoneNumber::parse(number)?;
        self.phone_input = phone.as_str().to_string();
        self.phone = Some(phone);
        self.dispatch().await
    }

    /// Ask for another code once the countdown has run out.
    ///
    /// # Errors
    ///
    /// Returns `ResendNotReady` while the countdown is running.
    pub async fn resend(&mut self) -> Result<(), AuthError> {
        if self.phone.is_none() || self.verification_id.is_none() {
            return Err(AuthError::NoVerification);
        }
        let remaining = self.countdown.remaining();
        if remaining > 0 {
            return Err(AuthError::ResendNotReady { remaining });
        }
        self.dispatch().await
    }

    async fn dispatch(&mut self) -> Result<(), AuthError> {
        let Some(phone) = self.phone.as_ref().map(PhoneNumber::to_e164) else {
            return Err(AuthError::NoVerification);
        };

        self.loading = true;
        self.publish();

        let result = self.provider.verify_phone_number(&phone, self.timeout).await;
        self.loading = false;

        match result {
            Ok(event) => {
                // Instant verification still waits for the code to be entered.
                let (id, notice) = match event {
                    VerificationEvent::CodeSent(id) => {
                        tracing::debug!("Verification code sent");
                        (id, NOTICE_OTP_SENT)
                    }
                    VerificationEvent::Completed(credential) => {
                        tracing::debug!("Phone number verified without code");
                        (credential.verification_id, NOTICE_AUTO_VERIFIED)
                    }
                };
                self.verification_id = Some(id);
                self.otp.clear();
                self.submitted = false;
                self.countdown.restart();
                self.notice = Some(notice);
                self.publish();
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Code dispatch failed");
                self.publish();
                Err(AuthError::Dispatch(e.to_string()))
            }
        }
    }

    /// Update the code field. Ignored until a code has been sent.
    pub fn set_otp(&mut self, input: &str) {
        if self.verification_id.is_none() {
            return;
        }
        self.otp = OtpCode::from_input(input);
        self.publish();
    }

    #[must_use]
    pub fn otp(&self) -> &str {
        self.otp.as_str()
    }

    /// Exchange `code` for a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `EmptyOtp` without contacting the provider when no digits were
    /// entered, `InvalidCredential` when the provider rejects the code and
    /// `Provider` for any other failure.
    #[instrument(skip(self, code))]
    pub async fn submit_otp(&mut self, code: &str) -> Result<User, AuthError> {
        let code = OtpCode::from_input(code);
        if code.is_empty() {
            return Err(AuthError::EmptyOtp);
        }
        let Some(verification_id) = self.verification_id.clone() else {
            return Err(AuthError::NoVerification);
        };

        self.otp = code;
        self.submitted = true;
        self.loading = true;
        self.publish();

        let credential = PhoneCredential {
            verification_id,
            code: self.otp.as_str().to_string(),
        };
        let result = self.provider.sign_in(&credential).await;
        self.loading = false;

        match result {
            Ok(user) => {
                tracing::info!(user = %user.uid, "Signed in");
                set_sentry_user(&user.uid);
                self.countdown.cancel();
                self.user = Some(user.clone());
                self.notice = Some(NOTICE_SIGNED_IN);
                self.publish();
                Ok(user)
            }
            Err(ProviderError::InvalidCredential(reason)) => {
                tracing::debug!(reason = %reason, "Code rejected");
                self.publish();
                Err(AuthError::InvalidCredential)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in failed");
                self.publish();
                Err(AuthError::Provider(e.to_string()))
            }
        }
    }

    /// Return to phone entry, forgetting the pending verification.
    pub fn back(&mut self) {
        self.verification_id = None;
        self.otp.clear();
        self.submitted = false;
        self.loading = false;
        self.countdown.reset();
        self.publish();
    }

    /// Sign out and clear every field.
    ///
    /// Local state is cleared even if the provider fails.
    ///
    /// # Errors
    ///
    /// Returns `Provider` if the provider could not sign out.
    #[instrument(skip(self))]
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        self.phone_input.clear();
        self.phone = None;
        self.back();

        let result = self.provider.sign_out().await;
        if let Some(user) = self.user.take() {
            tracing::info!(user = %user.uid, "Signed out");
        }
        clear_sentry_user();
        self.publish();

        result.map_err(|e| AuthError::Provider(e.to_string()))
    }

    /// Adopt a user still signed in with the provider.
    pub fn restore(&mut self) -> Option<User> {
        let user = self.provider.current_user()?;
        tracing::info!(user = %user.uid, "Restored previous sign-in");
        set_sentry_user(&user.uid);
        self.user = Some(user.clone());
        self.publish();
        Some(user)
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether "Resend OTP" is enabled.
    #[must_use]
    pub fn can_resend(&self) -> bool {
        matches!(self.step(), AuthStep::CodeSent | AuthStep::Verifying)
            && self.countdown.remaining() == 0
    }

    #[must_use]
    pub const fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    /// Take the pending transient notice, if any.
    pub const fn take_notice(&mut self) -> Option<&'static str> {
        self.notice.take()
    }

    /// Observe the sign-in screen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthView> {
        self.view.subscribe()
    }

    fn publish(&self) {
        let view = AuthView {
            step: self.step(),
            phone_number: self.phone_input.clone(),
            otp: self.otp.as_str().to_string(),
            loading: self.loading,
            uid: self.user.as_ref().map(|u| u.uid.clone()),
        };
        self.view.send_if_modified(|current| {
            if *current == view {
                return false;
            }
            *current = view;
            true
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::auth::{Dispatch, InMemoryAuth};

    const CODE: &str = "123456";

    fn flow(auth: &InMemoryAuth) -> AuthFlow {
        AuthFlow::new(Arc::new(auth.clone()), 60, Duration::from_secs(60))
    }

    async fn code_sent(auth: &InMemoryAuth) -> AuthFlow {
        let mut flow = flow(auth);
        flow.submit_phone_number("9876543210").await.unwrap();
        flow
    }

    #[tokio::test]
    async fn test_invalid_number_never_reaches_provider() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = flow(&auth);

        for bad in ["", "98765-43210", "1234567890123"] {
            assert!(matches!(
                flow.submit_phone_number(bad).await,
                Err(AuthError::InvalidPhoneNumber(_))
            ));
        }
        assert_eq!(auth.dispatch_calls(), 0);
        assert_eq!(flow.step(), AuthStep::PhoneEntry);
    }

    #[tokio::test]
    async fn test_submit_number_sends_code() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;

        assert_eq!(auth.last_phone_number().as_deref(), Some("+919876543210"));
        assert_eq!(flow.step(), AuthStep::CodeSent);
        assert!(!flow.is_loading());
        assert!(flow.countdown().is_running());
        assert_eq!(flow.take_notice(), Some(NOTICE_OTP_SENT));
        assert_eq!(flow.take_notice(), None);
    }

    #[tokio::test]
    async fn test_dispatch_failure_stays_on_phone_entry() {
        let auth = InMemoryAuth::new(CODE);
        auth.set_dispatch(Dispatch::Fail("TOO_MANY_ATTEMPTS_TRY_LATER".to_string()));
        let mut flow = flow(&auth);

        let err = flow.submit_phone_number("9876543210").await.unwrap_err();
        assert!(matches!(err, AuthError::Dispatch(m) if m.contains("TOO_MANY_ATTEMPTS")));
        assert_eq!(flow.step(), AuthStep::PhoneEntry);
        assert!(!flow.is_loading());
    }

    #[tokio::test]
    async fn test_instant_verification_does_not_advance() {
        let auth = InMemoryAuth::new(CODE);
        auth.set_dispatch(Dispatch::Instant);
        let mut flow = flow(&auth);

        flow.submit_phone_number("9876543210").await.unwrap();
        assert_eq!(flow.step(), AuthStep::CodeSent);
        assert!(!flow.is_loading());
        assert_eq!(flow.take_notice(), Some(NOTICE_AUTO_VERIFIED));
        assert_eq!(auth.sign_in_calls(), 0);

        flow.set_otp(CODE);
        assert_eq!(flow.otp(), CODE);
        let user = flow.submit_otp(CODE).await.unwrap();
        assert_eq!(flow.step(), AuthStep::SignedIn);
        assert_eq!(user.uid.as_str(), "phone-919876543210");
    }

    #[tokio::test]
    async fn test_empty_otp_leaves_state_unchanged() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;
        flow.set_otp("12");
        let before = flow.subscribe().borrow().clone();

        assert!(matches!(flow.submit_otp("").await, Err(AuthError::EmptyOtp)));
        assert_eq!(auth.sign_in_calls(), 0);
        assert_eq!(flow.step(), AuthStep::CodeSent);
        assert_eq!(*flow.subscribe().borrow(), before);
    }

    #[tokio::test]
    async fn test_otp_input_is_sanitized() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = flow(&auth);
        flow.set_otp("123");
        assert_eq!(flow.otp(), "");

        flow.submit_phone_number("9876543210").await.unwrap();
        flow.set_otp("12a34-5678");
        assert_eq!(flow.otp(), "123456");
    }

    #[tokio::test]
    async fn test_wrong_code_stays_verifying() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;

        assert!(matches!(
            flow.submit_otp("000000").await,
            Err(AuthError::InvalidCredential)
        ));
        assert_eq!(flow.step(), AuthStep::Verifying);
        assert!(flow.user().is_none());
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;
        auth.set_sign_in_failure(Some("internal".to_string()));

        assert!(matches!(flow.submit_otp(CODE).await, Err(AuthError::Provider(_))));
        assert!(!flow.is_loading());
    }

    #[tokio::test]
    async fn test_correct_code_signs_in() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;
        flow.take_notice();

        let user = flow.submit_otp(CODE).await.unwrap();
        assert_eq!(user.uid.as_str(), "phone-919876543210");
        assert_eq!(flow.step(), AuthStep::SignedIn);
        assert!(!flow.countdown().is_running());
        assert_eq!(flow.take_notice(), Some(NOTICE_SIGNED_IN));
        assert_eq!(flow.subscribe().borrow().uid, Some(user.uid));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resend_waits_for_countdown() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;

        assert!(!flow.can_resend());
        assert!(matches!(
            flow.resend().await,
            Err(AuthError::ResendNotReady { remaining: 60 })
        ));

        tokio::time::sleep(Duration::from_millis(60_500)).await;
        assert!(flow.can_resend());
        flow.resend().await.unwrap();
        assert_eq!(auth.dispatch_calls(), 2);
        assert_eq!(flow.countdown().remaining(), 60);
    }

    #[tokio::test]
    async fn test_back_returns_to_phone_entry() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;
        flow.set_otp("1234");

        flow.back();
        assert_eq!(flow.step(), AuthStep::PhoneEntry);
        assert_eq!(flow.otp(), "");
        assert!(!flow.countdown().is_running());
        assert_eq!(flow.countdown().remaining(), 60);
        assert_eq!(flow.phone_input(), "9876543210");
    }

    #[tokio::test]
    async fn test_logout_resets_everything() {
        let auth = InMemoryAuth::new(CODE);
        let mut flow = code_sent(&auth).await;
        flow.submit_otp(CODE).await.unwrap();

        flow.logout().await.unwrap();
        assert_eq!(flow.step(), AuthStep::PhoneEntry);
        assert_eq!(flow.phone_input(), "");
        assert!(flow.user().is_none());
        assert!(auth.current_user().is_none());
        assert_eq!(*flow.subscribe().borrow(), AuthView::default());
    }

    #[tokio::test]
    async fn test_restore_adopts_current_user() {
        let auth = InMemoryAuth::new(CODE).with_current_user(User::new("returning"));
        let mut flow = flow(&auth);

        let user = flow.restore().unwrap();
        assert_eq!(user.uid.as_str(), "returning");
        assert_eq!(flow.step(), AuthStep::SignedIn);

        let mut fresh = AuthFlow::new(Arc::new(InMemoryAuth::new(CODE)), 60, Duration::from_secs(60));
        assert!(fresh.restore().is_none());
    }
}
