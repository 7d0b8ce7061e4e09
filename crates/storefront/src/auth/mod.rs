//! Phone-number sign-in.
//!
//! [`AuthFlow`] is the OTP state machine the session drives. It talks to an
//! [`AuthProvider`], which is either the Identity Toolkit REST API
//! ([`IdentityToolkitAuth`]) or the scripted [`InMemoryAuth`].

mod countdown;
mod error;
mod flow;
mod identity;
mod memory;

pub use countdown::Countdown;
pub use error::{AuthError, ProviderError};
pub use flow::{AuthFlow, AuthView};
pub use identity::IdentityToolkitAuth;
pub use memory::{Dispatch, InMemoryAuth};

use std::time::Duration;

use async_trait::async_trait;
use flash_core::{UserId, VerificationId};
use secrecy::{ExposeSecret, SecretString};

/// A signed-in user.
///
/// Implements `Debug` manually to redact the ID token.
#[derive(Clone)]
pub struct User {
    pub uid: UserId,
    /// Number the user signed in with, in international form.
    pub phone_number: Option<String>,
    /// Token presented to the realtime store, when the provider issues one.
    pub id_token: Option<SecretString>,
}

impl User {
    #[must_use]
    pub fn new(uid: impl Into<UserId>) -> Self {
        Self {
            uid: uid.into(),
            phone_number: None,
            id_token: None,
        }
    }

    #[must_use]
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    #[must_use]
    pub fn with_id_token(mut self, token: impl Into<String>) -> Self {
        self.id_token = Some(SecretString::from(token.into()));
        self
    }

    /// The ID token, for building store requests.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        self.id_token.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("uid", &self.uid)
            .field("phone_number", &self.phone_number)
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Proof of phone ownership: the dispatch handle plus the code the user typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneCredential {
    pub verification_id: VerificationId,
    pub code: String,
}

/// What the provider reports after a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationEvent {
    /// A code was sent; the handle is needed to sign in.
    CodeSent(VerificationId),
    /// The provider verified the number without a code (instant verification).
    Completed(PhoneCredential),
}

/// External phone authentication provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Ask the provider to send a code to `phone_number` (international form).
    async fn verify_phone_number(
        &self,
        phone_number: &str,
        timeout: Duration,
    ) -> Result<VerificationEvent, ProviderError>;

    /// Exchange a credential for a signed-in user.
    async fn sign_in(&self, credential: &PhoneCredential) -> Result<User, ProviderError>;

    /// Forget the signed-in user.
    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// The user still signed in from a previous launch, if any.
    fn current_user(&self) -> Option<User>;
}
