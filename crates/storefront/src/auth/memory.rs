//! Scripted auth provider for tests and offline runs.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use flash_core::VerificationId;
use uuid::Uuid;

use super::{AuthProvider, PhoneCredential, ProviderError, User, VerificationEvent};

/// How [`InMemoryAuth`] answers a dispatch request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Send a code; the caller must enter the expected code.
    CodeSent,
    /// Verify instantly, as some devices do without an SMS.
    Instant,
    /// Refuse with this message.
    Fail(String),
}

/// An [`AuthProvider`] that accepts one fixed code.
///
/// Users get a stable id derived from their number, so signing in again with
/// the same number finds the same cart.
#[derive(Clone)]
pub struct InMemoryAuth {
    state: Arc<Mutex<State>>,
}

struct State {
    dispatch: Dispatch,
    expected_code: String,
    sign_in_failure: Option<String>,
    issued: HashSet<VerificationId>,
    numbers: Vec<(VerificationId, String)>,
    current: Option<User>,
    dispatch_calls: usize,
    sign_in_calls: usize,
}

impl InMemoryAuth {
    /// A provider that sends codes and accepts `expected_code`.
    #[must_use]
    pub fn new(expected_code: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                dispatch: Dispatch::CodeSent,
                expected_code: expected_code.into(),
                sign_in_failure: None,
                issued: HashSet::new(),
                numbers: Vec::new(),
                current: None,
                dispatch_calls: 0,
                sign_in_calls: 0,
            })),
        }
    }

    /// Start with `user` already signed in.
    #[must_use]
    pub fn with_current_user(self, user: User) -> Self {
        self.lock().current = Some(user);
        self
    }

    pub fn set_dispatch(&self, dispatch: Dispatch) {
        self.lock().dispatch = dispatch;
    }

    /// Make `sign_in` fail with a non-credential error.
    pub fn set_sign_in_failure(&self, message: Option<String>) {
        self.lock().sign_in_failure = message;
    }

    #[must_use]
    pub fn dispatch_calls(&self) -> usize {
        self.lock().dispatch_calls
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.lock().sign_in_calls
    }

    /// Number the most recent code was requested for.
    #[must_use]
    pub fn last_phone_number(&self) -> Option<String> {
        self.lock().numbers.last().map(|(_, number)| number.clone())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn verify_phone_number(
        &self,
        phone_number: &str,
        _timeout: Duration,
    ) -> Result<VerificationEvent, ProviderError> {
        let mut state = self.lock();
        state.dispatch_calls += 1;

        if let Dispatch::Fail(message) = &state.dispatch {
            return Err(ProviderError::Rejected(message.clone()));
        }

        let id = VerificationId::new(Uuid::new_v4().to_string());
        state.issued.insert(id.clone());
        state.numbers.push((id.clone(), phone_number.to_string()));

        match state.dispatch {
            Dispatch::Instant => Ok(VerificationEvent::Completed(PhoneCredential {
                verification_id: id,
                code: state.expected_code.clone(),
            })),
            _ => Ok(VerificationEvent::CodeSent(id)),
        }
    }

    async fn sign_in(&self, credential: &PhoneCredential) -> Result<User, ProviderError> {
        let mut state = self.lock();
        state.sign_in_calls += 1;

        if let Some(message) = &state.sign_in_failure {
            return Err(ProviderError::Rejected(message.clone()));
        }
        if !state.issued.contains(&credential.verification_id) {
            return Err(ProviderError::InvalidCredential("INVALID_SESSION_INFO".to_string()));
        }
        if credential.code != state.expected_code {
            return Err(ProviderError::InvalidCredential("INVALID_CODE".to_string()));
        }

        let number = state
            .numbers
            .iter()
            .find(|(id, _)| id == &credential.verification_id)
            .map(|(_, number)| number.clone())
            .unwrap_or_default();
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();
        let user = User::new(format!("phone-{digits}")).with_phone_number(number);

        state.current = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.lock().current = None;
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.lock().current.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_accepts_expected_code_only() {
        let auth = InMemoryAuth::new("123456");
        let VerificationEvent::CodeSent(id) = auth
            .verify_phone_number("+919876543210", TIMEOUT)
            .await
            .unwrap()
        else {
            panic!("expected a code to be sent");
        };

        let wrong = PhoneCredential {
            verification_id: id.clone(),
            code: "000000".to_string(),
        };
        assert!(matches!(
            auth.sign_in(&wrong).await,
            Err(ProviderError::InvalidCredential(_))
        ));

        let right = PhoneCredential {
            verification_id: id,
            code: "123456".to_string(),
        };
        let user = auth.sign_in(&right).await.unwrap();
        assert_eq!(user.uid.as_str(), "phone-919876543210");
        assert_eq!(user.phone_number.as_deref(), Some("+919876543210"));
        assert_eq!(auth.sign_in_calls(), 2);
        assert!(auth.current_user().is_some());
    }

    #[tokio::test]
    async fn test_unknown_verification_id_rejected() {
        let auth = InMemoryAuth::new("123456");
        let credential = PhoneCredential {
            verification_id: VerificationId::new("never-issued"),
            code: "123456".to_string(),
        };
        assert!(matches!(
            auth.sign_in(&credential).await,
            Err(ProviderError::InvalidCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_scripted_failure_and_sign_out() {
        let auth = InMemoryAuth::new("123456").with_current_user(User::new("u1"));
        auth.set_dispatch(Dispatch::Fail("quota exceeded".to_string()));

        assert!(matches!(
            auth.verify_phone_number("+91123", TIMEOUT).await,
            Err(ProviderError::Rejected(m)) if m == "quota exceeded"
        ));
        assert_eq!(auth.dispatch_calls(), 1);

        auth.sign_out().await.unwrap();
        assert!(auth.current_user().is_none());
    }
}
