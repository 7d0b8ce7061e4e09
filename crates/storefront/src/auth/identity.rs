//! Identity Toolkit phone authentication over REST.
//!
//! # Flow
//!
//! 1. `accounts:sendVerificationCode` with the number and an app verification
//!    token returns a `sessionInfo` handle
//! 2. `accounts:signInWithPhoneNumber` with that handle and the SMS code
//!    returns the user's id and ID token
//!
//! The signed-in user is held in memory only; nothing survives a restart.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use flash_core::VerificationId;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{AuthProvider, PhoneCredential, ProviderError, User, VerificationEvent};
use crate::config::AuthConfig;

/// Error messages that mean the code or handle is no good.
const CREDENTIAL_ERRORS: &[&str] = &["INVALID_CODE", "INVALID_SESSION_INFO", "SESSION_EXPIRED"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeRequest<'a> {
    phone_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    recaptcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeResponse {
    session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    session_info: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    local_id: String,
    #[serde(default)]
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the Identity Toolkit phone sign-in endpoints.
#[derive(Clone)]
pub struct IdentityToolkitAuth {
    inner: Arc<IdentityToolkitInner>,
}

struct IdentityToolkitInner {
    client: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    recaptcha_token: Option<SecretString>,
    current: Mutex<Option<User>>,
}

impl IdentityToolkitAuth {
    /// Create a new client from the auth configuration.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &AuthConfig) -> Self {
        Self {
            inner: Arc::new(IdentityToolkitInner {
                client,
                base_url: config.base_url.clone(),
                api_key: config.api_key.clone(),
                recaptcha_token: config.recaptcha_token.clone(),
                current: Mutex::new(None),
            }),
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1/accounts:{method}",
            self.inner.base_url.as_str().trim_end_matches('/')
        )
    }

    async fn call<Req, Resp>(
        &self,
        method: &str,
        body: &Req,
        timeout: Option<Duration>,
    ) -> Result<Resp, ProviderError>
    where
        Req: Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let mut request = self
            .inner
            .client
            .post(self.endpoint(method))
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorResponse>(&text)
                .map_or_else(|_| text.chars().take(200).collect(), |e| e.error.message);
            tracing::warn!(status = %status, method, message = %message, "Auth provider error");
            return Err(classify(message));
        }

        serde_json::from_str(&text)
            .map_err(|e| ProviderError::Parse(format!("Failed to parse {method} response: {e}")))
    }

    fn set_current(&self, user: Option<User>) {
        *self
            .inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = user;
    }
}

/// Map a provider error message to the matching [`ProviderError`].
///
/// Messages look like `INVALID_CODE` or `TOO_SHORT : detail`.
fn classify(message: String) -> ProviderError {
    let code = message.split([' ', ':']).next().unwrap_or_default();
    if CREDENTIAL_ERRORS.contains(&code) {
        ProviderError::InvalidCredential(message)
    } else {
        ProviderError::Rejected(message)
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitAuth {
    #[instrument(skip(self, phone_number))]
    async fn verify_phone_number(
        &self,
        phone_number: &str,
        timeout: Duration,
    ) -> Result<VerificationEvent, ProviderError> {
        let request = SendCodeRequest {
            phone_number,
            recaptcha_token: self
                .inner
                .recaptcha_token
                .as_ref()
                .map(ExposeSecret::expose_secret),
        };
        let response: SendCodeResponse = self
            .call("sendVerificationCode", &request, Some(timeout))
            .await?;

        tracing::info!("Verification code requested");
        Ok(VerificationEvent::CodeSent(VerificationId::new(
            response.session_info,
        )))
    }

    #[instrument(skip(self, credential))]
    async fn sign_in(&self, credential: &PhoneCredential) -> Result<User, ProviderError> {
        let request = SignInRequest {
            session_info: credential.verification_id.as_str(),
            code: &credential.code,
        };
        let response: SignInResponse = self.call("signInWithPhoneNumber", &request, None).await?;

        let mut user = User::new(response.local_id).with_id_token(response.id_token);
        user.phone_number = response.phone_number;
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        self.set_current(None);
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.inner
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
