//! Integration tests for the Identity Toolkit phone auth client.

use std::sync::Arc;
use std::time::Duration;

use flash_core::AuthStep;
use flash_integration_tests::identity::MockIdentityToolkit;
use flash_integration_tests::{TEST_API_KEY, TEST_CODE, TEST_ID_TOKEN, serve};
use flash_storefront::auth::{
    AuthError, AuthFlow, AuthProvider, IdentityToolkitAuth, PhoneCredential, ProviderError,
    VerificationEvent,
};
use flash_storefront::config::AuthConfig;
use flash_storefront::error::{AppError, INVALID_OTP_MESSAGE};
use secrecy::SecretString;

const TIMEOUT: Duration = Duration::from_secs(60);

async fn provider(api_key: &str) -> (MockIdentityToolkit, IdentityToolkitAuth) {
    let mock = MockIdentityToolkit::new();
    let base_url = serve(mock.router()).await;
    let config = AuthConfig {
        base_url,
        api_key: SecretString::from(api_key),
        recaptcha_token: Some(SecretString::from("recaptcha-verification-token")),
    };
    (mock, IdentityToolkitAuth::new(&config))
}

async fn send_code(auth: &IdentityToolkitAuth) -> PhoneCredential {
    let event = auth
        .verify_phone_number("+919876543210", TIMEOUT)
        .await
        .expect("dispatch failed");
    let VerificationEvent::CodeSent(verification_id) = event else {
        panic!("expected a code to be sent, got {event:?}");
    };
    PhoneCredential {
        verification_id,
        code: TEST_CODE.to_string(),
    }
}

#[tokio::test]
async fn test_send_code_returns_session_info() {
    let (mock, auth) = provider(TEST_API_KEY).await;

    let credential = send_code(&auth).await;
    assert_eq!(credential.verification_id.as_str(), "session-1");
    assert_eq!(mock.codes_sent(), 1);
    assert_eq!(
        mock.last_recaptcha_token().as_deref(),
        Some("recaptcha-verification-token")
    );
}

#[tokio::test]
async fn test_sign_in_with_correct_code() {
    let (_mock, auth) = provider(TEST_API_KEY).await;
    let credential = send_code(&auth).await;

    let user = auth.sign_in(&credential).await.expect("sign-in failed");
    assert_eq!(user.uid.as_str(), "uid-919876543210");
    assert_eq!(user.id_token(), Some(TEST_ID_TOKEN));
    assert_eq!(user.phone_number.as_deref(), Some("+919876543210"));
    assert!(auth.current_user().is_some());

    auth.sign_out().await.expect("sign-out failed");
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn test_wrong_code_is_invalid_credential() {
    let (_mock, auth) = provider(TEST_API_KEY).await;
    let mut credential = send_code(&auth).await;
    credential.code = "654321".to_string();

    let err = auth.sign_in(&credential).await.expect_err("expected rejection");
    assert!(matches!(err, ProviderError::InvalidCredential(m) if m == "INVALID_CODE"));
}

#[tokio::test]
async fn test_unknown_session_is_invalid_credential() {
    let (_mock, auth) = provider(TEST_API_KEY).await;
    let credential = PhoneCredential {
        verification_id: "stale-session".into(),
        code: TEST_CODE.to_string(),
    };

    let err = auth.sign_in(&credential).await.expect_err("expected rejection");
    assert!(matches!(err, ProviderError::InvalidCredential(_)));
}

#[tokio::test]
async fn test_bad_number_is_rejected() {
    let (_mock, auth) = provider(TEST_API_KEY).await;

    let err = auth
        .verify_phone_number("+9112345", TIMEOUT)
        .await
        .expect_err("expected rejection");
    assert!(matches!(err, ProviderError::Rejected(m) if m.starts_with("INVALID_PHONE_NUMBER")));
}

#[tokio::test]
async fn test_wrong_api_key_is_rejected() {
    let (mock, auth) = provider("AIzaSyWrongKey$7rT0uW4zC6vD8fG1hJqP2").await;

    let err = auth
        .verify_phone_number("+919876543210", TIMEOUT)
        .await
        .expect_err("expected rejection");
    assert!(matches!(err, ProviderError::Rejected(_)));
    assert_eq!(mock.codes_sent(), 0);
}

#[tokio::test]
async fn test_flow_against_provider() {
    let (mock, auth) = provider(TEST_API_KEY).await;
    let mut flow = AuthFlow::new(Arc::new(auth), 60, TIMEOUT);

    flow.submit_phone_number("9876543210").await.expect("dispatch failed");
    assert_eq!(flow.step(), AuthStep::CodeSent);

    let err = flow.submit_otp("000000").await.expect_err("expected rejection");
    assert!(matches!(err, AuthError::InvalidCredential));
    assert_eq!(AppError::from(err).user_message(), INVALID_OTP_MESSAGE);
    assert_eq!(flow.step(), AuthStep::Verifying);

    let user = flow.submit_otp(TEST_CODE).await.expect("sign-in failed");
    assert_eq!(user.uid.as_str(), "uid-919876543210");
    assert_eq!(flow.step(), AuthStep::SignedIn);
    assert_eq!(mock.sign_in_calls(), 2);
}
