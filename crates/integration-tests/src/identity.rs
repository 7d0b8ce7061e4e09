//! Identity Toolkit stand-in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde::Deserialize;
use serde_json::json;

use crate::{TEST_API_KEY, TEST_CODE, TEST_ID_TOKEN};

#[derive(Debug, Deserialize)]
struct KeyQuery {
    key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendCodeBody {
    phone_number: String,
    recaptcha_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInBody {
    session_info: String,
    code: String,
}

#[derive(Default)]
struct IdentityState {
    sessions: Vec<(String, String)>,
    recaptcha_tokens: Vec<Option<String>>,
    sign_in_calls: usize,
}

/// Phone sign-in endpoints accepting [`TEST_API_KEY`] and [`TEST_CODE`].
#[derive(Clone, Default)]
pub struct MockIdentityToolkit {
    state: Arc<Mutex<IdentityState>>,
}

impl MockIdentityToolkit {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/v1/accounts:sendVerificationCode", post(send_code))
            .route("/v1/accounts:signInWithPhoneNumber", post(sign_in))
            .with_state(self.clone())
    }

    /// Number of codes sent so far.
    #[must_use]
    pub fn codes_sent(&self) -> usize {
        self.lock().sessions.len()
    }

    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.lock().sign_in_calls
    }

    /// App verification token sent with the most recent dispatch.
    #[must_use]
    pub fn last_recaptcha_token(&self) -> Option<String> {
        self.lock().recaptcha_tokens.last().cloned().flatten()
    }

    fn lock(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn api_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": {"code": 400, "message": message, "errors": [{"message": message}]}
        })),
    )
        .into_response()
}

async fn send_code(
    State(mock): State<MockIdentityToolkit>,
    Query(query): Query<KeyQuery>,
    axum::Json(body): axum::Json<SendCodeBody>,
) -> Response {
    if query.key.as_deref() != Some(TEST_API_KEY) {
        return api_error("API key not valid. Please pass a valid API key.");
    }
    // +91 followed by ten digits
    if body.phone_number.len() != 13 {
        return api_error("INVALID_PHONE_NUMBER : TOO_SHORT");
    }

    let mut state = mock.lock();
    let session_info = format!("session-{}", state.sessions.len() + 1);
    state
        .sessions
        .push((session_info.clone(), body.phone_number));
    state.recaptcha_tokens.push(body.recaptcha_token);

    axum::Json(json!({"sessionInfo": session_info})).into_response()
}

async fn sign_in(
    State(mock): State<MockIdentityToolkit>,
    Query(query): Query<KeyQuery>,
    axum::Json(body): axum::Json<SignInBody>,
) -> Response {
    if query.key.as_deref() != Some(TEST_API_KEY) {
        return api_error("API key not valid. Please pass a valid API key.");
    }

    let mut state = mock.lock();
    state.sign_in_calls += 1;

    let Some(phone_number) = state
        .sessions
        .iter()
        .find(|(session, _)| *session == body.session_info)
        .map(|(_, phone)| phone.clone())
    else {
        return api_error("INVALID_SESSION_INFO");
    };
    if body.code != TEST_CODE {
        return api_error("INVALID_CODE");
    }

    let local_id = format!("uid-{}", phone_number.trim_start_matches('+'));
    axum::Json(json!({
        "idToken": TEST_ID_TOKEN,
        "refreshToken": "mock-refresh-token",
        "expiresIn": "3600",
        "localId": local_id,
        "isNewUser": false,
        "phoneNumber": phone_number,
    }))
    .into_response()
}
