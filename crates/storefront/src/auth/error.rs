//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while driving the sign-in flow.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid phone number format.
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(#[from] flash_core::PhoneNumberError),

    /// The provider refused to send a code.
    #[error("verification failed: {0}")]
    Dispatch(String),

    /// Verify was pressed with no code entered.
    #[error("no OTP entered")]
    EmptyOtp,

    /// A code was submitted before one was requested.
    #[error("no verification in progress")]
    NoVerification,

    /// The provider rejected the code or verification handle.
    #[error("invalid credential")]
    InvalidCredential,

    /// Resend pressed before the countdown finished.
    #[error("resend available in {remaining} seconds")]
    ResendNotReady {
        /// Seconds left on the countdown.
        remaining: u64,
    },

    /// Any other provider failure.
    #[error("provider error: {0}")]
    Provider(String),
}

/// Errors reported by an [`AuthProvider`](super::AuthProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The code or verification handle is wrong or expired.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The provider answered with an error.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}
