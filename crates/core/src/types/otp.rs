//! One-time code entered by the user.

use serde::{Deserialize, Serialize};

/// A partially or fully entered one-time code.
///
/// Input is sanitized as it is typed: anything that is not an ASCII digit is
/// dropped and the code never grows past [`OtpCode::LENGTH`] digits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OtpCode(String);

impl OtpCode {
    /// Number of digits the provider sends.
    pub const LENGTH: usize = 6;

    /// Build a code from raw input, keeping at most six digits.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        Self(
            input
                .chars()
                .filter(char::is_ascii_digit)
                .take(Self::LENGTH)
                .collect(),
        )
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
