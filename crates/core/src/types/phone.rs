//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Country calling code prepended to every number sent to the auth provider.
///
/// The storefront only operates in India; this is not configurable.
pub const COUNTRY_CODE: &str = "+91";

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("phone number must be at most {max} digits")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains something other than ASCII digits.
    #[error("phone number may only contain digits")]
    NonDigit,
}

/// A national (subscriber) phone number, without the country code.
///
/// ## Constraints
///
/// - Length: 1-12 digits (E.164 allows 15 including the country code)
/// - ASCII digits only; surrounding whitespace is trimmed
///
/// ## Examples
///
/// ```
/// use flash_core::PhoneNumber;
///
/// let number = PhoneNumber::parse("9876543210").unwrap();
/// assert_eq!(number.to_e164(), "+919876543210");
///
/// assert!(PhoneNumber::parse("").is_err());
/// assert!(PhoneNumber::parse("98-76").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Maximum number of national digits.
    pub const MAX_LENGTH: usize = 12;

    /// Parse a `PhoneNumber` from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains non-digit characters.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneNumberError::NonDigit);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(PhoneNumberError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the national number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the full international form sent to the auth provider.
    #[must_use]
    pub fn to_e164(&self) -> String {
        format!("{COUNTRY_CODE}{}", self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_numbers() {
        assert!(PhoneNumber::parse("9876543210").is_ok());
        assert!(PhoneNumber::parse(" 9876543210 ").is_ok());
        assert!(PhoneNumber::parse("1").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse(""), Err(PhoneNumberError::Empty));
        assert_eq!(PhoneNumber::parse("   "), Err(PhoneNumberError::Empty));
    }

    #[test]
    fn test_parse_non_digit() {
        assert_eq!(
            PhoneNumber::parse("+919876543210"),
            Err(PhoneNumberError::NonDigit)
        );
        assert_eq!(PhoneNumber::parse("98765 4321"), Err(PhoneNumberError::NonDigit));
    }

    #[test]
    fn test_parse_too_long() {
        assert!(matches!(
            PhoneNumber::parse(&"9".repeat(13)),
            Err(PhoneNumberError::TooLong { max: 12 })
        ));
    }

    #[test]
    fn test_to_e164_prepends_country_code() {
        let number = PhoneNumber::parse("9876543210").unwrap();
        assert_eq!(number.to_e164(), "+919876543210");
        assert_eq!(number.as_str(), "9876543210");
    }

    #[test]
    fn test_from_str() {
        let number: PhoneNumber = "12345".parse().unwrap();
        assert_eq!(number.to_string(), "12345");
    }
}
