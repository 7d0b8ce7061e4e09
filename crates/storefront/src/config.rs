//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FLASH_DATABASE_URL` - Realtime database base URL (e.g., `https://flash-default-rtdb.firebaseio.com`)
//! - `FLASH_API_KEY` - Auth provider web API key
//!
//! ## Optional
//! - `FLASH_CATALOG_URL` - Catalog JSON endpoint (default: the hosted grocery catalog)
//! - `FLASH_AUTH_BASE_URL` - Identity Toolkit base URL (default: `https://identitytoolkit.googleapis.com`)
//! - `FLASH_RECAPTCHA_TOKEN` - App verification token sent with code dispatch
//! - `FLASH_SPLASH_DELAY_MS` - Offer screen duration in milliseconds (default: 3000)
//! - `FLASH_OTP_RESEND_SECS` - Seconds before an OTP can be resent (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Hosted catalog the app has always shipped against.
pub const DEFAULT_CATALOG_URL: &str =
    "https://training-uploads.internshala.com/android/grocery_delivery_app/items.json";
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com";
pub const DEFAULT_SPLASH_DELAY_MS: u64 = 3000;
pub const DEFAULT_OTP_RESEND_SECS: u64 = 60;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Flash client configuration.
#[derive(Debug, Clone)]
pub struct FlashConfig {
    /// Catalog endpoint returning the JSON item array
    pub catalog_url: Url,
    /// Realtime database base URL holding `users/{uid}/cart`
    pub database_url: Url,
    /// Phone auth provider configuration
    pub auth: AuthConfig,
    /// Session timing
    pub timing: TimingConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Phone auth provider configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AuthConfig {
    /// Identity Toolkit base URL
    pub base_url: Url,
    /// Web API key identifying the project
    pub api_key: SecretString,
    /// App verification token required by code dispatch
    pub recaptcha_token: Option<SecretString>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field(
                "recaptcha_token",
                &self.recaptcha_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Timers owned by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingConfig {
    /// How long the offer screen stays up on launch
    pub splash_delay: Duration,
    /// Countdown before "Resend OTP" becomes available
    pub otp_resend_secs: u64,
    /// Provider-side timeout for code dispatch
    pub verification_timeout: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            splash_delay: Duration::from_millis(DEFAULT_SPLASH_DELAY_MS),
            otp_resend_secs: DEFAULT_OTP_RESEND_SECS,
            verification_timeout: Duration::from_secs(60),
        }
    }
}

impl FlashConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let catalog_url = env.url_or_default("FLASH_CATALOG_URL", DEFAULT_CATALOG_URL)?;
        let database_url = env.required_url("FLASH_DATABASE_URL")?;
        let auth = AuthConfig {
            base_url: env.url_or_default("FLASH_AUTH_BASE_URL", DEFAULT_AUTH_BASE_URL)?,
            api_key: env.validated_secret("FLASH_API_KEY")?,
            recaptcha_token: env.optional("FLASH_RECAPTCHA_TOKEN").map(SecretString::from),
        };

        let timing = TimingConfig {
            splash_delay: Duration::from_millis(
                env.number_or_default("FLASH_SPLASH_DELAY_MS", DEFAULT_SPLASH_DELAY_MS)?,
            ),
            otp_resend_secs: env.number_or_default("FLASH_OTP_RESEND_SECS", DEFAULT_OTP_RESEND_SECS)?,
            ..TimingConfig::default()
        };

        Ok(Self {
            catalog_url,
            database_url,
            auth,
            timing,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get an optional variable, treating empty values as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn required_url(&self, key: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.required(key)?)
    }

    fn url_or_default(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        parse_url(key, &self.optional(key).unwrap_or_else(|| default.to_string()))
    }

    fn number_or_default(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.optional(key).map_or(Ok(default), |v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Load and validate a secret.
    fn validated_secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        let value = self.required(key)?;
        validate_secret_strength(&value, key)?;
        Ok(SecretString::from(value))
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API keys are random and have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Copy the key from the project settings."
            ),
        ));
    }

    Ok(())
}
