//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `EMPORIUM_API_URL` - Base URL of the storefront REST API (http or https)
//!
//! ## Optional
//! - `EMPORIUM_API_TOKEN` - Bearer token identifying the shopper's session
//! - `EMPORIUM_PRODUCT_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `EMPORIUM_PRODUCT_CACHE_CAPACITY` - Product cache entries (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_PRODUCT_CACHE_CAPACITY: u64 = 1000;
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

/// Top-level configuration for binaries using the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API connection settings
    pub api: ApiConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// REST API connection settings.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Bearer token for the current session; `None` browses anonymously
    pub token: Option<SecretString>,
    /// How long a cached product stays fresh
    pub product_cache_ttl: Duration,
    /// Maximum cached product entries
    pub product_cache_capacity: u64,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("product_cache_capacity", &self.product_cache_capacity)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the API token fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            api: ApiConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl ApiConfig {
    /// Settings for `base_url` with no token and default cache sizing.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            product_cache_capacity: DEFAULT_PRODUCT_CACHE_CAPACITY,
        }
    }

    /// Attach a session token.
    #[must_use]
    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    fn from_env() -> Result<Self, ConfigError> {
        let base_url = parse_base_url("EMPORIUM_API_URL", &get_required_env("EMPORIUM_API_URL")?)?;

        let token = get_optional_env("EMPORIUM_API_TOKEN")
            .map(|value| {
                validate_secret_strength(&value, "EMPORIUM_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(value))
            })
            .transpose()?;

        let ttl_secs = parse_u64(
            "EMPORIUM_PRODUCT_CACHE_TTL_SECS",
            get_optional_env("EMPORIUM_PRODUCT_CACHE_TTL_SECS"),
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;
        let capacity = parse_u64(
            "EMPORIUM_PRODUCT_CACHE_CAPACITY",
            get_optional_env("EMPORIUM_PRODUCT_CACHE_CAPACITY"),
            DEFAULT_PRODUCT_CACHE_CAPACITY,
        )?;

        Ok(Self {
            base_url,
            token,
            product_cache_ttl: Duration::from_secs(ttl_secs),
            product_cache_capacity: capacity,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional numeric variable, falling back to `default` when unset.
fn parse_u64(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    value.map_or(Ok(default), |v| {
        v.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse the API base URL. Only `http` and `https` are accepted.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{other}' (expected http or https)"),
        )),
    }
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

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
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

    // Real session tokens (JWTs, opaque random ids) have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
