//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `MARKETPULSE_DATA_DIR` - Directory for the cart snapshot and order history (default: `.marketpulse`)
//! - `MARKETPULSE_CATALOG` - Product catalog JSON file (default: `data/products.json`)
//! - `MARKETPULSE_REVIEWS` - Product reviews JSON file, optional (default: `data/reviews.json`)
//! - `MARKETPULSE_CACHE_TTL_SECS` - Product cache time-to-live (default: 300)
//! - `MARKETPULSE_CACHE_CAPACITY` - Product cache size (default: 1000)
//! - `MARKETPULSE_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 50)
//! - `MARKETPULSE_FLAT_SHIPPING` - Shipping below the threshold (default: 9.99)
//! - `MARKETPULSE_TAX_RATE` - Tax rate as a fraction (default: 0.08)
//! - `MARKETPULSE_LOG_FORMAT` - `text` or `json` log lines on stderr (default: `text`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (default: `development`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::cache::{DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::checkout::CheckoutPolicy;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event, for log shippers.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected text or json, got {other:?}")),
        }
    }
}

/// Storefront application configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Directory holding the cart snapshot and order history
    pub data_dir: PathBuf,
    /// Product catalog file
    pub catalog_path: PathBuf,
    /// Product reviews file; a missing file means no reviews
    pub reviews_path: PathBuf,
    /// Product lookup cache settings
    pub cache: CacheConfig,
    /// Shipping and tax rules
    pub checkout: CheckoutPolicy,
    /// Log line format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: String,
}

/// Product lookup cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    pub capacity: u64,
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            ttl: DEFAULT_TTL,
        }
    }
}

// The DSN embeds a project key.
impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("data_dir", &self.data_dir)
            .field("catalog_path", &self.catalog_path)
            .field("reviews_path", &self.reviews_path)
            .field("cache", &self.cache)
            .field("checkout", &self.checkout)
            .field("log_format", &self.log_format)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".marketpulse"),
            catalog_path: PathBuf::from("data/products.json"),
            reviews_path: PathBuf::from("data/reviews.json"),
            cache: CacheConfig::default(),
            checkout: CheckoutPolicy::default(),
            log_format: LogFormat::default(),
            sentry_dsn: None,
            sentry_environment: "development".to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup, applying defaults for
    /// unset or empty keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let defaults = Self::default();

        let cache = CacheConfig {
            capacity: env.parsed("MARKETPULSE_CACHE_CAPACITY")?.unwrap_or(defaults.cache.capacity),
            ttl: env
                .parsed("MARKETPULSE_CACHE_TTL_SECS")?
                .map_or(defaults.cache.ttl, Duration::from_secs),
        };

        let checkout = CheckoutPolicy {
            free_shipping_threshold: env
                .decimal("MARKETPULSE_FREE_SHIPPING_THRESHOLD")?
                .unwrap_or(defaults.checkout.free_shipping_threshold),
            flat_shipping: env
                .decimal("MARKETPULSE_FLAT_SHIPPING")?
                .unwrap_or(defaults.checkout.flat_shipping),
            tax_rate: env
                .decimal("MARKETPULSE_TAX_RATE")?
                .unwrap_or(defaults.checkout.tax_rate),
        };
        if checkout.tax_rate > Decimal::ONE {
            return Err(ConfigError::InvalidEnvVar(
                "MARKETPULSE_TAX_RATE".to_string(),
                format!("must be a fraction between 0 and 1 (got {})", checkout.tax_rate),
            ));
        }

        Ok(Self {
            data_dir: env.get("MARKETPULSE_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            catalog_path: env
                .get("MARKETPULSE_CATALOG")
                .map_or(defaults.catalog_path, PathBuf::from),
            reviews_path: env
                .get("MARKETPULSE_REVIEWS")
                .map_or(defaults.reviews_path, PathBuf::from),
            cache,
            checkout,
            log_format: env
                .parsed("MARKETPULSE_LOG_FORMAT")?
                .unwrap_or(defaults.log_format),
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env
                .get("SENTRY_ENVIRONMENT")
                .unwrap_or(defaults.sentry_environment),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable, treating blank values as unset.
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Get and parse an optional variable.
    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }

    /// Get a non-negative decimal.
    fn decimal(&self, key: &str) -> Result<Option<Decimal>, ConfigError> {
        let value = self.parsed::<Decimal>(key)?;
        if value.is_some_and(|v| v.is_sign_negative()) {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must not be negative".to_string(),
            ));
        }
        Ok(value)
    }
}
