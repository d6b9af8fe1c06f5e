//! Shipping configuration loaded from environment variables.
//!
//! Carrier API keys are capabilities: a carrier with a key gets a live
//! integration, a carrier without one is served from the fallback rate table.
//! Business logic never reads the process environment; it receives a
//! [`ShippingConfig`] at construction time.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `OLVA_API_KEY` - Olva Courier API key (enables live Olva quotes/labels)
//! - `OLVA_API_URL` - Olva API base URL (default: `https://api.olvacourier.com/v1`)
//! - `SHALOM_API_KEY` - Shalom API key (enables live Shalom quotes/labels)
//! - `SHALOM_API_URL` - Shalom API base URL (default: `https://api.shalom.com.pe/v1`)
//! - `AGROSHIP_ORIGIN_DISTRICT` - Dispatch district (default: Lima)
//! - `AGROSHIP_PROVIDER_TIMEOUT_MS` - Per-carrier call budget (default: 4000)
//! - `AGROSHIP_SENDER_NAME` - Sender name on labels (default: AgroBesser)
//! - `AGROSHIP_SENDER_PHONE` - Sender phone on labels
//! - `AGROSHIP_SENDER_ADDRESS` - Sender address on labels

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::circuit_breaker::CircuitBreakerConfig;
use crate::CarrierId;

const DEFAULT_OLVA_URL: &str = "https://api.olvacourier.com/v1";
const DEFAULT_SHALOM_URL: &str = "https://api.shalom.com.pe/v1";
const DEFAULT_ORIGIN_DISTRICT: &str = "Lima";
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 4_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Live integration settings for one carrier.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct CarrierCredentials {
    pub carrier: CarrierId,
    /// Base URL without trailing slash, e.g. `https://api.olvacourier.com/v1`
    pub base_url: String,
    pub api_key: SecretString,
}

impl CarrierCredentials {
    pub fn new(carrier: CarrierId, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            carrier,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    pub fn bearer_token(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl std::fmt::Debug for CarrierCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CarrierCredentials")
            .field("carrier", &self.carrier)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Sender block printed on shipment labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderProfile {
    pub name: String,
    pub phone: String,
    pub address_line: String,
    pub district: String,
}

/// Shipping subsystem configuration.
#[derive(Debug, Clone)]
pub struct ShippingConfig {
    pub olva: Option<CarrierCredentials>,
    pub shalom: Option<CarrierCredentials>,
    /// District packages are dispatched from.
    pub origin_district: String,
    /// Budget for a single carrier call before it counts as failed.
    pub provider_timeout: Duration,
    pub circuit_breaker: CircuitBreakerConfig,
    pub sender: SenderProfile,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self::offline()
    }
}

impl ShippingConfig {
    /// Configuration without any live carrier integration.
    pub fn offline() -> Self {
        Self {
            olva: None,
            shalom: None,
            origin_district: String::from(DEFAULT_ORIGIN_DISTRICT),
            provider_timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            circuit_breaker: CircuitBreakerConfig::default(),
            sender: SenderProfile {
                name: String::from("AgroBesser"),
                phone: String::new(),
                address_line: String::new(),
                district: String::from(DEFAULT_ORIGIN_DISTRICT),
            },
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an optional variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads everything except carrier credentials from the environment.
    ///
    /// Carrier key and URL variables are not read, so a broken carrier
    /// setting cannot stop an offline run.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a non-carrier variable is present but invalid.
    pub fn offline_from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::offline_from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a present variable fails validation.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_blank(&lookup, name);

        let mut config = Self::offline_from_lookup(&lookup)?;
        config.olva = carrier_from_lookup(&get, CarrierId::Olva, "OLVA", DEFAULT_OLVA_URL)?;
        config.shalom = carrier_from_lookup(&get, CarrierId::Shalom, "SHALOM", DEFAULT_SHALOM_URL)?;
        Ok(config)
    }

    /// Like [`ShippingConfig::from_lookup`] but never reads carrier variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a present non-carrier variable fails validation.
    pub fn offline_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| non_blank(&lookup, name);

        let provider_timeout_ms = match get("AGROSHIP_PROVIDER_TIMEOUT_MS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar(String::from("AGROSHIP_PROVIDER_TIMEOUT_MS"), e.to_string())
            })?,
            None => DEFAULT_PROVIDER_TIMEOUT_MS,
        };
        if provider_timeout_ms == 0 {
            return Err(ConfigError::InvalidEnvVar(
                String::from("AGROSHIP_PROVIDER_TIMEOUT_MS"),
                String::from("must be greater than zero"),
            ));
        }

        let origin_district =
            get("AGROSHIP_ORIGIN_DISTRICT").unwrap_or_else(|| String::from(DEFAULT_ORIGIN_DISTRICT));

        let sender = SenderProfile {
            name: get("AGROSHIP_SENDER_NAME").unwrap_or_else(|| String::from("AgroBesser")),
            phone: get("AGROSHIP_SENDER_PHONE").unwrap_or_default(),
            address_line: get("AGROSHIP_SENDER_ADDRESS").unwrap_or_default(),
            district: origin_district.clone(),
        };

        Ok(Self {
            olva: None,
            shalom: None,
            origin_district,
            provider_timeout: Duration::from_millis(provider_timeout_ms),
            circuit_breaker: CircuitBreakerConfig::default(),
            sender,
        })
    }

    pub fn with_carrier(mut self, credentials: CarrierCredentials) -> Self {
        match credentials.carrier {
            CarrierId::Olva => self.olva = Some(credentials),
            CarrierId::Shalom => self.shalom = Some(credentials),
            other => {
                tracing::warn!(carrier = %other, "carrier has no live integration; ignoring credentials");
            }
        }
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Drops every live integration, keeping the remaining settings.
    pub fn without_live_carriers(mut self) -> Self {
        self.olva = None;
        self.shalom = None;
        self
    }

    pub fn live_carriers(&self) -> impl Iterator<Item = &CarrierCredentials> {
        self.olva.iter().chain(self.shalom.iter())
    }

    pub fn is_live(&self, carrier: CarrierId) -> bool {
        self.live_carriers().any(|credentials| credentials.carrier == carrier)
    }
}

fn non_blank<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn carrier_from_lookup<G>(
    get: &G,
    carrier: CarrierId,
    prefix: &str,
    default_url: &str,
) -> Result<Option<CarrierCredentials>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let Some(api_key) = get(&format!("{prefix}_API_KEY")) else {
        return Ok(None);
    };

    let url_var = format!("{prefix}_API_URL");
    let base_url = get(&url_var).unwrap_or_else(|| default_url.to_owned());
    if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
        return Err(ConfigError::InvalidEnvVar(
            url_var,
            String::from("must be an http(s) URL"),
        ));
    }

    Ok(Some(CarrierCredentials::new(carrier, base_url, api_key)))
}
