//! Runtime configuration for the provider clients.
//!
//! Everything is read once at startup from the environment (optionally seeded from a
//! `.env` file) and handed to each client explicitly.

use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

pub const APPLE_WLOC_URL: &str = "https://gs-loc.apple.com/clls/wloc";
pub const GOOGLE_GEOLOCATE_URL: &str = "https://www.googleapis.com/geolocation/v1/geolocate";

/// Second access point sent along with every Google query.
pub const GOOGLE_FALLBACK_BSSID: &str = "00:25:9c:cf:1c:ad";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct AppleConfig {
    pub endpoint: String,
    pub locale: String,
    pub client_id: String,
    pub os_version: String,
}

impl Default for AppleConfig {
    fn default() -> Self {
        Self {
            endpoint: APPLE_WLOC_URL.to_string(),
            locale: "en_US".to_string(),
            client_id: "com.apple.locationd".to_string(),
            os_version: "8.1.12B411".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub endpoint: String,
    /// `None` is a valid configuration: lookups then fail with a missing-key error.
    pub api_key: Option<String>,
    pub fallback_bssid: String,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            endpoint: GOOGLE_GEOLOCATE_URL.to_string(),
            api_key: None,
            fallback_bssid: GOOGLE_FALLBACK_BSSID.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub apple: AppleConfig,
    pub google: GoogleConfig,
    /// Upper bound on each individual HTTP request.
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apple: AppleConfig::default(),
            google: GoogleConfig::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = get("APPLE_WLOC_URL") {
            config.apple.endpoint = url;
        }
        if let Some(url) = get("GOOGLE_GEOLOCATE_URL") {
            config.google.endpoint = url;
        }
        if let Some(bssid) = get("GOOGLE_FALLBACK_BSSID") {
            config.google.fallback_bssid = bssid;
        }

        config.google.api_key = get("GOOGLE_API_KEY");
        if config.google.api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set; Google lookups will report an error");
        }

        if let Some(raw) = get("BSSID_LOCATE_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Config(format!(
                        "BSSID_LOCATE_TIMEOUT_SECS must be a positive integer, got {:?}",
                        raw
                    ))
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        debug!(
            timeout = ?config.timeout,
            apple = %config.apple.endpoint,
            google = %config.google.endpoint,
            "Configuration loaded"
        );
        Ok(config)
    }
}
