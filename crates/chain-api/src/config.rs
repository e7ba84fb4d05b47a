//! Client configuration.
//!
//! Configuration is an explicit value handed to each client. Nothing here is
//! process-global; [`ChainConfig::from_env`] only reads the environment when
//! called.

use std::time::Duration;

use chain_btc::BtcNetwork;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Default Chain API endpoint.
pub const CHAIN_URL: &str = "https://api.chain.com";

/// Prefixed to the path of every Chain API request.
pub const API_VERSION: &str = "v2";

/// Key id used when no credential is configured.
pub const GUEST_KEY: &str = "GUEST-TOKEN";

/// Fixed delay between raw transaction fetch attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the Chain API and raw transaction clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Network used for API paths, addresses and keys.
    pub network: BtcNetwork,
    /// Chain API base URL without credentials or trailing slash.
    pub base_url: String,
    /// API key id, sent as the basic-auth user.
    pub api_key_id: String,
    /// API key secret, sent as the basic-auth password.
    pub api_key_secret: Option<String>,
    /// Raw transaction host. Falls back to the network default.
    pub raw_tx_url: Option<String>,
    /// Backoff between raw transaction fetch attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Cap on raw transaction fetch attempts, including the first one.
    /// `None` keeps retrying connection failures until one succeeds.
    pub max_fetch_attempts: Option<u32>,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: BtcNetwork::Mainnet,
            base_url: CHAIN_URL.to_string(),
            api_key_id: GUEST_KEY.to_string(),
            api_key_secret: None,
            raw_tx_url: None,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_fetch_attempts: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ChainConfig {
    /// Default configuration for `network`.
    pub fn for_network(network: BtcNetwork) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    /// Read `CHAIN_URL` and `CHAIN_NETWORK` from the environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_vars(
            std::env::var("CHAIN_URL").ok().as_deref(),
            std::env::var("CHAIN_NETWORK").ok().as_deref(),
        )
    }

    /// Build a configuration from optional `CHAIN_URL` / `CHAIN_NETWORK`
    /// values. Credentials embedded in the URL become the API key.
    pub fn from_vars(chain_url: Option<&str>, network: Option<&str>) -> Result<Self, ApiError> {
        let mut config = Self::default();

        if let Some(network) = network {
            config.network = network
                .parse()
                .map_err(|e| ApiError::InvalidConfig(format!("CHAIN_NETWORK: {e}")))?;
        }

        if let Some(raw) = chain_url {
            config.set_url(raw)?;
        }

        Ok(config)
    }

    /// Point the client at `raw`, taking the key id and secret from its
    /// user-info section when present.
    pub fn set_url(&mut self, raw: &str) -> Result<(), ApiError> {
        let mut url = Url::parse(raw)
            .map_err(|e| ApiError::InvalidConfig(format!("invalid URL {raw:?}: {e}")))?;

        if !url.username().is_empty() {
            self.api_key_id = url.username().to_string();
            self.api_key_secret = url.password().filter(|p| !p.is_empty()).map(str::to_string);
        }

        url.set_username("")
            .and_then(|_| url.set_password(None))
            .map_err(|_| ApiError::InvalidConfig(format!("URL {raw:?} cannot carry credentials")))?;

        self.base_url = url.as_str().trim_end_matches('/').to_string();
        Ok(())
    }

    /// Host serving raw transactions for this configuration.
    pub fn raw_tx_host(&self) -> &str {
        self.raw_tx_url
            .as_deref()
            .unwrap_or_else(|| self.network.default_raw_tx_host())
            .trim_end_matches('/')
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
