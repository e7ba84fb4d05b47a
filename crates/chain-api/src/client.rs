//! Blocking HTTP client for the Chain REST API.

use chain_btc::UnspentOutput;
use log::{debug, info};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::config::{ChainConfig, API_VERSION};
use crate::error::ApiError;
use crate::types::{
    AddressInfo, BlockInfo, OneOrMany, SendTransactionRequest, SendTransactionResponse,
    TransactionInfo,
};

pub(crate) const USER_AGENT: &str = concat!("chain-sdk/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Chain API.
#[derive(Debug, Clone)]
pub struct ChainClient {
    /// Client configuration.
    config: ChainConfig,
    /// Underlying HTTP client.
    client: Client,
}

impl ChainClient {
    /// Create a new Chain client with the given configuration.
    pub fn new(config: ChainConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Balance summary for one address.
    pub fn get_address(&self, address: &str) -> Result<AddressInfo, ApiError> {
        self.get_addresses(&[address.to_string()])?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::NotFound(format!("address {address}")))
    }

    /// Balance summaries for several addresses in one request.
    pub fn get_addresses(&self, addresses: &[String]) -> Result<Vec<AddressInfo>, ApiError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let path = format!("addresses/{}", addresses.join(","));
        let found: Option<OneOrMany<AddressInfo>> = self.get(&path)?;
        Ok(found.map(OneOrMany::into_vec).unwrap_or_default())
    }

    /// Unspent outputs for one address.
    pub fn get_address_unspents(&self, address: &str) -> Result<Vec<UnspentOutput>, ApiError> {
        self.get_addresses_unspents(&[address.to_string()])
    }

    /// Unspent outputs for every address in `addresses`, in one request.
    pub fn get_addresses_unspents(
        &self,
        addresses: &[String],
    ) -> Result<Vec<UnspentOutput>, ApiError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let path = format!("addresses/{}/unspents", addresses.join(","));
        // The service answers `null` for addresses that were never funded.
        let found: Option<OneOrMany<UnspentOutput>> = self.get(&path)?;
        Ok(found.map(OneOrMany::into_vec).unwrap_or_default())
    }

    /// Transaction details by hash.
    pub fn get_transaction(&self, hash: &str) -> Result<TransactionInfo, ApiError> {
        self.get(&format!("transactions/{hash}"))
    }

    /// Block by hash or height.
    pub fn get_block(&self, hash_or_height: &str) -> Result<BlockInfo, ApiError> {
        self.get(&format!("blocks/{hash_or_height}"))
    }

    pub fn get_latest_block(&self) -> Result<BlockInfo, ApiError> {
        self.get("blocks/latest")
    }

    /// Submit a hex-encoded signed transaction to the network.
    pub fn send_transaction(&self, hex: &str) -> Result<SendTransactionResponse, ApiError> {
        let url = self.url("transactions");
        debug!("PUT {url}");

        let body = SendTransactionRequest {
            hex: hex.to_string(),
        };
        let resp = self.authorize(self.client.put(&url)).json(&body).send()?;
        let sent: SendTransactionResponse = Self::parse(resp, "transactions")?;

        info!("submitted transaction {}", sent.transaction_hash);
        Ok(sent)
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            API_VERSION,
            self.config.network.chain_path(),
            path
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.config.api_key_id, self.config.api_key_secret.as_deref())
    }

    /// Perform a GET request and deserialize the response.
    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!("GET {url}");

        let resp = self.authorize(self.client.get(&url)).send()?;
        Self::parse(resp, path)
    }

    fn parse<T: DeserializeOwned>(resp: Response, resource: &str) -> Result<T, ApiError> {
        let status = resp.status();

        if status.as_u16() == 404 {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(ApiError::Server {
                status_code: status.as_u16(),
                message,
            });
        }

        let text = resp.text()?;
        Ok(serde_json::from_str(&text)?)
    }
}
