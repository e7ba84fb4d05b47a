//! Raw transaction fetches from the webbtc-style `/tx/{hash}.bin` service.

use std::thread;
use std::time::Duration;

use bitcoin::{consensus, Transaction, Txid};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};

use crate::client::USER_AGENT;
use crate::config::ChainConfig;
use crate::error::ApiError;

/// Fetches raw transactions by hash, retrying transient connection failures.
#[derive(Debug, Clone)]
pub struct RawTransactionClient {
    host: String,
    retry_delay: Duration,
    /// `None` retries without limit.
    max_attempts: Option<u32>,
    client: Client,
}

impl RawTransactionClient {
    pub fn new(config: &ChainConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            host: config.raw_tx_host().to_string(),
            retry_delay: config.retry_delay(),
            max_attempts: config.max_fetch_attempts.map(|n| n.max(1)),
            client,
        })
    }

    /// Fetch and decode the transaction `txid`.
    pub fn fetch_transaction(&self, txid: &Txid) -> Result<Transaction, ApiError> {
        let bytes = self.fetch_raw(txid)?;
        consensus::deserialize(&bytes)
            .map_err(|e| ApiError::Decode(format!("transaction {txid}: {e}")))
    }

    /// Fetch the consensus bytes of `txid`.
    ///
    /// Connection failures and timeouts are retried after a fixed delay,
    /// until one attempt gets through or the configured cap is reached.
    /// HTTP error statuses are returned immediately.
    pub fn fetch_raw(&self, txid: &Txid) -> Result<Vec<u8>, ApiError> {
        let url = format!("{}/tx/{txid}.bin", self.host);
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            debug!("GET {url} (attempt {attempt})");

            match self.client.get(&url).send() {
                Ok(resp) => return Self::read_body(resp, txid),
                Err(e) if is_transient(&e) && self.may_retry(attempt) => {
                    warn!(
                        "fetching {txid} failed ({e}), retrying in {:?}",
                        self.retry_delay
                    );
                    thread::sleep(self.retry_delay);
                }
                Err(e) if is_transient(&e) => {
                    return Err(ApiError::Connection {
                        attempts: attempt,
                        message: e.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn may_retry(&self, attempt: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempt < max)
    }

    fn read_body(resp: Response, txid: &Txid) -> Result<Vec<u8>, ApiError> {
        let status = resp.status();

        if status.as_u16() == 404 {
            return Err(ApiError::NotFound(format!("transaction {txid}")));
        }

        if !status.is_success() {
            let message = resp.text().unwrap_or_default();
            return Err(ApiError::Server {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(resp.bytes()?.to_vec())
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
