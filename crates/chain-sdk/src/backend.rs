//! Remote data needed to build and submit a transaction.

use bitcoin::{Transaction, Txid};
use chain_api::{ApiError, ChainClient, ChainConfig, RawTransactionClient};
use chain_btc::UnspentOutput;

/// Source of unspent outputs and funding transactions, and sink for signed
/// transactions.
pub trait ChainBackend {
    /// Unspent outputs of every address in `addresses`, in one lookup.
    fn addresses_unspents(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, ApiError>;

    /// The transaction that created an unspent output.
    fn fetch_transaction(&self, txid: &Txid) -> Result<Transaction, ApiError>;

    /// Submit hex-encoded signed transaction bytes, returning the hash the
    /// service assigned.
    fn send_transaction(&self, hex: &str) -> Result<String, ApiError>;
}

/// Backend talking to the Chain API and a raw transaction service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ChainClient,
    raw: RawTransactionClient,
}

impl HttpBackend {
    pub fn new(config: &ChainConfig) -> Result<Self, ApiError> {
        Ok(Self {
            client: ChainClient::new(config.clone())?,
            raw: RawTransactionClient::new(config)?,
        })
    }

    /// The Chain API client, for queries beyond transaction building.
    pub fn client(&self) -> &ChainClient {
        &self.client
    }
}

impl ChainBackend for HttpBackend {
    fn addresses_unspents(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, ApiError> {
        self.client.get_addresses_unspents(addresses)
    }

    fn fetch_transaction(&self, txid: &Txid) -> Result<Transaction, ApiError> {
        self.raw.fetch_transaction(txid)
    }

    fn send_transaction(&self, hex: &str) -> Result<String, ApiError> {
        Ok(self.client.send_transaction(hex)?.transaction_hash)
    }
}
