//! Request and response types for the Chain API.

use serde::{Deserialize, Deserializer, Serialize};

/// Balance totals for an address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Balance {
    pub balance: i64,
    pub received: u64,
    pub sent: u64,
}

/// Address summary returned by `/addresses/{address}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub address: String,
    /// Totals including unconfirmed transactions.
    #[serde(default)]
    pub total: Balance,
    /// Totals of confirmed transactions only.
    #[serde(default)]
    pub confirmed: Balance,
}

/// An input of a transaction returned by `/transactions/{hash}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionInputInfo {
    pub transaction_hash: Option<String>,
    pub output_index: Option<u32>,
    pub value: u64,
    pub addresses: Vec<String>,
    pub script_signature: Option<String>,
    pub coinbase: Option<String>,
}

/// An output of a transaction returned by `/transactions/{hash}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionOutputInfo {
    pub transaction_hash: String,
    pub output_index: u32,
    pub value: u64,
    pub addresses: Vec<String>,
    pub script: String,
    pub script_hex: Option<String>,
    pub script_type: String,
    pub required_signatures: Option<u32>,
    pub spent: bool,
}

/// Transaction details returned by `/transactions/{hash}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    pub hash: String,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_height: Option<u64>,
    #[serde(default)]
    pub block_time: Option<String>,
    #[serde(default)]
    pub chain_received_at: Option<String>,
    #[serde(default)]
    pub confirmations: u64,
    #[serde(default)]
    pub lock_time: u32,
    #[serde(default)]
    pub inputs: Vec<TransactionInputInfo>,
    #[serde(default)]
    pub outputs: Vec<TransactionOutputInfo>,
    #[serde(default)]
    pub fees: u64,
    #[serde(default)]
    pub amount: u64,
}

/// Block summary returned by `/blocks/{hash|height}` and `/blocks/latest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub hash: String,
    #[serde(default)]
    pub previous_block_hash: Option<String>,
    pub height: u64,
    #[serde(default)]
    pub confirmations: u64,
    #[serde(default)]
    pub merkle_root: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default)]
    pub difficulty: f64,
    #[serde(default)]
    pub transaction_hashes: Vec<String>,
}

/// Body of `PUT /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTransactionRequest {
    pub hex: String,
}

/// Response of `PUT /transactions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTransactionResponse {
    /// Identifier assigned to the submitted transaction.
    #[serde(deserialize_with = "string_or_number")]
    pub transaction_hash: String,
}

/// Endpoints answer a single object for one item and an array for a batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
