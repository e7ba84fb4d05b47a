use std::str::FromStr;

use bitcoin::{OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};

use crate::error::BtcError;
use crate::transaction::sum_sat;

/// An unspent transaction output as reported by the Chain API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Transaction ID as a hex string (display order).
    pub transaction_hash: String,
    /// Output index within the transaction.
    pub output_index: u32,
    /// Value in satoshis.
    pub value: u64,
    /// Addresses paid by the output script. Observed to hold exactly one.
    pub addresses: Vec<String>,
    /// Human-readable script assembly.
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub script_hex: Option<String>,
    #[serde(default)]
    pub script_type: String,
    #[serde(default)]
    pub required_signatures: Option<u32>,
    #[serde(default)]
    pub spent: bool,
    #[serde(default)]
    pub confirmations: u64,
}

impl UnspentOutput {
    pub fn txid(&self) -> Result<Txid, BtcError> {
        Txid::from_str(&self.transaction_hash).map_err(|e| {
            BtcError::TransactionBuildError(format!(
                "invalid transaction hash {}: {e}",
                self.transaction_hash
            ))
        })
    }

    pub fn outpoint(&self) -> Result<OutPoint, BtcError> {
        Ok(OutPoint::new(self.txid()?, self.output_index))
    }

    /// The address whose key spends this output.
    pub fn owner(&self) -> Result<&str, BtcError> {
        self.addresses.first().map(String::as_str).ok_or_else(|| {
            BtcError::TransactionBuildError(format!(
                "unspent {}:{} has no addresses",
                self.transaction_hash, self.output_index
            ))
        })
    }

    /// Decoded `script_hex`, when the service supplied it.
    pub fn script_pubkey(&self) -> Result<Option<ScriptBuf>, BtcError> {
        self.script_hex
            .as_deref()
            .map(|h| {
                hex::decode(h)
                    .map(ScriptBuf::from_bytes)
                    .map_err(|e| BtcError::Script(format!("invalid script hex: {e}")))
            })
            .transpose()
    }
}

/// Total value of a set of unspent outputs.
pub fn total_value(unspents: &[UnspentOutput]) -> Result<u64, BtcError> {
    sum_sat(unspents.iter().map(|u| u.value))
}
