use std::str::FromStr;

use bitcoin::{Network, NetworkKind};
use serde::{Deserialize, Serialize};

use crate::error::BtcError;

/// Chain API path segment for Bitcoin mainnet.
pub const MAINNET_PATH: &str = "bitcoin";

/// Chain API path segment for Bitcoin testnet3.
pub const TESTNET_PATH: &str = "testnet3";

/// Raw transaction host for Bitcoin mainnet.
pub const MAINNET_RAW_TX_HOST: &str = "http://webbtc.com";

/// Raw transaction host for Bitcoin testnet3.
pub const TESTNET_RAW_TX_HOST: &str = "http://test.webbtc.com";

/// Supported Bitcoin networks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BtcNetwork {
    #[default]
    Mainnet,
    Testnet,
}

impl BtcNetwork {
    /// Convert to the `bitcoin` crate's `Network` type.
    pub fn to_bitcoin_network(self) -> Network {
        match self {
            BtcNetwork::Mainnet => Network::Bitcoin,
            BtcNetwork::Testnet => Network::Testnet,
        }
    }

    /// Address and WIF version-byte family for this network.
    pub fn kind(self) -> NetworkKind {
        NetworkKind::from(self.to_bitcoin_network())
    }

    /// Path segment used by the Chain REST API (`/v2/{segment}/...`).
    pub fn chain_path(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_PATH,
            BtcNetwork::Testnet => TESTNET_PATH,
        }
    }

    /// Default host serving raw transactions by hash.
    pub fn default_raw_tx_host(self) -> &'static str {
        match self {
            BtcNetwork::Mainnet => MAINNET_RAW_TX_HOST,
            BtcNetwork::Testnet => TESTNET_RAW_TX_HOST,
        }
    }
}

impl FromStr for BtcNetwork {
    type Err = BtcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "main" => Ok(BtcNetwork::Mainnet),
            "testnet" | "testnet3" | "test" => Ok(BtcNetwork::Testnet),
            other => Err(BtcError::InvalidNetwork(format!("unknown network {other:?}"))),
        }
    }
}

impl std::fmt::Display for BtcNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BtcNetwork::Mainnet => write!(f, "mainnet"),
            BtcNetwork::Testnet => write!(f, "testnet"),
        }
    }
}
