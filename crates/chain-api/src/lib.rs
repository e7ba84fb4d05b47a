//! # chain-api
//!
//! Blocking HTTP clients for the Chain Bitcoin API and for the raw
//! transaction service used to resolve previous outputs.
//!
//! # Example
//!
//! ```no_run
//! use chain_api::{ChainClient, ChainConfig};
//! use chain_btc::BtcNetwork;
//!
//! let client = ChainClient::new(ChainConfig::for_network(BtcNetwork::Testnet)).unwrap();
//! let unspents = client
//!     .get_addresses_unspents(&["mxxdfxLaFGePNfFJQiVkyLix3ZAjY5cKQd".to_string()])
//!     .unwrap();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod raw;
pub mod types;


pub use client::ChainClient;
pub use config::ChainConfig;
pub use error::ApiError;
pub use raw::RawTransactionClient;
pub use types::{AddressInfo, BlockInfo, SendTransactionResponse, TransactionInfo};
