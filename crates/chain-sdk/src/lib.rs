//! # chain-sdk
//!
//! Builds, signs and submits Bitcoin transactions funded by the unspent
//! outputs of a set of WIF keys, looked up through the Chain API.
//!
//! Two modes are available:
//!
//! - [`ChainTransaction`] pays a list of outputs and returns the change.
//! - [`Sweeper`] moves everything, less the fee, to one address.
//!
//! ```no_run
//! use chain_api::ChainConfig;
//! use chain_btc::BtcNetwork;
//! use chain_sdk::{ChainSdk, TransactionRequest};
//!
//! let sdk = ChainSdk::new(ChainConfig::for_network(BtcNetwork::Testnet)).unwrap();
//! let request = TransactionRequest::new(["cVdtEyijQXFx7bmwrBMrWVbqpg8VWXsGtrUYtZR6fNZ6r4cRnRT5"])
//!     .output("mxxdfxLaFGePNfFJQiVkyLix3ZAjY5cKQd", 10_000);
//! let hash = sdk.transaction(request).unwrap().send().unwrap();
//! ```

pub mod backend;
pub mod error;
mod pipeline;
pub mod stage;
pub mod sweeper;
pub mod transaction;

#[cfg(test)]
mod test_support;

use chain_api::ChainConfig;
use chain_btc::{BtcNetwork, Secp256k1Signer, TransactionSigner};

pub use backend::{ChainBackend, HttpBackend};
pub use error::SdkError;
pub use stage::{Failure, Stage};
pub use sweeper::{SweepOptions, Sweeper};
pub use transaction::{ChainTransaction, TransactionRequest};

// ─── Composition ─────────────────────────────────────────────────────

/// Collaborators a builder borrows for its lifetime.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub network: BtcNetwork,
    pub backend: &'a dyn ChainBackend,
    pub signer: &'a dyn TransactionSigner,
}

/// Client handle owning the backend and signer shared by its builders.
pub struct ChainSdk {
    network: BtcNetwork,
    backend: Box<dyn ChainBackend>,
    signer: Box<dyn TransactionSigner>,
}

impl ChainSdk {
    /// HTTP backend for `config`, signing with libsecp256k1.
    pub fn new(config: ChainConfig) -> Result<Self, SdkError> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::from_parts(config.network, backend, Secp256k1Signer::new()))
    }

    pub fn from_parts(
        network: BtcNetwork,
        backend: impl ChainBackend + 'static,
        signer: impl TransactionSigner + 'static,
    ) -> Self {
        Self {
            network,
            backend: Box::new(backend),
            signer: Box::new(signer),
        }
    }

    /// Replace the signer, e.g. with [`chain_btc::K256Signer`].
    pub fn with_signer(mut self, signer: impl TransactionSigner + 'static) -> Self {
        self.signer = Box::new(signer);
        self
    }

    pub fn network(&self) -> BtcNetwork {
        self.network
    }

    pub fn signer_name(&self) -> &'static str {
        self.signer.name()
    }

    pub fn context(&self) -> Context<'_> {
        Context {
            network: self.network,
            backend: self.backend.as_ref(),
            signer: self.signer.as_ref(),
        }
    }

    // ─── Builders ────────────────────────────────────────────────────

    /// Start a send. Keys are resolved now, nothing is fetched yet.
    pub fn transaction(&self, request: TransactionRequest) -> Result<ChainTransaction<'_>, SdkError> {
        ChainTransaction::new(self.context(), request)
    }

    /// Start a sweep of `keys` to `destination`.
    pub fn sweeper<S: AsRef<str>>(
        &self,
        keys: &[S],
        destination: impl Into<String>,
        options: SweepOptions,
    ) -> Result<Sweeper<'_>, SdkError> {
        Sweeper::new(self.context(), keys, destination, options)
    }
}
