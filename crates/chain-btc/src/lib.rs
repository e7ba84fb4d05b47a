//! Bitcoin transaction support for the Chain SDK.
//!
//! Provides WIF key resolution, legacy P2PKH addresses, fee and change
//! accounting, transaction assembly, and signing with interchangeable ECDSA
//! backends. Nothing in this crate performs I/O.

pub mod address;
pub mod error;
pub mod keys;
pub mod network;
pub mod signer;
pub mod transaction;
pub mod utxo;
pub mod verify;

pub use error::BtcError;
pub use keys::KeySet;
pub use network::BtcNetwork;
pub use signer::{K256Signer, Secp256k1Signer, TransactionSigner};
pub use transaction::{Payment, SpendableInput, UnsignedTransaction, DEFAULT_FEE};
pub use utxo::UnspentOutput;
