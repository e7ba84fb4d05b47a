//! Interchangeable ECDSA backends for signing transaction inputs.
//!
//! Both signers produce deterministic (RFC 6979), low-S signatures, so a
//! transaction signed by either one serializes to the same bytes.

use bitcoin::secp256k1::{ecdsa, Message, Secp256k1, SignOnly};
use bitcoin::PrivateKey;
use k256::ecdsa::signature::hazmat::PrehashSigner;

use crate::error::BtcError;
use crate::keys::KeySet;
use crate::transaction::{serialize_hex, sign_transaction, UnsignedTransaction};

/// Capability to sign and serialize a transaction.
///
/// Implementors only provide the digest signature; sighash computation,
/// script construction and verification are shared.
pub trait TransactionSigner {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Sign a 32-byte sighash digest with `key`.
    fn sign_digest(&self, digest: [u8; 32], key: &PrivateKey) -> Result<ecdsa::Signature, BtcError>;

    /// Sign every input of `unsigned` and return the consensus-encoded hex.
    fn sign_and_serialize(
        &self,
        unsigned: &UnsignedTransaction,
        keys: &KeySet,
    ) -> Result<String, BtcError> {
        let signed = sign_transaction(unsigned, keys, self)?;
        Ok(serialize_hex(&signed))
    }
}

/// Signer backed by libsecp256k1 through the `bitcoin` crate bindings.
#[derive(Debug, Clone)]
pub struct Secp256k1Signer {
    secp: Secp256k1<SignOnly>,
}

impl Secp256k1Signer {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::signing_only(),
        }
    }
}

impl Default for Secp256k1Signer {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionSigner for Secp256k1Signer {
    fn name(&self) -> &'static str {
        "secp256k1"
    }

    fn sign_digest(&self, digest: [u8; 32], key: &PrivateKey) -> Result<ecdsa::Signature, BtcError> {
        let msg = Message::from_digest(digest);
        Ok(self.secp.sign_ecdsa(&msg, &key.inner))
    }
}

/// Pure-Rust signer backed by the RustCrypto `k256` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct K256Signer;

impl TransactionSigner for K256Signer {
    fn name(&self) -> &'static str {
        "k256"
    }

    fn sign_digest(&self, digest: [u8; 32], key: &PrivateKey) -> Result<ecdsa::Signature, BtcError> {
        let signing_key = k256::ecdsa::SigningKey::from_slice(&key.inner.secret_bytes())
            .map_err(|e| BtcError::InvalidPrivateKey(format!("k256 rejected key: {e}")))?;

        let signature: k256::ecdsa::Signature = signing_key
            .sign_prehash(&digest)
            .map_err(|e| BtcError::SigningError(format!("k256 signing failed: {e}")))?;

        // Consensus policy only accepts low-S signatures.
        let signature = signature.normalize_s().unwrap_or(signature);

        ecdsa::Signature::from_compact(&signature.to_bytes())
            .map_err(|e| BtcError::SigningError(format!("invalid compact signature: {e}")))
    }
}
