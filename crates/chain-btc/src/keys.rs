use bitcoin::secp256k1::Secp256k1;
use bitcoin::{PrivateKey, PublicKey};

use crate::address::pubkey_to_p2pkh_address;
use crate::error::BtcError;
use crate::network::BtcNetwork;

/// A private key together with its derived public key and P2PKH address.
///
/// Entries are handed out by reference only. The secret is erased when the
/// entry drops, including duplicates the set discards.
#[derive(Debug)]
pub struct KeyEntry {
    address: String,
    private_key: PrivateKey,
    public_key: PublicKey,
}

impl KeyEntry {
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.private_key
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

/// Ordered mapping from derived address to private key.
///
/// Keys are unique by address and keep the order in which they were supplied,
/// so the first entry is the natural default change address.
#[derive(Debug, Default)]
pub struct KeySet {
    entries: Vec<KeyEntry>,
}

impl KeySet {
    /// Decode a sequence of WIF private keys for `network`.
    ///
    /// A key encoded for the other network is rejected. Duplicate keys
    /// collapse into a single entry.
    pub fn from_wif<S: AsRef<str>>(wifs: &[S], network: BtcNetwork) -> Result<Self, BtcError> {
        let secp = Secp256k1::signing_only();
        let mut set = KeySet::default();

        for wif in wifs {
            let private_key = PrivateKey::from_wif(wif.as_ref())
                .map_err(|e| BtcError::InvalidPrivateKey(format!("failed to decode WIF: {e}")))?;

            if private_key.network != network.kind() {
                return Err(BtcError::InvalidNetwork(format!(
                    "private key is not encoded for {network}"
                )));
            }

            let public_key = private_key.public_key(&secp);
            let address = pubkey_to_p2pkh_address(&public_key, network);
            set.insert(KeyEntry {
                address,
                private_key,
                public_key,
            });
        }

        Ok(set)
    }

    fn insert(&mut self, entry: KeyEntry) {
        if self.get(&entry.address).is_none() {
            self.entries.push(entry);
        }
    }

    /// Look up the key owning `address`.
    pub fn get(&self, address: &str) -> Option<&KeyEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    /// Addresses in insertion order.
    pub fn addresses(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.address.clone()).collect()
    }

    pub fn first_address(&self) -> Option<&str> {
        self.entries.first().map(|e| e.address.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for KeyEntry {
    fn drop(&mut self) {
        self.private_key.inner.non_secure_erase();
    }
}
