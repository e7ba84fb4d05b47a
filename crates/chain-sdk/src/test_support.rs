//! In-memory backend for builder tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::SecretKey;
use bitcoin::transaction::Version;
use bitcoin::{
    Amount, NetworkKind, OutPoint, PrivateKey, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid,
    Witness,
};
use chain_api::ApiError;
use chain_btc::address::parse_address;
use chain_btc::transaction::parse_hex;
use chain_btc::{BtcNetwork, KeySet, TransactionSigner, UnspentOutput};

use crate::backend::ChainBackend;
use crate::Context;

pub(crate) const WIF: &str = "cVdtEyijQXFx7bmwrBMrWVbqpg8VWXsGtrUYtZR6fNZ6r4cRnRT5";
pub(crate) const ADDRESS: &str = "mxxdfxLaFGePNfFJQiVkyLix3ZAjY5cKQd";

/// Testnet address of an unrelated key.
pub(crate) fn second_address() -> String {
    let key = PrivateKey::new(SecretKey::from_slice(&[2; 32]).unwrap(), NetworkKind::Test);
    let keys = KeySet::from_wif(&[key.to_wif()], BtcNetwork::Testnet).unwrap();
    keys.first_address().unwrap().to_string()
}

pub(crate) fn test_context<'a>(
    backend: &'a FakeBackend,
    signer: &'a dyn TransactionSigner,
) -> Context<'a> {
    Context {
        network: BtcNetwork::Testnet,
        backend,
        signer,
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    unspents: Vec<UnspentOutput>,
    transactions: HashMap<Txid, Transaction>,
    pub(crate) lookups: Cell<usize>,
    pub(crate) fetches: Cell<usize>,
    pub(crate) submitted: RefCell<Vec<String>>,
}

impl FakeBackend {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// One funding transaction per value, each paying `address` at output 0.
    pub(crate) fn funded(address: &str, values: &[u64]) -> Self {
        let script = parse_address(address, BtcNetwork::Testnet)
            .unwrap()
            .script_pubkey();
        let mut backend = Self::default();

        for (i, value) in values.iter().enumerate() {
            let funding = Transaction {
                version: Version::ONE,
                lock_time: LockTime::ZERO,
                input: vec![TxIn {
                    previous_output: OutPoint::new(Txid::from_byte_array([i as u8 + 1; 32]), 0),
                    script_sig: ScriptBuf::new(),
                    sequence: Sequence::MAX,
                    witness: Witness::default(),
                }],
                output: vec![TxOut {
                    value: Amount::from_sat(*value),
                    script_pubkey: script.clone(),
                }],
            };
            let txid = funding.compute_txid();

            backend.unspents.push(UnspentOutput {
                transaction_hash: txid.to_string(),
                output_index: 0,
                value: *value,
                addresses: vec![address.to_string()],
                script: String::new(),
                script_hex: None,
                script_type: "pubkeyhash".into(),
                required_signatures: Some(1),
                spent: false,
                confirmations: 6,
            });
            backend.transactions.insert(txid, funding);
        }

        backend
    }
}

impl ChainBackend for FakeBackend {
    fn addresses_unspents(&self, addresses: &[String]) -> Result<Vec<UnspentOutput>, ApiError> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self
            .unspents
            .iter()
            .filter(|u| addresses.contains(&u.addresses[0]))
            .cloned()
            .collect())
    }

    fn fetch_transaction(&self, txid: &Txid) -> Result<Transaction, ApiError> {
        self.fetches.set(self.fetches.get() + 1);
        self.transactions
            .get(txid)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("transaction {txid}")))
    }

    fn send_transaction(&self, hex: &str) -> Result<String, ApiError> {
        self.submitted.borrow_mut().push(hex.to_string());
        Ok(parse_hex(hex).unwrap().compute_txid().to_string())
    }
}
