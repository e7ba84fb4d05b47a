//! Cross-crate integration tests exercising the full pipeline:
//! keys -> unspent lookup -> funding fetch -> assemble -> sign -> submit.
//!
//! These tests use only the public API of chain_sdk, chain_api and
//! chain_btc to catch regressions at crate boundaries.

use std::cell::{Cell, RefCell};

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Txid, Witness};
use chain_api::{ApiError, ChainConfig};
use chain_btc::address::parse_address;
use chain_btc::transaction::parse_hex;
use chain_btc::verify::verify_transaction;
use chain_btc::{BtcNetwork, K256Signer, Secp256k1Signer, UnspentOutput};
use chain_sdk::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const WIF: &str = "cVdtEyijQXFx7bmwrBMrWVbqpg8VWXsGtrUYtZR6fNZ6r4cRnRT5";
const ADDRESS: &str = "mxxdfxLaFGePNfFJQiVkyLix3ZAjY5cKQd";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn funding_tx(address: &str, value: u64, salt: u8) -> Transaction {
    let script = parse_address(address, BtcNetwork::Testnet)
        .unwrap()
        .script_pubkey();
    Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: vec![TxIn {
            previous_output: OutPoint::new(Txid::from_byte_array([salt; 32]), 0),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        }],
        output: vec![TxOut {
            value: Amount::from_sat(value),
            script_pubkey: script,
        }],
    }
}

fn unspent_json(funding: &Transaction, address: &str) -> serde_json::Value {
    serde_json::json!({
        "transaction_hash": funding.compute_txid().to_string(),
        "output_index": 0,
        "value": funding.output[0].value.to_sat(),
        "addresses": [address],
        "script": "OP_DUP OP_HASH160 OP_EQUALVERIFY OP_CHECKSIG",
        "script_hex": funding.output[0].script_pubkey.to_hex_string(),
        "script_type": "pubkeyhash",
        "required_signatures": 1,
        "spent": false,
        "confirmations": 3
    })
}

/// Backend holding a fixed set of funding transactions and recording calls.
struct MemoryBackend {
    funding: Vec<Transaction>,
    lookups: Cell<usize>,
    fetches: Cell<usize>,
    submitted: RefCell<Vec<String>>,
}

impl MemoryBackend {
    fn new(values: &[u64]) -> Self {
        Self {
            funding: values
                .iter()
                .enumerate()
                .map(|(i, v)| funding_tx(ADDRESS, *v, i as u8 + 1))
                .collect(),
            lookups: Cell::new(0),
            fetches: Cell::new(0),
            submitted: RefCell::new(Vec::new()),
        }
    }
}

impl ChainBackend for MemoryBackend {
    fn addresses_unspents(&self, _addresses: &[String]) -> Result<Vec<UnspentOutput>, ApiError> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self
            .funding
            .iter()
            .map(|tx| serde_json::from_value(unspent_json(tx, ADDRESS)).unwrap())
            .collect())
    }

    fn fetch_transaction(&self, txid: &Txid) -> Result<Transaction, ApiError> {
        self.fetches.set(self.fetches.get() + 1);
        self.funding
            .iter()
            .find(|tx| tx.compute_txid() == *txid)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(txid.to_string()))
    }

    fn send_transaction(&self, hex: &str) -> Result<String, ApiError> {
        self.submitted.borrow_mut().push(hex.to_string());
        Ok("12345".into())
    }
}

fn context<'a>(backend: &'a MemoryBackend, signer: &'a dyn chain_btc::TransactionSigner) -> Context<'a> {
    Context {
        network: BtcNetwork::Testnet,
        backend,
        signer,
    }
}

// ─── Send: keys -> unspents -> change -> sign -> submit ────────────

#[test]
fn send_full_pipeline_with_change() {
    init_logging();
    let backend = MemoryBackend::new(&[90_000]);
    let signer = Secp256k1Signer::new();

    let mut txn = ChainTransaction::new(
        context(&backend, &signer),
        TransactionRequest::new([WIF])
            .output(ADDRESS, 100)
            .output(ADDRESS, 100)
            .fee(0),
    )
    .unwrap();

    // 1. Change accounts for unspents, outputs and fee
    assert_eq!(txn.unspents_amount().unwrap(), 90_000);
    assert_eq!(txn.outputs_amount(), 200);
    assert_eq!(txn.change().unwrap(), 89_800);

    // 2. Submit
    assert_eq!(txn.send().unwrap(), "12345");
    assert_eq!(txn.stage(), Stage::Submitted);

    // 3. The submitted hex is a fully signed, consistent transaction
    let submitted = backend.submitted.borrow();
    let tx = parse_hex(&submitted[0]).unwrap();
    let values: Vec<u64> = tx.output.iter().map(|o| o.value.to_sat()).collect();
    assert_eq!(values, vec![100, 100, 89_800]);

    let prevouts = vec![backend.funding[0].output[0].clone()];
    assert_eq!(verify_transaction(&tx, &prevouts).unwrap(), 0);
    assert_eq!(backend.lookups.get(), 1);
}

#[test]
fn send_insufficient_funds_makes_no_fetch_or_submit() {
    init_logging();
    let backend = MemoryBackend::new(&[90_000]);
    let signer = Secp256k1Signer::new();

    let mut txn = ChainTransaction::new(
        context(&backend, &signer),
        TransactionRequest::new([WIF]).output(ADDRESS, 180_000),
    )
    .unwrap();

    assert!(matches!(txn.send(), Err(SdkError::InsufficientFunds { .. })));
    assert_eq!(backend.fetches.get(), 0);
    assert!(backend.submitted.borrow().is_empty());
    assert_eq!(txn.stage(), Stage::Failed(Failure::InsufficientFunds));
}

#[test]
fn send_without_keys_makes_no_calls() {
    let backend = MemoryBackend::new(&[90_000]);
    let signer = Secp256k1Signer::new();

    let result = ChainTransaction::new(
        context(&backend, &signer),
        TransactionRequest::new(Vec::<String>::new()),
    );

    assert!(matches!(result, Err(SdkError::MissingInputs)));
    assert_eq!(backend.lookups.get(), 0);
}

// ─── Sweep: keys -> unspents -> single output -> submit ────────────

#[test]
fn sweep_full_pipeline_default_fee() {
    init_logging();
    let backend = MemoryBackend::new(&[90_000]);
    let signer = K256Signer;

    let mut sweeper = Sweeper::new(
        context(&backend, &signer),
        &[WIF],
        ADDRESS,
        SweepOptions::default(),
    )
    .unwrap();

    assert_eq!(sweeper.sweep().unwrap(), "12345");
    assert_eq!(sweeper.amount().unwrap(), 80_000);

    let submitted = backend.submitted.borrow();
    let tx = parse_hex(&submitted[0]).unwrap();
    assert_eq!(tx.output.len(), 1);
    assert_eq!(tx.output[0].value.to_sat(), 80_000);
}

#[test]
fn signers_agree_across_the_pipeline() {
    let backend = MemoryBackend::new(&[60_000, 30_000]);
    let secp = Secp256k1Signer::new();
    let k256 = K256Signer;

    let mut a = Sweeper::new(context(&backend, &secp), &[WIF], ADDRESS, SweepOptions::default()).unwrap();
    let mut b = Sweeper::new(context(&backend, &k256), &[WIF], ADDRESS, SweepOptions::default()).unwrap();

    assert_eq!(a.hex().unwrap(), b.hex().unwrap());
}

// ─── HTTP: the same sweep against a mock Chain API ─────────────────

#[tokio::test]
async fn sweep_over_http() {
    init_logging();
    let server = MockServer::start().await;
    let funding = funding_tx(ADDRESS, 90_000, 7);
    let txid = funding.compute_txid();

    Mock::given(method("GET"))
        .and(path(format!("/v2/testnet3/addresses/{ADDRESS}/unspents")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([unspent_json(&funding, ADDRESS)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/tx/{txid}.bin")))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(bitcoin::consensus::serialize(&funding)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/v2/testnet3/transactions"))
        .and(|req: &Request| {
            let body: serde_json::Value = match serde_json::from_slice(&req.body) {
                Ok(body) => body,
                Err(_) => return false,
            };
            body["hex"].as_str().is_some_and(|hex| hex.starts_with("0100000001"))
        })
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"transaction_hash": 12345})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = ChainConfig {
        network: BtcNetwork::Testnet,
        base_url: server.uri(),
        raw_tx_url: Some(server.uri()),
        retry_delay_ms: 1,
        ..ChainConfig::default()
    };

    let (hash, amount) = tokio::task::spawn_blocking(move || {
        let sdk = ChainSdk::new(config).unwrap();
        let mut sweeper = sdk.sweeper(&[WIF], ADDRESS, SweepOptions::default()).unwrap();
        let hash = sweeper.sweep().unwrap();
        (hash, sweeper.amount().unwrap())
    })
    .await
    .unwrap();

    assert_eq!(hash, "12345");
    assert_eq!(amount, 80_000);
}

#[tokio::test]
async fn missing_funding_transaction_is_not_submitted() {
    let server = MockServer::start().await;
    let funding = funding_tx(ADDRESS, 90_000, 8);

    Mock::given(method("GET"))
        .and(path(format!("/v2/testnet3/addresses/{ADDRESS}/unspents")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([unspent_json(&funding, ADDRESS)])),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/tx/{}.bin", funding.compute_txid())))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ChainConfig {
        network: BtcNetwork::Testnet,
        base_url: server.uri(),
        raw_tx_url: Some(server.uri()),
        ..ChainConfig::default()
    };

    let result = tokio::task::spawn_blocking(move || {
        let sdk = ChainSdk::new(config).unwrap();
        let mut txn = sdk
            .transaction(TransactionRequest::new([WIF]).output(ADDRESS, 1_000))
            .unwrap();
        txn.send().map_err(|e| e.to_string())
    })
    .await
    .unwrap();

    let err = result.unwrap_err();
    assert!(err.starts_with("Chain API: not found"), "{err}");
}

#[tokio::test]
async fn unfunded_address_over_http_is_missing_unspents() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/v2/testnet3/addresses/{ADDRESS}/unspents")))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ChainConfig {
        network: BtcNetwork::Testnet,
        base_url: server.uri(),
        raw_tx_url: Some(server.uri()),
        ..ChainConfig::default()
    };

    let (result, stage) = tokio::task::spawn_blocking(move || {
        let sdk = ChainSdk::new(config).unwrap();
        let mut txn = sdk
            .transaction(TransactionRequest::new([WIF]).output(ADDRESS, 1_000))
            .unwrap();
        let result = txn.send().map(|_| ());
        (result.map_err(|e| e.to_string()), txn.stage())
    })
    .await
    .unwrap();

    assert_eq!(result, Err(SdkError::MissingUnspents.to_string()));
    assert_eq!(stage, Stage::Failed(Failure::UnspentsMissing));
}
