use bitcoin::absolute::LockTime;
use bitcoin::consensus::encode;
use bitcoin::hashes::Hash;
use bitcoin::script::PushBytesBuf;
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{ecdsa, Amount, OutPoint, ScriptBuf, Sequence, Transaction, TxIn, TxOut, Witness};

use crate::address::parse_address;
use crate::error::BtcError;
use crate::keys::KeySet;
use crate::network::BtcNetwork;
use crate::signer::TransactionSigner;
use crate::utxo::UnspentOutput;
use crate::verify::{verify_input, verify_transaction};

/// Fee in satoshis used when the caller does not choose one.
pub const DEFAULT_FEE: u64 = 10_000;

/// A requested payment: `amount_sat` to `address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payment {
    pub address: String,
    pub amount_sat: u64,
}

impl Payment {
    pub fn new(address: impl Into<String>, amount_sat: u64) -> Self {
        Self {
            address: address.into(),
            amount_sat,
        }
    }
}

/// A previous output resolved from its funding transaction, ready to be
/// spent by the key owning `owner`.
#[derive(Debug, Clone)]
pub struct SpendableInput {
    pub outpoint: OutPoint,
    pub prevout: TxOut,
    pub owner: String,
}

impl SpendableInput {
    /// Resolve `unspent` against the transaction that created it.
    ///
    /// The funding transaction must hash to the unspent's transaction hash and
    /// its output must carry the reported value.
    pub fn from_funding(unspent: &UnspentOutput, funding: &Transaction) -> Result<Self, BtcError> {
        let outpoint = unspent.outpoint()?;

        if unspent.spent {
            return Err(BtcError::Script(format!("output {outpoint} is already spent")));
        }

        let funding_txid = funding.compute_txid();
        if funding_txid != outpoint.txid {
            return Err(BtcError::TransactionBuildError(format!(
                "fetched transaction {funding_txid} does not match {}",
                outpoint.txid
            )));
        }

        let prevout = funding
            .output
            .get(outpoint.vout as usize)
            .cloned()
            .ok_or_else(|| {
                BtcError::TransactionBuildError(format!(
                    "transaction {} has no output {}",
                    outpoint.txid, outpoint.vout
                ))
            })?;

        if prevout.value.to_sat() != unspent.value {
            return Err(BtcError::TransactionBuildError(format!(
                "output {outpoint} holds {} sat, unspent reports {} sat",
                prevout.value.to_sat(),
                unspent.value
            )));
        }

        if let Some(script) = unspent.script_pubkey()? {
            if script != prevout.script_pubkey {
                return Err(BtcError::TransactionBuildError(format!(
                    "output {outpoint} script does not match the reported script"
                )));
            }
        }

        Ok(Self {
            outpoint,
            prevout,
            owner: unspent.owner()?.to_string(),
        })
    }
}

/// A Bitcoin transaction whose inputs have empty signature scripts.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    pub tx: Transaction,
    /// The outputs being spent, in input order. Needed for sighashes.
    pub prevouts: Vec<TxOut>,
    /// Address owning each input, in input order.
    pub owners: Vec<String>,
}

impl UnsignedTransaction {
    pub fn input_total(&self) -> Result<u64, BtcError> {
        sum_sat(self.prevouts.iter().map(|p| p.value.to_sat()))
    }

    pub fn output_total(&self) -> Result<u64, BtcError> {
        sum_sat(self.tx.output.iter().map(|o| o.value.to_sat()))
    }

    /// Inputs minus outputs. Fails when the outputs exceed the inputs.
    pub fn fee(&self) -> Result<u64, BtcError> {
        let available = self.input_total()?;
        let required = self.output_total()?;
        available
            .checked_sub(required)
            .ok_or(BtcError::InsufficientFunds {
                available,
                required,
            })
    }
}

/// Sum of satoshi amounts, failing instead of wrapping.
pub(crate) fn sum_sat<I: IntoIterator<Item = u64>>(values: I) -> Result<u64, BtcError> {
    values.into_iter().try_fold(0u64, |acc, v| {
        acc.checked_add(v)
            .ok_or_else(|| BtcError::TransactionBuildError("amount total overflows".into()))
    })
}

/// Sum of the requested payments. Every payment must carry a non-zero amount.
pub fn payments_total(payments: &[Payment]) -> Result<u64, BtcError> {
    if let Some(p) = payments.iter().find(|p| p.amount_sat == 0) {
        return Err(BtcError::TransactionBuildError(format!(
            "payment to {} has zero amount",
            p.address
        )));
    }
    sum_sat(payments.iter().map(|p| p.amount_sat))
}

/// Change left after paying `output_total` and `fee` out of `unspent_total`.
///
/// Fails when the outputs alone, or the outputs plus the fee, exceed the
/// available funds.
pub fn compute_change(unspent_total: u64, output_total: u64, fee: u64) -> Result<u64, BtcError> {
    if output_total > unspent_total {
        return Err(BtcError::InsufficientFunds {
            available: unspent_total,
            required: output_total,
        });
    }

    let required = output_total.saturating_add(fee);
    unspent_total
        .checked_sub(required)
        .ok_or(BtcError::InsufficientFunds {
            available: unspent_total,
            required,
        })
}

/// Amount a sweep sends to its destination: everything minus the fee.
pub fn sweep_amount(unspent_total: u64, fee: u64) -> Result<u64, BtcError> {
    if unspent_total <= fee {
        return Err(BtcError::InsufficientFunds {
            available: unspent_total,
            required: fee.saturating_add(1),
        });
    }
    Ok(unspent_total - fee)
}

fn inputs_total(inputs: &[SpendableInput]) -> Result<u64, BtcError> {
    sum_sat(inputs.iter().map(|i| i.prevout.value.to_sat()))
}

fn output_to(address: &str, amount_sat: u64, network: BtcNetwork) -> Result<TxOut, BtcError> {
    Ok(TxOut {
        value: Amount::from_sat(amount_sat),
        script_pubkey: parse_address(address, network)?.script_pubkey(),
    })
}

fn assemble(inputs: &[SpendableInput], outputs: Vec<TxOut>) -> UnsignedTransaction {
    let tx = Transaction {
        version: Version::ONE,
        lock_time: LockTime::ZERO,
        input: inputs
            .iter()
            .map(|i| TxIn {
                previous_output: i.outpoint,
                script_sig: ScriptBuf::new(),
                sequence: Sequence::MAX,
                witness: Witness::default(),
            })
            .collect(),
        output: outputs,
    };

    UnsignedTransaction {
        tx,
        prevouts: inputs.iter().map(|i| i.prevout.clone()).collect(),
        owners: inputs.iter().map(|i| i.owner.clone()).collect(),
    }
}

/// Build an unsigned transaction paying each of `payments` in order.
///
/// One extra output returns the change to `change_address` when the change
/// is greater than zero.
pub fn build_payment_transaction(
    inputs: &[SpendableInput],
    payments: &[Payment],
    fee: u64,
    change_address: &str,
    network: BtcNetwork,
) -> Result<UnsignedTransaction, BtcError> {
    let change = compute_change(inputs_total(inputs)?, payments_total(payments)?, fee)?;

    let mut outputs = Vec::with_capacity(payments.len() + 1);
    for payment in payments {
        outputs.push(output_to(&payment.address, payment.amount_sat, network)?);
    }
    if change > 0 {
        outputs.push(output_to(change_address, change, network)?);
    }

    Ok(assemble(inputs, outputs))
}

/// Build an unsigned transaction moving every input, less `fee`, to a single
/// output at `destination`.
pub fn build_sweep_transaction(
    inputs: &[SpendableInput],
    destination: &str,
    fee: u64,
    network: BtcNetwork,
) -> Result<UnsignedTransaction, BtcError> {
    let amount = sweep_amount(inputs_total(inputs)?, fee)?;
    let output = output_to(destination, amount, network)?;
    Ok(assemble(inputs, vec![output]))
}

/// Sign every input of `unsigned` with the key owning it.
///
/// Each input is verified right after it is signed and the whole transaction
/// is checked for consistency before it is returned.
pub fn sign_transaction<S: TransactionSigner + ?Sized>(
    unsigned: &UnsignedTransaction,
    keys: &KeySet,
    signer: &S,
) -> Result<Transaction, BtcError> {
    if unsigned.prevouts.len() != unsigned.tx.input.len()
        || unsigned.owners.len() != unsigned.tx.input.len()
    {
        return Err(BtcError::TransactionBuildError(
            "previous outputs do not line up with inputs".into(),
        ));
    }

    let cache = SighashCache::new(&unsigned.tx);
    let mut signed = unsigned.tx.clone();

    for (index, (prevout, owner)) in unsigned.prevouts.iter().zip(&unsigned.owners).enumerate() {
        if !unsigned.tx.input[index].script_sig.is_empty() {
            return Err(BtcError::Script(format!("input {index} is already signed")));
        }

        let entry = keys
            .get(owner)
            .ok_or_else(|| BtcError::MissingKey(owner.clone()))?;

        if prevout.script_pubkey != ScriptBuf::new_p2pkh(&entry.public_key().pubkey_hash()) {
            return Err(BtcError::Script(format!(
                "input {index} is not a pay-to-pubkey-hash output of {owner}"
            )));
        }

        let sighash = cache
            .legacy_signature_hash(index, &prevout.script_pubkey, EcdsaSighashType::All.to_u32())
            .map_err(|e| BtcError::SigningError(format!("sighash computation failed: {e}")))?;

        let signature = ecdsa::Signature {
            signature: signer.sign_digest(sighash.to_byte_array(), entry.private_key())?,
            sighash_type: EcdsaSighashType::All,
        };
        let push = PushBytesBuf::try_from(signature.to_vec())
            .map_err(|e| BtcError::SigningError(format!("signature too large to push: {e}")))?;

        signed.input[index].script_sig = ScriptBuf::builder()
            .push_slice(push)
            .push_key(entry.public_key())
            .into_script();

        verify_input(&signed, index, prevout)?;
    }

    verify_transaction(&signed, &unsigned.prevouts)?;
    Ok(signed)
}

/// Consensus-encode `tx` as lowercase hex.
pub fn serialize_hex(tx: &Transaction) -> String {
    encode::serialize_hex(tx)
}

/// Decode a consensus-encoded transaction from hex.
pub fn parse_hex(raw: &str) -> Result<Transaction, BtcError> {
    let bytes = hex::decode(raw.trim())
        .map_err(|e| BtcError::TransactionBuildError(format!("invalid transaction hex: {e}")))?;
    encode::deserialize(&bytes)
        .map_err(|e| BtcError::TransactionBuildError(format!("invalid transaction: {e}")))
}
