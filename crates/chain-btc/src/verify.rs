use std::collections::HashSet;

use bitcoin::hashes::Hash;
use bitcoin::script::Instruction;
use bitcoin::secp256k1::{Message, Secp256k1};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::{ecdsa, PublicKey, ScriptBuf, Transaction, TxOut};

use crate::error::BtcError;
use crate::transaction::sum_sat;

/// Verify a signed P2PKH input against the output it spends.
///
/// The signature script must be exactly `<sig+hashtype> <pubkey>`, the
/// public key must hash to the previous output script, and the signature
/// must commit to the transaction with SIGHASH_ALL.
pub fn verify_input(tx: &Transaction, index: usize, prevout: &TxOut) -> Result<(), BtcError> {
    let input = tx
        .input
        .get(index)
        .ok_or_else(|| BtcError::Script(format!("input {index} does not exist")))?;

    let mut pushes = Vec::with_capacity(2);
    for instruction in input.script_sig.instructions() {
        match instruction.map_err(|e| BtcError::Script(format!("input {index}: {e}")))? {
            Instruction::PushBytes(bytes) => pushes.push(bytes.as_bytes()),
            Instruction::Op(op) => {
                return Err(BtcError::Script(format!(
                    "input {index}: unexpected {op} in signature script"
                )))
            }
        }
    }

    let [sig_bytes, key_bytes] = pushes.as_slice() else {
        return Err(BtcError::Script(format!(
            "input {index}: expected 2 pushes in signature script, found {}",
            pushes.len()
        )));
    };

    let signature = ecdsa::Signature::from_slice(sig_bytes)
        .map_err(|e| BtcError::Script(format!("input {index}: malformed signature: {e}")))?;
    if signature.sighash_type != EcdsaSighashType::All {
        return Err(BtcError::Script(format!(
            "input {index}: expected SIGHASH_ALL, found {}",
            signature.sighash_type
        )));
    }

    let public_key = PublicKey::from_slice(key_bytes)
        .map_err(|e| BtcError::InvalidPublicKey(format!("input {index}: {e}")))?;
    if prevout.script_pubkey != ScriptBuf::new_p2pkh(&public_key.pubkey_hash()) {
        return Err(BtcError::Script(format!(
            "input {index}: public key does not match previous output script"
        )));
    }

    let sighash = SighashCache::new(tx)
        .legacy_signature_hash(index, &prevout.script_pubkey, EcdsaSighashType::All.to_u32())
        .map_err(|e| BtcError::Script(format!("input {index}: {e}")))?;
    let message = Message::from_digest(sighash.to_byte_array());

    Secp256k1::verification_only()
        .verify_ecdsa(&message, &signature.signature, &public_key.inner)
        .map_err(|e| BtcError::Script(format!("input {index}: signature verification failed: {e}")))
}

/// Check that a fully signed transaction is internally consistent and that
/// every input verifies. Returns the implied fee.
pub fn verify_transaction(tx: &Transaction, prevouts: &[TxOut]) -> Result<u64, BtcError> {
    if tx.input.is_empty() {
        return Err(BtcError::TransactionBuildError("transaction has no inputs".into()));
    }
    if tx.output.is_empty() {
        return Err(BtcError::TransactionBuildError("transaction has no outputs".into()));
    }
    if tx.input.len() != prevouts.len() {
        return Err(BtcError::TransactionBuildError(format!(
            "{} inputs but {} previous outputs",
            tx.input.len(),
            prevouts.len()
        )));
    }

    let mut seen = HashSet::with_capacity(tx.input.len());
    for input in &tx.input {
        if !seen.insert(input.previous_output) {
            return Err(BtcError::Script(format!(
                "outpoint {} is spent twice",
                input.previous_output
            )));
        }
    }

    if let Some(index) = tx.output.iter().position(|o| o.value.to_sat() == 0) {
        return Err(BtcError::TransactionBuildError(format!("output {index} has zero value")));
    }

    let input_total = sum_sat(prevouts.iter().map(|p| p.value.to_sat()))?;
    let output_total = sum_sat(tx.output.iter().map(|o| o.value.to_sat()))?;
    if output_total > input_total {
        return Err(BtcError::InsufficientFunds {
            available: input_total,
            required: output_total,
        });
    }

    for (index, prevout) in prevouts.iter().enumerate() {
        verify_input(tx, index, prevout)?;
    }

    Ok(input_total - output_total)
}
