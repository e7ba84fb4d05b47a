//! Send mode: pay a list of outputs from a set of keys and return the rest
//! to a change address.

use std::fmt;

use bitcoin::Transaction;
use chain_btc::transaction::{build_payment_transaction, compute_change, payments_total};
use chain_btc::{KeySet, Payment, UnspentOutput, DEFAULT_FEE};
use log::debug;

use crate::error::SdkError;
use crate::pipeline::Pipeline;
use crate::stage::Stage;
use crate::Context;

/// Inputs, outputs and options of a send.
#[derive(Clone, Default)]
pub struct TransactionRequest {
    /// WIF private keys whose unspent outputs fund the transaction.
    pub inputs: Vec<String>,
    /// Payments, kept in this order in the transaction.
    pub outputs: Vec<Payment>,
    /// Fee in satoshis. [`DEFAULT_FEE`] when unset.
    pub fee: Option<u64>,
    /// Where the change goes. The first input's address when unset.
    pub change_address: Option<String>,
}

impl TransactionRequest {
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: inputs.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn output(mut self, address: impl Into<String>, amount_sat: u64) -> Self {
        self.outputs.push(Payment::new(address, amount_sat));
        self
    }

    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = Some(fee);
        self
    }

    pub fn change_address(mut self, address: impl Into<String>) -> Self {
        self.change_address = Some(address.into());
        self
    }
}

// Keys stay out of logs.
impl fmt::Debug for TransactionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionRequest")
            .field("inputs", &format_args!("[{} keys]", self.inputs.len()))
            .field("outputs", &self.outputs)
            .field("fee", &self.fee)
            .field("change_address", &self.change_address)
            .finish()
    }
}

/// A single-use send.
///
/// Unspent outputs are looked up once, on first use. [`build`](Self::build)
/// assembles and signs the transaction and [`send`](Self::send) submits it.
pub struct ChainTransaction<'a> {
    pipeline: Pipeline<'a>,
    outputs: Vec<Payment>,
    outputs_amount: u64,
    fee: u64,
    change_address: String,
}

impl<'a> ChainTransaction<'a> {
    /// Resolve the request's keys. No network calls are made.
    pub fn new(ctx: Context<'a>, request: TransactionRequest) -> Result<Self, SdkError> {
        let TransactionRequest {
            inputs,
            outputs,
            fee,
            change_address,
        } = request;

        if inputs.is_empty() {
            return Err(SdkError::MissingInputs);
        }

        let keys = KeySet::from_wif(inputs.as_slice(), ctx.network)?;
        let outputs_amount = payments_total(&outputs)?;
        let change_address = match change_address {
            Some(address) => address,
            None => keys
                .first_address()
                .map(str::to_string)
                .ok_or(SdkError::MissingInputs)?,
        };

        debug!(
            "send from {} keys to {} outputs totalling {outputs_amount} sat",
            keys.len(),
            outputs.len()
        );

        Ok(Self {
            pipeline: Pipeline::new(ctx, keys),
            outputs,
            outputs_amount,
            fee: fee.unwrap_or(DEFAULT_FEE),
            change_address,
        })
    }

    pub fn stage(&self) -> Stage {
        self.pipeline.stage()
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    pub fn change_address(&self) -> &str {
        &self.change_address
    }

    pub fn outputs(&self) -> &[Payment] {
        &self.outputs
    }

    /// Addresses of the input keys, in input order.
    pub fn addresses(&self) -> Vec<String> {
        self.pipeline.keys().addresses()
    }

    pub fn outputs_amount(&self) -> u64 {
        self.outputs_amount
    }

    pub fn unspents(&mut self) -> Result<&[UnspentOutput], SdkError> {
        self.pipeline.unspents()
    }

    pub fn unspents_amount(&mut self) -> Result<u64, SdkError> {
        self.pipeline.unspents_amount()
    }

    /// Unspent total minus outputs and fee.
    pub fn change(&mut self) -> Result<u64, SdkError> {
        let available = self.pipeline.unspents_amount()?;
        let change = compute_change(available, self.outputs_amount, self.fee);
        self.pipeline.check(change)
    }

    /// Assemble and sign the transaction. The result is kept, so later calls
    /// return the same transaction.
    ///
    /// Funds are checked before any funding transaction is fetched.
    pub fn build(&mut self) -> Result<&Transaction, SdkError> {
        if self.pipeline.signed().is_none() {
            self.pipeline.ensure_active()?;

            let change = self.change()?;
            let inputs = self.pipeline.spendable_inputs()?;
            let unsigned = build_payment_transaction(
                &inputs,
                &self.outputs,
                self.fee,
                &self.change_address,
                self.pipeline.ctx().network,
            );
            let unsigned = self.pipeline.check(unsigned)?;

            debug!(
                "assembled {} inputs and {} outputs, change {change} sat",
                unsigned.tx.input.len(),
                unsigned.tx.output.len()
            );
            self.pipeline.sign(unsigned)?;
        }

        self.pipeline.signed().ok_or_else(|| {
            SdkError::Btc(chain_btc::BtcError::TransactionBuildError(
                "transaction has not been signed".into(),
            ))
        })
    }

    /// Hex of the signed transaction, building it first if needed.
    pub fn hex(&mut self) -> Result<String, SdkError> {
        self.build()?;
        self.pipeline.signed_hex()
    }

    /// Build, sign and submit. Returns the transaction hash assigned by the
    /// service.
    pub fn send(&mut self) -> Result<String, SdkError> {
        self.build()?;
        self.pipeline.submit()
    }
}
