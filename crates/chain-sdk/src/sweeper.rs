//! Sweep mode: move everything a set of keys controls, less the fee, to one
//! address.

use bitcoin::Transaction;
use chain_btc::transaction::{build_sweep_transaction, sweep_amount};
use chain_btc::{BtcError, KeySet, DEFAULT_FEE};
use log::debug;

use crate::error::SdkError;
use crate::pipeline::Pipeline;
use crate::stage::Stage;
use crate::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOptions {
    /// Fee in satoshis taken out of the swept total.
    pub fee: u64,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self { fee: DEFAULT_FEE }
    }
}

/// A single-use sweep of every unspent output owned by a set of keys.
pub struct Sweeper<'a> {
    pipeline: Pipeline<'a>,
    destination: String,
    fee: u64,
}

impl<'a> Sweeper<'a> {
    /// Resolve `keys`. With no keys there is nothing to sweep, so an empty
    /// list fails with [`SdkError::MissingUnspents`] before any lookup.
    pub fn new<S: AsRef<str>>(
        ctx: Context<'a>,
        keys: &[S],
        destination: impl Into<String>,
        options: SweepOptions,
    ) -> Result<Self, SdkError> {
        if keys.is_empty() {
            return Err(SdkError::MissingUnspents);
        }

        let keys = KeySet::from_wif(keys, ctx.network)?;
        let destination = destination.into();
        debug!("sweep of {} keys to {destination}", keys.len());

        Ok(Self {
            pipeline: Pipeline::new(ctx, keys),
            destination,
            fee: options.fee,
        })
    }

    pub fn stage(&self) -> Stage {
        self.pipeline.stage()
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn fee(&self) -> u64 {
        self.fee
    }

    /// Amount paid to the destination: the unspent total minus the fee.
    pub fn amount(&mut self) -> Result<u64, SdkError> {
        let available = self.pipeline.unspents_amount()?;
        let amount = sweep_amount(available, self.fee);
        self.pipeline.check(amount)
    }

    /// Assemble and sign the sweep transaction, once.
    pub fn build(&mut self) -> Result<&Transaction, SdkError> {
        if self.pipeline.signed().is_none() {
            self.pipeline.ensure_active()?;

            let amount = self.amount()?;
            let inputs = self.pipeline.spendable_inputs()?;
            let unsigned = build_sweep_transaction(
                &inputs,
                &self.destination,
                self.fee,
                self.pipeline.ctx().network,
            );
            let unsigned = self.pipeline.check(unsigned)?;

            debug!(
                "assembled sweep of {} inputs, {amount} sat to {}",
                unsigned.tx.input.len(),
                self.destination
            );
            self.pipeline.sign(unsigned)?;
        }

        self.pipeline.signed().ok_or_else(|| {
            SdkError::Btc(BtcError::TransactionBuildError(
                "transaction has not been signed".into(),
            ))
        })
    }

    pub fn hex(&mut self) -> Result<String, SdkError> {
        self.build()?;
        self.pipeline.signed_hex()
    }

    /// Build, sign and submit the sweep. Returns the transaction hash
    /// assigned by the service.
    pub fn sweep(&mut self) -> Result<String, SdkError> {
        self.build()?;
        self.pipeline.submit()
    }
}
