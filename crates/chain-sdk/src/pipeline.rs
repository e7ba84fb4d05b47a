//! State shared by the send and sweep builders: the key set, the memoized
//! unspent lookup, the signed transaction and the lifecycle stage.

use bitcoin::Transaction;
use chain_btc::transaction::{serialize_hex, sign_transaction};
use chain_btc::utxo::total_value;
use chain_btc::{BtcError, KeySet, SpendableInput, UnsignedTransaction, UnspentOutput};
use log::{debug, info, warn};

use crate::error::SdkError;
use crate::stage::{Failure, Stage};
use crate::Context;

pub(crate) struct Pipeline<'a> {
    ctx: Context<'a>,
    keys: KeySet,
    unspents: Option<Vec<UnspentOutput>>,
    signed: Option<Transaction>,
    stage: Stage,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(ctx: Context<'a>, keys: KeySet) -> Self {
        let mut pipeline = Self {
            ctx,
            keys,
            unspents: None,
            signed: None,
            stage: Stage::Constructed,
        };
        pipeline.advance(Stage::KeysResolved);
        pipeline
    }

    pub(crate) fn ctx(&self) -> Context<'a> {
        self.ctx
    }

    pub(crate) fn keys(&self) -> &KeySet {
        &self.keys
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn signed(&self) -> Option<&Transaction> {
        self.signed.as_ref()
    }

    pub(crate) fn ensure_active(&self) -> Result<(), SdkError> {
        if self.stage.is_terminal() {
            return Err(SdkError::Terminated { stage: self.stage });
        }
        Ok(())
    }

    /// Record `err` as terminal when it is one of the builder failures.
    pub(crate) fn fail(&mut self, err: SdkError) -> SdkError {
        if self.stage.is_terminal() {
            return err;
        }
        if let Some(failure) = Failure::of(&err) {
            warn!("transaction failed at stage {}: {err}", self.stage);
            self.stage = Stage::Failed(failure);
        }
        err
    }

    pub(crate) fn check<T>(&mut self, result: Result<T, BtcError>) -> Result<T, SdkError> {
        result.map_err(|e| self.fail(e.into()))
    }

    fn advance(&mut self, next: Stage) {
        if next > self.stage {
            debug!("{} -> {}", self.stage, next);
            self.stage = next;
        }
    }

    /// Unspent outputs of every key, looked up once.
    pub(crate) fn unspents(&mut self) -> Result<&[UnspentOutput], SdkError> {
        if self.unspents.is_none() {
            self.ensure_active()?;

            if self.keys.is_empty() {
                return Err(self.fail(SdkError::MissingUnspents));
            }

            let addresses = self.keys.addresses();
            debug!("looking up unspents for {} addresses", addresses.len());
            let found = self.ctx.backend.addresses_unspents(&addresses)?;
            if found.is_empty() {
                return Err(self.fail(SdkError::MissingUnspents));
            }

            let worth = self.check(total_value(&found))?;
            info!("found {} unspent outputs worth {worth} sat", found.len());
            self.unspents = Some(found);
            self.advance(Stage::UnspentsFetched);
        }

        Ok(self.unspents.as_deref().unwrap_or_default())
    }

    pub(crate) fn unspents_amount(&mut self) -> Result<u64, SdkError> {
        let total = total_value(self.unspents()?);
        self.check(total)
    }

    /// Resolve every unspent against its funding transaction.
    pub(crate) fn spendable_inputs(&mut self) -> Result<Vec<SpendableInput>, SdkError> {
        let unspents = self.unspents()?.to_vec();
        let mut inputs = Vec::with_capacity(unspents.len());

        for unspent in &unspents {
            let txid = unspent.txid()?;
            debug!("fetching funding transaction {txid}");
            let funding = self.ctx.backend.fetch_transaction(&txid)?;
            inputs.push(SpendableInput::from_funding(unspent, &funding)?);
        }

        Ok(inputs)
    }

    /// Sign `unsigned` with the configured signer and keep the result.
    pub(crate) fn sign(&mut self, unsigned: UnsignedTransaction) -> Result<(), SdkError> {
        self.advance(Stage::Assembled);
        debug!(
            "signing {} inputs with {}",
            unsigned.tx.input.len(),
            self.ctx.signer.name()
        );

        match sign_transaction(&unsigned, &self.keys, self.ctx.signer) {
            Ok(tx) => {
                info!("signed transaction {}", tx.compute_txid());
                self.signed = Some(tx);
                self.advance(Stage::Signed);
                Ok(())
            }
            Err(e @ (BtcError::Script(_) | BtcError::SigningError(_))) => {
                Err(self.fail(SdkError::SignatureInvalid(e.to_string())))
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Hex of the signed transaction.
    pub(crate) fn signed_hex(&self) -> Result<String, SdkError> {
        self.signed.as_ref().map(serialize_hex).ok_or_else(|| {
            SdkError::Btc(BtcError::TransactionBuildError(
                "transaction has not been signed".into(),
            ))
        })
    }

    /// Submit the signed transaction, returning the hash the service assigned.
    pub(crate) fn submit(&mut self) -> Result<String, SdkError> {
        self.ensure_active()?;
        let hex = self.signed_hex()?;
        let hash = self.ctx.backend.send_transaction(&hex)?;
        info!("transaction submitted as {hash}");
        self.advance(Stage::Submitted);
        Ok(hash)
    }
}
