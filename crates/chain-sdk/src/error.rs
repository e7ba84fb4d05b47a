use chain_api::ApiError;
use chain_btc::BtcError;
use thiserror::Error;

use crate::stage::Stage;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("no private keys supplied")]
    MissingInputs,

    #[error("no unspent outputs for the supplied keys")]
    MissingUnspents,

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("BTC: {0}")]
    Btc(BtcError),

    #[error("Chain API: {0}")]
    Api(#[from] ApiError),

    #[error("transaction already terminated at stage {stage}")]
    Terminated { stage: Stage },
}

impl From<BtcError> for SdkError {
    fn from(e: BtcError) -> Self {
        match e {
            BtcError::InsufficientFunds {
                available,
                required,
            } => SdkError::InsufficientFunds {
                available,
                required,
            },
            other => SdkError::Btc(other),
        }
    }
}
