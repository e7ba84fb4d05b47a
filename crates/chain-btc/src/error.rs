use thiserror::Error;

/// Bitcoin chain operation errors.
#[derive(Debug, Error)]
pub enum BtcError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("transaction build error: {0}")]
    TransactionBuildError(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("insufficient funds: have {available} sat, need {required} sat")]
    InsufficientFunds { available: u64, required: u64 },

    #[error("no private key for address {0}")]
    MissingKey(String),

    #[error("script error: {0}")]
    Script(String),
}
