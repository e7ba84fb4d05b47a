//! Lifecycle of a single-use transaction builder.
//!
//! ```text
//! Constructed -> KeysResolved -> UnspentsFetched -> Assembled -> Signed -> Submitted
//! ```
//!
//! Any stage may instead end in `Failed`. `Failed` and `Submitted` are
//! terminal.

use std::fmt;

use crate::error::SdkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Failure {
    InputsMissing,
    UnspentsMissing,
    InsufficientFunds,
    SignatureInvalid,
}

impl Failure {
    /// The terminal failure `err` puts a builder into, if any.
    ///
    /// Transport and decoding errors are not terminal; the step that raised
    /// them may be retried.
    pub fn of(err: &SdkError) -> Option<Self> {
        match err {
            SdkError::MissingInputs => Some(Failure::InputsMissing),
            SdkError::MissingUnspents => Some(Failure::UnspentsMissing),
            SdkError::InsufficientFunds { .. } => Some(Failure::InsufficientFunds),
            SdkError::SignatureInvalid(_) => Some(Failure::SignatureInvalid),
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Failure::InputsMissing => "inputs missing",
            Failure::UnspentsMissing => "unspents missing",
            Failure::InsufficientFunds => "insufficient funds",
            Failure::SignatureInvalid => "signature invalid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Constructed,
    KeysResolved,
    UnspentsFetched,
    Assembled,
    Signed,
    Submitted,
    Failed(Failure),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Submitted | Stage::Failed(_))
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Constructed => f.write_str("constructed"),
            Stage::KeysResolved => f.write_str("keys resolved"),
            Stage::UnspentsFetched => f.write_str("unspents fetched"),
            Stage::Assembled => f.write_str("assembled"),
            Stage::Signed => f.write_str("signed"),
            Stage::Submitted => f.write_str("submitted"),
            Stage::Failed(failure) => write!(f, "failed ({failure})"),
        }
    }
}
