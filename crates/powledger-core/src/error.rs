//! Error types for the ledger core.

use thiserror::Error;

use crate::Address;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("signing key belongs to {actual}, transaction sender is {expected}")]
    KeyMismatch { expected: Address, actual: Address },

    #[error("no signature in this transaction")]
    MissingSignature,

    #[error("transaction must include sender and recipient addresses")]
    IncompleteTransaction,

    #[error("cannot add invalid transaction to chain")]
    InvalidTransaction,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("mining cancelled")]
    MiningCancelled,
}

pub type Result<T> = std::result::Result<T, LedgerError>;
