//! Token errors. Every variant is a full revert: the operation that raised
//! it has left the ledger untouched.

use sub_core::Address;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },

    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },

    /// Non-zero approve over a non-zero allowance. The allowance must be
    /// reset to zero first.
    #[error("allowance is already {current}; approve 0 before setting a new amount")]
    NonZeroAllowance { current: u128 },

    #[error("transfer to the zero address")]
    TransferToZeroAddress,

    #[error("legacy token address must not be the zero address")]
    ZeroLegacyAddress,

    #[error("contract does not accept value transfers (got {value})")]
    UnsolicitedValue { value: u128 },

    #[error("call carries no method and the contract has no fallback")]
    NoFallback,

    #[error("method `{method}` is not supported by {contract}")]
    UnsupportedMethod {
        method: &'static str,
        contract: &'static str,
    },

    #[error("owner balance exhausted: {available} available, {required} required")]
    OwnerBalanceExhausted { available: u128, required: u128 },

    #[error("legacy token {0} is not deployed")]
    LegacyUnavailable(Address),

    #[error("nothing to migrate")]
    NothingToMigrate,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid call: {0}")]
    InvalidCall(String),
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
