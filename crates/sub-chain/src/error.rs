use sub_core::Address;
use sub_token::TokenError;
use thiserror::Error;

use crate::state::ContractKind;

/// Error during chain operations. A failed transaction or deployment leaves
/// the chain state exactly as it was.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("transaction reverted: {0}")]
    Reverted(#[from] TokenError),

    #[error("unknown sender account {0}")]
    UnknownAccount(Address),

    #[error("no contract deployed at {0}")]
    ContractNotFound(Address),

    #[error("contract {address} is {found}, expected {expected}")]
    WrongContractKind {
        address: Address,
        expected: ContractKind,
        found: ContractKind,
    },

    #[error("{0} is not a contract; only value transfers can target it")]
    NotAContract(Address),

    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u128, need: u128 },

    #[error("contract {address}: balances add up to {circulating}, recorded supply is {total_supply}")]
    SupplyMismatch {
        address: Address,
        circulating: u128,
        total_supply: u128,
    },

    #[error("deployment at block {block} recorded no contract address")]
    MissingContractAddress { block: u64 },

    #[error("failed to lock chain state")]
    LockPoisoned,

    #[error("state file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("state encoding error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ChainError {
    /// The token-level reason, if the contract itself rejected the call.
    pub fn revert_reason(&self) -> Option<&TokenError> {
        match self {
            ChainError::Reverted(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for chain operations
pub type ChainResult<T> = Result<T, ChainError>;
