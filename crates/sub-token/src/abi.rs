// SPDX-License-Identifier: AGPL-3.0-only
//! Contract ABI: the calls and queries a token contract accepts.
//!
//! Calls are JSON objects tagged by `method`, amounts as decimal strings:
//!
//! ```json
//! {"method":"transfer","to":"0x…","amount":"600"}
//! {"method":"migrate_all"}
//! ```

use serde::{Deserialize, Serialize};
use sub_core::{u128_str, Address};

use crate::error::{TokenError, TokenResult};

/// Execution context the host hands to a contract for each call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// Verified sender of the call (an account, or a contract for nested calls)
    pub caller: Address,
    /// Address of the contract being executed
    pub this: Address,
    /// Native value attached to the call
    pub value: u128,
}

// ─────────────────────────────────────────────────────────────
// STATE-CHANGING CALLS
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TokenCall {
    Transfer {
        to: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    Approve {
        spender: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    TransferFrom {
        from: Address,
        to: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    Burn {
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Legacy token only.
    BurnFrom {
        from: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Substratum only: exchange `amount` approved legacy units.
    Migrate {
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Substratum only: exchange min(legacy allowance, legacy balance).
    MigrateAll,
}

impl TokenCall {
    pub fn method(&self) -> &'static str {
        match self {
            TokenCall::Transfer { .. } => "transfer",
            TokenCall::Approve { .. } => "approve",
            TokenCall::TransferFrom { .. } => "transfer_from",
            TokenCall::Burn { .. } => "burn",
            TokenCall::BurnFrom { .. } => "burn_from",
            TokenCall::Migrate { .. } => "migrate",
            TokenCall::MigrateAll => "migrate_all",
        }
    }

    /// Calls that reach into the legacy ledger.
    pub fn is_migration(&self) -> bool {
        matches!(self, TokenCall::Migrate { .. } | TokenCall::MigrateAll)
    }
}

// ─────────────────────────────────────────────────────────────
// READ-ONLY QUERIES
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TokenQuery {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf { account: Address },
    Allowance { owner: Address, spender: Address },
    /// Substratum only.
    LegacyToken,
    Owner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum QueryResult {
    Text(String),
    Decimals(u8),
    Amount(#[serde(with = "u128_str")] u128),
    Address(Address),
}

impl QueryResult {
    pub fn as_amount(&self) -> Option<u128> {
        match self {
            QueryResult::Amount(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            QueryResult::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            QueryResult::Address(a) => Some(*a),
            _ => None,
        }
    }
}

impl std::fmt::Display for QueryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryResult::Text(s) => f.write_str(s),
            QueryResult::Decimals(d) => write!(f, "{}", d),
            QueryResult::Amount(a) => write!(f, "{}", a),
            QueryResult::Address(a) => write!(f, "{}", a),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// VALIDATION (run by the host before dispatch)
// ─────────────────────────────────────────────────────────────

/// Reject calls that can never succeed regardless of ledger state.
pub fn validate_call(call: &TokenCall) -> TokenResult<()> {
    match call {
        TokenCall::Transfer { to, .. } | TokenCall::TransferFrom { to, .. } => {
            if to.is_zero() {
                return Err(TokenError::TransferToZeroAddress);
            }
            Ok(())
        }
        TokenCall::Approve { spender, .. } => {
            if spender.is_zero() {
                return Err(TokenError::InvalidCall(
                    "approve: spender is the zero address".to_string(),
                ));
            }
            Ok(())
        }
        TokenCall::BurnFrom { from, .. } => {
            if from.is_zero() {
                return Err(TokenError::InvalidCall(
                    "burn_from: owner is the zero address".to_string(),
                ));
            }
            Ok(())
        }
        TokenCall::Migrate { amount } => {
            if *amount == 0 {
                return Err(TokenError::NothingToMigrate);
            }
            Ok(())
        }
        TokenCall::Burn { .. } | TokenCall::MigrateAll => Ok(()),
    }
}

/// Contracts in this workspace have no payable entry point and no fallback.
pub fn reject_value(ctx: &CallContext) -> TokenResult<()> {
    if ctx.value > 0 {
        return Err(TokenError::UnsolicitedValue { value: ctx.value });
    }
    Ok(())
}
