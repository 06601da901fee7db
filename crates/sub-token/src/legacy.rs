// SPDX-License-Identifier: AGPL-3.0-only
//! Legacy token ("MyAdvancedToken"): the fixed-supply 2-decimal token that
//! Substratum replaces. Plain ERC-20 approvals (a new approve overwrites
//! the old allowance), plus `burn` and `burn_from`.

use serde::{Deserialize, Serialize};
use sub_core::Address;

use crate::abi::{reject_value, CallContext, QueryResult, TokenCall, TokenQuery};
use crate::error::{TokenError, TokenResult};
use crate::event::TokenEvent;
use crate::ledger::{ApprovalPolicy, TokenLedger, TokenMetadata};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyToken {
    pub ledger: TokenLedger,
    pub owner: Address,
}

impl LegacyToken {
    /// Constructor: `(initial_supply, name, decimals, symbol)`, supply in raw
    /// units credited to `deployer`. Returns the token and its mint event.
    pub fn new(
        deployer: Address,
        initial_supply: u128,
        name: String,
        decimals: u8,
        symbol: String,
    ) -> TokenResult<(Self, TokenEvent)> {
        let metadata = TokenMetadata {
            name,
            symbol,
            decimals,
            total_supply: initial_supply,
        };
        let (ledger, event) =
            TokenLedger::mint_genesis(metadata, ApprovalPolicy::Overwrite, deployer)?;
        Ok((
            Self {
                ledger,
                owner: deployer,
            },
            event,
        ))
    }

    /// Dispatch a state-changing call.
    pub fn execute(&mut self, ctx: &CallContext, call: TokenCall) -> TokenResult<Vec<TokenEvent>> {
        reject_value(ctx)?;
        let caller = ctx.caller;
        let event = match call {
            TokenCall::Transfer { to, amount } => self.ledger.transfer(&caller, &to, amount)?,
            TokenCall::Approve { spender, amount } => {
                self.ledger.approve(&caller, &spender, amount)?
            }
            TokenCall::TransferFrom { from, to, amount } => {
                self.ledger.transfer_from(&caller, &from, &to, amount)?
            }
            TokenCall::Burn { amount } => self.ledger.burn(&caller, amount)?,
            TokenCall::BurnFrom { from, amount } => {
                self.ledger.burn_from(&caller, &from, amount)?
            }
            other @ (TokenCall::Migrate { .. } | TokenCall::MigrateAll) => {
                return Err(TokenError::UnsupportedMethod {
                    method: other.method(),
                    contract: "the legacy token",
                })
            }
        };
        Ok(vec![event])
    }

    pub fn query(&self, query: &TokenQuery) -> TokenResult<QueryResult> {
        let meta = &self.ledger.metadata;
        Ok(match query {
            TokenQuery::Name => QueryResult::Text(meta.name.clone()),
            TokenQuery::Symbol => QueryResult::Text(meta.symbol.clone()),
            TokenQuery::Decimals => QueryResult::Decimals(meta.decimals),
            TokenQuery::TotalSupply => QueryResult::Amount(meta.total_supply),
            TokenQuery::BalanceOf { account } => {
                QueryResult::Amount(self.ledger.balance_of(account))
            }
            TokenQuery::Allowance { owner, spender } => {
                QueryResult::Amount(self.ledger.allowance(owner, spender))
            }
            TokenQuery::Owner => QueryResult::Address(self.owner),
            TokenQuery::LegacyToken => {
                return Err(TokenError::UnsupportedMethod {
                    method: "legacy_token",
                    contract: "the legacy token",
                })
            }
        })
    }
}

/// What Substratum needs from the ledger it migrates out of.
pub trait LegacyLedger {
    fn balance_of(&self, account: &Address) -> u128;
    fn allowance(&self, owner: &Address, spender: &Address) -> u128;
    fn transfer_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent>;
}

impl LegacyLedger for LegacyToken {
    fn balance_of(&self, account: &Address) -> u128 {
        self.ledger.balance_of(account)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.ledger.allowance(owner, spender)
    }

    fn transfer_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        self.ledger.transfer_from(caller, owner, to, amount)
    }
}
