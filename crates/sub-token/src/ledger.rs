// SPDX-License-Identifier: AGPL-3.0-only
//! # Standard token ledger
//!
//! Balance and allowance bookkeeping shared by the legacy token and the
//! Substratum token.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  TokenLedger                                        │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────────────┐  │
//! │  │ Metadata  │  │ Balances │  │ Allowances       │  │
//! │  │ name      │  │ addr→u128│  │ owner→spender    │  │
//! │  │ symbol    │  │          │  │   →u128          │  │
//! │  │ decimals  │  │          │  │                  │  │
//! │  │ supply    │  │          │  │                  │  │
//! │  └──────────┘  └──────────┘  └──────────────────┘  │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation validates first and mutates last, so an `Err` never
//! leaves a half-applied change behind. Invariant: the sum of all balances
//! equals `total_supply`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sub_core::{u128_str, u128_str_map, u128_str_nested_map, Address};
use tracing::debug;

use crate::error::{TokenError, TokenResult};
use crate::event::TokenEvent;

// ─────────────────────────────────────────────────────────────
// TOKEN METADATA
// ─────────────────────────────────────────────────────────────

/// Token metadata. Fixed at deployment except for `total_supply`, which
/// only ever decreases (burn).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "u128_str")]
    pub total_supply: u128,
}

impl TokenMetadata {
    pub fn validate(&self) -> TokenResult<()> {
        if self.name.is_empty() || self.name.len() > 64 {
            return Err(TokenError::InvalidMetadata(
                "name must be 1-64 characters".to_string(),
            ));
        }
        if self.symbol.is_empty() || self.symbol.len() > 8 {
            return Err(TokenError::InvalidMetadata(
                "symbol must be 1-8 characters".to_string(),
            ));
        }
        if self.decimals > 18 {
            return Err(TokenError::InvalidMetadata(
                "decimals must be 0-18".to_string(),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// APPROVAL POLICY
// ─────────────────────────────────────────────────────────────

/// How `approve` treats an existing allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalPolicy {
    /// Plain ERC-20: the new amount replaces the old one.
    Overwrite,
    /// A non-zero approve over a non-zero allowance reverts; the owner
    /// has to approve 0 first.
    RequireZeroFirst,
}

// ─────────────────────────────────────────────────────────────
// LEDGER
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenLedger {
    pub metadata: TokenMetadata,
    pub approval_policy: ApprovalPolicy,
    /// BTreeMap for deterministic serialization of the chain state.
    /// Zero balances are pruned.
    #[serde(with = "u128_str_map")]
    balances: BTreeMap<Address, u128>,
    /// owner → spender → allowance. Zero allowances are pruned.
    #[serde(with = "u128_str_nested_map")]
    allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
}

impl TokenLedger {
    /// Create a ledger with the whole `total_supply` credited to `holder`.
    /// Returns the mint event (`from = 0x0`).
    pub fn mint_genesis(
        metadata: TokenMetadata,
        approval_policy: ApprovalPolicy,
        holder: Address,
    ) -> TokenResult<(Self, TokenEvent)> {
        metadata.validate()?;
        if holder.is_zero() {
            return Err(TokenError::TransferToZeroAddress);
        }

        let supply = metadata.total_supply;
        let mut balances = BTreeMap::new();
        if supply > 0 {
            balances.insert(holder, supply);
        }

        let ledger = Self {
            metadata,
            approval_policy,
            balances,
            allowances: BTreeMap::new(),
        };
        let event = TokenEvent::Transfer {
            from: Address::ZERO,
            to: holder,
            value: supply,
        };
        Ok((ledger, event))
    }

    // ── Reads ──

    pub fn total_supply(&self) -> u128 {
        self.metadata.total_supply
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Accounts with a non-zero balance, in address order.
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }

    /// Sum of all balances. Equals `total_supply()` at all times.
    pub fn circulating(&self) -> u128 {
        self.balances.values().fold(0u128, |acc, b| acc.saturating_add(*b))
    }

    /// True when the balances add up to exactly `total_supply`. Only a ledger
    /// read from outside (a state file) can fail this.
    pub fn is_balanced(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |acc, b| acc.checked_add(*b))
            == Some(self.metadata.total_supply)
    }

    // ── Writes ──

    /// Move `amount` from `caller` to `to`.
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        self.move_balance(caller, to, amount)
    }

    /// Set `allowance(caller, spender) = amount` subject to the approval policy.
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        let current = self.allowance(caller, spender);
        if self.approval_policy == ApprovalPolicy::RequireZeroFirst && current != 0 && amount != 0 {
            return Err(TokenError::NonZeroAllowance { current });
        }
        self.set_allowance(caller, spender, amount);
        debug!(owner = %caller, spender = %spender, amount, "approve");
        Ok(TokenEvent::Approval {
            owner: *caller,
            spender: *spender,
            value: amount,
        })
    }

    /// `caller` moves `amount` from `owner` to `to`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        let allowance = self.allowance(owner, caller);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: allowance,
                need: amount,
            });
        }
        let event = self.move_balance(owner, to, amount)?;
        self.set_allowance(owner, caller, allowance - amount);
        Ok(event)
    }

    /// Destroy `amount` of `caller`'s tokens, shrinking the total supply.
    pub fn burn(&mut self, caller: &Address, amount: u128) -> TokenResult<TokenEvent> {
        let balance = self.balance_of(caller);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: balance,
                need: amount,
            });
        }
        let supply = self
            .metadata
            .total_supply
            .checked_sub(amount)
            .ok_or(TokenError::Overflow)?;
        self.set_balance(caller, balance - amount);
        self.metadata.total_supply = supply;
        debug!(from = %caller, amount, supply = self.metadata.total_supply, "burn");
        Ok(TokenEvent::Transfer {
            from: *caller,
            to: Address::ZERO,
            value: amount,
        })
    }

    /// Burn `amount` of `owner`'s tokens on their behalf, consuming allowance.
    pub fn burn_from(
        &mut self,
        caller: &Address,
        owner: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        let allowance = self.allowance(owner, caller);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                have: allowance,
                need: amount,
            });
        }
        let event = self.burn(owner, amount)?;
        self.set_allowance(owner, caller, allowance - amount);
        Ok(event)
    }

    // ── Internals ──

    fn move_balance(
        &mut self,
        from: &Address,
        to: &Address,
        amount: u128,
    ) -> TokenResult<TokenEvent> {
        if to.is_zero() {
            return Err(TokenError::TransferToZeroAddress);
        }
        let from_balance = self.balance_of(from);
        if from_balance < amount {
            return Err(TokenError::InsufficientBalance {
                have: from_balance,
                need: amount,
            });
        }
        if from != to {
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::Overflow)?;
            self.set_balance(from, from_balance - amount);
            self.set_balance(to, to_balance);
        }
        debug!(from = %from, to = %to, amount, "transfer");
        Ok(TokenEvent::Transfer {
            from: *from,
            to: *to,
            value: amount,
        })
    }

    fn set_balance(&mut self, account: &Address, amount: u128) {
        if amount == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(*account, amount);
        }
    }

    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: u128) {
        if amount == 0 {
            if let Some(spenders) = self.allowances.get_mut(owner) {
                spenders.remove(spender);
                if spenders.is_empty() {
                    self.allowances.remove(owner);
                }
            }
        } else {
            self.allowances
                .entry(*owner)
                .or_default()
                .insert(*spender, amount);
        }
    }
}
