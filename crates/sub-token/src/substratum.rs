// SPDX-License-Identifier: AGPL-3.0-only
//! # Substratum (SUB)
//!
//! 18-decimal token with a fixed 472,000,000 SUB genesis supply credited to
//! the deployer ("owner"). Besides the standard ledger operations it
//! exchanges legacy tokens one way:
//!
//! 1. the holder approves this contract on the legacy ledger;
//! 2. `migrate(n)` pulls `n` legacy units into this contract's own legacy
//!    balance (they are stuck there for good);
//! 3. the holder receives `n × 10^16` SUB, transferred out of the owner's
//!    allotment. Supply is never inflated.
//!
//! If the owner cannot cover `n × 10^16` the whole call reverts; there is
//! no partial credit.

use serde::{Deserialize, Serialize};
use sub_core::{legacy_to_sub, Address, INITIAL_SUPPLY, TOKEN_DECIMALS, TOKEN_NAME, TOKEN_SYMBOL};
use tracing::info;

use crate::abi::{reject_value, CallContext, QueryResult, TokenCall, TokenQuery};
use crate::error::{TokenError, TokenResult};
use crate::event::TokenEvent;
use crate::legacy::LegacyLedger;
use crate::ledger::{ApprovalPolicy, TokenLedger, TokenMetadata};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Substratum {
    pub ledger: TokenLedger,
    /// Deployer; funds every migration.
    pub owner: Address,
    /// Legacy token contract this one migrates out of.
    pub legacy_token: Address,
}

/// Result of a Substratum call. `migrated`/`credited` are zero for
/// non-migration calls; events are split by emitting contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// Legacy units pulled from the holder
    pub migrated: u128,
    /// SUB units credited to the holder
    pub credited: u128,
    /// Emitted by the legacy token
    pub legacy_events: Vec<TokenEvent>,
    /// Emitted by Substratum
    pub events: Vec<TokenEvent>,
}

impl Substratum {
    /// Constructor. Fails when `legacy_token` is the zero address.
    pub fn new(deployer: Address, legacy_token: Address) -> TokenResult<(Self, TokenEvent)> {
        if legacy_token.is_zero() {
            return Err(TokenError::ZeroLegacyAddress);
        }
        let metadata = TokenMetadata {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            total_supply: INITIAL_SUPPLY,
        };
        let (ledger, event) =
            TokenLedger::mint_genesis(metadata, ApprovalPolicy::RequireZeroFirst, deployer)?;
        Ok((
            Self {
                ledger,
                owner: deployer,
                legacy_token,
            },
            event,
        ))
    }

    /// Dispatch a state-changing call. `legacy` is the ledger deployed at
    /// `self.legacy_token`, or `None` when nothing lives there; only the
    /// migrate calls touch it.
    pub fn execute(
        &mut self,
        ctx: &CallContext,
        call: TokenCall,
        legacy: Option<&mut dyn LegacyLedger>,
    ) -> TokenResult<CallOutcome> {
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
            TokenCall::Migrate { amount } => {
                let legacy = legacy.ok_or(TokenError::LegacyUnavailable(self.legacy_token))?;
                return self.migrate(ctx, legacy, amount);
            }
            TokenCall::MigrateAll => {
                let legacy = legacy.ok_or(TokenError::LegacyUnavailable(self.legacy_token))?;
                return self.migrate_all(ctx, legacy);
            }
            TokenCall::BurnFrom { .. } => {
                return Err(TokenError::UnsupportedMethod {
                    method: "burn_from",
                    contract: "Substratum",
                })
            }
        };
        Ok(CallOutcome {
            migrated: 0,
            credited: 0,
            legacy_events: Vec::new(),
            events: vec![event],
        })
    }

    /// Exchange `amount` legacy units for `amount × 10^16` SUB.
    pub fn migrate(
        &mut self,
        ctx: &CallContext,
        legacy: &mut dyn LegacyLedger,
        amount: u128,
    ) -> TokenResult<CallOutcome> {
        if amount == 0 {
            return Err(TokenError::NothingToMigrate);
        }
        let credited = legacy_to_sub(amount).ok_or(TokenError::Overflow)?;
        let available = self.ledger.balance_of(&self.owner);
        if available < credited {
            return Err(TokenError::OwnerBalanceExhausted {
                available,
                required: credited,
            });
        }

        // Checks allowance and balance on the legacy side; nothing has been
        // mutated yet if it fails.
        let legacy_event = legacy.transfer_from(&ctx.this, &ctx.caller, &ctx.this, amount)?;
        let owner = self.owner;
        let event = self.ledger.transfer(&owner, &ctx.caller, credited)?;

        info!(
            holder = %ctx.caller,
            migrated = amount,
            credited,
            owner_remaining = self.ledger.balance_of(&self.owner),
            "migrated legacy tokens"
        );

        Ok(CallOutcome {
            migrated: amount,
            credited,
            legacy_events: vec![legacy_event],
            events: vec![event],
        })
    }

    /// Migrate everything the caller has both approved and holds.
    pub fn migrate_all(
        &mut self,
        ctx: &CallContext,
        legacy: &mut dyn LegacyLedger,
    ) -> TokenResult<CallOutcome> {
        let approved = legacy.allowance(&ctx.caller, &ctx.this);
        let held = legacy.balance_of(&ctx.caller);
        self.migrate(ctx, legacy, approved.min(held))
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
            TokenQuery::LegacyToken => QueryResult::Address(self.legacy_token),
            TokenQuery::Owner => QueryResult::Address(self.owner),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::legacy::LegacyToken;
    use sub_core::{CONVERSION_FACTOR, LEGACY_INITIAL_SUPPLY, WEI_PER_SUB};

    fn owner() -> Address {
        Address::dev_account(0)
    }
    fn other() -> Address {
        Address::dev_account(1)
    }
    fn user() -> Address {
        Address::dev_account(4)
    }
    fn legacy_addr() -> Address {
        Address::derive_contract(&owner(), 0)
    }
    fn sub_addr() -> Address {
        Address::derive_contract(&owner(), 1)
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext {
            caller,
            this: sub_addr(),
            value: 0,
        }
    }

    fn deploy() -> (LegacyToken, Substratum) {
        let (legacy, _) = LegacyToken::new(
            owner(),
            LEGACY_INITIAL_SUPPLY,
            "Substratum".to_string(),
            2,
            "SUB".to_string(),
        )
        .unwrap();
        let (sub, _) = Substratum::new(owner(), legacy_addr()).unwrap();
        (legacy, sub)
    }

    /// Give `user` `amount` legacy units and approve `approved` of them.
    fn fund_user(legacy: &mut LegacyToken, amount: u128, approved: u128) {
        legacy.ledger.transfer(&owner(), &user(), amount).unwrap();
        legacy.ledger.approve(&user(), &sub_addr(), approved).unwrap();
    }

    #[test]
    fn test_zero_legacy_address_rejected() {
        assert_eq!(
            Substratum::new(owner(), Address::ZERO).unwrap_err(),
            TokenError::ZeroLegacyAddress
        );
    }

    #[test]
    fn test_genesis() {
        let (sub, event) = Substratum::new(owner(), legacy_addr()).unwrap();
        assert_eq!(sub.ledger.metadata.name, "Substratum");
        assert_eq!(sub.ledger.metadata.symbol, "SUB");
        assert_eq!(sub.ledger.metadata.decimals, 18);
        assert_eq!(sub.ledger.total_supply(), 472_000_000 * WEI_PER_SUB);
        assert_eq!(sub.ledger.balance_of(&owner()), 472_000_000 * WEI_PER_SUB);
        assert_eq!(
            event,
            TokenEvent::Transfer {
                from: Address::ZERO,
                to: owner(),
                value: INITIAL_SUPPLY,
            }
        );
    }

    #[test]
    fn test_migrate_all_full_approval() {
        let (mut legacy, mut sub) = deploy();
        fund_user(&mut legacy, 100, 100);

        let outcome = sub.migrate_all(&ctx(user()), &mut legacy).unwrap();
        assert_eq!(outcome.migrated, 100);
        assert_eq!(outcome.credited, WEI_PER_SUB);
        assert_eq!(legacy.ledger.balance_of(&user()), 0);
        assert_eq!(legacy.ledger.balance_of(&sub_addr()), 100);
        assert_eq!(sub.ledger.balance_of(&user()), WEI_PER_SUB);
        assert_eq!(
            outcome.events,
            vec![TokenEvent::Transfer {
                from: owner(),
                to: user(),
                value: WEI_PER_SUB,
            }]
        );
        assert_eq!(
            outcome.legacy_events,
            vec![TokenEvent::Transfer {
                from: user(),
                to: sub_addr(),
                value: 100,
            }]
        );
    }

    #[test]
    fn test_migrate_all_partial_approval() {
        let (mut legacy, mut sub) = deploy();
        fund_user(&mut legacy, 100, 90);

        sub.migrate_all(&ctx(user()), &mut legacy).unwrap();
        assert_eq!(legacy.ledger.balance_of(&user()), 10);
        assert_eq!(sub.ledger.balance_of(&user()), 90 * CONVERSION_FACTOR);
        assert_eq!(legacy.ledger.allowance(&user(), &sub_addr()), 0);
    }

    #[test]
    fn test_migrate_more_than_approved_reverts() {
        let (mut legacy, mut sub) = deploy();
        fund_user(&mut legacy, 100, 10);

        let err = sub.migrate(&ctx(user()), &mut legacy, 20).unwrap_err();
        assert_eq!(err, TokenError::InsufficientAllowance { have: 10, need: 20 });
        assert_eq!(legacy.ledger.balance_of(&user()), 100);
        assert_eq!(sub.ledger.balance_of(&user()), 0);
        assert_eq!(sub.ledger.balance_of(&owner()), INITIAL_SUPPLY);
    }

    #[test]
    fn test_migrate_more_than_balance_reverts() {
        let (mut legacy, mut sub) = deploy();
        fund_user(&mut legacy, 100, 200);

        let err = sub.migrate(&ctx(user()), &mut legacy, 200).unwrap_err();
        assert_eq!(err, TokenError::InsufficientBalance { have: 100, need: 200 });
        assert_eq!(legacy.ledger.allowance(&user(), &sub_addr()), 200);
    }

    #[test]
    fn test_migrate_beyond_owner_balance_reverts() {
        let (mut legacy, mut sub) = deploy();
        // Owner keeps only 1 SUB for migrations
        let keep = WEI_PER_SUB;
        sub.ledger
            .transfer(&owner(), &other(), INITIAL_SUPPLY - keep)
            .unwrap();
        fund_user(&mut legacy, 200, 200);

        let err = sub.migrate_all(&ctx(user()), &mut legacy).unwrap_err();
        assert_eq!(
            err,
            TokenError::OwnerBalanceExhausted {
                available: keep,
                required: 2 * WEI_PER_SUB,
            }
        );
        assert_eq!(legacy.ledger.balance_of(&user()), 200);

        // Exactly what the owner has left still goes through
        sub.migrate(&ctx(user()), &mut legacy, 100).unwrap();
        assert_eq!(sub.ledger.balance_of(&owner()), 0);
    }

    #[test]
    fn test_migrate_all_with_nothing_approved() {
        let (mut legacy, mut sub) = deploy();
        fund_user(&mut legacy, 100, 0);
        assert_eq!(
            sub.migrate_all(&ctx(user()), &mut legacy).unwrap_err(),
            TokenError::NothingToMigrate
        );
    }

    #[test]
    fn test_migrate_overflow() {
        let (mut legacy, mut sub) = deploy();
        assert_eq!(
            sub.migrate(&ctx(user()), &mut legacy, u128::MAX).unwrap_err(),
            TokenError::Overflow
        );
    }

    #[test]
    fn test_execute_rejects_value_and_burn_from() {
        let (mut legacy, mut sub) = deploy();
        let mut c = ctx(owner());
        c.value = 1;
        assert_eq!(
            sub.execute(&c, TokenCall::Burn { amount: 1 }, Some(&mut legacy))
                .unwrap_err(),
            TokenError::UnsolicitedValue { value: 1 }
        );
        assert!(sub
            .execute(
                &ctx(owner()),
                TokenCall::BurnFrom {
                    from: other(),
                    amount: 1
                },
                Some(&mut legacy)
            )
            .is_err());
    }

    #[test]
    fn test_migrate_without_legacy_ledger() {
        let (_, mut sub) = deploy();
        assert_eq!(
            sub.execute(&ctx(user()), TokenCall::MigrateAll, None)
                .unwrap_err(),
            TokenError::LegacyUnavailable(legacy_addr())
        );
        // Standard calls don't need it
        sub.execute(
            &ctx(owner()),
            TokenCall::Transfer {
                to: user(),
                amount: 600,
            },
            None,
        )
        .unwrap();
        assert_eq!(sub.ledger.balance_of(&user()), 600);
    }

    #[test]
    fn test_double_approve_reverts() {
        let (_, mut sub) = deploy();
        let approve = |amount| TokenCall::Approve {
            spender: other(),
            amount,
        };
        sub.execute(&ctx(owner()), approve(10_000), None).unwrap();
        assert_eq!(
            sub.execute(&ctx(owner()), approve(10_000), None)
                .unwrap_err(),
            TokenError::NonZeroAllowance { current: 10_000 }
        );
        assert_eq!(sub.ledger.allowance(&owner(), &other()), 10_000);
    }

    #[test]
    fn test_queries() {
        let (_, sub) = deploy();
        assert_eq!(
            sub.query(&TokenQuery::LegacyToken).unwrap().as_address(),
            Some(legacy_addr())
        );
        assert_eq!(
            sub.query(&TokenQuery::TotalSupply).unwrap().as_amount(),
            Some(INITIAL_SUPPLY)
        );
    }
}
