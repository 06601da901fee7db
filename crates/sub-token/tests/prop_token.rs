// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS - sub-token
//
// Ledger and migration invariants that MUST hold for ALL inputs.
// Run: cargo test --release -p sub-token --test prop_token
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use proptest::prelude::*;
use sub_core::{Address, CONVERSION_FACTOR, INITIAL_SUPPLY, LEGACY_INITIAL_SUPPLY};
use sub_token::{
    ApprovalPolicy, CallContext, LegacyToken, Substratum, TokenError, TokenLedger, TokenMetadata,
};

const ACCOUNTS: usize = 5;

fn make_ledger(supply: u128, policy: ApprovalPolicy) -> TokenLedger {
    let metadata = TokenMetadata {
        name: "Prop".to_string(),
        symbol: "PRP".to_string(),
        decimals: 18,
        total_supply: supply,
    };
    TokenLedger::mint_genesis(metadata, policy, Address::dev_account(0))
        .unwrap()
        .0
}

#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, amount: u128 },
    Approve { owner: usize, spender: usize, amount: u128 },
    TransferFrom { spender: usize, owner: usize, to: usize, amount: u128 },
    Burn { from: usize, amount: u128 },
}

fn arb_op() -> impl Strategy<Value = Op> {
    let idx = 0..ACCOUNTS;
    let amount = 0u128..2_000_000u128;
    prop_oneof![
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(owner, spender, amount)| Op::Approve { owner, spender, amount }),
        (idx.clone(), idx.clone(), idx.clone(), amount.clone()).prop_map(
            |(spender, owner, to, amount)| Op::TransferFrom { spender, owner, to, amount }
        ),
        (idx, amount).prop_map(|(from, amount)| Op::Burn { from, amount }),
    ]
}

fn apply(ledger: &mut TokenLedger, op: &Op) -> Result<(), TokenError> {
    let a = Address::dev_account;
    match *op {
        Op::Transfer { from, to, amount } => ledger.transfer(&a(from), &a(to), amount).map(|_| ()),
        Op::Approve { owner, spender, amount } => {
            ledger.approve(&a(owner), &a(spender), amount).map(|_| ())
        }
        Op::TransferFrom { spender, owner, to, amount } => ledger
            .transfer_from(&a(spender), &a(owner), &a(to), amount)
            .map(|_| ()),
        Op::Burn { from, amount } => ledger.burn(&a(from), amount).map(|_| ()),
    }
}

proptest! {
    /// PROPERTY: sum of balances == total supply after any operation sequence
    #[test]
    fn prop_conservation(ops in prop::collection::vec(arb_op(), 1..60)) {
        let mut ledger = make_ledger(1_000_000, ApprovalPolicy::Overwrite);
        for op in &ops {
            let _ = apply(&mut ledger, op);
            prop_assert_eq!(ledger.circulating(), ledger.total_supply());
        }
    }

    /// PROPERTY: a rejected operation leaves the ledger bit-for-bit unchanged
    #[test]
    fn prop_failed_ops_do_not_mutate(
        ops in prop::collection::vec(arb_op(), 1..60),
        policy in prop_oneof![Just(ApprovalPolicy::Overwrite), Just(ApprovalPolicy::RequireZeroFirst)],
    ) {
        let mut ledger = make_ledger(1_000_000, policy);
        for op in &ops {
            let before = ledger.clone();
            if apply(&mut ledger, op).is_err() {
                prop_assert_eq!(&ledger, &before);
            }
        }
    }

    /// PROPERTY: burn(n) lowers supply by exactly n, and fails when n > balance
    #[test]
    fn prop_burn_monotonic(supply in 1u128..=u64::MAX as u128, amount in 0u128..=u64::MAX as u128) {
        let mut ledger = make_ledger(supply, ApprovalPolicy::Overwrite);
        let owner = Address::dev_account(0);
        let result = ledger.burn(&owner, amount);
        if amount <= supply {
            prop_assert!(result.is_ok());
            prop_assert_eq!(ledger.total_supply(), supply - amount);
            prop_assert_eq!(ledger.balance_of(&owner), supply - amount);
        } else {
            prop_assert!(result.is_err());
            prop_assert_eq!(ledger.total_supply(), supply);
        }
    }

    /// PROPERTY: under RequireZeroFirst a second non-zero approve always reverts
    #[test]
    fn prop_approval_race_guard(first in 1u128..u128::MAX, second in 1u128..u128::MAX) {
        let mut ledger = make_ledger(1, ApprovalPolicy::RequireZeroFirst);
        let owner = Address::dev_account(0);
        let spender = Address::dev_account(1);
        ledger.approve(&owner, &spender, first).unwrap();
        prop_assert_eq!(
            ledger.approve(&owner, &spender, second),
            Err(TokenError::NonZeroAllowance { current: first })
        );
        prop_assert_eq!(ledger.allowance(&owner, &spender), first);
    }

    /// PROPERTY: migrate(n) credits n × 10^16 and locks exactly n legacy units
    #[test]
    fn prop_migration_conversion(
        held in 1u128..=1_000_000_000u128,
        approved in 0u128..=1_000_000_000u128,
        request in 1u128..=1_000_000_000u128,
    ) {
        let owner = Address::dev_account(0);
        let user = Address::dev_account(4);
        let legacy_addr = Address::derive_contract(&owner, 0);
        let sub_addr = Address::derive_contract(&owner, 1);

        let (mut legacy, _) = LegacyToken::new(
            owner,
            LEGACY_INITIAL_SUPPLY,
            "Substratum".to_string(),
            2,
            "SUB".to_string(),
        ).unwrap();
        let (mut sub, _) = Substratum::new(owner, legacy_addr).unwrap();
        legacy.ledger.transfer(&owner, &user, held).unwrap();
        legacy.ledger.approve(&user, &sub_addr, approved).unwrap();

        let ctx = CallContext { caller: user, this: sub_addr, value: 0 };
        let legacy_before = legacy.clone();
        let sub_before = sub.clone();

        match sub.migrate(&ctx, &mut legacy, request) {
            Ok(outcome) => {
                prop_assert!(request <= held && request <= approved);
                prop_assert_eq!(outcome.credited, request * CONVERSION_FACTOR);
                prop_assert_eq!(sub.ledger.balance_of(&user), request * CONVERSION_FACTOR);
                prop_assert_eq!(legacy.ledger.balance_of(&user), held - request);
                prop_assert_eq!(legacy.ledger.balance_of(&sub_addr), request);
                prop_assert_eq!(sub.ledger.total_supply(), INITIAL_SUPPLY);
                prop_assert_eq!(
                    sub.ledger.balance_of(&owner),
                    INITIAL_SUPPLY - request * CONVERSION_FACTOR
                );
            }
            Err(_) => {
                prop_assert!(request > held || request > approved);
                prop_assert_eq!(legacy, legacy_before);
                prop_assert_eq!(sub, sub_before);
            }
        }
    }
}
