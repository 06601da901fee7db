// SPDX-License-Identifier: AGPL-3.0-only
//! Persistent chain state and the transaction executor.
//!
//! Every `apply_*` method runs all checks against working copies of the
//! contracts it touches and only writes them back (together with the nonce,
//! block number, logs and receipt) once nothing can fail any more.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sub_core::{keccak256, u128_str, Address, DEV_ACCOUNT_BALANCE};
use sub_token::abi::reject_value;
use sub_token::{
    validate_call, CallContext, EventKind, LegacyLedger, LegacyToken, Substratum, TokenCall,
    TokenEvent, TokenError,
};

use crate::error::{ChainError, ChainResult};

/// Constructor arguments for the two deployable contract kinds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "contract", rename_all = "snake_case")]
pub enum ContractInit {
    Legacy {
        #[serde(with = "u128_str")]
        initial_supply: u128,
        name: String,
        decimals: u8,
        symbol: String,
    },
    Substratum {
        legacy_token: Address,
    },
}

/// A deployed contract's code and storage, keyed by kind in the state file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Contract {
    Legacy(LegacyToken),
    Substratum(Substratum),
}

impl Contract {
    pub fn kind(&self) -> ContractKind {
        match self {
            Contract::Legacy(_) => ContractKind::Legacy,
            Contract::Substratum(_) => ContractKind::Substratum,
        }
    }

    pub fn ledger(&self) -> &sub_token::TokenLedger {
        match self {
            Contract::Legacy(t) => &t.ledger,
            Contract::Substratum(t) => &t.ledger,
        }
    }

    pub fn owner(&self) -> Address {
        match self {
            Contract::Legacy(t) => t.owner,
            Contract::Substratum(t) => t.owner,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Legacy,
    Substratum,
}

impl std::fmt::Display for ContractKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractKind::Legacy => f.write_str("legacy"),
            ContractKind::Substratum => f.write_str("substratum"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: Address,
    pub deployer: Address,
    pub created_at_block: u64,
    pub contract: Contract,
}

/// Externally owned account.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    #[serde(with = "u128_str")]
    pub balance: u128,
    pub nonce: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    #[serde(with = "u128_str", default)]
    pub value: u128,
    #[serde(default)]
    pub call: Option<TokenCall>,
}

impl Transaction {
    /// Zero-value contract call.
    pub fn call(from: Address, to: Address, call: TokenCall) -> Self {
        Self {
            from,
            to,
            value: 0,
            call: Some(call),
        }
    }
}

/// An event as recorded by the chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Log {
    /// Emitting contract
    pub address: Address,
    pub block_number: u64,
    pub tx_hash: String,
    /// Position within the block
    pub log_index: u32,
    pub event: TokenEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub from: Address,
    /// `None` for deployments
    pub to: Option<Address>,
    /// Set for deployments
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

/// Log query. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Option<Address>,
    pub kind: Option<EventKind>,
    pub from_block: u64,
}

impl LogFilter {
    pub fn matches(&self, log: &Log) -> bool {
        self.address.map_or(true, |a| a == log.address)
            && self.kind.map_or(true, |k| k == log.event.kind())
            && log.block_number >= self.from_block
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainState {
    pub block_number: u64,
    pub dev_accounts: Vec<Address>,
    pub accounts: BTreeMap<Address, Account>,
    pub contracts: BTreeMap<Address, DeployedContract>,
    pub logs: Vec<Log>,
    pub receipts: BTreeMap<String, Receipt>,
}

fn tx_hash(from: &Address, nonce: u64, payload: &[u8]) -> String {
    let hash = keccak256(&[b"substratum-tx:", from.as_bytes(), &nonce.to_be_bytes(), payload]);
    format!("0x{}", hex::encode(hash))
}

impl ChainState {
    /// Fresh state with `n` funded dev accounts.
    pub fn genesis(n: usize) -> Self {
        let mut state = ChainState::default();
        for i in 0..n {
            let address = Address::dev_account(i);
            state.dev_accounts.push(address);
            state.accounts.insert(
                address,
                Account {
                    balance: DEV_ACCOUNT_BALANCE,
                    nonce: 0,
                },
            );
        }
        state
    }

    /// Check every contract ledger against its recorded supply.
    pub fn verify(&self) -> ChainResult<()> {
        for (address, deployed) in &self.contracts {
            let ledger = deployed.contract.ledger();
            if !ledger.is_balanced() {
                return Err(ChainError::SupplyMismatch {
                    address: *address,
                    circulating: ledger.circulating(),
                    total_supply: ledger.total_supply(),
                });
            }
        }
        Ok(())
    }

    fn nonce_of(&self, from: &Address) -> ChainResult<u64> {
        self.accounts
            .get(from)
            .map(|a| a.nonce)
            .ok_or(ChainError::UnknownAccount(*from))
    }

    pub(crate) fn apply_deploy(&mut self, from: Address, init: &ContractInit) -> ChainResult<Receipt> {
        let nonce = self.nonce_of(&from)?;
        let address = Address::derive_contract(&from, nonce);
        let (contract, genesis) = match init.clone() {
            ContractInit::Legacy {
                initial_supply,
                name,
                decimals,
                symbol,
            } => {
                let (token, event) = LegacyToken::new(from, initial_supply, name, decimals, symbol)?;
                (Contract::Legacy(token), event)
            }
            ContractInit::Substratum { legacy_token } => {
                let (token, event) = Substratum::new(from, legacy_token)?;
                (Contract::Substratum(token), event)
            }
        };
        let hash = tx_hash(&from, nonce, &serde_json::to_vec(init)?);

        // Commit
        let block_number = self.block_number + 1;
        self.contracts.insert(
            address,
            DeployedContract {
                address,
                deployer: from,
                created_at_block: block_number,
                contract,
            },
        );
        Ok(self.seal(from, None, Some(address), hash, vec![(address, genesis)]))
    }

    pub(crate) fn apply_transaction(&mut self, tx: &Transaction) -> ChainResult<Receipt> {
        let nonce = self.nonce_of(&tx.from)?;
        let hash = tx_hash(&tx.from, nonce, &serde_json::to_vec(tx)?);

        let Some(target) = self.contracts.get(&tx.to) else {
            return self.apply_value_transfer(tx, hash);
        };

        let ctx = CallContext {
            caller: tx.from,
            this: tx.to,
            value: tx.value,
        };
        let call = match &tx.call {
            Some(call) => call.clone(),
            None => {
                reject_value(&ctx)?;
                return Err(TokenError::NoFallback.into());
            }
        };
        validate_call(&call)?;

        let mut updates: Vec<(Address, Contract)> = Vec::with_capacity(2);
        let mut emitted: Vec<(Address, TokenEvent)> = Vec::new();
        match &target.contract {
            Contract::Legacy(token) => {
                let mut token = token.clone();
                let events = token.execute(&ctx, call)?;
                emitted.extend(events.into_iter().map(|e| (tx.to, e)));
                updates.push((tx.to, Contract::Legacy(token)));
            }
            Contract::Substratum(token) => {
                let mut token = token.clone();
                let legacy_address = token.legacy_token;
                let mut legacy = match self.contracts.get(&legacy_address).map(|c| &c.contract) {
                    Some(Contract::Legacy(l)) if call.is_migration() => Some(l.clone()),
                    _ => None,
                };
                let outcome = token.execute(
                    &ctx,
                    call,
                    legacy.as_mut().map(|l| l as &mut dyn LegacyLedger),
                )?;
                emitted.extend(outcome.legacy_events.into_iter().map(|e| (legacy_address, e)));
                emitted.extend(outcome.events.into_iter().map(|e| (tx.to, e)));
                updates.push((tx.to, Contract::Substratum(token)));
                if outcome.migrated > 0 {
                    if let Some(legacy) = legacy {
                        updates.push((legacy_address, Contract::Legacy(legacy)));
                    }
                }
            }
        }

        // Commit
        for (address, contract) in updates {
            if let Some(deployed) = self.contracts.get_mut(&address) {
                deployed.contract = contract;
            }
        }
        Ok(self.seal(tx.from, Some(tx.to), None, hash, emitted))
    }

    fn apply_value_transfer(&mut self, tx: &Transaction, hash: String) -> ChainResult<Receipt> {
        if tx.call.is_some() {
            return Err(ChainError::NotAContract(tx.to));
        }
        if tx.from == tx.to {
            return Ok(self.seal(tx.from, Some(tx.to), None, hash, Vec::new()));
        }
        let have = self.accounts.get(&tx.from).map_or(0, |a| a.balance);
        if have < tx.value {
            return Err(ChainError::InsufficientFunds {
                have,
                need: tx.value,
            });
        }
        let credited = self
            .accounts
            .get(&tx.to)
            .map_or(0, |a| a.balance)
            .checked_add(tx.value)
            .ok_or(TokenError::Overflow)?;

        // Commit
        if let Some(sender) = self.accounts.get_mut(&tx.from) {
            sender.balance = have - tx.value;
        }
        self.accounts.entry(tx.to).or_default().balance = credited;
        Ok(self.seal(tx.from, Some(tx.to), None, hash, Vec::new()))
    }

    /// Mine one block holding the transaction: bump nonce and block number,
    /// record logs and the receipt.
    fn seal(
        &mut self,
        from: Address,
        to: Option<Address>,
        contract_address: Option<Address>,
        tx_hash: String,
        emitted: Vec<(Address, TokenEvent)>,
    ) -> Receipt {
        self.block_number += 1;
        if let Some(account) = self.accounts.get_mut(&from) {
            account.nonce += 1;
        }
        let logs: Vec<Log> = emitted
            .into_iter()
            .enumerate()
            .map(|(i, (address, event))| Log {
                address,
                block_number: self.block_number,
                tx_hash: tx_hash.clone(),
                log_index: i as u32,
                event,
            })
            .collect();
        self.logs.extend(logs.iter().cloned());
        let receipt = Receipt {
            tx_hash: tx_hash.clone(),
            block_number: self.block_number,
            from,
            to,
            contract_address,
            logs,
        };
        self.receipts.insert(tx_hash, receipt.clone());
        receipt
    }
}
