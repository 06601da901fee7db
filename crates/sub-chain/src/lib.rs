// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SUBSTRATUM - DEV CHAIN
//
// Single-node, auto-mining host for the token contracts.
// - Deterministic funded dev accounts and contract addresses
// - One block per successful transaction, failed ones leave no trace
// - Event log with address/kind filters, receipts by tx hash
// - JSON state file persistence
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use sub_core::{Address, DEFAULT_DEV_ACCOUNTS};
use sub_token::{QueryResult, TokenQuery};
use tracing::{debug, info, warn};

pub mod deploy;
pub mod error;
pub mod registry;
pub mod state;

pub use error::{ChainError, ChainResult};
pub use state::{
    Account, ChainState, Contract, ContractInit, ContractKind, DeployedContract, Log, LogFilter,
    Receipt, Transaction,
};

/// Dev chain. All methods take `&self`; transactions are serialized by the
/// state lock, so a chain can be shared behind an `Arc`.
pub struct Chain {
    state: Mutex<ChainState>,
}

impl Chain {
    /// Chain with the default number of dev accounts.
    pub fn new() -> Self {
        Self::with_dev_accounts(DEFAULT_DEV_ACCOUNTS)
    }

    pub fn with_dev_accounts(n: usize) -> Self {
        Self::from_state(ChainState::genesis(n))
    }

    pub fn from_state(state: ChainState) -> Self {
        Chain {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> ChainResult<MutexGuard<'_, ChainState>> {
        self.state.lock().map_err(|_| ChainError::LockPoisoned)
    }

    /// Copy of the whole state.
    pub fn snapshot(&self) -> ChainResult<ChainState> {
        Ok(self.lock()?.clone())
    }

    // ── Persistence ──

    /// Read a state file written by [`Chain::save`]. Rejects files whose
    /// contract ledgers do not add up to their recorded supply.
    pub fn load(path: &Path) -> ChainResult<Self> {
        let content = fs::read_to_string(path)?;
        let state: ChainState = serde_json::from_str(&content)?;
        state.verify()?;
        debug!(path = %path.display(), block = state.block_number, "loaded chain state");
        Ok(Self::from_state(state))
    }

    /// Write the state as JSON. Goes through a sibling temp file and a rename
    /// so a crash never leaves a truncated state file behind.
    pub fn save(&self, path: &Path) -> ChainResult<()> {
        let json = serde_json::to_string_pretty(&*self.lock()?)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), "saved chain state");
        Ok(())
    }

    // ── Accounts ──

    pub fn dev_accounts(&self) -> ChainResult<Vec<Address>> {
        Ok(self.lock()?.dev_accounts.clone())
    }

    pub fn block_number(&self) -> ChainResult<u64> {
        Ok(self.lock()?.block_number)
    }

    pub fn native_balance(&self, account: &Address) -> ChainResult<u128> {
        Ok(self.lock()?.accounts.get(account).map_or(0, |a| a.balance))
    }

    pub fn nonce(&self, account: &Address) -> ChainResult<u64> {
        Ok(self.lock()?.accounts.get(account).map_or(0, |a| a.nonce))
    }

    // ── Transactions ──

    /// Deploy a contract from `from`. The address is derived from the
    /// sender and its current nonce.
    pub fn deploy(&self, from: Address, init: ContractInit) -> ChainResult<Receipt> {
        let mut state = self.lock()?;
        match state.apply_deploy(from, &init) {
            Ok(receipt) => {
                info!(
                    deployer = %from,
                    contract = ?receipt.contract_address,
                    block = receipt.block_number,
                    "contract deployed"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(deployer = %from, error = %e, "deployment reverted");
                Err(e)
            }
        }
    }

    /// Execute and mine a transaction.
    pub fn transact(&self, tx: Transaction) -> ChainResult<Receipt> {
        let mut state = self.lock()?;
        match state.apply_transaction(&tx) {
            Ok(receipt) => {
                debug!(
                    from = %tx.from,
                    to = %tx.to,
                    method = tx.call.as_ref().map_or("value", |c| c.method()),
                    block = receipt.block_number,
                    logs = receipt.logs.len(),
                    "transaction mined"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(from = %tx.from, to = %tx.to, error = %e, "transaction reverted");
                Err(e)
            }
        }
    }

    // ── Reads ──

    pub fn query(&self, contract: &Address, query: &TokenQuery) -> ChainResult<QueryResult> {
        let state = self.lock()?;
        let deployed = state
            .contracts
            .get(contract)
            .ok_or(ChainError::ContractNotFound(*contract))?;
        let result = match &deployed.contract {
            Contract::Legacy(t) => t.query(query)?,
            Contract::Substratum(t) => t.query(query)?,
        };
        Ok(result)
    }

    pub fn balance_of(&self, token: &Address, account: &Address) -> ChainResult<u128> {
        self.with_contract(token, |c| c.ledger().balance_of(account))
    }

    pub fn allowance(&self, token: &Address, owner: &Address, spender: &Address) -> ChainResult<u128> {
        self.with_contract(token, |c| c.ledger().allowance(owner, spender))
    }

    pub fn total_supply(&self, token: &Address) -> ChainResult<u128> {
        self.with_contract(token, |c| c.ledger().total_supply())
    }

    fn with_contract<T>(&self, address: &Address, f: impl FnOnce(&Contract) -> T) -> ChainResult<T> {
        let state = self.lock()?;
        let deployed = state
            .contracts
            .get(address)
            .ok_or(ChainError::ContractNotFound(*address))?;
        Ok(f(&deployed.contract))
    }

    pub fn get_contract(&self, address: &Address) -> ChainResult<DeployedContract> {
        self.lock()?
            .contracts
            .get(address)
            .cloned()
            .ok_or(ChainError::ContractNotFound(*address))
    }

    /// Like `get_contract`, but also checks the contract kind.
    pub fn expect_contract(&self, address: &Address, kind: ContractKind) -> ChainResult<DeployedContract> {
        let deployed = self.get_contract(address)?;
        let found = deployed.contract.kind();
        if found != kind {
            return Err(ChainError::WrongContractKind {
                address: *address,
                expected: kind,
                found,
            });
        }
        Ok(deployed)
    }

    /// Deployed contract addresses in deployment order.
    pub fn list_contracts(&self) -> ChainResult<Vec<Address>> {
        let state = self.lock()?;
        let mut deployed: Vec<&DeployedContract> = state.contracts.values().collect();
        deployed.sort_by_key(|c| c.created_at_block);
        Ok(deployed.into_iter().map(|c| c.address).collect())
    }

    pub fn logs(&self, filter: &LogFilter) -> ChainResult<Vec<Log>> {
        Ok(self
            .lock()?
            .logs
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }

    pub fn receipt(&self, tx_hash: &str) -> ChainResult<Option<Receipt>> {
        Ok(self.lock()?.receipts.get(tx_hash).cloned())
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
