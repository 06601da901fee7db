// SPDX-License-Identifier: AGPL-3.0-only
//! # Token Registry
//!
//! Discovery helpers over the contracts deployed on a [`Chain`]. Everything
//! is read straight from contract state; no transaction is executed and
//! nothing is mined.
//!
//! ```rust,ignore
//! use sub_chain::registry;
//!
//! let tokens = registry::list_tokens(&chain)?;
//! let info = registry::token_info(&chain, &address)?;
//! ```

use serde::{Deserialize, Serialize};
use sub_core::{u128_str, Address};

use crate::error::ChainResult;
use crate::state::{Contract, ContractKind, DeployedContract};
use crate::Chain;

/// Summary of a deployed token contract.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    pub contract: Address,
    pub kind: ContractKind,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Current supply in raw units (decreases on burn)
    #[serde(with = "u128_str")]
    pub total_supply: u128,
    /// Deployer / genesis holder
    pub owner: Address,
    /// Set for Substratum contracts only
    pub legacy_token: Option<Address>,
    pub created_at_block: u64,
}

impl From<&DeployedContract> for TokenInfo {
    fn from(deployed: &DeployedContract) -> Self {
        let meta = &deployed.contract.ledger().metadata;
        let legacy_token = match &deployed.contract {
            Contract::Substratum(t) => Some(t.legacy_token),
            Contract::Legacy(_) => None,
        };
        TokenInfo {
            contract: deployed.address,
            kind: deployed.contract.kind(),
            name: meta.name.clone(),
            symbol: meta.symbol.clone(),
            decimals: meta.decimals,
            total_supply: meta.total_supply,
            owner: deployed.contract.owner(),
            legacy_token,
            created_at_block: deployed.created_at_block,
        }
    }
}

pub fn token_info(chain: &Chain, contract: &Address) -> ChainResult<TokenInfo> {
    Ok(TokenInfo::from(&chain.get_contract(contract)?))
}

/// All deployed tokens in deployment order.
pub fn list_tokens(chain: &Chain) -> ChainResult<Vec<TokenInfo>> {
    chain
        .list_contracts()?
        .iter()
        .map(|addr| token_info(chain, addr))
        .collect()
}

/// Substratum contracts migrating out of `legacy`.
pub fn migration_targets(chain: &Chain, legacy: &Address) -> ChainResult<Vec<TokenInfo>> {
    Ok(list_tokens(chain)?
        .into_iter()
        .filter(|t| t.legacy_token.as_ref() == Some(legacy))
        .collect())
}
