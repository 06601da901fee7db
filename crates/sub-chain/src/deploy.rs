//! Deployment script: legacy token first, then Substratum pointing at it.

use serde::{Deserialize, Serialize};
use sub_core::config::DeployConfig;
use sub_core::Address;
use tracing::info;

use crate::error::{ChainError, ChainResult};
use crate::state::{ContractInit, Receipt};
use crate::Chain;

/// Addresses produced by [`deploy_contracts`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deployment {
    pub legacy: Address,
    pub token: Address,
}

pub fn deploy_contracts(
    chain: &Chain,
    deployer: Address,
    config: &DeployConfig,
) -> ChainResult<Deployment> {
    let legacy_cfg = &config.legacy;
    let receipt = chain.deploy(
        deployer,
        ContractInit::Legacy {
            initial_supply: legacy_cfg.initial_supply,
            name: legacy_cfg.name.clone(),
            decimals: legacy_cfg.decimals,
            symbol: legacy_cfg.symbol.clone(),
        },
    )?;
    let legacy = deployed_address(&receipt)?;
    info!(
        address = %legacy,
        supply = legacy_cfg.initial_supply,
        symbol = %legacy_cfg.symbol,
        "legacy token deployed"
    );

    let receipt = chain.deploy(deployer, ContractInit::Substratum { legacy_token: legacy })?;
    let token = deployed_address(&receipt)?;
    info!(address = %token, legacy = %legacy, "Substratum deployed");

    Ok(Deployment { legacy, token })
}

fn deployed_address(receipt: &Receipt) -> ChainResult<Address> {
    receipt
        .contract_address
        .ok_or(ChainError::MissingContractAddress {
            block: receipt.block_number,
        })
}
