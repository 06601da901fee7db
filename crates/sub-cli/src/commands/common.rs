use crate::{print_error, print_success};
use colored::*;
use std::path::Path;
use sub_chain::{Chain, Receipt, Transaction};
use sub_core::config::DeployConfig;
use sub_core::{format_units, Address};

/// Deploy config from `--config`, or from the environment when no file is
/// given.
pub fn load_config(path: Option<&Path>) -> Result<DeployConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => DeployConfig::load_from_file(p)
            .map_err(|e| format!("Config {}: {}", p.display(), e))?,
        None => DeployConfig::load_from_env()?,
    };
    Ok(config)
}

/// Load the chain from its state file. The file must exist.
pub fn open_chain(state_file: &Path) -> Result<Chain, Box<dyn std::error::Error>> {
    if !state_file.exists() {
        return Err(format!(
            "No chain state at {}. Run `sub-cli init` first.",
            state_file.display()
        )
        .into());
    }
    Ok(Chain::load(state_file)?)
}

/// Resolve an account argument: a dev account index (`0`, `4`, ...) or a
/// `0x` address.
pub fn resolve_account(chain: &Chain, arg: &str) -> Result<Address, Box<dyn std::error::Error>> {
    if !arg.is_empty() && arg.len() <= 4 && arg.chars().all(|c| c.is_ascii_digit()) {
        let index: usize = arg.parse()?;
        let accounts = chain.dev_accounts()?;
        return accounts.get(index).copied().ok_or_else(|| {
            format!(
                "Dev account index {} out of range (chain has {})",
                index,
                accounts.len()
            )
            .into()
        });
    }
    parse_address(arg)
}

pub fn parse_address(arg: &str) -> Result<Address, Box<dyn std::error::Error>> {
    arg.parse::<Address>()
        .map_err(|e| format!("Invalid address '{}': {}", arg, e).into())
}

/// Decimal rendering, or the raw integer when `decimals` is too large to split.
pub fn display_units(amount: u128, decimals: u8) -> String {
    format_units(amount, decimals).unwrap_or_else(|| amount.to_string())
}

/// `1.00 (100 raw)` style amount rendering.
pub fn format_amount(amount: u128, decimals: u8) -> String {
    format!("{} ({} raw)", display_units(amount, decimals), amount)
}

/// Execute a transaction, persist the chain on success and print the
/// receipt. A reverted transaction leaves the state file untouched.
pub fn submit(
    chain: &Chain,
    state_file: &Path,
    tx: Transaction,
) -> Result<Receipt, Box<dyn std::error::Error>> {
    match chain.transact(tx) {
        Ok(receipt) => {
            chain.save(state_file)?;
            print_receipt(&receipt);
            Ok(receipt)
        }
        Err(e) => {
            print_error(&format!("Transaction reverted: {}", e));
            Err(e.into())
        }
    }
}

pub fn print_receipt(receipt: &Receipt) {
    print_success(&format!(
        "Mined in block {}",
        receipt.block_number.to_string().cyan()
    ));
    println!("  {}: {}", "Tx".dimmed(), receipt.tx_hash);
    if let Some(addr) = receipt.contract_address {
        println!("  {}: {}", "Contract".dimmed(), addr.to_string().green());
    }
    for log in &receipt.logs {
        println!(
            "  {} {} {}",
            "•".cyan(),
            log.address.to_string().dimmed(),
            serde_json::to_string(&log.event).unwrap_or_default()
        );
    }
}
