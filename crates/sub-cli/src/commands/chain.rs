use crate::commands::common::{display_units, open_chain, resolve_account, submit};
use crate::{print_info, print_success};
use colored::*;
use std::path::Path;
use sub_chain::deploy::deploy_contracts;
use sub_chain::{Chain, Transaction};
use sub_core::config::DeployConfig;
use sub_core::TOKEN_DECIMALS;

pub fn init(
    state_file: &Path,
    config: &DeployConfig,
    accounts: Option<usize>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if state_file.exists() && !force {
        return Err(format!(
            "Chain state already exists at {} (use --force to overwrite)",
            state_file.display()
        )
        .into());
    }
    let n = accounts.unwrap_or(config.dev_accounts);
    if n == 0 {
        return Err("At least one dev account is required".into());
    }

    let chain = Chain::with_dev_accounts(n);
    chain.save(state_file)?;
    print_success(&format!(
        "Initialized chain with {} dev accounts at {}",
        n,
        state_file.display()
    ));
    Ok(())
}

pub fn accounts(state_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let chain = open_chain(state_file)?;
    println!("{}", "Dev Accounts:".bold());
    println!();
    for (i, addr) in chain.dev_accounts()?.iter().enumerate() {
        let balance = chain.native_balance(addr)?;
        println!(
            "  {} {}  {} {}  {} {}",
            format!("[{}]", i).cyan(),
            addr.to_string().green(),
            "balance".dimmed(),
            display_units(balance, TOKEN_DECIMALS),
            "nonce".dimmed(),
            chain.nonce(addr)?
        );
    }
    println!();
    print_info(&format!("Block number: {}", chain.block_number()?));
    Ok(())
}

pub fn deploy(
    state_file: &Path,
    config: &DeployConfig,
    from: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = open_chain(state_file)?;
    let deployer = resolve_account(&chain, from)?;

    print_info(&format!(
        "Deploying {} ({}, {} decimals, supply {}) and Substratum from {}",
        config.legacy.name,
        config.legacy.symbol,
        config.legacy.decimals,
        config.legacy.initial_supply,
        deployer
    ));
    let deployment = deploy_contracts(&chain, deployer, config)?;
    chain.save(state_file)?;

    print_success("Contracts deployed");
    println!("  {}: {}", "Legacy token".dimmed(), deployment.legacy.to_string().green());
    println!("  {}:   {}", "Substratum".dimmed(), deployment.token.to_string().green());
    Ok(())
}

pub fn send_value(
    state_file: &Path,
    from: &str,
    to: &str,
    amount: u128,
) -> Result<(), Box<dyn std::error::Error>> {
    let chain = open_chain(state_file)?;
    let from = resolve_account(&chain, from)?;
    let to = resolve_account(&chain, to)?;

    print_info(&format!(
        "Sending {} wei from {} to {}",
        amount.to_string().cyan(),
        from,
        to
    ));
    submit(
        &chain,
        state_file,
        Transaction {
            from,
            to,
            value: amount,
            call: None,
        },
    )?;
    print_info(&format!(
        "Recipient balance: {}",
        display_units(chain.native_balance(&to)?, TOKEN_DECIMALS)
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sub_core::Address;

    #[test]
    fn test_init_then_deploy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let config = DeployConfig::default();

        init(&path, &config, Some(3), false).unwrap();
        assert!(init(&path, &config, Some(3), false).is_err());
        deploy(&path, &config, "0").unwrap();

        let chain = Chain::load(&path).unwrap();
        assert_eq!(chain.dev_accounts().unwrap().len(), 3);
        assert_eq!(chain.list_contracts().unwrap().len(), 2);
    }

    #[test]
    fn test_init_force_resets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        let config = DeployConfig::default();
        init(&path, &config, Some(2), false).unwrap();
        deploy(&path, &config, "0").unwrap();
        init(&path, &config, Some(2), true).unwrap();
        assert!(Chain::load(&path).unwrap().list_contracts().unwrap().is_empty());
    }

    #[test]
    fn test_send_value_to_fresh_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chain.json");
        init(&path, &DeployConfig::default(), Some(2), false).unwrap();
        let fresh = Address::dev_account(40);
        send_value(&path, "0", &fresh.to_string(), 5).unwrap();
        assert_eq!(Chain::load(&path).unwrap().native_balance(&fresh).unwrap(), 5);
    }
}
