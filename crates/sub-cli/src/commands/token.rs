use crate::commands::common::{
    display_units, format_amount, open_chain, parse_address, resolve_account, submit,
};
use crate::{print_info, print_success, TokenCommands};
use colored::*;
use std::path::Path;
use sub_chain::registry::{self, TokenInfo};
use sub_chain::{Chain, Contract, ContractKind, LogFilter, Receipt, Transaction};
use sub_core::{Address, TOKEN_DECIMALS};
use sub_token::{EventKind, TokenCall, TokenEvent};

pub fn handle(action: TokenCommands, state_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let chain = open_chain(state_file)?;
    match action {
        TokenCommands::List => list_tokens(&chain)?,
        TokenCommands::Info { address } => token_info(&chain, &address)?,
        TokenCommands::Balance { token, holder } => token_balance(&chain, &token, &holder)?,
        TokenCommands::Allowance {
            token,
            owner,
            spender,
        } => token_allowance(&chain, &token, &owner, &spender)?,
        TokenCommands::Events {
            token,
            kind,
            from_block,
            json,
        } => token_events(&chain, token.as_deref(), kind.as_deref(), from_block, json)?,
        TokenCommands::Transfer {
            from,
            token,
            to,
            amount,
        } => {
            let to = resolve_account(&chain, &to)?;
            send(&chain, state_file, &from, &token, TokenCall::Transfer { to, amount })?
        }
        TokenCommands::Approve {
            from,
            token,
            spender,
            amount,
        } => {
            let spender = resolve_account(&chain, &spender)?;
            send(&chain, state_file, &from, &token, TokenCall::Approve { spender, amount })?
        }
        TokenCommands::TransferFrom {
            from,
            token,
            owner,
            to,
            amount,
        } => {
            let call = TokenCall::TransferFrom {
                from: resolve_account(&chain, &owner)?,
                to: resolve_account(&chain, &to)?,
                amount,
            };
            send(&chain, state_file, &from, &token, call)?
        }
        TokenCommands::Burn {
            from,
            token,
            amount,
        } => send(&chain, state_file, &from, &token, TokenCall::Burn { amount })?,
        TokenCommands::BurnFrom {
            from,
            token,
            owner,
            amount,
        } => {
            let call = TokenCall::BurnFrom {
                from: resolve_account(&chain, &owner)?,
                amount,
            };
            send(&chain, state_file, &from, &token, call)?
        }
        TokenCommands::Migrate {
            from,
            token,
            amount,
        } => migrate(&chain, state_file, &from, &token, TokenCall::Migrate { amount })?,
        TokenCommands::MigrateAll { from, token } => {
            migrate(&chain, state_file, &from, &token, TokenCall::MigrateAll)?
        }
    }
    Ok(())
}

fn print_token(info: &TokenInfo) {
    println!(
        "  {} {} ({}) {}",
        "•".cyan(),
        info.name.bold(),
        info.symbol.yellow(),
        format!("[{}]", info.kind).dimmed()
    );
    println!("    {}: {}", "Contract".dimmed(), info.contract.to_string().green());
    println!(
        "    {}: {} ({} decimals)",
        "Supply".dimmed(),
        display_units(info.total_supply, info.decimals).cyan(),
        info.decimals
    );
    println!("    {}: {}", "Owner".dimmed(), info.owner);
    if let Some(legacy) = info.legacy_token {
        println!("    {}: {}", "Migrates from".dimmed(), legacy);
    }
}

fn list_tokens(chain: &Chain) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = registry::list_tokens(chain)?;
    if tokens.is_empty() {
        print_info("No tokens deployed yet. Run `sub-cli deploy`.");
        return Ok(());
    }

    println!("{}", "Tokens:".bold());
    println!();
    for info in &tokens {
        print_token(info);
        println!();
    }
    println!(
        "{} {} {}",
        "Total:".bold(),
        tokens.len().to_string().cyan(),
        "token(s)".dimmed()
    );
    Ok(())
}

fn token_info(chain: &Chain, address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let info = registry::token_info(chain, &parse_address(address)?)?;
    print_token(&info);
    Ok(())
}

fn token_balance(chain: &Chain, token: &str, holder: &str) -> Result<(), Box<dyn std::error::Error>> {
    let info = registry::token_info(chain, &parse_address(token)?)?;
    let holder = resolve_account(chain, holder)?;
    let balance = chain.balance_of(&info.contract, &holder)?;
    println!(
        "{} {} {}",
        format_amount(balance, info.decimals).cyan(),
        info.symbol.yellow(),
        format!("held by {}", holder).dimmed()
    );
    Ok(())
}

fn token_allowance(
    chain: &Chain,
    token: &str,
    owner: &str,
    spender: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let info = registry::token_info(chain, &parse_address(token)?)?;
    let owner = resolve_account(chain, owner)?;
    let spender = resolve_account(chain, spender)?;
    let allowance = chain.allowance(&info.contract, &owner, &spender)?;
    println!(
        "{} {} {}",
        format_amount(allowance, info.decimals).cyan(),
        info.symbol.yellow(),
        format!("{} → {}", owner, spender).dimmed()
    );
    Ok(())
}

fn token_events(
    chain: &Chain,
    token: Option<&str>,
    kind: Option<&str>,
    from_block: u64,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = LogFilter {
        address: token.map(parse_address).transpose()?,
        kind: kind.map(|k| k.parse::<EventKind>()).transpose()?,
        from_block,
    };
    let logs = chain.logs(&filter)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&logs)?);
        return Ok(());
    }
    if logs.is_empty() {
        print_info("No matching events.");
        return Ok(());
    }
    for log in &logs {
        let detail = match &log.event {
            TokenEvent::Transfer { from, to, value } => {
                format!("Transfer {} → {} value {}", from, to, value)
            }
            TokenEvent::Approval {
                owner,
                spender,
                value,
            } => format!("Approval {} → {} value {}", owner, spender, value),
        };
        println!(
            "  {} {} {}",
            format!("#{}.{}", log.block_number, log.log_index).cyan(),
            log.address.to_string().dimmed(),
            detail
        );
    }
    Ok(())
}

fn send(
    chain: &Chain,
    state_file: &Path,
    from: &str,
    token: &str,
    call: TokenCall,
) -> Result<(), Box<dyn std::error::Error>> {
    let from = resolve_account(chain, from)?;
    let token = parse_address(token)?;
    print_info(&format!("{} on {} from {}", call.method(), token, from));
    submit(chain, state_file, Transaction::call(from, token, call))?;
    Ok(())
}

fn migrate(
    chain: &Chain,
    state_file: &Path,
    from: &str,
    token: &str,
    call: TokenCall,
) -> Result<(), Box<dyn std::error::Error>> {
    let holder = resolve_account(chain, from)?;
    let token = parse_address(token)?;
    let deployed = chain.expect_contract(&token, ContractKind::Substratum)?;
    let legacy = registry::token_info(chain, &legacy_of(&deployed.contract)?)?;

    print_info(&format!(
        "Migrating {} legacy {} for {}",
        match &call {
            TokenCall::Migrate { amount } => display_units(*amount, legacy.decimals),
            _ => "all approved".to_string(),
        },
        legacy.symbol,
        holder
    ));
    let receipt = submit(chain, state_file, Transaction::call(holder, token, call))?;
    let credited = credited_in(&receipt, &token, &holder);

    print_success(&format!(
        "Credited {} SUB; legacy balance now {}",
        display_units(credited, TOKEN_DECIMALS).cyan(),
        display_units(chain.balance_of(&legacy.contract, &holder)?, legacy.decimals)
    ));
    Ok(())
}

/// SUB paid to `holder` by the Substratum contract at `token`, read from the
/// receipt. Balance deltas miss the owner migrating to itself.
fn credited_in(receipt: &Receipt, token: &Address, holder: &Address) -> u128 {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == *token)
        .filter_map(|log| match log.event {
            TokenEvent::Transfer { to, value, .. } if to == *holder => Some(value),
            _ => None,
        })
        .sum()
}

fn legacy_of(contract: &Contract) -> Result<Address, Box<dyn std::error::Error>> {
    match contract {
        Contract::Substratum(t) => Ok(t.legacy_token),
        Contract::Legacy(_) => Err("Not a Substratum contract".into()),
    }
}
