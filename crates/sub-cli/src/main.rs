// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SUBSTRATUM CLI - Dev chain, token operations and legacy migration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

#[derive(Parser)]
#[command(name = "sub-cli")]
#[command(about = "Substratum CLI - Dev Chain & Token Migration", long_about = None)]
#[command(version)]
struct Cli {
    /// Chain state file (reads SUB_STATE_FILE env var, or defaults to ~/.substratum/chain.json)
    #[arg(short, long, env = "SUB_STATE_FILE")]
    state: Option<PathBuf>,

    /// Deploy config TOML (falls back to SUB_LEGACY_* / SUB_DEV_ACCOUNTS env vars)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a fresh chain with funded dev accounts
    Init {
        /// Number of dev accounts (overrides config)
        #[arg(short, long)]
        accounts: Option<usize>,

        /// Overwrite an existing state file
        #[arg(long)]
        force: bool,
    },

    /// List dev accounts with native balance and nonce
    Accounts,

    /// Deploy the legacy token and Substratum
    Deploy {
        /// Deployer (dev account index or 0x address)
        #[arg(short, long, default_value = "0")]
        from: String,
    },

    /// Send native value between accounts
    SendValue {
        /// Sender (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Recipient address
        #[arg(short, long)]
        to: String,

        /// Amount in wei
        #[arg(short, long)]
        amount: u128,
    },

    /// Token operations
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// List all deployed tokens
    List,

    /// Show token metadata
    Info {
        /// Token contract address
        address: String,
    },

    /// Query token balance for a holder
    Balance {
        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Holder (dev account index or 0x address)
        #[arg(long)]
        holder: String,
    },

    /// Query token allowance
    Allowance {
        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Owner (dev account index or 0x address)
        #[arg(short, long)]
        owner: String,

        /// Spender (dev account index or 0x address)
        #[arg(short, long)]
        spender: String,
    },

    /// Transfer tokens to another address
    Transfer {
        /// Sender (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount (raw units)
        #[arg(long)]
        amount: u128,
    },

    /// Approve spender allowance
    Approve {
        /// Owner (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Spender
        #[arg(long)]
        spender: String,

        /// Amount to allow (raw units)
        #[arg(long)]
        amount: u128,
    },

    /// Spend an allowance: move tokens from `owner` to `to`
    TransferFrom {
        /// Spender sending the transaction
        #[arg(short, long)]
        from: String,

        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Account the tokens are taken from
        #[arg(long)]
        owner: String,

        /// Recipient
        #[arg(long)]
        to: String,

        /// Amount (raw units)
        #[arg(long)]
        amount: u128,
    },

    /// Burn tokens from your balance
    Burn {
        /// Holder (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Amount to burn (raw units)
        #[arg(long)]
        amount: u128,
    },

    /// Burn another holder's tokens using an allowance (legacy token only)
    BurnFrom {
        /// Spender sending the transaction
        #[arg(short, long)]
        from: String,

        /// Token contract address
        #[arg(short, long)]
        token: String,

        /// Account the tokens are burned from
        #[arg(long)]
        owner: String,

        /// Amount to burn (raw units)
        #[arg(long)]
        amount: u128,
    },

    /// Exchange approved legacy tokens for SUB
    Migrate {
        /// Holder (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Substratum contract address
        #[arg(short, long)]
        token: String,

        /// Legacy amount (raw units, 2 decimals)
        #[arg(long)]
        amount: u128,
    },

    /// Exchange min(legacy allowance, legacy balance) for SUB
    MigrateAll {
        /// Holder (dev account index or 0x address)
        #[arg(short, long)]
        from: String,

        /// Substratum contract address
        #[arg(short, long)]
        token: String,
    },

    /// Show past events
    Events {
        /// Only events emitted by this contract
        #[arg(short, long)]
        token: Option<String>,

        /// Only events of this kind (Transfer | Approval)
        #[arg(short, long)]
        kind: Option<String>,

        /// Skip events before this block
        #[arg(long, default_value = "0")]
        from_block: u64,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    print_banner();

    // Get state file path
    let state_file = cli.state.unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".substratum")
            .join("chain.json")
    });
    dispatch(cli.command, &state_file, cli.config.as_deref())
}

/// Run one command. The deploy config is only read by the commands that
/// create state, so a broken config never blocks reads.
fn dispatch(
    command: Commands,
    state_file: &Path,
    config_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Init { accounts, force } => {
            let config = commands::common::load_config(config_path)?;
            commands::chain::init(state_file, &config, accounts, force)?;
        }
        Commands::Accounts => commands::chain::accounts(state_file)?,
        Commands::Deploy { from } => {
            let config = commands::common::load_config(config_path)?;
            commands::chain::deploy(state_file, &config, &from)?;
        }
        Commands::SendValue { from, to, amount } => {
            commands::chain::send_value(state_file, &from, &to, amount)?;
        }
        Commands::Token { action } => commands::token::handle(action, state_file)?,
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        "╔═══════════════════════════════════════════════╗".cyan()
    );
    println!(
        "{}",
        "║        SUBSTRATUM (SUB) - CLI v1.0.0          ║"
            .cyan()
            .bold()
    );
    println!(
        "{}",
        "║      Legacy → SUB one-way token migration     ║".cyan()
    );
    println!(
        "{}",
        "╚═══════════════════════════════════════════════╝".cyan()
    );
    println!();
}

fn print_success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

fn print_info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

// ─────────────────────────────────────────────────────────────────
// UNIT TESTS
// ─────────────────────────────────────────────────────────────────
