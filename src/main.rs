//! Withdraw - compose and submit withdrawals from a multi-token custodial wallet
//!
//! # WARNING
//! - Withdrawals move real funds and cannot be undone.
//! - Double-check the recipient address; the backend only rejects invalid ones.

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::error;

// Use the library crate
use withdraw_composer::cli::commands::{self, AmountArg, RecipientArg, SendArgs};
use withdraw_composer::config::Config;

/// Withdraw tokens from a custodial Solana wallet
#[derive(Parser)]
#[command(name = "withdraw")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "withdraw.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List withdrawable tokens and balances
    Tokens,

    /// List address book entries
    Contacts {
        /// Filter by name or address (case-insensitive)
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show transaction history
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Print your own wallet address
    Address,

    /// Withdraw a token
    #[command(group(ArgGroup::new("amount_source").required(true).args(["amount", "max"])))]
    #[command(group(ArgGroup::new("recipient").required(true).args(["to", "contact"])))]
    Send {
        /// Token symbol, e.g. SOL or USDC
        #[arg(short, long)]
        token: String,

        /// Amount to withdraw
        #[arg(short, long)]
        amount: Option<String>,

        /// Withdraw the full balance
        #[arg(long)]
        max: bool,

        /// Recipient Solana address
        #[arg(long)]
        to: Option<String>,

        /// Recipient address book entry (wallet id)
        #[arg(long)]
        contact: Option<u64>,

        /// Google Authenticator code (prompted when required and missing)
        #[arg(long)]
        otp: Option<String>,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("withdraw_composer=info".parse()?),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Execute command
    let result = match cli.command {
        Commands::Tokens => commands::tokens(&config).await,
        Commands::Contacts { query } => commands::contacts(&config, query).await,
        Commands::History { limit } => commands::history(&config, limit).await,
        Commands::Address => commands::address(&config).await,
        Commands::Send {
            token,
            amount,
            max,
            to,
            contact,
            otp,
            force,
        } => {
            let amount = match (max, amount) {
                (true, _) => AmountArg::Max,
                (false, Some(amount)) => AmountArg::Exact(amount),
                (false, None) => anyhow::bail!("Either --amount or --max is required"),
            };
            let recipient = match (to, contact) {
                (Some(address), _) => RecipientArg::Address(address),
                (None, Some(wallet_id)) => RecipientArg::Contact(wallet_id),
                (None, None) => anyhow::bail!("Either --to or --contact is required"),
            };
            commands::send(
                &config,
                SendArgs {
                    token,
                    amount,
                    recipient,
                    otp,
                    force,
                },
            )
            .await
        }
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
