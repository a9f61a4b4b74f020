//! Rent Reclaimer - recover rent from unused Solana token accounts
//!
//! # WARNING
//! - Closing and burning are irreversible. Review the scan before claiming.
//! - Every claim and burn transaction carries a service fee to the treasury.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// Use the library crate
use rent_reclaimer::cli::commands;
use rent_reclaimer::config::Config;

/// Rent Reclaimer - close empty accounts, burn spam, revoke delegates
#[derive(Parser)]
#[command(name = "reclaim")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "reclaim.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a wallet for reclaimable accounts
    Scan {
        /// Wallet to scan (default: the KEYPAIR_PATH wallet)
        #[arg(long)]
        owner: Option<String>,

        /// Only one category: zombie, spam or approval
        #[arg(long)]
        category: Option<String>,
    },

    /// Close empty token accounts and recover their rent
    Claim {
        /// Simulate only, don't sign or send
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Close spam token and NFT accounts
    Burn {
        /// Only accounts holding less than one whole token
        #[arg(long)]
        dust_only: bool,

        /// Burn remaining balances before closing
        #[arg(long)]
        burn_balance: bool,

        /// Simulate only, don't sign or send
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Revoke third-party delegates (free)
    Revoke {
        /// Simulate only, don't sign or send
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration (secrets masked)
    Config,

    /// Check RPC and keypair health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rent_reclaimer=info".parse()?),
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
        Commands::Scan { owner, category } => {
            commands::scan(&config, owner.as_deref(), category.as_deref()).await
        }
        Commands::Claim { dry_run, force } => commands::claim(&config, dry_run, force).await,
        Commands::Burn {
            dust_only,
            burn_balance,
            dry_run,
            force,
        } => commands::burn(&config, dust_only, burn_balance, dry_run, force).await,
        Commands::Revoke { dry_run, force } => commands::revoke(&config, dry_run, force).await,
        Commands::Config => commands::show_config(&config),
        Commands::Health => commands::health(&config).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
