//! CLI command implementations

use anyhow::Result;
use dialoguer::Confirm;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::chain::RpcChain;
use crate::config::Config;
use crate::error::Error;
use crate::reclaim::{format_sol, quote, ClaimQuote, Operation, Reclaimable, TransactionBuilder};
use crate::scanner::{select_dust, ScanCategory, ScanReport, Scanner, SpamItem};
use crate::submit::{load_keypair, KeypairSubmitter, Pipeline, Submitter, WorkingSet};

const DEFAULT_KEYPAIR_PATH: &str = "credentials/keypair.json";

/// Scan a wallet and print what can be reclaimed
pub async fn scan(config: &Config, owner: Option<&str>, category: Option<&str>) -> Result<()> {
    let owner = resolve_owner(owner)?;
    let category = category.map(parse_category).transpose()?;
    let scanner = Scanner::new(Arc::new(connect(config)?), config.scan_options()?);
    let fees = config.fee_schedule()?;
    let max = config.batching.max_accounts_per_tx;

    println!("\n=== WALLET SCAN: {} ===\n", owner);

    let wanted = |c: ScanCategory| category.map_or(true, |only| only == c);

    if wanted(ScanCategory::Zombies) {
        match scanner.scan_zombies(&owner).await {
            Ok(report) => {
                print_report(&report, |a| a.to_string());
                let estimate = quote(Operation::ClaimRent, report.len(), &fees, max);
                print_quote(&estimate.map_err(user_error)?);
            }
            Err(e) => print_failure(ScanCategory::Zombies, &e),
        }
    }

    if wanted(ScanCategory::Spam) {
        match scanner.scan_spam(&owner).await {
            Ok(report) => {
                print_report(&report, |s| match s.balance {
                    Some(balance) => format!("{} [{}] balance {}", s.account, s.kind, balance),
                    None => format!("{} [{}]", s.account, s.kind),
                });
                let dust = select_dust(&report.items).len();
                if dust > 0 {
                    println!("  ({} dust accounts, see 'burn --dust-only')", dust);
                }
                let estimate = quote(Operation::BurnSpam, report.len(), &fees, max);
                print_quote(&estimate.map_err(user_error)?);
            }
            Err(e) => print_failure(ScanCategory::Spam, &e),
        }
    }

    if wanted(ScanCategory::Approvals) {
        match scanner.scan_approvals(&owner).await {
            Ok(report) => print_report(&report, |a| match a.delegated_amount {
                Some(amount) => format!("{} -> {} (up to {})", a.account, a.delegate, amount),
                None => format!("{} -> {}", a.account, a.delegate),
            }),
            Err(e) => print_failure(ScanCategory::Approvals, &e),
        }
    }

    Ok(())
}

/// Close every empty token account and pay the flat fee per transaction
pub async fn claim(config: &Config, dry_run: bool, force: bool) -> Result<()> {
    let keypair = load_keypair(keypair_path()).map_err(user_error)?;
    let owner = keypair.pubkey();
    let chain = Arc::new(connect(config)?);
    let scanner = Scanner::new(chain.clone(), config.scan_options()?);

    let report = scanner.scan_zombies(&owner).await.map_err(user_error)?;
    let builder = TransactionBuilder::new(config.fee_schedule()?);

    execute(
        config,
        &chain,
        &builder,
        Operation::ClaimRent,
        report.items,
        ExecuteMode::new(dry_run, force),
        KeypairSubmitter::new(chain.client(), keypair),
    )
    .await
}

/// Close spam token and NFT accounts
pub async fn burn(
    config: &Config,
    dust_only: bool,
    burn_balance: bool,
    dry_run: bool,
    force: bool,
) -> Result<()> {
    let keypair = load_keypair(keypair_path()).map_err(user_error)?;
    let owner = keypair.pubkey();
    let chain = Arc::new(connect(config)?);
    let scanner = Scanner::new(chain.clone(), config.scan_options()?);

    let report = scanner.scan_spam(&owner).await.map_err(user_error)?;
    let items: Vec<SpamItem> = if dust_only {
        select_dust(&report.items)
    } else {
        report.items
    };

    let burn_balance = burn_balance || config.batching.burn_remaining_balance;
    if !burn_balance && !items.is_empty() {
        warn!(
            "Closing accounts that still hold tokens will fail on-chain; \
             pass --burn-balance to burn them first"
        );
    }

    let builder = TransactionBuilder::new(config.fee_schedule()?).with_balance_burn(burn_balance);

    execute(
        config,
        &chain,
        &builder,
        Operation::BurnSpam,
        items,
        ExecuteMode::new(dry_run, force),
        KeypairSubmitter::new(chain.client(), keypair),
    )
    .await
}

/// Remove every third-party delegate
pub async fn revoke(config: &Config, dry_run: bool, force: bool) -> Result<()> {
    let keypair = load_keypair(keypair_path()).map_err(user_error)?;
    let owner = keypair.pubkey();
    let chain = Arc::new(connect(config)?);
    let scanner = Scanner::new(chain.clone(), config.scan_options()?);

    let report = scanner.scan_approvals(&owner).await.map_err(user_error)?;
    let builder = TransactionBuilder::new(config.fee_schedule()?);

    execute(
        config,
        &chain,
        &builder,
        Operation::RevokeApproval,
        report.items,
        ExecuteMode::new(dry_run, force),
        KeypairSubmitter::new(chain.client(), keypair),
    )
    .await
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}

/// Check RPC reachability and the signing wallet
pub async fn health(config: &Config) -> Result<()> {
    println!("\n=== SYSTEM HEALTH CHECK ===\n");

    let mut all_healthy = true;
    let chain = connect(config)?;

    print!("RPC Endpoint... ");
    let start = Instant::now();
    match chain.version().await {
        Ok(version) => println!(
            "OK ({}ms, solana-core {})",
            start.elapsed().as_millis(),
            version
        ),
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    print!("Keypair... ");
    match load_keypair(keypair_path()) {
        Ok(keypair) => {
            let pubkey = keypair.pubkey();
            let submitter = KeypairSubmitter::new(chain.client(), keypair);
            match submitter.balance().await {
                Ok(lamports) => {
                    println!("OK ({}, balance: {} SOL)", pubkey, format_sol(lamports))
                }
                Err(e) => {
                    println!("FAILED: {}", e);
                    all_healthy = false;
                }
            }
        }
        Err(e) => {
            println!("FAILED: {}", e);
            all_healthy = false;
        }
    }

    println!();
    if all_healthy {
        println!("All systems healthy!");
    } else {
        println!("Some systems are unhealthy. Check the errors above.");
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct ExecuteMode {
    dry_run: bool,
    force: bool,
}

impl ExecuteMode {
    fn new(dry_run: bool, force: bool) -> Self {
        Self { dry_run, force }
    }
}

/// Quote, confirm, then either simulate every batch or run the pipeline
async fn execute<T>(
    config: &Config,
    chain: &RpcChain,
    builder: &TransactionBuilder,
    operation: Operation,
    items: Vec<T>,
    mode: ExecuteMode,
    submitter: KeypairSubmitter,
) -> Result<()>
where
    T: Reclaimable + Clone + Sync,
{
    if items.is_empty() {
        println!("Nothing to {}. Wallet is clean.", operation);
        return Ok(());
    }

    let per_tx = builder.accounts_per_tx(operation, config.batching.max_accounts_per_tx);
    let estimate =
        quote(operation, items.len(), builder.fees(), per_tx).map_err(user_error)?;
    print_quote(&estimate);

    let mut working = WorkingSet::new(items);
    let owner = submitter.pubkey();

    if mode.dry_run {
        info!("DRY-RUN: simulating {} transactions", estimate.transactions);
        for (i, batch) in working.batches(per_tx).iter().enumerate() {
            let claim = builder
                .build(chain, operation, &owner, &batch[..])
                .await
                .map_err(user_error)?;
            let outcome = match chain.simulate(&claim.transaction).await {
                Ok(None) => "OK".to_string(),
                Ok(Some(err)) => format!("WOULD FAIL: {}", err),
                Err(e) => format!("SIMULATION ERROR: {}", e),
            };
            println!(
                "  tx {}: {} accounts, {} instructions, {} bytes... {}",
                i + 1,
                claim.accounts.len(),
                claim.instruction_count(),
                claim.size,
                outcome
            );
        }
        return Ok(());
    }

    if !mode.force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "{} {} accounts in {} transactions? This cannot be undone.",
                operation, estimate.accounts, estimate.transactions
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("{} cancelled by user", operation);
            return Ok(());
        }
    }

    let pipeline = Pipeline::new(
        chain,
        &submitter,
        builder,
        config.batching.max_accounts_per_tx,
        chain.commitment(),
    );
    let run = pipeline.claim_all(operation, &mut working).await;

    for batch in &run.completed {
        println!("Confirmed: {} accounts", batch.accounts);
        println!("Signature: {}", batch.signature);
        println!("View on Solscan: https://solscan.io/tx/{}", batch.signature);
    }

    println!(
        "\n{} complete: {} accounts done, {} remaining",
        operation,
        run.accounts_done(),
        run.remaining
    );

    match run.failure {
        Some(e) => Err(user_error(e)),
        None => Ok(()),
    }
}

fn connect(config: &Config) -> Result<RpcChain> {
    RpcChain::from_config(&config.rpc).map_err(user_error)
}

fn keypair_path() -> String {
    std::env::var("KEYPAIR_PATH").unwrap_or_else(|_| DEFAULT_KEYPAIR_PATH.to_string())
}

/// Explicit address, else the wallet in KEYPAIR_PATH
fn resolve_owner(owner: Option<&str>) -> Result<Pubkey> {
    match owner {
        Some(address) => Pubkey::from_str(address)
            .map_err(|e| anyhow::anyhow!("Invalid owner address {}: {}", address, e)),
        None => Ok(load_keypair(keypair_path()).map_err(user_error)?.pubkey()),
    }
}

fn parse_category(value: &str) -> Result<ScanCategory> {
    match value.to_ascii_lowercase().as_str() {
        "zombie" | "zombies" | "empty" => Ok(ScanCategory::Zombies),
        "spam" => Ok(ScanCategory::Spam),
        "approval" | "approvals" | "delegate" => Ok(ScanCategory::Approvals),
        other => anyhow::bail!("Unknown category '{}' (expected zombie, spam or approval)", other),
    }
}

/// Keep the detail in the log, show the short message
fn user_error(e: Error) -> anyhow::Error {
    debug!("{:?}", e);
    anyhow::anyhow!(e.user_message())
}

fn print_report<T>(report: &ScanReport<T>, line: impl Fn(&T) -> String) {
    println!("--- {} accounts: {} ---", report.category, report.len());
    for item in &report.items {
        println!("  {}", line(item));
    }
    if report.skipped > 0 {
        println!("  ({} unreadable records skipped)", report.skipped);
    }
}

fn print_quote(q: &ClaimQuote) {
    if q.accounts == 0 {
        println!();
        return;
    }
    println!(
        "  {} accounts in {} transactions: refund {} SOL, fee {} SOL, net {} SOL\n",
        q.accounts,
        q.transactions,
        format_sol(q.gross_lamports),
        format_sol(q.fee_lamports),
        format_sol(q.net_lamports)
    );
}

fn print_failure(category: ScanCategory, e: &Error) {
    error!("{} scan failed: {}", category, e);
    println!("--- {} accounts: {} ---\n", category, e.user_message());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_category() {
        assert_eq!(parse_category("zombie").unwrap(), ScanCategory::Zombies);
        assert_eq!(parse_category("Spam").unwrap(), ScanCategory::Spam);
        assert_eq!(parse_category("approvals").unwrap(), ScanCategory::Approvals);
        assert!(parse_category("everything").is_err());
    }

    #[test]
    fn test_resolve_explicit_owner() {
        let owner = Pubkey::new_unique();
        assert_eq!(resolve_owner(Some(&owner.to_string())).unwrap(), owner);
        assert!(resolve_owner(Some("nope")).is_err());
    }

    #[test]
    fn test_user_error_hides_scan_detail() {
        let err = user_error(Error::ScanFailed {
            category: ScanCategory::Spam,
            reason: "connection reset by peer".into(),
        });
        assert_eq!(err.to_string(), "Failed to scan wallet. Please try again.");
    }
}
