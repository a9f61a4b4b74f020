//! Account classifier
//!
//! Scans a wallet's token accounts and sorts them into three independent
//! categories:
//! - zombies: empty accounts whose rent can be reclaimed
//! - spam: non-empty token and NFT dust that can be burned and closed
//! - approvals: accounts with an active third-party delegate
//!
//! Each category is its own query. A failed query fails that category only;
//! partial results are never returned as a success. Nothing is cached, the
//! caller invokes [`Scanner::rescan`] whenever it wants fresh state.

pub mod classify;
pub mod parsed;
pub mod types;

use chrono::{DateTime, Utc};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chain::constants::{TOKEN_ACCOUNT_LEN, WRAPPED_SOL_MINT};
use crate::chain::{ChainReader, TokenAccountQuery};
use crate::error::{Error, Result};
use parsed::DecodedTokenAccount;

pub use types::{select_dust, AccountRef, DelegatedApproval, SpamItem, SpamKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanCategory {
    Zombies,
    Spam,
    Approvals,
}

impl fmt::Display for ScanCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanCategory::Zombies => write!(f, "zombie"),
            ScanCategory::Spam => write!(f, "spam"),
            ScanCategory::Approvals => write!(f, "approval"),
        }
    }
}

/// Result of one category scan
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport<T> {
    pub category: ScanCategory,
    #[serde(serialize_with = "pubkey_string")]
    pub owner: Pubkey,
    pub items: Vec<T>,
    /// Records dropped because they could not be decoded
    pub skipped: usize,
    pub scanned_at: DateTime<Utc>,
}

impl<T> ScanReport<T> {
    /// Scan succeeded and found nothing to act on
    pub fn is_clean(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One independent outcome per category
#[derive(Debug)]
pub struct WalletScan {
    pub zombies: Result<ScanReport<AccountRef>>,
    pub spam: Result<ScanReport<SpamItem>>,
    pub approvals: Result<ScanReport<DelegatedApproval>>,
}

impl WalletScan {
    /// Every category scanned successfully and came back empty
    pub fn is_clean(&self) -> bool {
        matches!(&self.zombies, Ok(r) if r.is_clean())
            && matches!(&self.spam, Ok(r) if r.is_clean())
            && matches!(&self.approvals, Ok(r) if r.is_clean())
    }
}

/// Scanner settings, resolved from `[scan]` config
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Never offered for closure, even at zero balance
    pub wrapped_native_mint: Pubkey,
    /// Fail the category on a malformed record instead of skipping it
    pub strict_decode: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            wrapped_native_mint: *WRAPPED_SOL_MINT,
            strict_decode: false,
        }
    }
}

/// Wallet scanner over any [`ChainReader`]
pub struct Scanner<C: ChainReader> {
    chain: Arc<C>,
    options: ScanOptions,
}

impl<C: ChainReader> Scanner<C> {
    pub fn new(chain: Arc<C>, options: ScanOptions) -> Self {
        Self { chain, options }
    }

    /// Empty token accounts (standard 165-byte layout only)
    pub async fn scan_zombies(&self, owner: &Pubkey) -> Result<ScanReport<AccountRef>> {
        let query = TokenAccountQuery::by_owner(*owner).with_data_size(TOKEN_ACCOUNT_LEN);
        let (accounts, skipped) = self.fetch(ScanCategory::Zombies, &query).await?;
        let items = classify::zombies(&accounts, &self.options.wrapped_native_mint);
        Ok(self.report(ScanCategory::Zombies, owner, items, skipped))
    }

    /// Non-empty token and NFT accounts
    pub async fn scan_spam(&self, owner: &Pubkey) -> Result<ScanReport<SpamItem>> {
        let query = TokenAccountQuery::by_owner(*owner);
        let (accounts, skipped) = self.fetch(ScanCategory::Spam, &query).await?;
        let items = classify::spam(&accounts);
        Ok(self.report(ScanCategory::Spam, owner, items, skipped))
    }

    /// Accounts with a delegate other than the owner
    pub async fn scan_approvals(&self, owner: &Pubkey) -> Result<ScanReport<DelegatedApproval>> {
        let query = TokenAccountQuery::by_owner(*owner);
        let (accounts, skipped) = self.fetch(ScanCategory::Approvals, &query).await?;
        let items = classify::approvals(&accounts, owner);
        Ok(self.report(ScanCategory::Approvals, owner, items, skipped))
    }

    /// Run all three scans, one after another
    pub async fn rescan(&self, owner: &Pubkey) -> WalletScan {
        info!("Scanning wallet {}", owner);
        WalletScan {
            zombies: self.scan_zombies(owner).await,
            spam: self.scan_spam(owner).await,
            approvals: self.scan_approvals(owner).await,
        }
    }

    async fn fetch(
        &self,
        category: ScanCategory,
        query: &TokenAccountQuery,
    ) -> Result<(Vec<DecodedTokenAccount>, usize)> {
        let raw = self
            .chain
            .token_accounts(query)
            .await
            .map_err(|e| Error::ScanFailed {
                category,
                reason: e.to_string(),
            })?;

        let mut decoded = Vec::with_capacity(raw.len());
        let mut skipped = 0;

        for account in &raw {
            match parsed::decode(account) {
                Ok(Some(account)) => decoded.push(account),
                Ok(None) => debug!("{}: not a token account, ignoring", account.pubkey),
                Err(e) if self.options.strict_decode => {
                    return Err(Error::ScanFailed {
                        category,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            warn!(
                "{} scan skipped {} of {} records that could not be decoded",
                category,
                skipped,
                raw.len()
            );
        }

        Ok((decoded, skipped))
    }

    fn report<T>(
        &self,
        category: ScanCategory,
        owner: &Pubkey,
        items: Vec<T>,
        skipped: usize,
    ) -> ScanReport<T> {
        info!("{} scan for {}: {} found", category, owner, items.len());
        ScanReport {
            category,
            owner: *owner,
            items,
            skipped,
            scanned_at: Utc::now(),
        }
    }
}

fn pubkey_string<S>(pubkey: &Pubkey, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_str(pubkey)
}
