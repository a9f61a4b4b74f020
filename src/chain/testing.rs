//! In-memory chain fixtures for unit tests

use async_trait::async_trait;
use serde_json::{json, Value};
use solana_sdk::{hash::Hash, pubkey::Pubkey};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::constants::TOKEN_ACCOUNT_LEN;
use super::{ChainReader, RawTokenAccount, RecentBlockhash, TokenAccountQuery};
use crate::error::{Error, Result};

/// Token account fixture in the node's jsonParsed shape
#[derive(Debug, Clone)]
pub struct FixtureAccount {
    pub pubkey: Pubkey,
    pub owner: Pubkey,
    pub mint: Pubkey,
    pub amount: u64,
    pub decimals: u8,
    pub delegate: Option<Pubkey>,
    pub delegated_amount: Option<u64>,
    pub space: u64,
}

impl FixtureAccount {
    pub fn new(owner: Pubkey, mint: Pubkey, amount: u64, decimals: u8) -> Self {
        Self {
            pubkey: Pubkey::new_unique(),
            owner,
            mint,
            amount,
            decimals,
            delegate: None,
            delegated_amount: None,
            space: TOKEN_ACCOUNT_LEN,
        }
    }

    pub fn empty(owner: Pubkey) -> Self {
        Self::new(owner, Pubkey::new_unique(), 0, 6)
    }

    pub fn with_delegate(mut self, delegate: Pubkey, amount: u64) -> Self {
        self.delegate = Some(delegate);
        self.delegated_amount = Some(amount);
        self
    }

    pub fn with_space(mut self, space: u64) -> Self {
        self.space = space;
        self
    }

    pub fn parsed(&self) -> Value {
        let ui = self.amount as f64 / 10f64.powi(self.decimals as i32);
        let mut info = json!({
            "isNative": false,
            "mint": self.mint.to_string(),
            "owner": self.owner.to_string(),
            "state": "initialized",
            "tokenAmount": {
                "amount": self.amount.to_string(),
                "decimals": self.decimals,
                "uiAmount": ui,
                "uiAmountString": ui.to_string(),
            },
        });
        if let Some(delegate) = self.delegate {
            info["delegate"] = json!(delegate.to_string());
            info["delegatedAmount"] = json!({
                "amount": self.delegated_amount.unwrap_or_default().to_string(),
                "decimals": self.decimals,
                "uiAmount": 0.0,
                "uiAmountString": "0",
            });
        }
        json!({ "type": "account", "info": info })
    }

    fn raw(&self) -> RawTokenAccount {
        RawTokenAccount {
            pubkey: self.pubkey,
            space: self.space,
            parsed: Some(self.parsed()),
        }
    }
}

/// Serves fixtures and applies the filters a node would
#[derive(Default)]
pub struct FakeChain {
    pub accounts: Vec<FixtureAccount>,
    /// Raw records returned verbatim for every owner (malformed-data tests)
    pub raw_extra: Vec<RawTokenAccount>,
    pub fail_queries: bool,
    pub fail_blockhash: bool,
    pub blockhash: Hash,
    pub queries: AtomicUsize,
}

impl FakeChain {
    pub fn with_accounts(accounts: Vec<FixtureAccount>) -> Self {
        Self {
            accounts,
            blockhash: Hash::new_unique(),
            ..Self::default()
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn token_accounts(&self, query: &TokenAccountQuery) -> Result<Vec<RawTokenAccount>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries {
            return Err(Error::Rpc("HTTP status client error (429 Too Many Requests)".into()));
        }

        let mut out: Vec<RawTokenAccount> = self
            .accounts
            .iter()
            .filter(|a| a.owner == query.owner)
            .filter(|a| query.data_size.map_or(true, |size| a.space == size))
            .map(FixtureAccount::raw)
            .collect();
        out.extend(self.raw_extra.iter().cloned());
        Ok(out)
    }

    async fn latest_blockhash(&self) -> Result<RecentBlockhash> {
        if self.fail_blockhash {
            return Err(Error::TransactionBuild("Failed to get blockhash: timed out".into()));
        }
        Ok(RecentBlockhash {
            blockhash: self.blockhash,
            last_valid_block_height: 1_000,
        })
    }
}
