//! Read-only access to the chain
//!
//! Everything the scanner and transaction builder need from a node goes
//! through [`ChainReader`], so tests can swap the RPC client for fixtures.

pub mod constants;
pub mod rpc;

#[cfg(test)]
pub mod testing;

use async_trait::async_trait;
use solana_sdk::{hash::Hash, pubkey::Pubkey};

use crate::error::Result;

pub use rpc::RpcChain;

/// Program-accounts query against a token program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountQuery {
    /// Token program to query
    pub program_id: Pubkey,
    /// Matched against the owner field (memcmp at offset 32)
    pub owner: Pubkey,
    /// Exact account size, `None` to match any layout
    pub data_size: Option<u64>,
}

impl TokenAccountQuery {
    /// Owner-only query over the classic token program
    pub fn by_owner(owner: Pubkey) -> Self {
        Self {
            program_id: spl_token::id(),
            owner,
            data_size: None,
        }
    }

    /// Restrict to the standard token-account layout
    pub fn with_data_size(mut self, size: u64) -> Self {
        self.data_size = Some(size);
        self
    }
}

/// One account returned by a program-accounts query
#[derive(Debug, Clone)]
pub struct RawTokenAccount {
    pub pubkey: Pubkey,
    /// Account size in bytes
    pub space: u64,
    /// Node-parsed JSON (`{"type": ..., "info": ...}`); `None` when the node
    /// returned binary data it could not parse
    pub parsed: Option<serde_json::Value>,
}

/// Blockhash plus the last block height at which it is valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentBlockhash {
    pub blockhash: Hash,
    pub last_valid_block_height: u64,
}

/// Read-only chain queries used by the core
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// All token accounts matching the query, in node order
    async fn token_accounts(&self, query: &TokenAccountQuery) -> Result<Vec<RawTokenAccount>>;

    /// Fresh blockhash for a new transaction
    async fn latest_blockhash(&self) -> Result<RecentBlockhash>;
}
