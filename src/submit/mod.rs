//! Signing, broadcast and confirmation
//!
//! The core never holds a private key itself. It hands a fully built,
//! unsigned transaction to a [`Submitter`], which signs, sends, and reports
//! whether the transaction landed.
//!
//! ```text
//! WorkingSet → Pipeline → TransactionBuilder → Submitter
//!     ↑                                            │
//!     └──────── remove accounts on confirm ────────┘
//! ```

pub mod keypair;
pub mod pipeline;

use async_trait::async_trait;
use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature,
    transaction::Transaction,
};

use crate::error::Result;

pub use keypair::{load_keypair, KeypairSubmitter};
pub use pipeline::{BatchOutcome, ClaimRun, Pipeline, WorkingSet};

/// Signing and submission capability
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Authority that signs and pays
    fn pubkey(&self) -> Pubkey;

    /// Sign and broadcast. Errors if the wallet refuses or the send fails.
    async fn sign_and_send(&self, transaction: Transaction) -> Result<Signature>;

    /// Wait for `signature` to reach `commitment`. Errors if it failed on-chain,
    /// or with `NotConfirmed` once the chain is past `last_valid_block_height`
    /// without it landing.
    async fn confirm(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
        last_valid_block_height: u64,
    ) -> Result<()>;
}
