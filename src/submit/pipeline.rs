//! Batch-by-batch submission over a working set
//!
//! Accounts leave the working set only after their transaction is
//! confirmed. A failed batch leaves the set exactly as it was.

use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, signature::Signature};
use std::collections::HashSet;
use tracing::{info, warn};

use super::Submitter;
use crate::chain::ChainReader;
use crate::error::{Error, Result};
use crate::reclaim::{make_batches, Operation, Reclaimable, TransactionBuilder};

/// Items still waiting to be acted on, in discovery order
#[derive(Debug, Clone)]
pub struct WorkingSet<T> {
    items: Vec<T>,
}

impl<T: Reclaimable + Clone> WorkingSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current batches; recomputed after every change
    pub fn batches(&self, max_size: usize) -> Vec<Vec<T>> {
        make_batches(&self.items, max_size)
    }

    /// First batch, if any
    pub fn next_batch(&self, max_size: usize) -> Option<Vec<T>> {
        if self.items.is_empty() {
            return None;
        }
        let end = self.items.len().min(max_size.max(1));
        Some(self.items[..end].to_vec())
    }

    /// Drop the given accounts. Returns how many were removed.
    pub fn remove(&mut self, accounts: &[Pubkey]) -> usize {
        let done: HashSet<&Pubkey> = accounts.iter().collect();
        let before = self.items.len();
        self.items.retain(|item| !done.contains(&item.address()));
        before - self.items.len()
    }
}

/// One confirmed transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub signature: Signature,
    pub accounts: usize,
    pub fee_lamports: Option<u64>,
}

/// Result of running the pipeline until done or first failure
#[derive(Debug)]
pub struct ClaimRun {
    pub operation: Operation,
    pub completed: Vec<BatchOutcome>,
    pub remaining: usize,
    pub failure: Option<Error>,
}

impl ClaimRun {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.remaining == 0
    }

    pub fn accounts_done(&self) -> usize {
        self.completed.iter().map(|b| b.accounts).sum()
    }
}

/// Build → sign → send → confirm, one batch at a time
pub struct Pipeline<'a, C: ?Sized, S: ?Sized> {
    chain: &'a C,
    submitter: &'a S,
    builder: &'a TransactionBuilder,
    max_accounts_per_tx: usize,
    commitment: CommitmentConfig,
}

impl<'a, C, S> Pipeline<'a, C, S>
where
    C: ChainReader + ?Sized,
    S: Submitter + ?Sized,
{
    pub fn new(
        chain: &'a C,
        submitter: &'a S,
        builder: &'a TransactionBuilder,
        max_accounts_per_tx: usize,
        commitment: CommitmentConfig,
    ) -> Self {
        Self {
            chain,
            submitter,
            builder,
            max_accounts_per_tx,
            commitment,
        }
    }

    /// Act on the first batch of `working`. `Ok(None)` when nothing is left.
    pub async fn claim_next<T>(
        &self,
        operation: Operation,
        working: &mut WorkingSet<T>,
    ) -> Result<Option<BatchOutcome>>
    where
        T: Reclaimable + Clone + Sync,
    {
        let size = self
            .builder
            .accounts_per_tx(operation, self.max_accounts_per_tx);
        let Some(batch) = working.next_batch(size) else {
            return Ok(None);
        };

        let authority = self.submitter.pubkey();
        let claim = self
            .builder
            .build(self.chain, operation, &authority, &batch)
            .await?;
        let fee_lamports = claim.fee_lamports;
        let last_valid_block_height = claim.last_valid_block_height;
        let accounts = claim.accounts.clone();

        let signature = self.submitter.sign_and_send(claim.transaction).await?;
        self.submitter
            .confirm(&signature, self.commitment, last_valid_block_height)
            .await?;

        let removed = working.remove(&accounts);
        info!(
            "{} batch confirmed: {} accounts ({}), {} left",
            operation,
            removed,
            signature,
            working.len()
        );

        Ok(Some(BatchOutcome {
            signature,
            accounts: removed,
            fee_lamports,
        }))
    }

    /// Repeat [`claim_next`](Self::claim_next) until the set is empty or a batch fails
    pub async fn claim_all<T>(&self, operation: Operation, working: &mut WorkingSet<T>) -> ClaimRun
    where
        T: Reclaimable + Clone + Sync,
    {
        let mut completed = Vec::new();
        let failure = loop {
            match self.claim_next(operation, working).await {
                Ok(Some(outcome)) => completed.push(outcome),
                Ok(None) => break None,
                Err(e) => {
                    warn!("{} batch failed, stopping: {}", operation, e);
                    break Some(e);
                }
            }
        };

        ClaimRun {
            operation,
            completed,
            remaining: working.len(),
            failure,
        }
    }
}
