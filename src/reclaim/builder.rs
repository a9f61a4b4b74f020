//! Transaction building for reclaim, burn and revoke
//!
//! Every transaction is one atomic unit: all close/revoke instructions come
//! first and the fee transfer (if any) comes last. If any close fails the
//! whole transaction fails, so the fee is only ever paid together with the
//! refund it was charged for.

use serde::Serialize;
use solana_sdk::{
    instruction::Instruction, pubkey::Pubkey, system_instruction, transaction::Transaction,
};
use std::fmt;
use tracing::debug;

use crate::chain::constants::{
    BURN_FEE_BPS, CLAIM_FEE_LAMPORTS, PACKET_DATA_SIZE, RENT_PER_ACCOUNT_LAMPORTS,
};
use crate::chain::{ChainReader, RecentBlockhash};
use crate::error::{Error, Result};
use crate::scanner::{AccountRef, DelegatedApproval, SpamItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Close empty accounts, flat fee per transaction
    ClaimRent,
    /// Close spam accounts, fee is a share of the estimated refund
    BurnSpam,
    /// Remove delegates, always free
    RevokeApproval,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ClaimRent => write!(f, "claim"),
            Operation::BurnSpam => write!(f, "burn"),
            Operation::RevokeApproval => write!(f, "revoke"),
        }
    }
}

/// Immutable fee parameters handed to the builder at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    pub treasury: Pubkey,
    pub claim_fee_lamports: u64,
    pub burn_fee_bps: u64,
    pub rent_per_account_lamports: u64,
}

impl FeeSchedule {
    /// Default fees paid to `treasury`
    pub fn new(treasury: Pubkey) -> Self {
        Self {
            treasury,
            claim_fee_lamports: CLAIM_FEE_LAMPORTS,
            burn_fee_bps: BURN_FEE_BPS,
            rent_per_account_lamports: RENT_PER_ACCOUNT_LAMPORTS,
        }
    }

    /// Estimated refund for closing `count` accounts at the configured rent
    pub fn refund_for(&self, count: usize) -> Result<u64> {
        (count as u64)
            .checked_mul(self.rent_per_account_lamports)
            .ok_or_else(|| {
                Error::TransactionBuild(format!(
                    "refund overflow: {} accounts at {} lamports",
                    count, self.rent_per_account_lamports
                ))
            })
    }

    /// Fee for one transaction over `count` accounts, `None` when free
    pub fn fee_for(&self, operation: Operation, count: usize) -> Result<Option<u64>> {
        let fee = match operation {
            Operation::ClaimRent => self.claim_fee_lamports,
            Operation::BurnSpam => {
                let refund = self.refund_for(count)? as u128;
                let fee = refund * self.burn_fee_bps as u128 / 10_000;
                u64::try_from(fee).map_err(|_| {
                    Error::TransactionBuild(format!("burn fee overflow: {} lamports", fee))
                })?
            }
            Operation::RevokeApproval => return Ok(None),
        };
        Ok((fee > 0).then_some(fee))
    }
}

/// Anything the builder can put in a batch
pub trait Reclaimable {
    /// Token account acted on
    fn address(&self) -> Pubkey;

    fn mint(&self) -> Pubkey;

    /// Raw balance to burn before closing
    fn remaining_balance(&self) -> u64 {
        0
    }
}

impl Reclaimable for AccountRef {
    fn address(&self) -> Pubkey {
        self.address
    }

    fn mint(&self) -> Pubkey {
        self.mint
    }
}

impl Reclaimable for SpamItem {
    fn address(&self) -> Pubkey {
        self.account.address
    }

    fn mint(&self) -> Pubkey {
        self.account.mint
    }

    fn remaining_balance(&self) -> u64 {
        self.raw_amount
    }
}

impl Reclaimable for DelegatedApproval {
    fn address(&self) -> Pubkey {
        self.account.address
    }

    fn mint(&self) -> Pubkey {
        self.account.mint
    }
}

/// A built, unsigned transaction and what it does
#[derive(Debug, Clone)]
pub struct UnsignedClaim {
    pub operation: Operation,
    pub transaction: Transaction,
    /// Accounts closed or revoked, in instruction order
    pub accounts: Vec<Pubkey>,
    pub fee_lamports: Option<u64>,
    /// Block height after which the transaction can never land
    pub last_valid_block_height: u64,
    /// Serialized size in bytes
    pub size: u64,
}

impl UnsignedClaim {
    pub fn instruction_count(&self) -> usize {
        self.transaction.message.instructions.len()
    }
}

/// Builds one transaction per batch
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    fees: FeeSchedule,
    burn_remaining_balance: bool,
}

impl TransactionBuilder {
    pub fn new(fees: FeeSchedule) -> Self {
        Self {
            fees,
            burn_remaining_balance: false,
        }
    }

    /// Burn leftover balances before closing spam accounts
    pub fn with_balance_burn(mut self, enabled: bool) -> Self {
        self.burn_remaining_balance = enabled;
        self
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Accounts that fit in one transaction for `operation`.
    /// Burn-then-close needs two instructions and an extra mint key per account.
    pub fn accounts_per_tx(&self, operation: Operation, max_accounts_per_tx: usize) -> usize {
        let max = max_accounts_per_tx.max(1);
        if operation == Operation::BurnSpam && self.burn_remaining_balance {
            (max / 2).max(1)
        } else {
            max
        }
    }

    /// Instruction list: one close/revoke per account, then at most one fee transfer
    pub fn instructions<T: Reclaimable>(
        &self,
        operation: Operation,
        authority: &Pubkey,
        accounts: &[T],
    ) -> Result<Vec<Instruction>> {
        if accounts.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let token_program = spl_token::id();
        let mut instructions = Vec::with_capacity(accounts.len() * 2 + 1);

        for account in accounts {
            let address = account.address();
            match operation {
                Operation::ClaimRent => {
                    instructions.push(close(&token_program, &address, authority)?);
                }
                Operation::BurnSpam => {
                    let balance = account.remaining_balance();
                    if self.burn_remaining_balance && balance > 0 {
                        instructions.push(spl_token::instruction::burn(
                            &token_program,
                            &address,
                            &account.mint(),
                            authority,
                            &[],
                            balance,
                        )?);
                    }
                    instructions.push(close(&token_program, &address, authority)?);
                }
                Operation::RevokeApproval => {
                    instructions.push(spl_token::instruction::revoke(
                        &token_program,
                        &address,
                        authority,
                        &[],
                    )?);
                }
            }
        }

        if let Some(fee) = self.fees.fee_for(operation, accounts.len())? {
            instructions.push(system_instruction::transfer(
                authority,
                &self.fees.treasury,
                fee,
            ));
        }

        Ok(instructions)
    }

    /// Assemble an unsigned transaction against a known blockhash
    pub fn assemble<T: Reclaimable>(
        &self,
        operation: Operation,
        authority: &Pubkey,
        accounts: &[T],
        recent: RecentBlockhash,
    ) -> Result<UnsignedClaim> {
        let instructions = self.instructions(operation, authority, accounts)?;
        let fee_lamports = self.fees.fee_for(operation, accounts.len())?;

        let mut transaction = Transaction::new_with_payer(&instructions, Some(authority));
        transaction.message.recent_blockhash = recent.blockhash;

        let size = bincode::serialized_size(&transaction)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        if size > PACKET_DATA_SIZE {
            return Err(Error::TransactionTooLarge {
                size,
                max: PACKET_DATA_SIZE,
            });
        }

        let claim = UnsignedClaim {
            operation,
            transaction,
            accounts: accounts.iter().map(|a| a.address()).collect(),
            fee_lamports,
            last_valid_block_height: recent.last_valid_block_height,
            size,
        };

        debug!(
            "Built {} tx: {} accounts, {} instructions, fee {:?}, {} bytes",
            operation,
            claim.accounts.len(),
            claim.instruction_count(),
            claim.fee_lamports,
            size
        );

        Ok(claim)
    }

    /// Fetch a fresh blockhash and assemble. No retries.
    pub async fn build<C, T>(
        &self,
        chain: &C,
        operation: Operation,
        authority: &Pubkey,
        accounts: &[T],
    ) -> Result<UnsignedClaim>
    where
        C: ChainReader + ?Sized,
        T: Reclaimable + Sync,
    {
        if accounts.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let recent = chain.latest_blockhash().await?;
        self.assemble(operation, authority, accounts, recent)
    }

    /// Close empty accounts and pay the flat fee
    pub async fn build_claim_tx<C: ChainReader + ?Sized>(
        &self,
        chain: &C,
        owner: &Pubkey,
        batch: &[AccountRef],
    ) -> Result<UnsignedClaim> {
        self.build(chain, Operation::ClaimRent, owner, batch).await
    }

    /// Close spam accounts and pay the percentage fee
    pub async fn build_burn_tx<C: ChainReader + ?Sized>(
        &self,
        chain: &C,
        owner: &Pubkey,
        batch: &[SpamItem],
    ) -> Result<UnsignedClaim> {
        self.build(chain, Operation::BurnSpam, owner, batch).await
    }

    /// Revoke delegates, no fee
    pub async fn build_revoke_tx<C: ChainReader + ?Sized>(
        &self,
        chain: &C,
        owner: &Pubkey,
        batch: &[DelegatedApproval],
    ) -> Result<UnsignedClaim> {
        self.build(chain, Operation::RevokeApproval, owner, batch).await
    }
}

/// Close `account`, refunding rent to `authority`
fn close(token_program: &Pubkey, account: &Pubkey, authority: &Pubkey) -> Result<Instruction> {
    Ok(spl_token::instruction::close_account(
        token_program,
        account,
        authority,
        authority,
        &[],
    )?)
}
