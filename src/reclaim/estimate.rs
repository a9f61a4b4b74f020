//! Refund estimates and display helpers

use serde::Serialize;

use super::batch::batch_count;
use super::builder::{FeeSchedule, Operation};
use crate::chain::constants::{LAMPORTS_PER_SOL, RENT_PER_ACCOUNT_LAMPORTS};
use crate::error::Result;

/// Estimated rent refund for closing `count` accounts at the fixed
/// per-account constant.
///
/// Display only: the real refund is whatever each account actually holds.
/// Quotes use this unless the fee schedule overrides the rent.
pub fn estimate_refund(count: usize) -> u64 {
    (count as u64).saturating_mul(RENT_PER_ACCOUNT_LAMPORTS)
}

/// What the user can expect from acting on `accounts` items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClaimQuote {
    pub operation: Operation,
    pub accounts: usize,
    pub transactions: usize,
    pub gross_lamports: u64,
    pub fee_lamports: u64,
    pub net_lamports: u64,
}

/// Quote an operation over `count` accounts split into batches of `max_per_tx`
pub fn quote(
    operation: Operation,
    count: usize,
    fees: &FeeSchedule,
    max_per_tx: usize,
) -> Result<ClaimQuote> {
    let transactions = batch_count(count, max_per_tx);
    let full = max_per_tx.max(1);

    let mut fee_lamports = 0u64;
    let mut remaining = count;
    while remaining > 0 {
        let size = remaining.min(full);
        let fee = fees.fee_for(operation, size)?.unwrap_or(0);
        fee_lamports = fee_lamports.saturating_add(fee);
        remaining -= size;
    }

    let gross_lamports = match operation {
        Operation::RevokeApproval => 0,
        _ if fees.rent_per_account_lamports == RENT_PER_ACCOUNT_LAMPORTS => estimate_refund(count),
        _ => fees.refund_for(count)?,
    };

    Ok(ClaimQuote {
        operation,
        accounts: count,
        transactions,
        gross_lamports,
        fee_lamports,
        net_lamports: gross_lamports.saturating_sub(fee_lamports),
    })
}

/// Convert lamports to SOL
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Format lamports as SOL with 4 decimals
pub fn format_sol(lamports: u64) -> String {
    format!("{:.4}", lamports_to_sol(lamports))
}

/// Rough USD value at the given SOL price
pub fn format_usd(lamports: u64, sol_price: f64) -> String {
    format!("${:.2}", lamports_to_sol(lamports) * sol_price)
}
