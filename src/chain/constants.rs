//! SPL token program layout constants and well-known addresses
//!
//! # Layout
//! A classic SPL token account is 165 bytes:
//! `mint (32) | owner (32) | amount (8) | delegate (36) | state (1) | ...`
//! The owner field therefore starts at byte 32, which is what the
//! server-side memcmp filter matches against.

use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;

/// Size of a classic (non-extension) SPL token account
pub const TOKEN_ACCOUNT_LEN: u64 = 165;

/// Byte offset of the owner field inside a token account
pub const TOKEN_ACCOUNT_OWNER_OFFSET: usize = 32;

/// Wrapped SOL mint. Zero-balance wSOL accounts are never offered for closure.
pub const WRAPPED_SOL_MINT_STR: &str = "So11111111111111111111111111111111111111112";

/// Default fee destination
pub const DEFAULT_TREASURY_STR: &str = "3LdJReJo1VxMjkNukZpZ9yanxzSXcW596eFWu9bB6Tq9";

/// Rough rent deposit held by one token account (0.002 SOL).
/// Display estimate only; the close instruction refunds the exact amount.
pub const RENT_PER_ACCOUNT_LAMPORTS: u64 = 2_000_000;

/// Flat fee for one rent-reclaim transaction (0.005 SOL)
pub const CLAIM_FEE_LAMPORTS: u64 = 5_000_000;

/// Burn fee: 15% of the estimated rent refund
pub const BURN_FEE_BPS: u64 = 1_500;

/// Config ceilings for the claim fee and the assumed rent (0.1 SOL each)
pub const MAX_CLAIM_FEE_LAMPORTS: u64 = 100_000_000;
pub const MAX_RENT_PER_ACCOUNT_LAMPORTS: u64 = 100_000_000;

/// Accounts per transaction that fit under the packet size limit
pub const MAX_ACCOUNTS_PER_TX: usize = 20;

/// Serialized transaction size limit
pub const PACKET_DATA_SIZE: u64 = solana_sdk::packet::PACKET_DATA_SIZE as u64;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

lazy_static::lazy_static! {
    /// Wrapped SOL mint as Pubkey
    pub static ref WRAPPED_SOL_MINT: Pubkey =
        Pubkey::from_str(WRAPPED_SOL_MINT_STR).expect("Invalid wrapped SOL mint");

    /// Default treasury as Pubkey
    pub static ref DEFAULT_TREASURY: Pubkey =
        Pubkey::from_str(DEFAULT_TREASURY_STR).expect("Invalid default treasury");
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::program_pack::Pack;

    #[test]
    fn test_token_account_layout() {
        assert_eq!(TOKEN_ACCOUNT_LEN as usize, spl_token::state::Account::LEN);
    }

    #[test]
    fn test_wrapped_sol_matches_spl_token() {
        assert_eq!(*WRAPPED_SOL_MINT, spl_token::native_mint::id());
    }

    #[test]
    fn test_default_treasury() {
        assert_eq!(DEFAULT_TREASURY.to_string(), DEFAULT_TREASURY_STR);
    }
}
