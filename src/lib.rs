//! Rent Reclaimer Library
//!
//! Finds reclaimable SPL token accounts in a Solana wallet (empty, spam,
//! delegated) and builds fee-bearing batch transactions to close or revoke them.

pub mod chain;
pub mod cli;
pub mod config;
pub mod error;
pub mod reclaim;
pub mod scanner;
pub mod submit;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
