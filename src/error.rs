//! Error types for the wallet cleaner

use thiserror::Error;

use crate::scanner::ScanCategory;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the wallet cleaner
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    // RPC errors
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),

    // Scan errors
    #[error("{category} scan failed: {reason}")]
    ScanFailed {
        category: ScanCategory,
        reason: String,
    },

    #[error("Malformed token account {account}: {reason}")]
    MalformedAccount { account: String, reason: String },

    // Build errors
    #[error("Refusing to build a transaction for an empty batch")]
    EmptyBatch,

    #[error("Transaction build failed: {0}")]
    TransactionBuild(String),

    #[error("Transaction too large: {size} bytes exceeds {max} byte limit")]
    TransactionTooLarge { size: u64, max: u64 },

    // Submission errors
    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Transaction send failed: {0}")]
    TransactionSend(String),

    #[error("Transaction {signature} failed on-chain: {reason}")]
    ConfirmationFailed { signature: String, reason: String },

    #[error("Transaction {0} was not confirmed before its blockhash expired")]
    NotConfirmed(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    // Generic errors
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Query failed or returned data we could not trust
    pub fn is_scan_failure(&self) -> bool {
        matches!(
            self,
            Error::ScanFailed { .. } | Error::MalformedAccount { .. } | Error::MalformedResponse(_)
        )
    }

    /// Nothing was handed to the wallet
    pub fn is_build_failure(&self) -> bool {
        matches!(
            self,
            Error::EmptyBatch | Error::TransactionBuild(_) | Error::TransactionTooLarge { .. }
        )
    }

    /// Signing, broadcast or confirmation failed; the working set is untouched
    pub fn is_submission_failure(&self) -> bool {
        matches!(
            self,
            Error::Signing(_)
                | Error::TransactionSend(_)
                | Error::ConfirmationFailed { .. }
                | Error::NotConfirmed(_)
        )
    }

    /// Message shown to the user at the CLI boundary
    pub fn user_message(&self) -> String {
        if self.is_scan_failure() {
            "Failed to scan wallet. Please try again.".to_string()
        } else if self.is_build_failure() {
            format!("Could not prepare the transaction: {}", self)
        } else if self.is_submission_failure() {
            format!("Claim failed, nothing was changed: {}", self)
        } else {
            self.to_string()
        }
    }
}

// Conversion from solana_client errors
impl From<solana_client::client_error::ClientError> for Error {
    fn from(e: solana_client::client_error::ClientError) -> Self {
        Error::Rpc(e.to_string())
    }
}

// Instruction constructors in spl-token return ProgramError
impl From<solana_sdk::program_error::ProgramError> for Error {
    fn from(e: solana_sdk::program_error::ProgramError) -> Self {
        Error::TransactionBuild(e.to_string())
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

// Conversion from I/O errors
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_failure_message() {
        let err = Error::ScanFailed {
            category: ScanCategory::Zombies,
            reason: "429 Too Many Requests".to_string(),
        };
        assert!(err.is_scan_failure());
        assert!(!err.is_submission_failure());
        assert_eq!(err.user_message(), "Failed to scan wallet. Please try again.");
    }

    #[test]
    fn test_taxonomy_is_disjoint() {
        let build = Error::EmptyBatch;
        assert!(build.is_build_failure());
        assert!(!build.is_scan_failure());

        let send = Error::TransactionSend("blockhash not found".to_string());
        assert!(send.is_submission_failure());
        assert!(!send.is_build_failure());
        assert!(send.user_message().contains("nothing was changed"));
    }
}
