//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::commitment_config::{CommitmentConfig, CommitmentLevel};
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

use crate::chain::constants::{
    BURN_FEE_BPS, CLAIM_FEE_LAMPORTS, DEFAULT_TREASURY_STR, MAX_ACCOUNTS_PER_TX,
    MAX_CLAIM_FEE_LAMPORTS, MAX_RENT_PER_ACCOUNT_LAMPORTS, RENT_PER_ACCOUNT_LAMPORTS,
    WRAPPED_SOL_MINT_STR,
};
use crate::error::Error;
use crate::reclaim::FeeSchedule;
use crate::scanner::ScanOptions;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub rpc: RpcConfig,
    #[serde(default)]
    pub fees: FeeConfig,
    #[serde(default)]
    pub batching: BatchConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    #[serde(default = "default_rpc_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

impl RpcConfig {
    pub fn commitment_config(&self) -> crate::error::Result<CommitmentConfig> {
        let commitment = CommitmentLevel::from_str(&self.commitment)
            .map_err(|_| Error::Config(format!("Unknown commitment level: {}", self.commitment)))?;
        Ok(CommitmentConfig { commitment })
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: default_rpc_endpoint(),
            timeout_ms: default_timeout_ms(),
            commitment: default_commitment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Fee destination
    #[serde(default = "default_treasury")]
    pub treasury: String,
    /// Flat fee per rent-reclaim transaction
    #[serde(default = "default_claim_fee")]
    pub claim_fee_lamports: u64,
    /// Burn fee as a share of the estimated refund (1500 = 15%)
    #[serde(default = "default_burn_fee_bps")]
    pub burn_fee_bps: u64,
    /// Rent assumed per account for estimates and the burn fee
    #[serde(default = "default_rent_per_account")]
    pub rent_per_account_lamports: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            treasury: default_treasury(),
            claim_fee_lamports: default_claim_fee(),
            burn_fee_bps: default_burn_fee_bps(),
            rent_per_account_lamports: default_rent_per_account(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_max_accounts_per_tx")]
    pub max_accounts_per_tx: usize,
    /// Burn leftover balances before closing spam accounts
    #[serde(default)]
    pub burn_remaining_balance: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_accounts_per_tx: default_max_accounts_per_tx(),
            burn_remaining_balance: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Excluded from zombie scans
    #[serde(default = "default_wrapped_native_mint")]
    pub wrapped_native_mint: String,
    /// Fail a scan on the first malformed record instead of skipping it
    #[serde(default)]
    pub strict_decode: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            wrapped_native_mint: default_wrapped_native_mint(),
            strict_decode: false,
        }
    }
}

fn default_rpc_endpoint() -> String {
    std::env::var("RPC_ENDPOINT").unwrap_or_else(|_| "https://api.mainnet-beta.solana.com".into())
}

fn default_timeout_ms() -> u64 {
    60_000
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_treasury() -> String {
    std::env::var("TREASURY_WALLET").unwrap_or_else(|_| DEFAULT_TREASURY_STR.into())
}

fn default_claim_fee() -> u64 {
    CLAIM_FEE_LAMPORTS
}

fn default_burn_fee_bps() -> u64 {
    BURN_FEE_BPS
}

fn default_rent_per_account() -> u64 {
    RENT_PER_ACCOUNT_LAMPORTS
}

fn default_max_accounts_per_tx() -> usize {
    MAX_ACCOUNTS_PER_TX
}

fn default_wrapped_native_mint() -> String {
    WRAPPED_SOL_MINT_STR.to_string()
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("rpc.endpoint", default_rpc_endpoint())?
            .set_default("fees.treasury", default_treasury())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix RECLAIM_)
            .add_source(
                config::Environment::with_prefix("RECLAIM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        parse_pubkey("fees.treasury", &self.fees.treasury)?;
        parse_pubkey("scan.wrapped_native_mint", &self.scan.wrapped_native_mint)?;

        if self.batching.max_accounts_per_tx == 0 {
            anyhow::bail!("max_accounts_per_tx must be positive");
        }

        // claim and burn transactions always carry exactly one fee transfer
        if self.fees.claim_fee_lamports == 0
            || self.fees.claim_fee_lamports > MAX_CLAIM_FEE_LAMPORTS
        {
            anyhow::bail!(
                "claim_fee_lamports must be between 1 and {}",
                MAX_CLAIM_FEE_LAMPORTS
            );
        }

        if self.fees.burn_fee_bps == 0 || self.fees.burn_fee_bps > 10_000 {
            anyhow::bail!("burn_fee_bps must be between 1 and 10000 (100%)");
        }

        if self.fees.rent_per_account_lamports == 0
            || self.fees.rent_per_account_lamports > MAX_RENT_PER_ACCOUNT_LAMPORTS
        {
            anyhow::bail!(
                "rent_per_account_lamports must be between 1 and {}",
                MAX_RENT_PER_ACCOUNT_LAMPORTS
            );
        }

        if self.rpc.timeout_ms == 0 {
            anyhow::bail!("rpc.timeout_ms must be positive");
        }

        self.rpc.commitment_config()?;

        if self.batching.max_accounts_per_tx > MAX_ACCOUNTS_PER_TX {
            tracing::warn!(
                "max_accounts_per_tx={} is above {}; \
                 large batches will be rejected by the size check",
                self.batching.max_accounts_per_tx,
                MAX_ACCOUNTS_PER_TX
            );
        }

        Ok(())
    }

    /// Immutable fee parameters for the transaction builder
    pub fn fee_schedule(&self) -> Result<FeeSchedule> {
        Ok(FeeSchedule {
            treasury: parse_pubkey("fees.treasury", &self.fees.treasury)?,
            claim_fee_lamports: self.fees.claim_fee_lamports,
            burn_fee_bps: self.fees.burn_fee_bps,
            rent_per_account_lamports: self.fees.rent_per_account_lamports,
        })
    }

    pub fn scan_options(&self) -> Result<ScanOptions> {
        Ok(ScanOptions {
            wrapped_native_mint: parse_pubkey(
                "scan.wrapped_native_mint",
                &self.scan.wrapped_native_mint,
            )?,
            strict_decode: self.scan.strict_decode,
        })
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  RPC:
    endpoint: {}
    timeout: {}ms
    commitment: {}
  Fees:
    treasury: {}
    claim_fee: {} lamports
    burn_fee: {}bps
    rent_per_account: {} lamports
  Batching:
    max_accounts_per_tx: {}
    burn_remaining_balance: {}
  Scan:
    wrapped_native_mint: {}
    strict_decode: {}
"#,
            mask_url(&self.rpc.endpoint),
            self.rpc.timeout_ms,
            self.rpc.commitment,
            self.fees.treasury,
            self.fees.claim_fee_lamports,
            self.fees.burn_fee_bps,
            self.fees.rent_per_account_lamports,
            self.batching.max_accounts_per_tx,
            self.batching.burn_remaining_balance,
            self.scan.wrapped_native_mint,
            self.scan.strict_decode,
        )
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {} address: {}", field, value))
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            fees: FeeConfig::default(),
            batching: BatchConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file(contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.fees.claim_fee_lamports, 5_000_000);
        assert_eq!(config.fees.burn_fee_bps, 1_500);
        assert_eq!(config.batching.max_accounts_per_tx, 20);
        assert_eq!(config.scan.wrapped_native_mint, WRAPPED_SOL_MINT_STR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let treasury = Pubkey::new_unique();
        let file = toml_file(&format!(
            r#"
[fees]
treasury = "{}"
claim_fee_lamports = 1000

[batching]
max_accounts_per_tx = 12
"#,
            treasury
        ));

        let config = Config::load(file.path()).unwrap();
        let fees = config.fee_schedule().unwrap();
        assert_eq!(fees.treasury, treasury);
        assert_eq!(fees.claim_fee_lamports, 1000);
        assert_eq!(fees.burn_fee_bps, 1_500);
        assert_eq!(config.batching.max_accounts_per_tx, 12);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load("definitely-not-here.toml").unwrap();
        assert_eq!(config.rpc.commitment, "confirmed");
    }

    #[test]
    fn test_rejects_bad_treasury() {
        let file = toml_file("[fees]\ntreasury = \"not-a-key\"\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_zero_batch() {
        let mut config = Config::default();
        config.batching.max_accounts_per_tx = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_fees() {
        let mut config = Config::default();
        config.fees.claim_fee_lamports = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fees.burn_fee_bps = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fees.rent_per_account_lamports = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_fee_inputs() {
        let mut config = Config::default();
        config.fees.rent_per_account_lamports = u64::MAX / 1_000;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fees.claim_fee_lamports = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.fees.rent_per_account_lamports = MAX_RENT_PER_ACCOUNT_LAMPORTS;
        config.fees.claim_fee_lamports = MAX_CLAIM_FEE_LAMPORTS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_oversized_rent_in_file() {
        let file = toml_file("[fees]\nrent_per_account_lamports = 18446744073709551\n");
        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn test_rejects_unknown_commitment() {
        let mut config = Config::default();
        config.rpc.commitment = "eventually".to_string();
        assert!(config.validate().is_err());
        config.rpc.commitment = "finalized".to_string();
        assert_eq!(
            config.rpc.commitment_config().unwrap(),
            CommitmentConfig::finalized()
        );
    }

    #[test]
    fn test_mask_url() {
        assert_eq!(
            mask_url("https://mainnet.helius-rpc.com/?api-key=secret"),
            "https://mainnet.helius-rpc.com/?***"
        );
        assert_eq!(
            mask_url("https://api.mainnet-beta.solana.com"),
            "https://api.mainnet-beta.solana.com"
        );
    }
}
