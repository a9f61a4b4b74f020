//! JSON-RPC backed [`ChainReader`]

use async_trait::async_trait;
use serde_json::json;
use solana_account_decoder::{UiAccountData, UiAccountEncoding};
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, RpcFilterType},
    rpc_request::RpcRequest,
    rpc_response::RpcKeyedAccount,
};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey, transaction::Transaction};
use std::{str::FromStr, sync::Arc, time::Duration};
use tracing::debug;

use super::constants::TOKEN_ACCOUNT_OWNER_OFFSET;
use super::{ChainReader, RawTokenAccount, RecentBlockhash, TokenAccountQuery};
use crate::config::RpcConfig;
use crate::error::{Error, Result};

/// Chain reader over a nonblocking RPC client
pub struct RpcChain {
    client: Arc<RpcClient>,
    commitment: CommitmentConfig,
}

impl RpcChain {
    pub fn new(client: Arc<RpcClient>, commitment: CommitmentConfig) -> Self {
        Self { client, commitment }
    }

    /// Build a client from the `[rpc]` config section
    pub fn from_config(config: &RpcConfig) -> Result<Self> {
        let commitment = config.commitment_config()?;
        let client = RpcClient::new_with_timeout_and_commitment(
            config.endpoint.clone(),
            Duration::from_millis(config.timeout_ms),
            commitment,
        );
        Ok(Self::new(Arc::new(client), commitment))
    }

    /// Shared handle to the underlying client (used by the submitter)
    pub fn client(&self) -> Arc<RpcClient> {
        self.client.clone()
    }

    pub fn commitment(&self) -> CommitmentConfig {
        self.commitment
    }

    /// Simulate an unsigned transaction. Returns the program error, if any.
    pub async fn simulate(&self, transaction: &Transaction) -> Result<Option<String>> {
        let result = self
            .client
            .simulate_transaction(transaction)
            .await
            .map_err(|e| Error::TransactionBuild(format!("Simulation failed: {}", e)))?;

        if let Some(logs) = &result.value.logs {
            for line in logs {
                debug!("sim: {}", line);
            }
        }

        Ok(result.value.err.map(|e| e.to_string()))
    }

    /// Node version, used as a cheap liveness check
    pub async fn version(&self) -> Result<String> {
        let version = self.client.get_version().await?;
        Ok(version.solana_core)
    }

    fn filters(query: &TokenAccountQuery) -> Vec<RpcFilterType> {
        let mut filters = Vec::with_capacity(2);
        if let Some(size) = query.data_size {
            filters.push(RpcFilterType::DataSize(size));
        }
        filters.push(RpcFilterType::Memcmp(Memcmp::new_base58_encoded(
            TOKEN_ACCOUNT_OWNER_OFFSET,
            query.owner.as_ref(),
        )));
        filters
    }
}

#[async_trait]
impl ChainReader for RpcChain {
    async fn token_accounts(&self, query: &TokenAccountQuery) -> Result<Vec<RawTokenAccount>> {
        let config = RpcProgramAccountsConfig {
            filters: Some(Self::filters(query)),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::JsonParsed),
                commitment: Some(self.commitment),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };

        // The typed get_program_accounts helpers cannot return jsonParsed data,
        // so issue the request directly.
        let keyed: Vec<RpcKeyedAccount> = self
            .client
            .send(
                RpcRequest::GetProgramAccounts,
                json!([query.program_id.to_string(), config]),
            )
            .await?;

        debug!(
            "getProgramAccounts owner={} size={:?} -> {} accounts",
            query.owner,
            query.data_size,
            keyed.len()
        );

        keyed
            .into_iter()
            .map(|account| {
                let pubkey = Pubkey::from_str(&account.pubkey).map_err(|e| {
                    Error::MalformedResponse(format!("bad pubkey {}: {}", account.pubkey, e))
                })?;
                let (space, parsed) = match account.account.data {
                    UiAccountData::Json(parsed) => (parsed.space, Some(parsed.parsed)),
                    _ => (account.account.space.unwrap_or_default(), None),
                };
                Ok(RawTokenAccount {
                    pubkey,
                    space,
                    parsed,
                })
            })
            .collect()
    }

    async fn latest_blockhash(&self) -> Result<RecentBlockhash> {
        let (blockhash, last_valid_block_height) = self
            .client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await
            .map_err(|e| Error::TransactionBuild(format!("Failed to get blockhash: {}", e)))?;

        Ok(RecentBlockhash {
            blockhash,
            last_valid_block_height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zombie_query_filters() {
        let owner = Pubkey::new_unique();
        let query = TokenAccountQuery::by_owner(owner).with_data_size(165);
        let filters = RpcChain::filters(&query);

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], RpcFilterType::DataSize(165));
        assert_eq!(
            filters[1],
            RpcFilterType::Memcmp(Memcmp::new_base58_encoded(32, owner.as_ref()))
        );
    }

    #[test]
    fn test_owner_only_query_has_no_size_filter() {
        let query = TokenAccountQuery::by_owner(Pubkey::new_unique());
        let filters = RpcChain::filters(&query);
        assert_eq!(filters.len(), 1);
        assert!(matches!(filters[0], RpcFilterType::Memcmp(_)));
    }
}
