//! Local keypair submitter
//!
//! Signs with a keypair file on disk and submits over RPC.

use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::Transaction,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::Submitter;
use crate::error::{Error, Result};

/// Load a JSON byte-array keypair (solana-keygen format).
///
/// Refuses files readable by group or others on Unix.
pub fn load_keypair<P: AsRef<Path>>(path: P) -> Result<Keypair> {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(path)
            .map_err(|e| Error::InvalidKeypair(format!("Cannot read {}: {}", path.display(), e)))?
            .permissions()
            .mode();
        if mode & 0o077 != 0 {
            return Err(Error::InvalidKeypair(format!(
                "{} has insecure permissions {:o}, run 'chmod 600 {}'",
                path.display(),
                mode & 0o777,
                path.display()
            )));
        }
    }

    let data = std::fs::read_to_string(path)?;
    let secret: Vec<u8> = serde_json::from_str(&data)
        .map_err(|e| Error::InvalidKeypair(format!("{}: {}", path.display(), e)))?;
    Keypair::from_bytes(&secret).map_err(|e| Error::InvalidKeypair(e.to_string()))
}

/// Submitter backed by a local keypair
pub struct KeypairSubmitter {
    client: Arc<RpcClient>,
    keypair: Keypair,
}

impl KeypairSubmitter {
    pub fn new(client: Arc<RpcClient>, keypair: Keypair) -> Self {
        Self { client, keypair }
    }

    /// Balance of the signing wallet in lamports
    pub async fn balance(&self) -> Result<u64> {
        self.client
            .get_balance(&self.keypair.pubkey())
            .await
            .map_err(|e| Error::Rpc(format!("Failed to get balance: {}", e)))
    }
}

#[async_trait]
impl Submitter for KeypairSubmitter {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_and_send(&self, mut transaction: Transaction) -> Result<Signature> {
        let payer = transaction.message.account_keys.first().copied();
        if payer != Some(self.keypair.pubkey()) {
            return Err(Error::Signing(format!(
                "transaction fee payer {:?} is not the loaded wallet {}",
                payer,
                self.keypair.pubkey()
            )));
        }

        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| Error::Signing(e.to_string()))?;

        let signature = self
            .client
            .send_transaction(&transaction)
            .await
            .map_err(|e| Error::TransactionSend(e.to_string()))?;

        debug!("Sent transaction {}", signature);
        Ok(signature)
    }

    async fn confirm(
        &self,
        signature: &Signature,
        commitment: CommitmentConfig,
        last_valid_block_height: u64,
    ) -> Result<()> {
        let mut rpc_failures = 0;
        loop {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, commitment)
                .await;

            match status {
                Ok(Some(Ok(()))) => {
                    info!("Confirmed {}", signature);
                    return Ok(());
                }
                Ok(Some(Err(e))) => {
                    return Err(Error::ConfirmationFailed {
                        signature: signature.to_string(),
                        reason: e.to_string(),
                    });
                }
                Ok(None) => rpc_failures = 0,
                Err(e) => {
                    rpc_failures += 1;
                    warn!("Status check for {} failed: {}", signature, e);
                    if rpc_failures >= MAX_RPC_FAILURES {
                        return Err(Error::Rpc(format!(
                            "Lost track of {} after {} failed status checks: {}",
                            signature, rpc_failures, e
                        )));
                    }
                }
            }

            // Only give up once the blockhash can no longer be processed
            match self.client.get_block_height_with_commitment(commitment).await {
                Ok(height) if blockhash_expired(height, last_valid_block_height) => {
                    return Err(Error::NotConfirmed(signature.to_string()));
                }
                Ok(height) => debug!(
                    "{} pending at block height {}/{}",
                    signature, height, last_valid_block_height
                ),
                Err(e) => warn!("Block height check failed: {}", e),
            }

            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }
}

/// Consecutive failed status RPCs before confirmation gives up
const MAX_RPC_FAILURES: u32 = 10;

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A transaction can still land while the chain has not passed its
/// blockhash's last valid height.
fn blockhash_expired(block_height: u64, last_valid_block_height: u64) -> bool {
    block_height > last_valid_block_height
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_keypair(dir: &Path, keypair: &Keypair, mode: u32) -> std::path::PathBuf {
        let path = dir.join("keypair.json");
        let json = serde_json::to_string(&keypair.to_bytes().to_vec()).unwrap();
        std::fs::write(&path, json).unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        }
        #[cfg(not(unix))]
        let _ = mode;

        path
    }

    #[test]
    fn test_load_keypair() {
        let dir = tempdir().unwrap();
        let keypair = Keypair::new();
        let path = write_keypair(dir.path(), &keypair, 0o600);

        let loaded = load_keypair(&path).unwrap();
        assert_eq!(loaded.pubkey(), keypair.pubkey());
    }

    #[cfg(unix)]
    #[test]
    fn test_world_readable_keypair_is_refused() {
        let dir = tempdir().unwrap();
        let path = write_keypair(dir.path(), &Keypair::new(), 0o644);

        let err = load_keypair(&path).unwrap_err();
        assert!(matches!(err, Error::InvalidKeypair(_)));
    }

    #[test]
    fn test_garbage_keypair() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keypair.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).unwrap();
        }

        assert!(load_keypair(&path).is_err());
    }

    #[test]
    fn test_blockhash_expiry_boundary() {
        assert!(!blockhash_expired(999, 1_000));
        assert!(!blockhash_expired(1_000, 1_000));
        assert!(blockhash_expired(1_001, 1_000));
    }

    #[tokio::test]
    async fn test_refuses_foreign_fee_payer() {
        let client = Arc::new(RpcClient::new("http://127.0.0.1:1".to_string()));
        let submitter = KeypairSubmitter::new(client, Keypair::new());

        let other = Pubkey::new_unique();
        let ix = solana_sdk::system_instruction::transfer(&other, &Pubkey::new_unique(), 1);
        let tx = Transaction::new_with_payer(&[ix], Some(&other));

        let err = submitter.sign_and_send(tx).await.unwrap_err();
        assert!(matches!(err, Error::Signing(_)));
    }
}
