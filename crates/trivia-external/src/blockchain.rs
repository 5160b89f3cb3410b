use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use trivia_error::Error;

/// Unsigned description of the on-chain effect a Workflow step wants.
/// Opaque to this workspace beyond what `Blockchain::build_tx` needs; the
/// concrete chain decides how to interpret `kind`/`payload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxEnvelope {
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Chain interaction. Signing key material never flows through this
/// trait directly — `sign` takes a `keyRef` resolved via `SecretStore`.
#[async_trait]
pub trait Blockchain: Send + Sync {
    async fn build_tx(&self, envelope: &TxEnvelope) -> Result<Vec<u8>, Error>;
    async fn sign(&self, unsigned: Vec<u8>, key_ref: &str) -> Result<Vec<u8>, Error>;
    async fn submit(&self, signed: Vec<u8>) -> Result<String, Error>;
    async fn get_confirmations(&self, tx_hash: &str) -> Result<u32, Error>;
    async fn get_asset_fingerprint(&self, policy_id: &str, asset_name: &str) -> Result<String, Error>;
}
