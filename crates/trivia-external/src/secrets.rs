use async_trait::async_trait;
use trivia_error::Error;

/// Secret material access. Rotation (e.g. every 90 days) is an
/// operational policy enforced by whatever implements this, not a contract
/// this trait encodes.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<Vec<u8>, Error>;
}
