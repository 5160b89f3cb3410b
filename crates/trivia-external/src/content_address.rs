use async_trait::async_trait;
use trivia_error::Error;

/// Content addressing, called from the Workflow Engine's
/// `uploadToContentAddress` step before a mint/forge transaction is built.
#[async_trait]
pub trait ContentAddressing: Send + Sync {
    /// Pins `bytes` and returns its content identifier.
    async fn pin(&self, bytes: &[u8]) -> Result<String, Error>;
}
