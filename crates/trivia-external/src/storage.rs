use async_trait::async_trait;
use trivia_error::Error;

/// Blob storage for NFT artwork/metadata. Keys are opaque strings chosen
/// by the caller; this trait makes no assumption about bucket layout.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>, Error>;
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), Error>;
}
