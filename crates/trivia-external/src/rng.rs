use async_trait::async_trait;

/// Cryptographically strong randomness, used for hex ids, anon ids, and
/// question-order shuffles. `#[async_trait]` even though most backends are
/// synchronous, so a KMS-backed or remote RNG can be dropped in later
/// without changing call sites.
#[async_trait]
pub trait Rng: Send + Sync {
    /// Fill `buf` with random bytes.
    async fn fill_bytes(&self, buf: &mut [u8]);

    async fn random_u32(&self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf).await;
        u32::from_le_bytes(buf)
    }
}

/// In-place Fisher-Yates shuffle built on `Rng::random_u32`, used by
/// `QuestionSource` callers to randomize draw order without leaking it
/// through iteration order. A free function, not a trait method, so `Rng`
/// stays object-safe and engines can hold `Arc<dyn Rng>`.
pub async fn shuffle<T: Send>(rng: &dyn Rng, items: &mut [T]) {
    let len = items.len();
    for i in (1..len).rev() {
        let j = (rng.random_u32().await as usize) % (i + 1);
        items.swap(i, j);
    }
}
