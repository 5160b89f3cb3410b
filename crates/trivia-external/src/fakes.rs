//! Deterministic in-memory stand-ins for the capability traits, used by
//! `#[cfg(test)]`/`#[tokio::test]` code across the workspace instead of
//! `mockall::mock!` expansions everywhere a trait is touched — a handful of
//! shared harness objects instead of mocking every call site individually.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, Month, OffsetDateTime};
use trivia_error::Error;
use trivia_types::{AnonId, CategoryId, PlayerId, Question, QuestionFlag, QuestionId, Stake};

use crate::auth::AuthClaims;
use crate::blockchain::TxEnvelope;
use crate::{Authenticator, BlobStore, Blockchain, Clock, ContentAddressing, QuestionSource, Rng, SecretStore};

/// A clock pinned to a fixed instant, advanced explicitly by tests.
pub struct FakeClock {
    nanos_since_epoch: AtomicU64,
}

impl FakeClock {
    pub fn at(now: OffsetDateTime) -> Self {
        Self { nanos_since_epoch: AtomicU64::new(now.unix_timestamp_nanos() as u64) }
    }

    pub fn advance(&self, seconds: i64) {
        let delta = (seconds * 1_000_000_000) as i64;
        let current = self.nanos_since_epoch.load(Ordering::SeqCst) as i64;
        self.nanos_since_epoch.store((current + delta) as u64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp_nanos(self.nanos_since_epoch.load(Ordering::SeqCst) as i128)
            .expect("fake clock holds a valid timestamp")
    }

    fn today(&self, tz_offset_minutes: i16) -> Date {
        let shifted = self.now() + time::Duration::minutes(tz_offset_minutes as i64);
        shifted.date()
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        let epoch = OffsetDateTime::UNIX_EPOCH
            .replace_date(time::Date::from_calendar_date(2026, Month::January, 1).unwrap());
        Self::at(epoch)
    }
}

/// A linear-congruential RNG, seeded for test reproducibility. Not
/// cryptographically strong — that's the point, tests need repeatable draws.
pub struct FakeRng {
    state: AtomicU64,
}

impl FakeRng {
    pub fn seeded(seed: u64) -> Self {
        Self { state: AtomicU64::new(seed | 1) }
    }

    fn next_u64(&self) -> u64 {
        let mut x = self.state.load(Ordering::Relaxed);
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state.store(x, Ordering::Relaxed);
        x
    }
}

impl Default for FakeRng {
    fn default() -> Self {
        Self::seeded(0x9e3779b97f4a7c15)
    }
}

#[async_trait]
impl Rng for FakeRng {
    async fn fill_bytes(&self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// A question bank backed by a fixed in-memory pool per category.
#[derive(Default)]
pub struct FakeQuestionSource {
    pool: Mutex<HashMap<CategoryId, Vec<Question>>>,
    flags: Mutex<Vec<QuestionFlag>>,
}

impl FakeQuestionSource {
    pub fn with_pool(category_id: CategoryId, questions: Vec<Question>) -> Self {
        let mut pool = HashMap::new();
        pool.insert(category_id, questions);
        Self { pool: Mutex::new(pool), flags: Mutex::new(Vec::new()) }
    }

    pub fn seed(&self, category_id: CategoryId, questions: Vec<Question>) {
        self.pool.lock().expect("pool mutex poisoned").insert(category_id, questions);
    }
}

#[async_trait]
impl QuestionSource for FakeQuestionSource {
    async fn pool_size(&self, category_id: &CategoryId) -> Result<usize, Error> {
        Ok(self
            .pool
            .lock()
            .expect("pool mutex poisoned")
            .get(category_id)
            .map(|q| q.len())
            .unwrap_or(0))
    }

    async fn draw(
        &self,
        category_id: &CategoryId,
        count: usize,
        exclude_ids: &[QuestionId],
    ) -> Result<Vec<Question>, Error> {
        let pool = self.pool.lock().expect("pool mutex poisoned");
        let candidates = pool.get(category_id).cloned().unwrap_or_default();
        let mut drawn: Vec<Question> = candidates
            .into_iter()
            .filter(|q| !exclude_ids.contains(&q.id))
            .take(count)
            .collect();
        if drawn.len() < count {
            return Err(Error::insufficient_questions());
        }
        drawn.truncate(count);
        Ok(drawn)
    }

    async fn flag(&self, question_id: &QuestionId, player_id: &PlayerId, reason: &str) -> Result<(), Error> {
        self.flags.lock().expect("flags mutex poisoned").push(QuestionFlag {
            id: uuid::Uuid::new_v4(),
            question_id: *question_id,
            player_id: *player_id,
            reason: reason.to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        });
        Ok(())
    }
}

/// An in-process blob store, keyed by string.
#[derive(Default)]
pub struct FakeBlobStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn get(&self, key: &str) -> Result<Vec<u8>, Error> {
        self.objects
            .lock()
            .expect("objects mutex poisoned")
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no blob at key {key}")))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), Error> {
        self.objects.lock().expect("objects mutex poisoned").insert(key.to_string(), bytes);
        Ok(())
    }
}

/// Content addressing that derives a CID-shaped string from a content hash
/// instead of calling out to a pinning service.
#[derive(Default)]
pub struct FakeContentAddressing {
    pin_count: AtomicU32,
}

#[async_trait]
impl ContentAddressing for FakeContentAddressing {
    async fn pin(&self, bytes: &[u8]) -> Result<String, Error> {
        let n = self.pin_count.fetch_add(1, Ordering::SeqCst);
        let checksum: u32 = bytes.iter().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u32));
        Ok(format!("bafy{checksum:08x}{n:04x}"))
    }
}

/// A blockchain stand-in that confirms every submitted transaction after a
/// fixed number of polls, so Workflow Engine tests can exercise the
/// confirmation-polling loop without real block production.
pub struct FakeBlockchain {
    confirmations_required: u32,
    polls_seen: Mutex<HashMap<String, u32>>,
    submitted: AtomicU64,
}

impl FakeBlockchain {
    pub fn new(confirmations_required: u32) -> Self {
        Self {
            confirmations_required,
            polls_seen: Mutex::new(HashMap::new()),
            submitted: AtomicU64::new(0),
        }
    }
}

impl Default for FakeBlockchain {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl Blockchain for FakeBlockchain {
    async fn build_tx(&self, envelope: &TxEnvelope) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(envelope).map_err(|e| Error::fatal(e.to_string()))?)
    }

    async fn sign(&self, unsigned: Vec<u8>, _key_ref: &str) -> Result<Vec<u8>, Error> {
        Ok(unsigned)
    }

    async fn submit(&self, _signed: Vec<u8>) -> Result<String, Error> {
        let n = self.submitted.fetch_add(1, Ordering::SeqCst);
        Ok(format!("fake-tx-{n:016x}"))
    }

    async fn get_confirmations(&self, tx_hash: &str) -> Result<u32, Error> {
        let mut seen = self.polls_seen.lock().expect("polls mutex poisoned");
        let count = seen.entry(tx_hash.to_string()).or_insert(0);
        *count += 1;
        Ok((*count).min(self.confirmations_required))
    }

    async fn get_asset_fingerprint(&self, policy_id: &str, asset_name: &str) -> Result<String, Error> {
        Ok(format!("{policy_id}.{asset_name}"))
    }
}

/// Secrets resolved from an in-memory table seeded by the test.
#[derive(Default)]
pub struct FakeSecretStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl FakeSecretStore {
    pub fn with(name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let mut values = HashMap::new();
        values.insert(name.into(), value.into());
        Self { values: Mutex::new(values) }
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn get(&self, name: &str) -> Result<Vec<u8>, Error> {
        self.values
            .lock()
            .expect("values mutex poisoned")
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("no secret named {name}")))
    }
}

/// An authenticator that echoes back whatever claims were registered for a
/// token, so tests can stand a player up without a real JWT.
#[derive(Default)]
pub struct FakeAuthenticator {
    tokens: Mutex<HashMap<String, AuthClaims>>,
}

impl FakeAuthenticator {
    pub fn register(&self, token: impl Into<String>, player_id: PlayerId, stake: Option<Stake>, anon_id: Option<AnonId>) {
        self.tokens
            .lock()
            .expect("tokens mutex poisoned")
            .insert(token.into(), AuthClaims { player_id, stake, anon_id });
    }
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn verify_token(&self, raw: &str) -> Result<AuthClaims, Error> {
        self.tokens
            .lock()
            .expect("tokens mutex poisoned")
            .get(raw)
            .cloned()
            .ok_or_else(|| Error::forbidden("token does not verify"))
    }
}
