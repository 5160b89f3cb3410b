//! Async KV adapter: only the operations the coordination core
//! actually uses, never a generic Redis client surface. Engines depend on
//! the `KvStore` trait, not `RedisKvStore`, so tests can swap in an
//! in-memory fake without a running server.

pub mod config;
pub mod fake;
pub mod redis_store;

pub use config::KvConfig;
pub use fake::InMemoryKvStore;
pub use redis_store::RedisKvStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use trivia_error::Error;

/// Single-round-trip key-value operations. Callers must not
/// depend on cross-key atomicity — only `incr_with_ttl_on_create` is atomic,
/// and only with respect to its own key.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), Error>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, Error>;
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), Error>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, Error>;

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), Error>;
    /// Descending-score range `[start, stop]` by rank (Redis `ZREVRANGE ...
    /// WITHSCORES` semantics — inclusive, negative indices count from the
    /// bottom).
    async fn zrevrange_with_scores(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>, Error>;
    async fn zcard(&self, key: &str) -> Result<u64, Error>;

    async fn sadd(&self, key: &str, member: &str, ttl_secs: Option<u64>) -> Result<(), Error>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>, Error>;

    /// Atomic `INCR`; sets `ttl_secs` only on the call that creates the key
    /// (result `1`), so repeated calls within the window don't reset it.
    async fn incr_with_ttl_on_create(&self, key: &str, ttl_secs: u64) -> Result<i64, Error>;

    async fn del(&self, key: &str) -> Result<(), Error>;

    /// Round-trip latency of a no-op ping, for readiness/health checks.
    async fn health(&self) -> Result<Duration, Error>;
}
