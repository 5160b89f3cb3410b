//! Redis-backed `KvStore`. Uses `redis`'s own async connection manager
//! (`tokio-comp` + `connection-manager` features) rather than a synchronous
//! pool, because the Session and Workflow engines have explicit async
//! suspension points at every KV call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{info, warn};

use crate::config::KvConfig;
use crate::KvStore;
use trivia_error::Error;

pub struct RedisKvStore {
    conn: ConnectionManager,
}

impl RedisKvStore {
    pub async fn connect(config: &KvConfig) -> Result<Self, Error> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| Error::external(format!("invalid redis url: {e}"), false))?;

        let conn = tokio::time::timeout(
            Duration::from_millis(config.connect_timeout_ms),
            client.get_tokio_connection_manager(),
        )
        .await
        .map_err(|_| Error::external("timed out connecting to redis", true))?
        .map_err(|e| Error::external(format!("redis connection failed: {e}"), true))?;

        info!(redis_url = %config.redis_url, "connected to redis");
        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}

fn to_external(e: redis::RedisError) -> Error {
    // Anything short of a genuine protocol/auth failure is worth retrying:
    // timeouts and connection resets are treated as transient.
    let retriable = e.is_timeout() || e.is_connection_dropped() || e.is_connection_refusal();
    Error::external(e.to_string(), retriable)
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        self.conn().get(key).await.map_err(to_external)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> Result<(), Error> {
        let mut conn = self.conn();
        match ttl_secs {
            Some(ttl) => conn.set_ex(key, value, ttl).await.map_err(to_external),
            None => conn.set(key, value).await.map_err(to_external),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, Error> {
        self.conn().hget(key, field).await.map_err(to_external)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), Error> {
        self.conn().hset(key, field, value).await.map_err(to_external)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        self.conn().hgetall(key).await.map_err(to_external)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), Error> {
        self.conn().zadd(key, member, score).await.map_err(to_external)
    }

    async fn zrevrange_with_scores(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>, Error> {
        self.conn().zrevrange_withscores(key, start, stop).await.map_err(to_external)
    }

    async fn zcard(&self, key: &str) -> Result<u64, Error> {
        self.conn().zcard(key).await.map_err(to_external)
    }

    async fn sadd(&self, key: &str, member: &str, ttl_secs: Option<u64>) -> Result<(), Error> {
        let mut conn = self.conn();
        let _: () = conn.sadd(key, member).await.map_err(to_external)?;
        if let Some(ttl) = ttl_secs {
            let _: () = conn.expire(key, ttl as i64).await.map_err(to_external)?;
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, Error> {
        self.conn().smembers(key).await.map_err(to_external)
    }

    async fn incr_with_ttl_on_create(&self, key: &str, ttl_secs: u64) -> Result<i64, Error> {
        // INCR then EXPIRE-only-on-first-create, as one Lua script so the
        // pair is atomic and a concurrent incr can't slip in between.
        let script = redis::Script::new(
            r"
            local v = redis.call('INCR', KEYS[1])
            if v == 1 then
                redis.call('EXPIRE', KEYS[1], ARGV[1])
            end
            return v
            ",
        );
        script
            .key(key)
            .arg(ttl_secs)
            .invoke_async(&mut self.conn())
            .await
            .map_err(to_external)
    }

    async fn del(&self, key: &str) -> Result<(), Error> {
        let _: () = self.conn().del(key).await.map_err(to_external)?;
        Ok(())
    }

    async fn health(&self) -> Result<Duration, Error> {
        let started = Instant::now();
        let pong: String = redis::cmd("PING").query_async(&mut self.conn()).await.map_err(|e| {
            warn!(error = %e, "redis health probe failed");
            to_external(e)
        })?;
        if pong != "PONG" {
            return Err(Error::external(format!("unexpected PING reply: {pong}"), true));
        }
        Ok(started.elapsed())
    }
}
