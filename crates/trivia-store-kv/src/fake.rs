//! In-memory `KvStore` for unit/integration tests that don't want a running
//! Redis instance. Lives beside the concrete adapter rather than in
//! `trivia-external::fakes` so this crate doesn't need `trivia-external` as
//! a dependency just to define its own trait's test double.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use trivia_error::Error;

use crate::KvStore;

#[derive(Default)]
struct State {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sorted_sets: HashMap<String, HashMap<String, f64>>,
    sets: HashMap<String, HashSet<String>>,
    counters: HashMap<String, i64>,
}

/// TTLs are accepted but not enforced — nothing in this fake expires a key.
/// Tests that need expiry semantics exercise them against
/// `RedisKvStore` + a real Redis instead.
#[derive(Default)]
pub struct InMemoryKvStore {
    state: Mutex<State>,
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.state.lock().expect("kv mutex poisoned").strings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str, _ttl_secs: Option<u64>) -> Result<(), Error> {
        self.state.lock().expect("kv mutex poisoned").strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, Error> {
        Ok(self
            .state
            .lock()
            .expect("kv mutex poisoned")
            .hashes
            .get(key)
            .and_then(|h| h.get(field))
            .cloned())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), Error> {
        self.state
            .lock()
            .expect("kv mutex poisoned")
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, Error> {
        Ok(self.state.lock().expect("kv mutex poisoned").hashes.get(key).cloned().unwrap_or_default())
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), Error> {
        self.state
            .lock()
            .expect("kv mutex poisoned")
            .sorted_sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrevrange_with_scores(&self, key: &str, start: isize, stop: isize) -> Result<Vec<(String, f64)>, Error> {
        let state = self.state.lock().expect("kv mutex poisoned");
        let Some(set) = state.sorted_sets.get(key) else { return Ok(Vec::new()) };
        let mut entries: Vec<(String, f64)> = set.iter().map(|(m, s)| (m.clone(), *s)).collect();
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
        let len = entries.len() as isize;
        let norm = |i: isize| -> usize {
            if i < 0 {
                (len + i).max(0) as usize
            } else {
                i.min(len) as usize
            }
        };
        let from = norm(start);
        let to = if stop < 0 { norm(stop + 1) } else { (stop as usize + 1).min(entries.len()) };
        if from >= to {
            return Ok(Vec::new());
        }
        Ok(entries[from..to].to_vec())
    }

    async fn zcard(&self, key: &str) -> Result<u64, Error> {
        Ok(self.state.lock().expect("kv mutex poisoned").sorted_sets.get(key).map(|s| s.len() as u64).unwrap_or(0))
    }

    async fn sadd(&self, key: &str, member: &str, _ttl_secs: Option<u64>) -> Result<(), Error> {
        self.state
            .lock()
            .expect("kv mutex poisoned")
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .state
            .lock()
            .expect("kv mutex poisoned")
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn incr_with_ttl_on_create(&self, key: &str, _ttl_secs: u64) -> Result<i64, Error> {
        let mut state = self.state.lock().expect("kv mutex poisoned");
        let counter = state.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn del(&self, key: &str) -> Result<(), Error> {
        let mut state = self.state.lock().expect("kv mutex poisoned");
        state.strings.remove(key);
        state.hashes.remove(key);
        state.sorted_sets.remove(key);
        state.sets.remove(key);
        state.counters.remove(key);
        Ok(())
    }

    async fn health(&self) -> Result<Duration, Error> {
        Ok(Duration::from_micros(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zrevrange_returns_descending_score_order() {
        let kv = InMemoryKvStore::default();
        kv.zadd("ladder", "alice", 30.0).await.unwrap();
        kv.zadd("ladder", "bob", 50.0).await.unwrap();
        kv.zadd("ladder", "carol", 10.0).await.unwrap();

        let page = kv.zrevrange_with_scores("ladder", 0, 1).await.unwrap();
        assert_eq!(page, vec![("bob".to_string(), 50.0), ("alice".to_string(), 30.0)]);
    }

    #[tokio::test]
    async fn incr_with_ttl_on_create_is_monotonic() {
        let kv = InMemoryKvStore::default();
        assert_eq!(kv.incr_with_ttl_on_create("limit:daily:x", 86_400).await.unwrap(), 1);
        assert_eq!(kv.incr_with_ttl_on_create("limit:daily:x", 86_400).await.unwrap(), 2);
    }
}
