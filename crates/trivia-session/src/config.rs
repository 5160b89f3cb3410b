//! Session Engine tunables: a typed config struct threaded to the Session
//! Engine and Ledger at startup, not a process-wide singleton.
//!
//! [`SessionConfig::load`] layers an optional `session.toml` under
//! `SESSION_`-prefixed environment variables, the same source order
//! `onsocial-relayer`'s binary builds its own `Config` from.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "defaults::daily_cap_connected")]
    pub daily_cap_connected: u32,

    /// Guests get a lower cap than connected players; the exact value is
    /// left to deployment tuning.
    #[serde(default = "defaults::daily_cap_guest")]
    pub daily_cap_guest: u32,

    #[serde(default = "defaults::cooldown_secs")]
    pub cooldown_secs: i64,

    #[serde(default = "defaults::lock_ttl_secs")]
    pub lock_ttl_secs: u64,

    #[serde(default = "defaults::hot_state_ttl_secs")]
    pub hot_state_ttl_secs: u64,

    #[serde(default = "defaults::seen_ttl_secs")]
    pub seen_ttl_secs: u64,

    #[serde(default = "defaults::answer_timeout_ms")]
    pub answer_timeout_ms: u32,

    /// Draw split kicks in once the category's pool reaches this size.
    #[serde(default = "defaults::large_pool_threshold")]
    pub large_pool_threshold: usize,

    /// Fraction of the ten draw slots filled from the "reused" bucket once
    /// the pool is large enough to split.
    #[serde(default = "defaults::reused_ratio")]
    pub reused_ratio: f64,

    /// Minutes east of UTC used to compute local-midnight TTLs for the
    /// daily cap and `seen` namespaces.
    #[serde(default = "defaults::tz_offset_minutes")]
    pub tz_offset_minutes: i16,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            daily_cap_connected: defaults::daily_cap_connected(),
            daily_cap_guest: defaults::daily_cap_guest(),
            cooldown_secs: defaults::cooldown_secs(),
            lock_ttl_secs: defaults::lock_ttl_secs(),
            hot_state_ttl_secs: defaults::hot_state_ttl_secs(),
            seen_ttl_secs: defaults::seen_ttl_secs(),
            answer_timeout_ms: defaults::answer_timeout_ms(),
            large_pool_threshold: defaults::large_pool_threshold(),
            reused_ratio: defaults::reused_ratio(),
            tz_offset_minutes: defaults::tz_offset_minutes(),
        }
    }
}

impl SessionConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("session").required(false))
            .add_source(config::Environment::with_prefix("SESSION"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn daily_cap_connected() -> u32 {
        10
    }

    pub fn daily_cap_guest() -> u32 {
        3
    }

    pub fn cooldown_secs() -> i64 {
        60
    }

    pub fn lock_ttl_secs() -> u64 {
        600
    }

    pub fn hot_state_ttl_secs() -> u64 {
        1800
    }

    pub fn seen_ttl_secs() -> u64 {
        86_400
    }

    pub fn answer_timeout_ms() -> u32 {
        10_000
    }

    pub fn large_pool_threshold() -> usize {
        1000
    }

    pub fn reused_ratio() -> f64 {
        0.5
    }

    pub fn tz_offset_minutes() -> i16 {
        0
    }
}
