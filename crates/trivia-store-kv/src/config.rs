//! Redis connection configuration, a typed struct with field-level
//! `#[serde(default = ...)]` fallbacks like every other engine crate's
//! config, instead of a process-wide singleton.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct KvConfig {
    #[serde(default = "defaults::redis_url")]
    pub redis_url: String,

    #[serde(default = "defaults::connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for KvConfig {
    fn default() -> Self {
        Self { redis_url: defaults::redis_url(), connect_timeout_ms: defaults::connect_timeout_ms() }
    }
}

impl KvConfig {
    /// Layers a `kv.toml` (optional) under `KV_`-prefixed environment
    /// variables, the same source order `onsocial-relayer`'s binary builds
    /// its `Config` from.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("kv").required(false))
            .add_source(config::Environment::with_prefix("KV"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn redis_url() -> String {
        "redis://127.0.0.1:6379".into()
    }

    pub fn connect_timeout_ms() -> u64 {
        2_000
    }
}
