//! Postgres pool configuration, a typed struct with per-field
//! `#[serde(default = ...)]` fallbacks like every other engine crate's config.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SqlConfig {
    #[serde(default = "defaults::database_url")]
    pub database_url: String,

    #[serde(default = "defaults::max_connections")]
    pub max_connections: u32,

    #[serde(default = "defaults::connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            database_url: defaults::database_url(),
            max_connections: defaults::max_connections(),
            connect_timeout_secs: defaults::connect_timeout_secs(),
        }
    }
}

impl SqlConfig {
    /// Layers a `sql.toml` (optional) under `SQL_`-prefixed environment
    /// variables, the same source order `onsocial-relayer`'s binary builds
    /// its `Config` from.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("sql").required(false))
            .add_source(config::Environment::with_prefix("SQL"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn database_url() -> String {
        "postgres://localhost/trivia".into()
    }

    pub fn max_connections() -> u32 {
        10
    }

    pub fn connect_timeout_secs() -> u64 {
        5
    }
}
