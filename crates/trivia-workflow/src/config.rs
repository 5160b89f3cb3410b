//! Retry/backoff and confirmation-polling tunables, a typed struct with
//! per-field `#[serde(default = ...)]` fallbacks like every other engine
//! crate's config. Defaults: initial 1s, factor 2, cap 60s, max attempts 5.

use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "defaults::initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: u32,

    #[serde(default = "defaults::cap_ms")]
    pub cap_ms: u64,

    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: defaults::initial_delay_ms(),
            backoff_factor: defaults::backoff_factor(),
            cap_ms: defaults::cap_ms(),
            max_attempts: defaults::max_attempts(),
        }
    }
}

impl RetryPolicy {
    /// Delay before the `attempt`'th retry (0-indexed), capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay_ms.saturating_mul(self.backoff_factor.saturating_pow(attempt) as u64);
        Duration::from_millis(scaled.min(self.cap_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Confirmations required before a submitted transaction is treated as
    /// final.
    #[serde(default = "defaults::confirmations_required")]
    pub confirmations_required: u32,

    /// Threshold used by crash-recovery resumption: operations in a
    /// non-terminal status older than this are picked back up.
    #[serde(default = "defaults::stale_after_secs")]
    pub stale_after_secs: i64,

    /// Logical key reference passed to `Blockchain::sign` for category/
    /// master mints; the concrete chain resolves it via `SecretStore`
    /// internally — this crate never touches `SecretStore` directly, it
    /// only names the key.
    #[serde(default = "defaults::mint_key_ref")]
    pub mint_key_ref: String,

    #[serde(default = "defaults::forge_key_ref")]
    pub forge_key_ref: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            confirmations_required: defaults::confirmations_required(),
            stale_after_secs: defaults::stale_after_secs(),
            mint_key_ref: defaults::mint_key_ref(),
            forge_key_ref: defaults::forge_key_ref(),
        }
    }
}

impl WorkflowConfig {
    /// Layers a `workflow.toml` (optional) under `WORKFLOW_`-prefixed
    /// environment variables, the same source order
    /// `onsocial-relayer`'s binary builds its `Config` from.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("workflow").required(false))
            .add_source(config::Environment::with_prefix("WORKFLOW").separator("__"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn initial_delay_ms() -> u64 {
        1_000
    }

    pub fn backoff_factor() -> u32 {
        2
    }

    pub fn cap_ms() -> u64 {
        60_000
    }

    pub fn max_attempts() -> u32 {
        5
    }

    pub fn confirmations_required() -> u32 {
        1
    }

    pub fn stale_after_secs() -> i64 {
        600
    }

    pub fn mint_key_ref() -> String {
        "mint-signing-key".into()
    }

    pub fn forge_key_ref() -> String {
        "forge-signing-key".into()
    }
}
