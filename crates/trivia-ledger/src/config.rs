//! Eligibility expiry windows, a typed struct with per-field
//! `#[serde(default = ...)]` fallbacks so an operator can retune windows
//! without a code change.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "defaults::stake_expiry_minutes")]
    pub stake_expiry_minutes: i64,

    #[serde(default = "defaults::anon_expiry_minutes")]
    pub anon_expiry_minutes: i64,

    /// The minting policy id every `MintOperation` is stamped with. One
    /// policy covers the whole collection; catalog rows don't carry their
    /// own (the nft_catalog table has no policy column).
    #[serde(default = "defaults::policy_id")]
    pub policy_id: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            stake_expiry_minutes: defaults::stake_expiry_minutes(),
            anon_expiry_minutes: defaults::anon_expiry_minutes(),
            policy_id: defaults::policy_id(),
        }
    }
}

impl LedgerConfig {
    /// Layers a `ledger.toml` (optional) under `LEDGER_`-prefixed
    /// environment variables, the same source order
    /// `onsocial-relayer`'s binary builds its `Config` from. Per-field
    /// `#[serde(default)]` means an absent file or env var never fails
    /// this — only a present-but-unparsable value does.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("ledger").required(false))
            .add_source(config::Environment::with_prefix("LEDGER"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn stake_expiry_minutes() -> i64 {
        60
    }

    pub fn anon_expiry_minutes() -> i64 {
        25
    }

    pub fn policy_id() -> String {
        "trivianft1".into()
    }
}
