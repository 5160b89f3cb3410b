//! Tunables for the quarterly transition, a typed struct with per-field
//! `#[serde(default = ...)]` fallbacks like every other engine crate's config.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// A player counts as "active" for next-season `SeasonPoints`
    /// initialization if `last_seen_at` is within this many days of the
    /// transition.
    #[serde(default = "defaults::active_window_days")]
    pub active_window_days: i64,

    /// Expiry window for the season-end prize eligibility. Unlike
    /// per-session eligibilities' 60/25 minute windows, the prize is
    /// awarded well after the player's last action, so it gets a
    /// multi-day window to claim instead.
    #[serde(default = "defaults::prize_expiry_days")]
    pub prize_expiry_days: i64,

    /// Season length used to compute the next season's `ends_at` from its
    /// `starts_at`. Quarterly transitions aren't pinned to an exact day
    /// count; 91 days approximates a calendar quarter.
    #[serde(default = "defaults::season_length_days")]
    pub season_length_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            active_window_days: defaults::active_window_days(),
            prize_expiry_days: defaults::prize_expiry_days(),
            season_length_days: defaults::season_length_days(),
        }
    }
}

impl SchedulerConfig {
    /// Layers a `scheduler.toml` (optional) under `SCHEDULER_`-prefixed
    /// environment variables, the same source order
    /// `onsocial-relayer`'s binary builds its `Config` from.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("scheduler").required(false))
            .add_source(config::Environment::with_prefix("SCHEDULER"))
            .build()?
            .try_deserialize()
    }
}

mod defaults {
    pub fn active_window_days() -> i64 {
        90
    }

    pub fn prize_expiry_days() -> i64 {
        14
    }

    pub fn season_length_days() -> i64 {
        91
    }
}
