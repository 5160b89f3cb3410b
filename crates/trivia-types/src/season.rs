//! Season, SeasonPoints, and LeaderboardSnapshot entities.

use crate::ids::{SeasonId, Stake};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

pub const DEFAULT_GRACE_DAYS: u32 = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Season {
    pub id: SeasonId,
    pub display_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub ends_at: OffsetDateTime,
    pub grace_days: u32,
    pub active: bool,
}

impl Season {
    pub fn grace_ends_at(&self) -> OffsetDateTime {
        self.ends_at + Duration::days(self.grace_days as i64)
    }

    pub fn is_within_grace(&self, now: OffsetDateTime) -> bool {
        now <= self.grace_ends_at()
    }
}

/// One cycle of the four-season calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Cycle {
    pub fn next(self) -> (Cycle, bool) {
        match self {
            Cycle::Winter => (Cycle::Spring, false),
            Cycle::Spring => (Cycle::Summer, false),
            Cycle::Summer => (Cycle::Fall, false),
            Cycle::Fall => (Cycle::Winter, true), // wraps, caller bumps N
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Cycle::Winter => "Winter",
            Cycle::Spring => "Spring",
            Cycle::Summer => "Summer",
            Cycle::Fall => "Fall",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Cycle::Winter => "WI",
            Cycle::Spring => "SP",
            Cycle::Summer => "SU",
            Cycle::Fall => "FA",
        }
    }
}

/// (season_id, stake) -> accumulated points. Keyed composite; mutated
/// only by the Leaderboard Engine on Session completion of a stake-bound
/// session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonPoints {
    pub season_id: SeasonId,
    pub stake: Stake,
    pub points: i64,
    pub perfect_count: u32,
    pub nfts_minted: u32,
    pub avg_answer_ms: f64,
    pub sessions_used: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub first_achieved_at: Option<OffsetDateTime>,
}

impl SeasonPoints {
    pub fn zeroed(season_id: SeasonId, stake: Stake) -> Self {
        Self {
            season_id,
            stake,
            points: 0,
            perfect_count: 0,
            nfts_minted: 0,
            avg_answer_ms: 0.0,
            sessions_used: 0,
            first_achieved_at: None,
        }
    }
}

/// (season, snapshot_date, stake) -> rank + tie-break counters. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    pub season_id: SeasonId,
    pub snapshot_date: Date,
    pub stake: Stake,
    pub rank: u32,
    pub points: i64,
    pub nfts_minted: u32,
    pub perfect_count: u32,
    pub avg_answer_ms: f64,
    pub sessions_used: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub first_achieved_at: Option<OffsetDateTime>,
}
