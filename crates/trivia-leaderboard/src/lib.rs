//! Leaderboard Engine. SQL holds the canonical `SeasonPoints`
//! row; the sorted set in KV is a derived read cache keyed by composite
//! score. If a crash lands between the SQL commit and the KV write,
//! [`Reconciler::rebuild`] repopulates the sorted set from `SeasonPoints`
//! rather than the caller ever seeing the gap.

pub mod score;

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info};

use trivia_error::Error;
use trivia_store_kv::KvStore;
use trivia_store_sql::rows::{LeaderboardSnapshotRow, SeasonPointsRow};
use trivia_store_sql::SqlStore;
use trivia_types::{CategoryId, LeaderboardSnapshot, SeasonPoints};

pub use score::{composite_score, decode_composite_score, points_for_session, DecodedScore};

fn global_ladder_key(season_id: &str) -> String {
    format!("ladder:global:{season_id}")
}

fn category_ladder_key(category_id: &CategoryId, season_id: &str) -> String {
    format!("ladder:category:{category_id}:{season_id}")
}

/// One completed, stake-bound session's contribution to a season.
/// `category_id` is `Some` when the category-scoped ladder should
/// also be updated, reusing the same season-wide composite score — the data
/// model carries no per-category `SeasonPoints` row.
pub struct PointsUpdate {
    pub points_delta: i64,
    pub perfect: bool,
    pub nfts_minted_delta: u32,
    pub session_avg_answer_ms: f64,
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub stake: String,
    pub username: Option<String>,
    pub points: i64,
    pub nfts_minted: u32,
    pub perfect_scores: u32,
    pub avg_answer_ms: f64,
    pub sessions_used: u32,
}

#[derive(Debug, Clone)]
pub struct LeaderboardPage {
    pub entries: Vec<LeaderboardEntry>,
    pub total: u64,
    pub has_more: bool,
}

pub struct LeaderboardEngine {
    sql: Arc<SqlStore>,
    kv: Arc<dyn KvStore>,
}

impl LeaderboardEngine {
    pub fn new(sql: Arc<SqlStore>, kv: Arc<dyn KvStore>) -> Self {
        Self { sql, kv }
    }

    /// Upserts `SeasonPoints` (atomic increments, running average of answer
    /// ms), recomputes the composite from the fresh row, and writes it to
    /// the global sorted set — plus the category-scoped one when
    /// `update.category_id` is set. `firstAchievedAt` is set once, on first
    /// insert, and never moves afterward.
    pub async fn update_points(&self, stake: &str, season_id: &str, update: PointsUpdate, now: OffsetDateTime) -> Result<SeasonPoints, Error> {
        let perfect_increment: i32 = if update.perfect { 1 } else { 0 };

        let row: SeasonPointsRow = sqlx::query_as(
            r#"
            INSERT INTO season_points (season_id, stake, points, perfect_count, nfts_minted, avg_answer_ms, sessions_used, first_achieved_at)
            VALUES ($1, $2, $3, $4, $5, $6, 1, $7)
            ON CONFLICT (season_id, stake) DO UPDATE SET
                points = season_points.points + EXCLUDED.points,
                perfect_count = season_points.perfect_count + EXCLUDED.perfect_count,
                nfts_minted = season_points.nfts_minted + EXCLUDED.nfts_minted,
                avg_answer_ms = (season_points.avg_answer_ms * season_points.sessions_used + EXCLUDED.avg_answer_ms)
                                / (season_points.sessions_used + 1),
                sessions_used = season_points.sessions_used + 1,
                first_achieved_at = COALESCE(season_points.first_achieved_at, EXCLUDED.first_achieved_at)
            RETURNING season_id, stake, points, perfect_count, nfts_minted, avg_answer_ms, sessions_used, first_achieved_at
            "#,
        )
        .bind(season_id)
        .bind(stake)
        .bind(update.points_delta)
        .bind(perfect_increment)
        .bind(update.nfts_minted_delta as i32)
        .bind(update.session_avg_answer_ms)
        .bind(if update.perfect { Some(now) } else { None })
        .fetch_one(self.sql.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        let season_points: SeasonPoints = row.into();
        let composite = self.composite_for(&season_points);

        if let Err(e) = self.kv.zadd(&global_ladder_key(season_id), stake, composite).await {
            error!(error = %e, season_id, stake, "leaderboard KV write failed after SQL commit; left to the reconciler");
        }
        if let Some(category_id) = update.category_id {
            if let Err(e) = self.kv.zadd(&category_ladder_key(&category_id, season_id), stake, composite).await {
                error!(error = %e, season_id, stake, %category_id, "category leaderboard KV write failed after SQL commit; left to the reconciler");
            }
        }

        Ok(season_points)
    }

    fn composite_for(&self, points: &SeasonPoints) -> f64 {
        composite_score(
            points.points,
            points.nfts_minted,
            points.perfect_count,
            points.avg_answer_ms,
            points.sessions_used,
            points.first_achieved_at.map(|t| (t.unix_timestamp_nanos() / 1_000_000) as i64).unwrap_or(0),
        )
    }

    /// Paginated ranking: `limit` is clamped to `1..=100` by
    /// rejection, not silent truncation, since an out-of-range request is
    /// an `InputError`.
    pub async fn get_page(&self, ladder_key: &str, limit: usize, offset: usize) -> Result<LeaderboardPage, Error> {
        if !(1..=100).contains(&limit) {
            return Err(Error::input("limit must be in 1..=100"));
        }

        let total = self.kv.zcard(ladder_key).await?;
        let start = offset as isize;
        let stop = (offset + limit - 1) as isize;
        let raw = self.kv.zrevrange_with_scores(ladder_key, start, stop).await?;

        let stakes: Vec<&str> = raw.iter().map(|(s, _)| s.as_str()).collect();
        let usernames = self.usernames_for(&stakes).await?;

        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(i, (stake, score))| {
                let decoded = decode_composite_score(score);
                LeaderboardEntry {
                    rank: offset as u32 + i as u32 + 1,
                    username: usernames.get(&stake).cloned().flatten(),
                    stake,
                    points: decoded.points,
                    nfts_minted: decoded.nfts_minted,
                    perfect_scores: decoded.perfect_scores,
                    avg_answer_ms: decoded.avg_answer_ms,
                    sessions_used: decoded.sessions_used,
                }
            })
            .collect::<Vec<_>>();

        let has_more = offset as u64 + entries.len() as u64 < total;
        Ok(LeaderboardPage { entries, total, has_more })
    }

    async fn usernames_for(&self, stakes: &[&str]) -> Result<std::collections::HashMap<String, Option<String>>, Error> {
        if stakes.is_empty() {
            return Ok(Default::default());
        }
        let rows: Vec<(String, Option<String>)> = sqlx::query_as("SELECT stake, username FROM players WHERE stake = ANY($1)")
            .bind(stakes.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            .fetch_all(self.sql.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
        Ok(rows.into_iter().collect())
    }

    /// Enumerates the global ladder descending, decodes each composite back
    /// into counters, and inserts append-only rows into `LeaderboardSnapshot`
    /// keyed by `snapshot_date`.
    pub async fn snapshot(&self, season_id: &str, snapshot_date: time::Date) -> Result<Vec<LeaderboardSnapshot>, Error> {
        let key = global_ladder_key(season_id);
        let total = self.kv.zcard(&key).await?;
        let raw = self.kv.zrevrange_with_scores(&key, 0, (total.max(1) - 1) as isize).await?;

        let mut snapshots = Vec::with_capacity(raw.len());
        for (rank, (stake, score)) in raw.into_iter().enumerate() {
            let decoded = decode_composite_score(score);
            let row = LeaderboardSnapshotRow {
                season_id: season_id.to_string(),
                snapshot_date,
                stake: stake.clone(),
                rank: rank as i32 + 1,
                points: decoded.points,
                nfts_minted: decoded.nfts_minted as i32,
                perfect_count: decoded.perfect_scores as i32,
                avg_answer_ms: decoded.avg_answer_ms,
                sessions_used: decoded.sessions_used as i32,
                first_achieved_at: None,
            };
            sqlx::query(
                "INSERT INTO leaderboard_snapshots \
                 (season_id, snapshot_date, stake, rank, points, nfts_minted, perfect_count, avg_answer_ms, sessions_used, first_achieved_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
            )
            .bind(&row.season_id)
            .bind(row.snapshot_date)
            .bind(&row.stake)
            .bind(row.rank)
            .bind(row.points)
            .bind(row.nfts_minted)
            .bind(row.perfect_count)
            .bind(row.avg_answer_ms)
            .bind(row.sessions_used)
            .bind(row.first_achieved_at)
            .execute(self.sql.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
            snapshots.push(row.into());
        }

        info!(season_id, count = snapshots.len(), "wrote leaderboard snapshot");
        Ok(snapshots)
    }

    /// Rebuilds the global sorted set from `SeasonPoints` — the
    /// crash-recovery path, modeled as its own independently-testable
    /// function rather than inlined in
    /// `update_points`.
    pub async fn reconcile(&self, season_id: &str) -> Result<u64, Error> {
        let rows: Vec<SeasonPointsRow> = sqlx::query_as(
            "SELECT season_id, stake, points, perfect_count, nfts_minted, avg_answer_ms, sessions_used, first_achieved_at \
             FROM season_points WHERE season_id = $1",
        )
        .bind(season_id)
        .fetch_all(self.sql.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        let key = global_ladder_key(season_id);
        let mut written = 0u64;
        for row in rows {
            let points: SeasonPoints = row.into();
            let composite = self.composite_for(&points);
            self.kv.zadd(&key, &points.stake, composite).await?;
            written += 1;
        }
        info!(season_id, written, "reconciled leaderboard sorted set from SeasonPoints");
        Ok(written)
    }
}
