//! Seasonal Scheduler: a timer-triggered quarterly transition that
//! archives a season's final standings, awards its top player, rotates the
//! active season, and reinitializes next-season state. There is no
//! internal timer here — an external scheduler (cron, a k8s CronJob) calls
//! [`SeasonalScheduler::run_transition`] at each calendar boundary.
//!
//! Every step is written to detect prior completion and skip, so a
//! retrigger after a crash mid-transition resumes rather than
//! double-applies. Deactivating the outgoing season and activating the
//! next one are done together in one transaction rather than as two
//! separate steps, so there is never a window with zero active seasons if
//! the job dies between them.

pub mod config;
pub mod season_id;

use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use trivia_error::Error;
use trivia_external::Clock;
use trivia_leaderboard::LeaderboardEngine;
use trivia_store_kv::KvStore;
use trivia_store_sql::rows::{CategoryRow, SeasonRow};
use trivia_store_sql::SqlStore;
use trivia_types::{CategoryId, SeasonId};

pub use config::SchedulerConfig;

/// What a call to [`SeasonalScheduler::run_transition`] actually did, so a
/// caller (a CLI, a cron wrapper) can log something more informative than
/// "ok".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// No season was active; nothing to transition.
    NoActiveSeason,
    Completed { closed_season_id: SeasonId, next_season_id: SeasonId, prize_awarded_to: Option<String> },
}

pub struct SeasonalScheduler {
    store: Arc<SqlStore>,
    kv: Arc<dyn KvStore>,
    leaderboard: Arc<LeaderboardEngine>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

fn global_ladder_key(season_id: &str) -> String {
    format!("ladder:global:{season_id}")
}

fn category_ladder_key(category_id: &CategoryId, season_id: &str) -> String {
    format!("ladder:category:{category_id}:{season_id}")
}

impl SeasonalScheduler {
    pub fn new(
        store: Arc<SqlStore>,
        kv: Arc<dyn KvStore>,
        leaderboard: Arc<LeaderboardEngine>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self { store, kv, leaderboard, clock, config }
    }

    /// Runs the full seven-step transition. Safe to call
    /// repeatedly — a call with nothing to do is a cheap no-op.
    pub async fn run_transition(&self) -> Result<TransitionOutcome, Error> {
        let Some(season) = self.load_active_season().await? else {
            info!("no active season, nothing to transition");
            return Ok(TransitionOutcome::NoActiveSeason);
        };

        let now = self.clock.now();
        let today = now.date();

        self.snapshot_if_missing(&season.id, today).await?;
        let prize_awarded_to = self.award_prize_if_missing(&season.id, now).await?;

        let (next_id, next_display_name) = season_id::next_season_id(&season.id);
        self.rotate_season(&season, &next_id, &next_display_name, now).await?;

        self.seed_next_season_points(&next_id, now).await?;
        self.clear_retired_ladder_keys(&season.id).await?;

        info!(
            closed_season_id = %season.id,
            next_season_id = %next_id,
            prize_awarded_to = ?prize_awarded_to,
            "season transition complete"
        );
        Ok(TransitionOutcome::Completed {
            closed_season_id: season.id,
            next_season_id: next_id,
            prize_awarded_to,
        })
    }

    async fn load_active_season(&self) -> Result<Option<trivia_types::Season>, Error> {
        let row: Option<SeasonRow> =
            sqlx::query_as("SELECT id, display_name, starts_at, ends_at, grace_days, active FROM seasons WHERE active = true LIMIT 1")
                .fetch_optional(self.store.pool())
                .await
                .map_err(trivia_store_sql::pool::to_external)?;
        Ok(row.map(Into::into))
    }

    /// Step 2. Skips if a snapshot for today's date already exists for this
    /// season — the idempotence guard.
    async fn snapshot_if_missing(&self, season_id: &str, snapshot_date: time::Date) -> Result<(), Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM leaderboard_snapshots WHERE season_id = $1 AND snapshot_date = $2)",
        )
        .bind(season_id)
        .bind(snapshot_date)
        .fetch_one(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        if exists.0 {
            info!(season_id, "snapshot already on file for today, skipping");
            return Ok(());
        }
        self.leaderboard.snapshot(season_id, snapshot_date).await?;
        Ok(())
    }

    /// Step 3. Finds the top-ranked ladder entry that carries both a stake
    /// (every ladder entry does) and a username, and issues it a
    /// season-scoped prize `Eligibility`. The NFT type the prize unlocks is
    /// out of scope here — only the entitlement itself is issued.
    async fn award_prize_if_missing(&self, season_id: &str, now: time::OffsetDateTime) -> Result<Option<String>, Error> {
        let already: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM eligibilities WHERE season_id = $1 AND eligibility_type = 'season')",
        )
        .bind(season_id)
        .fetch_one(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        if already.0 {
            info!(season_id, "season prize already awarded, skipping");
            return Ok(None);
        }

        let winner = match self.find_top_eligible_player(season_id).await? {
            Some(w) => w,
            None => {
                warn!(season_id, "no eligible (stake + username) player found on the final ladder, no prize issued");
                return Ok(None);
            }
        };

        let player_id: (Uuid,) = sqlx::query_as("SELECT id FROM players WHERE stake = $1")
            .bind(&winner.stake)
            .fetch_one(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;

        let expires_at = now + Duration::days(self.config.prize_expiry_days);
        sqlx::query(
            "INSERT INTO eligibilities \
             (id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at) \
             VALUES ($1, 'season', NULL, $2, $3, $4, 'active', $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(season_id)
        .bind(player_id.0)
        // No session backs a season-end prize; `issued_from_session` is
        // non-nullable, so this column gets a fresh id that never matches a
        // real `sessions` row rather than a borrowed one.
        .bind(Uuid::new_v4())
        .bind(now)
        .bind(expires_at)
        .execute(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        info!(season_id, stake = %winner.stake, "awarded season prize eligibility");
        Ok(Some(winner.stake))
    }

    async fn find_top_eligible_player(&self, season_id: &str) -> Result<Option<trivia_leaderboard::LeaderboardEntry>, Error> {
        let key = global_ladder_key(season_id);
        let mut offset = 0usize;
        const PAGE: usize = 100;
        const SEARCH_CAP: usize = 1000;

        loop {
            let page = self.leaderboard.get_page(&key, PAGE, offset).await?;
            if let Some(entry) = page.entries.into_iter().find(|e| e.username.is_some()) {
                return Ok(Some(entry));
            }
            if !page.has_more || offset >= SEARCH_CAP {
                return Ok(None);
            }
            offset += PAGE;
        }
    }

    /// Steps 4 and 5, combined into one transaction (see module doc).
    async fn rotate_season(
        &self,
        closing: &trivia_types::Season,
        next_id: &str,
        next_display_name: &str,
        now: time::OffsetDateTime,
    ) -> Result<(), Error> {
        let closing_id = closing.id.clone();
        let next_id = next_id.to_string();
        let next_display_name = next_display_name.to_string();
        let season_length_days = self.config.season_length_days;

        self.store
            .tx(move |txn: &mut Transaction<'static, Postgres>| {
                Box::pin(async move {
                    let already_exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM seasons WHERE id = $1)")
                        .bind(&next_id)
                        .fetch_one(&mut **txn)
                        .await
                        .map_err(trivia_store_sql::pool::to_external)?;

                    sqlx::query("UPDATE seasons SET active = false WHERE id = $1")
                        .bind(&closing_id)
                        .execute(&mut **txn)
                        .await
                        .map_err(trivia_store_sql::pool::to_external)?;

                    if already_exists.0 {
                        sqlx::query("UPDATE seasons SET active = true WHERE id = $1")
                            .bind(&next_id)
                            .execute(&mut **txn)
                            .await
                            .map_err(trivia_store_sql::pool::to_external)?;
                    } else {
                        let ends_at = now + Duration::days(season_length_days);
                        sqlx::query(
                            "INSERT INTO seasons (id, display_name, starts_at, ends_at, grace_days, active) \
                             VALUES ($1, $2, $3, $4, $5, true)",
                        )
                        .bind(&next_id)
                        .bind(&next_display_name)
                        .bind(now)
                        .bind(ends_at)
                        .bind(trivia_types::DEFAULT_GRACE_DAYS as i32)
                        .execute(&mut **txn)
                        .await
                        .map_err(trivia_store_sql::pool::to_external)?;
                    }

                    Ok(())
                })
            })
            .await
    }

    /// Step 6. Zero-initializes `SeasonPoints` for every player seen within
    /// `active_window_days`. `ON CONFLICT DO NOTHING` makes a retrigger
    /// after partial completion free.
    async fn seed_next_season_points(&self, next_season_id: &str, now: time::OffsetDateTime) -> Result<(), Error> {
        let cutoff = now - Duration::days(self.config.active_window_days);
        let stakes: Vec<(String,)> = sqlx::query_as("SELECT stake FROM players WHERE stake IS NOT NULL AND last_seen_at >= $1")
            .bind(cutoff)
            .fetch_all(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;

        let mut seeded = 0u64;
        for (stake,) in stakes {
            let result = sqlx::query(
                "INSERT INTO season_points (season_id, stake, points, perfect_count, nfts_minted, avg_answer_ms, sessions_used, first_achieved_at) \
                 VALUES ($1, $2, 0, 0, 0, 0.0, 0, NULL) ON CONFLICT (season_id, stake) DO NOTHING",
            )
            .bind(next_season_id)
            .bind(&stake)
            .execute(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
            seeded += result.rows_affected();
        }

        info!(next_season_id, seeded, "seeded next-season points for recently active players");
        Ok(())
    }

    /// Step 7. The KV adapter has no pattern-delete, so the retired
    /// season's ladder keys are cleared by enumerating them: the global
    /// key plus one per known category.
    async fn clear_retired_ladder_keys(&self, retired_season_id: &str) -> Result<(), Error> {
        if let Err(e) = self.kv.del(&global_ladder_key(retired_season_id)).await {
            warn!(error = %e, retired_season_id, "failed to clear global ladder key, leaving it for the next write to overwrite");
        }

        let categories: Vec<CategoryRow> = sqlx::query_as("SELECT id, slug, code, active FROM categories")
            .fetch_all(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;

        for category in categories {
            let key = category_ladder_key(&category.id, retired_season_id);
            if let Err(e) = self.kv.del(&key).await {
                warn!(error = %e, retired_season_id, category_id = %category.id, "failed to clear category ladder key");
            }
        }
        Ok(())
    }
}
