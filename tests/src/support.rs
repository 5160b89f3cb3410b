//! Shared test harness: a live Postgres connection, retried against
//! transient startup failures, plus the in-memory `KvStore` and
//! `trivia-external` fakes wired into one bundle every scenario test builds
//! from.
//!
//! Tests in this crate that touch `SqlStore` read `DATABASE_URL` (falling
//! back to `postgres://localhost/trivia_test`) and are marked `#[ignore]` —
//! run them explicitly with a schema-applied Postgres reachable via
//! `cargo test -- --ignored`. Pure-logic properties (codec round-trips,
//! composite-score tie-breaks, forge-shape validation) need no database and
//! run unconditionally; see each crate's own `#[cfg(test)]` module for those.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use time::{Month, OffsetDateTime};
use uuid::Uuid;

use trivia_external::fakes::{FakeBlobStore, FakeBlockchain, FakeClock, FakeContentAddressing, FakeQuestionSource, FakeRng};
use trivia_external::BlobStore as _;
use trivia_ledger::{EligibilityLedger, LedgerConfig};
use trivia_leaderboard::LeaderboardEngine;
use trivia_session::{SessionConfig, SessionEngine};
use trivia_store_kv::{InMemoryKvStore, KvStore};
use trivia_store_sql::{SqlConfig, SqlStore};
use trivia_types::{Category, CategoryId, Question};

/// Tables this crate's tests truncate between runs, mirroring
/// `trivia_store_sql::pool`'s own `EXPECTED_TABLES` list.
const TABLES_IN_FK_SAFE_TRUNCATE_ORDER: &[&str] = &[
    "forge_operations",
    "player_nfts",
    "mints",
    "nft_catalog",
    "eligibilities",
    "leaderboard_snapshots",
    "season_points",
    "sessions",
    "question_flags",
    "questions",
    "categories",
    "seasons",
    "players",
];

pub async fn connect() -> Result<SqlStore> {
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/trivia_test".into());
    let config = SqlConfig { database_url, ..SqlConfig::default() };

    let mut last_err = None;
    for attempt in 1..=6 {
        match SqlStore::connect(&config).await {
            Ok(store) => return Ok(store),
            Err(e) => {
                last_err = Some(e);
                eprintln!("[support::connect] attempt {attempt}/6 failed, retrying in 2s: {:?}", last_err);
                tokio::time::sleep(StdDuration::from_secs(2)).await;
            }
        }
    }
    Err(anyhow::anyhow!("failed to connect to Postgres after 6 attempts: {:?}", last_err))
}

pub async fn reset_schema(store: &SqlStore) -> Result<()> {
    for table in TABLES_IN_FK_SAFE_TRUNCATE_ORDER {
        sqlx::query(&format!("TRUNCATE TABLE {table} CASCADE")).execute(store.pool()).await?;
    }
    Ok(())
}

pub fn fixed_clock() -> Arc<FakeClock> {
    let epoch = OffsetDateTime::UNIX_EPOCH.replace_date(time::Date::from_calendar_date(2026, Month::January, 1).unwrap());
    Arc::new(FakeClock::at(epoch))
}

/// Bundles the capability fakes and live adapters every scenario test needs,
/// so each test file states only what it adds on top (seeded categories,
/// questions, catalog rows).
pub struct Harness {
    pub store: Arc<SqlStore>,
    pub kv: Arc<dyn KvStore>,
    pub clock: Arc<FakeClock>,
    pub rng: Arc<FakeRng>,
    pub questions: Arc<FakeQuestionSource>,
    pub blockchain: Arc<FakeBlockchain>,
    pub blob_store: Arc<FakeBlobStore>,
    pub content_addressing: Arc<FakeContentAddressing>,
    pub ledger: Arc<EligibilityLedger>,
    pub leaderboard: Arc<LeaderboardEngine>,
    pub sessions: Arc<SessionEngine>,
}

impl Harness {
    pub async fn new() -> Result<Self> {
        let store = Arc::new(connect().await?);
        reset_schema(&store).await?;

        let kv: Arc<dyn KvStore> = Arc::new(InMemoryKvStore::default());
        let clock = fixed_clock();
        let rng = Arc::new(FakeRng::seeded(7));
        let questions = Arc::new(FakeQuestionSource::default());
        let blockchain = Arc::new(FakeBlockchain::new(1));
        let blob_store = Arc::new(FakeBlobStore::default());
        let content_addressing = Arc::new(FakeContentAddressing::default());

        let ledger = Arc::new(EligibilityLedger::new(store.clone(), clock.clone(), LedgerConfig::default()));
        let leaderboard = Arc::new(LeaderboardEngine::new(store.clone(), kv.clone()));
        let sessions = Arc::new(SessionEngine::new(
            store.clone(),
            kv.clone(),
            clock.clone(),
            rng.clone(),
            questions.clone(),
            ledger.clone(),
            leaderboard.clone(),
            SessionConfig::default(),
        ));

        Ok(Self {
            store,
            kv,
            clock,
            rng,
            questions,
            blockchain,
            blob_store,
            content_addressing,
            ledger,
            leaderboard,
            sessions,
        })
    }

    /// Inserts a category row and seeds ten distinct questions for it with
    /// correct index `0`, mirroring S1/S2's fixture shape.
    pub async fn seed_category_with_ten_questions(&self, slug: &str, code: &str) -> Result<Category> {
        let category = Category { id: Uuid::new_v4(), slug: slug.into(), code: code.into(), active: true };
        sqlx::query("INSERT INTO categories (id, slug, code, active) VALUES ($1, $2, $3, $4)")
            .bind(category.id)
            .bind(&category.slug)
            .bind(&category.code)
            .bind(category.active)
            .execute(self.store.pool())
            .await?;

        let questions: Vec<Question> = (0..10)
            .map(|i| Question {
                id: Uuid::new_v4(),
                category_id: category.id,
                text: format!("{code} question {i}"),
                options: [format!("A{i}"), format!("B{i}"), format!("C{i}"), format!("D{i}")],
                correct_index: 0,
                explanation: format!("explanation {i}"),
                source: "fixture".into(),
                content_hash: format!("{code}-{i}"),
            })
            .collect();
        self.questions.seed(category.id, questions);

        Ok(category)
    }

    pub async fn insert_connected_player(&self, stake: &str, username: Option<&str>) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = self.clock.now();
        sqlx::query(
            "INSERT INTO players (id, stake, anon_id, username, email, payment_address, created_at, last_seen_at) \
             VALUES ($1, $2, NULL, $3, NULL, NULL, $4, $4)",
        )
        .bind(id)
        .bind(stake)
        .bind(username)
        .bind(now)
        .execute(self.store.pool())
        .await?;
        Ok(id)
    }

    /// Inserts one `available` catalog row for `category_id`, returning its id.
    pub async fn insert_catalog_item(&self, category_id: CategoryId, display_name: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO nft_catalog (id, category_id, display_name, artwork_blob_key, metadata_blob_key, content_address, stock_state, tier) \
             VALUES ($1, $2, $3, $4, $5, NULL, 'available', 'category')",
        )
        .bind(id)
        .bind(category_id)
        .bind(display_name)
        .bind(format!("artwork/{id}"))
        .bind(format!("metadata/{id}"))
        .execute(self.store.pool())
        .await?;
        self.blob_store.put(&format!("metadata/{id}"), b"{}".to_vec()).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;
        Ok(id)
    }

    /// Count of `available` catalog rows for a category — used to assert
    /// stock conservation around a `consume` call.
    pub async fn available_stock(&self, category_id: CategoryId) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM nft_catalog WHERE category_id = $1 AND stock_state = 'available'")
            .bind(category_id)
            .fetch_one(self.store.pool())
            .await?;
        Ok(row.0)
    }

    pub async fn insert_season(&self, season_id: &str, active: bool) -> Result<()> {
        let now = self.clock.now();
        sqlx::query("INSERT INTO seasons (id, display_name, starts_at, ends_at, grace_days, active) VALUES ($1, $2, $3, $4, 7, $5)")
            .bind(season_id)
            .bind(format!("{season_id} display"))
            .bind(now)
            .bind(now + time::Duration::days(91))
            .bind(active)
            .execute(self.store.pool())
            .await?;
        Ok(())
    }

    /// Draws, serves, and answers all ten questions for a fresh session in
    /// one call, returning the resulting `CompletionOutcome` — the shared
    /// backbone of S1/S2.
    pub async fn play_full_session(
        &self,
        player_id: Uuid,
        identity: trivia_types::PlayerIdentity,
        category_id: CategoryId,
        answers: [u8; 10],
        time_ms: u32,
        active_season_id: &str,
    ) -> Result<trivia_session::CompletionOutcome> {
        let (session, _served) = self.sessions.start_session(player_id, identity, category_id).await?;
        for (i, &option_index) in answers.iter().enumerate() {
            self.sessions.submit_answer(session.id, i as u8, option_index, time_ms).await?;
        }
        let outcome = self.sessions.complete_session(session.id, false, active_season_id).await?;
        Ok(outcome)
    }
}
