//! Pooled `query`/`tx` interface. Params are always bound
//! positionally through `sqlx`'s own query builder — nothing in this crate
//! formats SQL with `format!`, so string interpolation is structurally
//! unavailable to callers, not just discouraged.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::config::SqlConfig;
use trivia_error::Error;

/// Tables the rest of the workspace assumes exist. Migrations
/// themselves live outside this core; `assert_schema` only verifies them.
const EXPECTED_TABLES: &[&str] = &[
    "players",
    "categories",
    "questions",
    "question_flags",
    "sessions",
    "seasons",
    "eligibilities",
    "nft_catalog",
    "mints",
    "player_nfts",
    "forge_operations",
    "season_points",
    "leaderboard_snapshots",
];

pub struct SqlStore {
    pool: PgPool,
}

pub fn to_external(e: sqlx::Error) -> Error {
    let retriable = matches!(
        e,
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
    );
    Error::external(e.to_string(), retriable)
}

impl SqlStore {
    pub async fn connect(config: &SqlConfig) -> Result<Self, Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(to_external)?;

        info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `f` inside a transaction; commits on `Ok`, rolls back on `Err` or
    /// panic. `sqlx::Pool::begin` hands back an owned (`'static`) connection,
    /// so the closure can be written without extra lifetime machinery.
    pub async fn tx<T, F>(&self, f: F) -> Result<T, Error>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut Transaction<'static, Postgres>) -> BoxFuture<'c, Result<T, Error>> + Send,
    {
        let mut txn = self.pool.begin().await.map_err(to_external)?;
        match f(&mut txn).await {
            Ok(value) => {
                txn.commit().await.map_err(to_external)?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "rollback after transaction failure also failed");
                }
                Err(e)
            }
        }
    }

    /// Startup probe verifying the required tables exist. Fails `Fatal`
    /// rather than retrying — a missing table is an environment
    /// misconfiguration, not a transient fault.
    pub async fn assert_schema(&self) -> Result<(), Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT tablename FROM pg_tables WHERE schemaname = 'public'")
                .fetch_all(&self.pool)
                .await
                .map_err(to_external)?;
        let present: std::collections::HashSet<String> = rows.into_iter().map(|(t,)| t).collect();

        let missing: Vec<&str> = EXPECTED_TABLES
            .iter()
            .filter(|t| !present.contains(**t))
            .copied()
            .collect();

        if !missing.is_empty() {
            return Err(Error::fatal(format!("missing expected tables: {}", missing.join(", "))));
        }
        Ok(())
    }
}
