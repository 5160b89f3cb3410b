//! Eligibility & Stock Ledger: issuing entitlements on a perfect
//! score, validating and consuming them against catalog stock, and keeping
//! `nft_catalog.stock_state` race-safe under concurrent mint attempts.

pub mod config;

use std::sync::Arc;

use sqlx::{Postgres, Row, Transaction};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use trivia_error::Error;
use trivia_external::Clock;
use trivia_store_sql::rows::{EligibilityRow, MintOperationRow, NftCatalogRow};
use trivia_store_sql::SqlStore;
use trivia_types::{
    CategoryId, Eligibility, EligibilityId, MintOperation, MintOperationId, PlayerId, ScopeKind, Session,
};

pub use config::LedgerConfig;

pub struct EligibilityLedger {
    store: Arc<SqlStore>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl EligibilityLedger {
    pub fn new(store: Arc<SqlStore>, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self { store, clock, config }
    }

    /// Called exactly once per perfect-score session. Idempotent on
    /// `issued_from_session` via a unique index — a retried call returns the
    /// row already on file instead of a duplicate.
    pub async fn issue_on_perfect(&self, session: &Session) -> Result<Eligibility, Error> {
        if !session.is_perfect() {
            return Err(Error::fatal("issue_on_perfect called on a non-perfect session"));
        }

        let now = self.clock.now();
        let window_minutes = if session.identity.is_connected() {
            self.config.stake_expiry_minutes
        } else {
            self.config.anon_expiry_minutes
        };
        let expires_at = now + Duration::minutes(window_minutes);
        let id = EligibilityId::new_v4();

        let inserted: Option<EligibilityRow> = sqlx::query_as(
            r#"
            INSERT INTO eligibilities
                (id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at)
            VALUES ($1, 'category', $2, NULL, $3, $4, 'active', $5, $6)
            ON CONFLICT (issued_from_session) DO NOTHING
            RETURNING id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at
            "#,
        )
        .bind(id)
        .bind(session.category_id)
        .bind(session.player_id)
        .bind(session.id)
        .bind(now)
        .bind(expires_at)
        .fetch_optional(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        let row = match inserted {
            Some(row) => row,
            None => {
                info!(session_id = %session.id, "issue_on_perfect is idempotent, returning existing eligibility");
                sqlx::query_as(
                    "SELECT id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at \
                     FROM eligibilities WHERE issued_from_session = $1",
                )
                .bind(session.id)
                .fetch_one(self.store.pool())
                .await
                .map_err(trivia_store_sql::pool::to_external)?
            }
        };

        row.try_into()
    }

    /// Active eligibilities for a player, with a best-effort sweep of
    /// expired-but-not-yet-reaped rows run first.
    pub async fn list_active(&self, player_id: &PlayerId) -> Result<Vec<Eligibility>, Error> {
        if let Err(e) = self.sweep_expired().await {
            warn!(error = %e, "best-effort expiry sweep failed, continuing with unswept rows");
        }

        let rows: Vec<EligibilityRow> = sqlx::query_as(
            "SELECT id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at \
             FROM eligibilities WHERE player_id = $1 AND status = 'active' AND expires_at > $2 ORDER BY issued_at",
        )
        .bind(player_id)
        .bind(self.clock.now())
        .fetch_all(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        rows.into_iter().map(Eligibility::try_from).collect()
    }

    /// Marks rows `active` with `expires_at <= now` as `expired`. Not called
    /// from any externally-facing path; a scheduler or `list_active` may
    /// invoke it. Failures here never surface to a player-facing caller.
    pub async fn sweep_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query("UPDATE eligibilities SET status = 'expired' WHERE status = 'active' AND expires_at <= $1")
            .bind(self.clock.now())
            .execute(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
        Ok(result.rows_affected())
    }

    pub async fn validate(&self, eligibility_id: &EligibilityId) -> Result<Eligibility, Error> {
        let row: Option<EligibilityRow> = sqlx::query_as(
            "SELECT id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at \
             FROM eligibilities WHERE id = $1",
        )
        .bind(eligibility_id)
        .fetch_optional(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

        let eligibility: Eligibility = row
            .ok_or_else(|| Error::not_found(format!("no eligibility {eligibility_id}")))?
            .try_into()?;

        if eligibility.status == trivia_types::EligibilityStatus::Used {
            return Err(Error::already_used());
        }
        if eligibility.status == trivia_types::EligibilityStatus::Expired
            || eligibility.is_expired_at(self.clock.now())
        {
            return Err(Error::expired());
        }
        Ok(eligibility)
    }

    /// True iff at least one catalog item in `category_id` is unminted.
    pub async fn check_stock(&self, category_id: &CategoryId) -> Result<bool, Error> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM nft_catalog WHERE category_id = $1 AND stock_state = 'available')",
        )
        .bind(category_id)
        .fetch_one(self.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
        Ok(exists.0)
    }

    /// Atomically: validates the eligibility, reserves one unminted catalog
    /// row via `FOR UPDATE SKIP LOCKED`, marks the eligibility `used`, and
    /// inserts a `pending` `MintOperation`. Rolls back entirely on any
    /// failure, so no stock is lost.
    pub async fn consume(&self, eligibility_id: EligibilityId, mint_operation_id: MintOperationId) -> Result<MintOperation, Error> {
        let now = self.clock.now();
        let policy_id = self.config.policy_id.clone();
        self.store
            .tx(move |txn: &mut Transaction<'static, Postgres>| {
                Box::pin(async move { consume_in_tx(txn, eligibility_id, mint_operation_id, now, policy_id).await })
            })
            .await
    }

    /// Reverts a `reserved` catalog row back to `available`. Called by the
    /// Workflow Engine's compensation path on any terminal Mint failure
    /// before the database is updated: stock must never be lost just
    /// because a chain call failed after reservation.
    pub async fn revert_reservation(&self, catalog_item_id: trivia_types::CatalogItemId) -> Result<(), Error> {
        let result = sqlx::query("UPDATE nft_catalog SET stock_state = 'available' WHERE id = $1 AND stock_state = 'reserved'")
            .bind(catalog_item_id)
            .execute(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
        if result.rows_affected() == 0 {
            warn!(catalog_item_id = %catalog_item_id, "revert_reservation found no reserved row to release");
        }
        Ok(())
    }

    /// Flips a `reserved` catalog row to `minted`. Called at the Workflow
    /// Engine's `updateDatabase` linearization point once a Mint is
    /// confirmed — the Ledger remains the sole mutator of catalog stock
    /// state even though the Workflow Engine drives the transaction.
    pub async fn finalize_minted(&self, catalog_item_id: trivia_types::CatalogItemId) -> Result<(), Error> {
        sqlx::query("UPDATE nft_catalog SET stock_state = 'minted' WHERE id = $1")
            .bind(catalog_item_id)
            .execute(self.store.pool())
            .await
            .map_err(trivia_store_sql::pool::to_external)?;
        Ok(())
    }
}

async fn consume_in_tx(
    txn: &mut Transaction<'static, Postgres>,
    eligibility_id: EligibilityId,
    mint_operation_id: MintOperationId,
    now: OffsetDateTime,
    policy_id: String,
) -> Result<MintOperation, Error> {
    let row: Option<EligibilityRow> = sqlx::query_as(
        "SELECT id, eligibility_type, category_id, season_id, player_id, issued_from_session, status, issued_at, expires_at \
         FROM eligibilities WHERE id = $1 FOR UPDATE",
    )
    .bind(eligibility_id)
    .fetch_optional(&mut **txn)
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    let eligibility: Eligibility = row
        .ok_or_else(|| Error::not_found(format!("no eligibility {eligibility_id}")))?
        .try_into()?;

    if eligibility.status == trivia_types::EligibilityStatus::Used {
        return Err(Error::already_used());
    }
    if eligibility.status == trivia_types::EligibilityStatus::Expired || eligibility.is_expired_at(now) {
        return Err(Error::expired());
    }
    if eligibility.eligibility_type != ScopeKind::Category {
        return Err(Error::fatal("only category-scoped eligibilities consume catalog stock via this path"));
    }
    let category_id = eligibility
        .category_id
        .ok_or_else(|| Error::fatal("category eligibility row has no category_id"))?;

    let catalog_row: Option<NftCatalogRow> = sqlx::query_as(
        "SELECT id, category_id, display_name, artwork_blob_key, metadata_blob_key, content_address, stock_state, tier \
         FROM nft_catalog WHERE category_id = $1 AND stock_state = 'available' ORDER BY random() LIMIT 1 FOR UPDATE SKIP LOCKED",
    )
    .bind(category_id)
    .fetch_optional(&mut **txn)
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    let catalog_item = catalog_row.ok_or_else(Error::no_stock)?;

    sqlx::query("UPDATE nft_catalog SET stock_state = 'reserved' WHERE id = $1")
        .bind(catalog_item.id)
        .execute(&mut **txn)
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    sqlx::query("UPDATE eligibilities SET status = 'used' WHERE id = $1")
        .bind(eligibility_id)
        .execute(&mut **txn)
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    let stake: Option<String> = sqlx::query("SELECT stake FROM players WHERE id = $1")
        .bind(eligibility.player_id)
        .fetch_one(&mut **txn)
        .await
        .map_err(trivia_store_sql::pool::to_external)?
        .try_get("stake")
        .map_err(trivia_store_sql::pool::to_external)?;
    let stake = stake.ok_or_else(|| Error::forbidden("minting requires a connected (staked) player"))?;

    sqlx::query(
        "INSERT INTO mints (id, eligibility_id, catalog_id, player_id, stake, policy_id, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)",
    )
    .bind(mint_operation_id)
    .bind(eligibility_id)
    .bind(catalog_item.id)
    .bind(eligibility.player_id)
    .bind(&stake)
    .bind(&policy_id)
    .bind(now)
    .execute(&mut **txn)
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    let inserted: MintOperationRow = sqlx::query_as(
        "SELECT id, eligibility_id, catalog_id, player_id, stake, policy_id, status, tx_hash, error, created_at, confirmed_at \
         FROM mints WHERE id = $1",
    )
    .bind(mint_operation_id)
    .fetch_one(&mut **txn)
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    inserted.try_into()
}
