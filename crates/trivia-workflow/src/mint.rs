//! Mint step chain: `validateEligibility -> selectNFT ->
//! uploadToContentAddress -> buildMintTx -> signMintTx -> submitMintTx ->
//! waitForConfirmation -> updateDatabase`.
//!
//! `validateEligibility` and `selectNFT` are not separate steps here: the
//! Eligibility & Stock Ledger's `consume` already does both atomically
//! (validates the eligibility row, reserves one `available` catalog row
//! under `FOR UPDATE SKIP LOCKED`, and inserts the `pending` mint row) —
//! that structural rule is already built in the Ledger crate rather than
//! duplicated here. This chain starts from
//! the `pending` row `consume` produced and drives it to `confirmed` or
//! `failed`, resuming from whatever column already carries a value so a
//! crash mid-chain is safe to replay.

use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use trivia_error::Error;
use trivia_external::{Blockchain, BlobStore, Clock, ContentAddressing, Rng, TxEnvelope};
use trivia_ledger::EligibilityLedger;
use trivia_store_sql::rows::{CategoryRow, MintOperationRow, NftCatalogRow};
use trivia_store_sql::SqlStore;
use trivia_types::{AssetTier, MintOperationId};

use crate::config::WorkflowConfig;
use crate::retry::with_retry;

pub struct MintDeps {
    pub store: Arc<SqlStore>,
    pub ledger: Arc<EligibilityLedger>,
    pub blockchain: Arc<dyn Blockchain>,
    pub blob_store: Arc<dyn BlobStore>,
    pub content_addressing: Arc<dyn ContentAddressing>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn Rng>,
    pub config: WorkflowConfig,
}

/// Drives one mint operation to a terminal state. Safe to call repeatedly
/// on the same `mint_operation_id`: every step checks the persisted cursor
/// before doing its work.
pub async fn run(deps: &MintDeps, mint_operation_id: MintOperationId) -> Result<(), Error> {
    let op = load_operation(&deps.store, mint_operation_id).await?;
    if op.status != "pending" {
        info!(%mint_operation_id, status = %op.status, "mint operation already terminal, nothing to do");
        return Ok(());
    }

    match drive(deps, &op).await {
        Ok(()) => Ok(()),
        Err(e) => {
            warn!(%mint_operation_id, error = %e, "mint operation failed, compensating reservation");
            if let Err(compensate_err) = deps.ledger.revert_reservation(op.catalog_id).await {
                warn!(%mint_operation_id, error = %compensate_err, "compensation failed to release catalog reservation");
            }
            mark_failed(&deps.store, mint_operation_id, &e).await?;
            Err(e)
        }
    }
}

async fn drive(deps: &MintDeps, op: &MintOperationRow) -> Result<(), Error> {
    let catalog = load_catalog_item(&deps.store, op.catalog_id).await?;
    let category = load_category(&deps.store, catalog.category_id).await?;

    let content_address = ensure_content_address(deps, &catalog).await?;

    // The hex id is derived from the reserved catalog row's own id rather
    // than drawn from `Rng`, so replaying this step after a crash recomputes
    // the exact same asset name instead of a fresh one each time.
    let asset_name = build_asset_name(&category, catalog.id)?;

    let tx_hash = ensure_submitted(deps, op.id, &asset_name, &category, op, &content_address).await?;

    with_retry(&deps.config.retry, "waitForConfirmation", || {
        let blockchain = deps.blockchain.clone();
        let tx_hash = tx_hash.clone();
        let required = deps.config.confirmations_required;
        async move {
            let confirmations = blockchain.get_confirmations(&tx_hash).await?;
            if confirmations >= required {
                Ok(())
            } else {
                Err(Error::external(
                    format!("{confirmations}/{required} confirmations for {tx_hash}"),
                    true,
                ))
            }
        }
    })
    .await?;

    update_database(deps, op, &catalog, &asset_name, &tx_hash).await
}

async fn ensure_content_address(deps: &MintDeps, catalog: &NftCatalogRow) -> Result<String, Error> {
    if let Some(existing) = &catalog.content_address {
        return Ok(existing.clone());
    }

    let bytes = with_retry(&deps.config.retry, "uploadToContentAddress", || {
        let blob_store = deps.blob_store.clone();
        let key = catalog.metadata_blob_key.clone();
        async move { blob_store.get(&key).await }
    })
    .await?;

    let content_address = with_retry(&deps.config.retry, "uploadToContentAddress", || {
        let content_addressing = deps.content_addressing.clone();
        let bytes = bytes.clone();
        async move { content_addressing.pin(&bytes).await }
    })
    .await?;

    sqlx::query("UPDATE nft_catalog SET content_address = $1 WHERE id = $2 AND content_address IS NULL")
        .bind(&content_address)
        .bind(catalog.id)
        .execute(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    Ok(content_address)
}

fn build_asset_name(category: &CategoryRow, catalog_item_id: Uuid) -> Result<String, Error> {
    trivia_codec::build(AssetTier::Category, Some(&category.code), None, &hex_id_from_uuid(catalog_item_id))
}

/// First 8 lowercase-hex characters of `id`'s simple (no-dash) form. Used
/// everywhere this crate needs a codec hex id tied to an already-unique row
/// rather than drawn fresh from `Rng`, so the name a workflow step computes
/// is the same one every time that step replays.
pub(crate) fn hex_id_from_uuid(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Returns the submitted tx hash, building/signing/submitting only if the
/// row doesn't already carry one (idempotent replay on crash recovery).
async fn ensure_submitted(
    deps: &MintDeps,
    mint_operation_id: MintOperationId,
    asset_name: &str,
    category: &CategoryRow,
    op: &MintOperationRow,
    content_address: &str,
) -> Result<String, Error> {
    if let Some(tx_hash) = &op.tx_hash {
        return Ok(tx_hash.clone());
    }

    let envelope = TxEnvelope {
        kind: "mint".to_string(),
        payload: serde_json::json!({
            "policyId": op.policy_id,
            "assetName": asset_name,
            "stake": op.stake,
            "contentAddress": content_address,
            "categoryCode": category.code,
        }),
    };

    let unsigned = with_retry(&deps.config.retry, "buildMintTx", || {
        let blockchain = deps.blockchain.clone();
        let envelope = envelope.clone();
        async move { blockchain.build_tx(&envelope).await }
    })
    .await?;

    let key_ref = deps.config.mint_key_ref.clone();
    let signed = with_retry(&deps.config.retry, "signMintTx", || {
        let blockchain = deps.blockchain.clone();
        let unsigned = unsigned.clone();
        let key_ref = key_ref.clone();
        async move { blockchain.sign(unsigned, &key_ref).await }
    })
    .await?;

    let tx_hash = with_retry(&deps.config.retry, "submitMintTx", || {
        let blockchain = deps.blockchain.clone();
        let signed = signed.clone();
        async move { blockchain.submit(signed).await }
    })
    .await?;

    sqlx::query("UPDATE mints SET tx_hash = $1 WHERE id = $2")
        .bind(&tx_hash)
        .bind(mint_operation_id)
        .execute(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    Ok(tx_hash)
}

/// The linearization point: writes the confirmed tx hash,
/// inserts the owned-asset row, marks the operation `confirmed`, and flips
/// the catalog reservation to `minted` — all in one transaction so readers
/// never see a partially-applied mint.
async fn update_database(
    deps: &MintDeps,
    op: &MintOperationRow,
    catalog: &NftCatalogRow,
    asset_name: &str,
    tx_hash: &str,
) -> Result<(), Error> {
    let fingerprint = with_retry(&deps.config.retry, "updateDatabase", || {
        let blockchain = deps.blockchain.clone();
        let policy_id = op.policy_id.clone();
        let asset_name = asset_name.to_string();
        async move { blockchain.get_asset_fingerprint(&policy_id, &asset_name).await }
    })
    .await?;

    let now = deps.clock.now();
    let store = deps.store.clone();
    let op_id = op.id;
    let op_stake = op.stake.clone();
    let op_policy_id = op.policy_id.clone();
    let catalog_category_id = catalog.category_id;
    let asset_name = asset_name.to_string();
    let tx_hash = tx_hash.to_string();

    store
        .tx(move |txn: &mut Transaction<'static, Postgres>| {
            let fingerprint = fingerprint.clone();
            let asset_name = asset_name.clone();
            let tx_hash = tx_hash.clone();
            let op_stake = op_stake.clone();
            let op_policy_id = op_policy_id.clone();
            Box::pin(async move {
                sqlx::query("UPDATE mints SET status = 'confirmed', tx_hash = $1, confirmed_at = $2 WHERE id = $3")
                    .bind(&tx_hash)
                    .bind(now)
                    .bind(op_id)
                    .execute(&mut **txn)
                    .await
                    .map_err(trivia_store_sql::pool::to_external)?;

                sqlx::query(
                    "INSERT INTO player_nfts \
                     (id, stake, policy_id, fingerprint, asset_name, source, category_id, season_id, tier, status, minted_at, metadata) \
                     VALUES ($1, $2, $3, $4, $5, 'mint', $6, NULL, 'category', 'confirmed', $7, $8)",
                )
                .bind(Uuid::new_v4())
                .bind(&op_stake)
                .bind(&op_policy_id)
                .bind(&fingerprint)
                .bind(&asset_name)
                .bind(catalog_category_id)
                .bind(now)
                .bind(serde_json::json!({}))
                .execute(&mut **txn)
                .await
                .map_err(trivia_store_sql::pool::to_external)?;

                Ok(())
            })
        })
        .await?;

    deps.ledger.finalize_minted(catalog.id).await
}

async fn mark_failed(store: &SqlStore, mint_operation_id: MintOperationId, error: &Error) -> Result<(), Error> {
    sqlx::query("UPDATE mints SET status = 'failed', error = $1 WHERE id = $2")
        .bind(error.to_string())
        .bind(mint_operation_id)
        .execute(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
    Ok(())
}

async fn load_operation(store: &SqlStore, mint_operation_id: MintOperationId) -> Result<MintOperationRow, Error> {
    sqlx::query_as(
        "SELECT id, eligibility_id, catalog_id, player_id, stake, policy_id, status, tx_hash, error, created_at, confirmed_at \
         FROM mints WHERE id = $1",
    )
    .bind(mint_operation_id)
    .fetch_optional(store.pool())
    .await
    .map_err(trivia_store_sql::pool::to_external)?
    .ok_or_else(|| Error::not_found(format!("no mint operation {mint_operation_id}")))
}

async fn load_catalog_item(store: &SqlStore, catalog_id: Uuid) -> Result<NftCatalogRow, Error> {
    sqlx::query_as(
        "SELECT id, category_id, display_name, artwork_blob_key, metadata_blob_key, content_address, stock_state, tier \
         FROM nft_catalog WHERE id = $1",
    )
    .bind(catalog_id)
    .fetch_optional(store.pool())
    .await
    .map_err(trivia_store_sql::pool::to_external)?
    .ok_or_else(|| Error::fatal(format!("mint operation references missing catalog item {catalog_id}")))
}

async fn load_category(store: &SqlStore, category_id: Uuid) -> Result<CategoryRow, Error> {
    sqlx::query_as("SELECT id, slug, code, active FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?
        .ok_or_else(|| Error::fatal(format!("catalog item references missing category {category_id}")))
}

/// Stale `pending` mint operations older than `stale_after_secs`, for
/// crash-recovery resumption: operations left in a non-terminal status
/// past this age get resumed from their persisted step cursor.
pub async fn find_stale(store: &SqlStore, stale_after_secs: i64, now: time::OffsetDateTime) -> Result<Vec<MintOperationId>, Error> {
    let threshold = now - time::Duration::seconds(stale_after_secs);
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM mints WHERE status = 'pending' AND created_at < $1")
        .bind(threshold)
        .fetch_all(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}
