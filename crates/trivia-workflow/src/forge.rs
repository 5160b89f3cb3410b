//! Forge step chain: `validateOwnership -> buildBurnTx ->
//! signBurnTx -> submitBurnTx -> waitForBurnConfirmation ->
//! buildMintUltimateTx -> signMintTx -> submitMintTx ->
//! waitForMintConfirmation -> updateForgeRecord`.
//!
//! `validate_forge_shape` is split out as a pure function — it takes
//! already-fetched rows, not a database handle — the same separation the
//! Leaderboard Engine uses for its composite-score math, so the structural
//! rule can be unit tested without Postgres.

use std::collections::{HashMap, HashSet};

use trivia_error::Error;
use trivia_types::{AssetTier, CategoryId, OwnedAsset, OwnedAssetStatus, ScopeKind};

/// Enforces the three structural rules:
/// - **category**: exactly 10 inputs, one shared category, all tier=category.
/// - **master**: exactly 10 inputs, 10 distinct categories, all tier=category.
/// - **season**: each `active_category_ids` entry contributes exactly 2
///   inputs, all tier=category and season-tagged, no input from outside
///   `active_category_ids`.
///
/// Every input must also be `confirmed` and owned by the stake the forge
/// request names — callers check that before this function runs, since it
/// needs no category list to verify, only the stake comparison the caller
/// already has from its own query.
pub fn validate_forge_shape(
    scope: ScopeKind,
    inputs: &[OwnedAsset],
    active_category_ids: &[CategoryId],
) -> Result<(), Error> {
    for asset in inputs {
        if asset.status != OwnedAssetStatus::Confirmed {
            return Err(Error::invalid_forge_set(format!(
                "input {} is not in confirmed status",
                asset.fingerprint
            )));
        }
        if asset.tier != AssetTier::Category {
            return Err(Error::invalid_forge_set(format!(
                "input {} is tier {:?}, forging requires tier=category inputs",
                asset.fingerprint, asset.tier
            )));
        }
    }

    match scope {
        ScopeKind::Category => {
            if inputs.len() != 10 {
                return Err(Error::invalid_forge_set(format!(
                    "category forge requires exactly 10 inputs, got {}",
                    inputs.len()
                )));
            }
            let mut categories = input_categories(inputs)?;
            categories.sort();
            categories.dedup();
            if categories.len() != 1 {
                return Err(Error::invalid_forge_set("category forge inputs must all share one category"));
            }
        }
        ScopeKind::Master => {
            if inputs.len() != 10 {
                return Err(Error::invalid_forge_set(format!(
                    "master forge requires exactly 10 inputs, got {}",
                    inputs.len()
                )));
            }
            let categories: HashSet<CategoryId> = input_categories(inputs)?.into_iter().collect();
            if categories.len() != 10 {
                return Err(Error::invalid_forge_set("master forge requires 10 distinct categories"));
            }
        }
        ScopeKind::Season => {
            for asset in inputs {
                if asset.season_id.is_none() {
                    return Err(Error::invalid_forge_set(format!(
                        "input {} is not season-tagged",
                        asset.fingerprint
                    )));
                }
            }
            let mut counts: HashMap<CategoryId, usize> = HashMap::new();
            for category_id in input_categories(inputs)? {
                *counts.entry(category_id).or_default() += 1;
            }
            for category_id in active_category_ids {
                if counts.get(category_id).copied().unwrap_or(0) != 2 {
                    return Err(Error::invalid_forge_set(format!(
                        "active category {category_id} must contribute exactly 2 inputs"
                    )));
                }
            }
            let allowed: HashSet<&CategoryId> = active_category_ids.iter().collect();
            if counts.keys().any(|c| !allowed.contains(c)) {
                return Err(Error::invalid_forge_set("season forge contains a category outside the named season"));
            }
        }
    }
    Ok(())
}

fn input_categories(inputs: &[OwnedAsset]) -> Result<Vec<CategoryId>, Error> {
    inputs
        .iter()
        .map(|a| a.category_id.ok_or_else(|| Error::invalid_forge_set(format!("input {} has no category", a.fingerprint))))
        .collect()
}

// --- Step chain: buildBurnTx -> ... -> updateForgeRecord ------------------
//
// `validateOwnership` combines the ownership/status query (here, not a pure
// function) with `validate_forge_shape` above. The burn side has no stock
// reservation to compensate on failure — nothing is mutated until a step
// actually confirms on chain — so the only compensation available is the
// one this workflow can actually perform: once the burn is confirmed, a later
// failure cannot be rolled back (burned inputs cannot be unburned), so it is
// recorded on the row for operator tooling instead of auto-reverted.

use std::sync::Arc;

use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use trivia_external::{Blockchain, Clock, Rng, TxEnvelope};
use trivia_store_sql::rows::{CategoryRow, ForgeOperationRow, OwnedAssetRow};
use trivia_store_sql::SqlStore;
use trivia_types::ForgeOperationId;

use crate::config::WorkflowConfig;
use crate::mint::hex_id_from_uuid;
use crate::retry::with_retry;

pub struct ForgeDeps {
    pub store: Arc<SqlStore>,
    pub blockchain: Arc<dyn Blockchain>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn Rng>,
    pub config: WorkflowConfig,
}

/// Inserts the `pending` forge_operations row after checking ownership and
/// the structural shape, returning its id. Mirrors `EligibilityLedger::consume`'s
/// split: the synchronous validate-and-reserve half runs here; `run` then
/// drives the row to a terminal state.
pub async fn start(
    deps: &ForgeDeps,
    scope: ScopeKind,
    stake: &str,
    input_fingerprints: Vec<String>,
    category_id: Option<CategoryId>,
    season_id: Option<String>,
) -> Result<ForgeOperationId, Error> {
    let owned_rows: Vec<OwnedAssetRow> = sqlx::query_as(
        "SELECT id, stake, policy_id, fingerprint, asset_name, source, category_id, season_id, tier, status, minted_at, burned_at, metadata \
         FROM player_nfts WHERE fingerprint = ANY($1) AND stake = $2",
    )
    .bind(&input_fingerprints)
    .bind(stake)
    .fetch_all(deps.store.pool())
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    if owned_rows.len() != input_fingerprints.len() {
        return Err(Error::forbidden("one or more inputs are not owned by the invoking stake"));
    }

    let assets: Vec<OwnedAsset> = owned_rows.into_iter().map(OwnedAsset::try_from).collect::<Result<_, _>>()?;

    let active_category_ids: Vec<CategoryId> = sqlx::query_as("SELECT id FROM categories WHERE active = true")
        .fetch_all(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?
        .into_iter()
        .map(|(id,): (Uuid,)| id)
        .collect();

    validate_forge_shape(scope, &assets, &active_category_ids)?;

    let id = ForgeOperationId::new_v4();
    let scope_str = match scope {
        ScopeKind::Category => "category",
        ScopeKind::Master => "master",
        ScopeKind::Season => "season",
    };
    sqlx::query(
        "INSERT INTO forge_operations \
         (id, scope, stake, category_id, season_id, input_fingerprints, status, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7)",
    )
    .bind(id)
    .bind(scope_str)
    .bind(stake)
    .bind(category_id)
    .bind(&season_id)
    .bind(&input_fingerprints)
    .bind(deps.clock.now())
    .execute(deps.store.pool())
    .await
    .map_err(trivia_store_sql::pool::to_external)?;

    Ok(id)
}

/// Drives one forge operation to a terminal state, resuming from whichever
/// column is already populated.
pub async fn run(deps: &ForgeDeps, forge_operation_id: ForgeOperationId) -> Result<(), Error> {
    let op = load_operation(&deps.store, forge_operation_id).await?;
    if op.status != "pending" {
        info!(%forge_operation_id, status = %op.status, "forge operation already terminal, nothing to do");
        return Ok(());
    }

    match drive(deps, &op).await {
        Ok(()) => Ok(()),
        Err(e) => {
            if op.burn_tx_hash.is_some() {
                warn!(%forge_operation_id, error = %e, "forge failed after burn was submitted, flagging for operator review");
                mark_failed(&deps.store, forge_operation_id, &format!("BURN_UNRESOLVED: {e}")).await?;
            } else {
                mark_failed(&deps.store, forge_operation_id, &e.to_string()).await?;
            }
            Err(e)
        }
    }
}

async fn drive(deps: &ForgeDeps, op: &ForgeOperationRow) -> Result<(), Error> {
    let burn_tx_hash = ensure_burn_submitted(deps, op).await?;

    with_retry(&deps.config.retry, "waitForBurnConfirmation", || {
        let blockchain = deps.blockchain.clone();
        let tx_hash = burn_tx_hash.clone();
        let required = deps.config.confirmations_required;
        async move { wait_for_confirmations(blockchain.as_ref(), &tx_hash, required).await }
    })
    .await?;

    let (asset_name, category_code) = build_ultimate_name(deps, op).await?;
    let mint_tx_hash = ensure_mint_submitted(deps, op, &asset_name, category_code.as_deref()).await?;

    with_retry(&deps.config.retry, "waitForMintConfirmation", || {
        let blockchain = deps.blockchain.clone();
        let tx_hash = mint_tx_hash.clone();
        let required = deps.config.confirmations_required;
        async move { wait_for_confirmations(blockchain.as_ref(), &tx_hash, required).await }
    })
    .await?;

    update_forge_record(deps, op, &asset_name, &mint_tx_hash).await
}

async fn wait_for_confirmations(blockchain: &dyn Blockchain, tx_hash: &str, required: u32) -> Result<(), Error> {
    let confirmations = blockchain.get_confirmations(tx_hash).await?;
    if confirmations >= required {
        Ok(())
    } else {
        Err(Error::external(format!("{confirmations}/{required} confirmations for {tx_hash}"), true))
    }
}

async fn ensure_burn_submitted(deps: &ForgeDeps, op: &ForgeOperationRow) -> Result<String, Error> {
    if let Some(tx_hash) = &op.burn_tx_hash {
        return Ok(tx_hash.clone());
    }

    let envelope = TxEnvelope {
        kind: "burn".to_string(),
        payload: serde_json::json!({
            "stake": op.stake,
            "fingerprints": op.input_fingerprints,
        }),
    };

    let unsigned = with_retry(&deps.config.retry, "buildBurnTx", || {
        let blockchain = deps.blockchain.clone();
        let envelope = envelope.clone();
        async move { blockchain.build_tx(&envelope).await }
    })
    .await?;

    let key_ref = deps.config.forge_key_ref.clone();
    let signed = with_retry(&deps.config.retry, "signBurnTx", || {
        let blockchain = deps.blockchain.clone();
        let unsigned = unsigned.clone();
        let key_ref = key_ref.clone();
        async move { blockchain.sign(unsigned, &key_ref).await }
    })
    .await?;

    let tx_hash = with_retry(&deps.config.retry, "submitBurnTx", || {
        let blockchain = deps.blockchain.clone();
        let signed = signed.clone();
        async move { blockchain.submit(signed).await }
    })
    .await?;

    sqlx::query("UPDATE forge_operations SET burn_tx_hash = $1 WHERE id = $2")
        .bind(&tx_hash)
        .bind(op.id)
        .execute(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    Ok(tx_hash)
}

/// Builds the ultimate asset's name. The hex id is derived from the forge
/// operation's own id, same determinism reasoning as the Mint chain.
async fn build_ultimate_name(deps: &ForgeDeps, op: &ForgeOperationRow) -> Result<(String, Option<String>), Error> {
    let hex_id = hex_id_from_uuid(op.id);
    let scope = scope_from_row(op)?;
    match scope {
        ScopeKind::Category => {
            let category_id = op.category_id.ok_or_else(|| Error::fatal("category forge has no category_id"))?;
            let category = load_category(&deps.store, category_id).await?;
            let name = trivia_codec::build(AssetTier::CategoryUltimate, Some(&category.code), None, &hex_id)?;
            Ok((name, Some(category.code)))
        }
        ScopeKind::Master => {
            let name = trivia_codec::build(AssetTier::MasterUltimate, None, None, &hex_id)?;
            Ok((name, None))
        }
        ScopeKind::Season => {
            let season_code = op.season_id.clone().ok_or_else(|| Error::fatal("season forge has no season_id"))?;
            let name = trivia_codec::build(AssetTier::SeasonalUltimate, None, Some(&season_code), &hex_id)?;
            Ok((name, None))
        }
    }
}

fn scope_from_row(op: &ForgeOperationRow) -> Result<ScopeKind, Error> {
    match op.scope.as_str() {
        "category" => Ok(ScopeKind::Category),
        "master" => Ok(ScopeKind::Master),
        "season" => Ok(ScopeKind::Season),
        other => Err(Error::fatal(format!("unknown forge scope in row: {other}"))),
    }
}

async fn ensure_mint_submitted(
    deps: &ForgeDeps,
    op: &ForgeOperationRow,
    asset_name: &str,
    category_code: Option<&str>,
) -> Result<String, Error> {
    if let Some(tx_hash) = &op.mint_tx_hash {
        return Ok(tx_hash.clone());
    }

    let envelope = TxEnvelope {
        kind: "mint_ultimate".to_string(),
        payload: serde_json::json!({
            "stake": op.stake,
            "assetName": asset_name,
            "categoryCode": category_code,
            "seasonId": op.season_id,
        }),
    };

    let unsigned = with_retry(&deps.config.retry, "buildMintUltimateTx", || {
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

    sqlx::query("UPDATE forge_operations SET mint_tx_hash = $1 WHERE id = $2")
        .bind(&tx_hash)
        .bind(op.id)
        .execute(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;

    Ok(tx_hash)
}

async fn update_forge_record(
    deps: &ForgeDeps,
    op: &ForgeOperationRow,
    asset_name: &str,
    mint_tx_hash: &str,
) -> Result<(), Error> {
    let policy_id = load_any_input_policy_id(deps, op).await?;
    let fingerprint = with_retry(&deps.config.retry, "updateForgeRecord", || {
        let blockchain = deps.blockchain.clone();
        let policy_id = policy_id.clone();
        let asset_name = asset_name.to_string();
        async move { blockchain.get_asset_fingerprint(&policy_id, &asset_name).await }
    })
    .await?;

    let scope = scope_from_row(op)?;
    let tier = match scope {
        ScopeKind::Category => AssetTier::CategoryUltimate,
        ScopeKind::Master => AssetTier::MasterUltimate,
        ScopeKind::Season => AssetTier::SeasonalUltimate,
    };

    let now = deps.clock.now();
    let store = deps.store.clone();
    let op_id = op.id;
    let op_stake = op.stake.clone();
    let fingerprints = op.input_fingerprints.clone();
    let category_id = op.category_id;
    let season_id = op.season_id.clone();
    let asset_name = asset_name.to_string();
    let mint_tx_hash = mint_tx_hash.to_string();
    let tier_str = match tier {
        AssetTier::CategoryUltimate => "category_ultimate",
        AssetTier::MasterUltimate => "master_ultimate",
        AssetTier::SeasonalUltimate => "seasonal_ultimate",
        AssetTier::Category => unreachable!("forge never produces a plain category-tier output"),
    };

    store
        .tx(move |txn: &mut Transaction<'static, Postgres>| {
            let fingerprint = fingerprint.clone();
            let asset_name = asset_name.clone();
            let mint_tx_hash = mint_tx_hash.clone();
            let op_stake = op_stake.clone();
            let fingerprints = fingerprints.clone();
            let category_id = category_id;
            let season_id = season_id.clone();
            Box::pin(async move {
                sqlx::query(
                    "UPDATE forge_operations SET status = 'confirmed', mint_tx_hash = $1, output_fingerprint = $2, confirmed_at = $3 \
                     WHERE id = $4",
                )
                .bind(&mint_tx_hash)
                .bind(&fingerprint)
                .bind(now)
                .bind(op_id)
                .execute(&mut **txn)
                .await
                .map_err(trivia_store_sql::pool::to_external)?;

                sqlx::query("UPDATE player_nfts SET status = 'burned', burned_at = $1 WHERE fingerprint = ANY($2) AND stake = $3")
                    .bind(now)
                    .bind(&fingerprints)
                    .bind(&op_stake)
                    .execute(&mut **txn)
                    .await
                    .map_err(trivia_store_sql::pool::to_external)?;

                sqlx::query(
                    "INSERT INTO player_nfts \
                     (id, stake, policy_id, fingerprint, asset_name, source, category_id, season_id, tier, status, minted_at, metadata) \
                     VALUES ($1, $2, $3, $4, $5, 'forge', $6, $7, $8, 'confirmed', $9, $10)",
                )
                .bind(Uuid::new_v4())
                .bind(&op_stake)
                .bind(&policy_id)
                .bind(&fingerprint)
                .bind(&asset_name)
                .bind(category_id)
                .bind(&season_id)
                .bind(tier_str)
                .bind(now)
                .bind(serde_json::json!({}))
                .execute(&mut **txn)
                .await
                .map_err(trivia_store_sql::pool::to_external)?;

                Ok(())
            })
        })
        .await
}

async fn load_any_input_policy_id(deps: &ForgeDeps, op: &ForgeOperationRow) -> Result<String, Error> {
    let row: (String,) = sqlx::query_as("SELECT policy_id FROM player_nfts WHERE fingerprint = $1")
        .bind(op.input_fingerprints.first().ok_or_else(|| Error::fatal("forge operation has no input fingerprints"))?)
        .fetch_one(deps.store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
    Ok(row.0)
}

async fn mark_failed(store: &SqlStore, forge_operation_id: ForgeOperationId, error: &str) -> Result<(), Error> {
    sqlx::query("UPDATE forge_operations SET status = 'failed', error = $1 WHERE id = $2")
        .bind(error)
        .bind(forge_operation_id)
        .execute(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
    Ok(())
}

async fn load_operation(store: &SqlStore, forge_operation_id: ForgeOperationId) -> Result<ForgeOperationRow, Error> {
    sqlx::query_as(
        "SELECT id, scope, stake, category_id, season_id, input_fingerprints, burn_tx_hash, mint_tx_hash, output_fingerprint, status, error, created_at, confirmed_at \
         FROM forge_operations WHERE id = $1",
    )
    .bind(forge_operation_id)
    .fetch_optional(store.pool())
    .await
    .map_err(trivia_store_sql::pool::to_external)?
    .ok_or_else(|| Error::not_found(format!("no forge operation {forge_operation_id}")))
}

async fn load_category(store: &SqlStore, category_id: Uuid) -> Result<CategoryRow, Error> {
    sqlx::query_as("SELECT id, slug, code, active FROM categories WHERE id = $1")
        .bind(category_id)
        .fetch_optional(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?
        .ok_or_else(|| Error::fatal(format!("forge operation references missing category {category_id}")))
}

/// Stale `pending` forge operations older than `stale_after_secs`.
pub async fn find_stale(store: &SqlStore, stale_after_secs: i64, now: OffsetDateTime) -> Result<Vec<ForgeOperationId>, Error> {
    let threshold = now - time::Duration::seconds(stale_after_secs);
    let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM forge_operations WHERE status = 'pending' AND created_at < $1")
        .bind(threshold)
        .fetch_all(store.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn asset(category_id: CategoryId, tier: AssetTier, season_id: Option<String>) -> OwnedAsset {
        OwnedAsset {
            id: Uuid::new_v4(),
            stake: "stake1".into(),
            policy_id: "trivianft1".into(),
            fingerprint: Uuid::new_v4().to_string(),
            asset_name: "TNFT_V1_SCI_REG_deadbeef".into(),
            source: trivia_types::AssetSource::Mint,
            category_id: Some(category_id),
            season_id,
            tier,
            status: OwnedAssetStatus::Confirmed,
            minted_at: OffsetDateTime::UNIX_EPOCH,
            burned_at: None,
            metadata: serde_json::json!({}),
        }
    }

    #[test]
    fn category_forge_accepts_ten_same_category_inputs() {
        let cat = Uuid::new_v4();
        let inputs: Vec<OwnedAsset> = (0..10).map(|_| asset(cat, AssetTier::Category, None)).collect();
        assert!(validate_forge_shape(ScopeKind::Category, &inputs, &[]).is_ok());
    }

    #[test]
    fn category_forge_rejects_nine_inputs() {
        let cat = Uuid::new_v4();
        let inputs: Vec<OwnedAsset> = (0..9).map(|_| asset(cat, AssetTier::Category, None)).collect();
        let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }

    #[test]
    fn category_forge_rejects_mixed_categories() {
        let mut inputs: Vec<OwnedAsset> = (0..9).map(|_| asset(Uuid::new_v4(), AssetTier::Category, None)).collect();
        inputs.push(asset(Uuid::new_v4(), AssetTier::Category, None));
        let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }

    #[test]
    fn master_forge_requires_ten_distinct_categories() {
        let inputs: Vec<OwnedAsset> = (0..10).map(|_| asset(Uuid::new_v4(), AssetTier::Category, None)).collect();
        assert!(validate_forge_shape(ScopeKind::Master, &inputs, &[]).is_ok());
    }

    #[test]
    fn master_forge_rejects_a_repeated_category() {
        let shared = Uuid::new_v4();
        let mut inputs: Vec<OwnedAsset> = (0..9).map(|_| asset(Uuid::new_v4(), AssetTier::Category, None)).collect();
        inputs.push(asset(shared, AssetTier::Category, None));
        inputs[0].category_id = Some(shared);
        let err = validate_forge_shape(ScopeKind::Master, &inputs, &[]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }

    #[test]
    fn season_forge_requires_exactly_two_per_active_category() {
        let cat_a = Uuid::new_v4();
        let cat_b = Uuid::new_v4();
        let mut inputs = vec![
            asset(cat_a, AssetTier::Category, Some("winter-s1".into())),
            asset(cat_a, AssetTier::Category, Some("winter-s1".into())),
            asset(cat_b, AssetTier::Category, Some("winter-s1".into())),
            asset(cat_b, AssetTier::Category, Some("winter-s1".into())),
        ];
        assert!(validate_forge_shape(ScopeKind::Season, &inputs, &[cat_a, cat_b]).is_ok());

        inputs.pop();
        let err = validate_forge_shape(ScopeKind::Season, &inputs, &[cat_a, cat_b]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }

    #[test]
    fn season_forge_rejects_inputs_missing_season_tag() {
        let cat = Uuid::new_v4();
        let inputs = vec![asset(cat, AssetTier::Category, None), asset(cat, AssetTier::Category, None)];
        let err = validate_forge_shape(ScopeKind::Season, &inputs, &[cat]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }

    #[test]
    fn burned_input_is_rejected_regardless_of_shape() {
        let cat = Uuid::new_v4();
        let mut inputs: Vec<OwnedAsset> = (0..10).map(|_| asset(cat, AssetTier::Category, None)).collect();
        inputs[3].status = OwnedAssetStatus::Burned;
        let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
        assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
    }
}
