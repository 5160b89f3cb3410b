//! NFT catalog, owned assets, and mint/forge operation rows.

use crate::ids::{
    CatalogItemId, CategoryId, EligibilityId, ForgeOperationId, MintOperationId, OwnedAssetId,
    PlayerId, SeasonId, Stake,
};
use crate::scope::{AssetTier, ScopeKind};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// `is_minted` is not a bool: it is a three-state field so stock
/// reservation is race-safe (decision recorded in DESIGN.md). `Available`
/// == `is_minted=false`, `Reserved` == `is_minted=pending`, `Minted` ==
/// `is_minted=true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStockState {
    Available,
    Reserved,
    Minted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftCatalogItem {
    pub id: CatalogItemId,
    pub category_id: CategoryId,
    pub display_name: String,
    pub artwork_blob_key: String,
    pub metadata_blob_key: String,
    pub content_address: Option<String>,
    pub stock_state: CatalogStockState,
    pub tier: AssetTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    Mint,
    Forge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnedAssetStatus {
    Confirmed,
    Burned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnedAsset {
    pub id: OwnedAssetId,
    pub stake: Stake,
    pub policy_id: String,
    /// Globally unique.
    pub fingerprint: String,
    /// Produced by the Asset-Name Codec.
    pub asset_name: String,
    pub source: AssetSource,
    pub category_id: Option<CategoryId>,
    pub season_id: Option<SeasonId>,
    pub tier: AssetTier,
    pub status: OwnedAssetStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub minted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub burned_at: Option<OffsetDateTime>,
    pub metadata: serde_json::Value,
}

impl OwnedAsset {
    pub fn is_burnable(&self) -> bool {
        self.status == OwnedAssetStatus::Confirmed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Confirmed,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OperationStatus::Confirmed | OperationStatus::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintOperation {
    pub id: MintOperationId,
    pub eligibility_id: EligibilityId,
    pub catalog_id: CatalogItemId,
    pub player_id: PlayerId,
    pub stake: Stake,
    pub policy_id: String,
    pub status: OperationStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub confirmed_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgeOperation {
    pub id: ForgeOperationId,
    pub scope: ScopeKind,
    pub stake: Stake,
    pub category_id: Option<CategoryId>,
    pub season_id: Option<SeasonId>,
    /// Set of 1..N input asset fingerprints.
    pub input_fingerprints: Vec<String>,
    pub burn_tx_hash: Option<String>,
    pub mint_tx_hash: Option<String>,
    pub output_fingerprint: Option<String>,
    pub status: OperationStatus,
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub confirmed_at: Option<OffsetDateTime>,
}
