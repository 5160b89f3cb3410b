//! The three-way scope shared by Eligibility.type and ForgeOperation.type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Category,
    Master,
    Season,
}

/// Tier of an on-chain asset. Distinct from `ScopeKind`: tiers add
/// the `category` / `category_ultimate` split that scopes don't need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetTier {
    Category,
    CategoryUltimate,
    MasterUltimate,
    SeasonalUltimate,
}
