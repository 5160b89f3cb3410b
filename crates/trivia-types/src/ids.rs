//! Entity identifiers and player-identity union.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;
pub type CategoryId = Uuid;
pub type QuestionId = Uuid;
pub type SessionId = Uuid;
pub type EligibilityId = Uuid;
pub type CatalogItemId = Uuid;
pub type OwnedAssetId = Uuid;
pub type MintOperationId = Uuid;
pub type ForgeOperationId = Uuid;

/// Season ids are human-chosen slugs (e.g. `winter-s1`), not UUIDs.
pub type SeasonId = String;

/// A stable blockchain-derived identity string for a connected player.
pub type Stake = String;

/// A server-assigned identifier for a guest (unconnected) player.
pub type AnonId = String;

/// Exactly one of {stake, anon} identifies a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlayerIdentity {
    Stake(Stake),
    Anon(AnonId),
}

impl PlayerIdentity {
    /// The string used as the KV identity component in lock/cap/cooldown/seen
    /// keys (`lock:session:{identity}`, `limit:daily:{identity}:{date}`, …).
    pub fn kv_identity(&self) -> &str {
        match self {
            PlayerIdentity::Stake(s) => s,
            PlayerIdentity::Anon(a) => a,
        }
    }

    pub fn stake(&self) -> Option<&str> {
        match self {
            PlayerIdentity::Stake(s) => Some(s),
            PlayerIdentity::Anon(_) => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, PlayerIdentity::Stake(_))
    }
}
