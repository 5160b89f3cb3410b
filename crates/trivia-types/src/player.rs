//! Player entity.

use crate::ids::{PlayerId, PlayerIdentity};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub identity: PlayerIdentity,
    pub username: Option<String>,
    pub email: Option<String>,
    pub payment_address: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen_at: OffsetDateTime,
}

impl Player {
    pub fn is_eligible_for_season_prize(&self) -> bool {
        self.identity.is_connected() && self.username.is_some()
    }
}
