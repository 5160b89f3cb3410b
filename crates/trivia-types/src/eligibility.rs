//! Eligibility entity.

use crate::ids::{CategoryId, EligibilityId, PlayerId, SeasonId, SessionId};
use crate::scope::ScopeKind;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Active,
    Used,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eligibility {
    pub id: EligibilityId,
    pub eligibility_type: ScopeKind,
    pub category_id: Option<CategoryId>,
    pub season_id: Option<SeasonId>,
    pub player_id: PlayerId,
    pub issued_from_session: SessionId,
    pub status: EligibilityStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Eligibility {
    /// Active expires only when wall-clock > expiry — a row
    /// already `used`/`expired` is unaffected, regardless of `now`.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.status == EligibilityStatus::Active && now > self.expires_at
    }
}
