//! Category catalog row and question entities.

use crate::ids::{CategoryId, PlayerId, QuestionId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Unique slug, e.g. `science`.
    pub slug: String,
    /// 3-5 uppercase-ASCII code used by the Asset-Name Codec, e.g. `SCI`.
    pub code: String,
    pub active: bool,
}

/// Immutable once indexed. Content hash dedups the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: String,
    pub options: [String; 4],
    pub correct_index: u8,
    pub explanation: String,
    pub source: String,
    /// Unique across the table; used for dedup against the question source.
    pub content_hash: String,
}

impl Question {
    pub fn option(&self, index: u8) -> Option<&str> {
        self.options.get(index as usize).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionFlag {
    pub id: uuid::Uuid,
    pub question_id: QuestionId,
    pub player_id: PlayerId,
    pub reason: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
