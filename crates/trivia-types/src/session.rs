//! Session entity and the embedded served-question records.

use crate::ids::{CategoryId, PlayerId, PlayerIdentity, QuestionId, SessionId};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const QUESTIONS_PER_SESSION: usize = 10;
pub const WIN_THRESHOLD: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Won,
    Lost,
    Forfeit,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

/// The four option strings captured at serve time, so later catalog
/// mutations never alter historical play. `correct_index` is server-side
/// only and must never be serialized to a client-facing response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedQuestionRecord {
    pub question_id: QuestionId,
    pub options: [String; 4],
    #[serde(with = "time::serde::rfc3339")]
    pub served_at: OffsetDateTime,
    pub answered_index: Option<u8>,
    pub answer_time_ms: Option<u32>,
    /// Never leaves the server. Dropped by `ServedQuestionRecord::scrub`.
    pub correct_index: u8,
    /// Revealed only after the answer to this slot is committed.
    pub explanation: String,
}

impl ServedQuestionRecord {
    pub fn new(
        question_id: QuestionId,
        options: [String; 4],
        correct_index: u8,
        explanation: String,
        served_at: OffsetDateTime,
    ) -> Self {
        Self {
            question_id,
            options,
            served_at,
            answered_index: None,
            answer_time_ms: None,
            correct_index,
            explanation,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.answered_index == Some(self.correct_index)
    }

    pub fn scrub(&self) -> ServedQuestionPublic {
        ServedQuestionPublic {
            question_id: self.question_id,
            options: self.options.clone(),
        }
    }
}

/// What is actually returned to a client: no correct index, no answer state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServedQuestionPublic {
    pub question_id: QuestionId,
    pub options: [String; 4],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub player_id: PlayerId,
    pub identity: PlayerIdentity,
    pub category_id: CategoryId,
    pub status: SessionStatus,
    pub current_question_index: u8,
    pub questions: Vec<ServedQuestionRecord>,
    pub score: u8,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub ended_at: Option<OffsetDateTime>,
    pub total_duration_ms: Option<u64>,
}

impl Session {
    /// Authoritative score: count of answered slots matching the stored
    /// correct index. `completeSession` recomputes from this, never trusts
    /// a running counter maintained elsewhere.
    pub fn recompute_score(&self) -> u8 {
        self.questions.iter().filter(|q| q.is_correct()).count() as u8
    }

    pub fn is_perfect(&self) -> bool {
        self.recompute_score() as usize == QUESTIONS_PER_SESSION
    }
}
