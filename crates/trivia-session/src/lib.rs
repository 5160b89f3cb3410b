//! Session Engine: the per-attempt state machine that serves
//! questions, validates timed answers, enforces the daily cap / cooldown /
//! single-attempt lock, and hands off to the Eligibility Ledger and
//! Leaderboard Engine on completion.
//!
//! Hot state is the serialized `Session` kept as a KV string (not a native
//! hash) under `session:{sessionId}` — the record is always read and
//! rewritten as one unit, so a whole-blob string lets the TTL live with the
//! value instead of needing a second call to set it on a hash field.

pub mod config;

use std::sync::Arc;

use time::{Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use tracing::{info, warn};
use uuid::Uuid;

use trivia_error::Error;
use trivia_external::{shuffle, Clock, QuestionSource, Rng};
use trivia_ledger::EligibilityLedger;
use trivia_leaderboard::{score::points_for_session, LeaderboardEngine, PointsUpdate};
use trivia_store_kv::KvStore;
use trivia_store_sql::SqlStore;
use trivia_types::{
    CategoryId, EligibilityId, PlayerId, PlayerIdentity, ServedQuestionPublic, ServedQuestionRecord,
    Session, SessionId, SessionStatus, QUESTIONS_PER_SESSION, WIN_THRESHOLD,
};

pub use config::SessionConfig;

fn lock_key(identity: &str) -> String {
    format!("lock:session:{identity}")
}

fn daily_key(identity: &str, date: time::Date) -> String {
    format!("limit:daily:{identity}:{date}")
}

fn cooldown_key(identity: &str) -> String {
    format!("cooldown:{identity}")
}

fn seen_key(identity: &str, category_id: &CategoryId, date: time::Date) -> String {
    format!("seen:{identity}:{category_id}:{date}")
}

fn hot_state_key(session_id: &SessionId) -> String {
    format!("session:{session_id}")
}

/// Seconds remaining until the next local midnight in `tz_offset_minutes`,
/// used as the TTL for counters that must roll over at local, not UTC,
/// midnight.
fn seconds_until_next_local_midnight(now: OffsetDateTime, today: time::Date, tz_offset_minutes: i16) -> u64 {
    let offset = UtcOffset::from_whole_seconds(tz_offset_minutes as i32 * 60).unwrap_or(UtcOffset::UTC);
    let tomorrow = today.next_day().unwrap_or(today);
    let next_midnight_local = PrimitiveDateTime::new(tomorrow, Time::MIDNIGHT).assume_offset(offset);
    let remaining = next_midnight_local - now;
    remaining.whole_seconds().max(1) as u64
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub correct_index: u8,
    pub explanation: String,
    pub score: u8,
}

#[derive(Debug, Clone)]
pub struct CompletionOutcome {
    pub score: u8,
    pub total_questions: u8,
    pub is_perfect: bool,
    pub eligibility_id: Option<EligibilityId>,
    pub status: SessionStatus,
    pub total_ms: u64,
}

pub struct SessionEngine {
    sql: Arc<SqlStore>,
    kv: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn Rng>,
    questions: Arc<dyn QuestionSource>,
    ledger: Arc<EligibilityLedger>,
    leaderboard: Arc<LeaderboardEngine>,
    config: SessionConfig,
}

impl SessionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sql: Arc<SqlStore>,
        kv: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn Rng>,
        questions: Arc<dyn QuestionSource>,
        ledger: Arc<EligibilityLedger>,
        leaderboard: Arc<LeaderboardEngine>,
        config: SessionConfig,
    ) -> Self {
        Self { sql, kv, clock, rng, questions, ledger, leaderboard, config }
    }

    pub async fn start_session(
        &self,
        player_id: PlayerId,
        identity: PlayerIdentity,
        category_id: CategoryId,
    ) -> Result<(Session, Vec<ServedQuestionPublic>), Error> {
        let kv_identity = identity.kv_identity().to_string();
        let now = self.clock.now();
        let today = self.clock.today(self.config.tz_offset_minutes);

        let lock = lock_key(&kv_identity);
        if self.kv.incr_with_ttl_on_create(&lock, self.config.lock_ttl_secs).await? != 1 {
            return Err(Error::active_session_exists());
        }
        // Every early return below must release this lock; only a
        // successfully-started session keeps it held until completeSession.
        let release_lock_on_err = || async {
            if let Err(e) = self.kv.del(&lock).await {
                warn!(error = %e, identity = %kv_identity, "failed to release session lock after a failed start");
            }
        };

        let daily_cap = if identity.is_connected() { self.config.daily_cap_connected } else { self.config.daily_cap_guest };
        let daily = daily_key(&kv_identity, today);
        let ttl = seconds_until_next_local_midnight(now, today, self.config.tz_offset_minutes);
        let count = match self.kv.incr_with_ttl_on_create(&daily, ttl).await {
            Ok(c) => c,
            Err(e) => {
                release_lock_on_err().await;
                return Err(e);
            }
        };
        if count > daily_cap as i64 {
            release_lock_on_err().await;
            return Err(Error::daily_limit_reached());
        }

        if self.kv.get(&cooldown_key(&kv_identity)).await?.is_some() {
            release_lock_on_err().await;
            return Err(Error::cooldown_active());
        }

        let seen = seen_key(&kv_identity, &category_id, today);
        let already_seen: Vec<Uuid> = self
            .kv
            .smembers(&seen)
            .await?
            .into_iter()
            .filter_map(|s| Uuid::parse_str(&s).ok())
            .collect();

        let pool_size = match self.questions.pool_size(&category_id).await {
            Ok(p) => p,
            Err(e) => {
                release_lock_on_err().await;
                return Err(e);
            }
        };

        let drawn = match self.draw_questions(&category_id, pool_size, &already_seen).await {
            Ok(d) => d,
            Err(e) => {
                release_lock_on_err().await;
                return Err(e);
            }
        };
        if drawn.len() < QUESTIONS_PER_SESSION {
            release_lock_on_err().await;
            return Err(Error::insufficient_questions());
        }

        let mut questions = drawn;
        shuffle(self.rng.as_ref(), &mut questions).await;

        let served: Vec<ServedQuestionRecord> = questions
            .iter()
            .map(|q| ServedQuestionRecord::new(q.id, q.options.clone(), q.correct_index, q.explanation.clone(), now))
            .collect();
        let public: Vec<ServedQuestionPublic> = served.iter().map(ServedQuestionRecord::scrub).collect();

        let session = Session {
            id: SessionId::new_v4(),
            player_id,
            identity,
            category_id,
            status: SessionStatus::Active,
            current_question_index: 0,
            questions: served,
            score: 0,
            started_at: now,
            ended_at: None,
            total_duration_ms: None,
        };

        if let Err(e) = self.persist_new_session(&session).await {
            release_lock_on_err().await;
            return Err(e);
        }

        for question in &questions {
            if let Err(e) = self.kv.sadd(&seen, &question.id.to_string(), Some(self.config.seen_ttl_secs)).await {
                warn!(error = %e, session_id = %session.id, "failed to record seen question; draws may repeat sooner than intended");
            }
        }

        if let Err(e) = self.write_hot_state(&session).await {
            release_lock_on_err().await;
            return Err(e);
        }

        info!(session_id = %session.id, category_id = %category_id, "session started");
        Ok((session, public))
    }

    /// Splits the draw into reused/new buckets once the pool clears the
    /// large-pool threshold; otherwise takes everything it can from the
    /// unfiltered pool.
    async fn draw_questions(
        &self,
        category_id: &CategoryId,
        pool_size: usize,
        already_seen: &[Uuid],
    ) -> Result<Vec<trivia_types::Question>, Error> {
        if pool_size < self.config.large_pool_threshold {
            return self.questions.draw(category_id, QUESTIONS_PER_SESSION, &[]).await;
        }

        let reused_count = ((QUESTIONS_PER_SESSION as f64) * self.config.reused_ratio).floor() as usize;
        let new_count = QUESTIONS_PER_SESSION - reused_count;

        let mut reused = self.questions.draw(category_id, reused_count, &[]).await?;
        let mut exclude: Vec<Uuid> = already_seen.to_vec();
        exclude.extend(reused.iter().map(|q| q.id));
        let new = self.questions.draw(category_id, new_count, &exclude).await?;

        reused.extend(new);
        Ok(reused)
    }

    async fn persist_new_session(&self, session: &Session) -> Result<(), Error> {
        let questions_json = sqlx::types::Json(&session.questions);
        sqlx::query(
            "INSERT INTO sessions \
             (id, player_id, stake, anon_id, category_id, status, current_question_index, questions, score, started_at) \
             VALUES ($1, $2, $3, $4, $5, 'active', 0, $6, 0, $7)",
        )
        .bind(session.id)
        .bind(session.player_id)
        .bind(session.identity.stake())
        .bind(match &session.identity {
            PlayerIdentity::Anon(a) => Some(a.as_str()),
            PlayerIdentity::Stake(_) => None,
        })
        .bind(session.category_id)
        .bind(questions_json)
        .bind(session.started_at)
        .execute(self.sql.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
        Ok(())
    }

    async fn write_hot_state(&self, session: &Session) -> Result<(), Error> {
        let json = serde_json::to_string(session).map_err(|e| Error::fatal(format!("session serialization failed: {e}")))?;
        self.kv.set(&hot_state_key(&session.id), &json, Some(self.config.hot_state_ttl_secs)).await
    }

    async fn read_hot_state(&self, session_id: &SessionId) -> Result<Session, Error> {
        let raw = self.kv.get(&hot_state_key(session_id)).await?.ok_or_else(Error::session_not_found)?;
        serde_json::from_str(&raw).map_err(|e| Error::fatal(format!("session deserialization failed: {e}")))
    }

    pub async fn submit_answer(
        &self,
        session_id: SessionId,
        question_index: u8,
        option_index: u8,
        time_ms: u32,
    ) -> Result<AnswerOutcome, Error> {
        let mut session = self.read_hot_state(&session_id).await?;
        if session.status.is_terminal() {
            return Err(Error::session_not_active());
        }
        if question_index != session.current_question_index {
            return Err(Error::wrong_question_index());
        }
        if time_ms > self.config.answer_timeout_ms {
            return Err(Error::answer_timeout());
        }
        if option_index > 3 {
            return Err(Error::input("option index must be in 0..=3"));
        }

        let slot = session
            .questions
            .get_mut(question_index as usize)
            .ok_or_else(|| Error::fatal("question_index within bounds but no served question at that slot"))?;
        slot.answered_index = Some(option_index);
        slot.answer_time_ms = Some(time_ms);
        let correct = slot.is_correct();
        let correct_index = slot.correct_index;
        let explanation = slot.explanation.clone();

        if correct {
            session.score += 1;
        }
        session.current_question_index += 1;

        self.write_hot_state(&session).await?;

        Ok(AnswerOutcome { correct, correct_index, explanation, score: session.score })
    }

    /// Terminates a session, recomputing the authoritative score from stored
    /// answers and routing the outcome to the Ledger and Leaderboard. Already
    /// idempotent: a terminal session's stored result is returned without
    /// re-running any side effect.
    pub async fn complete_session(&self, session_id: SessionId, forfeit: bool, active_season_id: &str) -> Result<CompletionOutcome, Error> {
        let session = self.read_hot_state(&session_id).await.or_else(|_| self.load_terminal_from_sql(&session_id));
        let mut session = session?;

        if session.status.is_terminal() {
            return Ok(self.outcome_from(&session));
        }

        let recomputed_score = session.recompute_score();
        let all_answered = session.current_question_index as usize >= QUESTIONS_PER_SESSION;
        if !all_answered && !forfeit {
            return Err(Error::input("completeSession called before all questions were answered"));
        }

        let status = if forfeit {
            SessionStatus::Forfeit
        } else if recomputed_score == QUESTIONS_PER_SESSION as u8 {
            SessionStatus::Won
        } else if recomputed_score >= WIN_THRESHOLD {
            SessionStatus::Won
        } else {
            SessionStatus::Lost
        };

        let now = self.clock.now();
        let total_duration_ms = (now - session.started_at).whole_milliseconds().max(0) as u64;
        session.score = recomputed_score;
        session.status = status;
        session.ended_at = Some(now);
        session.total_duration_ms = Some(total_duration_ms);

        self.finalize_session_sql(&session).await?;

        let is_perfect = status == SessionStatus::Won && recomputed_score == QUESTIONS_PER_SESSION as u8;
        let eligibility_id = if is_perfect && session.identity.is_connected() {
            match self.ledger.issue_on_perfect(&session).await {
                Ok(e) => Some(e.id),
                Err(e) => {
                    warn!(error = %e, session_id = %session_id, "issueOnPerfect failed after a perfect-score session was already committed");
                    None
                }
            }
        } else {
            None
        };

        if !matches!(status, SessionStatus::Forfeit) {
            if let Some(stake) = session.identity.stake() {
                let update = PointsUpdate {
                    points_delta: points_for_session(recomputed_score, is_perfect),
                    perfect: is_perfect,
                    nfts_minted_delta: 0,
                    session_avg_answer_ms: average_answer_ms(&session),
                    category_id: Some(session.category_id),
                };
                if let Err(e) = self.leaderboard.update_points(stake, active_season_id, update, now).await {
                    warn!(error = %e, session_id = %session_id, "updatePoints failed after session was already committed");
                }
            }
        }

        let identity = session.identity.kv_identity().to_string();
        if let Err(e) = self.kv.set(&cooldown_key(&identity), "1", Some(self.config.cooldown_secs.max(0) as u64)).await {
            warn!(error = %e, session_id = %session_id, "failed to set post-session cooldown");
        }
        if let Err(e) = self.kv.del(&lock_key(&identity)).await {
            warn!(error = %e, session_id = %session_id, "failed to release session lock on completion");
        }
        if let Err(e) = self.kv.del(&hot_state_key(&session_id)).await {
            warn!(error = %e, session_id = %session_id, "failed to clear hot session state on completion");
        }

        info!(session_id = %session_id, score = recomputed_score, status = ?status, "session completed");
        Ok(CompletionOutcome {
            score: recomputed_score,
            total_questions: QUESTIONS_PER_SESSION as u8,
            is_perfect,
            eligibility_id,
            status,
            total_ms: total_duration_ms,
        })
    }

    async fn load_terminal_from_sql(&self, session_id: &SessionId) -> Result<Session, Error> {
        let row: trivia_store_sql::rows::SessionRow = sqlx::query_as(
            "SELECT id, player_id, stake, anon_id, category_id, status, current_question_index, questions, score, started_at, ended_at, total_duration_ms \
             FROM sessions WHERE id = $1",
        )
        .bind(session_id)
        .fetch_optional(self.sql.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?
        .ok_or_else(Error::session_not_found)?;
        row.try_into()
    }

    async fn finalize_session_sql(&self, session: &Session) -> Result<(), Error> {
        let questions_json = sqlx::types::Json(&session.questions);
        let status = match session.status {
            SessionStatus::Won => "won",
            SessionStatus::Lost => "lost",
            SessionStatus::Forfeit => "forfeit",
            SessionStatus::Active => return Err(Error::fatal("finalize_session_sql called on an active session")),
        };
        sqlx::query(
            "UPDATE sessions SET status = $1, current_question_index = $2, questions = $3, score = $4, ended_at = $5, total_duration_ms = $6 \
             WHERE id = $7",
        )
        .bind(status)
        .bind(session.current_question_index as i16)
        .bind(questions_json)
        .bind(session.score as i16)
        .bind(session.ended_at)
        .bind(session.total_duration_ms.map(|v| v as i64))
        .bind(session.id)
        .execute(self.sql.pool())
        .await
        .map_err(trivia_store_sql::pool::to_external)?;
        Ok(())
    }

    fn outcome_from(&self, session: &Session) -> CompletionOutcome {
        let is_perfect = session.status == SessionStatus::Won && session.score == QUESTIONS_PER_SESSION as u8;
        CompletionOutcome {
            score: session.score,
            total_questions: QUESTIONS_PER_SESSION as u8,
            is_perfect,
            eligibility_id: None,
            status: session.status,
            total_ms: session.total_duration_ms.unwrap_or(0),
        }
    }
}

fn average_answer_ms(session: &Session) -> f64 {
    let answered: Vec<u32> = session.questions.iter().filter_map(|q| q.answer_time_ms).collect();
    if answered.is_empty() {
        return 0.0;
    }
    answered.iter().sum::<u32>() as f64 / answered.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midnight_ttl_is_positive_and_bounded_by_a_day() {
        let now = OffsetDateTime::UNIX_EPOCH + Duration::hours(13);
        let today = now.date();
        let ttl = seconds_until_next_local_midnight(now, today, 0);
        assert!(ttl > 0);
        assert!(ttl <= 86_400);
    }

    #[test]
    fn average_answer_ms_of_no_answers_is_zero() {
        let session = Session {
            id: Uuid::new_v4(),
            player_id: Uuid::new_v4(),
            identity: PlayerIdentity::Anon("a1".into()),
            category_id: Uuid::new_v4(),
            status: SessionStatus::Active,
            current_question_index: 0,
            questions: vec![],
            score: 0,
            started_at: OffsetDateTime::UNIX_EPOCH,
            ended_at: None,
            total_duration_ms: None,
        };
        assert_eq!(average_answer_ms(&session), 0.0);
    }
}
