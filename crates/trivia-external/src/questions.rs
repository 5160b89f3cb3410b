use async_trait::async_trait;
use trivia_error::Error;
use trivia_types::{CategoryId, PlayerId, Question, QuestionId};

/// Question bank. Guarantees uniqueness within a single `draw` and
/// returns questions carrying the correct index and explanation — the
/// Session Engine is the only caller permitted to see those fields before
/// scrubbing them for the player-facing response.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn pool_size(&self, category_id: &CategoryId) -> Result<usize, Error>;

    async fn draw(
        &self,
        category_id: &CategoryId,
        count: usize,
        exclude_ids: &[QuestionId],
    ) -> Result<Vec<Question>, Error>;

    async fn flag(&self, question_id: &QuestionId, player_id: &PlayerId, reason: &str) -> Result<(), Error>;
}
