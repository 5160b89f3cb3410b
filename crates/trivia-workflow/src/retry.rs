//! Generic retry driver shared by every Workflow step: retriable failures
//! back off and retry up to the policy's attempt cap; non-retriable
//! failures propagate on the first try.

use std::future::Future;

use tracing::warn;
use trivia_error::Error;

use crate::config::RetryPolicy;

/// Runs `f` until it succeeds, returns a non-retriable error, or exhausts
/// `policy.max_attempts`. The sleep between attempts is a step-level
/// suspension point.
pub async fn with_retry<F, Fut, T>(policy: &RetryPolicy, step: &str, mut f: F) -> Result<T, Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Error>>,
{
    let mut attempt = 0u32;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retriable() && attempt + 1 < policy.max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(step, attempt, delay_ms = delay.as_millis() as u64, error = %e, "retriable step failure, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
