//! Composite score formula: one monotonic real that encodes the
//! lexicographic tie-break order `(points, nftsMinted, perfectScores,
//! -avgAnswerMs, -sessionsUsed, firstAchievedAt)`, so ranking costs the
//! sorted set O(log N) instead of a per-query SQL `ORDER BY` over a large
//! table.

const POINTS_SCALE: f64 = 1e15;
const NFTS_SCALE: f64 = 1e12;
const PERFECT_SCALE: f64 = 1e9;
const AVG_ANSWER_SCALE: f64 = 1e6;
const SESSIONS_SCALE: f64 = 1e3;

const AVG_ANSWER_CEIL: f64 = 1e9;
const SESSIONS_CEIL: f64 = 1e6;

pub fn composite_score(
    points: i64,
    nfts_minted: u32,
    perfect_scores: u32,
    avg_answer_ms: f64,
    sessions_used: u32,
    first_achieved_at_epoch_ms: i64,
) -> f64 {
    let avg_clamped = avg_answer_ms.clamp(0.0, AVG_ANSWER_CEIL - 1.0);
    let sessions_clamped = (sessions_used as f64).min(SESSIONS_CEIL - 1.0);
    let ts_bucket = first_achieved_at_epoch_ms.rem_euclid(1000) as f64;

    points as f64 * POINTS_SCALE
        + nfts_minted as f64 * NFTS_SCALE
        + perfect_scores as f64 * PERFECT_SCALE
        + (AVG_ANSWER_CEIL - avg_clamped) * AVG_ANSWER_SCALE
        + (SESSIONS_CEIL - sessions_clamped) * SESSIONS_SCALE
        + ts_bucket
}

/// The counters recovered from a composite score by the inverse of
/// [`composite_score`] — integer division and modulo on the rounded value.
/// `avg_answer_ms`/`sessions_used` are the clamped values that went in, not
/// necessarily the unclamped originals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedScore {
    pub points: i64,
    pub nfts_minted: u32,
    pub perfect_scores: u32,
    pub avg_answer_ms: f64,
    pub sessions_used: u32,
    pub first_achieved_at_bucket_ms: i64,
}

pub fn decode_composite_score(score: f64) -> DecodedScore {
    let mut remainder = score.round() as i128;

    let points = remainder / 1_000_000_000_000_000;
    remainder %= 1_000_000_000_000_000;

    let nfts_minted = remainder / 1_000_000_000_000;
    remainder %= 1_000_000_000_000;

    let perfect_scores = remainder / 1_000_000_000;
    remainder %= 1_000_000_000;

    let avg_component = remainder / 1_000_000;
    remainder %= 1_000_000;

    let sessions_component = remainder / 1_000;
    let ts_bucket = remainder % 1_000;

    DecodedScore {
        points: points as i64,
        nfts_minted: nfts_minted as u32,
        perfect_scores: perfect_scores as u32,
        avg_answer_ms: (AVG_ANSWER_CEIL as i128 - avg_component) as f64,
        sessions_used: (SESSIONS_CEIL as i128 - sessions_component) as u32,
        first_achieved_at_bucket_ms: ts_bucket as i64,
    }
}

/// Points rule fed by the Session Engine: one point per correct
/// answer, plus a ten-point bonus for a perfect score.
pub fn points_for_session(correct_count: u8, perfect: bool) -> i64 {
    correct_count as i64 + if perfect { 10 } else { 0 }
}
