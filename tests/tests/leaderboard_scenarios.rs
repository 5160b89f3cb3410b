//! Tied points break by nfts minted, then pagination slices the same
//! ordering consistently, against the real sorted-set pagination path.
//! Needs a live Postgres; run explicitly with `cargo test -- --ignored`.

use trivia_integration_tests::support::Harness;
use trivia_leaderboard::PointsUpdate;

fn global_ladder_key(season_id: &str) -> String {
    format!("ladder:global:{season_id}")
}

#[tokio::test]
#[ignore]
async fn tied_points_are_broken_by_nfts_minted_and_pagination_slices_consistently() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.insert_connected_player("stake1-iris", Some("iris")).await?;
    h.insert_connected_player("stake1-jack", Some("jack")).await?;
    let now = h.clock.now();

    h.leaderboard
        .update_points(
            "stake1-iris",
            "winter-s1",
            PointsUpdate { points_delta: 10, perfect: false, nfts_minted_delta: 0, session_avg_answer_ms: 5_000.0, category_id: None },
            now,
        )
        .await?;
    h.leaderboard
        .update_points(
            "stake1-jack",
            "winter-s1",
            PointsUpdate { points_delta: 10, perfect: false, nfts_minted_delta: 1, session_avg_answer_ms: 5_000.0, category_id: None },
            now,
        )
        .await?;

    let key = global_ladder_key("winter-s1");

    let top = h.leaderboard.get_page(&key, 1, 0).await?;
    assert_eq!(top.total, 2);
    assert!(top.has_more);
    assert_eq!(top.entries.len(), 1);
    assert_eq!(top.entries[0].stake, "stake1-jack");
    assert_eq!(top.entries[0].rank, 1);
    assert_eq!(top.entries[0].points, 10);
    assert_eq!(top.entries[0].nfts_minted, 1);

    let second = h.leaderboard.get_page(&key, 1, 1).await?;
    assert!(!second.has_more);
    assert_eq!(second.entries.len(), 1);
    assert_eq!(second.entries[0].stake, "stake1-iris");
    assert_eq!(second.entries[0].rank, 2);

    Ok(())
}

#[tokio::test]
#[ignore]
async fn get_page_rejects_out_of_range_limits() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    let key = global_ladder_key("winter-s1");

    let err = h.leaderboard.get_page(&key, 0, 0).await.unwrap_err();
    assert_eq!(err.code(), Some("INVALID_INPUT"));

    let err = h.leaderboard.get_page(&key, 101, 0).await.unwrap_err();
    assert_eq!(err.code(), Some("INVALID_INPUT"));

    Ok(())
}

/// Seeds a `season_points` row directly with exact literal counters (rather
/// than accumulating them through repeated `update_points` calls) and
/// rebuilds the sorted set from it via `reconcile`, the same recovery path
/// a crash between the SQL commit and the KV write would exercise.
async fn seed_season_points(
    h: &Harness,
    season_id: &str,
    stake: &str,
    points: i64,
    nfts_minted: i32,
    perfect_count: i32,
    avg_answer_ms: f64,
) -> anyhow::Result<()> {
    sqlx::query(
        "INSERT INTO season_points (season_id, stake, points, perfect_count, nfts_minted, avg_answer_ms, sessions_used, first_achieved_at) \
         VALUES ($1, $2, $3, $4, $5, $6, 10, $7)",
    )
    .bind(season_id)
    .bind(stake)
    .bind(points)
    .bind(perfect_count)
    .bind(nfts_minted)
    .bind(avg_answer_ms)
    .bind(h.clock.now())
    .execute(h.store.pool())
    .await?;
    Ok(())
}

#[tokio::test]
#[ignore]
async fn two_stakes_tied_on_everything_but_avg_answer_ms_break_by_answer_speed() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.insert_connected_player("stake1-a", None).await?;
    h.insert_connected_player("stake1-b", None).await?;

    seed_season_points(&h, "winter-s1", "stake1-a", 150, 5, 10, 5_000.0).await?;
    seed_season_points(&h, "winter-s1", "stake1-b", 150, 5, 10, 5_001.0).await?;
    h.leaderboard.reconcile("winter-s1").await?;

    let key = global_ladder_key("winter-s1");
    let top = h.leaderboard.get_page(&key, 1, 0).await?;
    assert_eq!(top.entries[0].stake, "stake1-a", "lower avgAnswerMs ranks above an otherwise-tied opponent");

    let bottom = h.leaderboard.get_page(&key, 1, 1).await?;
    assert_eq!(bottom.entries[0].stake, "stake1-b");

    // Swap avgAnswerMs between the two and the order reverses.
    sqlx::query("UPDATE season_points SET avg_answer_ms = 5_001.0 WHERE season_id = 'winter-s1' AND stake = 'stake1-a'")
        .execute(h.store.pool())
        .await?;
    sqlx::query("UPDATE season_points SET avg_answer_ms = 5_000.0 WHERE season_id = 'winter-s1' AND stake = 'stake1-b'")
        .execute(h.store.pool())
        .await?;
    h.leaderboard.reconcile("winter-s1").await?;

    let top_after_swap = h.leaderboard.get_page(&key, 1, 0).await?;
    assert_eq!(top_after_swap.entries[0].stake, "stake1-b");

    Ok(())
}

#[tokio::test]
#[ignore]
async fn full_tie_break_chain_resolves_in_the_documented_order() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    for stake in ["stake1-p", "stake1-q", "stake1-r", "stake1-s"] {
        h.insert_connected_player(stake, None).await?;
    }

    // All tied on points; each subsequent stake loses on the next tie-break
    // counter in the chain (nftsMinted, then perfectScores, then
    // avgAnswerMs), so the expected order is p > q > r > s.
    seed_season_points(&h, "winter-s1", "stake1-p", 100, 5, 10, 4_000.0).await?;
    seed_season_points(&h, "winter-s1", "stake1-q", 100, 4, 10, 4_000.0).await?;
    seed_season_points(&h, "winter-s1", "stake1-r", 100, 4, 9, 4_000.0).await?;
    seed_season_points(&h, "winter-s1", "stake1-s", 100, 4, 9, 9_000.0).await?;
    h.leaderboard.reconcile("winter-s1").await?;

    let key = global_ladder_key("winter-s1");
    let page = h.leaderboard.get_page(&key, 4, 0).await?;
    let order: Vec<&str> = page.entries.iter().map(|e| e.stake.as_str()).collect();
    assert_eq!(order, vec!["stake1-p", "stake1-q", "stake1-r", "stake1-s"]);

    Ok(())
}

#[tokio::test]
#[ignore]
async fn repeated_sessions_accumulate_points_and_average_the_answer_time() -> anyhow::Result<()> {
    let h = Harness::new().await?;
    h.insert_connected_player("stake1-kay", Some("kay")).await?;
    let now = h.clock.now();

    h.leaderboard
        .update_points(
            "stake1-kay",
            "winter-s1",
            PointsUpdate { points_delta: 6, perfect: false, nfts_minted_delta: 0, session_avg_answer_ms: 4_000.0, category_id: None },
            now,
        )
        .await?;
    let second = h
        .leaderboard
        .update_points(
            "stake1-kay",
            "winter-s1",
            PointsUpdate { points_delta: 10, perfect: true, nfts_minted_delta: 1, session_avg_answer_ms: 6_000.0, category_id: None },
            now,
        )
        .await?;

    assert_eq!(second.points, 16);
    assert_eq!(second.sessions_used, 2);
    assert_eq!(second.perfect_count, 1);
    assert_eq!(second.nfts_minted, 1);
    assert_eq!(second.avg_answer_ms, 5_000.0);

    Ok(())
}
