//! Forge structural-validation coverage: `validate_forge_shape` takes
//! already-fetched rows, so this exercises it directly without a database,
//! the same way `trivia-workflow`'s own unit tests do, but from outside the
//! crate and across the three scope kinds together.

use time::OffsetDateTime;
use trivia_types::{AssetSource, AssetTier, OwnedAsset, OwnedAssetStatus, ScopeKind};
use trivia_workflow::forge::validate_forge_shape;
use uuid::Uuid;

fn confirmed_category_asset(category_id: Uuid, season_id: Option<&str>) -> OwnedAsset {
    OwnedAsset {
        id: Uuid::new_v4(),
        stake: "stake1...".into(),
        policy_id: "trivianft1".into(),
        fingerprint: format!("fp-{}", Uuid::new_v4()),
        asset_name: "TNFT_V1_SCI_REG_deadbeef".into(),
        source: AssetSource::Mint,
        category_id: Some(category_id),
        season_id: season_id.map(str::to_string),
        tier: AssetTier::Category,
        status: OwnedAssetStatus::Confirmed,
        minted_at: OffsetDateTime::UNIX_EPOCH,
        burned_at: None,
        metadata: serde_json::json!({}),
    }
}

#[test]
fn ten_same_category_inputs_satisfy_category_forge() {
    let category_id = Uuid::new_v4();
    let inputs: Vec<OwnedAsset> = (0..10).map(|_| confirmed_category_asset(category_id, None)).collect();
    assert!(validate_forge_shape(ScopeKind::Category, &inputs, &[]).is_ok());
}

#[test]
fn nine_inputs_are_rejected() {
    let category_id = Uuid::new_v4();
    let inputs: Vec<OwnedAsset> = (0..9).map(|_| confirmed_category_asset(category_id, None)).collect();
    let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
    assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
}

#[test]
fn mixed_category_inputs_are_rejected() {
    let mut inputs: Vec<OwnedAsset> = (0..9).map(|_| confirmed_category_asset(Uuid::new_v4(), None)).collect();
    inputs.push(confirmed_category_asset(Uuid::new_v4(), None));
    let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
    assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
}

#[test]
fn master_forge_requires_ten_distinct_categories() {
    let distinct: Vec<OwnedAsset> = (0..10).map(|_| confirmed_category_asset(Uuid::new_v4(), None)).collect();
    assert!(validate_forge_shape(ScopeKind::Master, &distinct, &[]).is_ok());

    let category_id = Uuid::new_v4();
    let repeated: Vec<OwnedAsset> = (0..10).map(|_| confirmed_category_asset(category_id, None)).collect();
    assert!(validate_forge_shape(ScopeKind::Master, &repeated, &[]).is_err());
}

#[test]
fn season_forge_requires_exactly_two_per_active_category() {
    let cat_a = Uuid::new_v4();
    let cat_b = Uuid::new_v4();
    let active = vec![cat_a, cat_b];

    let mut inputs = Vec::new();
    for cat in [cat_a, cat_b] {
        inputs.push(confirmed_category_asset(cat, Some("winter-s1")));
        inputs.push(confirmed_category_asset(cat, Some("winter-s1")));
    }
    assert!(validate_forge_shape(ScopeKind::Season, &inputs, &active).is_ok());

    // Drop one of cat_b's two inputs: no longer exactly two per active category.
    inputs.pop();
    assert!(validate_forge_shape(ScopeKind::Season, &inputs, &active).is_err());
}

#[test]
fn season_forge_rejects_inputs_outside_the_named_season() {
    let cat_a = Uuid::new_v4();
    let active = vec![cat_a];
    let inputs = vec![
        confirmed_category_asset(cat_a, None),
        confirmed_category_asset(cat_a, None),
    ];
    let err = validate_forge_shape(ScopeKind::Season, &inputs, &active).unwrap_err();
    assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
}

#[test]
fn burned_inputs_are_never_eligible_regardless_of_shape() {
    let category_id = Uuid::new_v4();
    let mut inputs: Vec<OwnedAsset> = (0..10).map(|_| confirmed_category_asset(category_id, None)).collect();
    inputs[3].status = OwnedAssetStatus::Burned;
    let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
    assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
}

#[test]
fn ultimate_tier_inputs_cannot_be_reforged() {
    let category_id = Uuid::new_v4();
    let mut inputs: Vec<OwnedAsset> = (0..10).map(|_| confirmed_category_asset(category_id, None)).collect();
    inputs[0].tier = AssetTier::CategoryUltimate;
    let err = validate_forge_shape(ScopeKind::Category, &inputs, &[]).unwrap_err();
    assert_eq!(err.code(), Some("INVALID_FORGE_SET"));
}
