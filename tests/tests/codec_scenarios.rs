//! Asset-name build/parse round-trip coverage, exercised against the
//! crate's public API the way a consumer outside `trivia-codec` would use it
//! rather than through its own `#[cfg(test)]` module.

use trivia_types::AssetTier;

#[test]
fn builds_a_category_regular_name_and_parses_it_back() {
    let name = trivia_codec::build(AssetTier::Category, Some("SCI"), None, "12b3de7d").expect("build succeeds");
    assert_eq!(name, "TNFT_V1_SCI_REG_12b3de7d");

    let parsed = trivia_codec::parse(&name).expect("parse succeeds");
    assert_eq!(parsed.prefix, "TNFT");
    assert_eq!(parsed.version, "V1");
    assert_eq!(parsed.tier, AssetTier::Category);
    assert_eq!(parsed.category_code.as_deref(), Some("SCI"));
    assert_eq!(parsed.id, "12b3de7d");
}

#[test]
fn legacy_kebab_name_falls_back_to_the_permissive_recognizer() {
    let parsed = trivia_codec::parse("quantum-explorer").expect("legacy fallback accepts it");
    assert_eq!(parsed.prefix, "TNFT");
    assert_eq!(parsed.version, "V1");
    assert_eq!(parsed.tier, AssetTier::Category);
    assert!(parsed.category_code.is_none());
    assert!(parsed.season_code.is_none());
    assert_eq!(parsed.id, "quantum-explorer");
}

#[test]
fn forged_category_ultimate_name_matches_the_expected_shape() {
    let name = trivia_codec::build(AssetTier::CategoryUltimate, Some("SCI"), None, "a1b2c3d4").unwrap();
    let re_chars: Vec<char> = name.chars().collect();
    assert!(name.starts_with("TNFT_V1_SCI_ULT_"));
    assert_eq!(re_chars.len(), "TNFT_V1_SCI_ULT_a1b2c3d4".len());
    let suffix = &name["TNFT_V1_SCI_ULT_".len()..];
    assert_eq!(suffix.len(), 8);
    assert!(suffix.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
}

/// Build then parse round-trips for every valid tier/component combination
/// this grammar defines.
#[test]
fn invariant_round_trip_holds_for_every_tier() {
    let cases: &[(AssetTier, Option<&str>, Option<&str>)] = &[
        (AssetTier::Category, Some("GEO"), None),
        (AssetTier::CategoryUltimate, Some("HIST"), None),
        (AssetTier::MasterUltimate, None, None),
        (AssetTier::SeasonalUltimate, None, Some("SP1")),
    ];

    for (tier, cat, season) in cases {
        let name = trivia_codec::build(*tier, *cat, *season, "0a0b0c0d").unwrap();
        let parsed = trivia_codec::parse(&name).unwrap();
        assert_eq!(parsed.tier, *tier);
        assert_eq!(parsed.category_code.as_deref(), *cat);
        assert_eq!(parsed.season_code.as_deref(), *season);
        assert!(trivia_codec::validate(&name));
    }
}

#[test]
fn invariant_build_is_total_over_invalid_inputs() {
    assert!(trivia_codec::build(AssetTier::Category, None, None, "0a0b0c0d").is_err());
    assert!(trivia_codec::build(AssetTier::Category, Some("NOPE"), None, "0a0b0c0d").is_err());
    assert!(trivia_codec::build(AssetTier::Category, Some("SCI"), None, "NOTHEX12").is_err());
    assert!(trivia_codec::build(AssetTier::SeasonalUltimate, None, Some("XX9"), "0a0b0c0d").is_err());
}
