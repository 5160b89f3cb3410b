//! Static bijections backing the asset-name grammar. Adding a category or
//! advancing a season code is a code change here, never a data migration.

pub const CATEGORY_CODES: &[&str] =
    &["ARTS", "ENT", "GEO", "HIST", "MYTH", "NAT", "SCI", "SPORT", "TECH", "WEIRD"];

pub fn is_known_category_code(code: &str) -> bool {
    CATEGORY_CODES.contains(&code)
}

const CYCLE_CODES: &[&str] = &["WI", "SP", "SU", "FA"];

/// A season code is `{cycle}{number}`, e.g. `WI1`, `FA12`. Returns the split
/// `(cycle_code, number)` if `code` parses, independent of whether the
/// number names a season that actually exists yet.
pub fn split_season_code(code: &str) -> Option<(&str, u32)> {
    if code.len() < 3 {
        return None;
    }
    let (cycle, digits) = code.split_at(2);
    if !CYCLE_CODES.contains(&cycle) {
        return None;
    }
    digits.parse::<u32>().ok().map(|n| (cycle, n))
}

pub fn is_known_season_code(code: &str) -> bool {
    split_season_code(code).is_some()
}
