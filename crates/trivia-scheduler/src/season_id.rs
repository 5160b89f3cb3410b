//! Season id/display-name formatting and the reverse parse used to drive
//! `Cycle::next()` forward: computes the next season id and name by cycling
//! Winter -> Spring -> Summer -> Fall -> Winter(N+1).
//!
//! This is a scheduler-local format, distinct from the Asset-Name Codec's
//! `SEASON` token grammar (`WI1`, `SP1`, ...) used to name seasonal-ultimate
//! assets — `ForgeOperation.season_id` carries the codec form, `Season.id`
//! carries this one (e.g. `winter-s1`), a slug/sequence-number pair, not a
//! codec token.

use trivia_types::Cycle;

pub fn format_season_id(cycle: Cycle, number: u32) -> String {
    format!("{}-s{number}", cycle.label().to_lowercase())
}

pub fn format_display_name(cycle: Cycle, number: u32) -> String {
    format!("{} Season {number}", cycle.label())
}

/// Parses a `format_season_id` output back into its cycle and number. Any
/// id not produced by this module (e.g. hand-seeded fixture data) fails
/// gracefully rather than panicking.
pub fn parse_season_id(id: &str) -> Option<(Cycle, u32)> {
    let (label, rest) = id.split_once("-s")?;
    let number: u32 = rest.parse().ok()?;
    let cycle = match label {
        "winter" => Cycle::Winter,
        "spring" => Cycle::Spring,
        "summer" => Cycle::Summer,
        "fall" => Cycle::Fall,
        _ => return None,
    };
    Some((cycle, number))
}

/// The season following `current_id`, per `Cycle::next()`'s wraparound rule.
pub fn next_season_id(current_id: &str) -> (String, String) {
    match parse_season_id(current_id) {
        Some((cycle, number)) => {
            let (next_cycle, wrapped) = cycle.next();
            let next_number = if wrapped { number + 1 } else { number };
            (format_season_id(next_cycle, next_number), format_display_name(next_cycle, next_number))
        }
        None => {
            // Unrecognized id (e.g. a seed fixture like "season-0"): start a
            // fresh Winter 1 cycle rather than guessing at its lineage.
            (format_season_id(Cycle::Winter, 1), format_display_name(Cycle::Winter, 1))
        }
    }
}
