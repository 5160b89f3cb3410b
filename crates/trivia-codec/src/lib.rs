//! Fixed-grammar on-chain identifiers: build, parse, and validate names that
//! are at most 32 bytes, uppercase ASCII/digit/underscore only, and
//! unambiguously reversible to their components.
//!
//! ```text
//! name := "TNFT_V1_" body "_" hexid
//! hexid := 8 lowercase-hex chars
//! body  :=   CAT "_" "REG"          ; tier-1 regular
//!         |  CAT "_" "ULT"          ; tier-2 category ultimate
//!         |  "MAST"                 ; tier-3 master ultimate
//!         |  "SEAS_" SEASON "_ULT"  ; tier-4 seasonal ultimate
//! ```

mod tables;

pub use tables::CATEGORY_CODES;

use std::fmt;
use std::str::FromStr;

use trivia_error::Error;
use trivia_external::Rng;
use trivia_types::AssetTier as Tier;

const PREFIX: &str = "TNFT";
const VERSION: &str = "V1";
const MAX_NAME_BYTES: usize = 32;

/// The decoded pieces of an asset name. `prefix`/`version` are always
/// `"TNFT"`/`"V1"` for canonical names; the legacy fallback in `parse` also
/// reports them this way, preserving read-compatibility with pre-existing
/// on-chain names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    pub prefix: &'static str,
    pub version: &'static str,
    pub tier: Tier,
    pub category_code: Option<String>,
    pub season_code: Option<String>,
    pub id: String,
}

impl fmt::Display for Components {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match build(self.tier, self.category_code.as_deref(), self.season_code.as_deref(), &self.id) {
            Ok(name) => write!(f, "{name}"),
            Err(_) => write!(f, "{}_{}_{}", self.prefix, self.version, self.id),
        }
    }
}

impl FromStr for Components {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Builds a canonical asset name from its components.
///
/// Fails with an `Error::Input` variant carrying one of the codes
/// `MISSING_REQUIRED_FIELD`, `INVALID_CATEGORY_CODE`, `INVALID_SEASON_CODE`,
/// `INVALID_HEX_ID`, `INVALID_LENGTH`.
pub fn build(tier: Tier, category_code: Option<&str>, season_code: Option<&str>, id: &str) -> Result<String, Error> {
    if !is_valid_hex_id(id) {
        return Err(Error::Input { code: "INVALID_HEX_ID", message: format!("{id} is not 8 lowercase hex chars") });
    }

    let body = match tier {
        Tier::Category => {
            let cat = require_category(category_code)?;
            format!("{cat}_REG")
        }
        Tier::CategoryUltimate => {
            let cat = require_category(category_code)?;
            format!("{cat}_ULT")
        }
        Tier::MasterUltimate => "MAST".to_string(),
        Tier::SeasonalUltimate => {
            let season = require_season(season_code)?;
            format!("SEAS_{season}_ULT")
        }
    };

    let name = format!("{PREFIX}_{VERSION}_{body}_{id}");
    if name.len() > MAX_NAME_BYTES {
        return Err(Error::Input {
            code: "INVALID_LENGTH",
            message: format!("{name} is {} bytes, exceeds {MAX_NAME_BYTES}", name.len()),
        });
    }
    Ok(name)
}

fn require_category(category_code: Option<&str>) -> Result<&str, Error> {
    let cat = category_code.ok_or_else(|| Error::Input {
        code: "MISSING_REQUIRED_FIELD",
        message: "categoryCode is required for this tier".to_string(),
    })?;
    if !tables::is_known_category_code(cat) {
        return Err(Error::Input {
            code: "INVALID_CATEGORY_CODE",
            message: format!("{cat} is not a known category code"),
        });
    }
    Ok(cat)
}

fn require_season(season_code: Option<&str>) -> Result<&str, Error> {
    let season = season_code.ok_or_else(|| Error::Input {
        code: "MISSING_REQUIRED_FIELD",
        message: "seasonCode is required for this tier".to_string(),
    })?;
    if !tables::is_known_season_code(season) {
        return Err(Error::Input {
            code: "INVALID_SEASON_CODE",
            message: format!("{season} is not a valid season code"),
        });
    }
    Ok(season)
}

fn is_valid_hex_id(id: &str) -> bool {
    id.len() == 8 && id.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
}

/// Parses an asset name, trying the canonical grammar first and falling
/// back to the permissive legacy recognizer (kebab-case, 5..64 chars,
/// `[a-z0-9-]+`) on failure, so pre-existing on-chain names stay readable.
pub fn parse(name: &str) -> Result<Components, Error> {
    parse_canonical(name).or_else(|_| parse_legacy(name))
}

fn parse_canonical(name: &str) -> Result<Components, Error> {
    let rest = name
        .strip_prefix(PREFIX)
        .and_then(|r| r.strip_prefix('_'))
        .and_then(|r| r.strip_prefix(VERSION))
        .and_then(|r| r.strip_prefix('_'))
        .ok_or_else(|| Error::input("name does not start with TNFT_V1_"))?;

    let (body, id) = rest.rsplit_once('_').ok_or_else(|| Error::input("name has no hexid segment"))?;
    if !is_valid_hex_id(id) {
        return Err(Error::Input { code: "INVALID_HEX_ID", message: format!("{id} is not 8 lowercase hex chars") });
    }

    let parts: Vec<&str> = body.split('_').collect();
    let (tier, category_code, season_code) = match parts.as_slice() {
        [cat, tag] if *tag == "REG" && tables::is_known_category_code(cat) => {
            (Tier::Category, Some((*cat).to_string()), None)
        }
        [cat, tag] if *tag == "ULT" && tables::is_known_category_code(cat) => {
            (Tier::CategoryUltimate, Some((*cat).to_string()), None)
        }
        [tag] if *tag == "MAST" => (Tier::MasterUltimate, None, None),
        [prefix_tag, season, tag]
            if *prefix_tag == "SEAS" && *tag == "ULT" && tables::is_known_season_code(season) =>
        {
            (Tier::SeasonalUltimate, None, Some((*season).to_string()))
        }
        _ => return Err(Error::input("body does not match a known tier grammar")),
    };

    let components = Components { prefix: PREFIX, version: VERSION, tier, category_code, season_code, id: id.to_string() };
    let rebuilt = build(components.tier, components.category_code.as_deref(), components.season_code.as_deref(), &components.id)?;
    if rebuilt != name {
        return Err(Error::input("name does not round-trip through the canonical grammar"));
    }
    Ok(components)
}

fn parse_legacy(name: &str) -> Result<Components, Error> {
    let len_ok = (5..=64).contains(&name.len());
    let charset_ok = !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if !len_ok || !charset_ok {
        return Err(Error::input("name matches neither the canonical nor the legacy grammar"));
    }
    Ok(Components {
        prefix: PREFIX,
        version: VERSION,
        tier: Tier::Category,
        category_code: None,
        season_code: None,
        id: name.to_string(),
    })
}

/// True iff either grammar accepts `name`.
pub fn validate(name: &str) -> bool {
    parse(name).is_ok()
}

/// 8-char lowercase hex id drawn from the injected `Rng`, never
/// `rand::thread_rng()` directly, so callers are deterministic under test.
pub async fn generate_hex_id(rng: &dyn Rng) -> String {
    let mut buf = [0u8; 4];
    rng.fill_bytes(&mut buf).await;
    hex::encode(buf)
}
