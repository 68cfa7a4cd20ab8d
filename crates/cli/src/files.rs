//! Input file loaders for the CLI.
//!
//! All three inputs are JSON documents parsed by hand from
//! `serde_json::Value`, so malformed files produce messages naming
//! the missing or mistyped field.
//!
//! Zman set -- an object mapping keys to formula text:
//!
//! ```json
//! { "alos": "solar(16.1, before_sunrise)", "netz": "sunrise" }
//! ```
//!
//! Context -- date, coordinates, timezone, optional elevation:
//!
//! ```json
//! { "date": "2025-06-21", "latitude": 40.6782, "longitude": -73.9442,
//!   "timezone": "America/New_York" }
//! ```
//!
//! Almanac -- precomputed ephemeris rows plus calendar flags:
//!
//! ```json
//! { "primitives": { "sunrise": "2025-06-21T05:25:00-04:00" },
//!   "solar": [ { "degrees": 16.1, "direction": "before_sunrise",
//!                "at": "2025-06-21T03:04:00-04:00" } ],
//!   "unreachable": [ { "degrees": 26, "direction": "after_sunset" } ],
//!   "flags": { "erev_shabbos": false } }
//! ```

use std::path::Path;

use rust_decimal::Decimal;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use zmanim_core::ast::Direction;
use zmanim_eval::{EvalContext, StaticAlmanac, StaticCalendar};

pub fn load_json(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("error reading file '{}': {}", path.display(), e))?;
    serde_json::from_str(&text)
        .map_err(|e| format!("error parsing JSON in '{}': {}", path.display(), e))
}

/// Load a zman set file. Entries come back in the file object's key
/// order as serde_json parses it (sorted), which keeps evaluation
/// order deterministic.
pub fn load_set(path: &Path) -> Result<Vec<(String, String)>, String> {
    let doc = load_json(path)?;
    let obj = doc
        .as_object()
        .ok_or_else(|| format!("'{}': expected a JSON object of key to formula", path.display()))?;

    let mut entries = Vec::new();
    for (key, value) in obj {
        let formula = value
            .as_str()
            .ok_or_else(|| format!("'{}': formula for '{}' must be a string", path.display(), key))?;
        entries.push((key.clone(), formula.to_owned()));
    }
    Ok(entries)
}

fn get_str<'a>(doc: &'a serde_json::Value, field: &str) -> Result<&'a str, String> {
    doc.get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing or non-string field '{}'", field))
}

/// Accept a coordinate as either a JSON number or a string; either
/// way it is parsed from its decimal rendering, never through f64.
fn get_decimal(doc: &serde_json::Value, field: &str) -> Result<Decimal, String> {
    let value = doc
        .get(field)
        .ok_or_else(|| format!("missing field '{}'", field))?;
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return Err(format!("field '{}' must be a number", field)),
    };
    text.parse()
        .map_err(|_| format!("field '{}' is not a valid decimal: {}", field, text))
}

pub fn load_context(path: &Path) -> Result<EvalContext, String> {
    let doc = load_json(path)?;

    let date_format = format_description!("[year]-[month]-[day]");
    let date = Date::parse(get_str(&doc, "date")?, &date_format)
        .map_err(|e| format!("invalid date: {}", e))?;

    let elevation = match doc.get("elevation") {
        None | Some(serde_json::Value::Null) => None,
        Some(_) => Some(get_decimal(&doc, "elevation")?),
    };

    Ok(EvalContext {
        date,
        latitude: get_decimal(&doc, "latitude")?,
        longitude: get_decimal(&doc, "longitude")?,
        timezone: get_str(&doc, "timezone")?.to_owned(),
        elevation,
    })
}

fn parse_timestamp(text: &str, what: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(text, &Rfc3339)
        .map_err(|e| format!("invalid RFC 3339 timestamp for {}: {}", what, e))
}

fn parse_direction(doc: &serde_json::Value) -> Result<Direction, String> {
    let token = get_str(doc, "direction")?;
    Direction::parse(token).ok_or_else(|| format!("'{}' is not a direction", token))
}

pub fn load_almanac(path: &Path) -> Result<(StaticAlmanac, StaticCalendar), String> {
    let doc = load_json(path)?;
    let mut almanac = StaticAlmanac::new();
    let mut calendar = StaticCalendar::new();

    if let Some(primitives) = doc.get("primitives") {
        let obj = primitives
            .as_object()
            .ok_or_else(|| "'primitives' must be an object".to_owned())?;
        for (name, value) in obj {
            let text = value
                .as_str()
                .ok_or_else(|| format!("primitive '{}' must be a string timestamp", name))?;
            almanac.set_primitive(name, parse_timestamp(text, name)?);
        }
    }

    if let Some(rows) = doc.get("solar") {
        let arr = rows
            .as_array()
            .ok_or_else(|| "'solar' must be an array".to_owned())?;
        for row in arr {
            let degrees = get_decimal(row, "degrees")?;
            let direction = parse_direction(row)?;
            let at = parse_timestamp(get_str(row, "at")?, "solar row")?;
            almanac.set_solar(degrees, direction, at);
        }
    }

    if let Some(rows) = doc.get("unreachable") {
        let arr = rows
            .as_array()
            .ok_or_else(|| "'unreachable' must be an array".to_owned())?;
        for row in arr {
            let degrees = get_decimal(row, "degrees")?;
            let direction = parse_direction(row)?;
            almanac.mark_solar_unreachable(degrees, direction);
        }
    }

    if let Some(flags) = doc.get("flags") {
        let obj = flags
            .as_object()
            .ok_or_else(|| "'flags' must be an object".to_owned())?;
        for (name, value) in obj {
            let held = value
                .as_bool()
                .ok_or_else(|| format!("flag '{}' must be a boolean", name))?;
            calendar.set(name, held);
        }
    }

    Ok((almanac, calendar))
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
