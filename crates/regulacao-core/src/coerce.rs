//! Type coercion for the free-text fields in the raw extracts.
//!
//! Every function here is pure and total: any input maps to a defined
//! output, unparseable values route to `None` rather than an error, so a
//! single bad field never aborts a batch.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Tokens the source systems use for "true" / "false" on activity flags.
/// Everything else (including the `"nan"` stringification artifact) is
/// treated as unknown.
const TRUE_TOKENS: &[&str] = &["1", "1.0", "true", "t", "sim", "s", "yes", "y"];
const FALSE_TOKENS: &[&str] = &["0", "0.0", "false", "f", "nao", "não", "n", "no"];

/// Does the value stand for a missing field? Covers empty/whitespace and
/// the literal `nan` left behind by stringifying a null upstream.
pub fn is_null_token(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Tri-state boolean: `Some(true)` / `Some(false)` for the accepted token
/// sets (case-insensitive), `None` for unknown.
pub fn parse_tri_state_bool(raw: &str) -> Option<bool> {
    if is_null_token(raw) {
        return None;
    }
    let token = raw.trim().to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Coordinate fields arrive with a comma decimal separator
/// (`-43,2075`); swap it for a dot before the numeric parse.
pub fn parse_decimal_coordinate(raw: &str) -> Option<f64> {
    if is_null_token(raw) {
        return None;
    }
    raw.trim().replace(',', ".").parse::<f64>().ok()
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a date-like string and truncate to the calendar date.
pub fn parse_date_only(raw: &str) -> Option<NaiveDate> {
    parse_date_time(raw).map(|dt| dt.date())
}

/// Parse a timestamp, accepting ISO datetimes (with `T` or space), bare
/// dates (midnight), and the Brazilian `dd/mm/yyyy` forms.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    if is_null_token(raw) {
        return None;
    }
    let trimmed = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Strip everything that is not an ASCII digit. Phone numbers and CNES
/// facility ids come in with punctuation and, occasionally, as a
/// stringified null.
pub fn digits_only(raw: &str) -> Option<String> {
    if is_null_token(raw) {
        return None;
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

/// Integer with null support. Tolerates float-formatted integers
/// (`"12.0"`), which the source emits for numeric id columns.
pub fn parse_nullable_int(raw: &str) -> Option<i64> {
    if is_null_token(raw) {
        return None;
    }
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.fract() == 0.0 => Some(value as i64),
        _ => None,
    }
}

/// Title-case a name: first letter of each word uppercased, the rest
/// lowercased. Word boundaries are any non-alphabetic character, matching
/// how the source names were normalized historically.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut prev_alphabetic = false;
    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if prev_alphabetic {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alphabetic = true;
        } else {
            out.push(ch);
            prev_alphabetic = false;
        }
    }
    out
}
