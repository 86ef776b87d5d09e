//! Normalisation of the scraped strings: dates, counts, titles and
//! Cloudflare-protected e-mail addresses

use crate::{Result, ScrapeError};
use chrono::{NaiveDateTime, TimeZone, Utc};

/// Formats seen in `title` and `datetime` attributes
const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%SZ", "%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S"];

/// Parses a page timestamp into unix seconds (UTC)
///
/// Accepts `2024-01-15 10:30:00Z` (tooltips) and `2024-01-15T10:30:00`
/// with or without a trailing `Z` (`<time datetime>`).
pub fn parse_timestamp(value: &str) -> Result<i64> {
    let value = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive).timestamp())
        .ok_or_else(|| ScrapeError::Date {
            value: value.to_string(),
        })
}

/// Keeps only the ASCII digits of `value`
///
/// `"Viewed 1,234 times"` becomes `"1234"`.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Parses a displayed count such as `-3`, `+50` or `12,345`
pub fn parse_count(field: &'static str, value: &str) -> Result<i64> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '+')
        .collect();
    cleaned
        .parse()
        .map_err(|_| ScrapeError::number(field, value.trim()))
}

/// Decodes a Cloudflare e-mail protection string
///
/// The first hex byte is the XOR key for the remaining bytes.
pub fn decode_cfemail(encoded: &str) -> Option<String> {
    let encoded = encoded.trim();
    if encoded.len() < 2 || encoded.len() % 2 != 0 {
        return None;
    }

    let bytes = (0..encoded.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(encoded.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;

    let (key, rest) = bytes.split_first()?;
    Some(rest.iter().map(|b| char::from(b ^ key)).collect())
}

/// Strips the `[closed]` / `[duplicate]` markers and escapes quotes the way
/// the public API does
pub fn clean_title(raw: &str) -> String {
    let mut title = raw.trim().to_string();
    for marker in ["[closed]", "[duplicate]"] {
        if title.contains(marker) {
            title = title.replace(marker, "").trim().to_string();
        }
    }
    title.replace('\'', "&#39;").replace('"', "&quot;")
}
