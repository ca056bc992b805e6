//! Metadata resolution shared by posts and migration providers.
//!
//! Platform exports disagree on almost everything: a title may live in front
//! matter, a filename, or an `<h1>`; dates arrive as RFC 3339, RFC 2822, or
//! bare `YYYY-MM-DD`. These helpers give every provider the same merge and
//! parse rules.
//!
//! ## Resolution priority
//!
//! Each field is resolved independently from a list of candidates in priority
//! order. The first non-empty value wins:
//!
//! ```text
//! title:  resolve(&[front_matter_title, filename_title])
//! date:   parse_date(front_matter_date) or filename date
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Resolve a metadata field from multiple sources.
///
/// Takes a list of optional values in priority order and returns the first
/// non-None, non-empty value, trimmed.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

const DATETIME_FORMATS_WITH_ZONE: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M:%S%.f %z"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse a date in any of the formats found in blog exports.
///
/// Accepted, in order: RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS ±ZZZZ`
/// (Jekyll), `YYYY-MM-DD HH:MM:SS` (WordPress, read as UTC), and bare
/// `YYYY-MM-DD` (midnight UTC). Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS_WITH_ZONE {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Canonical date string written into migrated front matter.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
