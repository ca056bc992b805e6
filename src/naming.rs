//! Slug generation and dated filename parsing.
//!
//! Every identifier that ends up in a URL goes through [`slugify`]: post ids
//! derived from titles, tag page paths, and the `:title` token of a URL
//! pattern. Platform exports name their files with a date prefix, which
//! [`parse_dated_name`] splits off:
//!
//! - `2019-01-01-wowza-cool.md` (Jekyll) → date `2019-01-01`, name `wowza-cool`
//! - `2019-01-01_Wowza-Cool-3f2a9c1b.html` (Medium) → date `2019-01-01`, name `Wowza-Cool-3f2a9c1b`

use chrono::NaiveDate;

/// Convert arbitrary text into a URL slug.
///
/// - Lower-cases the input
/// - Replaces every run of characters outside `[a-z0-9]` with a single dash
/// - Strips leading and trailing dashes
///
/// The result is idempotent: `slugify(&slugify(s)) == slugify(s)`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Result of parsing a filename stem like `2019-01-01-wowza-cool`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatedName {
    /// Date prefix if present and valid.
    pub date: Option<NaiveDate>,
    /// Name part after the date and its separator. The full input when undated.
    pub name: String,
    /// Display title: name with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a filename stem following the `YYYY-MM-DD<sep>name` convention,
/// where `<sep>` is `-` or `_`.
///
/// - `"2019-01-01-wowza-cool"` → date=Some(2019-01-01), name="wowza-cool"
/// - `"2019-01-01_Wowza-Cool"` → date=Some(2019-01-01), name="Wowza-Cool"
/// - `"2019-13-01-bad-month"` → date=None, name="2019-13-01-bad-month"
/// - `"about"` → date=None, name="about"
pub fn parse_dated_name(stem: &str) -> DatedName {
    if let Some(prefix) = stem.get(..10)
        && let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
    {
        let rest = &stem[10..];
        let name = rest
            .strip_prefix('-')
            .or_else(|| rest.strip_prefix('_'))
            .unwrap_or(rest);
        return DatedName {
            date: Some(date),
            name: name.to_string(),
            display_title: name.replace('-', " "),
        };
    }
    DatedName {
        date: None,
        name: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}
