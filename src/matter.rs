//! Front matter: the metadata block at the top of a content file.
//!
//! ```text
//! ---
//! title: Wowza Cool!
//! date: 2019-01-01
//! tags: [travel, food]
//! published: false
//! series: summer        ← unknown keys land in `extra`
//! ---
//!
//! Markdown body starts here.
//! ```
//!
//! [`Matter`] names the keys the pipeline understands and keeps everything
//! else in a flattened `extra` map, so migrated files round-trip their
//! platform-specific metadata untouched.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

const DELIMITER: &str = "---";

/// Front matter fields of a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Matter {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub title: Option<String>,
    /// Raw date string; parsed on demand by [`Post::date`](crate::post::Post::date).
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub permalink: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub cover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub author: Option<String>,
    /// Accepts a YAML list or a single comma/space separated string.
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "string_or_list")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
    /// Pre-rendered body; short-circuits markdown rendering.
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub body: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Matter {
    /// Read an extension key as a list of strings (same leniency as `tags`).
    pub fn extra_list(&self, key: &str) -> Vec<String> {
        self.extra.get(key).map(value_to_list).unwrap_or_default()
    }
}

/// Split a source file into its front matter block and body.
///
/// Returns `None` when the file does not open with a `---` line or the block
/// is never closed; callers then treat the whole file as body.
pub fn split(source: &str) -> Option<(&str, &str)> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let after_open = source
        .strip_prefix(DELIMITER)?
        .trim_start_matches([' ', '\t']);
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let front = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((front, body));
        }
        offset += line.len();
    }
    None
}

/// Parse a source file into front matter and markdown body.
///
/// Files without front matter yield a default [`Matter`] and the full text.
pub fn parse(source: &str) -> Result<(Matter, String), serde_yaml::Error> {
    let Some((front, body)) = split(source) else {
        return Ok((Matter::default(), source.to_string()));
    };
    let matter = if front.trim().is_empty() {
        Matter::default()
    } else {
        serde_yaml::from_str(front)?
    };
    Ok((matter, body.trim_start_matches(['\r', '\n']).to_string()))
}

/// Serialize front matter and body into a canonical content file.
pub fn render(matter: &Matter, content: &str) -> Result<String, serde_yaml::Error> {
    let yaml = if *matter == Matter::default() {
        String::new()
    } else {
        serde_yaml::to_string(matter)?
    };
    let mut out = String::with_capacity(yaml.len() + content.len() + 16);
    out.push_str(DELIMITER);
    out.push('\n');
    out.push_str(&yaml);
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(content.trim_end());
    out.push('\n');
    Ok(out)
}

/// Scalars of any YAML type are read as strings (`date: 2019` is a number to YAML).
fn opt_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    Ok(value_to_list(&value))
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

fn value_to_list(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        serde_yaml::Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        other => scalar_to_string(other).into_iter().collect(),
    }
}
