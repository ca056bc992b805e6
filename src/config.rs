//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives at
//! the site root; user values are layered over stock defaults, so a config
//! only needs the keys it changes.
//!
//! ## Config File Location
//!
//! ```text
//! my-blog/
//! ├── config.toml      # Site config (overrides stock defaults)
//! ├── posts/           # data.post_path
//! │   └── 2019-01-01-wowza-cool.md
//! └── content/         # data.content_path, copied verbatim by the html renderer
//!     └── robots.txt
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Quill"
//! url = "https://example.com"
//! description = ""
//! author_name = ""
//! author_email = ""
//! url_pattern = "default"    # default | date | ordinal | ":year/:month/:title"
//! index_count = 20           # Posts on the index page and in feeds
//! render = ["html", "json", "atom"]
//! output = "dist"
//!
//! [data]
//! type = "file"
//! post_path = "posts"
//! content_path = "content"
//!
//! [cache]
//! type = "memory"            # memory | file
//! path = ".quill-cache"
//!
//! [processing]
//! max_processes = 4          # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::data;
use crate::render;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title, used in page headers and the feed.
    pub title: String,
    /// Absolute base URL the site is served from.
    pub url: String,
    pub description: String,
    pub author_name: String,
    pub author_email: String,
    /// Named URL style or token path for post locations.
    pub url_pattern: String,
    /// Number of posts on the index page and in feeds.
    pub index_count: usize,
    /// Render providers to run on `build`, in order.
    pub render: Vec<String>,
    /// Output directory, relative to the site root.
    pub output: String,
    pub data: DataConfig,
    pub cache: CacheConfig,
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Quill".to_string(),
            url: "https://example.com".to_string(),
            description: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            url_pattern: "default".to_string(),
            index_count: 20,
            render: render::PROVIDERS.iter().map(|s| s.to_string()).collect(),
            output: "dist".to_string(),
            data: DataConfig::default(),
            cache: CacheConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.title.trim().is_empty() {
            return Err(ConfigError::Validation("title must not be empty".into()));
        }
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation("url must not be empty".into()));
        }
        if self.index_count == 0 {
            return Err(ConfigError::Validation(
                "index_count must be greater than 0".into(),
            ));
        }
        if let Some(unknown) = self
            .render
            .iter()
            .find(|name| !render::PROVIDERS.contains(&name.trim()))
        {
            return Err(ConfigError::Validation(format!(
                "unknown render provider '{unknown}' (expected one of: {})",
                render::PROVIDERS.join(", ")
            )));
        }
        if !CACHE_TYPES.contains(&self.cache.kind.trim()) {
            return Err(ConfigError::Validation(format!(
                "cache.type must be one of: {}",
                CACHE_TYPES.join(", ")
            )));
        }
        if self.data.kind.trim().is_empty() {
            return Err(ConfigError::Validation(
                "data.type must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Rebase the relative directory settings onto the site root.
    ///
    /// Absolute paths are left as they are.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let rebase = |path: &mut String| {
            *path = root.join(path.as_str()).to_string_lossy().into_owned();
        };
        rebase(&mut self.output);
        rebase(&mut self.data.post_path);
        rebase(&mut self.data.content_path);
        rebase(&mut self.cache.path);
        self
    }
}

/// Where posts and static content come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Data provider registry key.
    #[serde(rename = "type")]
    pub kind: String,
    /// Directory of post files, relative to the site root.
    pub post_path: String,
    /// Static files copied verbatim into the output.
    pub content_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            kind: data::PROVIDERS[0].to_string(),
            post_path: "posts".to_string(),
            content_path: "content".to_string(),
        }
    }
}

pub const CACHE_TYPES: &[&str] = &["memory", "file"];

/// Cache backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    pub kind: String,
    /// Directory for the `file` backend, relative to the site root.
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            path: ".quill-cache".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel asset-copy workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `SiteConfig::default()` as a TOML table, the layer `config.toml` sits on.
fn defaults() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Lay `top` over `base`. Tables combine per key; any other value in `top`
/// wins outright, arrays included.
fn layer(base: toml::Value, top: toml::Value) -> toml::Value {
    match (base, top) {
        (toml::Value::Table(mut table), toml::Value::Table(top)) => {
            for (key, value) in top {
                let value = match table.remove(&key) {
                    Some(below) => layer(below, value),
                    None => value,
                };
                table.insert(key, value);
            }
            toml::Value::Table(table)
        }
        (_, top) => top,
    }
}

/// The site's `config.toml`, parsed but not typed. `None` when absent.
fn read_config_file(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = root.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(&path)?)?))
}

fn from_value(value: toml::Value) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = value.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site config from `config.toml` in `root`.
///
/// Missing keys take their defaults; unknown keys and invalid values are errors.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let value = match read_config_file(root)? {
        Some(file) => layer(defaults(), file),
        None => defaults(),
    };
    from_value(value)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Quill Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Site title, shown in page headers and the Atom feed.
title = "Quill"

# Absolute base URL the site is served from.
url = "https://example.com"

description = ""
author_name = ""
author_email = ""

# Where each post is written. Either a named style:
#   default  -> wowza-cool
#   date     -> 2019/01/01/wowza-cool
#   ordinal  -> 2019/1/wowza-cool
# or a token path using :title :year :month :day :slug, e.g. ":year/:month/:title".
url_pattern = "default"

# Posts on the index page and in the feed.
index_count = 20

# Render providers run by `quill build`.
render = ["html", "json", "atom"]

# Output directory, relative to the site root.
output = "dist"

# ---------------------------------------------------------------------------
# Data source
# ---------------------------------------------------------------------------
[data]
# Data provider. "file" reads markdown files with YAML front matter.
type = "file"

# Directory of post files, relative to the site root.
post_path = "posts"

# Static files copied verbatim into the output.
content_path = "content"

# ---------------------------------------------------------------------------
# Cache
# ---------------------------------------------------------------------------
[cache]
# "memory" lives for one run; "file" persists entries between runs.
type = "memory"
path = ".quill-cache"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for copying migrated assets.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
