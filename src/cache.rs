//! Namespaced cache for posts and tags.
//!
//! Parsing front matter and aggregating tags over every post is repeated for
//! every query the renderers make. The [`Cache`] memoizes those results so a
//! build touches the data provider once per distinct query.
//!
//! # Design
//!
//! ## Cache keys
//!
//! Keys are normalized before they reach the store: the raw key and the type
//! label are each trimmed and lower-cased, then joined with a dash:
//!
//! ```text
//! format_name(" BlAh ", "Post")  →  "post-blah"
//! format_name("blAh ", "poSt ")  →  "post-blah"
//! ```
//!
//! The type label keeps namespaces apart, so `get_post("foo")` and
//! `get_tag("foo")` never collide. Keys differing only by case or outer
//! whitespace deliberately share an entry.
//!
//! ## Misses
//!
//! A miss is `Ok(None)`, never an error. Errors only come from the backing
//! store itself (an unreadable cache directory, a failed write).
//!
//! ## Storage
//!
//! [`MemoryStore`] keeps entries in a `HashMap` for the lifetime of the
//! process. [`FileStore`] writes one JSON file per entry into a directory,
//! named by the SHA-256 of the normalized key, so a cache can outlive a
//! single build.
//!
//! Values are derived and recomputing them yields the same result, so
//! concurrent misses that both recompute and write are harmless: the last
//! write wins.

use crate::post::Post;
use crate::tag::Tag;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const POST: &str = "post";
pub const POSTS: &str = "posts";
pub const TAG: &str = "tag";
pub const TAGS: &str = "tags";

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A stored cache value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CacheValue {
    Post(Post),
    Posts(Vec<Post>),
    Tag(Tag),
    Tags(Vec<Tag>),
}

/// Backing storage for a [`Cache`]. Keys arrive already normalized.
pub trait CacheStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError>;

    /// Insert or replace the value under `key`.
    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), CacheError>;

    /// Drop every entry regardless of namespace.
    fn clear(&mut self) -> Result<(), CacheError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, CacheValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}

/// Directory-backed store: one `<sha256(key)>.json` file per entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir.join(format!("{:x}.json", digest))
    }
}

impl CacheStore for FileStore {
    /// Entries that fail to parse (format change, truncated write) count as misses.
    fn get(&self, key: &str) -> Result<Option<CacheValue>, CacheError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!(key, error = %e, "discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: CacheValue) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(&value)?;
        fs::write(self.entry_path(key), json)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), CacheError> {
        if !self.dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}

/// Hit/miss counters for a build run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            write!(f, "unused")
        } else {
            write!(
                f,
                "{} hits, {} misses ({} lookups)",
                self.hits,
                self.misses,
                self.total()
            )
        }
    }
}

/// Typed, namespaced front end over a [`CacheStore`].
pub struct Cache {
    store: Box<dyn CacheStore>,
    stats: CacheStats,
}

impl Default for Cache {
    fn default() -> Self {
        Self::memory()
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache").field("stats", &self.stats).finish()
    }
}

impl Cache {
    pub fn new(store: impl CacheStore + 'static) -> Self {
        Self {
            store: Box::new(store),
            stats: CacheStats::default(),
        }
    }

    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    pub fn file(dir: impl Into<PathBuf>) -> Self {
        Self::new(FileStore::new(dir))
    }

    /// Normalize a raw key under a type label: `"<type>-<key>"`, both
    /// trimmed and lower-cased.
    pub fn format_name(key: &str, kind: &str) -> String {
        format!(
            "{}-{}",
            kind.trim().to_lowercase(),
            key.trim().to_lowercase()
        )
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn lookup(&mut self, key: &str, kind: &str) -> Result<Option<CacheValue>, CacheError> {
        let value = self.store.get(&Self::format_name(key, kind))?;
        if value.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        Ok(value)
    }

    fn put(&mut self, key: &str, kind: &str, value: CacheValue) -> Result<(), CacheError> {
        self.store.set(&Self::format_name(key, kind), value)
    }

    pub fn get_post(&mut self, key: &str) -> Result<Option<Post>, CacheError> {
        Ok(match self.lookup(key, POST)? {
            Some(CacheValue::Post(post)) => Some(post),
            _ => None,
        })
    }

    pub fn set_post(&mut self, key: &str, post: &Post) -> Result<(), CacheError> {
        self.put(key, POST, CacheValue::Post(post.clone()))
    }

    pub fn get_posts(&mut self, key: &str) -> Result<Option<Vec<Post>>, CacheError> {
        Ok(match self.lookup(key, POSTS)? {
            Some(CacheValue::Posts(posts)) => Some(posts),
            _ => None,
        })
    }

    pub fn set_posts(&mut self, key: &str, posts: &[Post]) -> Result<(), CacheError> {
        self.put(key, POSTS, CacheValue::Posts(posts.to_vec()))
    }

    pub fn get_tag(&mut self, key: &str) -> Result<Option<Tag>, CacheError> {
        Ok(match self.lookup(key, TAG)? {
            Some(CacheValue::Tag(tag)) => Some(tag),
            _ => None,
        })
    }

    pub fn set_tag(&mut self, key: &str, tag: &Tag) -> Result<(), CacheError> {
        self.put(key, TAG, CacheValue::Tag(tag.clone()))
    }

    pub fn get_tags(&mut self, key: &str) -> Result<Option<Vec<Tag>>, CacheError> {
        Ok(match self.lookup(key, TAGS)? {
            Some(CacheValue::Tags(tags)) => Some(tags),
            _ => None,
        })
    }

    pub fn set_tags(&mut self, key: &str, tags: &[Tag]) -> Result<(), CacheError> {
        self.put(key, TAGS, CacheValue::Tags(tags.to_vec()))
    }

    /// Drop all entries in every namespace.
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.store.clear()
    }
}
