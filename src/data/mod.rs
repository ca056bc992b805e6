//! Data access: providers supply raw posts, the service answers queries.
//!
//! ```text
//! renderer ──► DataService ──► Cache (hit?) ──► DataProvider (miss)
//!                                   ▲                  │
//!                                   └──── populate ◄───┘
//! ```
//!
//! Every query is cache-aside: the cache is consulted first, and on a miss
//! the provider is asked and the result stored. A post or tag that does not
//! exist is `Ok(None)`; only provider or cache storage failures are errors.
//!
//! Providers are selected by name from `data.type` in the site config. The
//! filesystem provider ([`file::FileDataProvider`]) is the only built-in one.

pub mod file;

use crate::cache::{Cache, CacheError, CacheStats};
use crate::config::SiteConfig;
use crate::post::Post;
use crate::tag::{Tag, aggregate_tags};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use file::FileDataProvider;

/// Names accepted by `data.type`.
pub const PROVIDERS: &[&str] = &["file"];

const ALL: &str = "all";
const PUBLISHED: &str = "published";

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Unknown data provider: {0}")]
    UnknownProvider(String),
    #[error("Unknown cache type: {0}")]
    UnknownCache(String),
}

/// A source of raw posts and tags.
pub trait DataProvider {
    /// Registry name (`data.type`).
    fn name(&self) -> &'static str;

    /// Every post the source holds, in a stable order.
    fn posts(&self) -> Result<Vec<Post>, DataError>;

    /// Tags over the provider's posts. Defaults to aggregating [`posts`](Self::posts).
    fn tags(&self) -> Result<Vec<Tag>, DataError> {
        Ok(aggregate_tags(&self.posts()?))
    }
}

/// Resolve a provider by its registry name.
pub fn provider_for(name: &str, post_path: &Path) -> Result<Box<dyn DataProvider>, DataError> {
    match name.trim() {
        "file" => Ok(Box::new(FileDataProvider::new(post_path))),
        other => Err(DataError::UnknownProvider(other.to_string())),
    }
}

/// Answers post and tag queries over a provider, through a cache.
pub struct DataService {
    provider: Box<dyn DataProvider>,
    cache: Cache,
}

impl DataService {
    pub fn new(provider: impl DataProvider + 'static, cache: Cache) -> Self {
        Self {
            provider: Box::new(provider),
            cache,
        }
    }

    /// Build the provider and cache named in the site config.
    ///
    /// Relative paths resolve against `site_root`.
    pub fn from_config(config: &SiteConfig, site_root: &Path) -> Result<Self, DataError> {
        let provider = provider_for(&config.data.kind, &site_root.join(&config.data.post_path))?;
        let cache = match config.cache.kind.trim() {
            "memory" => Cache::memory(),
            "file" => Cache::file(site_root.join(&config.cache.path)),
            other => return Err(DataError::UnknownCache(other.to_string())),
        };
        Ok(Self { provider, cache })
    }

    pub fn provider(&self) -> &dyn DataProvider {
        self.provider.as_ref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&mut self) -> Result<(), DataError> {
        self.cache.clear()?;
        Ok(())
    }

    /// All posts, in provider order.
    pub fn get_posts(&mut self) -> Result<Vec<Post>, DataError> {
        if let Some(posts) = self.cache.get_posts(ALL)? {
            return Ok(posts);
        }
        let posts = self.provider.posts()?;
        debug!(provider = self.provider.name(), count = posts.len(), "loaded posts");
        self.cache.set_posts(ALL, &posts)?;
        Ok(posts)
    }

    /// A post by exact id, or `None`.
    ///
    /// Cache keys fold case, so a hit only counts when the cached post's id
    /// matches `id` exactly.
    pub fn get_post(&mut self, id: &str) -> Result<Option<Post>, DataError> {
        if let Some(post) = self.cache.get_post(id)?.filter(|p| p.id() == id) {
            return Ok(Some(post));
        }
        let found = self.get_posts()?.into_iter().find(|p| p.id() == id);
        if let Some(post) = &found {
            self.cache.set_post(id, post)?;
        }
        Ok(found)
    }

    /// As [`get_post`](Self::get_post), but `None` for unpublished posts.
    pub fn get_published_post(&mut self, id: &str) -> Result<Option<Post>, DataError> {
        Ok(self.get_post(id)?.filter(|p| p.published))
    }

    pub fn get_published_posts(&mut self) -> Result<Vec<Post>, DataError> {
        if let Some(posts) = self.cache.get_posts(PUBLISHED)? {
            return Ok(posts);
        }
        let posts: Vec<Post> = self
            .get_posts()?
            .into_iter()
            .filter(|p| p.published)
            .collect();
        self.cache.set_posts(PUBLISHED, &posts)?;
        Ok(posts)
    }

    /// The `count` most recent published posts, newest first.
    ///
    /// Ties on date are broken by id so feeds are stable between builds.
    pub fn get_posts_by_count(&mut self, count: usize) -> Result<Vec<Post>, DataError> {
        let key = format!("latest-{count}");
        if let Some(posts) = self.cache.get_posts(&key)? {
            return Ok(posts);
        }
        let mut dated: Vec<_> = self
            .get_published_posts()?
            .into_iter()
            .map(|p| (p.date(), p))
            .collect();
        dated.sort_by(|(da, a), (db, b)| db.cmp(da).then_with(|| a.id().cmp(&b.id())));
        let posts: Vec<Post> = dated.into_iter().take(count).map(|(_, p)| p).collect();
        self.cache.set_posts(&key, &posts)?;
        Ok(posts)
    }

    pub fn get_tags(&mut self) -> Result<Vec<Tag>, DataError> {
        if let Some(tags) = self.cache.get_tags(ALL)? {
            return Ok(tags);
        }
        let tags = self.provider.tags()?;
        debug!(provider = self.provider.name(), count = tags.len(), "loaded tags");
        self.cache.set_tags(ALL, &tags)?;
        Ok(tags)
    }

    /// A tag by exact (case-sensitive) name, or `None`.
    ///
    /// `Rust` and `rust` share a cache key; the entry holds whichever was
    /// looked up last.
    pub fn get_tag(&mut self, name: &str) -> Result<Option<Tag>, DataError> {
        if let Some(tag) = self.cache.get_tag(name)?.filter(|t| t.name() == name) {
            return Ok(Some(tag));
        }
        let found = self.get_tags()?.into_iter().find(|t| t.name() == name);
        if let Some(tag) = &found {
            self.cache.set_tag(name, tag)?;
        }
        Ok(found)
    }

    /// Tags with at least one published post.
    pub fn get_published_tags(&mut self) -> Result<Vec<Tag>, DataError> {
        if let Some(tags) = self.cache.get_tags(PUBLISHED)? {
            return Ok(tags);
        }
        let tags: Vec<Tag> = self
            .get_tags()?
            .into_iter()
            .filter(Tag::is_published)
            .collect();
        self.cache.set_tags(PUBLISHED, &tags)?;
        Ok(tags)
    }
}
