//! Migration from other blogging platforms.
//!
//! A [`MigrationProvider`] reads one platform's export and normalizes every
//! item into a [`Post`]. The shared writer then lays the result out as a
//! quill post directory:
//!
//! ```text
//! <destination>/
//! ├── wowza-cool.md          one canonical file per post (front matter + markdown)
//! ├── wowza-cool-2.md        id collision → numeric suffix
//! └── images/
//!     └── 2019/01/whale.jpg  referenced local media, relative paths preserved
//! ```
//!
//! ## Best effort
//!
//! Exports are not validated upstream, so one bad item never aborts a run.
//! Providers return a `Result` per item; failures end up in the
//! [`MigrationReport`] next to the files that were written. Only problems with
//! the export as a whole (missing source, unreadable XML root, destination not
//! writable) are errors.
//!
//! ## Providers
//!
//! | Name | Export format |
//! |------|---------------|
//! | `jekyll` | site directory with `_posts/` and `_drafts/` |
//! | `wordpress` | WXR XML export (file, or directory holding one) |
//! | `ghost` | JSON export (file, or directory holding one) |
//! | `medium` | extracted export archive with `posts/*.html` |

pub mod ghost;
pub mod jekyll;
pub mod medium;
pub mod wordpress;

use crate::markdown;
use crate::naming::slugify;
use crate::post::Post;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use ghost::GhostMigrationProvider;
pub use jekyll::JekyllMigrationProvider;
pub use medium::MediumMigrationProvider;
pub use wordpress::WordpressMigrationProvider;

/// Directory under the destination that receives copied media.
pub const IMAGES_DIR: &str = "images";

#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("Unknown migration provider: {0}")]
    UnknownProvider(String),
    #[error("Missing argument: {0} must be specified")]
    MissingArgument(&'static str),
    #[error("Source not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Invalid export: {0}")]
    InvalidExport(String),
    #[error("Failed to serialize {id}: {source}")]
    Serialize {
        id: String,
        source: serde_yaml::Error,
    },
}

/// A source item that could not be migrated.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    /// File name, post id, or export title identifying the item.
    pub item: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(item: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            item: item.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

/// A media file to copy: `from` on disk, `to` relative to `<dest>/images/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Asset {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// One normalized export item.
#[derive(Debug, Clone)]
pub struct MigratedPost {
    pub post: Post,
    pub assets: Vec<Asset>,
}

impl MigratedPost {
    pub fn new(post: Post) -> Self {
        Self {
            post,
            assets: Vec::new(),
        }
    }
}

/// What a migration run produced.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MigrationReport {
    /// Post files written, in item order.
    pub written: Vec<PathBuf>,
    /// Media files copied, relative to `<dest>/images/`.
    pub assets: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A platform adapter.
pub trait MigrationProvider {
    /// Registry name, as passed on the command line.
    fn name(&self) -> &'static str;

    /// Read and normalize every item in the export at `source`.
    ///
    /// Item-level problems are `Err` entries in the returned list; the outer
    /// error is reserved for exports that cannot be read at all.
    fn read(&self, source: &Path) -> Result<Vec<Result<MigratedPost, ItemFailure>>, MigrateError>;

    /// Read the export and write canonical post files and media to `dest`.
    fn migrate(&self, source: &Path, dest: &Path) -> Result<MigrationReport, MigrateError> {
        if !source.exists() {
            return Err(MigrateError::SourceNotFound(source.to_path_buf()));
        }
        let items = self.read(source)?;
        info!(provider = self.name(), items = items.len(), "read export");
        write_posts(items, dest)
    }
}

/// Names accepted by [`Migrate::new`].
pub const PROVIDERS: &[&str] = &["jekyll", "wordpress", "ghost", "medium"];

/// Dispatches a migration to the provider selected by name.
pub struct Migrate {
    provider: Box<dyn MigrationProvider>,
}

impl fmt::Debug for Migrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migrate")
            .field("provider", &self.provider.name())
            .finish()
    }
}

impl Migrate {
    /// Resolve a provider by name. Unknown names are rejected here, before
    /// any source is touched.
    pub fn new(kind: &str) -> Result<Self, MigrateError> {
        let provider: Box<dyn MigrationProvider> = match kind.trim() {
            "jekyll" => Box::new(JekyllMigrationProvider),
            "wordpress" => Box::new(WordpressMigrationProvider),
            "ghost" => Box::new(GhostMigrationProvider),
            "medium" => Box::new(MediumMigrationProvider),
            other => return Err(MigrateError::UnknownProvider(other.to_string())),
        };
        Ok(Self { provider })
    }

    pub fn providers() -> &'static [&'static str] {
        PROVIDERS
    }

    pub fn provider(&self) -> &dyn MigrationProvider {
        self.provider.as_ref()
    }

    pub fn migrate(&self, source: &Path, dest: &Path) -> Result<MigrationReport, MigrateError> {
        if source.as_os_str().is_empty() {
            return Err(MigrateError::MissingArgument("source"));
        }
        if dest.as_os_str().is_empty() {
            return Err(MigrateError::MissingArgument("destination"));
        }
        self.provider.migrate(source, dest)
    }
}

// =============================================================================
// Shared writer
// =============================================================================

/// Write normalized items to `dest` and copy their media.
///
/// Posts are written sequentially in item order so collision suffixes are
/// deterministic. Media copies run on the rayon pool.
pub fn write_posts(
    items: Vec<Result<MigratedPost, ItemFailure>>,
    dest: &Path,
) -> Result<MigrationReport, MigrateError> {
    fs::create_dir_all(dest)?;
    let mut report = MigrationReport::default();
    let mut taken: HashSet<String> = HashSet::new();
    let mut assets: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for item in items {
        let migrated = match item {
            Ok(migrated) => migrated,
            Err(failure) => {
                warn!(item = %failure.item, reason = %failure.reason, "skipping item");
                report.failures.push(failure);
                continue;
            }
        };
        let id = migrated.post.id();
        let source = migrated
            .post
            .to_source()
            .map_err(|source| MigrateError::Serialize {
                id: id.clone(),
                source,
            })?;
        let path = dest.join(format!("{}.md", unique_stem(&id, &mut taken)));
        fs::write(&path, source)?;
        debug!(path = %path.display(), "wrote post");
        report.written.push(path);

        for asset in migrated.assets {
            assets.entry(asset.to).or_insert(asset.from);
        }
    }

    let images = dest.join(IMAGES_DIR);
    let copied: Vec<Result<PathBuf, ItemFailure>> = assets
        .into_par_iter()
        .map(|(to, from)| copy_asset(&from, &images.join(&to)).map(|()| to))
        .collect();
    for result in copied {
        match result {
            Ok(to) => report.assets.push(to),
            Err(failure) => {
                warn!(item = %failure.item, reason = %failure.reason, "asset not copied");
                report.failures.push(failure);
            }
        }
    }

    info!(
        written = report.written.len(),
        assets = report.assets.len(),
        failures = report.failures.len(),
        "migration finished"
    );
    Ok(report)
}

/// File stem for a post id, suffixed `-2`, `-3`, ... on collision.
fn unique_stem(id: &str, taken: &mut HashSet<String>) -> String {
    let base = match slugify(id) {
        s if s.is_empty() => "untitled".to_string(),
        s => s,
    };
    let mut stem = base.clone();
    let mut n = 2;
    while !taken.insert(stem.clone()) {
        stem = format!("{base}-{n}");
        n += 1;
    }
    stem
}

fn copy_asset(from: &Path, to: &Path) -> Result<(), ItemFailure> {
    let fail = |e: std::io::Error| ItemFailure::new(from.display().to_string(), e);
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(fail)?;
    }
    fs::copy(from, to).map_err(fail)?;
    Ok(())
}

/// Rewrite image references in markdown `content` that `locate` maps to a
/// file on disk, pointing them at `/images/<relative>`.
///
/// `locate` returns the file to copy and its path relative to the images
/// directory; references it declines (remote URLs, missing files) stay as
/// they are. Only the URL spans themselves are rewritten, so the same text
/// elsewhere in the body (prose, link text, a longer remote URL) is kept.
pub fn relocate_images(
    content: &str,
    locate: impl Fn(&str) -> Option<(PathBuf, PathBuf)>,
) -> (String, Vec<Asset>) {
    let mut assets: Vec<Asset> = Vec::new();
    let mut located: HashMap<String, Option<String>> = HashMap::new();
    let mut rewritten = String::with_capacity(content.len());
    let mut cursor = 0;

    for span in markdown::image_spans(content) {
        if span.range.start < cursor {
            continue;
        }
        let public = located.entry(span.url.clone()).or_insert_with(|| {
            locate(&span.url).map(|(from, to)| {
                let public = format!("/{IMAGES_DIR}/{}", to_url_path(&to));
                assets.push(Asset { from, to });
                public
            })
        });
        if let Some(public) = public.as_deref() {
            rewritten.push_str(&content[cursor..span.range.start]);
            rewritten.push_str(public);
            cursor = span.range.end;
        }
    }
    rewritten.push_str(&content[cursor..]);
    (rewritten, assets)
}

/// Map a path relative to `root` to an [`Asset`] when the file exists.
///
/// `relative` is a URL path (forward slashes, optional leading slash). Parent
/// segments are rejected so an export cannot reach outside its own tree.
pub fn locate_under(root: &Path, relative: &str) -> Option<(PathBuf, PathBuf)> {
    if !markdown::is_local(relative) {
        return None;
    }
    let relative = markdown::strip_query(relative).trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|s| s == "..") {
        return None;
    }
    let to: PathBuf = relative.split('/').filter(|s| !s.is_empty()).collect();
    let from = root.join(&to);
    from.is_file().then_some((from, to))
}

fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert an HTML body to markdown.
pub fn html_to_markdown(html: &str) -> String {
    html2md::parse_html(html).trim().to_string()
}

/// The first existing file directly in `dir` with one of `extensions`,
/// in file-name order.
pub(crate) fn find_export_file(dir: &Path, extensions: &[&str]) -> Result<Option<PathBuf>, MigrateError> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| extensions.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    candidates.sort();
    Ok(candidates.into_iter().next())
}
