//! Ghost JSON exports.
//!
//! Ghost exports the whole database as JSON. Posts, tags and users live in
//! separate tables joined by id:
//!
//! ```text
//! { "db": [ { "data": {
//!     "posts":         [ { "id", "title", "slug", "markdown" | "mobiledoc" | "html", ... } ],
//!     "tags":          [ { "id", "name" } ],
//!     "posts_tags":    [ { "post_id", "tag_id", "sort_order" } ],
//!     "users":         [ { "id", "name" } ],
//!     "posts_authors": [ { "post_id", "author_id", "sort_order" } ]
//! } } ] }
//! ```
//!
//! Older exports put `data` at the top level and use integer ids; both shapes
//! are accepted. Each post is decoded on its own, so one malformed row only
//! fails that post.
//!
//! Images referenced as `__GHOST_URL__/content/images/...` are copied from a
//! `content/images/` directory next to the export file.

use super::{
    Asset, ItemFailure, MigratedPost, MigrateError, MigrationProvider, find_export_file,
    html_to_markdown, locate_under, relocate_images,
};
use crate::metadata;
use crate::post::Post;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const IMAGES_MARKER: &str = "/content/images/";

#[derive(Debug, Default, Clone, Copy)]
pub struct GhostMigrationProvider;

impl MigrationProvider for GhostMigrationProvider {
    fn name(&self) -> &'static str {
        "ghost"
    }

    fn read(&self, source: &Path) -> Result<Vec<Result<MigratedPost, ItemFailure>>, MigrateError> {
        let export = if source.is_dir() {
            find_export_file(source, &["json"])?
                .ok_or_else(|| MigrateError::SourceNotFound(source.join("*.json")))?
        } else {
            source.to_path_buf()
        };
        let images = export
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("content")
            .join("images");

        let root: Value = serde_json::from_str(&fs::read_to_string(&export)?)?;
        let data = export_data(&root)
            .ok_or_else(|| MigrateError::InvalidExport("no `data` object found".into()))?;
        let tables = Tables::new(data);

        let posts = data
            .get("posts")
            .and_then(Value::as_array)
            .ok_or_else(|| MigrateError::InvalidExport("no `posts` table found".into()))?;

        Ok(posts
            .iter()
            .enumerate()
            .filter_map(|(index, row)| convert(row, index, &tables, &images))
            .collect())
    }
}

/// `db[0].data` in current exports, top-level `data` in older ones.
fn export_data(root: &Value) -> Option<&Value> {
    root.get("db")
        .and_then(|db| db.get(0))
        .and_then(|db| db.get("data"))
        .or_else(|| root.get("data"))
}

/// Ghost ids are strings in current exports and integers in old ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
enum GhostId {
    Number(i64),
    Text(String),
}

impl fmt::Display for GhostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GhostId::Number(n) => write!(f, "{n}"),
            GhostId::Text(s) => write!(f, "{s}"),
        }
    }
}

/// ISO 8601 strings, or epoch milliseconds in old exports.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum GhostDate {
    Millis(i64),
    Text(String),
}

impl GhostDate {
    fn to_date_string(&self) -> Option<String> {
        let date = match self {
            GhostDate::Millis(ms) => chrono::DateTime::from_timestamp_millis(*ms)?,
            GhostDate::Text(s) => metadata::parse_date(s)?,
        };
        Some(metadata::format_date(&date))
    }
}

#[derive(Debug, Deserialize)]
struct GhostPost {
    id: GhostId,
    title: Option<String>,
    slug: Option<String>,
    markdown: Option<String>,
    mobiledoc: Option<String>,
    html: Option<String>,
    status: Option<String>,
    published_at: Option<GhostDate>,
    created_at: Option<GhostDate>,
    feature_image: Option<String>,
    custom_excerpt: Option<String>,
    meta_description: Option<String>,
    author_id: Option<GhostId>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    page: bool,
}

impl GhostPost {
    fn is_page(&self) -> bool {
        self.page || self.kind.as_deref() == Some("page")
    }
}

#[derive(Debug, Deserialize)]
struct Named {
    id: GhostId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct Link {
    post_id: GhostId,
    #[serde(alias = "author_id")]
    tag_id: GhostId,
    #[serde(default)]
    sort_order: i64,
}

/// Lookup tables for joining posts to their tags and authors.
#[derive(Debug, Default)]
struct Tables {
    tags: HashMap<GhostId, String>,
    users: HashMap<GhostId, String>,
    post_tags: HashMap<GhostId, Vec<(i64, GhostId)>>,
    post_authors: HashMap<GhostId, Vec<(i64, GhostId)>>,
}

impl Tables {
    /// Rows that fail to decode are dropped; a broken tag row should not
    /// fail every post that uses it.
    fn new(data: &Value) -> Self {
        fn rows<T: for<'de> Deserialize<'de>>(data: &Value, table: &str) -> Vec<T> {
            data.get(table)
                .and_then(Value::as_array)
                .map(|rows| {
                    rows.iter()
                        .filter_map(|row| T::deserialize(row).ok())
                        .collect()
                })
                .unwrap_or_default()
        }
        fn index(links: Vec<Link>) -> HashMap<GhostId, Vec<(i64, GhostId)>> {
            let mut map: HashMap<GhostId, Vec<(i64, GhostId)>> = HashMap::new();
            for link in links {
                map.entry(link.post_id)
                    .or_default()
                    .push((link.sort_order, link.tag_id));
            }
            for entries in map.values_mut() {
                entries.sort_by_key(|(order, _)| *order);
            }
            map
        }

        Self {
            tags: rows::<Named>(data, "tags")
                .into_iter()
                .map(|t| (t.id, t.name))
                .collect(),
            users: rows::<Named>(data, "users")
                .into_iter()
                .map(|u| (u.id, u.name))
                .collect(),
            post_tags: index(rows(data, "posts_tags")),
            post_authors: index(rows(data, "posts_authors")),
        }
    }

    fn tags_for(&self, post: &GhostId) -> Vec<&str> {
        self.post_tags
            .get(post)
            .into_iter()
            .flatten()
            .filter_map(|(_, tag)| self.tags.get(tag).map(String::as_str))
            .collect()
    }

    fn author_for(&self, post: &GhostPost) -> Option<&str> {
        let primary = self
            .post_authors
            .get(&post.id)
            .and_then(|authors| authors.first())
            .map(|(_, id)| id)
            .or(post.author_id.as_ref())?;
        self.users.get(primary).map(String::as_str)
    }
}

fn convert(
    row: &Value,
    index: usize,
    tables: &Tables,
    images: &Path,
) -> Option<Result<MigratedPost, ItemFailure>> {
    let label = row
        .get("slug")
        .or_else(|| row.get("id"))
        .map(|v| v.as_str().map(String::from).unwrap_or_else(|| v.to_string()))
        .unwrap_or_else(|| format!("post {}", index + 1));

    let post = match GhostPost::deserialize(row) {
        Ok(post) => post,
        Err(e) => return Some(Err(ItemFailure::new(label, e))),
    };
    if post.is_page() {
        debug!(slug = post.slug.as_deref(), "skipping page");
        return None;
    }
    Some(build_post(&post, tables, images).map_err(|reason| ItemFailure::new(label, reason)))
}

fn build_post(ghost: &GhostPost, tables: &Tables, images: &Path) -> Result<MigratedPost, String> {
    let title = ghost.title.as_deref().map(str::trim).filter(|t| !t.is_empty());
    if title.is_none() && ghost.slug.is_none() {
        return Err("post has neither a title nor a slug".into());
    }

    let mut post = Post::new();
    post.title = title.unwrap_or_default().to_string();
    post.matter.title = title.map(String::from);
    post.matter.slug = ghost.slug.clone();
    post.matter.description = metadata::resolve(&[
        ghost.custom_excerpt.as_deref(),
        ghost.meta_description.as_deref(),
    ]);
    post.matter.date = ghost
        .published_at
        .as_ref()
        .or(ghost.created_at.as_ref())
        .and_then(GhostDate::to_date_string);
    post.published = ghost.status.as_deref() == Some("published");
    post.author = tables.author_for(ghost).map(String::from);
    post.matter.author = post.author.clone();
    post.add_tags(&tables.tags_for(&ghost.id));
    post.matter.extra.insert(
        "ghost_id".into(),
        serde_yaml::Value::String(ghost.id.to_string()),
    );

    let markdown = ghost
        .markdown
        .clone()
        .or_else(|| ghost.mobiledoc.as_deref().and_then(mobiledoc_markdown))
        .or_else(|| ghost.html.as_deref().map(html_to_markdown))
        .unwrap_or_default();
    let (content, mut assets) = relocate_images(&markdown, |r| locate_image(images, r));
    post.content = content;

    if let Some(cover) = ghost.feature_image.as_deref() {
        post.matter.cover = Some(match locate_image(images, cover) {
            Some((from, to)) => {
                let public = format!("/{}/{}", super::IMAGES_DIR, to.display());
                assets.push(Asset { from, to });
                public
            }
            None => cover.to_string(),
        });
    }

    Ok(MigratedPost { post, assets })
}

/// Resolve a Ghost image URL (`__GHOST_URL__/content/images/...`, or any URL
/// with that path) against the downloaded images directory.
fn locate_image(images: &Path, reference: &str) -> Option<(PathBuf, PathBuf)> {
    let (_, rest) = reference.split_once(IMAGES_MARKER)?;
    locate_under(images, rest)
}

/// Markdown from the markdown cards of a mobiledoc document.
fn mobiledoc_markdown(mobiledoc: &str) -> Option<String> {
    let doc: Value = serde_json::from_str(mobiledoc).ok()?;
    let parts: Vec<&str> = doc
        .get("cards")?
        .as_array()?
        .iter()
        .filter_map(|card| {
            let card = card.as_array()?;
            match (card.first()?.as_str()?, card.get(1)?) {
                ("markdown" | "card-markdown", payload) => payload.get("markdown")?.as_str(),
                _ => None,
            }
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}
