//! Medium export archives.
//!
//! Medium exports an archive with one standalone HTML document per post:
//!
//! ```text
//! medium-export/
//! └── posts/
//!     ├── 2019-01-15_The-Largest-Whale-3f2a9c1b7e4d.html   published
//!     └── draft_Unfinished-Thoughts-0a1b2c3d4e5f.html       draft
//! ```
//!
//! Each document is microformat-tagged, which is what the extraction keys on:
//!
//! | Element | Post field |
//! |---------|------------|
//! | `h1.p-name` (else `<title>`) | `title` |
//! | `section[data-field=subtitle]` | `matter.description` |
//! | `section[data-field=body]` | content, HTML converted to markdown |
//! | `time.dt-published[datetime]` | `matter.date` |
//! | `a.p-author` | `author` |
//! | `a.p-canonical[href]` | `medium_url` in the extension map |
//!
//! Slugs come from the file name with Medium's trailing post hash removed.
//! Images stay on Medium's CDN; nothing is copied.

use super::{ItemFailure, MigratedPost, MigrateError, MigrationProvider, html_to_markdown};
use crate::metadata;
use crate::naming::{parse_dated_name, slugify};
use crate::post::Post;
use scraper::{ElementRef, Html, Selector};
use std::fs;
use std::path::Path;

const POSTS_DIR: &str = "posts";
const DRAFT_PREFIX: &str = "draft_";
/// Medium's post hashes are 10 to 12 lowercase hex digits.
const MIN_HASH_LEN: usize = 10;

#[derive(Debug, Default, Clone, Copy)]
pub struct MediumMigrationProvider;

impl MigrationProvider for MediumMigrationProvider {
    fn name(&self) -> &'static str {
        "medium"
    }

    fn read(&self, source: &Path) -> Result<Vec<Result<MigratedPost, ItemFailure>>, MigrateError> {
        let posts_dir = if source.join(POSTS_DIR).is_dir() {
            source.join(POSTS_DIR)
        } else {
            source.to_path_buf()
        };

        let mut files: Vec<_> = fs::read_dir(&posts_dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .is_some_and(|e| e.eq_ignore_ascii_case("html"))
            })
            .collect();
        files.sort();

        Ok(files
            .iter()
            .map(|path| {
                let item = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                read_post(path).map_err(|reason| ItemFailure::new(item, reason))
            })
            .collect())
    }
}

fn select_first<'a>(doc: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    doc.select(&selector).next()
}

fn text_of(element: ElementRef<'_>) -> Option<String> {
    let text = element.text().collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Split a Medium file stem into draft flag and slug source:
/// `draft_Unfinished-Thoughts-0a1b2c3d4e5f` → (true, "Unfinished-Thoughts").
fn parse_stem(stem: &str) -> (bool, DatedStem) {
    let (is_draft, rest) = match stem.strip_prefix(DRAFT_PREFIX) {
        Some(rest) => (true, rest),
        None => (false, stem),
    };
    let dated = parse_dated_name(rest);
    let name = strip_hash(&dated.name).to_string();
    (
        is_draft,
        DatedStem {
            date: dated.date.map(|d| d.format("%Y-%m-%d").to_string()),
            name,
        },
    )
}

struct DatedStem {
    date: Option<String>,
    name: String,
}

fn strip_hash(name: &str) -> &str {
    match name.rsplit_once('-') {
        Some((head, hash))
            if hash.len() >= MIN_HASH_LEN
                && hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) =>
        {
            head
        }
        _ => name,
    }
}

fn read_post(path: &Path) -> Result<MigratedPost, String> {
    let html = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let doc = Html::parse_document(&html);

    let body = select_first(&doc, r#"section[data-field="body"]"#)
        .ok_or("no post body found (missing section[data-field=body])")?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let (is_draft, dated) = parse_stem(stem);

    let heading = select_first(&doc, "h1.p-name").and_then(text_of);
    let title = heading
        .or_else(|| select_first(&doc, "title").and_then(text_of))
        .unwrap_or_else(|| dated.name.replace('-', " "));

    let mut post = Post::new();
    post.title = title.clone();
    post.matter.title = Some(title);
    post.published = !is_draft;

    let slug = slugify(&dated.name);
    if !slug.is_empty() {
        post.matter.slug = Some(slug);
    }
    post.matter.description = select_first(&doc, r#"section[data-field="subtitle"]"#).and_then(text_of);
    post.author = select_first(&doc, "a.p-author").and_then(text_of);
    post.matter.author = post.author.clone();

    let published = select_first(&doc, "time.dt-published")
        .and_then(|t| t.value().attr("datetime"))
        .and_then(metadata::parse_date);
    post.matter.date = published.map(|d| metadata::format_date(&d)).or(dated.date);

    if let Some(canonical) = select_first(&doc, "a.p-canonical").and_then(|a| a.value().attr("href")) {
        post.matter.extra.insert(
            "medium_url".into(),
            serde_yaml::Value::String(canonical.to_string()),
        );
    }

    post.content = html_to_markdown(&strip_title_blocks(body));
    Ok(MigratedPost::new(post))
}

/// Body HTML without the title and subtitle Medium repeats inside it.
fn strip_title_blocks(body: ElementRef<'_>) -> String {
    let mut html = body.inner_html();
    if let Ok(selector) = Selector::parse(".graf--title, .graf--subtitle") {
        for block in body.select(&selector) {
            html = html.replace(&block.html(), "");
        }
    }
    html
}
