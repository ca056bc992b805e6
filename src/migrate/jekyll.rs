//! Jekyll sites.
//!
//! ```text
//! site/
//! ├── _posts/2019-01-01-wowza-cool.md    published
//! ├── _drafts/whale-song.md              unpublished
//! └── assets/whale.jpg                   copied when a post references it
//! ```
//!
//! Posts keep their front matter. The filename supplies the date, the title,
//! and the slug when front matter leaves them out, which keeps migrated URLs
//! the same as Jekyll's. Tokenized permalinks (`/:year/:title/`) describe a
//! site-wide scheme rather than a post id, so they move to
//! `jekyll_permalink` in the extension map.

use super::{
    ItemFailure, MigratedPost, MigrateError, MigrationProvider, html_to_markdown, locate_under,
    relocate_images,
};
use crate::naming::{parse_dated_name, slugify};
use crate::post::Post;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

const POSTS_DIR: &str = "_posts";
const DRAFTS_DIR: &str = "_drafts";
const EXTENSIONS: &[&str] = &["md", "markdown", "html"];

#[derive(Debug, Default, Clone, Copy)]
pub struct JekyllMigrationProvider;

impl MigrationProvider for JekyllMigrationProvider {
    fn name(&self) -> &'static str {
        "jekyll"
    }

    fn read(&self, source: &Path) -> Result<Vec<Result<MigratedPost, ItemFailure>>, MigrateError> {
        let posts = source.join(POSTS_DIR);
        let drafts = source.join(DRAFTS_DIR);
        if !posts.is_dir() && !drafts.is_dir() {
            return Err(MigrateError::SourceNotFound(posts));
        }

        let mut items = Vec::new();
        for (dir, is_draft) in [(posts, false), (drafts, true)] {
            if !dir.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&dir).sort_by_file_name() {
                let entry = entry.map_err(std::io::Error::from)?;
                let path = entry.path();
                if !entry.file_type().is_file() || !has_extension(path) {
                    continue;
                }
                let item = path
                    .strip_prefix(source)
                    .unwrap_or(path)
                    .display()
                    .to_string();
                items.push(
                    read_post(source, path, is_draft).map_err(|reason| ItemFailure::new(item, reason)),
                );
            }
        }
        Ok(items)
    }
}

fn has_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

fn read_post(site: &Path, path: &Path, is_draft: bool) -> Result<MigratedPost, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let mut post = Post::from_source(&text).map_err(|e| format!("invalid front matter: {e}"))?;

    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let dated = parse_dated_name(stem);
    if post.title.trim().is_empty() {
        post.title = dated.display_title.clone();
    }
    if post.matter.date.is_none() {
        post.matter.date = dated.date.map(|d| d.format("%Y-%m-%d").to_string());
    }

    if let Some(permalink) = post.matter.permalink.take() {
        if permalink.contains(':') {
            post.matter
                .extra
                .insert("jekyll_permalink".into(), serde_yaml::Value::String(permalink));
        } else {
            post.matter.permalink = Some(permalink);
        }
    }
    if post.matter.slug.is_none() && post.matter.permalink.is_none() {
        let slug = slugify(&dated.name);
        if !slug.is_empty() {
            post.matter.slug = Some(slug);
        }
    }

    let mut categories = post.matter.extra_list("categories");
    categories.extend(post.matter.extra_list("category"));
    post.add_tags(&categories);

    if is_draft {
        post.published = false;
    }

    let is_html = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("html"));
    if is_html {
        post.content = html_to_markdown(&post.content);
    }

    let post_dir = path.parent().unwrap_or(site);
    let (content, assets) = relocate_images(&post.content, |reference| {
        if reference.starts_with('/') {
            locate_under(site, reference)
        } else {
            locate_under(post_dir, reference).or_else(|| locate_under(site, reference))
        }
    });
    post.content = content;

    Ok(MigratedPost { post, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_fixtures;
    use chrono::Datelike;
    use std::path::PathBuf;

    fn read_fixture() -> (tempfile::TempDir, Vec<Result<MigratedPost, ItemFailure>>) {
        let tmp = setup_fixtures("jekyll");
        let items = JekyllMigrationProvider.read(tmp.path()).unwrap();
        (tmp, items)
    }

    fn find<'a>(items: &'a [Result<MigratedPost, ItemFailure>], id: &str) -> &'a Post {
        items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .map(|m| &m.post)
            .find(|p| p.id() == id)
            .unwrap_or_else(|| panic!("post '{id}' not migrated"))
    }

    #[test]
    fn reads_posts_and_drafts_with_one_failure() {
        let (_tmp, items) = read_fixture();
        assert_eq!(items.len(), 5);
        let failures: Vec<&ItemFailure> = items.iter().filter_map(|i| i.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].item.ends_with("2019-02-02-broken.md"));
    }

    #[test]
    fn filename_supplies_date_title_and_slug() {
        let (_tmp, items) = read_fixture();
        let post = find(&items, "wowza-cool");
        assert_eq!(post.title, "Wowza Cool!");
        assert_eq!(post.date().year(), 2019);
        assert!(post.published);
    }

    #[test]
    fn categories_merge_into_tags() {
        let (_tmp, items) = read_fixture();
        let post = find(&items, "wowza-cool");
        assert_eq!(post.tags(), ["travel", "food", "notes"]);
    }

    #[test]
    fn tokenized_permalink_moves_to_extra() {
        let (_tmp, items) = read_fixture();
        let post = find(&items, "wowza-cool");
        assert_eq!(post.matter.permalink, None);
        assert_eq!(
            post.matter.extra.get("jekyll_permalink"),
            Some(&serde_yaml::Value::String("/:year/:title/".into()))
        );
    }

    #[test]
    fn drafts_are_unpublished() {
        let (_tmp, items) = read_fixture();
        let post = find(&items, "whale-song");
        assert!(!post.published);
        assert_eq!(post.title, "whale song");
    }

    #[test]
    fn html_posts_become_markdown() {
        let (_tmp, items) = read_fixture();
        let post = find(&items, "html-post");
        assert!(post.content.contains("**bold**"));
        assert!(!post.content.contains("<strong>"));
    }

    #[test]
    fn referenced_assets_are_relocated() {
        let (_tmp, items) = read_fixture();
        let migrated = items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .find(|m| m.post.id() == "wowza-cool")
            .unwrap();
        assert_eq!(migrated.assets.len(), 1);
        assert_eq!(migrated.assets[0].to, PathBuf::from("assets/harbour.jpg"));
        assert!(migrated.post.content.contains("/images/assets/harbour.jpg"));
    }

    #[test]
    fn missing_posts_dir_is_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            JekyllMigrationProvider.read(tmp.path()),
            Err(MigrateError::SourceNotFound(_))
        ));
    }
}
