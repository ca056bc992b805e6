//! WordPress WXR exports.
//!
//! The export is one RSS document; each `<item>` is a post, page, attachment
//! or menu entry. Only `wp:post_type = post` items are migrated:
//!
//! | WXR element | Post field |
//! |-------------|------------|
//! | `title` | `title` |
//! | `wp:post_name` | `matter.slug` |
//! | `wp:post_date` (else `pubDate`) | `matter.date` |
//! | `wp:status = publish` | `published` |
//! | `dc:creator` | `author` |
//! | `category[domain=post_tag\|category]` | tags |
//! | `content:encoded` | content, HTML converted to markdown |
//! | `excerpt:encoded` | `matter.description` |
//!
//! Media under `wp-content/uploads/` is copied from an `uploads/` directory
//! next to the export file, when one was downloaded alongside it.

use super::{
    ItemFailure, MigratedPost, MigrateError, MigrationProvider, find_export_file,
    html_to_markdown, locate_under, relocate_images,
};
use crate::metadata;
use crate::post::Post;
use quick_xml::Reader;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const UPLOADS_MARKER: &str = "/wp-content/uploads/";
const UPLOADS_DIR: &str = "uploads";
const TAG_DOMAINS: &[&str] = &["post_tag", "category"];
const DEFAULT_CATEGORY: &str = "Uncategorized";

#[derive(Debug, Default, Clone, Copy)]
pub struct WordpressMigrationProvider;

impl MigrationProvider for WordpressMigrationProvider {
    fn name(&self) -> &'static str {
        "wordpress"
    }

    fn read(&self, source: &Path) -> Result<Vec<Result<MigratedPost, ItemFailure>>, MigrateError> {
        let export = if source.is_dir() {
            find_export_file(source, &["xml"])?
                .ok_or_else(|| MigrateError::SourceNotFound(source.join("*.xml")))?
        } else {
            source.to_path_buf()
        };
        let uploads = export
            .parent()
            .map(|dir| dir.join(UPLOADS_DIR))
            .unwrap_or_else(|| PathBuf::from(UPLOADS_DIR));

        let xml = fs::read_to_string(&export)?;
        let items = parse_items(&xml)?;
        Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| convert(item, index, &uploads))
            .collect())
    }
}

/// Direct children of one `<item>`, by qualified element name.
#[derive(Debug, Default)]
struct RawItem {
    fields: BTreeMap<String, String>,
    /// `(domain, label)` for each `<category>`, in document order.
    categories: Vec<(String, String)>,
}

impl RawItem {
    fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn push(&mut self, name: String, domain: Option<String>, value: &str) {
        let value = value.trim();
        if name == "category" {
            if let Some(domain) = domain {
                self.categories.push((domain, value.to_string()));
            }
        } else {
            self.fields.entry(name).or_insert_with(|| value.to_string());
        }
    }
}

fn xml_err(e: impl std::fmt::Display) -> MigrateError {
    MigrateError::Xml(e.to_string())
}

fn attribute(elem: &BytesStart<'_>, key: &str) -> Option<String> {
    elem.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key.as_bytes())
        .map(|a| String::from_utf8_lossy(&a.value).into_owned())
}

fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<(), MigrateError> {
    if let Some(c) = reference.resolve_char_ref().map_err(xml_err)? {
        text.push(c);
        return Ok(());
    }
    let name = reference.decode().map_err(xml_err)?;
    match resolve_xml_entity(&name) {
        Some(resolved) => text.push_str(resolved),
        None => {
            text.push('&');
            text.push_str(&name);
            text.push(';');
        }
    }
    Ok(())
}

/// Collect the direct children of every `<item>` in the document.
fn parse_items(xml: &str) -> Result<Vec<RawItem>, MigrateError> {
    let mut reader = Reader::from_str(xml);
    let mut items = Vec::new();
    let mut current: Option<RawItem> = None;
    let mut depth = 0usize;
    let mut field: Option<(String, Option<String>)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(xml_err)? {
            Event::Start(elem) => {
                let name = String::from_utf8_lossy(elem.name().as_ref()).into_owned();
                if current.is_some() {
                    depth += 1;
                    if depth == 1 {
                        field = Some((name, attribute(&elem, "domain")));
                        text.clear();
                    }
                } else if name == "item" {
                    current = Some(RawItem::default());
                    depth = 0;
                }
            }
            Event::Text(t) if field.is_some() => text.push_str(&t.decode().map_err(xml_err)?),
            Event::CData(c) if field.is_some() => text.push_str(&c.decode().map_err(xml_err)?),
            Event::GeneralRef(r) if field.is_some() => push_reference(&mut text, &r)?,
            Event::End(_) => {
                if let Some(item) = current.as_mut() {
                    if depth == 0 {
                        items.extend(current.take());
                    } else {
                        if depth == 1
                            && let Some((name, domain)) = field.take()
                        {
                            item.push(name, domain, &text);
                        }
                        depth -= 1;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(items)
}

/// Normalize one item. `None` for items that are not blog posts.
fn convert(
    item: RawItem,
    index: usize,
    uploads: &Path,
) -> Option<Result<MigratedPost, ItemFailure>> {
    let post_type = item.get("wp:post_type").unwrap_or("post");
    if post_type != "post" {
        debug!(post_type, title = item.get("title"), "skipping non-post item");
        return None;
    }
    let label = item
        .get("title")
        .or(item.get("wp:post_name"))
        .map(String::from)
        .unwrap_or_else(|| format!("item {}", index + 1));
    Some(build_post(&item, uploads).map_err(|reason| ItemFailure::new(label, reason)))
}

fn build_post(item: &RawItem, uploads: &Path) -> Result<MigratedPost, String> {
    let title = item.get("title");
    let slug = item.get("wp:post_name");
    if title.is_none() && slug.is_none() {
        return Err("item has neither a title nor a slug".into());
    }

    let mut post = Post::new();
    post.title = title.unwrap_or_default().to_string();
    post.matter.title = title.map(String::from);
    post.matter.slug = slug.map(String::from);
    post.author = item.get("dc:creator").map(String::from);
    post.matter.author = post.author.clone();
    post.matter.description = item.get("excerpt:encoded").map(String::from);
    post.published = item.get("wp:status") == Some("publish");

    if let Some(raw) = item.get("wp:post_date").or(item.get("pubDate")) {
        let date = metadata::parse_date(raw).ok_or_else(|| format!("invalid date '{raw}'"))?;
        post.matter.date = Some(metadata::format_date(&date));
    }
    if let Some(id) = item.get("wp:post_id") {
        post.matter
            .extra
            .insert("wordpress_id".into(), serde_yaml::Value::String(id.into()));
    }

    let tags: Vec<&str> = item
        .categories
        .iter()
        .filter(|(domain, label)| TAG_DOMAINS.contains(&domain.as_str()) && label != DEFAULT_CATEGORY)
        .map(|(_, label)| label.as_str())
        .collect();
    post.add_tags(&tags);

    let markdown = html_to_markdown(item.get("content:encoded").unwrap_or_default());
    let (content, assets) = relocate_images(&markdown, |reference| {
        let (_, rest) = reference.split_once(UPLOADS_MARKER)?;
        locate_under(uploads, rest)
    });
    post.content = content;

    Ok(MigratedPost { post, assets })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::setup_fixtures;
    use chrono::Datelike;

    fn read_fixture() -> (tempfile::TempDir, Vec<Result<MigratedPost, ItemFailure>>) {
        let tmp = setup_fixtures("wordpress");
        let items = WordpressMigrationProvider.read(tmp.path()).unwrap();
        (tmp, items)
    }

    fn find<'a>(items: &'a [Result<MigratedPost, ItemFailure>], id: &str) -> &'a MigratedPost {
        items
            .iter()
            .filter_map(|i| i.as_ref().ok())
            .find(|m| m.post.id() == id)
            .unwrap_or_else(|| panic!("post '{id}' not migrated"))
    }

    #[test]
    fn only_posts_are_migrated() {
        let (_tmp, items) = read_fixture();
        assert_eq!(items.len(), 4);
        let failures: Vec<&ItemFailure> = items.iter().filter_map(|i| i.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].item, "Broken Date");
        assert!(failures[0].reason.contains("invalid date"));
    }

    #[test]
    fn maps_core_fields() {
        let (_tmp, items) = read_fixture();
        let post = &find(&items, "the-largest-whale").post;
        assert_eq!(post.title, "The Largest Whale");
        assert_eq!(post.author.as_deref(), Some("jane"));
        assert_eq!(post.date().year(), 2019);
        assert!(post.published);
        assert_eq!(post.description(), "Big, blue, and loud.");
        assert_eq!(post.tags(), ["Whales", "Ocean", "News"]);
    }

    #[test]
    fn draft_status_is_unpublished() {
        let (_tmp, items) = read_fixture();
        assert!(!find(&items, "unfinished-thoughts").post.published);
    }

    #[test]
    fn entities_are_resolved() {
        let (_tmp, items) = read_fixture();
        let post = &find(&items, "fish-and-chips").post;
        assert_eq!(post.title, "Fish & Chips");
        assert!(post.tags().is_empty());
    }

    #[test]
    fn content_converted_and_uploads_relocated() {
        let (_tmp, items) = read_fixture();
        let migrated = find(&items, "the-largest-whale");
        assert!(migrated.post.content.contains("/images/2019/01/whale.jpg"));
        assert!(!migrated.post.content.contains("<p>"));
        assert_eq!(migrated.assets.len(), 1);
        assert_eq!(migrated.assets[0].to, PathBuf::from("2019/01/whale.jpg"));
    }

    #[test]
    fn parse_items_reads_direct_children_only() {
        let xml = r#"<rss><channel><title>Site</title>
            <item><title>A</title><wp:postmeta><wp:meta_key>k</wp:meta_key></wp:postmeta></item>
            </channel></rss>"#;
        let items = parse_items(xml).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("title"), Some("A"));
        assert_eq!(items[0].get("wp:meta_key"), None);
    }

    #[test]
    fn malformed_document_is_error() {
        assert!(matches!(
            parse_items("<rss><channel><item><title>x</item>"),
            Err(MigrateError::Xml(_))
        ));
    }
}
