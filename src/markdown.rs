//! Markdown rendering and HTML text helpers.
//!
//! Rendering is plain CommonMark plus tables, strikethrough, and footnotes via
//! `pulldown-cmark`. Tag stripping and image discovery in HTML use `scraper`.

use pulldown_cmark::{Event, Options, Parser, Tag, html as md_html};
use scraper::{Html, Selector};
use std::ops::Range;

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES
}

/// Render markdown to an HTML fragment.
pub fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, options());
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    md_html::push_html(&mut html, parser);
    html
}

/// Strip all markup from an HTML fragment, keeping text content.
///
/// Whitespace-only text between block elements (the newline the renderer
/// emits after `</p>`) is dropped, so paragraphs concatenate directly:
/// `<p><em>HOW</em></p>\n<p><em>COW</em></p>` → `HOWCOW`.
pub fn strip_tags(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .filter(|t| !(t.contains('\n') && t.trim().is_empty()))
        .collect()
}

/// Where an image URL sits in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpan {
    /// Byte range of the URL itself, not the surrounding `![..](..)` or tag.
    pub range: Range<usize>,
    pub url: String,
}

/// Every image URL in a markdown document, as written, in document order.
///
/// Covers inline markdown image syntax and `src` attributes of `<img>` tags
/// embedded as raw HTML. Reference-style images and URLs whose source text
/// differs from their parsed value (escapes, entities) are not reported,
/// because there is no span to rewrite.
pub fn image_spans(markdown: &str) -> Vec<ImageSpan> {
    let mut spans = Vec::new();
    for (event, range) in Parser::new_ext(markdown, options()).into_offset_iter() {
        let source = &markdown[range.clone()];
        match event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                let url = dest_url.trim();
                if let Some(at) = link_destination(source, url) {
                    let start = range.start + at;
                    spans.push(ImageSpan {
                        range: start..start + url.len(),
                        url: url.to_string(),
                    });
                }
            }
            Event::Html(raw) | Event::InlineHtml(raw) => {
                let mut urls = html_image_sources(&raw);
                urls.dedup();
                for url in urls {
                    for at in src_attribute_offsets(source, &url) {
                        let start = range.start + at;
                        spans.push(ImageSpan {
                            range: start..start + url.len(),
                            url: url.clone(),
                        });
                    }
                }
            }
            _ => {}
        }
    }
    spans.sort_by_key(|span| span.range.start);
    spans.dedup_by_key(|span| span.range.start);
    spans
}

/// Offset of `url` as the destination of `![alt](url ...)` within `source`.
fn link_destination(source: &str, url: &str) -> Option<usize> {
    if url.is_empty() {
        return None;
    }
    source.match_indices("](").find_map(|(i, _)| {
        let after = i + 2;
        let rest = &source[after..];
        let trimmed = rest.trim_start();
        let skipped = rest.len() - trimmed.len();
        let (trimmed, skipped) = match trimmed.strip_prefix('<') {
            Some(inner) => (inner, skipped + 1),
            None => (trimmed, skipped),
        };
        trimmed.starts_with(url).then_some(after + skipped)
    })
}

/// Offsets of `url` wherever it is the quoted value of a `src` attribute.
fn src_attribute_offsets(source: &str, url: &str) -> Vec<usize> {
    let mut offsets = Vec::new();
    for quote in ['"', '\''] {
        let quoted = format!("{quote}{url}{quote}");
        for (i, _) in source.match_indices(&quoted) {
            let is_src = source[..i]
                .trim_end()
                .strip_suffix('=')
                .map(str::trim_end)
                .is_some_and(|name| name.to_ascii_lowercase().ends_with("src"));
            if is_src {
                offsets.push(i + 1);
            }
        }
    }
    offsets
}

/// All `<img src>` values in an HTML fragment, in document order.
pub fn html_image_sources(html: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse("img[src]") else {
        return Vec::new();
    };
    Html::parse_fragment(html)
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .map(String::from)
        .collect()
}

/// Whether a URL refers to a file relative to the site rather than a remote resource.
pub fn is_local(url: &str) -> bool {
    let url = url.trim();
    !(url.is_empty()
        || url.contains("://")
        || url.starts_with("//")
        || url.starts_with('#')
        || url.starts_with("data:")
        || url.starts_with("mailto:"))
}

/// The path part of a URL, without query string or fragment.
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}
