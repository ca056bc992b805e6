//! Static HTML site.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                        # newest `index_count` posts
//! ├── 2019/01/05/article-simple/
//! │   └── index.html                    # one page per published post, at url_for(url_pattern)
//! ├── tags/
//! │   └── rust/index.html               # one page per published tag
//! └── robots.txt                        # data.content_path, copied verbatim
//! ```
//!
//! Pages are built with [maud](https://maud.lambda.xyz/), so every
//! interpolated value is escaped. Post bodies are the one exception: they are
//! already HTML (rendered markdown, or a `matter.body` override) and are
//! inserted as-is.

use super::{RenderError, RenderProvider, RenderSummary, post_path, write_output};
use crate::config::SiteConfig;
use crate::data::DataService;
use crate::naming::slugify;
use crate::post::Post;
use crate::tag::Tag;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

const CSS: &str = include_str!("../../static/style.css");
const DATE_FORMAT: &str = "%B %-d, %Y";

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderProvider;

impl RenderProvider for HtmlRenderProvider {
    fn name(&self) -> &'static str {
        "html"
    }

    fn render(
        &self,
        data: &mut DataService,
        config: &SiteConfig,
        output: &Path,
    ) -> Result<RenderSummary, RenderError> {
        let mut summary = RenderSummary::new(self.name());

        let latest = data.get_posts_by_count(config.index_count)?;
        write_output(
            output,
            "index.html",
            render_index(config, &latest).into_string(),
            &mut summary,
        )?;

        for post in data.get_published_posts()? {
            let page = Path::new(&post.url_for(&config.url_pattern)).join("index.html");
            write_output(output, page, render_post(config, &post).into_string(), &mut summary)?;
        }

        for tag in data.get_published_tags()? {
            let id = tag.id();
            if id.is_empty() {
                debug!(tag = tag.name(), "skipping tag without a url-safe name");
                continue;
            }
            let page = Path::new("tags").join(id).join("index.html");
            write_output(output, page, render_tag(config, &tag).into_string(), &mut summary)?;
        }

        copy_content(Path::new(&config.data.content_path), output, &mut summary)?;
        Ok(summary)
    }
}

/// Copy static content into the output tree, preserving relative paths.
fn copy_content(
    content: &Path,
    output: &Path,
    summary: &mut RenderSummary,
) -> Result<(), RenderError> {
    if !content.is_dir() {
        debug!(path = %content.display(), "no static content directory");
        return Ok(());
    }
    for entry in WalkDir::new(content).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(content) else {
            continue;
        };
        let dest = output.join(relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(entry.path(), &dest)?;
        summary.files.push(relative.to_path_buf());
    }
    Ok(())
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(config: &SiteConfig, title: &str, content: Markup) -> Markup {
    let page_title = if title == config.title {
        title.to_string()
    } else {
        format!("{title} | {}", config.title)
    };
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if !config.description.is_empty() {
                    meta name="description" content=(config.description);
                }
                title { (page_title) }
                link rel="alternate" type="application/atom+xml" href="/atom.xml";
                style { (PreEscaped(CSS)) }
            }
            body {
                (site_header(config))
                (content)
                (site_footer(config))
            }
        }
    }
}

fn site_header(config: &SiteConfig) -> Markup {
    html! {
        header.site-header {
            a.site-title href="/" { (config.title) }
            nav.site-nav {
                a href="/atom.xml" { "Feed" }
            }
        }
    }
}

fn site_footer(config: &SiteConfig) -> Markup {
    html! {
        footer.site-footer {
            @if config.author_name.is_empty() {
                (config.title)
            } @else {
                "© " (config.author_name)
            }
        }
    }
}

/// Date line shared by list entries and post pages.
fn post_meta(post: &Post) -> Markup {
    let date = post.date();
    html! {
        p.post-meta {
            time datetime=(date.format("%Y-%m-%d").to_string()) { (date.format(DATE_FORMAT).to_string()) }
            @if let Some(author) = &post.author {
                " · " (author)
            }
        }
    }
}

fn tag_links(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.tag-list {
                @for name in tags {
                    @let id = slugify(name);
                    @if !id.is_empty() {
                        li { a href={ "/tags/" (id) "/" } { (name) } }
                    }
                }
            }
        }
    }
}

fn post_list<'a>(config: &SiteConfig, posts: impl IntoIterator<Item = &'a Post>) -> Markup {
    html! {
        ul.post-list {
            @for post in posts {
                li {
                    h2 { a href=(post_path(config, post)) { (post.title()) } }
                    (post_meta(post))
                    p { (post.description()) }
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the index page with the newest posts
fn render_index(config: &SiteConfig, posts: &[Post]) -> Markup {
    let content = html! {
        main.index-page {
            @if posts.is_empty() {
                p { "Nothing published yet." }
            } @else {
                (post_list(config, posts))
            }
        }
    };
    base_document(config, &config.title, content)
}

/// Renders a single post
fn render_post(config: &SiteConfig, post: &Post) -> Markup {
    let content = html! {
        main.post-page {
            article {
                h1 { (post.title()) }
                (post_meta(post))
                (PreEscaped(post.body()))
                (tag_links(post.tags()))
            }
        }
    };
    base_document(config, post.title(), content)
}

/// Renders the listing for one tag
fn render_tag(config: &SiteConfig, tag: &Tag) -> Markup {
    let content = html! {
        main.tag-page {
            h1 { "Tagged “" (tag.name()) "”" }
            (post_list(config, tag.published_posts()))
        }
    };
    base_document(config, tag.name(), content)
}
