//! JSON index of the published site: `posts.json` and `tags.json`.
//!
//! Meant for client-side search and external tooling, so entries carry
//! absolute URLs and derived fields rather than raw front matter.

use super::{RenderError, RenderProvider, RenderSummary, absolute_url, post_path, write_output};
use crate::config::SiteConfig;
use crate::data::DataService;
use crate::metadata;
use crate::post::Post;
use crate::tag::Tag;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonRenderProvider;

#[derive(Debug, Serialize)]
struct PostEntry {
    id: String,
    title: String,
    url: String,
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    description: String,
    tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    keywords: Vec<String>,
}

impl PostEntry {
    fn new(config: &SiteConfig, post: &Post) -> Self {
        Self {
            id: post.id(),
            title: post.title().to_string(),
            url: absolute_url(config, &post_path(config, post)),
            date: metadata::format_date(&post.date()),
            author: post.author.clone(),
            description: post.description(),
            tags: post.tags().to_vec(),
            keywords: post.keywords.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct TagEntry {
    name: String,
    id: String,
    url: String,
    /// Ids of the tag's published posts.
    posts: Vec<String>,
}

impl TagEntry {
    fn new(config: &SiteConfig, tag: &Tag) -> Self {
        Self {
            name: tag.name().to_string(),
            id: tag.id(),
            url: absolute_url(config, &format!("/tags/{}/", tag.id())),
            posts: tag.published_posts().map(Post::id).collect(),
        }
    }
}

impl RenderProvider for JsonRenderProvider {
    fn name(&self) -> &'static str {
        "json"
    }

    fn render(
        &self,
        data: &mut DataService,
        config: &SiteConfig,
        output: &Path,
    ) -> Result<RenderSummary, RenderError> {
        let mut summary = RenderSummary::new(self.name());

        let posts: Vec<PostEntry> = data
            .get_published_posts()?
            .iter()
            .map(|p| PostEntry::new(config, p))
            .collect();
        write_output(
            output,
            "posts.json",
            serde_json::to_string_pretty(&posts)?,
            &mut summary,
        )?;

        let tags: Vec<TagEntry> = data
            .get_published_tags()?
            .iter()
            .map(|t| TagEntry::new(config, t))
            .collect();
        write_output(
            output,
            "tags.json",
            serde_json::to_string_pretty(&tags)?,
            &mut summary,
        )?;

        Ok(summary)
    }
}
