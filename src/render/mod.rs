//! Render providers: turn the data service's posts and tags into output files.
//!
//! Each provider reads through [`DataService`], so a build that runs several
//! renderers loads the posts once and serves the rest from the cache.
//!
//! | Name | Output |
//! |------|--------|
//! | `html` | `index.html`, one page per published post and per published tag, static content |
//! | `json` | `posts.json`, `tags.json` |
//! | `atom` | `atom.xml` |
//!
//! Renderers are selected by name from `render` in the site config (or
//! `--render` on the command line). An unknown name is an error before
//! anything is written.

pub mod atom;
pub mod html;
pub mod json;

use crate::config::SiteConfig;
use crate::data::{DataError, DataService};
use crate::post::Post;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub use atom::AtomRenderProvider;
pub use html::HtmlRenderProvider;
pub use json::JsonRenderProvider;

/// Names accepted by `render`, in default build order.
pub const PROVIDERS: &[&str] = &["html", "json", "atom"];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("Unknown render provider: {0}")]
    UnknownProvider(String),
}

/// Files one provider wrote, relative to the output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSummary {
    pub provider: &'static str,
    pub files: Vec<PathBuf>,
}

impl RenderSummary {
    fn new(provider: &'static str) -> Self {
        Self {
            provider,
            files: Vec::new(),
        }
    }
}

pub trait RenderProvider {
    /// Registry name (`render` entry).
    fn name(&self) -> &'static str;

    fn render(
        &self,
        data: &mut DataService,
        config: &SiteConfig,
        output: &Path,
    ) -> Result<RenderSummary, RenderError>;
}

/// Resolve a provider by its registry name.
pub fn provider_for(name: &str) -> Result<Box<dyn RenderProvider>, RenderError> {
    match name.trim() {
        "html" => Ok(Box::new(HtmlRenderProvider)),
        "json" => Ok(Box::new(JsonRenderProvider)),
        "atom" => Ok(Box::new(AtomRenderProvider)),
        other => Err(RenderError::UnknownProvider(other.to_string())),
    }
}

/// Run the named providers in order, writing under `output`.
///
/// Every name is resolved before the first provider runs.
pub fn render_all<S: AsRef<str>>(
    names: &[S],
    data: &mut DataService,
    config: &SiteConfig,
    output: &Path,
) -> Result<Vec<RenderSummary>, RenderError> {
    let providers = names
        .iter()
        .map(|n| provider_for(n.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    fs::create_dir_all(output)?;
    let mut summaries = Vec::with_capacity(providers.len());
    for provider in providers {
        let summary = provider.render(data, config, output)?;
        info!(
            provider = summary.provider,
            files = summary.files.len(),
            "rendered"
        );
        summaries.push(summary);
    }
    Ok(summaries)
}

/// Write `contents` to `output/relative`, creating parent directories.
fn write_output(
    output: &Path,
    relative: impl Into<PathBuf>,
    contents: impl AsRef<[u8]>,
    summary: &mut RenderSummary,
) -> Result<(), RenderError> {
    let relative = relative.into();
    let path = output.join(&relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, contents)?;
    summary.files.push(relative);
    Ok(())
}

/// Site-relative path of a post page: `/2019/01/05/article-simple/`.
pub fn post_path(config: &SiteConfig, post: &Post) -> String {
    format!("/{}/", post.url_for(&config.url_pattern))
}

/// Absolute URL for a site-relative path.
pub fn absolute_url(config: &SiteConfig, path: &str) -> String {
    format!(
        "{}/{}",
        config.url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::data::FileDataProvider;
    use crate::test_helpers::{dated_post, setup_fixtures};

    fn fixture_service() -> (tempfile::TempDir, DataService) {
        let tmp = setup_fixtures("blog");
        let service = DataService::new(
            FileDataProvider::new(tmp.path().join("posts")),
            Cache::memory(),
        );
        (tmp, service)
    }

    // =========================================================================
    // Registry
    // =========================================================================

    #[test]
    fn every_listed_provider_resolves() {
        for name in PROVIDERS {
            assert_eq!(provider_for(name).unwrap().name(), *name);
        }
    }

    #[test]
    fn unknown_provider_is_error() {
        assert!(matches!(
            provider_for("pdf"),
            Err(RenderError::UnknownProvider(name)) if name == "pdf"
        ));
    }

    #[test]
    fn render_all_rejects_unknown_before_writing() {
        let (tmp, mut service) = fixture_service();
        let out = tmp.path().join("dist");
        let result = render_all(&["json", "pdf"], &mut service, &SiteConfig::default(), &out);
        assert!(result.is_err());
        assert!(!out.join("posts.json").exists());
    }

    #[test]
    fn render_all_runs_in_order() {
        let (tmp, mut service) = fixture_service();
        let out = tmp.path().join("dist");
        let summaries =
            render_all(&["atom", "json"], &mut service, &SiteConfig::default(), &out).unwrap();
        let names: Vec<_> = summaries.iter().map(|s| s.provider).collect();
        assert_eq!(names, ["atom", "json"]);
        assert!(out.join("atom.xml").exists());
        assert!(out.join("posts.json").exists());
    }

    #[test]
    fn renderers_share_the_cache() {
        let (tmp, mut service) = fixture_service();
        let out = tmp.path().join("dist");
        render_all(PROVIDERS, &mut service, &SiteConfig::default(), &out).unwrap();
        assert!(service.cache_stats().hits > 0);
    }

    // =========================================================================
    // URLs
    // =========================================================================

    #[test]
    fn post_path_follows_pattern() {
        let config = SiteConfig {
            url_pattern: "date".into(),
            ..SiteConfig::default()
        };
        let post = dated_post("Wowza Cool", "2019-01-01");
        assert_eq!(post_path(&config, &post), "/2019/01/01/wowza-cool/");
    }

    #[test]
    fn absolute_url_joins_single_slash() {
        let config = SiteConfig {
            url: "https://blog.example.com/".into(),
            ..SiteConfig::default()
        };
        assert_eq!(
            absolute_url(&config, "/tags/rust/"),
            "https://blog.example.com/tags/rust/"
        );
    }
}
