//! The canonical post model.
//!
//! A [`Post`] is built empty and filled in by whoever reads the source: the
//! filesystem data provider, or a migration provider normalizing an export.
//! Everything else (the id, the date, the rendered body) is derived on read.
//!
//! ## Identifier precedence
//!
//! ```text
//! matter.permalink  >  matter.slug  >  url (verbatim)  >  slugify(title)
//! ```
//!
//! Precedence is fixed; the order in which fields were assigned never matters.
//! Leading and trailing slashes are trimmed from the explicit forms.
//!
//! ## URL patterns
//!
//! [`Post::parse_url`] accepts either a named style or a token path:
//!
//! | Pattern | Output for "wowza cool!" on 2019-01-01 |
//! |---------|----------------------------------------|
//! | `default` (or unrecognized) | `wowza-cool` |
//! | `date` | `2019/01/01/wowza-cool` |
//! | `ordinal` | `2019/1/wowza-cool` |
//! | `/:title/:year/:month` | `wowza-cool/2019/01` |

use crate::markdown;
use crate::matter::{self, Matter};
use crate::metadata;
use crate::naming::slugify;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Id used when a post has neither an explicit identifier nor a sluggable title.
const UNTITLED_ID: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub matter: Matter,
    pub title: String,
    /// Raw markdown body.
    pub content: String,
    pub author: Option<String>,
    /// Explicit URL override; used verbatim as the id when no slug/permalink is set.
    pub url: Option<String>,
    pub keywords: Vec<String>,
    tags: Vec<String>,
    pub published: bool,
}

impl Default for Post {
    fn default() -> Self {
        Self {
            matter: Matter::default(),
            title: String::new(),
            content: String::new(),
            author: None,
            url: None,
            keywords: Vec::new(),
            tags: Vec::new(),
            published: true,
        }
    }
}

impl Post {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a post from a content file with `---` front matter.
    pub fn from_source(source: &str) -> Result<Self, serde_yaml::Error> {
        let (matter, content) = matter::parse(source)?;
        let mut post = Post {
            title: matter.title.clone().unwrap_or_default(),
            author: matter.author.clone(),
            published: matter.published.unwrap_or(true),
            keywords: matter.extra_list("keywords"),
            content,
            ..Default::default()
        };
        post.add_tags(&matter.tags);
        post.matter = matter;
        Ok(post)
    }

    /// Serialize back to a canonical content file.
    ///
    /// Model fields are written into the front matter so the file reads back
    /// into an equivalent post.
    pub fn to_source(&self) -> Result<String, serde_yaml::Error> {
        let mut matter = self.matter.clone();
        if !self.title.trim().is_empty() {
            matter.title = Some(self.title.clone());
        }
        if self.author.is_some() {
            matter.author = self.author.clone();
        }
        matter.tags = self.tags.clone();
        matter.published = Some(self.published);
        if !self.keywords.is_empty() {
            let list = self
                .keywords
                .iter()
                .cloned()
                .map(serde_yaml::Value::String)
                .collect();
            matter
                .extra
                .insert("keywords".into(), serde_yaml::Value::Sequence(list));
        }
        matter::render(&matter, &self.content)
    }

    /// Display title: the assigned title, else `matter.title`.
    pub fn title(&self) -> &str {
        if self.title.trim().is_empty() {
            self.matter.title.as_deref().unwrap_or_default()
        } else {
            &self.title
        }
    }

    /// Stable identifier. Never empty.
    pub fn id(&self) -> String {
        let explicit = [
            self.matter.permalink.as_deref(),
            self.matter.slug.as_deref(),
            self.url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(|s| s.trim().trim_matches('/'))
        .find(|s| !s.is_empty());

        match explicit {
            Some(id) => id.to_string(),
            None => {
                let slug = slugify(self.title());
                if slug.is_empty() {
                    UNTITLED_ID.to_string()
                } else {
                    slug
                }
            }
        }
    }

    /// Publication date from `matter.date`; the current time when absent or unparseable.
    pub fn date(&self) -> DateTime<Utc> {
        self.matter
            .date
            .as_deref()
            .and_then(metadata::parse_date)
            .unwrap_or_else(Utc::now)
    }

    /// Resolve a URL pattern (named style or token path) for this post.
    pub fn parse_url(&self, pattern: &str) -> String {
        let pattern = pattern.trim();
        if pattern.contains(':') {
            return self.expand_tokens(pattern);
        }
        let date = self.date();
        match pattern {
            "date" => format!(
                "{}/{:02}/{:02}/{}",
                date.year(),
                date.month(),
                date.day(),
                self.id()
            ),
            "ordinal" => format!("{}/{}/{}", date.year(), date.month(), self.id()),
            _ => self.id(),
        }
    }

    fn expand_tokens(&self, pattern: &str) -> String {
        let date = self.date();
        pattern
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment {
                ":title" => match slugify(self.matter.title.as_deref().unwrap_or(self.title())) {
                    slug if slug.is_empty() => self.id(),
                    slug => slug,
                },
                ":year" => format!("{}", date.year()),
                ":month" => format!("{:02}", date.month()),
                ":day" => format!("{:02}", date.day()),
                ":slug" | ":id" => self.id(),
                literal => literal.to_string(),
            })
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Output location: the explicit `url` when set, else `parse_url(pattern)`.
    pub fn url_for(&self, pattern: &str) -> String {
        match self.url.as_deref().map(|u| u.trim().trim_matches('/')) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => self.parse_url(pattern),
        }
    }

    /// Rendered HTML body; `matter.body` short-circuits rendering.
    pub fn body(&self) -> String {
        match &self.matter.body {
            Some(body) => body.clone(),
            None => markdown::render(&self.content),
        }
    }

    /// `matter.description` if set, otherwise the rendered content.
    pub fn summary(&self) -> String {
        match &self.matter.description {
            Some(description) => description.clone(),
            None => markdown::render(&self.content),
        }
    }

    /// `matter.description` if set, otherwise the summary with markup stripped.
    pub fn description(&self) -> String {
        match &self.matter.description {
            Some(description) => description.clone(),
            None => markdown::strip_tags(&self.summary()),
        }
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Append a tag unless it is blank or already present (case-sensitive).
    pub fn add_tag(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() || self.tags.iter().any(|t| t == name) {
            return;
        }
        self.tags.push(name.to_string());
    }

    pub fn add_tags<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.add_tag(name.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::post_with_title;

    // =========================================================================
    // Identifier precedence
    // =========================================================================

    #[test]
    fn id_from_title() {
        let post = post_with_title("Wowz! This is amazing: Next Chapter");
        assert_eq!(post.id(), "wowz-this-is-amazing-next-chapter");
    }

    #[test]
    fn id_from_title_with_double_punctuation() {
        let post = post_with_title("Wowz! This is amazing:: Next Chapter's 23");
        assert_eq!(post.id(), "wowz-this-is-amazing-next-chapter-s-23");
    }

    #[test]
    fn id_url_wins_over_title_regardless_of_order() {
        let mut before = Post::new();
        before.url = Some("the-largest-whale".into());
        before.title = "Wowz! This is amazing:: Next Chapter's 23".into();

        let mut after = Post::new();
        after.title = "Wowz! This is amazing:: Next Chapter's 23".into();
        after.url = Some("the-largest-whale".into());

        assert_eq!(before.id(), "the-largest-whale");
        assert_eq!(after.id(), "the-largest-whale");
    }

    #[test]
    fn id_url_is_not_slugified() {
        let mut post = Post::new();
        post.url = Some("Big Whale".into());
        assert_eq!(post.id(), "Big Whale");
    }

    #[test]
    fn id_slug_wins_over_url_and_title() {
        let mut post = post_with_title("Wowz! This is amazing:: Next Chapter's 23");
        post.url = Some("the-largest-whale".into());
        post.matter.slug = Some("slug".into());
        assert_eq!(post.id(), "slug");
    }

    #[test]
    fn id_permalink_wins_over_slug() {
        let mut post = Post::new();
        post.matter.permalink = Some("permalink".into());
        post.matter.slug = Some("slug".into());
        post.title = "Wowz! This is amazing:: Next Chapter's 23".into();
        assert_eq!(post.id(), "permalink");
    }

    #[test]
    fn id_trims_slashes_from_explicit_forms() {
        let mut post = Post::new();
        post.matter.permalink = Some("/about/".into());
        assert_eq!(post.id(), "about");
    }

    #[test]
    fn id_blank_explicit_falls_through() {
        let mut post = post_with_title("Real Title");
        post.matter.slug = Some("  ".into());
        assert_eq!(post.id(), "real-title");
    }

    #[test]
    fn id_never_empty() {
        assert_eq!(Post::new().id(), UNTITLED_ID);
        assert_eq!(post_with_title("!!!").id(), UNTITLED_ID);
    }

    #[test]
    fn id_falls_back_to_matter_title() {
        let mut post = Post::new();
        post.matter.title = Some("From Matter".into());
        assert_eq!(post.id(), "from-matter");
    }

    // =========================================================================
    // Fields and date
    // =========================================================================

    #[test]
    fn published_defaults_true() {
        let mut post = Post::new();
        assert!(post.published);
        post.published = false;
        assert!(!post.published);
    }

    #[test]
    fn date_from_matter() {
        let mut post = Post::new();
        post.matter.date = Some("2019-01-01".into());
        assert_eq!(post.date().year(), 2019);
    }

    #[test]
    fn date_defaults_to_now() {
        let mut post = Post::new();
        post.matter.date = Some("not a date".into());
        let before = Utc::now();
        let date = post.date();
        assert!(date >= before);
        assert!(date <= Utc::now());
    }

    #[test]
    fn matter_extension_fields() {
        let mut post = Post::new();
        post.matter.cover = Some("foo".into());
        post.matter
            .extra
            .insert("tree".into(), serde_yaml::Value::Bool(true));
        assert_eq!(post.matter.cover.as_deref(), Some("foo"));
        assert_eq!(
            post.matter.extra.get("tree"),
            Some(&serde_yaml::Value::Bool(true))
        );
    }

    // =========================================================================
    // Body / summary / description
    // =========================================================================

    #[test]
    fn body_prefers_matter_body() {
        let mut post = Post::new();
        post.matter.body = Some("foo".into());
        post.content = "*HOW*".into();
        assert_eq!(post.body(), "foo");
    }

    #[test]
    fn body_renders_markdown() {
        let mut post = Post::new();
        post.content = "*HOW*".into();
        assert!(post.body().contains("<p><em>HOW</em></p>"));
    }

    #[test]
    fn description_from_matter() {
        let mut post = Post::new();
        post.matter.description = Some("how now brown cow is cool".into());
        assert_eq!(post.description(), "how now brown cow is cool");
    }

    #[test]
    fn summary_and_description_from_content() {
        let mut post = Post::new();
        post.content = "*HOW*\n\n*COW*".into();
        let summary = post.summary();
        assert!(summary.contains("<p><em>HOW</em></p>"));
        assert!(summary.contains("<p><em>COW</em></p>"));
        assert_eq!(post.description(), "HOWCOW");
    }

    #[test]
    fn summary_prefers_description() {
        let mut post = Post::new();
        post.content = "*HOW*\n\n*COW*".into();
        post.matter.description = Some("foo".into());
        assert_eq!(post.summary(), "foo");
    }

    // =========================================================================
    // Tags
    // =========================================================================

    #[test]
    fn add_tag_ignores_duplicate() {
        let mut post = Post::new();
        post.add_tag("foo");
        post.add_tag("foo");
        assert_eq!(post.tags(), ["foo"]);
    }

    #[test]
    fn add_tag_ignores_blank() {
        let mut post = Post::new();
        post.add_tag("");
        post.add_tag("   ");
        assert!(post.tags().is_empty());
    }

    #[test]
    fn add_tag_is_case_sensitive() {
        let mut post = Post::new();
        post.add_tag("foo");
        post.add_tag("Foo");
        assert_eq!(post.tags(), ["foo", "Foo"]);
    }

    #[test]
    fn add_tags_drops_duplicates_and_empties_in_order() {
        let mut post = Post::new();
        post.add_tag("foo");
        post.add_tags(&["foo", "bar", ""]);
        assert_eq!(post.tags(), ["foo", "bar"]);
    }

    #[test]
    fn add_tags_appends_new() {
        let mut post = Post::new();
        post.add_tag("foo");
        post.add_tags(&["foo", "bar", "crazy"]);
        assert_eq!(post.tags().len(), 3);
    }

    // =========================================================================
    // URL patterns
    // =========================================================================

    fn dated_post() -> Post {
        let mut post = Post::new();
        post.matter.title = Some("wowza cool!".into());
        post.matter.date = Some("2019-01-01".into());
        post
    }

    #[test]
    fn parse_url_title_token() {
        assert_eq!(dated_post().parse_url("/:title"), "wowza-cool");
    }

    #[test]
    fn parse_url_title_year() {
        assert_eq!(dated_post().parse_url("/:title/:year"), "wowza-cool/2019");
    }

    #[test]
    fn parse_url_title_year_month() {
        assert_eq!(
            dated_post().parse_url("/:title/:year/:month"),
            "wowza-cool/2019/01"
        );
    }

    #[test]
    fn parse_url_literal_segments_and_day() {
        assert_eq!(
            dated_post().parse_url("blog/:year/:month/:day/:slug/"),
            "blog/2019/01/01/wowza-cool"
        );
    }

    #[test]
    fn parse_url_named_styles() {
        let post = dated_post();
        assert_eq!(post.parse_url("default"), "wowza-cool");
        assert_eq!(post.parse_url("date"), "2019/01/01/wowza-cool");
        assert_eq!(post.parse_url("ordinal"), "2019/1/wowza-cool");
    }

    #[test]
    fn parse_url_unknown_style_is_default() {
        assert_eq!(dated_post().parse_url("fancy"), "wowza-cool");
    }

    #[test]
    fn parse_url_untitled_title_token_uses_id() {
        let mut post = Post::new();
        post.matter.slug = Some("hello".into());
        post.matter.date = Some("2019-01-01".into());
        assert_eq!(post.parse_url("/:title/:year"), "hello/2019");

        post.matter.title = Some("?!".into());
        assert_eq!(post.parse_url(":year/:title"), "2019/hello");
    }

    #[test]
    fn url_for_prefers_explicit_url() {
        let mut post = dated_post();
        assert_eq!(post.url_for("date"), "2019/01/01/wowza-cool");
        post.url = Some("/custom/place/".into());
        assert_eq!(post.url_for("date"), "custom/place");
    }

    // =========================================================================
    // Source round trip
    // =========================================================================

    #[test]
    fn from_source_reads_model_fields() {
        let source = "---\ntitle: Article Simple\nauthor: Jane\ntags: [a, b, a]\npublished: false\nkeywords: [k1]\n---\n\nHello *there*\n";
        let post = Post::from_source(source).unwrap();
        assert_eq!(post.title, "Article Simple");
        assert_eq!(post.author.as_deref(), Some("Jane"));
        assert_eq!(post.tags(), ["a", "b"]);
        assert!(!post.published);
        assert_eq!(post.keywords, vec!["k1"]);
        assert_eq!(post.content, "Hello *there*\n");
        assert_eq!(post.id(), "article-simple");
    }

    #[test]
    fn to_source_reads_back_equivalent() {
        let mut post = post_with_title("Round Trip");
        post.matter.date = Some("2019-01-01".into());
        post.author = Some("Jane".into());
        post.published = false;
        post.add_tags(&["x", "y"]);
        post.content = "Body".into();

        let reread = Post::from_source(&post.to_source().unwrap()).unwrap();
        assert_eq!(reread.title, "Round Trip");
        assert_eq!(reread.author.as_deref(), Some("Jane"));
        assert_eq!(reread.tags(), ["x", "y"]);
        assert!(!reread.published);
        assert_eq!(reread.id(), post.id());
        assert_eq!(reread.date(), post.date());
    }
}
