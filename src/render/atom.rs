//! Atom feed (`atom.xml`) of the newest `index_count` published posts.

use super::{RenderError, RenderProvider, RenderSummary, absolute_url, post_path, write_output};
use crate::config::SiteConfig;
use crate::data::DataService;
use crate::metadata;
use crate::post::Post;
use chrono::Utc;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Cursor;
use std::path::Path;

const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const FEED_FILE: &str = "atom.xml";

type XmlWriter = Writer<Cursor<Vec<u8>>>;

#[derive(Debug, Default, Clone, Copy)]
pub struct AtomRenderProvider;

impl RenderProvider for AtomRenderProvider {
    fn name(&self) -> &'static str {
        "atom"
    }

    fn render(
        &self,
        data: &mut DataService,
        config: &SiteConfig,
        output: &Path,
    ) -> Result<RenderSummary, RenderError> {
        let mut summary = RenderSummary::new(self.name());
        let posts = data.get_posts_by_count(config.index_count)?;
        write_output(output, FEED_FILE, feed_xml(config, &posts)?, &mut summary)?;
        Ok(summary)
    }
}

fn xml_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Xml(e.to_string())
}

fn write_event<'a>(writer: &mut XmlWriter, event: Event<'a>) -> Result<(), RenderError> {
    writer.write_event(event).map_err(xml_err)
}

/// Write a text element: `<tag>text</tag>`.
fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<(), RenderError> {
    write_event(writer, Event::Start(BytesStart::new(tag)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(tag)))
}

/// Write an empty element with attributes: `<tag attr1="val1" ... />`.
fn write_empty_elem(
    writer: &mut XmlWriter,
    tag: &str,
    attrs: &[(&str, &str)],
) -> Result<(), RenderError> {
    let mut elem = BytesStart::new(tag);
    for (k, v) in attrs {
        elem.push_attribute((*k, *v));
    }
    write_event(writer, Event::Empty(elem))
}

/// Serialize the feed. `posts` are expected newest first.
fn feed_xml(config: &SiteConfig, posts: &[Post]) -> Result<Vec<u8>, RenderError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let home = absolute_url(config, "/");
    let updated = posts
        .iter()
        .map(Post::date)
        .max()
        .unwrap_or_else(Utc::now);

    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    let mut feed = BytesStart::new("feed");
    feed.push_attribute(("xmlns", ATOM_NS));
    write_event(&mut writer, Event::Start(feed))?;

    write_text_element(&mut writer, "title", &config.title)?;
    if !config.description.is_empty() {
        write_text_element(&mut writer, "subtitle", &config.description)?;
    }
    write_empty_elem(&mut writer, "link", &[("href", home.as_str())])?;
    let self_url = absolute_url(config, FEED_FILE);
    write_empty_elem(
        &mut writer,
        "link",
        &[("rel", "self"), ("href", self_url.as_str())],
    )?;
    write_text_element(&mut writer, "id", &home)?;
    write_text_element(&mut writer, "updated", &metadata::format_date(&updated))?;
    if !config.author_name.is_empty() {
        write_author(&mut writer, &config.author_name, &config.author_email)?;
    }

    for post in posts {
        write_entry(&mut writer, config, post)?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("feed")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_author(writer: &mut XmlWriter, name: &str, email: &str) -> Result<(), RenderError> {
    write_event(writer, Event::Start(BytesStart::new("author")))?;
    write_text_element(writer, "name", name)?;
    if !email.is_empty() {
        write_text_element(writer, "email", email)?;
    }
    write_event(writer, Event::End(BytesEnd::new("author")))
}

fn write_entry(writer: &mut XmlWriter, config: &SiteConfig, post: &Post) -> Result<(), RenderError> {
    let url = absolute_url(config, &post_path(config, post));
    let date = metadata::format_date(&post.date());

    write_event(writer, Event::Start(BytesStart::new("entry")))?;
    write_text_element(writer, "title", post.title())?;
    write_empty_elem(writer, "link", &[("href", url.as_str())])?;
    write_text_element(writer, "id", &url)?;
    write_text_element(writer, "published", &date)?;
    write_text_element(writer, "updated", &date)?;
    if let Some(author) = &post.author {
        write_author(writer, author, "")?;
    }
    for tag in post.tags() {
        write_empty_elem(writer, "category", &[("term", tag.as_str())])?;
    }
    write_text_element(writer, "summary", &post.description())?;

    let mut content = BytesStart::new("content");
    content.push_attribute(("type", "html"));
    write_event(writer, Event::Start(content))?;
    write_event(writer, Event::Text(BytesText::new(&post.body())))?;
    write_event(writer, Event::End(BytesEnd::new("content")))?;

    write_event(writer, Event::End(BytesEnd::new("entry")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::test_helpers::{dated_post, setup_fixtures};
    use quick_xml::Reader;
    use std::fs;

    fn feed_string(config: &SiteConfig, posts: &[Post]) -> String {
        String::from_utf8(feed_xml(config, posts).unwrap()).unwrap()
    }

    /// Text of every `<tag>` element in document order.
    fn texts(xml: &str, tag: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut out = Vec::new();
        let mut inside = false;
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == tag.as_bytes() => inside = true,
                Event::Text(t) if inside => out.push(t.decode().unwrap().into_owned()),
                Event::End(e) if e.name().as_ref() == tag.as_bytes() => inside = false,
                Event::Eof => break,
                _ => {}
            }
        }
        out
    }

    #[test]
    fn empty_feed_is_well_formed() {
        let xml = feed_string(&SiteConfig::default(), &[]);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(xml.contains(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#));
        assert_eq!(texts(&xml, "title"), ["Quill"]);
    }

    #[test]
    fn feed_updated_is_newest_post() {
        let posts = [
            dated_post("Newer", "2019-03-01"),
            dated_post("Older", "2019-01-01"),
        ];
        let xml = feed_string(&SiteConfig::default(), &posts);
        assert_eq!(texts(&xml, "updated")[0], "2019-03-01T00:00:00Z");
    }

    #[test]
    fn entry_text_is_escaped() {
        let mut post = dated_post("Fish & Chips", "2019-01-01");
        post.content = "Salt *and* vinegar.".into();
        let xml = feed_string(&SiteConfig::default(), &[post]);
        assert!(xml.contains("Fish &amp; Chips"));
        assert!(xml.contains("&lt;em&gt;and&lt;/em&gt;"));
    }

    #[test]
    fn entries_link_to_post_pages() {
        let config = SiteConfig {
            url: "https://blog.example.com".into(),
            url_pattern: "date".into(),
            ..SiteConfig::default()
        };
        let xml = feed_string(&config, &[dated_post("Wowza Cool", "2019-01-01")]);
        assert!(xml.contains(r#"<link href="https://blog.example.com/2019/01/01/wowza-cool/"/>"#));
        assert!(xml.contains(r#"<link rel="self" href="https://blog.example.com/atom.xml"/>"#));
    }

    #[test]
    fn renders_fixture_feed() {
        let tmp = setup_fixtures("blog");
        let config = load_config(tmp.path()).unwrap().rooted_at(tmp.path());
        let mut data = DataService::from_config(&config, tmp.path()).unwrap();
        let out = tmp.path().join("dist");
        let summary = AtomRenderProvider.render(&mut data, &config, &out).unwrap();
        assert_eq!(summary.files, [Path::new(FEED_FILE).to_path_buf()]);

        let xml = fs::read_to_string(out.join(FEED_FILE)).unwrap();
        let titles = texts(&xml, "title");
        assert_eq!(
            titles,
            ["Fixture Blog", "Deep Dive", "ocean notes", "Article Simple"]
        );
        assert!(xml.contains("<name>Jane Doe</name>"));
    }
}
