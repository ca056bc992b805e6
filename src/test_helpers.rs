//! Shared test utilities for the quill test suite.
//!
//! Provides fixture setup, small post/tag builders, and lookup helpers that
//! panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures("blog");
//! let mut service = DataService::new(FileDataProvider::new(tmp.path().join("posts")), Cache::memory());
//!
//! let posts = service.get_posts().unwrap();
//! let post = find_post(&posts, "article-simple");
//! assert_eq!(post.title, "Article Simple");
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::post::Post;
use crate::tag::Tag;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/<name>/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures(name: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(name);
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Builders
// =========================================================================

pub fn post_with_title(title: &str) -> Post {
    let mut post = Post::new();
    post.title = title.to_string();
    post
}

pub fn post_with_tags(title: &str, tags: &[&str]) -> Post {
    let mut post = post_with_title(title);
    post.add_tags(tags);
    post
}

pub fn dated_post(title: &str, date: &str) -> Post {
    let mut post = post_with_title(title);
    post.matter.date = Some(date.to_string());
    post
}

/// A tag holding one post per title.
pub fn tag_with_posts(name: &str, titles: &[&str]) -> Tag {
    let mut tag = Tag::new(name).unwrap();
    tag.posts
        .extend(titles.iter().map(|title| post_with_title(title)));
    tag
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find a post by id. Panics if not found.
pub fn find_post<'a>(posts: &'a [Post], id: &str) -> &'a Post {
    posts.iter().find(|p| p.id() == id).unwrap_or_else(|| {
        let ids: Vec<String> = posts.iter().map(|p| p.id()).collect();
        panic!("post '{id}' not found. Available: {ids:?}")
    })
}

/// Find a tag by name. Panics if not found.
pub fn find_tag<'a>(tags: &'a [Tag], name: &str) -> &'a Tag {
    tags.iter().find(|t| t.name() == name).unwrap_or_else(|| {
        let names: Vec<&str> = tags.iter().map(|t| t.name()).collect();
        panic!("tag '{name}' not found. Available: {names:?}")
    })
}

/// All post ids in order.
pub fn post_ids(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|p| p.id()).collect()
}
