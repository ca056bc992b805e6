//! Tags: named collections of posts.

use crate::naming::slugify;
use crate::post::Post;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum TagError {
    #[error("Tag name must not be empty")]
    EmptyName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    name: String,
    pub posts: Vec<Post>,
}

impl Tag {
    pub fn new(name: &str) -> Result<Self, TagError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TagError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
            posts: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// URL-safe form of the name, used for tag page paths.
    pub fn id(&self) -> String {
        slugify(&self.name)
    }

    /// True iff at least one attached post is published.
    pub fn is_published(&self) -> bool {
        self.posts.iter().any(|p| p.published)
    }

    /// Attached posts that are published, in attachment order.
    pub fn published_posts(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().filter(|p| p.published)
    }
}

/// Group posts by tag.
///
/// Tags appear in first-seen order across `posts`; each tag lists its posts
/// in the order they appear in `posts`.
pub fn aggregate_tags(posts: &[Post]) -> Vec<Tag> {
    let mut tags: Vec<Tag> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for post in posts {
        for name in post.tags() {
            let slot = match index.get(name) {
                Some(&i) => i,
                None => {
                    // Post::add_tag already rejects blank names
                    let Ok(tag) = Tag::new(name) else { continue };
                    index.insert(name.clone(), tags.len());
                    tags.push(tag);
                    tags.len() - 1
                }
            };
            tags[slot].posts.push(post.clone());
        }
    }
    tags
}
