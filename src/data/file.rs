//! Filesystem data provider.
//!
//! Every `.md` / `.markdown` file under the post directory (recursively) is
//! one post. Files are visited in file-name order so the post list is stable
//! across runs and platforms.
//!
//! Front matter wins; the file name fills in what it leaves out:
//!
//! ```text
//! posts/2019-03-10-ocean-notes.md   (no title, no date in front matter)
//!   → title "ocean notes", date 2019-03-10
//! ```

use super::{DataError, DataProvider};
use crate::metadata;
use crate::naming::parse_dated_name;
use crate::post::Post;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

const EXTENSIONS: &[&str] = &["md", "markdown"];

#[derive(Debug, Clone)]
pub struct FileDataProvider {
    post_path: PathBuf,
}

impl FileDataProvider {
    pub fn new(post_path: impl Into<PathBuf>) -> Self {
        Self {
            post_path: post_path.into(),
        }
    }

    pub fn post_path(&self) -> &Path {
        &self.post_path
    }

    fn read_post(path: &Path) -> Result<Post, DataError> {
        let source = fs::read_to_string(path)?;
        let mut post = Post::from_source(&source).map_err(|e| DataError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let dated = parse_dated_name(stem);
        if let Some(title) = metadata::resolve(&[
            Some(post.title.as_str()),
            Some(dated.display_title.as_str()),
        ]) {
            post.title = title;
        }
        if post.matter.date.is_none() {
            post.matter.date = dated.date.map(|d| d.format("%Y-%m-%d").to_string());
        }
        Ok(post)
    }
}

fn is_post_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

impl DataProvider for FileDataProvider {
    fn name(&self) -> &'static str {
        "file"
    }

    fn posts(&self) -> Result<Vec<Post>, DataError> {
        let mut posts = Vec::new();
        for entry in WalkDir::new(&self.post_path).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() || !is_post_file(path) {
                continue;
            }
            trace!(path = %path.display(), "reading post");
            posts.push(Self::read_post(path)?);
        }
        Ok(posts)
    }
}
