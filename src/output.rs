//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Posts and tags are
//! shown by positional index and title; ids, URLs and paths follow as
//! indented context lines, so the output reads as a content inventory while
//! still letting users trace an entry back to a file.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Posts
//! 001 Article Simple
//!     Id: article-simple
//!     Date: 2019-01-05
//!     Url: /2019/01/05/article-simple/
//!     Tags: writing, simple
//! 002 The Largest Whale (draft)
//!     ...
//!
//! Tags
//! 001 writing (2 posts)
//! 002 whales (1 post, unpublished)
//!
//! Found 5 posts (4 published), 8 tags (6 published)
//! ```
//!
//! ## Build
//!
//! ```text
//! html → 12 files
//!     index.html
//!     2019/01/05/article-simple/index.html
//! json → 2 files
//!     posts.json
//!     tags.json
//!
//! Cache: 9 hits, 7 misses (16 lookups)
//! Built 2 renderers, 14 files into dist
//! ```
//!
//! ## Migrate
//!
//! ```text
//! Posts
//! 001 wowza-cool.md
//! 002 html-post.md
//!
//! Assets
//! 001 assets/harbour.jpg
//!
//! Failures
//! 001 _posts/2019-02-02-broken.md
//!     Reason: invalid front matter: ...
//!
//! Migrated 2 posts, 1 asset from jekyll (1 failed)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::config::SiteConfig;
use crate::migrate::MigrationReport;
use crate::post::Post;
use crate::render::{RenderSummary, post_path};
use crate::tag::Tag;
use std::path::Path;

const DESCRIPTION_WIDTH: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Format a post header: index + title, flagged when unpublished.
///
/// ```text
/// 001 Article Simple
/// 002 The Largest Whale (draft)
/// ```
fn post_header(index: usize, post: &Post) -> String {
    let title = match post.title() {
        "" => post.id(),
        t => t.to_string(),
    };
    if post.published {
        format!("{} {}", format_index(index), title)
    } else {
        format!("{} {} (draft)", format_index(index), title)
    }
}

/// Display form of a path relative to `root`, falling back to the full path.
fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_inventory(config: &SiteConfig, posts: &[Post], tags: &[Tag]) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    for (i, post) in posts.iter().enumerate() {
        lines.push(post_header(i + 1, post));
        lines.push(format!("{}Id: {}", indent(1), post.id()));
        if post.matter.date.is_some() {
            lines.push(format!("{}Date: {}", indent(1), post.date().format("%Y-%m-%d")));
        }
        lines.push(format!("{}Url: {}", indent(1), post_path(config, post)));
        if !post.tags().is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), post.tags().join(", ")));
        }
        if let Some(description) = &post.matter.description {
            lines.push(format!(
                "{}Description: {}",
                indent(1),
                truncate_desc(description, DESCRIPTION_WIDTH)
            ));
        }
    }

    lines.push(String::new());
    lines.push("Tags".to_string());
    for (i, tag) in tags.iter().enumerate() {
        let count = plural(tag.posts.len(), "post");
        if tag.is_published() {
            lines.push(format!("{} {} ({count})", format_index(i + 1), tag.name()));
        } else {
            lines.push(format!(
                "{} {} ({count}, unpublished)",
                format_index(i + 1),
                tag.name()
            ));
        }
    }

    let published_posts = posts.iter().filter(|p| p.published).count();
    let published_tags = tags.iter().filter(|t| t.is_published()).count();
    lines.push(String::new());
    lines.push(format!(
        "Found {} ({published_posts} published), {} ({published_tags} published)",
        plural(posts.len(), "post"),
        plural(tags.len(), "tag"),
    ));
    lines
}

pub fn print_check_inventory(config: &SiteConfig, posts: &[Post], tags: &[Tag]) {
    for line in format_check_inventory(config, posts, tags) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_summary(
    summaries: &[RenderSummary],
    stats: &CacheStats,
    output: &Path,
) -> Vec<String> {
    let mut lines = Vec::new();
    for summary in summaries {
        lines.push(format!(
            "{} → {}",
            summary.provider,
            plural(summary.files.len(), "file")
        ));
        for file in &summary.files {
            lines.push(format!("{}{}", indent(1), file.display()));
        }
    }

    let total: usize = summaries.iter().map(|s| s.files.len()).sum();
    lines.push(String::new());
    lines.push(format!("Cache: {stats}"));
    lines.push(format!(
        "Built {}, {} into {}",
        plural(summaries.len(), "renderer"),
        plural(total, "file"),
        output.display()
    ));
    lines
}

pub fn print_build_summary(summaries: &[RenderSummary], stats: &CacheStats, output: &Path) {
    for line in format_build_summary(summaries, stats, output) {
        println!("{}", line);
    }
}

// ============================================================================
// Migrate
// ============================================================================

pub fn format_migration_report(provider: &str, report: &MigrationReport, dest: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.written.is_empty() {
        lines.push("Posts".to_string());
        for (i, path) in report.written.iter().enumerate() {
            lines.push(format!(
                "{} {}",
                format_index(i + 1),
                relative_display(path, dest)
            ));
        }
    }

    if !report.assets.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Assets".to_string());
        for (i, asset) in report.assets.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), asset.display()));
        }
    }

    if !report.failures.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Failures".to_string());
        for (i, failure) in report.failures.iter().enumerate() {
            lines.push(format!("{} {}", format_index(i + 1), failure.item));
            lines.push(format!("{}Reason: {}", indent(1), failure.reason));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    let mut total = format!(
        "Migrated {}, {} from {provider}",
        plural(report.written.len(), "post"),
        plural(report.assets.len(), "asset"),
    );
    if !report.is_clean() {
        total.push_str(&format!(" ({} failed)", report.failures.len()));
    }
    lines.push(total);
    lines
}

pub fn print_migration_report(provider: &str, report: &MigrationReport, dest: &Path) {
    for line in format_migration_report(provider, report, dest) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
