//! End-to-end migrations: each platform fixture through `Migrate`, then
//! read back with the file data provider.

use quill::data::{DataProvider, FileDataProvider};
use quill::migrate::{Migrate, MigrateError, MigrationReport};
use quill::post::Post;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures").join(name)
}

fn migrate(kind: &str) -> (TempDir, MigrationReport, Vec<Post>) {
    let dest = TempDir::new().unwrap();
    let report = Migrate::new(kind)
        .unwrap()
        .migrate(&fixture(kind), dest.path())
        .unwrap();
    let posts = FileDataProvider::new(dest.path()).posts().unwrap();
    (dest, report, posts)
}

fn file_names(report: &MigrationReport) -> Vec<String> {
    let mut names: Vec<String> = report
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn find<'a>(posts: &'a [Post], id: &str) -> &'a Post {
    posts
        .iter()
        .find(|p| p.id() == id)
        .unwrap_or_else(|| panic!("post '{id}' not found"))
}

// ===========================================================================
// Platforms
// ===========================================================================

#[test]
fn jekyll_site() {
    let (dest, report, posts) = migrate("jekyll");
    assert_eq!(
        file_names(&report),
        ["html-post.md", "plain.md", "whale-song.md", "wowza-cool.md"]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.assets, [PathBuf::from("assets/harbour.jpg")]);
    assert!(dest.path().join("images/assets/harbour.jpg").is_file());

    assert_eq!(posts.len(), 4);
    let wowza = find(&posts, "wowza-cool");
    assert_eq!(wowza.title(), "Wowza Cool!");
    assert_eq!(wowza.tags(), ["travel", "food", "notes"]);
    assert!(wowza.content.contains("/images/assets/harbour.jpg"));
    assert!(!find(&posts, "whale-song").published);
}

#[test]
fn wordpress_export() {
    let (dest, report, posts) = migrate("wordpress");
    assert_eq!(
        file_names(&report),
        [
            "fish-and-chips.md",
            "the-largest-whale.md",
            "unfinished-thoughts.md"
        ]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "Broken Date");
    assert!(dest.path().join("images/2019/01/whale.jpg").is_file());

    let whale = find(&posts, "the-largest-whale");
    assert_eq!(whale.author.as_deref(), Some("jane"));
    assert_eq!(whale.tags(), ["Whales", "Ocean", "News"]);
    assert!(!find(&posts, "unfinished-thoughts").published);
}

#[test]
fn ghost_export() {
    let (dest, report, posts) = migrate("ghost");
    assert_eq!(
        file_names(&report),
        ["draft-post.md", "mobiledoc-post.md", "the-largest-whale.md"]
    );
    assert_eq!(report.failures.len(), 1);
    assert!(dest.path().join("images/2019/01/whale.jpg").is_file());

    let whale = find(&posts, "the-largest-whale");
    assert_eq!(whale.tags(), ["Whales", "Ocean"]);
    assert_eq!(whale.author.as_deref(), Some("Jane Doe"));
    assert_eq!(
        whale.matter.cover.as_deref(),
        Some("/images/2019/01/whale.jpg")
    );
    assert!(!find(&posts, "draft-post").published);
    assert_eq!(find(&posts, "mobiledoc-post").author.as_deref(), Some("Sam"));
}

#[test]
fn medium_archive() {
    let (_dest, report, posts) = migrate("medium");
    assert_eq!(
        file_names(&report),
        ["the-largest-whale.md", "unfinished-thoughts.md"]
    );
    assert_eq!(report.failures.len(), 1);
    assert!(report.assets.is_empty());

    let whale = find(&posts, "the-largest-whale");
    assert_eq!(whale.title(), "The Largest Whale");
    assert!(whale.published);
    assert!(!find(&posts, "unfinished-thoughts").published);
}

// ===========================================================================
// Dispatch and validation
// ===========================================================================

#[test]
fn unknown_platform_is_rejected() {
    assert!(matches!(
        Migrate::new("blogger"),
        Err(MigrateError::UnknownProvider(name)) if name == "blogger"
    ));
}

#[test]
fn missing_source_is_rejected() {
    let dest = TempDir::new().unwrap();
    let result = Migrate::new("jekyll")
        .unwrap()
        .migrate(&dest.path().join("nowhere"), dest.path());
    assert!(matches!(result, Err(MigrateError::SourceNotFound(_))));
}

#[test]
fn migrating_twice_overwrites_in_place() {
    let dest = TempDir::new().unwrap();
    let migrate = Migrate::new("medium").unwrap();
    let first = migrate.migrate(&fixture("medium"), dest.path()).unwrap();
    let second = migrate.migrate(&fixture("medium"), dest.path()).unwrap();
    assert_eq!(first.written, second.written);
    let count = fs::read_dir(dest.path()).unwrap().count();
    assert_eq!(count, 2);
}
