//! # Quill
//!
//! A content pipeline for static blogs. Posts are markdown files with YAML
//! front matter; quill loads them into a canonical post and tag model,
//! resolves each post's output URL from a configurable pattern, caches what
//! it derives, and hands the result to render providers. Exports from other
//! blogging platforms are migrated into the same markdown format.
//!
//! # Architecture
//!
//! ```text
//!                 migrate (jekyll | wordpress | ghost | medium)
//!                       │ writes markdown + images/
//!                       ▼
//! posts/*.md ──► DataProvider ──► DataService ──► RenderProvider ──► dist/
//!                                    │   ▲         (html | json | atom)
//!                                    ▼   │
//!                                    Cache
//!                               (memory | file)
//! ```
//!
//! Every seam is a trait with a name-keyed registry: [`data::DataProvider`],
//! [`cache::CacheStore`], [`migrate::MigrationProvider`] and
//! [`render::RenderProvider`]. The site config picks implementations by
//! name, and an unknown name is an error before any work starts.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | `slugify` and the `YYYY-MM-DD-name` filename convention |
//! | [`matter`] | YAML front matter: well-known fields plus an extension map |
//! | [`metadata`] | First-non-empty resolution and date parsing across source formats |
//! | [`markdown`] | Markdown rendering, tag stripping, image reference discovery |
//! | [`post`] | `Post` model: id and URL resolution, body/summary/description, tags |
//! | [`tag`] | `Tag` model and tag aggregation over posts |
//! | [`cache`] | Namespaced `Cache` over memory and file stores |
//! | [`data`] | `DataProvider` registry and the cache-aside `DataService` |
//! | [`migrate`] | `Migrate` dispatch over the platform providers, best-effort writer |
//! | [`render`] | `RenderProvider` registry: html, json, atom |
//! | [`config`] | `config.toml` loading, stock defaults, merging, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Ids Are Derived, Never Stored
//!
//! A post's id comes from its permalink, slug or url (first one set), and
//! only then from its title. Nothing writes an id back into the post, so a
//! renamed title changes the URL of a post without a slug, and setting a
//! slug pins it. Migrations write the source platform's slug into front
//! matter for exactly that reason.
//!
//! ## Best-Effort Migration
//!
//! Exports from other platforms are not validated upstream. Providers read
//! every item into a `Result`; a malformed item becomes an
//! [`migrate::ItemFailure`] in the report and the rest of the export is
//! still written. Only an export that cannot be read at all is an error.
//!
//! ## Cache-Aside Without Locks
//!
//! Everything cached is derived from the provider and recomputing it gives
//! the same value, so the cache needs no invalidation beyond `clear`. The
//! file store keeps values between runs; `quill build` with the memory
//! store still benefits because every renderer reads through one service.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/), a compile-time
//! HTML macro system. Malformed markup is a build error, interpolation is
//! escaped by default, and there is no template directory to ship.

pub mod cache;
pub mod config;
pub mod data;
pub mod markdown;
pub mod matter;
pub mod metadata;
pub mod migrate;
pub mod naming;
pub mod output;
pub mod post;
pub mod render;
pub mod tag;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Initialize tracing on stderr with the specified verbosity level.
///
/// `verbose`: 0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE. `RUST_LOG`
/// directives are applied on top.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
