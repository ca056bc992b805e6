use clap::{ArgAction, Parser, Subcommand};
use quill::data::DataService;
use quill::migrate::Migrate;
use quill::{config, output, render};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "quill")]
#[command(about = "Content pipeline for static blogs")]
#[command(long_about = "\
Content pipeline for static blogs

Posts are markdown files with YAML front matter. Quill loads them into
posts and tags, resolves each post's URL from the configured pattern, and
renders the published ones as HTML pages, a JSON index and an Atom feed.
Exports from Jekyll, WordPress, Ghost and Medium can be migrated into the
same markdown format.

Site structure:

  my-blog/
  ├── config.toml                      # Site config (optional)
  ├── posts/                           # data.post_path
  │   ├── 2019-01-01-wowza-cool.md     # Date and title fall back to the filename
  │   └── notes/deep-dive.md           # Subdirectories are scanned too
  └── content/                         # data.content_path, copied verbatim
      └── robots.txt

Front matter (all optional):
  title, date, slug, permalink, description, author, tags, published

Run 'quill gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site root (the directory holding config.toml)
    #[arg(long, default_value = ".", global = true)]
    path: PathBuf,

    /// Output directory (overrides `output` in config.toml)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Render providers to run, comma separated (overrides `render` in config.toml)
    #[arg(long, value_delimiter = ',')]
    render: Option<Vec<String>>,
}

#[derive(Subcommand)]
enum Command {
    /// Load posts and run the render providers
    Build(BuildArgs),
    /// Load posts and tags and print an inventory without writing anything
    Check,
    /// Convert an export from another platform into markdown posts
    Migrate {
        /// Source platform: jekyll, wordpress, ghost or medium
        kind: String,
        /// Export file or directory
        source: PathBuf,
        /// Directory to write posts (and images/) into
        destination: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    quill::init_tracing(cli.verbose);

    match cli.command {
        Command::Build(args) => {
            let config = config::load_config(&cli.path)?.rooted_at(&cli.path);
            init_thread_pool(&config.processing);
            let out_dir = cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(&config.output));
            let renderers = args.render.unwrap_or_else(|| config.render.clone());

            println!("==> Building {}", cli.path.display());
            let mut data = DataService::from_config(&config, &cli.path)?;
            let summaries = render::render_all(&renderers, &mut data, &config, &out_dir)?;
            output::print_build_summary(&summaries, &data.cache_stats(), &out_dir);
            println!("==> Build complete: {}", out_dir.display());
        }
        Command::Check => {
            let config = config::load_config(&cli.path)?.rooted_at(&cli.path);
            println!("==> Checking {}", cli.path.display());
            let mut data = DataService::from_config(&config, &cli.path)?;
            let posts = data.get_posts()?;
            let tags = data.get_tags()?;
            output::print_check_inventory(&config, &posts, &tags);
            println!("==> Content is valid");
        }
        Command::Migrate {
            kind,
            source,
            destination,
        } => {
            let migrate = Migrate::new(&kind)?;
            init_thread_pool(&config::load_config(&cli.path)?.processing);
            println!(
                "==> Migrating {} export {} → {}",
                migrate.provider().name(),
                source.display(),
                destination.display()
            );
            let report = migrate.migrate(&source, &destination)?;
            output::print_migration_report(migrate.provider().name(), &report, &destination);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_list_splits_on_commas() {
        let cli = Cli::parse_from(["quill", "build", "--render", "json,atom"]);
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.render, Some(vec!["json".to_string(), "atom".to_string()]));
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::parse_from(["quill", "check", "--path", "blog", "-vv"]);
        assert_eq!(cli.path, Path::new("blog"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn migrate_takes_three_positionals() {
        let cli = Cli::parse_from(["quill", "migrate", "jekyll", "old-site", "posts"]);
        let Command::Migrate {
            kind,
            source,
            destination,
        } = cli.command
        else {
            panic!("expected migrate");
        };
        assert_eq!(kind, "jekyll");
        assert_eq!(source, PathBuf::from("old-site"));
        assert_eq!(destination, PathBuf::from("posts"));
    }
}
