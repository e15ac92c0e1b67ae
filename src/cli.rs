//! Command-line interface definitions for the ShareX article scraper.
//!
//! All options can be given as flags; the namespace can also come from the
//! environment.

use clap::Parser;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Print the scraped article as JSON
/// sharex_scraper https://example.com/post
///
/// # Save several articles under a user namespace
/// sharex_scraper -o ./articles -n alice https://a.example/x https://b.example/y
///
/// # Attach marketing branding to every saved article
/// sharex_scraper -o ./articles --marketing ./brand.json https://example.com/post
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Article URLs to scrape
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Save articles as JSON under this directory instead of printing them
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Namespace (per-user directory) the articles are saved under
    #[arg(short, long, env = "SHAREX_NAMESPACE", default_value = "public")]
    pub namespace: String,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// User-Agent header (overrides the config file)
    #[arg(long)]
    pub user_agent: Option<String>,

    /// JSON file with marketing data attached to every saved article
    #[arg(long)]
    pub marketing: Option<String>,

    /// Maximum number of scrapes in flight (overrides the config file)
    #[arg(long)]
    pub concurrency: Option<usize>,
}
