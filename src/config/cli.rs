use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the resource-facets binary.
#[derive(Debug, Parser)]
#[command(
    name = "resource-facets",
    version,
    about = "Faceted resource listings over a corpus file"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "RESOURCE_FACETS_CONFIG_FILE",
        value_name = "PATH"
    )]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the filters and results for one filter state as JSON.
    Render(Box<RenderArgs>),
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: RenderOverrides,

    /// Corpus file to list (`.toml` or `.json`).
    #[arg(long, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub corpus: PathBuf,

    /// Content types the listing may show, comma separated.
    #[arg(long, value_name = "TYPES", value_delimiter = ',', required = true)]
    pub types: Vec<String>,

    /// Selected category slug.
    #[arg(long, value_name = "SLUG")]
    pub category: Option<String>,

    /// Selected author id.
    #[arg(long, value_name = "ID")]
    pub author: Option<u64>,

    /// Selected content type.
    #[arg(long = "type", value_name = "TYPE")]
    pub content_type: Option<String>,

    /// Keyword search over titles and excerpts.
    #[arg(long, value_name = "TEXT")]
    pub keyword: Option<String>,

    /// Page to render (1-based).
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub page: u32,
}

#[derive(Debug, Args, Default, Clone)]
pub struct RenderOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the number of results per page.
    #[arg(long = "listing-page-size", value_name = "N")]
    pub page_size: Option<u64>,

    /// Override the path links are built against.
    #[arg(long = "listing-base-path", value_name = "PATH")]
    pub base_path: Option<String>,

    /// Toggle the listing caches.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,

    /// Override the cache entry lifetime.
    #[arg(long = "cache-ttl-seconds", value_name = "SECONDS")]
    pub cache_ttl_seconds: Option<u64>,
}
