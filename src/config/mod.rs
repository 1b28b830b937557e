//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{collections::BTreeMap, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::types::TypeLabel;

mod cli;

pub use cli::{CliArgs, Command, RenderArgs, RenderOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "resource-facets";
const ENV_PREFIX: &str = "RESOURCE_FACETS";
const DEFAULT_BASE_PATH: &str = "/resources";
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_PAGINATION_END_SIZE: u32 = 2;
const DEFAULT_PAGINATION_MID_SIZE: u32 = 2;
const DEFAULT_OVERSIZED_THRESHOLD: u64 = 1000;
const DEFAULT_CARD_TITLE_MAX_LEN: usize = 44;
const DEFAULT_UNCATEGORIZED_SLUG: &str = "uncategorized";
const DEFAULT_NONE_AUTHOR_NAME: &str = "none";
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_CACHE_AVAILABILITY_LIMIT: usize = 512;
const DEFAULT_CACHE_TREE_LIMIT: usize = 64;
const DEFAULT_CACHE_AUTHOR_LIMIT: usize = 64;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub listing: ListingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub base_path: String,
    pub page_size: NonZeroU32,
    pub pagination_end_size: u32,
    pub pagination_mid_size: u32,
    pub oversized_threshold: u64,
    pub card_title_max_len: usize,
    pub uncategorized_slug: String,
    pub none_author_name: String,
    pub type_labels: BTreeMap<String, TypeLabel>,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
    pub availability_limit: usize,
    pub tree_limit: usize,
    pub author_limit: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match &cli.command {
        Command::Render(args) => raw.apply_render_overrides(&args.overrides),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    listing: RawListingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_render_overrides(&mut self, overrides: &RenderOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(page_size) = overrides.page_size {
            self.listing.page_size = Some(page_size);
        }
        if let Some(base_path) = overrides.base_path.as_ref() {
            self.listing.base_path = Some(base_path.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.cache.ttl_seconds = Some(ttl);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            listing,
            cache,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let listing = build_listing_settings(listing)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self {
            logging,
            listing,
            cache,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let base_path = listing
        .base_path
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());
    if !base_path.starts_with('/') {
        return Err(LoadError::invalid(
            "listing.base_path",
            "must be an absolute path starting with `/`",
        ));
    }

    let page_size = non_zero_u32(
        listing.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        "listing.page_size",
    )?;

    let card_title_max_len = listing
        .card_title_max_len
        .unwrap_or(DEFAULT_CARD_TITLE_MAX_LEN);
    if card_title_max_len == 0 {
        return Err(LoadError::invalid(
            "listing.card_title_max_len",
            "must be greater than zero",
        ));
    }

    let uncategorized_slug = non_empty(
        listing.uncategorized_slug,
        DEFAULT_UNCATEGORIZED_SLUG,
        "listing.uncategorized_slug",
    )?;
    let none_author_name = non_empty(
        listing.none_author_name,
        DEFAULT_NONE_AUTHOR_NAME,
        "listing.none_author_name",
    )?;

    let type_labels = listing
        .type_labels
        .into_iter()
        .map(|(key, label)| {
            if label.singular.trim().is_empty() || label.plural.trim().is_empty() {
                return Err(LoadError::invalid(
                    "listing.type_labels",
                    format!("labels for `{key}` must not be empty"),
                ));
            }
            Ok((key, TypeLabel::new(label.singular, label.plural)))
        })
        .collect::<Result<BTreeMap<_, _>, _>>()?;

    let pagination_end_size = listing
        .pagination_end_size
        .unwrap_or(DEFAULT_PAGINATION_END_SIZE);
    if pagination_end_size == 0 {
        return Err(LoadError::invalid(
            "listing.pagination_end_size",
            "must be greater than zero",
        ));
    }

    Ok(ListingSettings {
        base_path,
        page_size,
        pagination_end_size,
        pagination_mid_size: listing
            .pagination_mid_size
            .unwrap_or(DEFAULT_PAGINATION_MID_SIZE),
        oversized_threshold: listing
            .oversized_threshold
            .unwrap_or(DEFAULT_OVERSIZED_THRESHOLD),
        card_title_max_len,
        uncategorized_slug,
        none_author_name,
        type_labels,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let ttl_seconds = cache.ttl_seconds.unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.ttl_seconds",
            "must be greater than zero",
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        ttl: Duration::from_secs(ttl_seconds),
        availability_limit: non_zero_usize(
            cache
                .availability_limit
                .unwrap_or(DEFAULT_CACHE_AVAILABILITY_LIMIT),
            "cache.availability_limit",
        )?,
        tree_limit: non_zero_usize(
            cache.tree_limit.unwrap_or(DEFAULT_CACHE_TREE_LIMIT),
            "cache.tree_limit",
        )?,
        author_limit: non_zero_usize(
            cache.author_limit.unwrap_or(DEFAULT_CACHE_AUTHOR_LIMIT),
            "cache.author_limit",
        )?,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    base_path: Option<String>,
    page_size: Option<u64>,
    pagination_end_size: Option<u32>,
    pagination_mid_size: Option<u32>,
    oversized_threshold: Option<u64>,
    card_title_max_len: Option<usize>,
    uncategorized_slug: Option<String>,
    none_author_name: Option<String>,
    type_labels: BTreeMap<String, RawTypeLabel>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTypeLabel {
    singular: String,
    plural: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    ttl_seconds: Option<u64>,
    availability_limit: Option<usize>,
    tree_limit: Option<usize>,
    author_limit: Option<usize>,
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: usize, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(value)
}

fn non_empty(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    match value {
        None => Ok(default.to_string()),
        Some(value) if value.trim().is_empty() => Err(LoadError::invalid(key, "must not be empty")),
        Some(value) => Ok(value.trim().to_string()),
    }
}
