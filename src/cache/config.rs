//! Cache configuration.
//!
//! Controls the facet availability, category tree and author list caches.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for cache configuration
const DEFAULT_TTL_SECS: u64 = 60 * 60;
const DEFAULT_AVAILABILITY_LIMIT: usize = 512;
const DEFAULT_TREE_LIMIT: usize = 64;
const DEFAULT_AUTHOR_LIMIT: usize = 64;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve derived listings from cache.
    pub enabled: bool,
    /// Lifetime of a cached entry.
    #[serde(with = "duration_secs", rename = "ttl_seconds")]
    pub ttl: Duration,
    /// Maximum cached availability snapshots.
    pub availability_limit: usize,
    /// Maximum cached category trees.
    pub tree_limit: usize,
    /// Maximum cached author lists.
    pub author_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            availability_limit: DEFAULT_AVAILABILITY_LIMIT,
            tree_limit: DEFAULT_TREE_LIMIT,
            author_limit: DEFAULT_AUTHOR_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.ttl,
            availability_limit: settings.availability_limit,
            tree_limit: settings.tree_limit,
            author_limit: settings.author_limit,
        }
    }
}

impl CacheConfig {
    /// Returns the availability limit as NonZeroUsize, clamping to 1 if zero.
    pub fn availability_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.availability_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the tree limit as NonZeroUsize, clamping to 1 if zero.
    pub fn tree_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.tree_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the author limit as NonZeroUsize, clamping to 1 if zero.
    pub fn author_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.author_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
