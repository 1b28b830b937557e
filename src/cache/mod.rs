//! Listing caches.
//!
//! Derived listings (facet availability, category trees, author lists) are
//! memoized by filter signature:
//!
//! - **Store**: bounded LRU per listing kind with a shared time-to-live
//! - **Single-flight**: one fill per signature at a time
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 3600
//! availability_limit = 512
//! # ... see config.rs for all options
//! ```

mod config;
mod flight;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use flight::{FlightGuard, SingleFlight};
pub use keys::{CacheKey, hash_value};
pub use store::{
    ListingCache, METRIC_CACHE_EVICT, METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_MISS,
    TtlCache,
};
