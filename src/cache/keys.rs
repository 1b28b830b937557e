//! Cache key definitions.
//!
//! Every cached value is addressed by the hash of a [`CacheKey`], the filter
//! signature of the inputs it was derived from.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::entities::CategoryId;
use crate::domain::filters::FacetFilter;
use crate::domain::types::{AllowedTypes, FacetKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Availability of `excluding` (or of every facet) under a reduced filter.
    Availability {
        allowed: AllowedTypes,
        filter: FacetFilter,
        excluding: Option<FacetKind>,
    },
    /// Pruned category tree below `parent`.
    CategoryTree {
        allowed: AllowedTypes,
        parent: Option<CategoryId>,
    },
    /// Sorted author list.
    Authors { allowed: AllowedTypes },
}

impl CacheKey {
    /// Key for an availability lookup. `filter` must already be reduced.
    pub fn availability(
        allowed: &AllowedTypes,
        filter: FacetFilter,
        excluding: Option<FacetKind>,
    ) -> Self {
        Self::Availability {
            allowed: allowed.clone(),
            filter,
            excluding,
        }
    }

    pub fn category_tree(allowed: &AllowedTypes, parent: Option<CategoryId>) -> Self {
        Self::CategoryTree {
            allowed: allowed.clone(),
            parent,
        }
    }

    pub fn authors(allowed: &AllowedTypes) -> Self {
        Self::Authors {
            allowed: allowed.clone(),
        }
    }

    pub fn signature(&self) -> u64 {
        hash_value(self)
    }
}

// ============================================================================
// Hash Utilities
// ============================================================================

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}
