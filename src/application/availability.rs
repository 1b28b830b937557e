//! Facet availability: which category, author and type values still yield
//! results when combined with the other active filters.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error::ListingError;
use crate::application::repos::{ItemQuery, ItemRepository};
use crate::cache::{CacheKey, ListingCache, SingleFlight};
use crate::domain::availability::{FacetAvailability, collect_availability};
use crate::domain::filters::FilterState;
use crate::domain::types::{AllowedTypes, FacetKind};

pub struct FacetAvailabilityEngine {
    items: Arc<dyn ItemRepository>,
    cache: Arc<ListingCache>,
    flights: SingleFlight,
    uncategorized_slug: String,
}

impl FacetAvailabilityEngine {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        cache: Arc<ListingCache>,
        uncategorized_slug: impl Into<String>,
    ) -> Self {
        Self {
            items,
            cache,
            flights: SingleFlight::new(),
            uncategorized_slug: uncategorized_slug.into(),
        }
    }

    /// Availability of `excluding` under every other active filter, or of all
    /// three facets under the full filter when `excluding` is `None`.
    #[instrument(skip_all, fields(excluding = ?excluding))]
    pub async fn availability(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
        excluding: Option<FacetKind>,
    ) -> Result<FacetAvailability, ListingError> {
        let reduced = active.facets().without(excluding);
        let key = CacheKey::availability(allowed, reduced.clone(), excluding);

        if let Some(cached) = self.cache.get_availability(&key) {
            return Ok(cached);
        }

        let flight = if self.cache.is_enabled() {
            Some(self.flights.acquire(key.signature()).await)
        } else {
            None
        };
        // Another caller may have filled the entry while we waited.
        if flight.is_some()
            && let Some(cached) = self.cache.get_availability(&key)
        {
            return Ok(cached);
        }

        let query = ItemQuery::candidates(allowed, &reduced);
        let candidates = self.items.query(&query).await?;
        let availability = collect_availability(
            &candidates.items,
            allowed,
            &self.uncategorized_slug,
            excluding,
        );
        debug!(
            candidates = candidates.total_count,
            types = availability.types.len(),
            categories = availability.categories.len(),
            authors = availability.authors.len(),
            "Computed facet availability"
        );

        self.cache.put_availability(&key, availability.clone());
        drop(flight);
        Ok(availability)
    }

    /// Availability of each facet with that facet's own selection removed.
    pub async fn per_facet(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
    ) -> Result<FacetAvailability, ListingError> {
        let categories = self
            .availability(allowed, active, Some(FacetKind::Category))
            .await?;
        let authors = self
            .availability(allowed, active, Some(FacetKind::Author))
            .await?;
        let types = self
            .availability(allowed, active, Some(FacetKind::Type))
            .await?;

        Ok(FacetAvailability {
            types: types.types,
            categories: categories.categories,
            authors: authors.authors,
        })
    }
}
