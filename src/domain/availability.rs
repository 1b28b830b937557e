use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::entities::{AuthorId, Item};
use crate::domain::types::{AllowedTypes, FacetKind};

/// Facet values that still yield results under the other active filters.
///
/// Sets are ordered so two computations over the same inputs compare and
/// serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FacetAvailability {
    pub types: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub authors: BTreeSet<AuthorId>,
}

impl FacetAvailability {
    pub fn has_type(&self, content_type: &str) -> bool {
        self.types.contains(content_type)
    }

    pub fn has_category(&self, slug: &str) -> bool {
        self.categories.contains(slug)
    }

    pub fn has_author(&self, author: AuthorId) -> bool {
        self.authors.contains(&author)
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.categories.is_empty() && self.authors.is_empty()
    }
}

/// Derive availability from a candidate set in one pass.
///
/// `facet` selects the single facet to compute; `None` computes all three.
pub fn collect_availability<'a>(
    candidates: impl IntoIterator<Item = &'a Item>,
    allowed: &AllowedTypes,
    excluded_category: &str,
    facet: Option<FacetKind>,
) -> FacetAvailability {
    let wants = |kind: FacetKind| facet.is_none_or(|requested| requested == kind);
    let mut availability = FacetAvailability::default();

    for item in candidates {
        if wants(FacetKind::Type) && allowed.contains(&item.content_type) {
            availability.types.insert(item.content_type.clone());
        }
        if wants(FacetKind::Category) {
            availability.categories.extend(
                item.categories
                    .iter()
                    .filter(|category| category.slug != excluded_category)
                    .map(|category| category.slug.clone()),
            );
        }
        if wants(FacetKind::Author) {
            availability
                .authors
                .extend(item.authors.iter().map(|author| author.id));
        }
    }

    availability
}
