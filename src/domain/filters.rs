//! Per-request filter state.
//!
//! A `FilterState` is built once from validated request parameters and never
//! mutated afterwards. Facet computations work on the page-less
//! [`FacetFilter`] projection so that paging never splits cache entries.

use serde::Serialize;

use crate::domain::entities::AuthorId;
use crate::domain::error::DomainError;
use crate::domain::types::{AllowedTypes, FacetKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct FacetFilter {
    pub category: Option<String>,
    pub author: Option<AuthorId>,
    pub content_type: Option<String>,
    pub keyword: Option<String>,
}

impl FacetFilter {
    /// Reduced filter: every constraint except the excluded facet. The keyword
    /// always constrains every facet.
    pub fn without(&self, excluding: Option<FacetKind>) -> Self {
        let mut reduced = self.clone();
        match excluding {
            Some(FacetKind::Category) => reduced.category = None,
            Some(FacetKind::Author) => reduced.author = None,
            Some(FacetKind::Type) => reduced.content_type = None,
            None => {}
        }
        reduced
    }

    /// Content types to search. An explicit type outside the allowed set
    /// yields no types at all, so the query matches nothing.
    pub fn query_types(&self, allowed: &AllowedTypes) -> Vec<String> {
        match self.content_type.as_deref() {
            Some(content_type) if allowed.contains(content_type) => vec![content_type.to_string()],
            Some(_) => Vec::new(),
            None => allowed.as_slice().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterState {
    facets: FacetFilter,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            facets: FacetFilter::default(),
            page: 1,
        }
    }
}

impl FilterState {
    pub fn builder() -> FilterStateBuilder {
        FilterStateBuilder::default()
    }

    pub fn category(&self) -> Option<&str> {
        self.facets.category.as_deref()
    }

    pub fn author(&self) -> Option<AuthorId> {
        self.facets.author
    }

    pub fn content_type(&self) -> Option<&str> {
        self.facets.content_type.as_deref()
    }

    pub fn keyword(&self) -> Option<&str> {
        self.facets.keyword.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn facets(&self) -> &FacetFilter {
        &self.facets
    }

    /// True when any facet or the keyword constrains the listing.
    pub fn has_constraints(&self) -> bool {
        self.facets != FacetFilter::default()
    }

    /// Reject a content type outside the allowed set. Callers treat the error
    /// as "no match", never as a failure.
    pub fn check_domain(&self, allowed: &AllowedTypes) -> Result<(), DomainError> {
        match self.content_type() {
            Some(content_type) if !allowed.contains(content_type) => Err(
                DomainError::invalid_facet_value(FacetKind::Type, content_type),
            ),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterStateBuilder {
    facets: FacetFilter,
    page: Option<u32>,
}

impl FilterStateBuilder {
    pub fn category(mut self, slug: impl Into<String>) -> Self {
        self.facets.category = normalize(slug.into());
        self
    }

    pub fn author(mut self, author: AuthorId) -> Self {
        self.facets.author = (author > 0).then_some(author);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.facets.content_type = normalize(content_type.into());
        self
    }

    pub fn keyword(mut self, keyword: impl Into<String>) -> Self {
        self.facets.keyword = normalize(keyword.into());
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn build(self) -> FilterState {
        FilterState {
            facets: self.facets,
            page: self.page.unwrap_or(1).max(1),
        }
    }
}

fn normalize(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
