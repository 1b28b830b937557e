//! Repository traits describing the external corpus.

use std::collections::BTreeSet;
use std::num::NonZeroU32;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::entities::{Author, AuthorId, CategoryId, CategoryRecord, Item, ItemId};
use crate::domain::filters::{FacetFilter, FilterState};
use crate::domain::types::AllowedTypes;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("item source unavailable: {0}")]
    Unavailable(String),
    #[error("item source timed out")]
    Timeout,
}

impl RepoError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Immutable query specification handed to an [`ItemRepository`].
///
/// Only published items ever match. Results are ordered by descending publish
/// time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ItemQuery {
    types: Vec<String>,
    category: Option<String>,
    author: Option<AuthorId>,
    keyword: Option<String>,
    page: u32,
    page_size: Option<NonZeroU32>,
}

impl ItemQuery {
    pub fn builder(types: Vec<String>) -> ItemQueryBuilder {
        ItemQueryBuilder {
            query: ItemQuery {
                types,
                category: None,
                author: None,
                keyword: None,
                page: 1,
                page_size: None,
            },
        }
    }

    /// Every published item of the allowed types.
    pub fn published(allowed: &AllowedTypes) -> Self {
        Self::builder(allowed.as_slice().to_vec()).build()
    }

    /// All items matching a facet filter, unpaged.
    pub fn candidates(allowed: &AllowedTypes, filter: &FacetFilter) -> Self {
        Self::builder(filter.query_types(allowed))
            .facets(filter)
            .build()
    }

    /// One page of the listing described by `state`.
    pub fn listing(allowed: &AllowedTypes, state: &FilterState, page_size: NonZeroU32) -> Self {
        Self::builder(state.facets().query_types(allowed))
            .facets(state.facets())
            .paginate(state.page(), page_size)
            .build()
    }

    pub fn types(&self) -> &[String] {
        &self.types
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn author(&self) -> Option<AuthorId> {
        self.author
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// `None` requests every match on a single page.
    pub fn page_size(&self) -> Option<NonZeroU32> {
        self.page_size
    }
}

#[derive(Debug, Clone)]
pub struct ItemQueryBuilder {
    query: ItemQuery,
}

impl ItemQueryBuilder {
    pub fn category(mut self, slug: Option<&str>) -> Self {
        self.query.category = slug.map(str::to_string);
        self
    }

    pub fn author(mut self, author: Option<AuthorId>) -> Self {
        self.query.author = author;
        self
    }

    pub fn keyword(mut self, keyword: Option<&str>) -> Self {
        self.query.keyword = keyword.map(str::to_string);
        self
    }

    pub fn facets(self, filter: &FacetFilter) -> Self {
        self.category(filter.category.as_deref())
            .author(filter.author)
            .keyword(filter.keyword.as_deref())
    }

    pub fn paginate(mut self, page: u32, page_size: NonZeroU32) -> Self {
        self.query.page = page.max(1);
        self.query.page_size = Some(page_size);
        self
    }

    pub fn build(self) -> ItemQuery {
        self.query
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPage {
    pub items: Vec<Item>,
    pub total_count: u64,
    pub total_pages: u32,
}

impl ItemPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Slice one page out of an already filtered and ordered match list.
    pub fn from_matches(matches: Vec<Item>, page: u32, page_size: Option<NonZeroU32>) -> Self {
        let total_count = matches.len() as u64;
        let Some(size) = page_size else {
            return Self {
                total_pages: u32::from(total_count > 0),
                items: matches,
                total_count,
            };
        };

        let size = u64::from(size.get());
        let total_pages = u32::try_from(total_count.div_ceil(size)).unwrap_or(u32::MAX);
        let offset = u64::from(page.max(1) - 1).saturating_mul(size);
        let items = matches
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(size).unwrap_or(usize::MAX))
            .collect();

        Self {
            items,
            total_count,
            total_pages,
        }
    }
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn query(&self, query: &ItemQuery) -> Result<ItemPage, RepoError>;
}

#[async_trait]
pub trait CategorySource: Send + Sync {
    async fn categories_used_by(&self, items: &[ItemId])
    -> Result<BTreeSet<CategoryId>, RepoError>;

    /// Direct children of `parent` (`None` for the top level), in taxonomy order.
    async fn children_of(&self, parent: Option<CategoryId>)
    -> Result<Vec<CategoryRecord>, RepoError>;

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError>;
}

#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn author(&self, id: AuthorId) -> Result<Option<Author>, RepoError>;
}
