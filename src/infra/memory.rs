//! In-memory corpus backing every repository trait.
//!
//! A corpus file lists authors, categories and items; items reference authors
//! and categories by id and are resolved once at load time.
//!
//! ```toml
//! [[authors]]
//! id = 1
//! name = "Ann"
//!
//! [[categories]]
//! id = 10
//! slug = "news"
//! name = "News"
//!
//! [[items]]
//! id = 1
//! type = "post"
//! title = "Hello"
//! categories = [10]
//! authors = [1]
//! published_at = "2024-01-01T00:00:00Z"
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{
    AuthorDirectory, CategorySource, ItemPage, ItemQuery, ItemRepository, RepoError,
};
use crate::domain::entities::{
    Author, AuthorId, CategoryId, CategoryRecord, CategoryRef, Item, ItemId,
};
use crate::domain::types::ContentStatus;

use super::error::InfraError;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    /// Newest first; ties broken by descending id.
    items: Vec<Item>,
    /// Taxonomy order.
    categories: Vec<CategoryRecord>,
    authors: BTreeMap<AuthorId, Author>,
}

impl InMemoryCorpus {
    /// Build a corpus from already resolved records.
    pub fn new(
        authors: impl IntoIterator<Item = Author>,
        categories: impl IntoIterator<Item = CategoryRecord>,
        items: impl IntoIterator<Item = Item>,
    ) -> Self {
        let mut items: Vec<Item> = items.into_iter().collect();
        items.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Self {
            items,
            categories: categories.into_iter().collect(),
            authors: authors
                .into_iter()
                .map(|author| (author.id, author))
                .collect(),
        }
    }

    /// Load a `.toml` or `.json` corpus file.
    pub async fn load(path: &Path) -> Result<Self, InfraError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let raw: RawCorpus = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&contents)
                .map_err(|err| InfraError::corpus(path, err.to_string()))?,
            Some("json") => serde_json::from_str(&contents)
                .map_err(|err| InfraError::corpus(path, err.to_string()))?,
            _ => {
                return Err(InfraError::corpus(
                    path,
                    "unsupported corpus format; expected .toml or .json",
                ));
            }
        };

        let corpus = raw
            .resolve()
            .map_err(|message| InfraError::corpus(path, message))?;
        info!(
            path = %path.display(),
            items = corpus.items.len(),
            categories = corpus.categories.len(),
            authors = corpus.authors.len(),
            "Loaded corpus"
        );
        Ok(corpus)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, InfraError> {
        let raw: RawCorpus = toml::from_str(contents)
            .map_err(|err| InfraError::corpus(Path::new("<inline>"), err.to_string()))?;
        raw.resolve()
            .map_err(|message| InfraError::corpus(Path::new("<inline>"), message))
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    fn matches(&self, query: &ItemQuery) -> Vec<Item> {
        self.items
            .iter()
            .filter(|item| item.is_published())
            .filter(|item| query.types().iter().any(|t| *t == item.content_type))
            .filter(|item| {
                query
                    .category()
                    .is_none_or(|slug| item.has_category_slug(slug))
            })
            .filter(|item| query.author().is_none_or(|author| item.has_author(author)))
            .filter(|item| {
                query
                    .keyword()
                    .is_none_or(|keyword| item.matches_keyword(keyword))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ItemRepository for InMemoryCorpus {
    async fn query(&self, query: &ItemQuery) -> Result<ItemPage, RepoError> {
        let matches = self.matches(query);
        Ok(ItemPage::from_matches(
            matches,
            query.page(),
            query.page_size(),
        ))
    }
}

#[async_trait]
impl CategorySource for InMemoryCorpus {
    async fn categories_used_by(
        &self,
        items: &[ItemId],
    ) -> Result<BTreeSet<CategoryId>, RepoError> {
        let wanted: HashSet<ItemId> = items.iter().copied().collect();
        Ok(self
            .items
            .iter()
            .filter(|item| wanted.contains(&item.id))
            .flat_map(|item| item.categories.iter().map(|category| category.id))
            .collect())
    }

    async fn children_of(
        &self,
        parent: Option<CategoryId>,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        Ok(self
            .categories
            .iter()
            .filter(|category| category.parent_id == parent)
            .cloned()
            .collect())
    }

    async fn category_by_slug(&self, slug: &str) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(self
            .categories
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }
}

#[async_trait]
impl AuthorDirectory for InMemoryCorpus {
    async fn author(&self, id: AuthorId) -> Result<Option<Author>, RepoError> {
        Ok(self.authors.get(&id).cloned())
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawCorpus {
    authors: Vec<Author>,
    categories: Vec<CategoryRecord>,
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: ItemId,
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default = "published")]
    status: ContentStatus,
    title: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    categories: Vec<CategoryId>,
    #[serde(default)]
    authors: Vec<AuthorId>,
    #[serde(with = "time::serde::rfc3339")]
    published_at: OffsetDateTime,
}

fn published() -> ContentStatus {
    ContentStatus::Published
}

impl RawCorpus {
    fn resolve(self) -> Result<InMemoryCorpus, String> {
        let authors: BTreeMap<AuthorId, Author> = self
            .authors
            .into_iter()
            .map(|author| (author.id, author))
            .collect();

        let mut slugs = HashSet::new();
        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(format!("duplicate category id {}", category.id));
            }
            if !slugs.insert(category.slug.as_str()) {
                return Err(format!("duplicate category slug `{}`", category.slug));
            }
        }
        let category_refs: BTreeMap<CategoryId, &str> = self
            .categories
            .iter()
            .map(|category| (category.id, category.slug.as_str()))
            .collect();

        let mut seen_items = HashSet::new();
        let mut items = Vec::with_capacity(self.items.len());
        for raw in self.items {
            if !seen_items.insert(raw.id) {
                return Err(format!("duplicate item id {}", raw.id));
            }

            let categories = raw
                .categories
                .iter()
                .map(|id| {
                    category_refs
                        .get(id)
                        .map(|slug| CategoryRef {
                            id: *id,
                            slug: (*slug).to_string(),
                        })
                        .ok_or_else(|| format!("item {} references unknown category {id}", raw.id))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let item_authors = raw
                .authors
                .iter()
                .map(|id| {
                    authors
                        .get(id)
                        .cloned()
                        .ok_or_else(|| format!("item {} references unknown author {id}", raw.id))
                })
                .collect::<Result<Vec<_>, _>>()?;

            items.push(Item {
                id: raw.id,
                content_type: raw.content_type,
                status: raw.status,
                title: raw.title,
                excerpt: raw.excerpt,
                categories,
                authors: item_authors,
                published_at: raw.published_at,
            });
        }

        Ok(InMemoryCorpus::new(
            authors.into_values(),
            self.categories,
            items,
        ))
    }
}
