//! Category tree and author list over the published corpus.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error::ListingError;
use crate::application::repos::{
    AuthorDirectory, CategorySource, ItemQuery, ItemRepository, RepoError,
};
use crate::cache::{CacheKey, ListingCache, SingleFlight};
use crate::domain::authors::aggregate_authors;
use crate::domain::categories::{
    CategoryNode, CategoryUsage, MAX_CATEGORY_DEPTH, Taxonomy, build_category_tree,
};
use crate::domain::entities::{Author, AuthorId, CategoryId, CategoryRecord, ItemId};
use crate::domain::types::AllowedTypes;

pub struct CatalogService {
    items: Arc<dyn ItemRepository>,
    categories: Arc<dyn CategorySource>,
    directory: Arc<dyn AuthorDirectory>,
    cache: Arc<ListingCache>,
    flights: SingleFlight,
    uncategorized_slug: String,
}

impl CatalogService {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        categories: Arc<dyn CategorySource>,
        directory: Arc<dyn AuthorDirectory>,
        cache: Arc<ListingCache>,
        uncategorized_slug: impl Into<String>,
    ) -> Self {
        Self {
            items,
            categories,
            directory,
            cache,
            flights: SingleFlight::new(),
            uncategorized_slug: uncategorized_slug.into(),
        }
    }

    /// Pruned category tree below `parent` for the allowed content types.
    #[instrument(skip_all, fields(parent = ?parent))]
    pub async fn category_tree(
        &self,
        allowed: &AllowedTypes,
        parent: Option<CategoryId>,
    ) -> Result<Vec<CategoryNode>, ListingError> {
        let key = CacheKey::category_tree(allowed, parent);
        if let Some(cached) = self.cache.get_tree(&key) {
            return Ok(cached);
        }

        let flight = if self.cache.is_enabled() {
            Some(self.flights.acquire(key.signature()).await)
        } else {
            None
        };
        if flight.is_some()
            && let Some(cached) = self.cache.get_tree(&key)
        {
            return Ok(cached);
        }

        let published = self.items.query(&ItemQuery::published(allowed)).await?;
        let ids: Vec<ItemId> = published.items.iter().map(|item| item.id).collect();
        let used = self.categories.categories_used_by(&ids).await?;
        let usage = CategoryUsage::new(used).with_counts(&published.items);

        let tree = if usage.is_empty() {
            Vec::new()
        } else {
            let taxonomy = self.load_taxonomy(parent).await?;
            build_category_tree(&taxonomy, parent, &usage, &self.uncategorized_slug)
        };
        debug!(
            items = published.total_count,
            roots = tree.len(),
            "Built category tree"
        );

        self.cache.put_tree(&key, tree.clone());
        drop(flight);
        Ok(tree)
    }

    /// Walk the taxonomy below `parent` level by level. Each category is
    /// expanded at most once.
    async fn load_taxonomy(&self, parent: Option<CategoryId>) -> Result<Taxonomy, RepoError> {
        let mut taxonomy = Taxonomy::new();
        let mut expanded = HashSet::new();
        let mut frontier = vec![parent];

        for _ in 0..MAX_CATEGORY_DEPTH {
            if frontier.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for level in frontier {
                if !expanded.insert(level) {
                    continue;
                }
                let children = self.categories.children_of(level).await?;
                next.extend(
                    children
                        .iter()
                        .filter(|child| child.slug != self.uncategorized_slug)
                        .map(|child| Some(child.id)),
                );
                taxonomy.insert_level(level, children);
            }
            frontier = next;
        }

        Ok(taxonomy)
    }

    /// Distinct authors credited on published items, sorted by name.
    #[instrument(skip_all)]
    pub async fn authors(&self, allowed: &AllowedTypes) -> Result<Vec<Author>, ListingError> {
        let key = CacheKey::authors(allowed);
        if let Some(cached) = self.cache.get_authors(&key) {
            return Ok(cached);
        }

        let flight = if self.cache.is_enabled() {
            Some(self.flights.acquire(key.signature()).await)
        } else {
            None
        };
        if flight.is_some()
            && let Some(cached) = self.cache.get_authors(&key)
        {
            return Ok(cached);
        }

        let published = self.items.query(&ItemQuery::published(allowed)).await?;
        let authors = aggregate_authors(&published.items);
        debug!(authors = authors.len(), "Aggregated authors");

        self.cache.put_authors(&key, authors.clone());
        drop(flight);
        Ok(authors)
    }

    pub async fn category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, ListingError> {
        Ok(self.categories.category_by_slug(slug).await?)
    }

    pub async fn author(&self, id: AuthorId) -> Result<Option<Author>, ListingError> {
        Ok(self.directory.author(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use time::OffsetDateTime;

    use super::*;
    use crate::application::repos::ItemPage;
    use crate::cache::CacheConfig;
    use crate::domain::categories::flatten_slugs;
    use crate::domain::entities::{CategoryRef, Item};
    use crate::domain::types::ContentStatus;

    #[derive(Default)]
    struct Fixture {
        items: Vec<Item>,
        categories: Vec<CategoryRecord>,
        authors: HashMap<AuthorId, Author>,
        queries: AtomicUsize,
        delay: Duration,
    }

    #[async_trait]
    impl ItemRepository for Fixture {
        async fn query(&self, query: &ItemQuery) -> Result<ItemPage, RepoError> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let matches = self
                .items
                .iter()
                .filter(|item| item.is_published() && query.types().contains(&item.content_type))
                .cloned()
                .collect();
            Ok(ItemPage::from_matches(matches, 1, None))
        }
    }

    #[async_trait]
    impl CategorySource for Fixture {
        async fn categories_used_by(
            &self,
            items: &[ItemId],
        ) -> Result<BTreeSet<CategoryId>, RepoError> {
            Ok(self
                .items
                .iter()
                .filter(|item| items.contains(&item.id))
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
            Ok(self.categories.iter().find(|c| c.slug == slug).cloned())
        }
    }

    #[async_trait]
    impl AuthorDirectory for Fixture {
        async fn author(&self, id: AuthorId) -> Result<Option<Author>, RepoError> {
            Ok(self.authors.get(&id).cloned())
        }
    }

    fn category(id: CategoryId, parent: Option<CategoryId>, slug: &str) -> CategoryRecord {
        CategoryRecord {
            id,
            parent_id: parent,
            slug: slug.to_string(),
            name: slug.to_uppercase(),
        }
    }

    fn item(
        id: ItemId,
        content_type: &str,
        categories: &[(CategoryId, &str)],
        authors: &[Author],
    ) -> Item {
        Item {
            id,
            content_type: content_type.to_string(),
            status: ContentStatus::Published,
            title: format!("Item {id}"),
            excerpt: String::new(),
            categories: categories
                .iter()
                .map(|(id, slug)| CategoryRef {
                    id: *id,
                    slug: slug.to_string(),
                })
                .collect(),
            authors: authors.to_vec(),
            published_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn fixture() -> Arc<Fixture> {
        slow_fixture(Duration::ZERO)
    }

    fn slow_fixture(delay: Duration) -> Arc<Fixture> {
        let jane_a = Author::new(1, "Jane Doe");
        let jane_b = Author::new(2, "Jane Doe");
        let bob = Author::new(3, "Bob");
        Arc::new(Fixture {
            items: vec![
                item(1, "post", &[(11, "rust")], std::slice::from_ref(&jane_a)),
                item(
                    2,
                    "guide",
                    &[(11, "rust"), (20, "events")],
                    &[jane_b.clone(), bob.clone()],
                ),
                item(3, "post", &[(99, "uncategorized")], &[jane_a.clone()]),
                item(4, "video", &[(20, "events")], &[Author::new(4, "Zed")]),
            ],
            categories: vec![
                category(10, None, "tech"),
                category(11, Some(10), "rust"),
                category(12, Some(10), "go"),
                category(20, None, "events"),
                category(99, None, "uncategorized"),
            ],
            authors: [jane_a, jane_b, bob]
                .into_iter()
                .map(|author| (author.id, author))
                .collect(),
            delay,
            ..Fixture::default()
        })
    }

    fn service(fixture: Arc<Fixture>, config: CacheConfig) -> CatalogService {
        CatalogService::new(
            fixture.clone(),
            fixture.clone(),
            fixture,
            Arc::new(ListingCache::new(&config)),
            "uncategorized",
        )
    }

    #[tokio::test]
    async fn tree_surfaces_unattached_parent_and_drops_sentinel() {
        let catalog = service(fixture(), CacheConfig::default());
        let allowed = AllowedTypes::new(["post", "guide"]);
        let tree = catalog.category_tree(&allowed, None).await.expect("tree");

        assert_eq!(
            tree.iter().map(|node| node.slug.as_str()).collect::<Vec<_>>(),
            ["tech", "events"]
        );
        assert_eq!(tree[0].count, 0);
        assert_eq!(tree[0].children.len(), 1);
        assert_eq!(tree[0].children[0].slug, "rust");
        assert_eq!(tree[0].children[0].count, 2);
        assert_eq!(tree[1].count, 1);
        assert_eq!(flatten_slugs(&tree), ["events", "rust", "tech"]);
    }

    #[tokio::test]
    async fn tree_is_cached_per_allowed_types() {
        let fixture = fixture();
        let catalog = service(fixture.clone(), CacheConfig::default());
        let posts = AllowedTypes::new(["post"]);

        let first = catalog.category_tree(&posts, None).await.expect("tree");
        let second = catalog.category_tree(&posts, None).await.expect("tree");
        assert_eq!(first, second);
        assert_eq!(fixture.queries.load(Ordering::SeqCst), 1);

        let videos = AllowedTypes::new(["video"]);
        let tree = catalog.category_tree(&videos, None).await.expect("tree");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].slug, "events");
        assert_eq!(fixture.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tree_is_empty_without_published_items() {
        let catalog = service(fixture(), CacheConfig::default());
        let allowed = AllowedTypes::new(["podcast"]);
        assert!(catalog.category_tree(&allowed, None).await.expect("tree").is_empty());
    }

    #[tokio::test]
    async fn authors_dedupe_by_id_and_sort_by_name() {
        let catalog = service(fixture(), CacheConfig::default());
        let allowed = AllowedTypes::new(["post", "guide"]);
        let authors = catalog.authors(&allowed).await.expect("authors");

        assert_eq!(
            authors.iter().map(|a| (a.id, a.name.as_str())).collect::<Vec<_>>(),
            [(3, "Bob"), (1, "Jane Doe"), (2, "Jane Doe")]
        );
    }

    #[tokio::test]
    async fn lookups_pass_through_to_sources() {
        let catalog = service(fixture(), CacheConfig::default());
        assert_eq!(
            catalog.category_by_slug("go").await.expect("lookup").map(|c| c.id),
            Some(12)
        );
        assert_eq!(
            catalog.author(3).await.expect("lookup").map(|a| a.name),
            Some("Bob".to_string())
        );
        assert!(catalog.author(42).await.expect("lookup").is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_tree_misses_build_once() {
        let fixture = slow_fixture(Duration::from_millis(50));
        let catalog = Arc::new(service(fixture.clone(), CacheConfig::default()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                tokio::spawn(async move {
                    let allowed = AllowedTypes::new(["post", "guide"]);
                    catalog.category_tree(&allowed, None).await
                })
            })
            .collect();

        let mut trees = Vec::new();
        for task in tasks {
            trees.push(task.await.expect("task").expect("tree"));
        }

        assert_eq!(fixture.queries.load(Ordering::SeqCst), 1);
        assert!(trees.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
