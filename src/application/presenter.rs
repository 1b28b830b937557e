//! Turns a filter state into renderable filter lists and result listings.

use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::availability::FacetAvailabilityEngine;
use crate::application::catalog::CatalogService;
use crate::application::error::ListingError;
use crate::application::links::{
    AUTHOR_PARAM, CATEGORY_PARAM, FilterLink, FilterParams, PAGE_PARAM, ParamOverride,
    TYPE_PARAM, next,
};
use crate::application::pagination::PageWindow;
use crate::application::repos::{
    AuthorDirectory, CategorySource, ItemPage, ItemQuery, ItemRepository,
};
use crate::cache::ListingCache;
use crate::domain::availability::FacetAvailability;
use crate::domain::categories::CategoryNode;
use crate::domain::entities::{Author, Item};
use crate::domain::filters::FilterState;
use crate::domain::types::{AllowedTypes, TypeLabel};
use crate::presentation::views::{
    ALL_AUTHORS_LABEL, ALL_CATEGORIES_LABEL, ALL_TYPES_LABEL, CountSummary, FilterOption,
    PageLinkView, RenderableFilters, RenderableResults, ResetLinks, ResultCard, ResultNotice,
    SelectionLabels, UNKNOWN_TYPE_LABEL, format_human_date, format_iso_date, truncate_title,
};

pub const METRIC_OVERSIZED_RESULT: &str = "resource_facets_oversized_result_total";

const DEFAULT_BASE_PATH: &str = "/resources";
const DEFAULT_PAGE_SIZE: NonZeroU32 = match NonZeroU32::new(10) {
    Some(size) => size,
    None => NonZeroU32::MIN,
};
const DEFAULT_OVERSIZED_THRESHOLD: u64 = 1000;
const DEFAULT_CARD_TITLE_MAX_LEN: usize = 44;
const DEFAULT_UNCATEGORIZED_SLUG: &str = "uncategorized";
const DEFAULT_NONE_AUTHOR_NAME: &str = "none";

#[derive(Debug, Clone)]
pub struct PresenterOptions {
    pub base_path: String,
    pub page_size: NonZeroU32,
    pub window: PageWindow,
    pub oversized_threshold: u64,
    pub card_title_max_len: usize,
    pub uncategorized_slug: String,
    pub none_author_name: String,
    pub type_labels: BTreeMap<String, TypeLabel>,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            base_path: DEFAULT_BASE_PATH.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            window: PageWindow::default(),
            oversized_threshold: DEFAULT_OVERSIZED_THRESHOLD,
            card_title_max_len: DEFAULT_CARD_TITLE_MAX_LEN,
            uncategorized_slug: DEFAULT_UNCATEGORIZED_SLUG.to_string(),
            none_author_name: DEFAULT_NONE_AUTHOR_NAME.to_string(),
            type_labels: BTreeMap::new(),
        }
    }
}

impl From<&crate::config::ListingSettings> for PresenterOptions {
    fn from(settings: &crate::config::ListingSettings) -> Self {
        Self {
            base_path: settings.base_path.clone(),
            page_size: settings.page_size,
            window: PageWindow::new(settings.pagination_end_size, settings.pagination_mid_size),
            oversized_threshold: settings.oversized_threshold,
            card_title_max_len: settings.card_title_max_len,
            uncategorized_slug: settings.uncategorized_slug.clone(),
            none_author_name: settings.none_author_name.clone(),
            type_labels: settings.type_labels.clone(),
        }
    }
}

impl PresenterOptions {
    pub fn type_label(&self, content_type: &str) -> TypeLabel {
        self.type_labels
            .get(content_type)
            .cloned()
            .unwrap_or_else(|| TypeLabel::from_key(content_type))
    }
}

/// Filters and results for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedListing {
    pub filters: RenderableFilters,
    pub results: RenderableResults,
}

pub struct ResultsPresenter {
    items: Arc<dyn ItemRepository>,
    availability: FacetAvailabilityEngine,
    catalog: CatalogService,
    options: PresenterOptions,
}

impl ResultsPresenter {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        availability: FacetAvailabilityEngine,
        catalog: CatalogService,
        options: PresenterOptions,
    ) -> Self {
        Self {
            items,
            availability,
            catalog,
            options,
        }
    }

    /// Wire every service to one source implementing all corpus traits.
    pub fn with_sources<S>(
        sources: Arc<S>,
        cache: Arc<ListingCache>,
        options: PresenterOptions,
    ) -> Self
    where
        S: ItemRepository + CategorySource + AuthorDirectory + 'static,
    {
        let availability = FacetAvailabilityEngine::new(
            sources.clone(),
            cache.clone(),
            options.uncategorized_slug.clone(),
        );
        let catalog = CatalogService::new(
            sources.clone(),
            sources.clone(),
            sources.clone(),
            cache,
            options.uncategorized_slug.clone(),
        );
        Self::new(sources, availability, catalog, options)
    }

    pub fn options(&self) -> &PresenterOptions {
        &self.options
    }

    pub fn availability(&self) -> &FacetAvailabilityEngine {
        &self.availability
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub async fn render(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
    ) -> Result<RenderedListing, ListingError> {
        let filters = self.renderable_filters(allowed, active).await?;
        let results = self.renderable_results(allowed, active).await?;
        Ok(RenderedListing { filters, results })
    }

    #[instrument(skip_all)]
    pub async fn renderable_filters(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
    ) -> Result<RenderableFilters, ListingError> {
        let availability = self.availability.per_facet(allowed, active).await?;
        let tree = self.catalog.category_tree(allowed, None).await?;
        let authors = self.catalog.authors(allowed).await?;
        let base = FilterParams::from_state(active);

        let category_tree = self.category_options(&tree, &availability, active, &base);
        let author_list = self.author_options(&authors, &availability, active, &base);
        let type_list = self.type_options(allowed, &availability, active, &base);
        let current_selection_labels = self
            .selection_labels(allowed, active, &tree, &authors)
            .await?;

        let reset = |key: &str| {
            FilterLink::new(
                next(&base, &ParamOverride::new().clear(key)),
                &self.options.base_path,
            )
        };
        let reset_links = ResetLinks {
            category: reset(CATEGORY_PARAM),
            author: reset(AUTHOR_PARAM),
            content_type: reset(TYPE_PARAM),
        };
        let clear_link = active
            .has_constraints()
            .then(|| FilterLink::new(FilterParams::new(), &self.options.base_path));

        Ok(RenderableFilters {
            category_tree,
            author_list,
            type_list,
            current_selection_labels,
            reset_links,
            clear_link,
        })
    }

    /// Query the current page and present it. A filter outside the allowed
    /// domain is served as an empty listing.
    #[instrument(skip_all, fields(page = active.page()))]
    pub async fn renderable_results(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
    ) -> Result<RenderableResults, ListingError> {
        let page = match active.check_domain(allowed) {
            Ok(()) => {
                let query = ItemQuery::listing(allowed, active, self.options.page_size);
                debug!(query = ?query, "Listing query");
                let page = self.items.query(&query).await?;
                if page.total_count > self.options.oversized_threshold {
                    warn!(
                        total = page.total_count,
                        threshold = self.options.oversized_threshold,
                        query = ?query,
                        "Oversized result set"
                    );
                    counter!(METRIC_OVERSIZED_RESULT).increment(1);
                }
                page
            }
            Err(error) => {
                debug!(error = %error, "Filter outside allowed domain; serving no results");
                ItemPage::empty()
            }
        };

        Ok(self.present_page(&page, active))
    }

    /// Present an already fetched page.
    pub fn present_page(&self, page: &ItemPage, active: &FilterState) -> RenderableResults {
        let current = active.page();
        let base = FilterParams::from_state(active);
        let page_link = |number: u32| {
            FilterLink::new(
                next(&base, &ParamOverride::new().set(PAGE_PARAM, number)),
                &self.options.base_path,
            )
        };

        let cards: Vec<ResultCard> = page.items.iter().map(|item| self.card(item)).collect();

        let count_summary = (!cards.is_empty()).then(|| {
            let start = u64::from(current - 1) * u64::from(self.options.page_size.get()) + 1;
            CountSummary {
                start,
                end: start + cards.len() as u64 - 1,
                total: page.total_count,
            }
        });

        let page_links = self
            .options
            .window
            .plan(page.total_pages, current)
            .into_iter()
            .map(|label| PageLinkView {
                link: label.number().map(page_link),
                label,
            })
            .collect();

        let has_pages = page.total_pages > 1;
        let previous = (has_pages && current > 1).then(|| page_link(current - 1));
        let next_link = (has_pages && current < page.total_pages).then(|| page_link(current + 1));
        let notice = cards.is_empty().then_some(ResultNotice::EmptyResult);

        RenderableResults {
            count_summary,
            cards,
            page_links,
            previous,
            next: next_link,
            notice,
            notice_message: notice.map(ResultNotice::message),
        }
    }

    fn card(&self, item: &Item) -> ResultCard {
        let authors = item
            .authors
            .iter()
            .map(|author| author.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        ResultCard {
            id: item.id,
            type_label: self
                .options
                .type_label(&item.content_type)
                .card_label()
                .to_string(),
            title: truncate_title(&item.title, self.options.card_title_max_len),
            authors,
            published: format_human_date(item.published_at),
            iso_date: format_iso_date(item.published_at),
        }
    }

    fn option(
        &self,
        base: &FilterParams,
        key: &str,
        value: String,
        label: String,
        available: bool,
        selected: bool,
    ) -> FilterOption {
        let enabled = available || selected;
        let link = enabled.then(|| {
            FilterLink::new(
                next(base, &ParamOverride::new().set(key, &value)),
                &self.options.base_path,
            )
        });
        FilterOption {
            value,
            label,
            enabled,
            selected,
            count: None,
            link,
            children: Vec::new(),
        }
    }

    fn category_options(
        &self,
        nodes: &[CategoryNode],
        availability: &FacetAvailability,
        active: &FilterState,
        base: &FilterParams,
    ) -> Vec<FilterOption> {
        nodes
            .iter()
            .map(|node| {
                let mut option = self.option(
                    base,
                    CATEGORY_PARAM,
                    node.slug.clone(),
                    node.name.clone(),
                    availability.has_category(&node.slug),
                    active.category() == Some(node.slug.as_str()),
                );
                option.count = Some(node.count);
                option.children =
                    self.category_options(&node.children, availability, active, base);
                option
            })
            .collect()
    }

    fn author_options(
        &self,
        authors: &[Author],
        availability: &FacetAvailability,
        active: &FilterState,
        base: &FilterParams,
    ) -> Vec<FilterOption> {
        authors
            .iter()
            .filter(|author| author.name != self.options.none_author_name)
            .map(|author| {
                self.option(
                    base,
                    AUTHOR_PARAM,
                    author.id.to_string(),
                    author.name.clone(),
                    availability.has_author(author.id),
                    active.author() == Some(author.id),
                )
            })
            .collect()
    }

    fn type_options(
        &self,
        allowed: &AllowedTypes,
        availability: &FacetAvailability,
        active: &FilterState,
        base: &FilterParams,
    ) -> Vec<FilterOption> {
        allowed
            .iter()
            .map(|content_type| {
                self.option(
                    base,
                    TYPE_PARAM,
                    content_type.to_string(),
                    self.options
                        .type_label(content_type)
                        .filter_label()
                        .to_string(),
                    availability.has_type(content_type),
                    active.content_type() == Some(content_type),
                )
            })
            .collect()
    }

    async fn selection_labels(
        &self,
        allowed: &AllowedTypes,
        active: &FilterState,
        tree: &[CategoryNode],
        authors: &[Author],
    ) -> Result<SelectionLabels, ListingError> {
        let category = match active.category() {
            None => ALL_CATEGORIES_LABEL.to_string(),
            Some(slug) => match CategoryNode::find_by_slug(tree, slug) {
                Some(node) => node.name.clone(),
                None => self
                    .catalog
                    .category_by_slug(slug)
                    .await?
                    .map(|record| record.name)
                    .unwrap_or_else(|| ALL_CATEGORIES_LABEL.to_string()),
            },
        };

        let author = match active.author() {
            None => ALL_AUTHORS_LABEL.to_string(),
            Some(id) => match authors.iter().find(|author| author.id == id) {
                Some(author) => author.name.clone(),
                None => self
                    .catalog
                    .author(id)
                    .await?
                    .map(|author| author.name)
                    .unwrap_or_else(|| ALL_AUTHORS_LABEL.to_string()),
            },
        };

        let content_type = match active.content_type() {
            None => ALL_TYPES_LABEL.to_string(),
            Some(content_type) if allowed.contains(content_type) => self
                .options
                .type_label(content_type)
                .filter_label()
                .to_string(),
            Some(_) => UNKNOWN_TYPE_LABEL.to_string(),
        };

        Ok(SelectionLabels {
            category,
            author,
            content_type,
            keyword: active.keyword().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use time::macros::datetime;

    use super::*;
    use crate::application::pagination::PageLabel;
    use crate::application::repos::RepoError;
    use crate::cache::CacheConfig;
    use crate::domain::entities::{AuthorId, CategoryId, CategoryRecord, CategoryRef, ItemId};
    use crate::domain::types::ContentStatus;

    #[derive(Default)]
    struct Corpus {
        items: Vec<Item>,
        categories: Vec<CategoryRecord>,
        authors: HashMap<AuthorId, Author>,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ItemRepository for Corpus {
        async fn query(&self, query: &ItemQuery) -> Result<ItemPage, RepoError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(RepoError::unavailable("corpus offline"));
            }
            let mut matches: Vec<Item> = self
                .items
                .iter()
                .filter(|item| item.is_published())
                .filter(|item| query.types().contains(&item.content_type))
                .filter(|item| query.category().is_none_or(|slug| item.has_category_slug(slug)))
                .filter(|item| query.author().is_none_or(|id| item.has_author(id)))
                .filter(|item| query.keyword().is_none_or(|kw| item.matches_keyword(kw)))
                .cloned()
                .collect();
            matches.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));
            Ok(ItemPage::from_matches(matches, query.page(), query.page_size()))
        }
    }

    #[async_trait]
    impl CategorySource for Corpus {
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
    impl AuthorDirectory for Corpus {
        async fn author(&self, id: AuthorId) -> Result<Option<Author>, RepoError> {
            Ok(self.authors.get(&id).cloned())
        }
    }

    fn record(id: CategoryId, slug: &str, name: &str) -> CategoryRecord {
        CategoryRecord {
            id,
            parent_id: None,
            slug: slug.to_string(),
            name: name.to_string(),
        }
    }

    fn corpus() -> Arc<Corpus> {
        let ann = Author::new(1, "Ann");
        let none = Author::new(2, "none");
        let cy = Author::new(3, "Cy");
        let news = CategoryRef {
            id: 1,
            slug: "news".to_string(),
        };
        let events = CategoryRef {
            id: 2,
            slug: "events".to_string(),
        };

        let items = (1..=25)
            .map(|id: ItemId| Item {
                id,
                content_type: if id % 5 == 0 { "guide" } else { "post" }.to_string(),
                status: ContentStatus::Published,
                title: format!("Resource number {id} about building faceted listings in Rust"),
                excerpt: String::new(),
                categories: vec![if id <= 20 { news.clone() } else { events.clone() }],
                authors: vec![if id % 2 == 0 { ann.clone() } else { none.clone() }],
                published_at: datetime!(2024-01-01 0:00 UTC) + time::Duration::days(id as i64),
            })
            .chain(std::iter::once(Item {
                id: 26,
                content_type: "post".to_string(),
                status: ContentStatus::Draft,
                title: "Draft".to_string(),
                excerpt: String::new(),
                categories: Vec::new(),
                authors: vec![cy.clone()],
                published_at: datetime!(2024-06-01 0:00 UTC),
            }))
            .collect();

        Arc::new(Corpus {
            items,
            categories: vec![
                record(1, "news", "News"),
                record(2, "events", "Events"),
                record(3, "archive", "Archive"),
            ],
            authors: [ann, none, cy].into_iter().map(|a| (a.id, a)).collect(),
            ..Corpus::default()
        })
    }

    fn presenter(corpus: Arc<Corpus>) -> ResultsPresenter {
        let mut options = PresenterOptions::default();
        options
            .type_labels
            .insert("post".to_string(), TypeLabel::new("Post", "Posts"));
        ResultsPresenter::with_sources(
            corpus,
            Arc::new(ListingCache::new(&CacheConfig::default())),
            options,
        )
    }

    fn allowed() -> AllowedTypes {
        AllowedTypes::new(["post", "guide", "video"])
    }

    #[tokio::test]
    async fn filters_flag_availability_and_selection() {
        let presenter = presenter(corpus());
        let state = FilterState::builder().category("events").build();
        let filters = presenter
            .renderable_filters(&allowed(), &state)
            .await
            .expect("filters");

        let categories: Vec<_> = filters
            .category_tree
            .iter()
            .map(|option| (option.value.as_str(), option.enabled, option.selected))
            .collect();
        assert_eq!(categories, [("news", true, false), ("events", true, true)]);

        let types: Vec<_> = filters
            .type_list
            .iter()
            .map(|option| (option.label.as_str(), option.enabled))
            .collect();
        // Events holds items 21..=25; only 25 is a guide.
        assert_eq!(
            types,
            [("Blog Posts", true), ("Guides", true), ("Videos", false)]
        );
        assert!(filters.type_list[2].link.is_none());

        // "none" is never listed; the draft-only author never appears.
        let authors: Vec<_> = filters
            .author_list
            .iter()
            .map(|option| option.label.as_str())
            .collect();
        assert_eq!(authors, ["Ann"]);

        assert_eq!(filters.current_selection_labels.category, "Events");
        assert_eq!(filters.current_selection_labels.author, "All Authors");
        assert_eq!(filters.current_selection_labels.content_type, "All Types");
        assert_eq!(filters.reset_links.category.href, "/resources");
        assert_eq!(
            filters.clear_link.map(|link| link.href),
            Some("/resources".to_string())
        );
    }

    #[tokio::test]
    async fn option_links_change_one_facet_and_reset_page() {
        let presenter = presenter(corpus());
        let state = FilterState::builder()
            .content_type("guide")
            .keyword("listings")
            .page(3)
            .build();
        let filters = presenter
            .renderable_filters(&allowed(), &state)
            .await
            .expect("filters");

        let news = &filters.category_tree[0];
        assert_eq!(
            news.link.as_ref().map(|link| link.href.as_str()),
            Some("/resources?category=news&keyword-search=listings&type=guide")
        );
        assert_eq!(
            filters.reset_links.content_type.href,
            "/resources?keyword-search=listings"
        );
        assert_eq!(filters.current_selection_labels.content_type, "Guides");
        assert_eq!(
            filters.current_selection_labels.keyword.as_deref(),
            Some("listings")
        );
    }

    #[tokio::test]
    async fn unknown_selections_fall_back_to_labels() {
        let presenter = presenter(corpus());
        let state = FilterState::builder()
            .category("archive")
            .author(3)
            .content_type("podcast")
            .build();
        let filters = presenter
            .renderable_filters(&allowed(), &state)
            .await
            .expect("filters");

        assert_eq!(filters.current_selection_labels.category, "Archive");
        assert_eq!(filters.current_selection_labels.author, "Cy");
        assert_eq!(filters.current_selection_labels.content_type, "Unknown Type");
    }

    #[tokio::test]
    async fn results_page_with_cards_and_window() {
        let presenter = presenter(corpus());
        let state = FilterState::builder().page(2).build();
        let results = presenter
            .renderable_results(&allowed(), &state)
            .await
            .expect("results");

        assert_eq!(results.cards.len(), 10);
        // Newest first: page 2 starts at item 15.
        assert_eq!(results.cards[0].id, 15);
        assert_eq!(results.cards[0].type_label, "Guide");
        assert_eq!(results.cards[1].type_label, "Blog");
        assert_eq!(results.cards[1].authors, "Ann");
        assert_eq!(results.cards[0].published, "January 16, 2024");
        assert_eq!(
            results.cards[0].title,
            "Resource number 15 about building faceted..."
        );

        let summary = results.count_summary.expect("summary");
        assert_eq!(summary.text(), "Showing 11-20 of 25 resources");

        let labels: Vec<_> = results.page_links.iter().map(|view| view.label).collect();
        assert_eq!(
            labels,
            [
                PageLabel::Page {
                    number: 1,
                    is_current: false
                },
                PageLabel::Page {
                    number: 2,
                    is_current: true
                },
                PageLabel::Page {
                    number: 3,
                    is_current: false
                },
            ]
        );
        assert_eq!(
            results.previous.map(|link| link.href),
            Some("/resources?paged=1".to_string())
        );
        assert_eq!(
            results.next.map(|link| link.href),
            Some("/resources?paged=3".to_string())
        );
        assert!(results.notice.is_none());
    }

    #[tokio::test]
    async fn disallowed_type_yields_empty_notice() {
        let presenter = presenter(corpus());
        let state = FilterState::builder().content_type("podcast").build();
        let results = presenter
            .renderable_results(&allowed(), &state)
            .await
            .expect("results");

        assert!(results.cards.is_empty());
        assert!(results.page_links.is_empty());
        assert!(results.count_summary.is_none());
        assert_eq!(results.notice, Some(ResultNotice::EmptyResult));
        assert_eq!(
            results.notice_message,
            Some("No resources match the selected filters.")
        );
    }

    #[tokio::test]
    async fn repository_failure_is_a_hard_error() {
        let corpus = corpus();
        corpus.failing.store(true, Ordering::SeqCst);
        let presenter = presenter(corpus);

        let error = presenter
            .renderable_results(&allowed(), &FilterState::default())
            .await
            .expect_err("repository is offline");
        assert!(matches!(error, ListingError::RepositoryUnavailable(_)));
    }
}
