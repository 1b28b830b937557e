use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::domain::entities::{CategoryId, CategoryRecord, Item};

pub const MAX_CATEGORY_DEPTH: u8 = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub count: u64,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    pub fn find_by_slug<'a>(nodes: &'a [CategoryNode], slug: &str) -> Option<&'a CategoryNode> {
        nodes.iter().find_map(|node| {
            if node.slug == slug {
                Some(node)
            } else {
                CategoryNode::find_by_slug(&node.children, slug)
            }
        })
    }
}

/// Adjacency list of the taxonomy, keyed by parent (`None` for top level).
/// Children keep the order the category source returned them in.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    children: HashMap<Option<CategoryId>, Vec<CategoryRecord>>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_level(&mut self, parent: Option<CategoryId>, children: Vec<CategoryRecord>) {
        self.children.insert(parent, children);
    }

    pub fn children_of(&self, parent: Option<CategoryId>) -> &[CategoryRecord] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Which categories the restricted corpus uses, and how many items each one
/// carries directly.
#[derive(Debug, Clone, Default)]
pub struct CategoryUsage {
    used: HashSet<CategoryId>,
    counts: HashMap<CategoryId, u64>,
}

impl CategoryUsage {
    pub fn new(used: impl IntoIterator<Item = CategoryId>) -> Self {
        Self {
            used: used.into_iter().collect(),
            counts: HashMap::new(),
        }
    }

    /// Count direct attachments over `items`. Only used categories are counted.
    pub fn with_counts<'a>(mut self, items: impl IntoIterator<Item = &'a Item>) -> Self {
        for item in items {
            let mut seen = HashSet::new();
            for category in &item.categories {
                if self.used.contains(&category.id) && seen.insert(category.id) {
                    *self.counts.entry(category.id).or_default() += 1;
                }
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn count(&self, id: CategoryId) -> u64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }
}

/// Build the pruned category tree below `parent`.
///
/// Pruning runs bottom-up: a node survives when it carries items directly or
/// when at least one descendant survives. The sentinel category named by
/// `excluded_slug` never appears, nor does anything below it.
pub fn build_category_tree(
    taxonomy: &Taxonomy,
    parent: Option<CategoryId>,
    usage: &CategoryUsage,
    excluded_slug: &str,
) -> Vec<CategoryNode> {
    if usage.is_empty() {
        return Vec::new();
    }
    let mut path = Vec::new();
    assemble_level(taxonomy, parent, usage, excluded_slug, &mut path)
}

fn assemble_level(
    taxonomy: &Taxonomy,
    parent: Option<CategoryId>,
    usage: &CategoryUsage,
    excluded_slug: &str,
    path: &mut Vec<CategoryId>,
) -> Vec<CategoryNode> {
    if path.len() >= usize::from(MAX_CATEGORY_DEPTH) {
        return Vec::new();
    }

    let mut level = Vec::new();
    for record in taxonomy.children_of(parent) {
        // A category reachable from itself is skipped rather than expanded.
        if record.slug == excluded_slug || path.contains(&record.id) {
            continue;
        }

        path.push(record.id);
        let children = assemble_level(taxonomy, Some(record.id), usage, excluded_slug, path);
        path.pop();
        let count = usage.count(record.id);
        if count > 0 || !children.is_empty() {
            level.push(CategoryNode {
                id: record.id,
                slug: record.slug.clone(),
                name: record.name.clone(),
                count,
                children,
            });
        }
    }
    level
}

/// Every slug in the tree, lowercased, de-duplicated and sorted.
pub fn flatten_slugs(nodes: &[CategoryNode]) -> Vec<String> {
    fn collect(nodes: &[CategoryNode], into: &mut BTreeSet<String>) {
        for node in nodes {
            into.insert(node.slug.to_lowercase());
            collect(&node.children, into);
        }
    }

    let mut slugs = BTreeSet::new();
    collect(nodes, &mut slugs);
    slugs.into_iter().collect()
}
