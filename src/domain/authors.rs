use std::collections::HashSet;

use crate::domain::entities::{Author, Item};

/// Collect the distinct authors credited on `items`, sorted by display name.
///
/// Identity is the author id; the first occurrence of an id wins. Authors
/// without a display name are skipped. The sort is stable and byte-wise, so
/// two authors sharing a name keep the order they were first seen in.
pub fn aggregate_authors<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<Author> {
    let mut seen = HashSet::new();
    let mut authors = Vec::new();

    for item in items {
        for author in &item.authors {
            if author.name.is_empty() || !seen.insert(author.id) {
                continue;
            }
            authors.push(author.clone());
        }
    }

    authors.sort_by(|a, b| a.name.cmp(&b.name));
    authors
}
