//! Read-only records consumed from the content repository.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::ContentStatus;

pub type ItemId = u64;
pub type AuthorId = u64;
pub type CategoryId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
}

impl Author {
    pub fn new(id: AuthorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Category attached to an item, copied by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: CategoryId,
    pub slug: String,
}

/// Taxonomy entry as stored by the category source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    #[serde(default)]
    pub parent_id: Option<CategoryId>,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub content_type: String,
    pub status: ContentStatus,
    pub title: String,
    pub excerpt: String,
    pub categories: Vec<CategoryRef>,
    pub authors: Vec<Author>,
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
}

impl Item {
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }

    pub fn has_category_slug(&self, slug: &str) -> bool {
        self.categories.iter().any(|category| category.slug == slug)
    }

    /// Exact membership on the structured author list.
    pub fn has_author(&self, author: AuthorId) -> bool {
        self.authors.iter().any(|candidate| candidate.id == author)
    }

    /// Case-insensitive substring match over title and excerpt.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.excerpt.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(authors: &[AuthorId]) -> Item {
        Item {
            id: 1,
            content_type: "post".to_string(),
            status: ContentStatus::Published,
            title: "Rust Ownership Explained".to_string(),
            excerpt: "Borrowing without tears".to_string(),
            categories: vec![CategoryRef {
                id: 3,
                slug: "news".to_string(),
            }],
            authors: authors
                .iter()
                .map(|id| Author::new(*id, format!("Author {id}")))
                .collect(),
            published_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn author_membership_is_exact() {
        let record = item(&[12]);
        assert!(record.has_author(12));
        assert!(!record.has_author(1));
        assert!(!record.has_author(2));
    }

    #[test]
    fn keyword_matches_title_or_excerpt_case_insensitively() {
        let record = item(&[1]);
        assert!(record.matches_keyword("ownership"));
        assert!(record.matches_keyword("TEARS"));
        assert!(!record.matches_keyword("lifetimes"));
    }

    #[test]
    fn category_lookup_uses_slug() {
        let record = item(&[1]);
        assert!(record.has_category_slug("news"));
        assert!(!record.has_category_slug("events"));
    }
}
