//! Shared domain enumerations and small value types.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Published,
}

/// One independently filterable dimension of the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacetKind {
    Category,
    Author,
    Type,
}

impl FacetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FacetKind::Category => "category",
            FacetKind::Author => "author",
            FacetKind::Type => "type",
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, de-duplicated set of content types a listing is allowed to show.
///
/// Order is preserved because the type filter renders in the configured order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AllowedTypes(Vec<String>);

impl AllowedTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = Vec::new();
        for value in types {
            let value = value.into();
            let value = value.trim();
            if value.is_empty() || values.iter().any(|existing| existing == value) {
                continue;
            }
            values.push(value.to_string());
        }
        Self(values)
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.0.iter().any(|value| value == content_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Human labels for a content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLabel {
    pub singular: String,
    pub plural: String,
}

impl TypeLabel {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// Fallback label derived from the type key, e.g. `guide` → `Guide` / `Guides`.
    pub fn from_key(key: &str) -> Self {
        let mut chars = key.chars();
        let singular = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        let plural = format!("{singular}s");
        Self { singular, plural }
    }

    /// Label used on result cards. Plain posts read as blog entries.
    pub fn card_label(&self) -> &str {
        if self.singular == "Post" {
            "Blog"
        } else {
            &self.singular
        }
    }

    /// Label used in the type filter list.
    pub fn filter_label(&self) -> &str {
        if self.plural == "Posts" {
            "Blog Posts"
        } else {
            &self.plural
        }
    }
}
