//! "Change one filter, keep the rest" link construction.
//!
//! Every category, author, type and pagination link goes through [`next`], so
//! links agree on which parameters survive a change.

use std::collections::BTreeMap;

use serde::Serialize;
use url::form_urlencoded;

use crate::domain::filters::FilterState;

pub const CATEGORY_PARAM: &str = "category";
pub const AUTHOR_PARAM: &str = "auth";
pub const TYPE_PARAM: &str = "type";
pub const KEYWORD_PARAM: &str = "keyword-search";
pub const PAGE_PARAM: &str = "paged";

/// Filter state expressed as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterParams(BTreeMap<String, String>);

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Facet and keyword parameters of `state`. The page number is left out so
    /// that changing a facet starts over at the first page.
    pub fn from_state(state: &FilterState) -> Self {
        let mut params = Self::new();
        if let Some(category) = state.category() {
            params.insert(CATEGORY_PARAM, category);
        }
        if let Some(author) = state.author() {
            params.insert(AUTHOR_PARAM, author.to_string());
        }
        if let Some(content_type) = state.content_type() {
            params.insert(TYPE_PARAM, content_type);
        }
        if let Some(keyword) = state.keyword() {
            params.insert(KEYWORD_PARAM, keyword);
        }
        params
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Form-encoded query string with keys in a stable order.
    pub fn to_query(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }

    /// `base_path` with the query appended, or `base_path` alone when empty.
    pub fn to_url(&self, base_path: &str) -> String {
        if self.is_empty() {
            base_path.to_string()
        } else {
            format!("{base_path}?{}", self.to_query())
        }
    }
}

/// Partial parameter map: `Some` replaces a value, `None` removes the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamOverride(Vec<(String, Option<String>)>);

impl ParamOverride {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.push((key.into(), Some(value.to_string())));
        self
    }

    pub fn clear(mut self, key: impl Into<String>) -> Self {
        self.0.push((key.into(), None));
        self
    }
}

/// Merge `overrides` onto `base`.
pub fn next(base: &FilterParams, overrides: &ParamOverride) -> FilterParams {
    let mut merged = base.clone();
    for (key, value) in &overrides.0 {
        match value {
            Some(value) => {
                merged.0.insert(key.clone(), value.clone());
            }
            None => {
                merged.0.remove(key);
            }
        }
    }
    merged
}

/// A navigable link: the parameters plus their rendered href.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterLink {
    pub params: FilterParams,
    pub href: String,
}

impl FilterLink {
    pub fn new(params: FilterParams, base_path: &str) -> Self {
        let href = params.to_url(base_path);
        Self { params, href }
    }
}
