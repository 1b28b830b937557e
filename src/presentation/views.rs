use serde::Serialize;
use time::{
    OffsetDateTime,
    format_description::{FormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::application::links::FilterLink;
use crate::application::pagination::PageLabel;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");

pub const ALL_CATEGORIES_LABEL: &str = "All Categories";
pub const ALL_AUTHORS_LABEL: &str = "All Authors";
pub const ALL_TYPES_LABEL: &str = "All Types";
pub const UNKNOWN_TYPE_LABEL: &str = "Unknown Type";

/// One selectable value in a filter list. Disabled options carry no link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
    pub enabled: bool,
    pub selected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub link: Option<FilterLink>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionLabels {
    pub category: String,
    pub author: String,
    pub content_type: String,
    pub keyword: Option<String>,
}

/// Per-facet "All ..." links: the current filter with that facet removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResetLinks {
    pub category: FilterLink,
    pub author: FilterLink,
    pub content_type: FilterLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderableFilters {
    pub category_tree: Vec<FilterOption>,
    pub author_list: Vec<FilterOption>,
    pub type_list: Vec<FilterOption>,
    pub current_selection_labels: SelectionLabels,
    pub reset_links: ResetLinks,
    pub clear_link: Option<FilterLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultCard {
    pub id: u64,
    pub type_label: String,
    pub title: String,
    pub authors: String,
    pub published: String,
    pub iso_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountSummary {
    pub start: u64,
    pub end: u64,
    pub total: u64,
}

impl CountSummary {
    pub fn text(&self) -> String {
        format!(
            "Showing {}-{} of {} resources",
            self.start, self.end, self.total
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultNotice {
    EmptyResult,
}

impl ResultNotice {
    pub fn message(self) -> &'static str {
        match self {
            ResultNotice::EmptyResult => "No resources match the selected filters.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinkView {
    pub label: PageLabel,
    pub link: Option<FilterLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderableResults {
    pub count_summary: Option<CountSummary>,
    pub cards: Vec<ResultCard>,
    pub page_links: Vec<PageLinkView>,
    pub previous: Option<FilterLink>,
    pub next: Option<FilterLink>,
    pub notice: Option<ResultNotice>,
    pub notice_message: Option<&'static str>,
}

pub fn format_human_date(at: OffsetDateTime) -> String {
    at.date()
        .format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| at.date().to_string())
}

pub fn format_iso_date(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// Shorten `title` to at most `max_chars` characters plus "...", cutting at
/// the last space inside the limit when there is one.
pub fn truncate_title(title: &str, max_chars: usize) -> String {
    if title.chars().count() <= max_chars {
        return title.to_string();
    }

    let cut: String = title.chars().take(max_chars).collect();
    let head = match cut.rfind(' ') {
        Some(space) if space > 0 => &cut[..space],
        _ => cut.as_str(),
    };
    format!("{head}...")
}
