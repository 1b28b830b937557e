//! Faceted, paginated resource listings.
//!
//! The crate turns a [`domain::filters::FilterState`] into the data a listing
//! page needs: filter controls whose options are enabled only when selecting
//! them keeps the result set non-empty, a pruned category tree, an author
//! list, and a page of result cards with an ellipsis-collapsed page window.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
