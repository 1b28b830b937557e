//! Application services: availability, catalog lookups, links and presentation.

pub mod availability;
pub mod catalog;
pub mod error;
pub mod links;
pub mod pagination;
pub mod presenter;
pub mod repos;
