//! Domain layer types and invariants.

pub mod authors;
pub mod availability;
pub mod categories;
pub mod entities;
pub mod error;
pub mod filters;
pub mod types;
