use thiserror::Error;

use crate::domain::types::FacetKind;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{facet} filter value `{value}` is outside the allowed domain")]
    InvalidFacetValue { facet: FacetKind, value: String },
}

impl DomainError {
    pub fn invalid_facet_value(facet: FacetKind, value: impl Into<String>) -> Self {
        Self::InvalidFacetValue {
            facet,
            value: value.into(),
        }
    }
}
