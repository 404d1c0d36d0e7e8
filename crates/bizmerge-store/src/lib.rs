//! Storage contracts for locations, site data, and aggregates.
//!
//! Engines and the service only ever see the traits; the in-memory
//! implementations back tests and the CLI. Every read returns owned clones,
//! so a caller holds a stable snapshot that later writes cannot tear.

use thiserror::Error;
use uuid::Uuid;

pub mod aggregates;
pub mod locations;
pub mod site_data;

pub use aggregates::{AggregateStore, MemoryAggregateStore};
pub use locations::{LocationStore, MemoryLocationStore};
pub use site_data::{MemorySiteDataStore, SiteDataStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("{kind} {id} already exists")]
    Duplicate { kind: &'static str, id: Uuid },
}

impl StoreError {
    pub(crate) fn location_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: "location",
            id,
        }
    }

    pub(crate) fn site_data_not_found(id: Uuid) -> Self {
        Self::NotFound {
            kind: "site data",
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_name_the_record_kind() {
        let id = Uuid::nil();
        assert_eq!(
            StoreError::location_not_found(id).to_string(),
            format!("location {id} not found")
        );
        let dup = StoreError::Duplicate {
            kind: "site data",
            id,
        };
        assert!(dup.to_string().ends_with("already exists"));
    }
}
