use bizmerge_core::CoreError;
use bizmerge_engine::EngineError;
use bizmerge_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

use crate::extract::ExtractionError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("site data from location {location_id} rejected: {}", errors.join("; "))]
    InvalidSiteData {
        location_id: Uuid,
        errors: Vec<String>,
    },

    #[error("no aggregate stored for business {business_id}")]
    AggregateNotFound { business_id: String },

    #[error("operation cancelled")]
    Cancelled,
}

impl ServiceError {
    /// `true` when the operation was aborted through its cancellation token,
    /// at whichever layer noticed first.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled | Self::Extraction(ExtractionError::Cancelled) => true,
            Self::Engine(e) => e.is_cancelled(),
            _ => false,
        }
    }
}
