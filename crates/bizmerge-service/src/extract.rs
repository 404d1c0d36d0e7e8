//! Collaborators the service delegates to: extraction and single-site
//! validation.

use async_trait::async_trait;
use bizmerge_core::{BusinessLocation, CoreError, SiteData};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction from {url} failed: {reason}")]
    Failed { url: String, reason: String },

    #[error("extracted record is invalid: {0}")]
    InvalidRecord(#[from] CoreError),

    #[error("extraction cancelled")]
    Cancelled,
}

/// Produces one [`SiteData`] record per call for a location.
#[async_trait]
pub trait DataExtractor: Send + Sync {
    /// # Errors
    ///
    /// Implementation-specific; see [`ExtractionError`].
    async fn extract_data(&self, location: &BusinessLocation) -> Result<SiteData, ExtractionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SiteDataValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl SiteDataValidation {
    #[must_use]
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Gatekeeps malformed single-site records before they are persisted.
#[async_trait]
pub trait SiteDataValidator: Send + Sync {
    /// `Ok` with `is_valid == false` for a rejected record; `Err` only when
    /// the validator itself could not run.
    ///
    /// # Errors
    ///
    /// Implementation-specific; see [`ExtractionError`].
    async fn validate_data(&self, data: &SiteData) -> Result<SiteDataValidation, ExtractionError>;
}
