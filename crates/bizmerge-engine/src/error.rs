use bizmerge_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no site data supplied for business {business_id}")]
    EmptyInput { business_id: String },

    #[error("no locations found for business {business_id}")]
    NoLocations { business_id: String },

    #[error("no site data found for business {business_id}")]
    NoSiteData { business_id: String },

    #[error("field '{field_name}' not found in site data for business {business_id}")]
    FieldNotFound {
        business_id: String,
        field_name: String,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// `true` for [`EngineError::Cancelled`], so callers can tell an aborted
    /// run from a failed one.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// `true` for the input-absence family: nothing to work on.
    #[must_use]
    pub fn is_input_absence(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput { .. }
                | Self::NoLocations { .. }
                | Self::NoSiteData { .. }
                | Self::FieldNotFound { .. }
        )
    }
}

/// A value that cannot be rendered into a comparable form.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MalformedValue {
    #[error("number {0} is not finite")]
    NonFiniteNumber(f64),
}
