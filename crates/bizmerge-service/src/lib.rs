//! Orchestration of business location management, site data extraction,
//! aggregation and consistency validation.

pub mod error;
pub mod extract;
pub mod rules;
pub mod service;

pub use error::ServiceError;
pub use extract::{DataExtractor, ExtractionError, SiteDataValidation, SiteDataValidator};
pub use rules::RuleBasedValidator;
pub use service::{BusinessDataService, ExtractionRunSummary, LocationFailure, ServiceStores};
