pub mod aggregate;
pub mod app_config;
pub mod config;
pub mod consistency;
pub mod fixtures;
pub mod issues;
pub mod location;
pub mod region;
pub mod site_data;
pub mod value;

pub use aggregate::{AggregatedBusinessData, MergedFields};
pub use app_config::{
    AppConfig, Environment, IntegritySettings, LevelThresholds, ReconcileSettings,
    SelectionPolicy,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use consistency::{
    ConsistencyLevel, ConsistencyValidationResult, DataIntegrityResult, FieldConsistencyResult,
    FieldValue,
};
pub use fixtures::{
    load_fixtures, parse_fixtures, BusinessFixture, FixtureFile, LocationFixture, SiteFixture,
};
pub use issues::{DataConsistencyIssue, IssueType, Severity};
pub use location::{BusinessLocation, NewBusinessLocation, UrlParts, VerificationStatus};
pub use site_data::{DataCategory, NewSiteData, SiteData};
pub use value::SemanticValue;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("business id must be non-empty")]
    MissingBusinessId,

    #[error("invalid url \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{field} must be within [0, 1], got {value}")]
    ScoreOutOfRange { field: &'static str, value: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read fixtures file {path}: {source}")]
    FixturesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixtures file: {0}")]
    FixturesFileParse(#[source] serde_yaml::Error),

    #[error("fixtures validation failed: {0}")]
    Validation(String),
}
