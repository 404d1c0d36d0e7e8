//! YAML fixture describing businesses, their web presences, and the
//! field values each presence reports.
//!
//! Used by the CLI to seed in-memory stores and drive the service end to end.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::site_data::DataCategory;
use crate::value::SemanticValue;
use crate::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct FixtureFile {
    pub businesses: Vec<BusinessFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessFixture {
    pub id: String,
    #[serde(default)]
    pub locations: Vec<LocationFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationFixture {
    pub url: String,
    pub region: String,
    pub language: String,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub sites: Vec<SiteFixture>,
}

/// One extraction result a location will report.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteFixture {
    #[serde(default)]
    pub category: Option<DataCategory>,
    pub confidence: f64,
    pub data_quality: f64,
    #[serde(default = "default_extraction_method")]
    pub extraction_method: String,
    pub fields: BTreeMap<String, SemanticValue>,
}

fn default_extraction_method() -> String {
    "fixture".to_string()
}

impl FixtureFile {
    #[must_use]
    pub fn business(&self, id: &str) -> Option<&BusinessFixture> {
        self.businesses.iter().find(|b| b.id == id)
    }
}

/// Load and validate a fixture file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_fixtures(path: &Path) -> Result<FixtureFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FixturesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let fixtures = parse_fixtures(&content)?;
    Ok(fixtures)
}

/// Parse and validate fixture YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the content cannot be parsed or fails validation.
pub fn parse_fixtures(content: &str) -> Result<FixtureFile, ConfigError> {
    let fixtures: FixtureFile =
        serde_yaml::from_str(content).map_err(ConfigError::FixturesFileParse)?;
    validate_fixtures(&fixtures)?;
    Ok(fixtures)
}

fn validate_fixtures(fixtures: &FixtureFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for business in &fixtures.businesses {
        if business.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "business id must be non-empty".to_string(),
            ));
        }

        if !seen_ids.insert(business.id.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate business id: '{}'",
                business.id
            )));
        }

        let primaries = business.locations.iter().filter(|l| l.primary).count();
        if primaries > 1 {
            return Err(ConfigError::Validation(format!(
                "business '{}' declares {primaries} primary locations; at most one allowed",
                business.id
            )));
        }

        let mut seen_urls = HashSet::new();
        for location in &business.locations {
            let url = location.url.trim().trim_end_matches('/').to_lowercase();
            if !seen_urls.insert(url) {
                return Err(ConfigError::Validation(format!(
                    "business '{}' lists url '{}' more than once",
                    business.id, location.url
                )));
            }

            for site in &location.sites {
                for (name, score) in [
                    ("confidence", site.confidence),
                    ("data_quality", site.data_quality),
                ] {
                    if !(0.0..=1.0).contains(&score) {
                        return Err(ConfigError::Validation(format!(
                            "business '{}' url '{}' has {name} {score}; must be within [0, 1]",
                            business.id, location.url
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "fixtures_test.rs"]
mod tests;
