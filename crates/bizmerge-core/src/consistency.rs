//! Result types of the consistency validation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_config::LevelThresholds;
use crate::issues::DataConsistencyIssue;
use crate::site_data::DataCategory;
use crate::value::SemanticValue;

/// Qualitative agreement bucket. Ordered `Poor < Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsistencyLevel {
    Poor,
    Low,
    Medium,
    High,
}

impl ConsistencyLevel {
    #[must_use]
    pub fn from_score(score: f64, thresholds: &LevelThresholds) -> Self {
        if score >= thresholds.high {
            Self::High
        } else if score >= thresholds.medium {
            Self::Medium
        } else if score >= thresholds.low {
            Self::Low
        } else {
            Self::Poor
        }
    }
}

impl std::fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsistencyLevel::High => write!(f, "high"),
            ConsistencyLevel::Medium => write!(f, "medium"),
            ConsistencyLevel::Low => write!(f, "low"),
            ConsistencyLevel::Poor => write!(f, "poor"),
        }
    }
}

/// A raw value paired with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: SemanticValue,
    /// Id of the [`crate::SiteData`] record that reported the value.
    pub site_id: Uuid,
    pub location_id: Uuid,
    pub category: DataCategory,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConsistencyResult {
    pub field_name: String,
    pub score: f64,
    pub level: ConsistencyLevel,
    pub is_consistent: bool,
    pub values: Vec<FieldValue>,
    pub issues: Vec<DataConsistencyIssue>,
}

/// Whole-business consistency rollup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyValidationResult {
    pub business_id: String,
    pub site_count: usize,
    pub overall_score: f64,
    pub level: ConsistencyLevel,
    pub field_results: Vec<FieldConsistencyResult>,
    pub issues: Vec<DataConsistencyIssue>,
    pub validated_at: DateTime<Utc>,
}

/// Structural audit of a stored aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIntegrityResult {
    pub is_valid: bool,
    pub integrity_score: f64,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
}
