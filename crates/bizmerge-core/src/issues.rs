use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::site_data::DataCategory;
use crate::value::SemanticValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    Conflict,
    TooManyVariations,
    EmptyValues,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueType::Conflict => write!(f, "conflict"),
            IssueType::TooManyVariations => write!(f, "too_many_variations"),
            IssueType::EmptyValues => write!(f, "empty_values"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// A detected disagreement between sites on one field.
///
/// Created by the field reconciler and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConsistencyIssue {
    pub id: Uuid,
    pub field_name: String,
    pub category: DataCategory,
    pub issue_type: IssueType,
    pub severity: Severity,
    pub description: String,
    /// Site data ids whose values took part in the disagreement.
    pub affected_sites: Vec<Uuid>,
    /// Raw values keyed `value_1`, `value_2`, ... in input order.
    pub conflicting_values: BTreeMap<String, SemanticValue>,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}
