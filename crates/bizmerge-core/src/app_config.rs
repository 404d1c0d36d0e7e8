use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Tuning for the field reconciler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileSettings {
    /// Distinct non-empty values above this raise `too_many_variations`.
    pub max_variations: usize,
    /// Scores below this yield `high` severity.
    pub high_severity_below: f64,
    /// Scores below this (and not below the high cut) yield `medium`.
    pub medium_severity_below: f64,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            max_variations: 5,
            high_severity_below: 0.3,
            medium_severity_below: 0.6,
        }
    }
}

/// Score cut-offs for [`crate::ConsistencyLevel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelThresholds {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            high: 0.9,
            medium: 0.7,
            low: 0.5,
        }
    }
}

/// Coefficients of the aggregate integrity audit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegritySettings {
    /// Aggregates scoring below this are reported invalid.
    pub min_integrity_score: f64,
    /// Penalty per structural issue.
    pub issue_weight: f64,
    /// Penalty per warning. Must stay below `issue_weight`.
    pub warning_weight: f64,
    /// Declared consistency below this raises a warning.
    pub low_consistency_warning_below: f64,
}

impl Default for IntegritySettings {
    fn default() -> Self {
        Self {
            min_integrity_score: 0.7,
            issue_weight: 0.5,
            warning_weight: 0.1,
            low_consistency_warning_below: 0.7,
        }
    }
}

/// Which representative-value policy the reconciler uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    #[default]
    FirstNonEmpty,
    HighestConfidence,
    MostRecent,
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::FirstNonEmpty => write!(f, "first_non_empty"),
            SelectionPolicy::HighestConfidence => write!(f, "highest_confidence"),
            SelectionPolicy::MostRecent => write!(f, "most_recent"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub fixtures_path: PathBuf,
    pub reconcile: ReconcileSettings,
    pub levels: LevelThresholds,
    pub integrity: IntegritySettings,
    pub selection_policy: SelectionPolicy,
    pub max_concurrent_extractions: usize,
}
