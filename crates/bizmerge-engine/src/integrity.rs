//! Structural audit of an already-produced aggregate.
//!
//! Works purely on the aggregate; raw site data is never re-read.

use bizmerge_core::{AggregatedBusinessData, DataIntegrityResult, IntegritySettings};

/// Audit `aggregate`, splitting findings into issues (structural defects)
/// and warnings (soft signals).
///
/// The score is `1 / (1 + issue_weight * issues + warning_weight * warnings)`:
/// 1.0 with nothing found, strictly falling as either count grows.
#[must_use]
pub fn audit(aggregate: &AggregatedBusinessData, settings: &IntegritySettings) -> DataIntegrityResult {
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    if aggregate.business_id.trim().is_empty() {
        issues.push("missing business id".to_string());
    }

    if aggregate.merged_data.is_empty() {
        issues.push("aggregate has no merged data".to_string());
    }
    for (category, fields) in &aggregate.merged_data {
        if fields.is_empty() {
            issues.push(format!("category '{category}' has no fields"));
            continue;
        }
        let expected = category.expected_fields();
        if !expected.is_empty() && !expected.iter().any(|name| fields.contains_key(*name)) {
            issues.push(format!(
                "category '{category}' is missing all expected fields ({})",
                expected.join(", ")
            ));
        }
    }

    for (name, score) in [
        ("consistency_score", aggregate.consistency_score),
        ("completeness_score", aggregate.completeness_score),
        ("quality_score", aggregate.quality_score),
    ] {
        if !(0.0..=1.0).contains(&score) {
            issues.push(format!("{name} {score} is outside [0, 1]"));
        }
    }

    if aggregate.locations.is_empty() {
        issues.push("aggregate has no locations".to_string());
    }
    if aggregate.site_data_count() == 0 {
        issues.push("aggregate has no contributing site data".to_string());
    }

    for issue in &aggregate.consistency_issues {
        warnings.push(format!(
            "unresolved {} on field '{}' ({} severity)",
            issue.issue_type, issue.field_name, issue.severity
        ));
    }
    if aggregate.consistency_score < settings.low_consistency_warning_below {
        warnings.push(format!(
            "low consistency score {:.2}",
            aggregate.consistency_score
        ));
    }
    if !aggregate.locations.is_empty() && aggregate.primary_location.is_none() {
        warnings.push("no primary location".to_string());
    }

    let integrity_score = integrity_score(issues.len(), warnings.len(), settings);
    DataIntegrityResult {
        is_valid: integrity_score >= settings.min_integrity_score,
        integrity_score,
        issues,
        warnings,
    }
}

#[must_use]
pub fn integrity_score(issues: usize, warnings: usize, settings: &IntegritySettings) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let penalty =
        settings.issue_weight * issues as f64 + settings.warning_weight * warnings as f64;
    1.0 / (1.0 + penalty)
}
