use bizmerge_core::{DataCategory, FieldValue, IssueType, ReconcileSettings, SemanticValue};
use chrono::Utc;
use uuid::Uuid;

use super::*;
use crate::selection::HighestConfidence;

fn fv(value: impl Into<SemanticValue>) -> FieldValue {
    fv_with_confidence(value, 0.8)
}

fn fv_with_confidence(value: impl Into<SemanticValue>, confidence: f64) -> FieldValue {
    FieldValue {
        value: value.into(),
        site_id: Uuid::new_v4(),
        location_id: Uuid::new_v4(),
        category: DataCategory::ContactInfo,
        confidence,
        extracted_at: Utc::now(),
    }
}

fn reconcile(values: Vec<FieldValue>) -> FieldReconciliation {
    Reconciler::default().reconcile("phone", &DataCategory::ContactInfo, values)
}

fn issue_types(result: &FieldReconciliation) -> Vec<IssueType> {
    result.issues.iter().map(|i| i.issue_type).collect()
}

#[test]
fn identical_values_agree_fully() {
    let result = reconcile(vec![fv("+1-555-123-4567"), fv("+1-555-123-4567")]);
    assert!((result.score - 1.0).abs() < f64::EPSILON);
    assert!(result.issues.is_empty());
    assert_eq!(result.value_count, 2);
    assert_eq!(
        result.representative,
        Some(SemanticValue::from("+1-555-123-4567"))
    );
}

#[test]
fn case_and_whitespace_differences_are_not_conflicts() {
    let result = reconcile(vec![fv("Sample  Business"), fv(" sample business ")]);
    assert!((result.score - 1.0).abs() < f64::EPSILON);
    assert!(result.issues.is_empty());
    // First value wins, as written.
    assert_eq!(
        result.representative,
        Some(SemanticValue::from("Sample  Business"))
    );
}

#[test]
fn two_differing_values_raise_one_conflict() {
    let a = fv("+1-555-123-4567");
    let b = fv("+1-555-999-9999");
    let (a_site, b_site) = (a.site_id, b.site_id);

    let result = reconcile(vec![a, b]);
    assert!((result.score - 0.5).abs() < 1e-9);
    assert_eq!(issue_types(&result), vec![IssueType::Conflict]);

    let issue = &result.issues[0];
    assert_eq!(issue.field_name, "phone");
    assert_eq!(issue.severity, Severity::Medium);
    assert_eq!(issue.affected_sites, vec![a_site, b_site]);
    assert_eq!(
        issue.conflicting_values.get("value_1"),
        Some(&SemanticValue::from("+1-555-123-4567"))
    );
    assert_eq!(
        issue.conflicting_values.get("value_2"),
        Some(&SemanticValue::from("+1-555-999-9999"))
    );
}

#[test]
fn single_value_never_conflicts() {
    let result = reconcile(vec![fv("+1-555-123-4567")]);
    assert!((result.score - 1.0).abs() < f64::EPSILON);
    assert!(result.issues.is_empty());
}

#[test]
fn no_values_scores_one_without_representative() {
    let result = reconcile(vec![]);
    assert!((result.score - 1.0).abs() < f64::EPSILON);
    assert!(result.representative.is_none());
    assert!(result.issues.is_empty());
}

#[test]
fn partially_empty_field_reports_empty_values_only() {
    let result = reconcile(vec![fv("+1-555-123-4567"), fv("  ")]);
    assert_eq!(issue_types(&result), vec![IssueType::EmptyValues]);
    assert!(result.score < 1.0);
    assert_eq!(
        result.representative,
        Some(SemanticValue::from("+1-555-123-4567"))
    );
}

#[test]
fn all_empty_field_has_no_issue_and_no_representative() {
    let result = reconcile(vec![fv(SemanticValue::Null), fv("")]);
    assert!(result.issues.is_empty());
    assert!(result.representative.is_none());
    assert!((result.score - 1.0).abs() < f64::EPSILON);
}

#[test]
fn conflict_and_empty_values_can_coexist() {
    let result = reconcile(vec![fv("a"), fv("b"), fv(SemanticValue::Null)]);
    assert_eq!(
        issue_types(&result),
        vec![IssueType::Conflict, IssueType::EmptyValues]
    );
}

#[test]
fn too_many_variations_supersedes_conflict() {
    let values = (0..7).map(|n| fv(format!("value-{n}"))).collect();
    let result = reconcile(values);
    assert_eq!(issue_types(&result), vec![IssueType::TooManyVariations]);
    assert_eq!(result.issues[0].severity, Severity::High);
}

#[test]
fn max_variations_is_configurable() {
    let settings = ReconcileSettings {
        max_variations: 1,
        ..ReconcileSettings::default()
    };
    let reconciler = Reconciler::with_policy(settings, SelectionPolicy::FirstNonEmpty);
    let result = reconciler.reconcile("phone", &DataCategory::ContactInfo, vec![fv("a"), fv("b")]);
    assert_eq!(issue_types(&result), vec![IssueType::TooManyVariations]);
}

#[test]
fn malformed_number_recovers_as_empty_values() {
    let result = reconcile(vec![fv(f64::NAN), fv(4.5)]);
    assert_eq!(issue_types(&result), vec![IssueType::EmptyValues]);
    assert!(result.issues[0].description.contains("malformed"));
    assert_eq!(result.representative, Some(SemanticValue::Number(4.5)));
}

#[test]
fn score_falls_as_distinct_values_grow() {
    let mut previous = 1.0;
    for distinct in 1..=5 {
        let values = (0..5).map(|n| fv(format!("v{}", n % distinct))).collect();
        let score = reconcile(values).score;
        assert!(score <= previous, "distinct={distinct} score={score}");
        assert!(score > 0.0);
        previous = score;
    }
}

#[test]
fn list_values_union_without_conflict() {
    let result = Reconciler::default().reconcile(
        "products",
        &DataCategory::ProductCatalog,
        vec![
            fv(vec!["Mug", "t-shirt"]),
            fv(vec!["mug", "Sticker"]),
            fv(vec!["Sticker"]),
        ],
    );
    assert!((result.score - 1.0).abs() < f64::EPSILON);
    assert!(result.issues.is_empty());
    assert_eq!(
        result.representative,
        Some(SemanticValue::from(vec!["Mug", "Sticker", "t-shirt"]))
    );
}

#[test]
fn list_with_missing_site_reports_empty_values() {
    let result = Reconciler::default().reconcile(
        "products",
        &DataCategory::ProductCatalog,
        vec![fv(vec!["Mug"]), fv(SemanticValue::List(vec![]))],
    );
    assert_eq!(issue_types(&result), vec![IssueType::EmptyValues]);
    assert_eq!(result.representative, Some(SemanticValue::from(vec!["Mug"])));
}

#[test]
fn severity_cut_points() {
    let reconciler = Reconciler::default();
    assert_eq!(reconciler.severity(0.1), Severity::High);
    assert_eq!(reconciler.severity(0.3), Severity::Medium);
    assert_eq!(reconciler.severity(0.59), Severity::Medium);
    assert_eq!(reconciler.severity(0.6), Severity::Low);
}

#[test]
fn highest_confidence_strategy_picks_trusted_value() {
    let reconciler = Reconciler::new(
        ReconcileSettings::default(),
        std::sync::Arc::new(HighestConfidence),
    );
    let result = reconciler.reconcile(
        "phone",
        &DataCategory::ContactInfo,
        vec![fv_with_confidence("a", 0.2), fv_with_confidence("b", 0.9)],
    );
    assert_eq!(result.representative, Some(SemanticValue::from("b")));
    assert_eq!(reconciler.strategy_name(), "highest_confidence");
}

#[test]
fn agreement_score_bounds() {
    assert!((agreement_score(0, 0) - 1.0).abs() < f64::EPSILON);
    assert!((agreement_score(1, 4) - 1.0).abs() < f64::EPSILON);
    assert!((agreement_score(4, 4) - 0.25).abs() < 1e-9);
}
