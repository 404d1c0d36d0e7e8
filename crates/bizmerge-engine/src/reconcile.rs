//! Field reconciliation shared by the aggregation and validation engines.
//!
//! Given every value reported for one field, the reconciler computes an
//! agreement score, detects disagreement issues, and picks a representative
//! value. Both engines go through [`Reconciler::reconcile`] so the numbers
//! they report can never drift apart.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use bizmerge_core::{
    DataCategory, DataConsistencyIssue, FieldValue, IssueType, ReconcileSettings, SelectionPolicy,
    SemanticValue, Severity,
};
use chrono::Utc;
use uuid::Uuid;

use crate::normalize::{dedup_strings, display_value, normalize_value};
use crate::selection::{strategy_for, SelectionStrategy};

/// Outcome of reconciling one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldReconciliation {
    pub field_name: String,
    pub category: DataCategory,
    /// Agreement in [0, 1]; 1.0 on full agreement.
    pub score: f64,
    /// Number of contributing values, used as the weight in rollups.
    pub value_count: usize,
    /// `None` when no contributing value was non-empty.
    pub representative: Option<SemanticValue>,
    pub issues: Vec<DataConsistencyIssue>,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    settings: ReconcileSettings,
    strategy: Arc<dyn SelectionStrategy>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::with_policy(ReconcileSettings::default(), SelectionPolicy::default())
    }
}

/// How one contributing value classifies after normalization.
enum Contribution {
    Empty,
    Malformed,
    Present(String),
}

impl Reconciler {
    #[must_use]
    pub fn new(settings: ReconcileSettings, strategy: Arc<dyn SelectionStrategy>) -> Self {
        Self { settings, strategy }
    }

    #[must_use]
    pub fn with_policy(settings: ReconcileSettings, policy: SelectionPolicy) -> Self {
        Self::new(settings, strategy_for(policy))
    }

    #[must_use]
    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    #[must_use]
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    #[must_use]
    pub fn severity(&self, score: f64) -> Severity {
        if score < self.settings.high_severity_below {
            Severity::High
        } else if score < self.settings.medium_severity_below {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    /// Reconcile every value reported for `field_name`.
    ///
    /// `values` must be in input order; representative selection and the
    /// numbering of `conflicting_values` both depend on it.
    #[must_use]
    pub fn reconcile(
        &self,
        field_name: &str,
        category: &DataCategory,
        values: Vec<FieldValue>,
    ) -> FieldReconciliation {
        let contributions: Vec<Contribution> = values.iter().map(classify).collect();

        let present: Vec<usize> = contributions
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| matches!(c, Contribution::Present(_)).then_some(idx))
            .collect();
        let absent_count = values.len() - present.len();
        let malformed_count = contributions
            .iter()
            .filter(|c| matches!(c, Contribution::Malformed))
            .count();

        let list_field = !present.is_empty()
            && present
                .iter()
                .all(|&idx| matches!(values[idx].value, SemanticValue::List(_)));

        let mut issues = Vec::new();
        let score;
        let representative;

        if list_field {
            // Non-empty lists all share one agreement key; only empty versus
            // non-empty can disagree.
            let distinct = usize::from(!present.is_empty()) + usize::from(absent_count > 0);
            score = agreement_score(distinct, values.len());
            representative = Some(union_lists(present.iter().map(|&idx| &values[idx].value)));
        } else {
            let mut non_empty_keys: Vec<&str> = Vec::new();
            for &idx in &present {
                if let Contribution::Present(key) = &contributions[idx] {
                    if !non_empty_keys.contains(&key.as_str()) {
                        non_empty_keys.push(key.as_str());
                    }
                }
            }
            let distinct = non_empty_keys.len() + usize::from(absent_count > 0);
            score = agreement_score(distinct, values.len());

            let too_many = non_empty_keys.len() > self.settings.max_variations;
            if too_many {
                issues.push(self.issue(
                    field_name,
                    category,
                    IssueType::TooManyVariations,
                    score,
                    format!(
                        "Field '{field_name}' has {} distinct values across {} sites, more than the allowed {}",
                        non_empty_keys.len(),
                        present.len(),
                        self.settings.max_variations
                    ),
                    "Standardize this field across all sites".to_string(),
                    present.iter().map(|&idx| &values[idx]),
                ));
            } else if non_empty_keys.len() >= 2 {
                let shown: Vec<String> = present
                    .iter()
                    .map(|&idx| display_value(&values[idx].value))
                    .collect();
                issues.push(self.issue(
                    field_name,
                    category,
                    IssueType::Conflict,
                    score,
                    format!(
                        "Field '{field_name}' has {} conflicting values: {}",
                        non_empty_keys.len(),
                        dedup_strings(shown).join(" | ")
                    ),
                    "Verify the correct value and update the disagreeing sites".to_string(),
                    present.iter().map(|&idx| &values[idx]),
                ));
            }

            let candidates: Vec<&FieldValue> = present.iter().map(|&idx| &values[idx]).collect();
            representative = self
                .strategy
                .select(&candidates)
                .and_then(|pick| candidates.get(pick))
                .map(|fv| fv.value.clone());
        }

        if (absent_count > 0 && !present.is_empty()) || malformed_count > 0 {
            let description = if malformed_count > 0 {
                format!(
                    "Field '{field_name}' is empty or malformed on {absent_count} of {} sites ({malformed_count} malformed)",
                    values.len()
                )
            } else {
                format!(
                    "Field '{field_name}' is empty on {absent_count} of {} sites",
                    values.len()
                )
            };
            issues.push(self.issue(
                field_name,
                category,
                IssueType::EmptyValues,
                score,
                description,
                "Fill in the missing values from a site that reports them".to_string(),
                values.iter(),
            ));
        }

        tracing::debug!(
            field = field_name,
            category = %category,
            score,
            values = values.len(),
            issues = issues.len(),
            "field reconciled"
        );

        FieldReconciliation {
            field_name: field_name.to_string(),
            category: category.clone(),
            score,
            value_count: values.len(),
            representative,
            issues,
            values,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn issue<'a>(
        &self,
        field_name: &str,
        category: &DataCategory,
        issue_type: IssueType,
        score: f64,
        description: String,
        recommendation: String,
        involved: impl Iterator<Item = &'a FieldValue>,
    ) -> DataConsistencyIssue {
        let mut affected_sites = Vec::new();
        let mut conflicting_values = BTreeMap::new();
        let mut seen = HashSet::new();
        for (n, fv) in involved.enumerate() {
            if seen.insert(fv.site_id) {
                affected_sites.push(fv.site_id);
            }
            conflicting_values.insert(format!("value_{}", n + 1), fv.value.clone());
        }

        DataConsistencyIssue {
            id: Uuid::new_v4(),
            field_name: field_name.to_string(),
            category: category.clone(),
            issue_type,
            severity: self.severity(score),
            description,
            affected_sites,
            conflicting_values,
            recommendation,
            created_at: Utc::now(),
        }
    }
}

fn classify(fv: &FieldValue) -> Contribution {
    match normalize_value(&fv.value) {
        Ok(key) if key.is_empty() => Contribution::Empty,
        Ok(key) => Contribution::Present(key),
        Err(err) => {
            tracing::warn!(
                site_id = %fv.site_id,
                error = %err,
                "malformed field value treated as empty"
            );
            Contribution::Malformed
        }
    }
}

/// `1 - (distinct - 1) / total`, or 1.0 for at most one value.
#[must_use]
pub fn agreement_score(distinct: usize, total: usize) -> f64 {
    if total <= 1 || distinct <= 1 {
        return 1.0;
    }
    // Counts are bounded by the number of sites, far inside f64's mantissa.
    #[allow(clippy::cast_precision_loss)]
    let score = 1.0 - (distinct - 1) as f64 / total as f64;
    score
}

/// Set-union of list items keyed on normalized form, sorted by that key.
fn union_lists<'a>(lists: impl Iterator<Item = &'a SemanticValue>) -> SemanticValue {
    let mut merged: BTreeMap<String, SemanticValue> = BTreeMap::new();
    for list in lists {
        let Some(items) = list.as_list() else {
            continue;
        };
        for item in items {
            match normalize_value(item) {
                Ok(key) if !key.is_empty() => {
                    merged.entry(key).or_insert_with(|| item.clone());
                }
                _ => {}
            }
        }
    }
    SemanticValue::List(merged.into_values().collect())
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
