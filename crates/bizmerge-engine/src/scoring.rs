//! Whole-record scores shared by both engines.

use std::collections::BTreeMap;

use bizmerge_core::{DataCategory, FieldValue, SemanticValue, SiteData};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::reconcile::{FieldReconciliation, Reconciler};

// ---------------------------------------------------------------------------
// Completeness weights
// ---------------------------------------------------------------------------

/// Weight of each required field: `business_name`, `phone`, `email`, `address`.
pub const W_REQUIRED: u32 = 2;
/// Weight of each optional field: `description`, `hours`, `products`, `services`.
pub const W_OPTIONAL: u32 = 1;

pub const REQUIRED_FIELDS: [&str; 4] = ["business_name", "phone", "email", "address"];
pub const OPTIONAL_FIELDS: [&str; 4] = ["description", "hours", "products", "services"];

/// Sum of every weight; a record carrying all fields scores exactly 1.0.
#[allow(clippy::cast_possible_truncation)]
pub const MAX_COMPLETENESS_WEIGHT: u32 =
    W_REQUIRED * REQUIRED_FIELDS.len() as u32 + W_OPTIONAL * OPTIONAL_FIELDS.len() as u32;

// Required fields must always outweigh optional ones.
const _: () = assert!(
    W_REQUIRED > W_OPTIONAL && MAX_COMPLETENESS_WEIGHT == 12,
    "completeness weights changed without updating the maximum"
);

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Flatten site data into per-field value lists, preserving input order.
#[must_use]
pub fn group_by_field(site_data: &[SiteData]) -> BTreeMap<String, Vec<FieldValue>> {
    let mut grouped: BTreeMap<String, Vec<FieldValue>> = BTreeMap::new();
    for data in site_data {
        for (name, value) in &data.fields {
            grouped
                .entry(name.clone())
                .or_default()
                .push(field_value(data, value.clone()));
        }
    }
    grouped
}

fn field_value(data: &SiteData, value: SemanticValue) -> FieldValue {
    FieldValue {
        value,
        site_id: data.id,
        location_id: data.location_id,
        category: data.category.clone(),
        confidence: data.confidence_score,
        extracted_at: data.created_at,
    }
}

/// Reconcile every field across all sites and categories.
///
/// This is the path both engines take to the overall consistency score.
///
/// # Errors
///
/// Returns [`EngineError::Cancelled`] if `cancel` fires between fields.
pub fn reconcile_by_field(
    reconciler: &Reconciler,
    site_data: &[SiteData],
    cancel: &CancellationToken,
) -> Result<Vec<FieldReconciliation>, EngineError> {
    let mut results = Vec::new();
    for (name, values) in group_by_field(site_data) {
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }
        let category = values
            .first()
            .map_or_else(|| DataCategory::Other("general".to_string()), |v| v.category.clone());
        results.push(reconciler.reconcile(&name, &category, values));
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

/// Mean field score weighted by how many values each field had.
///
/// 1.0 when there is nothing to compare.
#[must_use]
pub fn weighted_consistency(fields: &[FieldReconciliation]) -> f64 {
    let total: usize = fields.iter().map(|f| f.value_count).sum();
    if total == 0 {
        return 1.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let weighted: f64 = fields
        .iter()
        .map(|f| f.score * f.value_count as f64)
        .sum::<f64>()
        / total as f64;
    weighted
}

/// Weighted share of the well-known fields present in at least one site.
#[must_use]
pub fn completeness_score(site_data: &[SiteData]) -> f64 {
    let present = |name: &str| {
        site_data
            .iter()
            .any(|d| d.fields.get(name).is_some_and(|v| !v.is_empty()))
    };

    let mut earned = 0;
    for name in REQUIRED_FIELDS {
        if present(name) {
            earned += W_REQUIRED;
        }
    }
    for name in OPTIONAL_FIELDS {
        if present(name) {
            earned += W_OPTIONAL;
        }
    }

    (f64::from(earned) / f64::from(MAX_COMPLETENESS_WEIGHT)).min(1.0)
}

/// Mean over sites of the average of data-quality and confidence.
///
/// Scores outside [0, 1] are clamped and logged; 0.0 for no sites.
#[must_use]
pub fn quality_score(site_data: &[SiteData]) -> f64 {
    if site_data.is_empty() {
        return 0.0;
    }
    let sum: f64 = site_data
        .iter()
        .map(|d| {
            let quality = clamp_score(d.data_quality_score);
            let confidence = clamp_score(d.confidence_score);
            if quality.to_bits() != d.data_quality_score.to_bits()
                || confidence.to_bits() != d.confidence_score.to_bits()
            {
                tracing::warn!(
                    site_id = %d.id,
                    data_quality = d.data_quality_score,
                    confidence = d.confidence_score,
                    "site scores clamped into [0, 1]"
                );
            }
            (quality + confidence) / 2.0
        })
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = sum / site_data.len() as f64;
    mean
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
