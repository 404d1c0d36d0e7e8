//! Merges per-site records into one [`AggregatedBusinessData`].

use std::collections::{BTreeMap, BTreeSet};

use bizmerge_core::{AggregatedBusinessData, BusinessLocation, DataCategory, MergedFields, SiteData};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::EngineError;
use crate::normalize::display_value;
use crate::reconcile::{FieldReconciliation, Reconciler};
use crate::scoring::{completeness_score, quality_score, reconcile_by_field, weighted_consistency};

/// Pure aggregation over a snapshot of locations and site data.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    reconciler: Reconciler,
}

impl AggregationEngine {
    #[must_use]
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    #[must_use]
    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Build the aggregate for `business_id`.
    ///
    /// Records flagged invalid are merged anyway and logged. Nothing is
    /// persisted here.
    ///
    /// # Errors
    ///
    /// - [`EngineError::EmptyInput`] when `site_data` is empty.
    /// - [`EngineError::Cancelled`] when `cancel` fires between fields.
    pub fn aggregate(
        &self,
        business_id: &str,
        locations: &[BusinessLocation],
        site_data: &[SiteData],
        cancel: &CancellationToken,
    ) -> Result<AggregatedBusinessData, EngineError> {
        if site_data.is_empty() {
            return Err(EngineError::EmptyInput {
                business_id: business_id.to_string(),
            });
        }

        for data in site_data.iter().filter(|d| !d.is_valid) {
            tracing::warn!(
                business_id,
                site_id = %data.id,
                location_id = %data.location_id,
                "merging site data that failed validation"
            );
        }

        let fields = reconcile_by_field(&self.reconciler, site_data, cancel)?;
        let consistency_score = weighted_consistency(&fields);
        let merged_data = merge_by_category(site_data, &fields);
        let consistency_issues: Vec<_> = fields.into_iter().flat_map(|f| f.issues).collect();
        let completeness_score = completeness_score(site_data);
        let quality_score = quality_score(site_data);

        let business_name =
            merged_business_name(&merged_data).unwrap_or_else(|| business_id.to_string());
        let primary_location = locations
            .iter()
            .find(|l| l.is_primary)
            .or_else(|| locations.iter().find(|l| l.is_active))
            .cloned();

        let mut by_location: BTreeMap<Uuid, Vec<SiteData>> = BTreeMap::new();
        for data in site_data {
            by_location
                .entry(data.location_id)
                .or_default()
                .push(data.clone());
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("location_count".to_string(), locations.len().to_string());
        metadata.insert("site_data_count".to_string(), site_data.len().to_string());
        metadata.insert("category_count".to_string(), merged_data.len().to_string());

        tracing::info!(
            business_id,
            sites = site_data.len(),
            consistency = consistency_score,
            completeness = completeness_score,
            quality = quality_score,
            issues = consistency_issues.len(),
            "business aggregated"
        );

        let now = Utc::now();
        Ok(AggregatedBusinessData {
            id: Uuid::new_v4(),
            business_id: business_id.to_string(),
            business_name,
            primary_location,
            locations: locations.to_vec(),
            merged_data,
            consistency_score,
            completeness_score,
            quality_score,
            site_data: by_location,
            consistency_issues,
            aggregation_method: self.reconciler.strategy_name().to_string(),
            metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

/// File each field's representative under every category that reported the
/// field. A field is reconciled once across categories, so the same value
/// lands in each of them. Categories whose fields were all empty stay present
/// with no entries.
fn merge_by_category(
    site_data: &[SiteData],
    fields: &[FieldReconciliation],
) -> BTreeMap<DataCategory, MergedFields> {
    let mut merged: BTreeMap<DataCategory, MergedFields> = site_data
        .iter()
        .map(|d| (d.category.clone(), MergedFields::new()))
        .collect();

    for field in fields {
        let Some(value) = &field.representative else {
            continue;
        };
        let categories: BTreeSet<&DataCategory> =
            field.values.iter().map(|v| &v.category).collect();
        for category in categories {
            merged
                .entry(category.clone())
                .or_default()
                .insert(field.field_name.clone(), value.clone());
        }
    }
    merged
}

/// The merged `business_name`, preferring the business-details category.
fn merged_business_name(merged: &BTreeMap<DataCategory, MergedFields>) -> Option<String> {
    merged
        .get(&DataCategory::BusinessDetails)
        .and_then(|fields| fields.get("business_name"))
        .or_else(|| merged.values().find_map(|fields| fields.get("business_name")))
        .map(display_value)
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
