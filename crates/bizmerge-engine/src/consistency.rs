//! On-demand consistency validation against the stores.

use std::collections::HashSet;
use std::sync::Arc;

use bizmerge_core::{
    AggregatedBusinessData, ConsistencyLevel, ConsistencyValidationResult, DataIntegrityResult,
    FieldConsistencyResult, IntegritySettings, LevelThresholds,
};
use bizmerge_store::{LocationStore, SiteDataStore};
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::EngineError;
use crate::integrity::audit;
use crate::reconcile::{FieldReconciliation, Reconciler};
use crate::scoring::{group_by_field, reconcile_by_field, weighted_consistency};

/// Re-derives consistency from stored site data and audits aggregates.
///
/// Scores go through the same reconciler and rollup as
/// [`crate::AggregationEngine`], so for the same site data both report the
/// same overall consistency.
#[derive(Clone)]
pub struct ConsistencyValidator {
    locations: Arc<dyn LocationStore>,
    site_data: Arc<dyn SiteDataStore>,
    reconciler: Reconciler,
    levels: LevelThresholds,
    integrity: IntegritySettings,
}

impl std::fmt::Debug for ConsistencyValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyValidator")
            .field("reconciler", &self.reconciler)
            .field("levels", &self.levels)
            .field("integrity", &self.integrity)
            .finish_non_exhaustive()
    }
}

impl ConsistencyValidator {
    #[must_use]
    pub fn new(locations: Arc<dyn LocationStore>, site_data: Arc<dyn SiteDataStore>) -> Self {
        Self {
            locations,
            site_data,
            reconciler: Reconciler::default(),
            levels: LevelThresholds::default(),
            integrity: IntegritySettings::default(),
        }
    }

    #[must_use]
    pub fn with_reconciler(mut self, reconciler: Reconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    #[must_use]
    pub fn with_levels(mut self, levels: LevelThresholds) -> Self {
        self.levels = levels;
        self
    }

    #[must_use]
    pub fn with_integrity(mut self, integrity: IntegritySettings) -> Self {
        self.integrity = integrity;
        self
    }

    /// Score every field of a business across all of its sites.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NoLocations`] when the business has no locations.
    /// - [`EngineError::NoSiteData`] when it has locations but no data.
    /// - [`EngineError::Cancelled`] when `cancel` fires between fields.
    /// - [`EngineError::Store`] when a store read fails.
    pub async fn validate_consistency(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ConsistencyValidationResult, EngineError> {
        let locations = self.locations.get_locations_by_business_id(business_id).await?;
        if locations.is_empty() {
            return Err(EngineError::NoLocations {
                business_id: business_id.to_string(),
            });
        }

        let site_data = self.site_data.get_site_data_by_business_id(business_id).await?;
        if site_data.is_empty() {
            return Err(EngineError::NoSiteData {
                business_id: business_id.to_string(),
            });
        }

        let fields = reconcile_by_field(&self.reconciler, &site_data, cancel)?;
        let overall_score = weighted_consistency(&fields);
        let site_count = site_data
            .iter()
            .map(|d| d.location_id)
            .collect::<HashSet<Uuid>>()
            .len();

        let field_results: Vec<FieldConsistencyResult> =
            fields.into_iter().map(|f| self.field_result(f)).collect();
        let issues = field_results
            .iter()
            .flat_map(|r| r.issues.iter().cloned())
            .collect::<Vec<_>>();

        tracing::info!(
            business_id,
            sites = site_count,
            fields = field_results.len(),
            score = overall_score,
            issues = issues.len(),
            "consistency validated"
        );

        Ok(ConsistencyValidationResult {
            business_id: business_id.to_string(),
            site_count,
            overall_score,
            level: ConsistencyLevel::from_score(overall_score, &self.levels),
            field_results,
            issues,
            validated_at: Utc::now(),
        })
    }

    /// Score one field of a business across all of its sites.
    ///
    /// # Errors
    ///
    /// - [`EngineError::FieldNotFound`] when no site data mentions the field.
    /// - [`EngineError::Cancelled`] when `cancel` has fired.
    /// - [`EngineError::Store`] when a store read fails.
    pub async fn validate_field_consistency(
        &self,
        business_id: &str,
        field_name: &str,
        cancel: &CancellationToken,
    ) -> Result<FieldConsistencyResult, EngineError> {
        let site_data = self.site_data.get_site_data_by_business_id(business_id).await?;
        let Some(values) = group_by_field(&site_data).remove(field_name) else {
            return Err(EngineError::FieldNotFound {
                business_id: business_id.to_string(),
                field_name: field_name.to_string(),
            });
        };
        if cancel.is_cancelled() {
            return Err(EngineError::Cancelled);
        }

        let category = values[0].category.clone();
        let result = self.reconciler.reconcile(field_name, &category, values);
        Ok(self.field_result(result))
    }

    /// Audit a previously produced aggregate. Does not touch the stores.
    #[must_use]
    pub fn validate_data_integrity(&self, aggregate: &AggregatedBusinessData) -> DataIntegrityResult {
        let result = audit(aggregate, &self.integrity);
        if !result.is_valid {
            tracing::warn!(
                business_id = %aggregate.business_id,
                score = result.integrity_score,
                issues = result.issues.len(),
                warnings = result.warnings.len(),
                "aggregate failed integrity audit"
            );
        }
        result
    }

    /// URL of a location.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Store`] when the location does not exist.
    pub async fn location_url(&self, location_id: Uuid) -> Result<String, EngineError> {
        Ok(self.locations.get_location(location_id).await?.url)
    }

    fn field_result(&self, reconciled: FieldReconciliation) -> FieldConsistencyResult {
        FieldConsistencyResult {
            level: ConsistencyLevel::from_score(reconciled.score, &self.levels),
            is_consistent: reconciled.issues.is_empty(),
            field_name: reconciled.field_name,
            score: reconciled.score,
            values: reconciled.values,
            issues: reconciled.issues,
        }
    }
}

#[cfg(test)]
#[path = "consistency_test.rs"]
mod tests;
