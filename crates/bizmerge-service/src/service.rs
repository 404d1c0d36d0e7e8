//! Caller-facing orchestration over the stores, collaborators and engines.

use std::sync::Arc;

use bizmerge_core::{
    AggregatedBusinessData, AppConfig, BusinessLocation, ConsistencyValidationResult,
    DataIntegrityResult, FieldConsistencyResult, NewBusinessLocation, SiteData,
    VerificationStatus,
};
use bizmerge_engine::{AggregationEngine, ConsistencyValidator, EngineError, Reconciler};
use bizmerge_store::{
    AggregateStore, LocationStore, MemoryAggregateStore, MemoryLocationStore,
    MemorySiteDataStore, SiteDataStore,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::extract::{DataExtractor, SiteDataValidator};

const DEFAULT_MAX_CONCURRENT_EXTRACTIONS: usize = 4;

/// The three stores the service reads and writes.
#[derive(Clone)]
pub struct ServiceStores {
    pub locations: Arc<dyn LocationStore>,
    pub site_data: Arc<dyn SiteDataStore>,
    pub aggregates: Arc<dyn AggregateStore>,
}

impl ServiceStores {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            locations: Arc::new(MemoryLocationStore::new()),
            site_data: Arc::new(MemorySiteDataStore::new()),
            aggregates: Arc::new(MemoryAggregateStore::new()),
        }
    }
}

/// Result of [`BusinessDataService::extract_all_locations`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionRunSummary {
    pub business_id: String,
    pub attempted: usize,
    /// Ids of the site data records persisted by this run.
    pub saved: Vec<Uuid>,
    pub failures: Vec<LocationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationFailure {
    pub location_id: Uuid,
    pub url: String,
    pub error: String,
}

#[derive(Clone)]
pub struct BusinessDataService {
    stores: ServiceStores,
    extractor: Arc<dyn DataExtractor>,
    validator: Arc<dyn SiteDataValidator>,
    engine: AggregationEngine,
    consistency: ConsistencyValidator,
    max_concurrent_extractions: usize,
}

impl BusinessDataService {
    /// Service with default reconciliation settings.
    #[must_use]
    pub fn new(
        stores: ServiceStores,
        extractor: Arc<dyn DataExtractor>,
        validator: Arc<dyn SiteDataValidator>,
    ) -> Self {
        let consistency =
            ConsistencyValidator::new(Arc::clone(&stores.locations), Arc::clone(&stores.site_data));
        Self {
            stores,
            extractor,
            validator,
            engine: AggregationEngine::default(),
            consistency,
            max_concurrent_extractions: DEFAULT_MAX_CONCURRENT_EXTRACTIONS,
        }
    }

    /// Apply thresholds, selection policy and fan-out from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        let reconciler = Reconciler::with_policy(config.reconcile, config.selection_policy);
        self.engine = AggregationEngine::new(reconciler.clone());
        self.consistency = self
            .consistency
            .with_reconciler(reconciler)
            .with_levels(config.levels)
            .with_integrity(config.integrity);
        self.max_concurrent_extractions = config.max_concurrent_extractions.max(1);
        self
    }

    // -----------------------------------------------------------------------
    // Locations
    // -----------------------------------------------------------------------

    /// Register a location. Marking it primary demotes the previous primary.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Core`] for a blank business id or a bad URL.
    pub async fn add_business_location(
        &self,
        input: NewBusinessLocation,
    ) -> Result<BusinessLocation, ServiceError> {
        let location = BusinessLocation::new(input)?;
        self.stores.locations.save_location(location.clone()).await?;
        tracing::info!(
            business_id = %location.business_id,
            location_id = %location.id,
            url = %location.url,
            primary = location.is_primary,
            "location added"
        );
        Ok(location)
    }

    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn list_business_locations(
        &self,
        business_id: &str,
    ) -> Result<Vec<BusinessLocation>, ServiceError> {
        Ok(self
            .stores
            .locations
            .get_locations_by_business_id(business_id)
            .await?)
    }

    /// Promote a location to primary, demoting its business's current one.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the location does not exist.
    pub async fn set_primary_location(
        &self,
        location_id: Uuid,
    ) -> Result<BusinessLocation, ServiceError> {
        let mut location = self.stores.locations.get_location(location_id).await?;
        location.is_primary = true;
        location.updated_at = Utc::now();
        self.stores.locations.update_location(location.clone()).await?;
        tracing::info!(
            business_id = %location.business_id,
            location_id = %location.id,
            "primary location changed"
        );
        Ok(location)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the location does not exist.
    pub async fn update_verification_status(
        &self,
        location_id: Uuid,
        status: VerificationStatus,
    ) -> Result<BusinessLocation, ServiceError> {
        let mut location = self.stores.locations.get_location(location_id).await?;
        location.verification_status = status;
        location.updated_at = Utc::now();
        self.stores.locations.update_location(location.clone()).await?;
        Ok(location)
    }

    /// Remove a location together with all site data extracted from it.
    ///
    /// The location goes first, so a concurrent remove fails before touching
    /// any record and a concurrent extraction can no longer look it up. The
    /// records are then purged in one store write.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Store`] if the location does not exist.
    pub async fn remove_business_location(&self, location_id: Uuid) -> Result<(), ServiceError> {
        let location = self.stores.locations.get_location(location_id).await?;
        self.stores.locations.delete_location(location_id).await?;
        let site_data_removed = self
            .stores
            .site_data
            .delete_site_data_by_location_id(location_id)
            .await?;
        tracing::info!(
            business_id = %location.business_id,
            location_id = %location_id,
            site_data_removed,
            "location removed"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Extraction
    // -----------------------------------------------------------------------

    /// Extract, validate and persist one record for a location.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::InvalidSiteData`] when the validator rejects the
    ///   record; nothing is persisted.
    /// - [`ServiceError::Cancelled`] when `cancel` fires first.
    /// - [`ServiceError::Extraction`] / [`ServiceError::Store`] otherwise.
    pub async fn extract_data_from_location(
        &self,
        location_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<SiteData, ServiceError> {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }
        let location = self.stores.locations.get_location(location_id).await?;

        let mut data = tokio::select! {
            () = cancel.cancelled() => return Err(ServiceError::Cancelled),
            result = self.extractor.extract_data(&location) => result?,
        };
        if data.location_id != location.id || data.business_id != location.business_id {
            tracing::debug!(
                location_id = %location.id,
                "re-keying extracted record to its source location"
            );
            data.location_id = location.id;
            data.business_id.clone_from(&location.business_id);
        }

        let validation = self.validator.validate_data(&data).await?;
        if !validation.is_valid {
            tracing::warn!(
                business_id = %location.business_id,
                location_id = %location.id,
                errors = ?validation.errors,
                "extracted site data rejected"
            );
            return Err(ServiceError::InvalidSiteData {
                location_id,
                errors: validation.errors,
            });
        }

        self.stores.site_data.save_site_data(data.clone()).await?;
        // A remove that ran while the extractor was busy has already purged
        // this location's records; drop the one we just wrote.
        if let Err(e) = self.stores.locations.get_location(location_id).await {
            tracing::warn!(
                location_id = %location_id,
                site_id = %data.id,
                "location removed during extraction, discarding record"
            );
            self.stores.site_data.delete_site_data(data.id).await?;
            return Err(e.into());
        }
        tracing::info!(
            business_id = %data.business_id,
            location_id = %data.location_id,
            site_id = %data.id,
            category = %data.category,
            fields = data.fields.len(),
            "site data extracted"
        );
        Ok(data)
    }

    /// Extract once from every active location of a business, at most
    /// `max_concurrent_extractions` at a time.
    ///
    /// Per-location failures are collected into the summary.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NoLocations`] when the business has no active
    ///   locations.
    /// - [`ServiceError::Cancelled`] when `cancel` fired during the run.
    pub async fn extract_all_locations(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractionRunSummary, ServiceError> {
        let locations: Vec<BusinessLocation> = self
            .list_business_locations(business_id)
            .await?
            .into_iter()
            .filter(|l| l.is_active)
            .collect();
        if locations.is_empty() {
            return Err(EngineError::NoLocations {
                business_id: business_id.to_string(),
            }
            .into());
        }

        let results: Vec<(&BusinessLocation, Result<SiteData, ServiceError>)> =
            stream::iter(&locations)
                .map(|location| async move {
                    (location, self.extract_data_from_location(location.id, cancel).await)
                })
                .buffer_unordered(self.max_concurrent_extractions)
                .collect()
                .await;

        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }

        let mut summary = ExtractionRunSummary {
            business_id: business_id.to_string(),
            attempted: locations.len(),
            ..ExtractionRunSummary::default()
        };
        for (location, result) in results {
            match result {
                Ok(data) => summary.saved.push(data.id),
                Err(e) => {
                    tracing::warn!(
                        business_id,
                        location_id = %location.id,
                        url = %location.url,
                        error = %e,
                        "extraction failed for location"
                    );
                    summary.failures.push(LocationFailure {
                        location_id: location.id,
                        url: location.url.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            business_id,
            attempted = summary.attempted,
            saved = summary.saved.len(),
            failed = summary.failures.len(),
            "extraction run finished"
        );
        Ok(summary)
    }

    // -----------------------------------------------------------------------
    // Aggregation and validation
    // -----------------------------------------------------------------------

    /// Aggregate a business from a snapshot of its stored data and persist
    /// the result, superseding any earlier aggregate.
    ///
    /// # Errors
    ///
    /// - [`EngineError::EmptyInput`] when the business has no site data.
    /// - [`EngineError::Cancelled`] when `cancel` fires mid-run; nothing is
    ///   persisted.
    pub async fn aggregate_business_data(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<AggregatedBusinessData, ServiceError> {
        let locations = self
            .stores
            .locations
            .get_locations_by_business_id(business_id)
            .await?;
        let site_data = self
            .stores
            .site_data
            .get_site_data_by_business_id(business_id)
            .await?;

        let aggregate = self
            .engine
            .aggregate(business_id, &locations, &site_data, cancel)?;
        self.stores.aggregates.save_aggregate(aggregate.clone()).await?;
        Ok(aggregate)
    }

    /// # Errors
    ///
    /// Returns [`ServiceError::AggregateNotFound`] if the business was never
    /// aggregated.
    pub async fn get_aggregated_data(
        &self,
        business_id: &str,
    ) -> Result<AggregatedBusinessData, ServiceError> {
        self.stores
            .aggregates
            .get_aggregate(business_id)
            .await?
            .ok_or_else(|| ServiceError::AggregateNotFound {
                business_id: business_id.to_string(),
            })
    }

    /// # Errors
    ///
    /// See [`ConsistencyValidator::validate_consistency`].
    pub async fn validate_consistency(
        &self,
        business_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ConsistencyValidationResult, ServiceError> {
        Ok(self
            .consistency
            .validate_consistency(business_id, cancel)
            .await?)
    }

    /// # Errors
    ///
    /// See [`ConsistencyValidator::validate_field_consistency`].
    pub async fn validate_field_consistency(
        &self,
        business_id: &str,
        field_name: &str,
        cancel: &CancellationToken,
    ) -> Result<FieldConsistencyResult, ServiceError> {
        Ok(self
            .consistency
            .validate_field_consistency(business_id, field_name, cancel)
            .await?)
    }

    /// Audit the most recently stored aggregate of a business.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::AggregateNotFound`] if the business was never
    /// aggregated.
    pub async fn validate_data_integrity(
        &self,
        business_id: &str,
    ) -> Result<DataIntegrityResult, ServiceError> {
        let aggregate = self.get_aggregated_data(business_id).await?;
        Ok(self.consistency.validate_data_integrity(&aggregate))
    }
}

#[cfg(test)]
#[path = "service_test.rs"]
mod tests;
