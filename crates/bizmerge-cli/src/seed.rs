//! Drives the service from the fixture file.
//!
//! Locations are registered through the service, and a fixture-backed
//! extractor replays each location's `sites` entries one per extraction.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bizmerge_core::{
    BusinessFixture, BusinessLocation, NewBusinessLocation, NewSiteData, SiteData, SiteFixture,
};
use bizmerge_service::{BusinessDataService, DataExtractor, ExtractionError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Debug, Default)]
pub(crate) struct FixtureExtractor {
    queued: Mutex<HashMap<Uuid, VecDeque<SiteFixture>>>,
}

impl FixtureExtractor {
    fn enqueue(&self, location_id: Uuid, sites: &[SiteFixture]) {
        if let Ok(mut queued) = self.queued.lock() {
            queued
                .entry(location_id)
                .or_default()
                .extend(sites.iter().cloned());
        }
    }
}

#[async_trait]
impl DataExtractor for FixtureExtractor {
    async fn extract_data(&self, location: &BusinessLocation) -> Result<SiteData, ExtractionError> {
        let next = self
            .queued
            .lock()
            .map_err(|_| ExtractionError::Failed {
                url: location.url.clone(),
                reason: "fixture queue poisoned".to_string(),
            })?
            .get_mut(&location.id)
            .and_then(VecDeque::pop_front);

        let site = next.ok_or_else(|| ExtractionError::Failed {
            url: location.url.clone(),
            reason: "no more fixture data for this location".to_string(),
        })?;

        Ok(SiteData::new(NewSiteData {
            location_id: location.id,
            business_id: location.business_id.clone(),
            category: site.category,
            fields: site.fields,
            confidence_score: site.confidence,
            extraction_method: site.extraction_method,
            data_quality_score: site.data_quality,
            ..NewSiteData::default()
        })?)
    }
}

/// Register every location of `business` and run one extraction per
/// fixture site. Rejected records are logged and skipped.
///
/// # Errors
///
/// Returns an error if a location cannot be registered or the run is
/// cancelled.
pub(crate) async fn seed_business(
    service: &BusinessDataService,
    extractor: &Arc<FixtureExtractor>,
    business: &BusinessFixture,
    cancel: &CancellationToken,
) -> anyhow::Result<usize> {
    let mut saved = 0;
    for fixture in &business.locations {
        let location = service
            .add_business_location(NewBusinessLocation {
                business_id: business.id.clone(),
                url: fixture.url.clone(),
                region: fixture.region.clone(),
                language: fixture.language.clone(),
                is_primary: fixture.primary,
            })
            .await?;
        extractor.enqueue(location.id, &fixture.sites);

        for _ in &fixture.sites {
            match service.extract_data_from_location(location.id, cancel).await {
                Ok(_) => saved += 1,
                Err(e) if e.is_cancelled() => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(
                        business_id = %business.id,
                        url = %location.url,
                        error = %e,
                        "skipping fixture site"
                    );
                }
            }
        }
    }

    tracing::info!(business_id = %business.id, saved, "fixtures seeded");
    Ok(saved)
}
