use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bizmerge_core::{DataCategory, IssueType, NewSiteData, SemanticValue};

use super::*;
use crate::extract::ExtractionError;
use crate::rules::RuleBasedValidator;

/// Hands out queued field maps per URL, one per call.
#[derive(Default)]
struct QueueExtractor {
    queued: Mutex<HashMap<String, VecDeque<Vec<(&'static str, SemanticValue)>>>>,
}

impl QueueExtractor {
    fn push(&self, url: &str, fields: Vec<(&'static str, SemanticValue)>) {
        self.queued
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(fields);
    }
}

#[async_trait]
impl DataExtractor for QueueExtractor {
    async fn extract_data(&self, location: &BusinessLocation) -> Result<SiteData, ExtractionError> {
        let next = self
            .queued
            .lock()
            .unwrap()
            .get_mut(&location.url)
            .and_then(VecDeque::pop_front);
        let Some(fields) = next else {
            return Err(ExtractionError::Failed {
                url: location.url.clone(),
                reason: "site unreachable".to_string(),
            });
        };
        Ok(SiteData::new(NewSiteData {
            location_id: location.id,
            business_id: location.business_id.clone(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<BTreeMap<_, _>>(),
            confidence_score: 0.9,
            data_quality_score: 0.8,
            extraction_method: "queue".to_string(),
            ..NewSiteData::default()
        })?)
    }
}

/// Never finishes.
struct HangingExtractor;

#[async_trait]
impl DataExtractor for HangingExtractor {
    async fn extract_data(&self, _location: &BusinessLocation) -> Result<SiteData, ExtractionError> {
        std::future::pending().await
    }
}

/// Returns a fixed record once `release` is notified.
#[derive(Default)]
struct GatedExtractor {
    release: tokio::sync::Notify,
}

#[async_trait]
impl DataExtractor for GatedExtractor {
    async fn extract_data(&self, location: &BusinessLocation) -> Result<SiteData, ExtractionError> {
        self.release.notified().await;
        Ok(SiteData::new(NewSiteData {
            location_id: location.id,
            business_id: location.business_id.clone(),
            fields: BTreeMap::from([("phone".to_string(), "+1-555-123-4567".into())]),
            confidence_score: 0.9,
            data_quality_score: 0.8,
            extraction_method: "gated".to_string(),
            ..NewSiteData::default()
        })?)
    }
}

fn service(extractor: Arc<dyn DataExtractor>) -> BusinessDataService {
    BusinessDataService::new(
        ServiceStores::in_memory(),
        extractor,
        Arc::new(RuleBasedValidator),
    )
}

fn new_location(url: &str, primary: bool) -> NewBusinessLocation {
    NewBusinessLocation {
        business_id: "sample-business".to_string(),
        url: url.to_string(),
        region: "us".to_string(),
        language: "en".to_string(),
        is_primary: primary,
    }
}

async fn seeded() -> (BusinessDataService, Vec<BusinessLocation>) {
    let extractor = Arc::new(QueueExtractor::default());
    let svc = service(extractor.clone());

    let us = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();
    let de = svc
        .add_business_location(new_location("https://de.sample-business.com/kontakt", false))
        .await
        .unwrap();

    extractor.push(
        &us.url,
        vec![
            ("business_name", "Sample Business".into()),
            ("phone", "+1-555-123-4567".into()),
        ],
    );
    extractor.push(
        &de.url,
        vec![
            ("business_name", "Sample Business".into()),
            ("phone", "+1-555-999-9999".into()),
        ],
    );
    let token = CancellationToken::new();
    svc.extract_data_from_location(us.id, &token).await.unwrap();
    svc.extract_data_from_location(de.id, &token).await.unwrap();

    (svc, vec![us, de])
}

#[tokio::test]
async fn add_location_derives_parts() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let location = svc
        .add_business_location(NewBusinessLocation {
            region: "de".to_string(),
            language: "DE".to_string(),
            ..new_location("de.sample-business.com/kontakt", false)
        })
        .await
        .unwrap();

    assert_eq!(location.domain, "sample-business.com");
    assert_eq!(location.subdomain.as_deref(), Some("de"));
    assert_eq!(location.path, "/kontakt");
    assert_eq!(location.region, "DE");
    assert_eq!(location.language, "de");
    assert_eq!(location.country, "Germany");
}

#[tokio::test]
async fn bad_location_input_is_rejected() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let err = svc
        .add_business_location(NewBusinessLocation {
            business_id: " ".to_string(),
            ..new_location("https://www.sample-business.com", false)
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Core(_)));
}

#[tokio::test]
async fn second_primary_demotes_first() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let first = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();
    let second = svc
        .add_business_location(new_location("https://sample-business.co.uk", true))
        .await
        .unwrap();

    let primaries: Vec<Uuid> = svc
        .list_business_locations("sample-business")
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.is_primary)
        .map(|l| l.id)
        .collect();
    assert_eq!(primaries, vec![second.id]);

    svc.set_primary_location(first.id).await.unwrap();
    let primaries: Vec<Uuid> = svc
        .list_business_locations("sample-business")
        .await
        .unwrap()
        .into_iter()
        .filter(|l| l.is_primary)
        .map(|l| l.id)
        .collect();
    assert_eq!(primaries, vec![first.id]);
}

#[tokio::test]
async fn verification_status_is_persisted() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let location = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();

    svc.update_verification_status(location.id, VerificationStatus::Verified)
        .await
        .unwrap();
    let stored = svc.list_business_locations("sample-business").await.unwrap();
    assert_eq!(stored[0].verification_status, VerificationStatus::Verified);
}

#[tokio::test]
async fn extraction_persists_validated_record() {
    let (svc, locations) = seeded().await;
    let stored = svc
        .stores
        .site_data
        .get_site_data_by_location_id(locations[0].id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category, DataCategory::ContactInfo);
}

#[tokio::test]
async fn rejected_record_is_not_persisted() {
    let extractor = Arc::new(QueueExtractor::default());
    let svc = service(extractor.clone());
    let location = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();
    extractor.push(&location.url, vec![("email", "not-an-email".into())]);

    let err = svc
        .extract_data_from_location(location.id, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidSiteData { ref errors, .. } if errors.len() == 1));
    assert!(svc
        .stores
        .site_data
        .get_site_data_by_business_id("sample-business")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancelled_extraction_returns_promptly() {
    let svc = service(Arc::new(HangingExtractor));
    let location = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = svc
        .extract_data_from_location(location.id, &token)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn bulk_extraction_reports_failures_without_aborting() {
    let extractor = Arc::new(QueueExtractor::default());
    let svc = service(extractor.clone());
    let mut urls = Vec::new();
    for (n, url) in [
        "https://www.sample-business.com",
        "https://de.sample-business.com",
        "https://sample-business.co.uk",
    ]
    .into_iter()
    .enumerate()
    {
        let location = svc
            .add_business_location(new_location(url, n == 0))
            .await
            .unwrap();
        urls.push(location.url);
    }
    extractor.push(&urls[0], vec![("phone", "+1-555-123-4567".into())]);
    extractor.push(&urls[2], vec![("phone", "+44 20 7946 0000".into())]);

    let summary = svc
        .extract_all_locations("sample-business", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.saved.len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].url, urls[1]);
}

#[tokio::test]
async fn bulk_extraction_needs_locations() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let err = svc
        .extract_all_locations("sample-business", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Engine(EngineError::NoLocations { .. })));
}

#[tokio::test]
async fn aggregate_then_get_returns_latest() {
    let (svc, locations) = seeded().await;
    let token = CancellationToken::new();

    let first = svc
        .aggregate_business_data("sample-business", &token)
        .await
        .unwrap();
    let second = svc
        .aggregate_business_data("sample-business", &token)
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let stored = svc.get_aggregated_data("sample-business").await.unwrap();
    assert_eq!(stored.id, second.id);
    assert_eq!(stored.primary_location.map(|l| l.id), Some(locations[0].id));

    let phone_conflicts = stored
        .consistency_issues
        .iter()
        .filter(|i| i.field_name == "phone" && i.issue_type == IssueType::Conflict)
        .count();
    assert_eq!(phone_conflicts, 1);
}

#[tokio::test]
async fn missing_aggregate_is_an_error() {
    let svc = service(Arc::new(QueueExtractor::default()));
    let err = svc.get_aggregated_data("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::AggregateNotFound { .. }));

    let err = svc.validate_data_integrity("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::AggregateNotFound { .. }));
}

#[tokio::test]
async fn aggregating_without_data_fails_and_stores_nothing() {
    let svc = service(Arc::new(QueueExtractor::default()));
    svc.add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();

    let err = svc
        .aggregate_business_data("sample-business", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Engine(EngineError::EmptyInput { .. })));
    assert!(svc.get_aggregated_data("sample-business").await.is_err());
}

#[tokio::test]
async fn validation_matches_stored_aggregate() {
    let (svc, _) = seeded().await;
    let token = CancellationToken::new();
    let aggregate = svc
        .aggregate_business_data("sample-business", &token)
        .await
        .unwrap();
    let validated = svc
        .validate_consistency("sample-business", &token)
        .await
        .unwrap();
    assert!((aggregate.consistency_score - validated.overall_score).abs() < f64::EPSILON);

    let integrity = svc.validate_data_integrity("sample-business").await.unwrap();
    assert!(integrity.is_valid);
    assert_eq!(integrity.warnings.len(), 1);
}

#[tokio::test]
async fn field_validation_reports_not_found() {
    let (svc, _) = seeded().await;
    let err = svc
        .validate_field_consistency("sample-business", "fax", &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Engine(EngineError::FieldNotFound { .. })));
}

#[tokio::test]
async fn removing_location_drops_its_site_data() {
    let (svc, locations) = seeded().await;
    svc.remove_business_location(locations[1].id).await.unwrap();

    let remaining = svc
        .stores
        .site_data
        .get_site_data_by_business_id("sample-business")
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].location_id, locations[0].id);
    assert_eq!(
        svc.list_business_locations("sample-business").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn removing_twice_fails_without_side_effects() {
    let (svc, locations) = seeded().await;
    svc.remove_business_location(locations[1].id).await.unwrap();

    let err = svc
        .remove_business_location(locations[1].id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Store(bizmerge_store::StoreError::NotFound { .. })
    ));
    let remaining = svc
        .stores
        .site_data
        .get_site_data_by_business_id("sample-business")
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
}

#[tokio::test]
async fn extraction_finishing_after_removal_leaves_no_record() {
    let extractor = Arc::new(GatedExtractor::default());
    let svc = service(extractor.clone());
    let location = svc
        .add_business_location(new_location("https://www.sample-business.com", true))
        .await
        .unwrap();
    let token = CancellationToken::new();

    let (extracted, removed) = tokio::join!(
        svc.extract_data_from_location(location.id, &token),
        async {
            let removed = svc.remove_business_location(location.id).await;
            extractor.release.notify_one();
            removed
        }
    );

    removed.unwrap();
    assert!(matches!(
        extracted.unwrap_err(),
        ServiceError::Store(bizmerge_store::StoreError::NotFound { .. })
    ));
    assert!(svc
        .stores
        .site_data
        .get_site_data_by_location_id(location.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn configured_policy_flows_into_aggregation_method() {
    let (svc, _) = seeded().await;
    let config = AppConfig {
        env: bizmerge_core::Environment::Test,
        log_level: "info".to_string(),
        fixtures_path: "./config/businesses.yaml".into(),
        reconcile: bizmerge_core::ReconcileSettings::default(),
        levels: bizmerge_core::LevelThresholds::default(),
        integrity: bizmerge_core::IntegritySettings::default(),
        selection_policy: bizmerge_core::SelectionPolicy::HighestConfidence,
        max_concurrent_extractions: 2,
    };
    let svc = svc.with_config(&config);
    let aggregate = svc
        .aggregate_business_data("sample-business", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(aggregate.aggregation_method, "highest_confidence");
}
