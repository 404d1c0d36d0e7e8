use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::issues::DataConsistencyIssue;
use crate::location::BusinessLocation;
use crate::site_data::{DataCategory, SiteData};
use crate::value::SemanticValue;

/// Field name -> representative value for one category.
pub type MergedFields = BTreeMap<String, SemanticValue>;

/// The reconciled record for one business.
///
/// This is the hand-off artifact for downstream consumers: merged fields and
/// consistency issues are self-contained, so nothing needs to reach back into
/// raw site data. A new aggregation run supersedes it rather than patching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedBusinessData {
    pub id: Uuid,
    pub business_id: String,
    pub business_name: String,
    pub primary_location: Option<BusinessLocation>,
    pub locations: Vec<BusinessLocation>,
    pub merged_data: BTreeMap<DataCategory, MergedFields>,
    pub consistency_score: f64,
    pub completeness_score: f64,
    pub quality_score: f64,
    /// Contributing records keyed by location id.
    pub site_data: BTreeMap<Uuid, Vec<SiteData>>,
    pub consistency_issues: Vec<DataConsistencyIssue>,
    pub aggregation_method: String,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AggregatedBusinessData {
    /// Look up a merged field in a category.
    #[must_use]
    pub fn field(&self, category: &DataCategory, name: &str) -> Option<&SemanticValue> {
        self.merged_data.get(category)?.get(name)
    }

    /// Total number of contributing site data records.
    #[must_use]
    pub fn site_data_count(&self) -> usize {
        self.site_data.values().map(Vec::len).sum()
    }
}
