use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::SemanticValue;
use crate::CoreError;

/// Semantic grouping of the fields extracted from one site.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DataCategory {
    ContactInfo,
    ProductCatalog,
    ServiceCatalog,
    BusinessDetails,
    Other(String),
}

impl DataCategory {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::ContactInfo => "contact_info",
            Self::ProductCatalog => "product_catalog",
            Self::ServiceCatalog => "service_catalog",
            Self::BusinessDetails => "business_details",
            Self::Other(name) => name.as_str(),
        }
    }

    /// Infer a category from which fields a record carries.
    ///
    /// Catalog fields win over contact fields, which win over descriptive
    /// fields. Records matching nothing land in `Other("general")`.
    #[must_use]
    pub fn infer(fields: &BTreeMap<String, SemanticValue>) -> Self {
        let has = |name: &str| fields.get(name).is_some_and(|v| !v.is_empty());

        if has("products") {
            Self::ProductCatalog
        } else if has("services") {
            Self::ServiceCatalog
        } else if has("phone") || has("email") || has("address") {
            Self::ContactInfo
        } else if has("business_name") || has("description") || has("hours") {
            Self::BusinessDetails
        } else {
            Self::Other("general".to_string())
        }
    }

    /// Fields a category is expected to carry at least one of.
    ///
    /// Caller-defined categories have no expectations.
    #[must_use]
    pub fn expected_fields(&self) -> &'static [&'static str] {
        match self {
            Self::ContactInfo => &["phone", "email", "address"],
            Self::ProductCatalog => &["products"],
            Self::ServiceCatalog => &["services"],
            Self::BusinessDetails => &["business_name", "description", "hours"],
            Self::Other(_) => &[],
        }
    }
}

impl From<String> for DataCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "contact_info" => Self::ContactInfo,
            "product_catalog" => Self::ProductCatalog,
            "service_catalog" => Self::ServiceCatalog,
            "business_details" => Self::BusinessDetails,
            _ => Self::Other(value),
        }
    }
}

impl From<DataCategory> for String {
    fn from(value: DataCategory) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One category of field values extracted from one location at one point
/// in time. Immutable once created; a new extraction produces a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteData {
    pub id: Uuid,
    pub location_id: Uuid,
    pub business_id: String,
    pub category: DataCategory,
    pub fields: BTreeMap<String, SemanticValue>,
    /// Extractor confidence in [0, 1].
    pub confidence_score: f64,
    pub extraction_method: String,
    /// Data-quality score in [0, 1].
    pub data_quality_score: f64,
    pub is_valid: bool,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`SiteData::new`].
#[derive(Debug, Clone, Default)]
pub struct NewSiteData {
    pub location_id: Uuid,
    pub business_id: String,
    /// Inferred from `fields` when `None`.
    pub category: Option<DataCategory>,
    pub fields: BTreeMap<String, SemanticValue>,
    pub confidence_score: f64,
    pub extraction_method: String,
    pub data_quality_score: f64,
    pub metadata: BTreeMap<String, String>,
}

impl SiteData {
    /// Build a new record, inferring the category when absent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ScoreOutOfRange`] if either score lies outside
    /// `[0, 1]` (NaN included).
    pub fn new(input: NewSiteData) -> Result<Self, CoreError> {
        check_unit_interval("confidence_score", input.confidence_score)?;
        check_unit_interval("data_quality_score", input.data_quality_score)?;

        let category = input
            .category
            .unwrap_or_else(|| DataCategory::infer(&input.fields));
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            location_id: input.location_id,
            business_id: input.business_id,
            category,
            fields: input.fields,
            confidence_score: input.confidence_score,
            extraction_method: input.extraction_method,
            data_quality_score: input.data_quality_score,
            is_valid: true,
            metadata: input.metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

fn check_unit_interval(field: &'static str, value: f64) -> Result<(), CoreError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::ScoreOutOfRange { field, value })
    }
}
