//! Web presences of a business.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::region::country_name;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Verified,
    Failed,
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationStatus::Pending => write!(f, "pending"),
            VerificationStatus::Verified => write!(f, "verified"),
            VerificationStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One web presence (URL) of a business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessLocation {
    pub id: Uuid,
    pub business_id: String,
    pub url: String,
    /// Registrable domain, e.g. `example.com`.
    pub domain: String,
    /// Host labels left of `domain`, e.g. `de` or `shop.eu`.
    pub subdomain: Option<String>,
    pub path: String,
    /// Upper-case region code, e.g. `DE`.
    pub region: String,
    /// Lower-case language code, e.g. `de`.
    pub language: String,
    pub country: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller input for registering a web presence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBusinessLocation {
    pub business_id: String,
    pub url: String,
    pub region: String,
    pub language: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl BusinessLocation {
    /// Build a location from caller input, deriving domain parts from the
    /// URL and the country name from the region code.
    ///
    /// Scheme-less input such as `example.de/shop` is treated as `https://`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingBusinessId`] for a blank business id and
    /// [`CoreError::InvalidUrl`] if the URL does not parse or has no host.
    pub fn new(input: NewBusinessLocation) -> Result<Self, CoreError> {
        let business_id = input.business_id.trim().to_string();
        if business_id.is_empty() {
            return Err(CoreError::MissingBusinessId);
        }

        let parts = UrlParts::parse(&input.url)?;
        let region = input.region.trim().to_uppercase();
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            business_id,
            url: parts.url,
            domain: parts.domain,
            subdomain: parts.subdomain,
            path: parts.path,
            country: country_name(&region),
            region,
            language: input.language.trim().to_lowercase(),
            is_primary: input.is_primary,
            is_active: true,
            verification_status: VerificationStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Pieces derived from a location URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// Canonical URL string as re-serialized by the parser.
    pub url: String,
    pub domain: String,
    pub subdomain: Option<String>,
    pub path: String,
}

impl UrlParts {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUrl`] when the URL cannot be parsed or
    /// carries no host.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let invalid = |reason: String| CoreError::InvalidUrl {
            url: raw.to_string(),
            reason,
        };
        if raw.is_empty() {
            return Err(invalid("url is empty".to_string()));
        }

        let candidate = if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{raw}")
        };

        let url = Url::parse(&candidate).map_err(|e| invalid(e.to_string()))?;
        let host = url
            .host_str()
            .ok_or_else(|| invalid("url has no host".to_string()))?
            .to_lowercase();

        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        let keep = registrable_label_count(&labels);
        let (domain, subdomain) = if labels.len() > keep {
            let split = labels.len() - keep;
            (labels[split..].join("."), Some(labels[..split].join(".")))
        } else {
            (labels.join("."), None)
        };

        Ok(Self {
            path: url.path().to_string(),
            url: url.to_string(),
            domain,
            subdomain,
        })
    }
}

/// Second-level labels used under country-code TLDs, as in `co.uk`.
const CC_SECOND_LEVEL: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// How many trailing host labels make up the registrable domain.
fn registrable_label_count(labels: &[&str]) -> usize {
    match labels {
        [.., _, second, tld]
            if tld.len() == 2 && CC_SECOND_LEVEL.contains(second) =>
        {
            3
        }
        _ => 2,
    }
}
