//! Default single-site validator.

use std::sync::LazyLock;

use async_trait::async_trait;
use bizmerge_core::{SemanticValue, SiteData};
use regex::Regex;

use crate::extract::{ExtractionError, SiteDataValidation, SiteDataValidator};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex")
});

// Digits with the usual separators, optional leading `+` and extension.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9(][0-9 ()./-]{5,}[0-9](\s*(x|ext\.?)\s*[0-9]+)?$")
        .expect("valid phone regex")
});

/// Rejects records with out-of-range scores, no fields, malformed email or
/// phone text, or non-finite numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleBasedValidator;

impl RuleBasedValidator {
    #[must_use]
    pub fn check(data: &SiteData) -> SiteDataValidation {
        let mut errors = Vec::new();

        for (name, score) in [
            ("confidence_score", data.confidence_score),
            ("data_quality_score", data.data_quality_score),
        ] {
            if !(0.0..=1.0).contains(&score) {
                errors.push(format!("{name} {score} is outside [0, 1]"));
            }
        }

        if data.fields.is_empty() {
            errors.push("record has no fields".to_string());
        }

        for (name, value) in &data.fields {
            if !value.is_well_formed() {
                errors.push(format!("field '{name}' contains a non-finite number"));
                continue;
            }
            if let SemanticValue::Text(text) = value {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                match name.as_str() {
                    "email" if !EMAIL_RE.is_match(text) => {
                        errors.push(format!("field 'email' is not an email address: {text}"));
                    }
                    "phone" if !PHONE_RE.is_match(text) => {
                        errors.push(format!("field 'phone' is not a phone number: {text}"));
                    }
                    _ => {}
                }
            }
        }

        SiteDataValidation::from_errors(errors)
    }
}

#[async_trait]
impl SiteDataValidator for RuleBasedValidator {
    async fn validate_data(&self, data: &SiteData) -> Result<SiteDataValidation, ExtractionError> {
        Ok(Self::check(data))
    }
}
