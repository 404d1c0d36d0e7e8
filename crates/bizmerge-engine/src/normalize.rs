//! Canonical and display renderings of field values.

use std::collections::HashSet;

use bizmerge_core::SemanticValue;

use crate::error::MalformedValue;

/// Render a value into the canonical comparison key.
///
/// Text is trimmed, lower-cased, and has internal whitespace collapsed.
/// Lists keep their order; maps render in key order. Empty values (null,
/// blank text, empty collections) render as the empty string.
///
/// # Errors
///
/// Returns [`MalformedValue::NonFiniteNumber`] if a NaN or infinite number
/// appears anywhere in the value.
pub fn normalize_value(value: &SemanticValue) -> Result<String, MalformedValue> {
    match value {
        SemanticValue::Null => Ok(String::new()),
        SemanticValue::Bool(b) => Ok(b.to_string()),
        SemanticValue::Number(n) => normalize_number(*n),
        SemanticValue::Text(s) => Ok(collapse_whitespace(&s.to_lowercase())),
        SemanticValue::List(items) => {
            if items.is_empty() {
                return Ok(String::new());
            }
            let parts = items
                .iter()
                .map(normalize_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("[{}]", parts.join(",")))
        }
        SemanticValue::Map(entries) => {
            if entries.is_empty() {
                return Ok(String::new());
            }
            let parts = entries
                .iter()
                .map(|(k, v)| {
                    let key = collapse_whitespace(&k.to_lowercase());
                    Ok(format!("{key}:{}", normalize_value(v)?))
                })
                .collect::<Result<Vec<_>, MalformedValue>>()?;
            Ok(format!("{{{}}}", parts.join(",")))
        }
    }
}

fn normalize_number(n: f64) -> Result<String, MalformedValue> {
    if !n.is_finite() {
        return Err(MalformedValue::NonFiniteNumber(n));
    }
    // -0.0 and 0.0 must compare equal.
    if n == 0.0 {
        return Ok("0".to_string());
    }
    Ok(n.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable rendering used in issue descriptions and reports.
#[must_use]
pub fn display_value(value: &SemanticValue) -> String {
    value.to_string()
}

/// Remove repeated strings, keeping the first occurrence of each.
#[must_use]
pub fn dedup_strings(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
