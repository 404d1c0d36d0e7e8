//! Typed field values reported by a site.
//!
//! Extraction produces open-ended key/value content. Rather than carrying it
//! around as an untyped JSON blob, every field value is a [`SemanticValue`],
//! which lets normalization and comparison match exhaustively on shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One field value as reported by a single site.
///
/// Serialized untagged, so `"text"`, `42`, `["a", "b"]` and `{"k": "v"}`
/// in JSON or YAML map directly onto the matching variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum SemanticValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<SemanticValue>),
    Map(BTreeMap<String, SemanticValue>),
}

impl SemanticValue {
    /// `true` for null, blank text, and empty lists or maps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// `true` when every number nested anywhere in the value is finite.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match self {
            Self::Number(n) => n.is_finite(),
            Self::List(items) => items.iter().all(Self::is_well_formed),
            Self::Map(entries) => entries.values().all(Self::is_well_formed),
            Self::Null | Self::Bool(_) | Self::Text(_) => true,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[SemanticValue]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<&str> for SemanticValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for SemanticValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for SemanticValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for SemanticValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<SemanticValue>> From<Vec<T>> for SemanticValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Human-readable rendering: text as written, lists comma-separated, maps
/// as `key: value` pairs in key order.
impl fmt::Display for SemanticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{}", s.trim()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Self::Map(entries) => {
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                Ok(())
            }
        }
    }
}
