//! Representative-value selection.
//!
//! The reconciler asks a [`SelectionStrategy`] which of the contributing
//! values stands for the field in the merged record. Strategies only ever see
//! non-empty, well-formed values.

use std::fmt::Debug;
use std::sync::Arc;

use bizmerge_core::{FieldValue, SelectionPolicy};

pub trait SelectionStrategy: Send + Sync + Debug {
    /// Stable name recorded as the aggregate's `aggregation_method`.
    fn name(&self) -> &'static str;

    /// Index into `candidates` of the chosen value, `None` when empty.
    fn select(&self, candidates: &[&FieldValue]) -> Option<usize>;
}

/// The first value in input order. Confidence plays no part.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstNonEmpty;

impl SelectionStrategy for FirstNonEmpty {
    fn name(&self) -> &'static str {
        "first_non_empty"
    }

    fn select(&self, candidates: &[&FieldValue]) -> Option<usize> {
        if candidates.is_empty() {
            None
        } else {
            Some(0)
        }
    }
}

/// The value with the highest extractor confidence; ties keep input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighestConfidence;

impl SelectionStrategy for HighestConfidence {
    fn name(&self) -> &'static str {
        "highest_confidence"
    }

    fn select(&self, candidates: &[&FieldValue]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            let confidence = if candidate.confidence.is_nan() {
                0.0
            } else {
                candidate.confidence
            };
            match best {
                Some((_, current)) if confidence <= current => {}
                _ => best = Some((idx, confidence)),
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// The most recently extracted value; ties keep input order.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostRecent;

impl SelectionStrategy for MostRecent {
    fn name(&self) -> &'static str {
        "most_recent"
    }

    fn select(&self, candidates: &[&FieldValue]) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (idx, candidate) in candidates.iter().enumerate() {
            match best {
                Some(current) if candidate.extracted_at <= candidates[current].extracted_at => {}
                _ => best = Some(idx),
            }
        }
        best
    }
}

#[must_use]
pub fn strategy_for(policy: SelectionPolicy) -> Arc<dyn SelectionStrategy> {
    match policy {
        SelectionPolicy::FirstNonEmpty => Arc::new(FirstNonEmpty),
        SelectionPolicy::HighestConfidence => Arc::new(HighestConfidence),
        SelectionPolicy::MostRecent => Arc::new(MostRecent),
    }
}
