//! Aggregation and consistency validation of business site data.
//!
//! Both engines share the field reconciler in [`reconcile`] and the rollups
//! in [`scoring`].

pub mod aggregate;
pub mod consistency;
pub mod error;
pub mod integrity;
pub mod normalize;
pub mod reconcile;
pub mod scoring;
pub mod selection;

pub use aggregate::AggregationEngine;
pub use consistency::ConsistencyValidator;
pub use error::{EngineError, MalformedValue};
pub use normalize::{dedup_strings, display_value, normalize_value};
pub use reconcile::{FieldReconciliation, Reconciler};
pub use selection::{strategy_for, FirstNonEmpty, HighestConfidence, MostRecent, SelectionStrategy};
