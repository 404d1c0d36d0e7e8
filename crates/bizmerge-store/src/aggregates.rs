use std::collections::HashMap;

use async_trait::async_trait;
use bizmerge_core::AggregatedBusinessData;
use tokio::sync::RwLock;

use crate::StoreError;

/// Latest aggregate per business. A save replaces whatever was stored for
/// the same business id: last write wins.
#[async_trait]
pub trait AggregateStore: Send + Sync {
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn save_aggregate(&self, aggregate: AggregatedBusinessData) -> Result<(), StoreError>;

    /// `None` when the business has never been aggregated.
    ///
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn get_aggregate(
        &self,
        business_id: &str,
    ) -> Result<Option<AggregatedBusinessData>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryAggregateStore {
    by_business: RwLock<HashMap<String, AggregatedBusinessData>>,
}

impl MemoryAggregateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AggregateStore for MemoryAggregateStore {
    async fn save_aggregate(&self, aggregate: AggregatedBusinessData) -> Result<(), StoreError> {
        let mut map = self.by_business.write().await;
        if let Some(previous) = map.insert(aggregate.business_id.clone(), aggregate) {
            tracing::debug!(
                business_id = %previous.business_id,
                superseded = %previous.id,
                "aggregate superseded"
            );
        }
        Ok(())
    }

    async fn get_aggregate(
        &self,
        business_id: &str,
    ) -> Result<Option<AggregatedBusinessData>, StoreError> {
        Ok(self.by_business.read().await.get(business_id).cloned())
    }
}
