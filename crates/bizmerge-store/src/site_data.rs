//! Storage of `SiteData` records.
//!
//! Records are immutable once written: there is no update operation. A new
//! extraction pass writes a new record.

use std::collections::HashMap;

use async_trait::async_trait;
use bizmerge_core::SiteData;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::StoreError;

#[async_trait]
pub trait SiteDataStore: Send + Sync {
    /// Records extracted from one location, oldest first.
    ///
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn get_site_data_by_location_id(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<SiteData>, StoreError>;

    /// Every record of a business across all its locations, oldest first.
    ///
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn get_site_data_by_business_id(
        &self,
        business_id: &str,
    ) -> Result<Vec<SiteData>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id is already stored.
    async fn save_site_data(&self, data: SiteData) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is not stored.
    async fn delete_site_data(&self, id: Uuid) -> Result<(), StoreError>;

    /// Delete every record of one location in a single write and return how
    /// many were removed. Deleting from a location with no records is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn delete_site_data_by_location_id(
        &self,
        location_id: Uuid,
    ) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<Uuid, SiteData>,
    /// Insertion order per business and per location.
    by_business: HashMap<String, Vec<Uuid>>,
    by_location: HashMap<Uuid, Vec<Uuid>>,
}

impl Inner {
    fn collect(&self, ids: Option<&Vec<Uuid>>) -> Vec<SiteData> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.by_id.get(id).cloned())
                .collect()
        })
        .unwrap_or_default()
    }
}

fn remove_id<K: std::hash::Hash + Eq>(index: &mut HashMap<K, Vec<Uuid>>, key: &K, id: Uuid) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySiteDataStore {
    inner: RwLock<Inner>,
}

impl MemorySiteDataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SiteDataStore for MemorySiteDataStore {
    async fn get_site_data_by_location_id(
        &self,
        location_id: Uuid,
    ) -> Result<Vec<SiteData>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.collect(inner.by_location.get(&location_id)))
    }

    async fn get_site_data_by_business_id(
        &self,
        business_id: &str,
    ) -> Result<Vec<SiteData>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.collect(inner.by_business.get(business_id)))
    }

    async fn save_site_data(&self, data: SiteData) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&data.id) {
            return Err(StoreError::Duplicate {
                kind: "site data",
                id: data.id,
            });
        }
        inner
            .by_business
            .entry(data.business_id.clone())
            .or_default()
            .push(data.id);
        inner
            .by_location
            .entry(data.location_id)
            .or_default()
            .push(data.id);
        inner.by_id.insert(data.id, data);
        Ok(())
    }

    async fn delete_site_data(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::site_data_not_found(id))?;
        remove_id(&mut inner.by_business, &removed.business_id, id);
        remove_id(&mut inner.by_location, &removed.location_id, id);
        Ok(())
    }

    async fn delete_site_data_by_location_id(
        &self,
        location_id: Uuid,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(ids) = inner.by_location.remove(&location_id) else {
            return Ok(0);
        };
        for id in &ids {
            if let Some(removed) = inner.by_id.remove(id) {
                remove_id(&mut inner.by_business, &removed.business_id, *id);
            }
        }
        Ok(ids.len())
    }
}
