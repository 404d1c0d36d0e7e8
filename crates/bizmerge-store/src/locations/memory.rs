use std::collections::HashMap;

use async_trait::async_trait;
use bizmerge_core::BusinessLocation;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::LocationStore;
use crate::StoreError;

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<Uuid, BusinessLocation>,
    /// Location ids per business, in registration order.
    by_business: HashMap<String, Vec<Uuid>>,
}

impl Inner {
    /// Clear `is_primary` on every other location of `business_id`.
    fn demote_others(&mut self, business_id: &str, keep: Uuid) {
        let Some(ids) = self.by_business.get(business_id) else {
            return;
        };
        let now = Utc::now();
        for id in ids {
            if *id == keep {
                continue;
            }
            if let Some(other) = self.by_id.get_mut(id) {
                if other.is_primary {
                    other.is_primary = false;
                    other.updated_at = now;
                    tracing::debug!(
                        business_id,
                        demoted = %other.id,
                        promoted = %keep,
                        "primary location demoted"
                    );
                }
            }
        }
    }

    fn unindex(&mut self, business_id: &str, id: Uuid) {
        if let Some(ids) = self.by_business.get_mut(business_id) {
            ids.retain(|existing| *existing != id);
            if ids.is_empty() {
                self.by_business.remove(business_id);
            }
        }
    }
}

/// Location store backed by a `RwLock`ed map: concurrent readers, one writer.
///
/// Primary demotion happens under the same write guard as the save or
/// update that triggered it, so two racing promotions cannot both stick.
#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    inner: RwLock<Inner>,
}

impl MemoryLocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn get_location(&self, id: Uuid) -> Result<BusinessLocation, StoreError> {
        let inner = self.inner.read().await;
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::location_not_found(id))
    }

    async fn get_locations_by_business_id(
        &self,
        business_id: &str,
    ) -> Result<Vec<BusinessLocation>, StoreError> {
        let inner = self.inner.read().await;
        let locations = inner
            .by_business
            .get(business_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.by_id.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        Ok(locations)
    }

    async fn save_location(&self, location: BusinessLocation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_id.contains_key(&location.id) {
            return Err(StoreError::Duplicate {
                kind: "location",
                id: location.id,
            });
        }

        if location.is_primary {
            inner.demote_others(&location.business_id, location.id);
        }
        inner
            .by_business
            .entry(location.business_id.clone())
            .or_default()
            .push(location.id);
        inner.by_id.insert(location.id, location);
        Ok(())
    }

    async fn update_location(&self, mut location: BusinessLocation) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let previous_business = match inner.by_id.get(&location.id) {
            Some(existing) => existing.business_id.clone(),
            None => return Err(StoreError::location_not_found(location.id)),
        };

        if previous_business != location.business_id {
            inner.unindex(&previous_business, location.id);
            inner
                .by_business
                .entry(location.business_id.clone())
                .or_default()
                .push(location.id);
        }

        if location.is_primary {
            inner.demote_others(&location.business_id, location.id);
        }
        location.updated_at = Utc::now();
        inner.by_id.insert(location.id, location);
        Ok(())
    }

    async fn delete_location(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .by_id
            .remove(&id)
            .ok_or_else(|| StoreError::location_not_found(id))?;
        inner.unindex(&removed.business_id, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bizmerge_core::NewBusinessLocation;

    use super::*;

    fn location(business_id: &str, url: &str, primary: bool) -> BusinessLocation {
        BusinessLocation::new(NewBusinessLocation {
            business_id: business_id.to_string(),
            url: url.to_string(),
            region: "us".to_string(),
            language: "en".to_string(),
            is_primary: primary,
        })
        .unwrap()
    }

    async fn primaries(store: &MemoryLocationStore, business_id: &str) -> Vec<Uuid> {
        store
            .get_locations_by_business_id(business_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|l| l.is_primary)
            .map(|l| l.id)
            .collect()
    }

    #[tokio::test]
    async fn save_then_get_round_trips() {
        let store = MemoryLocationStore::new();
        let loc = location("biz-1", "https://a.example.com", false);
        store.save_location(loc.clone()).await.unwrap();
        assert_eq!(store.get_location(loc.id).await.unwrap(), loc);
    }

    #[tokio::test]
    async fn save_rejects_duplicate_id() {
        let store = MemoryLocationStore::new();
        let loc = location("biz-1", "https://a.example.com", false);
        store.save_location(loc.clone()).await.unwrap();
        let err = store.save_location(loc.clone()).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Duplicate {
                kind: "location",
                id: loc.id
            }
        );
    }

    #[tokio::test]
    async fn locations_come_back_in_registration_order() {
        let store = MemoryLocationStore::new();
        let urls = ["https://a.example.com", "https://b.example.com", "https://c.example.com"];
        let mut ids = Vec::new();
        for url in urls {
            let loc = location("biz-1", url, false);
            ids.push(loc.id);
            store.save_location(loc).await.unwrap();
        }
        let listed: Vec<Uuid> = store
            .get_locations_by_business_id("biz-1")
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(listed, ids);
        assert!(store
            .get_locations_by_business_id("unknown")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn saving_new_primary_demotes_previous() {
        let store = MemoryLocationStore::new();
        let first = location("biz-1", "https://a.example.com", true);
        let second = location("biz-1", "https://b.example.com", true);
        let other_business = location("biz-2", "https://other.example.com", true);

        store.save_location(first.clone()).await.unwrap();
        store.save_location(other_business.clone()).await.unwrap();
        store.save_location(second.clone()).await.unwrap();

        assert_eq!(primaries(&store, "biz-1").await, vec![second.id]);
        assert!(!store.get_location(first.id).await.unwrap().is_primary);
        assert_eq!(primaries(&store, "biz-2").await, vec![other_business.id]);
    }

    #[tokio::test]
    async fn update_to_primary_demotes_previous() {
        let store = MemoryLocationStore::new();
        let first = location("biz-1", "https://a.example.com", true);
        let mut second = location("biz-1", "https://b.example.com", false);
        store.save_location(first.clone()).await.unwrap();
        store.save_location(second.clone()).await.unwrap();

        second.is_primary = true;
        store.update_location(second.clone()).await.unwrap();

        assert_eq!(primaries(&store, "biz-1").await, vec![second.id]);
    }

    #[tokio::test]
    async fn primary_stays_unique_across_adds_and_promotions() {
        let store = MemoryLocationStore::new();
        let mut locations = Vec::new();
        for (url, primary) in [
            ("https://a.example.com", false),
            ("https://b.example.com", false),
        ] {
            let loc = location("biz-1", url, primary);
            store.save_location(loc.clone()).await.unwrap();
            locations.push(loc);
        }
        assert!(primaries(&store, "biz-1").await.is_empty());

        let flagged = location("biz-1", "https://c.example.com", true);
        store.save_location(flagged.clone()).await.unwrap();
        assert_eq!(primaries(&store, "biz-1").await, vec![flagged.id]);

        for mut loc in locations {
            loc.is_primary = true;
            store.update_location(loc.clone()).await.unwrap();
            assert_eq!(primaries(&store, "biz-1").await, vec![loc.id]);
        }

        let late = location("biz-1", "https://d.example.com", false);
        store.save_location(late).await.unwrap();
        assert_eq!(primaries(&store, "biz-1").await.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_unknown_id_fail() {
        let store = MemoryLocationStore::new();
        let loc = location("biz-1", "https://a.example.com", false);
        assert_eq!(
            store.update_location(loc.clone()).await.unwrap_err(),
            StoreError::location_not_found(loc.id)
        );
        assert_eq!(
            store.delete_location(loc.id).await.unwrap_err(),
            StoreError::location_not_found(loc.id)
        );
    }

    #[tokio::test]
    async fn delete_removes_from_business_listing() {
        let store = MemoryLocationStore::new();
        let loc = location("biz-1", "https://a.example.com", false);
        store.save_location(loc.clone()).await.unwrap();
        store.delete_location(loc.id).await.unwrap();
        assert!(store
            .get_locations_by_business_id("biz-1")
            .await
            .unwrap()
            .is_empty());
        assert!(store.get_location(loc.id).await.is_err());
    }

    #[tokio::test]
    async fn update_can_move_location_between_businesses() {
        let store = MemoryLocationStore::new();
        let mut loc = location("biz-1", "https://a.example.com", false);
        store.save_location(loc.clone()).await.unwrap();

        loc.business_id = "biz-2".to_string();
        store.update_location(loc.clone()).await.unwrap();

        assert!(store
            .get_locations_by_business_id("biz-1")
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            store.get_locations_by_business_id("biz-2").await.unwrap().len(),
            1
        );
    }
}
