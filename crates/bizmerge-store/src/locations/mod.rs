//! Storage of `BusinessLocation` records.

mod memory;

use async_trait::async_trait;
use bizmerge_core::BusinessLocation;
use uuid::Uuid;

use crate::StoreError;

pub use memory::MemoryLocationStore;

/// Key-addressable store of business locations.
///
/// Implementations must keep at most one primary location per business:
/// saving or updating a location with `is_primary` set clears the flag on
/// every other location of the same business within the same write.
///
/// Once a business has a primary, any sequence of saves and updates that
/// sets the flag leaves exactly one. The store never picks a primary on its
/// own: a business registered without one has none, and neither deleting the
/// primary nor an update that clears its flag promotes another location.
/// Readers that need one fall back to the first active location.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no location has this id.
    async fn get_location(&self, id: Uuid) -> Result<BusinessLocation, StoreError>;

    /// All locations of a business in registration order. Empty when the
    /// business has none.
    ///
    /// # Errors
    ///
    /// Backend-specific; the in-memory store never fails here.
    async fn get_locations_by_business_id(
        &self,
        business_id: &str,
    ) -> Result<Vec<BusinessLocation>, StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::Duplicate`] if the id is already stored.
    async fn save_location(&self, location: BusinessLocation) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is not stored.
    async fn update_location(&self, location: BusinessLocation) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the id is not stored.
    async fn delete_location(&self, id: Uuid) -> Result<(), StoreError>;
}
