use async_trait::async_trait;

use crate::error::StoreError;

use super::model::{Listing, ListingChanges, NewListing};

/// Persistence interface over the listing collection.
///
/// This abstraction lets the service run against MongoDB in production and
/// an in-memory double in tests. Ownership is not checked here; callers that
/// need it go through [`ListingService`](super::ListingService).
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Every listing, with the owner expanded to include the username.
    async fn list_all(&self) -> Result<Vec<Listing>, StoreError>;

    /// Listings whose owner equals `owner_id`. Owners are not expanded.
    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>, StoreError>;

    /// A single listing with the owner expanded, or `None` if absent.
    async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError>;

    /// Persist a new listing, assigning its id and timestamps.
    async fn insert(&self, listing: NewListing) -> Result<Listing, StoreError>;

    /// Replace the mutable fields of a listing and bump `updated_at`.
    ///
    /// Returns `None` if no listing has this id.
    async fn update(&self, id: &str, changes: ListingChanges)
        -> Result<Option<Listing>, StoreError>;

    /// Remove a listing. Returns whether anything was deleted.
    async fn delete(&self, id: &str) -> Result<bool, StoreError>;

    /// Round-trip to the backend to confirm it is reachable.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
