//! Listing service: ownership rules and image handling on top of a store.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ListingService                          │
//! │  create(): validate → upload files → insert                  │
//! │  update(): load → owner? → validate → keep + upload → update │
//! │  delete(): load → owner? → delete                            │
//! └──────────────┬────────────────────────────┬──────────────────┘
//!                ▼                            ▼
//!         ┌──────────────┐             ┌───────────────┐
//!         │ ListingStore │             │ ImageUploader │
//!         └──────────────┘             └───────────────┘
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ListingError;
use crate::upload::{upload_all, ImageUploader};

use super::model::{Listing, ListingChanges, ListingForm, NewListing};
use super::store::ListingStore;

/// Orchestrates listing operations for an authenticated or anonymous caller.
///
/// # Type Parameters
///
/// * `S` - The listing store (e.g. MongoDB-backed)
/// * `U` - The image uploader (e.g. Cloudinary)
pub struct ListingService<S, U> {
    store: Arc<S>,
    uploader: Arc<U>,
}

impl<S, U> ListingService<S, U>
where
    S: ListingStore,
    U: ImageUploader,
{
    pub fn new(store: S, uploader: U) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(uploader))
    }

    /// Build a service over handles that are also used elsewhere.
    pub fn with_shared(store: Arc<S>, uploader: Arc<U>) -> Self {
        Self { store, uploader }
    }

    pub async fn list_all(&self) -> Result<Vec<Listing>, ListingError> {
        Ok(self.store.list_all().await?)
    }

    /// Listings owned by `owner_id`.
    ///
    /// Any authenticated caller may ask for any owner's listings.
    pub async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>, ListingError> {
        Ok(self.store.list_by_owner(owner_id).await?)
    }

    pub async fn get(&self, id: &str) -> Result<Listing, ListingError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ListingError::NotFound { id: id.to_string() })
    }

    /// Create a listing owned by `caller_id`.
    ///
    /// `existing_images` on the form is ignored: a new listing only carries
    /// what was uploaded with it.
    pub async fn create(
        &self,
        caller_id: &str,
        form: ListingForm,
    ) -> Result<Listing, ListingError> {
        form.validate()?;

        let images = upload_all(self.uploader.as_ref(), &form.images).await?;
        let listing = self
            .store
            .insert(NewListing {
                title: form.title,
                description: form.description,
                images,
                tags: form.tags,
                owner_id: caller_id.to_string(),
            })
            .await?;

        info!(
            listing_id = %listing.id,
            owner = caller_id,
            images = listing.images.len(),
            "Created listing"
        );
        Ok(listing)
    }

    /// Replace title, description, tags and images of a listing.
    ///
    /// The new image list is `existing_images` followed by the freshly
    /// uploaded URLs. A missing listing or a foreign owner is reported
    /// before any problem with the form, and nothing is uploaded unless the
    /// caller owns the listing.
    pub async fn update(
        &self,
        caller_id: &str,
        id: &str,
        form: ListingForm,
    ) -> Result<Listing, ListingError> {
        self.owned_listing(caller_id, id).await?;
        form.validate()?;

        let mut images = form.existing_images;
        images.extend(upload_all(self.uploader.as_ref(), &form.images).await?);

        let changes = ListingChanges {
            title: form.title,
            description: form.description,
            images,
            tags: form.tags,
        };
        let listing = self
            .store
            .update(id, changes)
            .await?
            .ok_or_else(|| ListingError::NotFound { id: id.to_string() })?;

        info!(listing_id = %listing.id, owner = caller_id, "Updated listing");
        Ok(listing)
    }

    /// Delete a listing owned by `caller_id`.
    pub async fn delete(&self, caller_id: &str, id: &str) -> Result<(), ListingError> {
        self.owned_listing(caller_id, id).await?;

        if !self.store.delete(id).await? {
            return Err(ListingError::NotFound { id: id.to_string() });
        }

        info!(listing_id = id, owner = caller_id, "Deleted listing");
        Ok(())
    }

    /// Load a listing and check that `caller_id` owns it.
    async fn owned_listing(&self, caller_id: &str, id: &str) -> Result<Listing, ListingError> {
        let listing = self.get(id).await?;
        if !listing.is_owned_by(caller_id) {
            warn!(
                listing_id = id,
                caller = caller_id,
                owner = %listing.owner.id,
                "Rejected mutation by non-owner"
            );
            return Err(ListingError::Forbidden { id: id.to_string() });
        }
        debug!(listing_id = id, caller = caller_id, "Ownership confirmed");
        Ok(listing)
    }
}
