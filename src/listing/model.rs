//! Listing entity and the inputs used to create or replace one.

use chrono::{DateTime, Utc};

use crate::error::ListingError;
use crate::upload::ImageData;

/// Maximum number of files accepted by a single create or update request.
pub const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Reference from a listing to the user that created it.
///
/// `username` is only filled in when the store expanded the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub username: Option<String>,
}

impl Owner {
    /// An unexpanded owner reference.
    pub fn id_only(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: None,
        }
    }
}

/// A stored car listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    /// Store-assigned identifier, immutable after creation
    pub id: String,
    pub title: String,
    pub description: String,
    /// Hosted image URLs in display order
    pub images: Vec<String>,
    pub tags: Vec<String>,
    /// Set once from the authenticated caller on creation
    pub owner: Owner,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    /// Whether `user_id` is the owner of this listing.
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner.id == user_id
    }
}

/// A listing about to be inserted. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub owner_id: String,
}

/// Fields replaced wholesale by an update. The owner is never part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingChanges {
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// Parsed create/update request body.
#[derive(Debug, Clone, Default)]
pub struct ListingForm {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Already-hosted URLs to keep, in order (ignored on create)
    pub existing_images: Vec<String>,
    /// New files to upload, in submission order
    pub images: Vec<ImageData>,
    /// First problem found while reading the body, reported by `validate`
    rejected: Option<ListingError>,
}

impl ListingForm {
    /// Record a body-level problem without failing the read.
    ///
    /// Only the first one is kept. It surfaces from [`validate`](Self::validate),
    /// so callers can check existence and ownership first.
    pub fn reject(&mut self, err: ListingError) {
        if self.rejected.is_none() {
            self.rejected = Some(err);
        }
    }

    /// Check required fields and limits before any side effect happens.
    pub fn validate(&self) -> Result<(), ListingError> {
        if let Some(err) = &self.rejected {
            return Err(err.clone());
        }
        if self.title.trim().is_empty() {
            return Err(ListingError::invalid("title", "must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(ListingError::invalid("description", "must not be empty"));
        }
        if self.images.len() > MAX_IMAGES_PER_REQUEST {
            return Err(ListingError::TooManyImages {
                count: self.images.len(),
                max: MAX_IMAGES_PER_REQUEST,
            });
        }
        if let Some(pos) = self.images.iter().position(|image| image.is_empty()) {
            return Err(ListingError::invalid(
                "images",
                format!("file #{} is empty", pos + 1),
            ));
        }
        if self.existing_images.iter().any(|url| url.trim().is_empty()) {
            return Err(ListingError::invalid(
                "existingImages",
                "entries must be non-empty URLs",
            ));
        }
        Ok(())
    }
}
