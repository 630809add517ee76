//! Listings: the car records this service manages.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │             ListingService              │
//! │   (ownership checks, image uploads)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │           ListingStore Trait            │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          MongoListingStore              │
//! │   (`cars` collection, `users` lookup)   │
//! └─────────────────────────────────────────┘
//! ```

mod model;
mod mongo;
mod service;
mod store;

pub use model::{
    Listing, ListingChanges, ListingForm, NewListing, Owner, MAX_IMAGES_PER_REQUEST,
};
pub use mongo::{MongoListingStore, LISTINGS_COLLECTION, USERS_COLLECTION};
pub use service::ListingService;
pub use store::ListingStore;
