//! # Car Listings
//!
//! A CRUD backend for car listings. Listings live in MongoDB, their photos on
//! Cloudinary, and mutations are restricted to the listing's owner as named
//! by an HS256 bearer token.
//!
//! ## Architecture
//!
//! - [`listing`] - Listing model, store trait, MongoDB store and service
//! - [`upload`] - Image data and the Cloudinary upload client
//! - [`server`] - Axum handlers, bearer auth, multipart parsing and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - Error types for each layer
//!
//! ## Example
//!
//! ```rust,no_run
//! use car_listings::{create_router, CloudinaryConfig, CloudinaryUploader};
//! use car_listings::{ListingService, MongoListingStore, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoListingStore::connect("mongodb://localhost:27017/cars", "test").await?;
//!     let uploader = CloudinaryUploader::new(CloudinaryConfig::new("demo", "key", "secret"));
//!     let router = create_router(
//!         ListingService::new(store, uploader),
//!         RouterConfig::new("jwt-secret"),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod listing;
pub mod server;
pub mod upload;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, ServeConfig, TokenConfig};
pub use error::{ListingError, StoreError, UploadError};
pub use listing::{
    Listing, ListingChanges, ListingForm, ListingService, ListingStore, MongoListingStore,
    NewListing, Owner, MAX_IMAGES_PER_REQUEST,
};
pub use server::{
    create_router, AppState, AuthError, AuthUser, Claims, ErrorResponse, HealthResponse, JwtAuth,
    ListingResponse, RouterConfig,
};
pub use upload::{upload_all, CloudinaryConfig, CloudinaryUploader, ImageData, ImageUploader};
