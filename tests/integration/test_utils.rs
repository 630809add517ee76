//! Test utilities for integration tests.
//!
//! This module provides in-memory implementations of the listing store and
//! the image uploader, plus helpers for building authenticated multipart
//! requests against the router.

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower::ServiceExt;

use car_listings::error::{StoreError, UploadError};
use car_listings::listing::{
    Listing, ListingChanges, ListingService, ListingStore, NewListing, Owner,
};
use car_listings::server::{create_router, JwtAuth, RouterConfig};
use car_listings::upload::{ImageData, ImageUploader};

pub const TEST_SECRET: &str = "test-secret-key-for-jwt-signing";

/// Owner ids shaped like MongoDB ObjectIds.
pub const ALICE: &str = "64b7f0c2a1b2c3d4e5f60001";
pub const BOB: &str = "64b7f0c2a1b2c3d4e5f60002";
pub const CAROL: &str = "64b7f0c2a1b2c3d4e5f60003";

/// Id that is well-formed but belongs to no listing.
pub const MISSING_ID: &str = "64b7f0c2a1b2c3d4e5f6ffff";

// =============================================================================
// In-memory Listing Store
// =============================================================================

fn is_object_id(id: &str) -> bool {
    id.len() == 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}

/// Listing store kept in memory, in insertion order.
///
/// Ids are 24-hex-digit strings; malformed ids never match, mirroring the
/// MongoDB store.
pub struct MemoryListingStore {
    listings: RwLock<Vec<Listing>>,
    usernames: RwLock<HashMap<String, String>>,
    next_id: AtomicUsize,
    mutations: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryListingStore {
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(Vec::new()),
            usernames: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            mutations: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Register a username for an owner id, used when expanding owners.
    pub async fn add_user(&self, id: &str, username: &str) {
        self.usernames
            .write()
            .await
            .insert(id.to_string(), username.to_string());
    }

    /// Insert a listing directly, bypassing the service.
    pub async fn seed(&self, title: &str, owner_id: &str, images: &[&str]) -> Listing {
        let listing = self.build(NewListing {
            title: title.to_string(),
            description: format!("{} description", title),
            images: images.iter().map(|s| s.to_string()).collect(),
            tags: vec!["seeded".to_string()],
            owner_id: owner_id.to_string(),
        });
        self.listings.write().await.push(listing.clone());
        listing
    }

    /// Snapshot of the stored listings, without owner expansion.
    pub async fn snapshot(&self) -> Vec<Listing> {
        self.listings.read().await.clone()
    }

    /// Number of successful insert/update/delete calls.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    /// Make every following call fail with a database error.
    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(StoreError::Database("connection reset".to_string()))
        } else {
            Ok(())
        }
    }

    fn build(&self, new: NewListing) -> Listing {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        Listing {
            id: format!("{:024x}", n),
            title: new.title,
            description: new.description,
            images: new.images,
            tags: new.tags,
            owner: Owner::id_only(new.owner_id),
            created_at: now,
            updated_at: now,
        }
    }

    async fn expand(&self, mut listing: Listing) -> Listing {
        listing.owner.username = self.usernames.read().await.get(&listing.owner.id).cloned();
        listing
    }
}

impl Default for MemoryListingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingStore for MemoryListingStore {
    async fn list_all(&self) -> Result<Vec<Listing>, StoreError> {
        self.check()?;
        let listings = self.snapshot().await;
        let mut expanded = Vec::with_capacity(listings.len());
        for listing in listings {
            expanded.push(self.expand(listing).await);
        }
        Ok(expanded)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Listing>, StoreError> {
        self.check()?;
        Ok(self
            .listings
            .read()
            .await
            .iter()
            .filter(|l| l.owner.id == owner_id)
            .cloned()
            .collect())
    }

    async fn get(&self, id: &str) -> Result<Option<Listing>, StoreError> {
        self.check()?;
        if !is_object_id(id) {
            return Ok(None);
        }
        let found = self
            .listings
            .read()
            .await
            .iter()
            .find(|l| l.id == id)
            .cloned();
        match found {
            Some(listing) => Ok(Some(self.expand(listing).await)),
            None => Ok(None),
        }
    }

    async fn insert(&self, listing: NewListing) -> Result<Listing, StoreError> {
        self.check()?;
        if !is_object_id(&listing.owner_id) {
            return Err(StoreError::InvalidId(listing.owner_id));
        }
        let listing = self.build(listing);
        self.listings.write().await.push(listing.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(listing)
    }

    async fn update(
        &self,
        id: &str,
        changes: ListingChanges,
    ) -> Result<Option<Listing>, StoreError> {
        self.check()?;
        let mut listings = self.listings.write().await;
        let Some(listing) = listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        listing.title = changes.title;
        listing.description = changes.description;
        listing.images = changes.images;
        listing.tags = changes.tags;
        listing.updated_at = Utc::now();
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(Some(listing.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.check()?;
        let mut listings = self.listings.write().await;
        let before = listings.len();
        listings.retain(|l| l.id != id);
        let removed = listings.len() != before;
        if removed {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }
}

// =============================================================================
// Mock Uploader
// =============================================================================

/// Uploader handing out sequential URLs, with optional failure injection.
pub struct MockUploader {
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
    uploaded: RwLock<Vec<ImageData>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on_call: None,
            uploaded: RwLock::new(Vec::new()),
        }
    }

    /// Fail the `n`th upload (1-based) with a rejection from the host.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::new()
        }
    }

    /// URL handed out for the `n`th upload (1-based).
    pub fn url(n: usize) -> String {
        format!("https://res.cloudinary.test/car_images/upload-{}.jpg", n)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Images received, in upload order.
    pub async fn uploaded(&self) -> Vec<ImageData> {
        self.uploaded.read().await.clone()
    }
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageUploader for MockUploader {
    async fn upload(&self, image: &ImageData) -> Result<String, UploadError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(n) {
            return Err(UploadError::Rejected {
                status: 400,
                message: "Invalid image file".to_string(),
            });
        }
        self.uploaded.write().await.push(image.clone());
        Ok(Self::url(n))
    }
}

// =============================================================================
// Router Helpers
// =============================================================================

/// Test fixture: a router plus handles on its store and uploader.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryListingStore>,
    pub uploader: Arc<MockUploader>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_uploader(MockUploader::new())
    }

    pub fn with_uploader(uploader: MockUploader) -> Self {
        Self::with_config(uploader, RouterConfig::new(TEST_SECRET).with_tracing(false))
    }

    /// App whose router is built from `config`; it must use [`TEST_SECRET`].
    pub fn with_config(uploader: MockUploader, config: RouterConfig) -> Self {
        let store = Arc::new(MemoryListingStore::new());
        let uploader = Arc::new(uploader);
        let service = ListingService::with_shared(Arc::clone(&store), Arc::clone(&uploader));
        let router = create_router(service, config);
        Self {
            router,
            store,
            uploader,
        }
    }

    /// Send one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// A token for `user_id` signed with the test secret, valid for an hour.
pub fn token_for(user_id: &str) -> String {
    JwtAuth::new(TEST_SECRET)
        .issue(user_id, Duration::from_secs(3600))
        .unwrap()
}

/// Request without a body.
pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// JSON array field as owned strings.
pub fn strings(value: &serde_json::Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect()
}

/// Bytes that sniff as a JPEG, distinguishable by `tag`.
pub fn jpeg_bytes(tag: u8) -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', tag]
}

// =============================================================================
// Multipart Builder
// =============================================================================

const BOUNDARY: &str = "car-listings-test-boundary";

/// Builder for `multipart/form-data` bodies.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        self.body.extend_from_slice(value.as_bytes());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, data: &[u8]) -> Self {
        self.body
            .extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n",
                name, file_name
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Title and description, the minimum a valid form needs.
    pub fn listing(title: &str, description: &str) -> Self {
        Self::new()
            .text("title", title)
            .text("description", description)
    }

    /// Finish the body and wrap it in a request.
    pub fn request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        let mut builder = Request::builder().method(method).uri(uri).header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
