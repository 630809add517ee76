//! HTTP request handlers for the listings API.
//!
//! # Endpoints
//!
//! - `GET /listings` - All listings, owner usernames expanded
//! - `GET /listings/user/{owner_id}` - Listings of one owner (authenticated)
//! - `GET /listings/{id}` - One listing
//! - `POST /listings` - Create (authenticated, multipart)
//! - `PUT /listings/{id}` - Replace (owner only, multipart)
//! - `DELETE /listings/{id}` - Delete (owner only)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, FromRef, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{ListingError, StoreError};
use crate::listing::{Listing, ListingService, ListingStore, Owner};
use crate::upload::ImageUploader;

use super::auth::{AuthUser, JwtAuth};
use super::form::read_listing_form;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state: the listing service and the token verifier.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<S, U> {
    pub service: Arc<ListingService<S, U>>,
    pub auth: JwtAuth,
}

impl<S, U> AppState<S, U>
where
    S: ListingStore,
    U: ImageUploader,
{
    pub fn new(service: ListingService<S, U>, auth: JwtAuth) -> Self {
        Self {
            service: Arc::new(service),
            auth,
        }
    }
}

impl<S, U> Clone for AppState<S, U> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: self.auth.clone(),
        }
    }
}

impl<S, U> FromRef<AppState<S, U>> for JwtAuth {
    fn from_ref(state: &AppState<S, U>) -> Self {
        state.auth.clone()
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "forbidden")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Owner reference as sent to clients.
#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub id: String,

    /// Present only where the owner was expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<Owner> for OwnerResponse {
    fn from(owner: Owner) -> Self {
        Self {
            id: owner.id,
            username: owner.username,
        }
    }
}

/// A listing as sent to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub owner: OwnerResponse,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Listing> for ListingResponse {
    fn from(listing: Listing) -> Self {
        Self {
            id: listing.id,
            title: listing.title,
            description: listing.description,
            images: listing.images,
            tags: listing.tags,
            owner: listing.owner.into(),
            created_at: listing.created_at,
            updated_at: listing.updated_at,
        }
    }
}

/// Confirmation returned by the delete endpoint.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

fn listing_responses(listings: Vec<Listing>) -> Json<Vec<ListingResponse>> {
    Json(listings.into_iter().map(ListingResponse::from).collect())
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ListingError to HTTP response.
///
/// - 4xx errors are logged at WARN level (404 at DEBUG)
/// - 5xx errors are logged at ERROR level
impl IntoResponse for ListingError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ListingError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            ListingError::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            ListingError::InvalidField { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            ListingError::TooManyImages { .. } => (StatusCode::BAD_REQUEST, "too_many_images"),
            ListingError::PayloadTooLarge(_) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large")
            }
            ListingError::Store(StoreError::InvalidId(_)) => {
                (StatusCode::BAD_REQUEST, "bad_request")
            }
            ListingError::Upload(_) => (StatusCode::INTERNAL_SERVER_ERROR, "upload_error"),
            ListingError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// List every listing.
///
/// # Endpoint
///
/// `GET /listings`
///
/// # Response
///
/// - `200 OK`: JSON array of listings, `owner.username` filled in
/// - `500 Internal Server Error`: Storage error
pub async fn list_listings_handler<S, U>(
    State(state): State<AppState<S, U>>,
) -> Result<Json<Vec<ListingResponse>>, ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    let listings = state.service.list_all().await?;
    Ok(listing_responses(listings))
}

/// List the listings of one owner.
///
/// # Endpoint
///
/// `GET /listings/user/{owner_id}`
///
/// Requires a valid bearer token, but not that the caller is `owner_id`.
///
/// # Response
///
/// - `200 OK`: JSON array of listings (owner not expanded)
/// - `401 Unauthorized`: Missing or invalid token
pub async fn owner_listings_handler<S, U>(
    caller: AuthUser,
    State(state): State<AppState<S, U>>,
    Path(owner_id): Path<String>,
) -> Result<Json<Vec<ListingResponse>>, ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    debug!(caller = %caller.id, owner = %owner_id, "Listing owner's listings");
    let listings = state.service.list_by_owner(&owner_id).await?;
    Ok(listing_responses(listings))
}

/// Fetch one listing.
///
/// # Endpoint
///
/// `GET /listings/{id}`
///
/// # Response
///
/// - `200 OK`: The listing, `owner.username` filled in
/// - `404 Not Found`: No listing with this id
pub async fn get_listing_handler<S, U>(
    State(state): State<AppState<S, U>>,
    Path(id): Path<String>,
) -> Result<Json<ListingResponse>, ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    let listing = state.service.get(&id).await?;
    Ok(Json(listing.into()))
}

/// Create a listing owned by the caller.
///
/// # Endpoint
///
/// `POST /listings` (multipart: `title`, `description`, `tags`, `images`)
///
/// # Response
///
/// - `201 Created`: The stored listing
/// - `400 Bad Request`: Missing field, malformed `tags`, more than 10 files
/// - `401 Unauthorized`: Missing or invalid token
/// - `413 Payload Too Large`: Body over the configured cap
/// - `500 Internal Server Error`: Upload or storage failure
pub async fn create_listing_handler<S, U>(
    caller: AuthUser,
    State(state): State<AppState<S, U>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ListingResponse>), ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    let form = read_listing_form(multipart).await?;
    let listing = state.service.create(&caller.id, form).await?;
    Ok((StatusCode::CREATED, Json(listing.into())))
}

/// Replace a listing's title, description, tags and images.
///
/// # Endpoint
///
/// `PUT /listings/{id}` (multipart: `title`, `description`, `tags`,
/// `existingImages`, `images`)
///
/// # Response
///
/// - `200 OK`: The updated listing
/// - `400 Bad Request`: Missing field or malformed list
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not the owner (checked before the form)
/// - `404 Not Found`: No listing with this id (checked before the form)
pub async fn update_listing_handler<S, U>(
    caller: AuthUser,
    State(state): State<AppState<S, U>>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ListingResponse>, ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    let form = read_listing_form(multipart).await?;
    let listing = state.service.update(&caller.id, &id, form).await?;
    Ok(Json(listing.into()))
}

/// Delete a listing.
///
/// # Endpoint
///
/// `DELETE /listings/{id}`
///
/// # Response
///
/// - `200 OK`: `{"message": "Listing removed", "id": "..."}`
/// - `401 Unauthorized`: Missing or invalid token
/// - `403 Forbidden`: Caller is not the owner
/// - `404 Not Found`: No listing with this id
pub async fn delete_listing_handler<S, U>(
    caller: AuthUser,
    State(state): State<AppState<S, U>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ListingError>
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    state.service.delete(&caller.id, &id).await?;
    Ok(Json(DeleteResponse {
        message: "Listing removed".to_string(),
        id,
    }))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
