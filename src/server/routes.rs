//! Router configuration for the listings API.
//!
//! # Route Structure
//!
//! ```text
//! /health                     GET                  - Health check (public)
//! /listings                   GET (public), POST   - All listings / create
//! /listings/user/{owner_id}   GET                  - One owner's listings
//! /listings/{id}              GET (public), PUT, DELETE
//! ```
//!
//! Routes that need a caller take an [`AuthUser`](super::auth::AuthUser)
//! argument, which rejects the request with 401 before the handler runs.
//!
//! # Example
//!
//! ```ignore
//! use car_listings::listing::{ListingService, MongoListingStore};
//! use car_listings::server::routes::{create_router, RouterConfig};
//! use car_listings::upload::{CloudinaryConfig, CloudinaryUploader};
//!
//! let store = MongoListingStore::connect("mongodb://localhost/cars", "test").await?;
//! let uploader = CloudinaryUploader::new(CloudinaryConfig::new("demo", "key", "secret"));
//! let service = ListingService::new(store, uploader);
//!
//! let config = RouterConfig::new("jwt-secret")
//!     .with_cors_origins(vec!["https://example.com".to_string()]);
//! let router = create_router(service, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::JwtAuth;
use super::handlers::{
    create_listing_handler, delete_listing_handler, get_listing_handler, health_handler,
    list_listings_handler, owner_listings_handler, update_listing_handler, AppState,
};
use crate::listing::{ListingService, ListingStore};
use crate::upload::ImageUploader;

/// Default request body cap: 50 MiB, room for ten photos.
pub const DEFAULT_MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// HS256 secret used to verify bearer tokens
    pub jwt_secret: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
}

impl RouterConfig {
    /// Create a new router configuration with the given JWT secret.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Bodies up to 50 MiB are accepted
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            cors_origins: None,
            enable_tracing: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Set the request body cap.
    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// # Arguments
///
/// * `service` - The listing service backing every listing route
/// * `config` - Router configuration
pub fn create_router<S, U>(service: ListingService<S, U>, config: RouterConfig) -> Router
where
    S: ListingStore + 'static,
    U: ImageUploader + 'static,
{
    let app_state = AppState::new(service, JwtAuth::new(&config.jwt_secret));
    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route(
            "/listings",
            get(list_listings_handler::<S, U>).post(create_listing_handler::<S, U>),
        )
        .route(
            "/listings/user/{owner_id}",
            get(owner_listings_handler::<S, U>),
        )
        .route(
            "/listings/{id}",
            get(get_listing_handler::<S, U>)
                .put(update_listing_handler::<S, U>)
                .delete(delete_listing_handler::<S, U>),
        )
        .with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
