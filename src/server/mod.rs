//! HTTP server layer for the listings API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        /listings, /listings/{id}, /listings/user/{owner}        │
//! │                                                                 │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌─────────────┐   │
//! │  │ handlers  │  │   auth    │  │   form    │  │   routes    │   │
//! │  │(requests) │  │ (bearer)  │  │(multipart)│  │ (router)    │   │
//! │  └───────────┘  └───────────┘  └───────────┘  └─────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod form;
pub mod handlers;
pub mod routes;

pub use auth::{bearer_token, AuthError, AuthUser, Claims, JwtAuth, UserClaim};
pub use form::{parse_string_list, read_listing_form};
pub use handlers::{
    create_listing_handler, delete_listing_handler, get_listing_handler, health_handler,
    list_listings_handler, owner_listings_handler, update_listing_handler, AppState,
    DeleteResponse, ErrorResponse, HealthResponse, ListingResponse, OwnerResponse,
};
pub use routes::{create_router, RouterConfig, DEFAULT_MAX_BODY_BYTES};
