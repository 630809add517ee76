use thiserror::Error;

/// Errors raised by a listing store backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Error reported by the database driver
    #[error("Database error: {0}")]
    Database(String),

    /// An identifier could not be converted to the backend's id type
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Errors that can occur while pushing an image to the image host
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    /// Transport failure (connection refused, timeout, TLS)
    #[error("Upload request failed: {0}")]
    Http(String),

    /// The image host answered with a non-success status
    #[error("Image host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The image host answered 2xx but the body was not understood
    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        UploadError::Http(err.to_string())
    }
}

/// Errors produced by listing operations
#[derive(Debug, Clone, Error)]
pub enum ListingError {
    /// No listing with this id exists
    #[error("Listing not found: {id}")]
    NotFound { id: String },

    /// The caller does not own the listing it tried to mutate
    #[error("Not authorized to modify listing {id}")]
    Forbidden { id: String },

    /// A request field was missing or malformed (should map to HTTP 400)
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// The request body exceeded the configured size cap
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    /// More files than a single request may carry
    #[error("Too many images: got {count}, at most {max} allowed")]
    TooManyImages { count: usize, max: usize },

    /// Image upload failed; the whole operation is aborted
    #[error("Image upload failed: {0}")]
    Upload(#[from] UploadError),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ListingError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ListingError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
