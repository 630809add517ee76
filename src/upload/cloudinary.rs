//! Cloudinary upload API client.
//!
//! Each file is sent as a base64 data URI to the signed upload endpoint:
//!
//! ```text
//! POST {api_base}/v1_1/{cloud_name}/image/upload
//!   file=data:image/jpeg;base64,...
//!   folder=car_images
//!   timestamp=1735689600
//!   api_key=...
//!   signature=hex(SHA-256("folder=car_images&timestamp=1735689600" + api_secret))
//!   signature_algorithm=sha256
//! ```
//!
//! The `secure_url` field of the JSON response is the public URL.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::error::UploadError;

use super::{ImageData, ImageUploader};

/// Public Cloudinary API endpoint.
pub const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Folder every listing image is filed under.
pub const DEFAULT_UPLOAD_FOLDER: &str = "car_images";

/// Credentials and placement for uploads.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
    pub api_base: String,
}

impl CloudinaryConfig {
    /// Config for the public API and the default folder.
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: DEFAULT_UPLOAD_FOLDER.to_string(),
            api_base: DEFAULT_CLOUDINARY_API_BASE.to_string(),
        }
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Point the client at another host (a proxy, or a stub in tests).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Full URL of the image upload endpoint.
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/image/upload",
            self.api_base.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// [`ImageUploader`] backed by Cloudinary's signed upload API.
#[derive(Clone)]
pub struct CloudinaryUploader {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryUploader {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing HTTP client (connection pool, custom TLS).
    pub fn with_client(http: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    /// Sign the given parameters.
    ///
    /// Parameters are sorted by name and joined as `k=v&k=v`, then hashed
    /// together with the API secret.
    pub fn sign(&self, params: &[(&str, &str)]) -> String {
        signature(params, &self.config.api_secret)
    }

    /// Form fields for one upload at `timestamp`.
    fn form_fields(&self, image: &ImageData, timestamp: u64) -> Vec<(&'static str, String)> {
        let timestamp = timestamp.to_string();
        let signature = self.sign(&[
            ("folder", self.config.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        vec![
            ("file", data_uri(image)),
            ("folder", self.config.folder.clone()),
            ("timestamp", timestamp),
            ("api_key", self.config.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ]
    }
}

#[async_trait]
impl ImageUploader for CloudinaryUploader {
    async fn upload(&self, image: &ImageData) -> Result<String, UploadError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let fields = self.form_fields(image, timestamp);

        let response = self
            .http
            .post(self.config.upload_url())
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            warn!(status = status.as_u16(), "Image host rejected upload: {}", message);
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))?;
        Ok(body.secure_url)
    }
}

/// Encode a file as a `data:` URI.
pub(crate) fn data_uri(image: &ImageData) -> String {
    format!(
        "data:{};base64,{}",
        image.mime_type(),
        BASE64.encode(&image.bytes)
    )
}

fn signature(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
