//! Image upload client.
//!
//! Files received with a create or update request are forwarded to an
//! external image host, one at a time, and replaced by the public URL the
//! host returns.
//!
//! ```text
//! multipart files ──► upload_all ──► ImageUploader::upload ──► [url, url, ...]
//!                                      (CloudinaryUploader)
//! ```

mod cloudinary;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::UploadError;

pub use cloudinary::{
    CloudinaryConfig, CloudinaryUploader, DEFAULT_CLOUDINARY_API_BASE, DEFAULT_UPLOAD_FOLDER,
};

/// MIME type assumed when neither the bytes nor the client say otherwise.
pub const FALLBACK_MIME_TYPE: &str = "image/jpeg";

/// Raw bytes of one uploaded file plus what the client declared about it.
#[derive(Debug, Clone, Default)]
pub struct ImageData {
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl ImageData {
    pub fn new(bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: None,
            file_name: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Best guess at the file's MIME type.
    ///
    /// Magic bytes win over the declared content type; a declared type is
    /// only trusted if it is an `image/*` type.
    pub fn mime_type(&self) -> String {
        if let Ok(format) = image::guess_format(&self.bytes) {
            return format.to_mime_type().to_string();
        }
        match self.content_type.as_deref() {
            Some(ct) if ct.starts_with("image/") => ct.to_string(),
            _ => FALLBACK_MIME_TYPE.to_string(),
        }
    }
}

/// A destination for image bytes that hands back a public URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// Upload one file and return its durable public URL.
    async fn upload(&self, image: &ImageData) -> Result<String, UploadError>;
}

/// Upload `images` strictly in order.
///
/// The returned URLs line up with the input. The first failure aborts the
/// batch; files uploaded before it are left on the host.
pub async fn upload_all<U>(uploader: &U, images: &[ImageData]) -> Result<Vec<String>, UploadError>
where
    U: ImageUploader + ?Sized,
{
    let mut urls = Vec::with_capacity(images.len());
    for (index, image) in images.iter().enumerate() {
        let url = uploader.upload(image).await?;
        debug!(index, bytes = image.len(), url = %url, "Uploaded image");
        urls.push(url);
    }
    Ok(urls)
}
