//! Multipart body parsing for create and update requests.
//!
//! # Fields
//!
//! | Name             | Kind | Content                                   |
//! |------------------|------|-------------------------------------------|
//! | `title`          | text | required                                  |
//! | `description`    | text | required                                  |
//! | `tags`           | text | JSON array of strings, defaults to `[]`   |
//! | `existingImages` | text | JSON array of URLs to keep (update only)  |
//! | `images`         | file | repeated, at most 10                      |
//!
//! Unknown fields are skipped.

use axum::extract::multipart::{Field, MultipartError, MultipartRejection};
use axum::extract::Multipart;
use http::StatusCode;
use tracing::debug;

use crate::error::ListingError;
use crate::listing::{ListingForm, MAX_IMAGES_PER_REQUEST};
use crate::upload::ImageData;

/// Multipart field carrying image files.
pub const IMAGES_FIELD: &str = "images";

/// Read a whole create/update body into a [`ListingForm`].
///
/// File contents are buffered in memory; files past the tenth are skipped.
/// Content problems (wrong content type, malformed lists, too many files)
/// are recorded on the form and reported by [`ListingForm::validate`].
/// Transport failures, including an oversized body, fail the read.
pub async fn read_listing_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ListingForm, ListingError> {
    let mut form = ListingForm::default();
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            form.reject(ListingError::invalid("body", rejection.body_text()));
            return Ok(form);
        }
    };

    let mut tags: Option<String> = None;
    let mut existing_images: Option<String> = None;
    let mut file_count = 0;

    while let Some(field) = multipart.next_field().await.map_err(body_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = read_text(field).await?,
            "description" => form.description = read_text(field).await?,
            "tags" => tags = Some(read_text(field).await?),
            "existingImages" => existing_images = Some(read_text(field).await?),
            IMAGES_FIELD => {
                file_count += 1;
                if file_count <= MAX_IMAGES_PER_REQUEST {
                    form.images.push(read_file(field).await?);
                }
            }
            other => debug!(field = other, "Skipping unknown form field"),
        }
    }

    if file_count > MAX_IMAGES_PER_REQUEST {
        form.reject(ListingError::TooManyImages {
            count: file_count,
            max: MAX_IMAGES_PER_REQUEST,
        });
    }
    match parse_string_list("tags", tags.as_deref()) {
        Ok(list) => form.tags = list,
        Err(err) => form.reject(err),
    }
    match parse_string_list("existingImages", existing_images.as_deref()) {
        Ok(list) => form.existing_images = list,
        Err(err) => form.reject(err),
    }
    Ok(form)
}

/// Parse a field holding a JSON array of strings.
///
/// An absent or blank field is an empty list; anything else that is not a
/// JSON array of strings is rejected.
pub fn parse_string_list(
    field: &'static str,
    raw: Option<&str>,
) -> Result<Vec<String>, ListingError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(Vec::new()),
        Some(raw) => raw,
    };
    serde_json::from_str::<Vec<String>>(raw).map_err(|e| {
        ListingError::invalid(field, format!("expected a JSON array of strings ({})", e))
    })
}

async fn read_text(field: Field<'_>) -> Result<String, ListingError> {
    field.text().await.map_err(body_error)
}

async fn read_file(field: Field<'_>) -> Result<ImageData, ListingError> {
    let content_type = field.content_type().map(str::to_string);
    let file_name = field.file_name().map(str::to_string);
    let bytes = field.bytes().await.map_err(body_error)?;

    Ok(ImageData {
        bytes,
        content_type,
        file_name,
    })
}

fn body_error(err: MultipartError) -> ListingError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ListingError::PayloadTooLarge(err.body_text())
    } else {
        ListingError::invalid("body", err.body_text())
    }
}
