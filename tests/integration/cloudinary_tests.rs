//! Cloudinary client tests against a local stub of the upload API.
//!
//! Tests verify:
//! - The signed form fields sent per upload
//! - `secure_url` is returned on success
//! - Host rejections, garbage bodies and transport errors map to UploadError

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Router};
use bytes::Bytes;

use car_listings::error::UploadError;
use car_listings::upload::{
    upload_all, CloudinaryConfig, CloudinaryUploader, ImageData, ImageUploader,
};

use super::test_utils::jpeg_bytes;

// =============================================================================
// Stub Server
// =============================================================================

#[derive(Clone, Copy)]
enum Reply {
    Ok,
    Rejected,
    PlainError,
    Garbage,
}

#[derive(Clone)]
struct StubState {
    reply: Reply,
    received: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

async fn upload_stub(
    State(state): State<StubState>,
    Path(cloud): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let n = {
        let mut received = state.received.lock().unwrap();
        received.push((cloud.clone(), fields));
        received.len()
    };

    match state.reply {
        Reply::Ok => axum::Json(serde_json::json!({
            "public_id": format!("car_images/{}", n),
            "secure_url": format!("https://res.cloudinary.com/{}/image/upload/{}.jpg", cloud, n),
        }))
        .into_response(),
        Reply::Rejected => (
            StatusCode::BAD_REQUEST,
            axum::Json(serde_json::json!({ "error": { "message": "Invalid image file" } })),
        )
            .into_response(),
        Reply::PlainError => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        Reply::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
    }
}

struct Stub {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
}

impl Stub {
    async fn start(reply: Reply) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/v1_1/{cloud}/image/upload", post(upload_stub))
            .with_state(StubState {
                reply,
                received: Arc::clone(&received),
            });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, received }
    }

    fn uploader(&self) -> CloudinaryUploader {
        CloudinaryUploader::new(
            CloudinaryConfig::new("demo", "key-123", "shh")
                .with_api_base(format!("http://{}", self.addr)),
        )
    }

    fn received(&self) -> Vec<(String, HashMap<String, String>)> {
        self.received.lock().unwrap().clone()
    }
}

fn jpeg_image(tag: u8) -> ImageData {
    ImageData::new(Bytes::from(jpeg_bytes(tag))).with_file_name("car.jpg")
}

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_upload_returns_secure_url() {
    let stub = Stub::start(Reply::Ok).await;
    let uploader = stub.uploader();

    let url = uploader.upload(&jpeg_image(1)).await.unwrap();
    assert_eq!(url, "https://res.cloudinary.com/demo/image/upload/1.jpg");
}

#[tokio::test]
async fn test_upload_sends_signed_form() {
    let stub = Stub::start(Reply::Ok).await;
    let uploader = stub.uploader();

    uploader.upload(&jpeg_image(7)).await.unwrap();

    let received = stub.received();
    assert_eq!(received.len(), 1);
    let (cloud, fields) = &received[0];
    assert_eq!(cloud, "demo");

    assert_eq!(fields["api_key"], "key-123");
    assert_eq!(fields["folder"], "car_images");
    assert_eq!(fields["signature_algorithm"], "sha256");
    assert!(fields["file"].starts_with("data:image/jpeg;base64,"));
    assert!(!fields.contains_key("api_secret"));

    let expected = uploader.sign(&[
        ("folder", "car_images"),
        ("timestamp", fields["timestamp"].as_str()),
    ]);
    assert_eq!(fields["signature"], expected);
}

#[tokio::test]
async fn test_upload_all_preserves_order() {
    let stub = Stub::start(Reply::Ok).await;
    let uploader = stub.uploader();

    let images = vec![jpeg_image(1), jpeg_image(2), jpeg_image(3)];
    let urls = upload_all(&uploader, &images).await.unwrap();

    assert_eq!(
        urls,
        vec![
            "https://res.cloudinary.com/demo/image/upload/1.jpg",
            "https://res.cloudinary.com/demo/image/upload/2.jpg",
            "https://res.cloudinary.com/demo/image/upload/3.jpg",
        ]
    );
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_host_rejection_carries_message() {
    let stub = Stub::start(Reply::Rejected).await;

    let err = stub.uploader().upload(&jpeg_image(1)).await.unwrap_err();
    match err {
        UploadError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid image file");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_uses_status_reason() {
    let stub = Stub::start(Reply::PlainError).await;

    let err = stub.uploader().upload(&jpeg_image(1)).await.unwrap_err();
    match err {
        UploadError::Rejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn test_garbage_success_body_is_malformed() {
    let stub = Stub::start(Reply::Garbage).await;

    let err = stub.uploader().upload(&jpeg_image(1)).await.unwrap_err();
    assert!(matches!(err, UploadError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let uploader = CloudinaryUploader::new(
        CloudinaryConfig::new("demo", "k", "s").with_api_base(format!("http://{}", addr)),
    );

    let err = uploader.upload(&jpeg_image(1)).await.unwrap_err();
    assert!(matches!(err, UploadError::Http(_)));
}
