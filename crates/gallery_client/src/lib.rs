//! Gallery Client - talks to the gallery backend.
//!
//! Wraps the three endpoints the viewer needs (gallery data, join, image
//! upload) plus local persistence of the user id. Fetching gallery data
//! never fails: any transport or parse problem yields an empty gallery so
//! the room still renders.

pub mod identity;
pub mod upload;

use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use thiserror::Error;

use gallery_core::{default_frame_slots, GalleryData};

pub use identity::{IdentityError, IdentityStore, USER_ID_KEY};
pub use upload::{sanitize_filename, validate_upload, ImageKind, UploadRejected, MAX_UPLOAD_BYTES};

/// Errors from backend requests.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upload rejected: {0}")]
    Rejected(#[from] UploadRejected),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Deserialize)]
struct JoinResponse {
    #[serde(rename = "userId")]
    user_id: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Successful upload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct UploadReceipt {
    #[serde(default)]
    pub success: bool,
    pub url: String,
    #[serde(rename = "frameId", default)]
    pub frame_id: String,
}

/// Blocking client for one gallery backend.
pub struct GalleryClient {
    base_url: String,
    agent: ureq::Agent,
}

impl GalleryClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(30))
                .build(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/gallery/{}", self.base_url, path)
    }

    /// Turn a ureq result into a body string, surfacing `{ error }` payloads.
    fn read_body(url: &str, result: Result<ureq::Response, ureq::Error>) -> ClientResult<String> {
        match result {
            Ok(response) => {
                let mut body = String::new();
                response.into_reader().read_to_string(&mut body)?;
                Ok(body)
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                let message = serde_json::from_str::<ErrorResponse>(&body)
                    .map(|e| e.error)
                    .unwrap_or(body);
                Err(ClientError::Status { status, message })
            }
            Err(e) => Err(ClientError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Strict fetch of the gallery payload.
    pub fn try_fetch_gallery(&self) -> ClientResult<GalleryData> {
        let url = self.endpoint("data");
        let body = Self::read_body(&url, self.agent.get(&url).call())?;
        let mut data = GalleryData::from_json(&body)?;
        if data.frame_positions.is_empty() {
            data.frame_positions = default_frame_slots();
        }
        log::info!(
            "Fetched gallery: {} images, {} frame positions",
            data.images.len(),
            data.frame_positions.len()
        );
        Ok(data)
    }

    /// Gallery payload, or an empty gallery if anything goes wrong.
    pub fn fetch_gallery(&self) -> GalleryData {
        self.try_fetch_gallery().unwrap_or_else(|e| {
            log::warn!("Could not fetch gallery data: {}", e);
            GalleryData::default()
        })
    }

    /// Register a new visitor and return their id.
    pub fn join(&self) -> ClientResult<String> {
        let url = self.endpoint("user");
        let body = Self::read_body(&url, self.agent.post(&url).call())?;
        let response: JoinResponse = serde_json::from_str(&body)?;
        log::info!("Joined gallery as {}", response.user_id);
        Ok(response.user_id)
    }

    /// Validate locally against `gallery`, then upload `bytes` into `frame_id`.
    pub fn upload_image(
        &self,
        gallery: &GalleryData,
        user_id: &str,
        frame_id: &str,
        filename: &str,
        bytes: &[u8],
    ) -> ClientResult<UploadReceipt> {
        let kind = validate_upload(gallery, user_id, frame_id, bytes)?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let form = upload::MultipartForm::new(format!("----gallery{nanos:x}"))
            .text("userId", user_id)
            .text("frameId", frame_id)
            .file("file", &sanitize_filename(filename), kind.mime_type(), bytes);
        let content_type = form.content_type();

        let url = self.endpoint("image");
        log::info!("Uploading {} ({} bytes) to frame '{}'", filename, bytes.len(), frame_id);
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", &content_type)
            .send_bytes(&form.finish());

        let body = match Self::read_body(&url, result) {
            Err(ClientError::Status { status, message }) if status < 500 => {
                return Err(UploadRejected::Server(message).into())
            }
            other => other?,
        };
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gallery_core::GalleryImage;

    #[test]
    fn test_endpoints() {
        let client = GalleryClient::new("http://localhost:3000/");
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.endpoint("data"), "http://localhost:3000/api/gallery/data");
    }

    #[test]
    fn test_unreachable_backend_yields_empty_gallery() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let client = GalleryClient::new("http://127.0.0.1:9");
        let data = client.fetch_gallery();
        assert!(data.images.is_empty());
        assert!(data.frame_positions.is_empty());
    }

    #[test]
    fn test_upload_validated_before_sending() {
        let client = GalleryClient::new("http://127.0.0.1:9");
        let gallery = GalleryData::new(
            vec![GalleryImage::new("a.png", true, "u1", "center")],
            default_frame_slots(),
        );

        let result = client.upload_image(&gallery, "u2", "center", "a.png", b"\x89PNG\r\n\x1a\n");
        assert!(matches!(
            result,
            Err(ClientError::Rejected(UploadRejected::FrameTaken(_)))
        ));
    }

    #[test]
    fn test_receipt_parses() {
        let receipt: UploadReceipt = serde_json::from_str(
            r#"{ "success": true, "url": "https://cdn/x.png", "frameId": "backLeft" }"#,
        )
        .unwrap();
        assert!(receipt.success);
        assert_eq!(receipt.frame_id, "backLeft");
    }
}
