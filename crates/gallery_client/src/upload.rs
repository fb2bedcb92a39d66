//! Client-side upload checks and multipart encoding.

use thiserror::Error;

use gallery_core::GalleryData;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Why an upload was refused before (or by) the server.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejected {
    #[error("Please select a valid image file (JPEG, PNG, GIF, WEBP)")]
    UnsupportedType,

    #[error("Image must be less than 5MB (got {0} bytes)")]
    TooLarge(usize),

    #[error("Please join the gallery first to get a user ID")]
    MissingUser,

    #[error("Please select a frame position for your image")]
    MissingFrame,

    #[error("Frame position already taken: {0}")]
    FrameTaken(String),

    #[error("Unknown frame position: {0}")]
    UnknownFrame(String),

    #[error("{0}")]
    Server(String),
}

/// Accepted image kinds, sniffed from the file bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    WebP,
}

impl ImageKind {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            image::ImageFormat::Jpeg => Some(ImageKind::Jpeg),
            image::ImageFormat::Png => Some(ImageKind::Png),
            image::ImageFormat::Gif => Some(ImageKind::Gif),
            image::ImageFormat::WebP => Some(ImageKind::WebP),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Gif => "image/gif",
            ImageKind::WebP => "image/webp",
        }
    }
}

/// Replace every character outside `[A-Za-z0-9.-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Check an upload against the current gallery before sending it.
pub fn validate_upload(
    gallery: &GalleryData,
    user_id: &str,
    frame_id: &str,
    bytes: &[u8],
) -> Result<ImageKind, UploadRejected> {
    if user_id.trim().is_empty() {
        return Err(UploadRejected::MissingUser);
    }
    if frame_id.trim().is_empty() {
        return Err(UploadRejected::MissingFrame);
    }

    let kind = ImageKind::sniff(bytes).ok_or(UploadRejected::UnsupportedType)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(UploadRejected::TooLarge(bytes.len()));
    }

    if gallery.is_occupied(frame_id) {
        return Err(UploadRejected::FrameTaken(frame_id.to_string()));
    }
    if !gallery.frame_positions.iter().any(|slot| slot.id == frame_id) {
        return Err(UploadRejected::UnknownFrame(frame_id.to_string()));
    }

    Ok(kind)
}

/// A `multipart/form-data` body under construction.
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                self.boundary, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                self.boundary, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Close the form and return the encoded body.
    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.body
    }
}
