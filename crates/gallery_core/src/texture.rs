//! Decoded artwork and label images.
//!
//! Pixels stay in 8-bit sRGB RGBA so they can be uploaded straight into an
//! `Rgba8UnormSrgb` texture; the GPU does the linear conversion on sample.

use thiserror::Error;

use crate::label::{hex_rgba, FontWeight, LabelCanvas};

/// Errors that can occur while fetching or decoding an image.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Image has no pixels: {0}")]
    Empty(String),
}

pub type TextureResult<T> = Result<T, TextureError>;

/// An RGBA8 image in sRGB space.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureImage {
    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,

    /// Row-major RGBA8, top row first
    pub pixels: Vec<u8>,

    /// Where the pixels came from (URL or a generated-label tag)
    pub source: String,
}

impl TextureImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>, source: impl Into<String>) -> Self {
        Self {
            width,
            height,
            pixels,
            source: source.into(),
        }
    }

    /// Create a solid color texture (1x1).
    pub fn solid_color(rgba: [u8; 4]) -> Self {
        Self::new(1, 1, rgba.to_vec(), "<solid>")
    }

    /// Decode an encoded image (PNG, JPEG, GIF, WebP, ...).
    pub fn decode(bytes: &[u8], source: impl Into<String>) -> TextureResult<Self> {
        let source = source.into();
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TextureError::Empty(source));
        }

        let texture = Self::new(width, height, rgba.into_raw(), source);
        log::debug!(
            "Decoded texture: {} ({}x{}, {:.1} KB)",
            texture.source,
            texture.width,
            texture.height,
            texture.size_bytes() as f32 / 1024.0
        );
        Ok(texture)
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            return 1.0;
        }
        self.width as f32 / self.height as f32
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .unwrap_or([0, 0, 0, 0])
    }

    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}

/// Fit an image of `aspect` (width / height) into a nominal frame size.
///
/// Landscape images keep the nominal width; everything else keeps the
/// nominal height.
pub fn fit_to_aspect(nominal_width: f32, nominal_height: f32, aspect: f32) -> (f32, f32) {
    if !aspect.is_finite() || aspect <= 0.0 {
        return (nominal_width, nominal_height);
    }

    if aspect > 1.0 {
        (nominal_width, nominal_width / aspect)
    } else {
        (nominal_height * aspect, nominal_height)
    }
}

/// Convert sRGB byte value to linear float.
pub fn srgb_to_linear(value: u8) -> f32 {
    let v = value as f32 / 255.0;
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

const ERROR_TEXTURE_SIZE: u32 = 512;

/// Square stand-in texture shown when an artwork fails to load.
pub fn error_texture(user_id: &str) -> TextureImage {
    let size = ERROR_TEXTURE_SIZE;
    let red = hex_rgba(0xe74c3c);
    let center = size as f32 * 0.5;

    let mut canvas = LabelCanvas::new(size, size);
    canvas.fill_rect(0, 0, size as i32, size as i32, hex_rgba(0xf8f8f8));
    canvas.fill_text_or_warn(
        "Image Load Error",
        center,
        center - 40.0,
        32.0,
        FontWeight::Bold,
        red,
    );
    canvas.fill_text_or_warn(
        &format!("User: {user_id}"),
        center,
        center + 40.0,
        24.0,
        FontWeight::Regular,
        hex_rgba(0x333333),
    );
    canvas.stroke_rect(20, 20, size as i32 - 40, size as i32 - 40, 8, red);

    canvas.into_texture(format!("<error:{user_id}>"))
}
