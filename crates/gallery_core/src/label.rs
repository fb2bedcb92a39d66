//! Tiny 2D canvas for procedurally drawn frame labels.
//!
//! Draws into an RGBA8 (sRGB) buffer with the handful of operations the
//! labels need: solid and gradient fills, rectangle strokes and centered
//! text. Text is rasterized with `fontdue` using the proportional sans
//! font bundled with egui, so no font files need to ship with the app.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use fontdue::{Font, FontSettings};
use thiserror::Error;

use crate::texture::TextureImage;

/// Errors that can occur while drawing labels.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LabelError {
    #[error("Label font unavailable: {0}")]
    FontUnavailable(String),
}

/// Stroke weight for text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Convert 0xRRGGBB into opaque RGBA8.
pub const fn hex_rgba(hex: u32) -> [u8; 4] {
    [
        ((hex >> 16) & 0xff) as u8,
        ((hex >> 8) & 0xff) as u8,
        (hex & 0xff) as u8,
        255,
    ]
}

static LABEL_FONT: OnceLock<Result<Font, LabelError>> = OnceLock::new();

fn label_font() -> Result<&'static Font, LabelError> {
    LABEL_FONT
        .get_or_init(load_label_font)
        .as_ref()
        .map_err(Clone::clone)
}

fn load_label_font() -> Result<Font, LabelError> {
    let definitions = egui::FontDefinitions::default();
    let name = definitions
        .families
        .get(&egui::FontFamily::Proportional)
        .and_then(|names| names.first())
        .cloned()
        .ok_or_else(|| LabelError::FontUnavailable("no proportional font family".into()))?;

    let data = lookup_font_data(&definitions.font_data, &name)?;
    let font = Font::from_bytes(data, FontSettings::default())
        .map_err(|e| LabelError::FontUnavailable(format!("{name}: {e}")))?;

    log::debug!("Loaded label font {name}");
    Ok(font)
}

fn lookup_font_data<'a>(
    fonts: &'a BTreeMap<String, egui::FontData>,
    name: &str,
) -> Result<&'a [u8], LabelError> {
    fonts
        .get(name)
        .map(|data| &*data.font)
        .ok_or_else(|| LabelError::FontUnavailable(format!("missing font data for {name}")))
}

/// RGBA8 drawing surface, row-major, top row first.
#[derive(Clone, Debug)]
pub struct LabelCanvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl LabelCanvas {
    /// Create a fully transparent canvas.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Transparent black outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0, 0];
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels
            .get(i..i + 4)
            .map(|p| [p[0], p[1], p[2], p[3]])
            .unwrap_or([0, 0, 0, 0])
    }

    /// Source-over blend of `color` scaled by `coverage` (0-255).
    fn blend(&mut self, x: i32, y: i32, color: [u8; 4], coverage: u8) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;

        let sa = color[3] as f32 / 255.0 * coverage as f32 / 255.0;
        if sa <= 0.0 {
            return;
        }
        let da = self.pixels[i + 3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);

        for c in 0..3 {
            let src = color[c] as f32;
            let dst = self.pixels[i + c] as f32;
            let value = (src * sa + dst * da * (1.0 - sa)) / out_a;
            self.pixels[i + c] = value.round().clamp(0.0, 255.0) as u8;
        }
        self.pixels[i + 3] = (out_a * 255.0).round() as u8;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: [u8; 4]) {
        for py in y.max(0)..(y + height).min(self.height as i32) {
            for px in x.max(0)..(x + width).min(self.width as i32) {
                self.blend(px, py, color, 255);
            }
        }
    }

    /// Fill the whole canvas with a top-to-bottom linear gradient.
    pub fn fill_vertical_gradient(&mut self, top: [u8; 4], bottom: [u8; 4]) {
        let span = self.height.max(1) as f32;
        for py in 0..self.height {
            // Sample at pixel centers like a 2D canvas does
            let t = (py as f32 + 0.5) / span;
            let mut color = [0u8; 4];
            for c in 0..4 {
                color[c] = (top[c] as f32 + (bottom[c] as f32 - top[c] as f32) * t).round() as u8;
            }
            for px in 0..self.width {
                self.blend(px as i32, py as i32, color, 255);
            }
        }
    }

    /// Stroke a rectangle outline; the line is centered on the rectangle edge.
    pub fn stroke_rect(
        &mut self,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        line_width: i32,
        color: [u8; 4],
    ) {
        let half = line_width / 2;
        let outer_x = x - half;
        let outer_y = y - half;
        let outer_w = width + line_width;

        // Top, bottom, left, right bands
        self.fill_rect(outer_x, outer_y, outer_w, line_width, color);
        self.fill_rect(outer_x, y + height - half, outer_w, line_width, color);
        self.fill_rect(outer_x, y + half, line_width, height - line_width, color);
        self.fill_rect(x + width - half, y + half, line_width, height - line_width, color);
    }

    /// Draw single-line text centered on (`center_x`, `center_y`).
    pub fn fill_text(
        &mut self,
        text: &str,
        center_x: f32,
        center_y: f32,
        size_px: f32,
        weight: FontWeight,
        color: [u8; 4],
    ) -> Result<(), LabelError> {
        let font = label_font()?;

        let advance: f32 = text
            .chars()
            .map(|ch| font.metrics(ch, size_px).advance_width)
            .sum();

        // "middle" baseline: center the ascent/descent box on center_y
        let (ascent, descent) = font
            .horizontal_line_metrics(size_px)
            .map(|m| (m.ascent, m.descent))
            .unwrap_or((size_px * 0.8, -size_px * 0.2));
        let baseline = center_y + (ascent + descent) * 0.5;

        let embolden = match weight {
            FontWeight::Regular => 0,
            FontWeight::Bold => ((size_px / 24.0).round() as i32).max(1),
        };

        let mut pen_x = center_x - advance * 0.5;
        for ch in text.chars() {
            let (metrics, bitmap) = font.rasterize(ch, size_px);
            let left = pen_x.round() as i32 + metrics.xmin;
            let top = baseline.round() as i32 - (metrics.ymin + metrics.height as i32);

            for gy in 0..metrics.height {
                for gx in 0..metrics.width {
                    let coverage = bitmap[gy * metrics.width + gx];
                    if coverage == 0 {
                        continue;
                    }
                    for offset in 0..=embolden {
                        self.blend(left + gx as i32 + offset, top + gy as i32, color, coverage);
                    }
                }
            }
            pen_x += metrics.advance_width;
        }

        Ok(())
    }

    /// Draw text, logging instead of failing when no font is available.
    pub fn fill_text_or_warn(
        &mut self,
        text: &str,
        center_x: f32,
        center_y: f32,
        size_px: f32,
        weight: FontWeight,
        color: [u8; 4],
    ) {
        if let Err(e) = self.fill_text(text, center_x, center_y, size_px, weight, color) {
            log::warn!("Label text '{}' not drawn: {}", text, e);
        }
    }

    pub fn into_texture(self, source: impl Into<String>) -> TextureImage {
        TextureImage::new(self.width, self.height, self.pixels, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_rgba() {
        assert_eq!(hex_rgba(0xffd700), [255, 215, 0, 255]);
        assert_eq!(hex_rgba(0x333333), [51, 51, 51, 255]);
    }

    #[test]
    fn test_fill_rect_clips_to_canvas() {
        let mut canvas = LabelCanvas::new(8, 4);
        canvas.fill_rect(-4, -4, 100, 100, hex_rgba(0x333333));

        assert_eq!(canvas.pixel(0, 0), [51, 51, 51, 255]);
        assert_eq!(canvas.pixel(7, 3), [51, 51, 51, 255]);
    }

    #[test]
    fn test_pixel_outside_canvas_is_transparent() {
        let mut canvas = LabelCanvas::new(8, 4);
        canvas.fill_rect(0, 0, 8, 4, hex_rgba(0x333333));

        assert_eq!(canvas.pixel(8, 0), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(0, 4), [0, 0, 0, 0]);
        assert_eq!(canvas.pixel(u32::MAX, u32::MAX), [0, 0, 0, 0]);
    }

    #[test]
    fn test_gradient_runs_top_to_bottom() {
        let mut canvas = LabelCanvas::new(4, 128);
        canvas.fill_vertical_gradient(hex_rgba(0xe0e0e0), hex_rgba(0xc0c0c0));

        let top = canvas.pixel(0, 0)[0];
        let bottom = canvas.pixel(0, 127)[0];
        assert!(top > bottom);
        assert!(top <= 0xe0 && bottom >= 0xc0);
    }

    #[test]
    fn test_stroke_rect_leaves_interior() {
        let mut canvas = LabelCanvas::new(64, 64);
        canvas.stroke_rect(10, 10, 44, 44, 4, hex_rgba(0xe74c3c));

        assert_eq!(canvas.pixel(10, 30), hex_rgba(0xe74c3c));
        assert_eq!(canvas.pixel(53, 30), hex_rgba(0xe74c3c));
        assert_eq!(canvas.pixel(30, 10), hex_rgba(0xe74c3c));
        assert_eq!(canvas.pixel(30, 30)[3], 0);
    }

    #[test]
    fn test_text_is_centered() {
        let mut canvas = LabelCanvas::new(256, 64);
        canvas
            .fill_text("abc123", 128.0, 32.0, 24.0, FontWeight::Regular, hex_rgba(0xffffff))
            .unwrap();

        let mut min_x = u32::MAX;
        let mut max_x = 0;
        let mut inked = 0;
        for y in 0..64 {
            for x in 0..256 {
                if canvas.pixel(x, y)[3] > 0 {
                    min_x = min_x.min(x);
                    max_x = max_x.max(x);
                    inked += 1;
                }
            }
        }

        assert!(inked > 0);
        let center = (min_x + max_x) as f32 * 0.5;
        assert!((center - 128.0).abs() < 6.0);
    }
}
