//! Source images and the pixel geometry used by every feature unit.
//!
//! A [`SourceImage`] is the decoded bitmap of a user-supplied file. It is never
//! modified; feature units draw onto copies of its pixels.

use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{Error, Result};

/// A rectangle defined in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RectPx {
    /// X offset from the left edge of the image
    pub x: u32,
    /// Y offset from the top edge of the image
    pub y: u32,
    /// Width of the rectangle
    pub width: u32,
    /// Height of the rectangle
    pub height: u32,
}

impl RectPx {
    /// Creates a new rectangle with the given position and dimensions.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the right edge coordinate (x + width).
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Returns the bottom edge coordinate (y + height).
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Returns true if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Intersects this rectangle with `0..width` x `0..height`.
    pub fn clamp_to(&self, size: SizePx) -> Self {
        let x = self.x.min(size.width);
        let y = self.y.min(size.height);
        Self {
            x,
            y,
            width: self.right().min(size.width) - x,
            height: self.bottom().min(size.height) - y,
        }
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scales this size down to fit inside `bounds`, preserving aspect ratio.
    ///
    /// Sizes that already fit are returned unchanged; nothing is upscaled.
    /// Each side is at least one pixel.
    ///
    /// ```
    /// use imgdash::SizePx;
    ///
    /// let fitted = SizePx::new(1000, 500).fit_within(SizePx::new(500, 500));
    /// assert_eq!(fitted, SizePx::new(500, 250));
    /// ```
    pub fn fit_within(&self, bounds: SizePx) -> SizePx {
        if self.width <= bounds.width && self.height <= bounds.height {
            return *self;
        }
        let scale = (bounds.width as f64 / self.width as f64)
            .min(bounds.height as f64 / self.height as f64);
        SizePx::new(
            ((self.width as f64 * scale).round() as u32).max(1),
            ((self.height as f64 * scale).round() as u32).max(1),
        )
    }
}

/// A point in canvas-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Translates client (page) coordinates into coordinates local to a
    /// canvas whose top-left corner sits at `origin`.
    pub fn from_client(client_x: f32, client_y: f32, origin: Point) -> Self {
        Self::new(client_x - origin.x, client_y - origin.y)
    }
}

/// A decoded, immutable source image.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// The image data in RGBA format.
    pub data: RgbaImage,

    /// The format the bytes were decoded from, if it could be detected.
    pub format: Option<ImageFormat>,

    /// Size in bytes of the encoded file this image was decoded from.
    pub byte_len: usize,
}

impl SourceImage {
    /// Wraps an in-memory bitmap that did not come from a file.
    pub fn from_rgba(data: RgbaImage) -> Self {
        Self {
            data,
            format: None,
            byte_len: 0,
        }
    }

    /// Decodes an encoded image file.
    ///
    /// Failures are logged and returned as [`Error::Decode`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes).ok();
        let decoded = image::load_from_memory(bytes).map_err(|e| {
            error!(error = %e, len = bytes.len(), "image decode failed");
            Error::Decode(e)
        })?;
        let data = decoded.to_rgba8();
        debug!(
            width = data.width(),
            height = data.height(),
            format = ?format,
            "decoded source image"
        );
        Ok(Self {
            data,
            format,
            byte_len: bytes.len(),
        })
    }

    /// Returns the pixel dimensions of the image.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.data.width(), self.data.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::png_bytes;

    #[test]
    fn rect_px_new() {
        let rect = RectPx::new(10, 20, 100, 200);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 220);
        assert!(!rect.is_empty());
        assert!(RectPx::new(5, 5, 0, 10).is_empty());
    }

    #[test]
    fn rect_clamps_to_size() {
        let rect = RectPx::new(400, 450, 200, 100).clamp_to(SizePx::new(500, 500));
        assert_eq!(rect, RectPx::new(400, 450, 100, 50));

        let outside = RectPx::new(600, 10, 20, 20).clamp_to(SizePx::new(500, 500));
        assert!(outside.is_empty());
    }

    #[test]
    fn fit_within_preserves_aspect_and_never_upscales() {
        let bounds = SizePx::new(500, 500);
        assert_eq!(SizePx::new(200, 100).fit_within(bounds), SizePx::new(200, 100));
        assert_eq!(SizePx::new(500, 2000).fit_within(bounds), SizePx::new(125, 500));
        assert_eq!(SizePx::new(4000, 3000).fit_within(SizePx::new(1920, 1080)), SizePx::new(1440, 1080));
    }

    #[test]
    fn point_from_client() {
        let p = Point::from_client(130.0, 75.0, Point::new(100.0, 50.0));
        assert_eq!(p, Point::new(30.0, 25.0));
    }

    #[test]
    fn decode_png() {
        let bytes = png_bytes(12, 7);
        let source = SourceImage::decode(&bytes).unwrap();
        assert_eq!(source.dimensions(), SizePx::new(12, 7));
        assert_eq!(source.format, Some(ImageFormat::Png));
        assert_eq!(source.byte_len, bytes.len());
    }

    #[test]
    fn decode_garbage_fails() {
        let err = SourceImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }
}
