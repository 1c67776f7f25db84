//! In-memory fixtures for unit tests.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::raster::FontBook;
use crate::source::SourceImage;

/// A deterministic gradient with some high-frequency detail so encoders have work to do.
pub fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let noise = ((x * 31 + y * 17) % 23) as u8 * 5;
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            noise,
            255,
        ])
    })
}

pub fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut buf, ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

pub fn source(width: u32, height: u32) -> SourceImage {
    SourceImage::decode(&png_bytes(width, height)).unwrap()
}

/// Installed fonts, or `None` on hosts without any; glyph tests skip then.
pub fn system_fonts() -> Option<FontBook> {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        eprintln!("no system fonts installed, skipping");
        return None;
    }
    Some(fonts)
}

/// Bounding box `(min_x, min_y, max_x, max_y)` of pixels where `a` and `b` differ.
pub fn changed_area(a: &RgbaImage, b: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
    a.enumerate_pixels()
        .filter(|&(x, y, p)| p != b.get_pixel(x, y))
        .fold(None, |area, (x, y, _)| {
            Some(match area {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            })
        })
}
