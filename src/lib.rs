//! imgdash: image editing dashboard library
//!
//! This crate provides the feature units of an image editing dashboard:
//! format conversion, JPEG compression, a multi-entry watermark editor,
//! cropping and a favicon / icon generator. Every unit works on an in-memory
//! RGBA raster and produces an [`OutputArtifact`] (file name, format and
//! encoded bytes) ready to be saved or handed to a browser.
//!
//! # Example
//!
//! ```
//! use imgdash::{Dashboard, Config, Feature, FeatureUnit, FontBook, SourceFile};
//! use image::{ImageFormat, RgbaImage};
//! use std::io::Cursor;
//!
//! let mut png = Cursor::new(Vec::new());
//! RgbaImage::new(64, 32).write_to(&mut png, ImageFormat::Png).unwrap();
//!
//! let mut dashboard = Dashboard::new(Config::default(), FontBook::empty());
//! dashboard.select_files(vec![SourceFile::new("photo.png", png.into_inner())]).unwrap();
//!
//! if let Some(FeatureUnit::Compress(session)) = dashboard.select_feature(Feature::Compression).unwrap() {
//!     let artifact = session.set_quality(60).unwrap();
//!     assert_eq!(artifact.file_name, "compressed.jpg");
//! }
//! ```
//!
//! # Pure rendering
//!
//! Each feature's parameters implement [`Render`], so any of them can be
//! applied to a source image in one call with [`render_artifact`]:
//!
//! ```
//! use imgdash::{render_artifact, CropParams, CropRegion, FontBook, Point, SourceImage};
//! use image::RgbaImage;
//!
//! let source = SourceImage::from_rgba(RgbaImage::new(300, 200));
//! let region = CropRegion::new(Point::new(10.0, 10.0), Point::new(110.0, 60.0));
//!
//! let artifact = render_artifact(&source, &CropParams::new(region), &FontBook::empty()).unwrap();
//! assert_eq!((artifact.dimensions.width, artifact.dimensions.height), (100, 50));
//! ```

mod artifact;
mod color;
mod compress;
mod config;
mod convert;
mod crop;
mod dashboard;
mod error;
mod favicon;
mod profile;
mod raster;
mod render;
mod source;
mod watermark;

#[cfg(feature = "canvas")]
mod canvas;

#[cfg(test)]
mod test_util;

pub use artifact::{encode_image, OutputArtifact, OutputFormat, DEFAULT_JPEG_QUALITY};
#[cfg(feature = "canvas")]
pub use canvas::{FaviconCanvas, WatermarkCanvas};
pub use color::{HexColor, InvalidHexColor};
pub use compress::{CompressParams, CompressionReport, CompressionSession, DEFAULT_MAX_SIZE, DEFAULT_QUALITY};
pub use config::{CompressionConfig, Config, CropConfig};
pub use convert::{ConversionFormat, ConvertParams, FormatConversion, CONVERSION_FORMATS};
pub use crop::{fit_to_viewport, CropParams, CropRegion, CropSession, DEFAULT_VIEWPORT};
pub use dashboard::{Dashboard, Feature, FeatureUnit, SourceFile};
pub use error::{Error, Result};
pub use favicon::{
    BackgroundMode, FaviconConfig, FaviconGenerator, IconFormat, Shape, FONT_CHOICES, MAX_FONT_SIZE,
    MAX_ICON_SIZE, MIN_FONT_SIZE, MIN_ICON_SIZE, STANDARD_SIZES,
};
pub use profile::{CompressSettings, CropSettings, Job, WatermarkSettings};
pub use raster::{FixedAdvance, FontBook, TextMeasurer, TextMetrics};
pub use render::{render_artifact, render_image, OutputSpec, Redraw, Render, RenderContext};
pub use source::{Point, RectPx, SizePx, SourceImage};
pub use watermark::{
    TextBounds, TextEditField, Watermark, WatermarkEditor, WatermarkId, WatermarkSet, WatermarkStyle,
};
