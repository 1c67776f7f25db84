//! Output formats and encoded, downloadable artifacts.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::source::SizePx;

/// Default JPEG quality for formats that need one but were given none.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Encodings a feature unit can export to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    #[cfg_attr(feature = "clap", value(name = "webp"))]
    WebP,
    Ico,
}

impl OutputFormat {
    /// The file extension, which is also the format's name (`converted.jpeg`).
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
            Self::Ico => "ico",
        }
    }

    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Ico => "image/x-icon",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered, encoded file ready to be saved or handed to a browser.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputArtifact {
    /// File name offered for download.
    pub file_name: String,
    /// Encoding of `bytes`.
    pub format: OutputFormat,
    /// Pixel dimensions of the encoded image.
    pub dimensions: SizePx,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl OutputArtifact {
    /// Encodes `image` and names the result `file_name`.
    ///
    /// `quality` (1-100) only applies to JPEG; other formats ignore it.
    pub fn encode(
        image: &RgbaImage,
        format: OutputFormat,
        quality: Option<u8>,
        file_name: impl Into<String>,
    ) -> Result<Self> {
        let bytes = encode_image(image, format, quality)?;
        let artifact = Self {
            file_name: file_name.into(),
            format,
            dimensions: SizePx::new(image.width(), image.height()),
            bytes,
        };
        info!(
            file = %artifact.file_name,
            format = %format,
            width = image.width(),
            height = image.height(),
            bytes = artifact.size(),
            "encoded artifact"
        );
        Ok(artifact)
    }

    /// Size of the encoded file in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    /// Writes the artifact into `dir` under its file name and returns the path.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), "saved artifact");
        Ok(path)
    }
}

/// Encode an RGBA image to bytes in the requested format.
pub fn encode_image(image: &RgbaImage, format: OutputFormat, quality: Option<u8>) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    let err = |source: image::ImageError| Error::Encode {
        format: format.extension(),
        source,
    };

    match format {
        OutputFormat::Jpeg => {
            let quality = quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100);
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            flatten_on_black(image).write_with_encoder(encoder).map_err(err)?;
        }
        OutputFormat::Png => write_dynamic(image, ImageFormat::Png, &mut buffer).map_err(err)?,
        OutputFormat::WebP => write_dynamic(image, ImageFormat::WebP, &mut buffer).map_err(err)?,
        OutputFormat::Ico => write_dynamic(image, ImageFormat::Ico, &mut buffer).map_err(err)?,
    }

    Ok(buffer.into_inner())
}

fn write_dynamic(
    image: &RgbaImage,
    format: ImageFormat,
    buffer: &mut Cursor<Vec<u8>>,
) -> image::ImageResult<()> {
    DynamicImage::ImageRgba8(image.clone()).write_to(buffer, format)
}

/// Drops the alpha channel the way a canvas does for JPEG: transparent
/// regions become black.
fn flatten_on_black(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let scale = |c: u8| ((c as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}
