//! JPEG compression with a bounded output size.

use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::error::Result;
use crate::raster::FontBook;
use crate::render::{render_artifact, OutputSpec, Render, RenderContext};
use crate::source::{SizePx, SourceImage};

/// Lowest accepted quality.
pub const MIN_QUALITY: u8 = 1;
/// Highest accepted quality.
pub const MAX_QUALITY: u8 = 100;
/// Quality selected when a compression unit opens.
pub const DEFAULT_QUALITY: u8 = 80;
/// Largest output the compressor produces unless configured otherwise.
pub const DEFAULT_MAX_SIZE: SizePx = SizePx {
    width: 1920,
    height: 1080,
};

/// Parameters for JPEG compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CompressParams {
    /// JPEG quality, 1-100.
    pub quality: u8,

    /// Output is scaled down to fit these bounds, preserving aspect ratio.
    #[serde(default = "default_max_size")]
    pub max_size: SizePx,
}

fn default_max_size() -> SizePx {
    DEFAULT_MAX_SIZE
}

impl Default for CompressParams {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl CompressParams {
    /// Creates parameters with `quality` clamped to 1-100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(MIN_QUALITY, MAX_QUALITY),
            ..Self::default()
        }
    }

    pub fn with_max_size(mut self, max_size: SizePx) -> Self {
        self.max_size = max_size;
        self
    }
}

impl Render for CompressParams {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let current = SizePx::new(ctx.image.width(), ctx.image.height());
        let target = current.fit_within(self.max_size);
        if target != current {
            debug!(?current, ?target, "constraining image before compression");
            ctx.image = imageops::resize(&ctx.image, target.width, target.height, FilterType::Lanczos3);
        }
        Ok(())
    }

    fn output(&self) -> OutputSpec {
        OutputSpec::new(OutputFormat::Jpeg, "compressed.jpg")
            .with_quality(self.quality.clamp(MIN_QUALITY, MAX_QUALITY))
    }
}

/// Before/after sizes for a compression run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionReport {
    pub original_bytes: usize,
    pub compressed_bytes: usize,
}

impl CompressionReport {
    /// Compressed size as a fraction of the original (0 when unknown).
    pub fn ratio(&self) -> f64 {
        if self.original_bytes == 0 {
            0.0
        } else {
            self.compressed_bytes as f64 / self.original_bytes as f64
        }
    }

    /// Formats a byte count in kilobytes with two decimals (`"12.34 KB"`).
    pub fn kilobytes(bytes: usize) -> String {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    }
}

/// Compression unit: recompresses on every quality change.
#[derive(Debug)]
pub struct CompressionSession {
    source: SourceImage,
    params: CompressParams,
    fonts: FontBook,
    compressed: Option<OutputArtifact>,
}

impl CompressionSession {
    pub fn new(source: SourceImage, params: CompressParams, fonts: FontBook) -> Self {
        Self {
            source,
            params,
            fonts,
            compressed: None,
        }
    }

    pub fn quality(&self) -> u8 {
        self.params.quality
    }

    /// Sets the quality (clamped to 1-100) and recompresses immediately.
    pub fn set_quality(&mut self, quality: u8) -> Result<&OutputArtifact> {
        self.params.quality = quality.clamp(MIN_QUALITY, MAX_QUALITY);
        self.compress()
    }

    /// Compresses the source at the current quality.
    pub fn compress(&mut self) -> Result<&OutputArtifact> {
        let artifact = render_artifact(&self.source, &self.params, &self.fonts)?;
        Ok(self.compressed.insert(artifact))
    }

    pub fn compressed(&self) -> Option<&OutputArtifact> {
        self.compressed.as_ref()
    }

    /// Before/after sizes of the latest result.
    pub fn report(&self) -> Option<CompressionReport> {
        self.compressed.as_ref().map(|artifact| CompressionReport {
            original_bytes: self.source.byte_len,
            compressed_bytes: artifact.size(),
        })
    }
}
