//! Format conversion: redraw the source verbatim and re-encode it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::error::Result;
use crate::raster::FontBook;
use crate::render::{render_artifact, OutputSpec, Render, RenderContext};
use crate::source::SourceImage;

/// Encodings a source image can be converted to.
///
/// Icons are produced by the favicon unit only, so ICO is not offered here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum ConversionFormat {
    #[default]
    Png,
    Jpeg,
    #[cfg_attr(feature = "clap", value(name = "webp"))]
    WebP,
}

/// Formats offered by the conversion picker, in display order.
pub const CONVERSION_FORMATS: [ConversionFormat; 3] =
    [ConversionFormat::Png, ConversionFormat::Jpeg, ConversionFormat::WebP];

impl From<ConversionFormat> for OutputFormat {
    fn from(format: ConversionFormat) -> Self {
        match format {
            ConversionFormat::Png => OutputFormat::Png,
            ConversionFormat::Jpeg => OutputFormat::Jpeg,
            ConversionFormat::WebP => OutputFormat::WebP,
        }
    }
}

impl fmt::Display for ConversionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        OutputFormat::from(*self).fmt(f)
    }
}

/// Parameters for format conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ConvertParams {
    /// Target encoding.
    pub format: ConversionFormat,
}

impl ConvertParams {
    pub fn new(format: ConversionFormat) -> Self {
        Self { format }
    }
}

impl Render for ConvertParams {
    /// Conversion draws the source at its natural size, so the pixels pass
    /// through unchanged.
    fn render(&self, _ctx: &mut RenderContext<'_>) -> Result<()> {
        Ok(())
    }

    fn output(&self) -> OutputSpec {
        let format = OutputFormat::from(self.format);
        OutputSpec::new(format, format!("converted.{}", format.extension()))
    }
}

/// Format conversion unit for one source image.
#[derive(Debug)]
pub struct FormatConversion {
    source: SourceImage,
    params: ConvertParams,
    converted: Option<OutputArtifact>,
}

impl FormatConversion {
    /// Creates a converter targeting PNG, the first option offered.
    pub fn new(source: SourceImage) -> Self {
        Self {
            source,
            params: ConvertParams::default(),
            converted: None,
        }
    }

    pub fn format(&self) -> ConversionFormat {
        self.params.format
    }

    pub fn set_format(&mut self, format: ConversionFormat) {
        self.params.format = format;
    }

    /// Converts the source into the selected format.
    ///
    /// The last successful result stays available through
    /// [`converted`](Self::converted).
    pub fn convert(&mut self, fonts: &FontBook) -> Result<&OutputArtifact> {
        let artifact = render_artifact(&self.source, &self.params, fonts)?;
        Ok(self.converted.insert(artifact))
    }

    pub fn converted(&self) -> Option<&OutputArtifact> {
        self.converted.as_ref()
    }
}
