//! The dashboard: selected files, selected feature and the one live feature unit.
//!
//! Only the first selected file drives a feature. Selecting another feature or
//! another set of files replaces the live unit; units never share state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compress::CompressionSession;
use crate::config::Config;
use crate::convert::FormatConversion;
use crate::crop::CropSession;
use crate::error::{Error, Result};
use crate::favicon::FaviconGenerator;
use crate::raster::FontBook;
use crate::source::SourceImage;
use crate::watermark::WatermarkEditor;

/// A user-supplied file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Decodes the file contents.
    pub fn decode(&self) -> Result<SourceImage> {
        SourceImage::decode(&self.bytes).inspect_err(|_| debug!(file = %self.name, "cannot open file"))
    }
}

// ============================================================================
// Feature
// ============================================================================

/// The services offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum Feature {
    #[serde(rename = "convert")]
    #[cfg_attr(feature = "clap", value(name = "convert"))]
    FormatConversion,
    #[serde(rename = "compress")]
    #[cfg_attr(feature = "clap", value(name = "compress"))]
    Compression,
    #[serde(rename = "watermark")]
    Watermark,
    #[serde(rename = "crop")]
    #[cfg_attr(feature = "clap", value(name = "crop"))]
    Cropping,
    #[serde(rename = "favicon")]
    Favicon,
}

impl Feature {
    /// Every feature, in the order the dashboard lists them.
    pub const ALL: [Feature; 5] = [
        Feature::FormatConversion,
        Feature::Compression,
        Feature::Watermark,
        Feature::Cropping,
        Feature::Favicon,
    ];

    /// Name shown on the service button.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FormatConversion => "Format Conversion",
            Self::Compression => "Compression & Optimization",
            Self::Watermark => "Add Watermark",
            Self::Cropping => "Cropping",
            Self::Favicon => "Icon Maker",
        }
    }

    /// Short identifier used in job files and on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Self::FormatConversion => "convert",
            Self::Compression => "compress",
            Self::Watermark => "watermark",
            Self::Cropping => "crop",
            Self::Favicon => "favicon",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Accepts either the short id (`crop`) or the display name (`Cropping`).
impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.id() == s || f.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownFeature(s.to_owned()))
    }
}

// ============================================================================
// Feature units
// ============================================================================

/// The live editing unit for the selected feature.
#[derive(Debug)]
pub enum FeatureUnit {
    Convert(FormatConversion),
    Compress(CompressionSession),
    Watermark(WatermarkEditor),
    Crop(CropSession),
    Favicon(FaviconGenerator),
}

impl FeatureUnit {
    /// Creates the unit for `feature` over `source`.
    pub fn new(feature: Feature, source: SourceImage, fonts: &FontBook, config: &Config) -> Result<Self> {
        Ok(match feature {
            Feature::FormatConversion => Self::Convert(FormatConversion::new(source)),
            Feature::Compression => Self::Compress(CompressionSession::new(
                source,
                config.compression.params(None),
                fonts.clone(),
            )),
            Feature::Watermark => Self::Watermark(
                WatermarkEditor::new(source, fonts.clone()).with_style(config.watermark.clone()),
            ),
            Feature::Cropping => Self::Crop(CropSession::with_viewport(source, config.crop.viewport)),
            Feature::Favicon => Self::Favicon(FaviconGenerator::new(
                source,
                config.favicon.clone(),
                fonts.clone(),
            )?),
        })
    }

    pub fn feature(&self) -> Feature {
        match self {
            Self::Convert(_) => Feature::FormatConversion,
            Self::Compress(_) => Feature::Compression,
            Self::Watermark(_) => Feature::Watermark,
            Self::Crop(_) => Feature::Cropping,
            Self::Favicon(_) => Feature::Favicon,
        }
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Holds the selected files and feature, and the unit built from them.
#[derive(Debug)]
pub struct Dashboard {
    config: Config,
    fonts: FontBook,
    files: Vec<SourceFile>,
    selected: Option<Feature>,
    unit: Option<FeatureUnit>,
}

impl Dashboard {
    pub fn new(config: Config, fonts: FontBook) -> Self {
        Self {
            config,
            fonts,
            files: Vec::new(),
            selected: None,
            unit: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// The file shown in the upload preview: the first selected one.
    pub fn preview(&self) -> Option<&SourceFile> {
        self.files.first()
    }

    pub fn selected_feature(&self) -> Option<Feature> {
        self.selected
    }

    /// Replaces the selected files and returns how many were selected.
    ///
    /// An empty selection is ignored and keeps the previous files. If a
    /// feature is selected, its unit is rebuilt for the new first file.
    pub fn select_files(&mut self, files: Vec<SourceFile>) -> Result<usize> {
        if files.is_empty() {
            return Ok(0);
        }
        let count = files.len();
        self.files = files;
        info!(count, "{count} file(s) selected");

        self.unit = None;
        if let Some(feature) = self.selected {
            self.build_unit(feature)?;
        }
        Ok(count)
    }

    /// Selects `feature` and builds its unit for the first file.
    ///
    /// Returns `None` while no file has been selected.
    pub fn select_feature(&mut self, feature: Feature) -> Result<Option<&mut FeatureUnit>> {
        self.selected = Some(feature);
        self.unit = None;
        self.build_unit(feature)?;
        Ok(self.unit.as_mut())
    }

    fn build_unit(&mut self, feature: Feature) -> Result<()> {
        let Some(first) = self.files.first() else {
            return Ok(());
        };
        let source = first.decode()?;
        debug!(%feature, file = %first.name, "opening feature");
        self.unit = Some(FeatureUnit::new(feature, source, &self.fonts, &self.config)?);
        Ok(())
    }

    pub fn unit(&self) -> Option<&FeatureUnit> {
        self.unit.as_ref()
    }

    pub fn unit_mut(&mut self) -> Option<&mut FeatureUnit> {
        self.unit.as_mut()
    }
}
