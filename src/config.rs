//! Dashboard configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compress::{CompressParams, DEFAULT_MAX_SIZE, DEFAULT_QUALITY};
use crate::crop::DEFAULT_VIEWPORT;
use crate::error::Result;
use crate::favicon::FaviconConfig;
use crate::source::SizePx;
use crate::watermark::WatermarkStyle;

/// Settings shared by the CLI and the canvas bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Config {
    pub compression: CompressionConfig,
    pub crop: CropConfig,
    /// Style given to new watermarks.
    pub watermark: WatermarkStyle,
    /// Starting point for new icons.
    pub favicon: FaviconConfig,
    /// Default log filter, overridden by `IMGDASH_LOG`.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            compression: CompressionConfig::default(),
            crop: CropConfig::default(),
            watermark: WatermarkStyle::default(),
            favicon: FaviconConfig::default(),
            log_level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CompressionConfig {
    /// Quality a compression unit starts at.
    pub quality: u8,
    /// Compressed output never exceeds these bounds.
    pub max_size: SizePx,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            max_size: DEFAULT_MAX_SIZE,
        }
    }
}

impl CompressionConfig {
    /// Compression parameters at `quality`, or the configured default.
    pub fn params(&self, quality: Option<u8>) -> CompressParams {
        CompressParams::new(quality.unwrap_or(self.quality)).with_max_size(self.max_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CropConfig {
    /// Size of the canvas the image is displayed and cropped on.
    pub viewport: SizePx,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Returns the JSON schema for the configuration file.
    #[cfg(feature = "jsonschema")]
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::HexColor;
    use crate::error::Error;

    #[test]
    fn empty_object_is_all_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.compression.max_size, SizePx::new(1920, 1080));
        assert_eq!(config.crop.viewport, SizePx::new(500, 500));
        assert_eq!(config.watermark.font_size, 48.0);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let json = r##"{
            "compression": { "quality": 40 },
            "watermark": { "color": "#ff0000", "opacity": 0.8 },
            "favicon": { "size": 64 }
        }"##;
        let config = Config::from_json(json).unwrap();

        assert_eq!(config.compression.quality, 40);
        assert_eq!(config.compression.max_size, DEFAULT_MAX_SIZE);
        assert_eq!(config.watermark.color, HexColor::rgb(255, 0, 0));
        assert_eq!(config.watermark.font_family, "Arial");
        assert_eq!(config.favicon.size, 64);
        assert_eq!(config.favicon.font_size, 20);
    }

    #[test]
    fn compression_params_use_configured_bounds() {
        let config = CompressionConfig {
            quality: 55,
            max_size: SizePx::new(800, 600),
        };
        assert_eq!(config.params(None).quality, 55);
        assert_eq!(config.params(Some(0)).quality, 1);
        assert_eq!(config.params(None).max_size, SizePx::new(800, 600));
    }

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imgdash.json");
        let mut config = Config::default();
        config.crop.viewport = SizePx::new(640, 480);
        std::fs::write(&path, config.to_json().unwrap()).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn invalid_json_and_colours_fail() {
        assert!(matches!(Config::from_json("{"), Err(Error::Json(_))));
        assert!(Config::from_json(r#"{"watermark":{"color":"red"}}"#).is_err());
        assert!(matches!(Config::load("/nonexistent/imgdash.json"), Err(Error::Io(_))));
    }
}
