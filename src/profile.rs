//! Serializable job profiles for batch and cross-process use.
//!
//! A [`Job`] names one feature and carries its parameters. It is what the CLI's
//! `run` command reads and what a frontend can send to a worker.
//!
//! # Example
//!
//! ```
//! use imgdash::{Config, FontBook, Job, SourceImage};
//! use image::RgbaImage;
//!
//! let job = Job::from_json(r#"{ "feature": "compress", "quality": 60 }"#).unwrap();
//!
//! let source = SourceImage::from_rgba(RgbaImage::new(64, 48));
//! let artifact = job.run(&source, &FontBook::empty(), &Config::default()).unwrap();
//! assert_eq!(artifact.file_name, "compressed.jpg");
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::OutputArtifact;
use crate::color::HexColor;
use crate::config::Config;
use crate::convert::ConvertParams;
use crate::crop::{CropParams, CropRegion};
use crate::dashboard::Feature;
use crate::error::Result;
use crate::favicon::FaviconConfig;
use crate::raster::FontBook;
use crate::render::render_artifact;
use crate::source::{SizePx, SourceImage};
use crate::watermark::{Watermark, WatermarkId, WatermarkSet, WatermarkStyle};

// ============================================================================
// Job settings (serializable)
// ============================================================================

/// Compression settings; absent fields fall back to the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CompressSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<SizePx>,
}

/// One watermark line; unset styling comes from the configured defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct WatermarkSettings {
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<HexColor>,
}

impl WatermarkSettings {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn to_watermark(&self, id: WatermarkId, style: &WatermarkStyle) -> Watermark {
        let mut watermark = Watermark::new(id, self.text.clone(), style);
        watermark.x = self.x.unwrap_or(watermark.x);
        watermark.y = self.y.unwrap_or(watermark.y);
        watermark.font_size = self.font_size.unwrap_or(watermark.font_size).max(1.0);
        watermark.opacity = self.opacity.unwrap_or(watermark.opacity).clamp(0.0, 1.0);
        watermark.color = self.color.unwrap_or(watermark.color);
        watermark
    }
}

impl From<&Watermark> for WatermarkSettings {
    fn from(watermark: &Watermark) -> Self {
        Self {
            text: watermark.text.clone(),
            x: Some(watermark.x),
            y: Some(watermark.y),
            font_size: Some(watermark.font_size),
            opacity: Some(watermark.opacity),
            color: Some(watermark.color),
        }
    }
}

/// Crop settings; the viewport defaults to the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CropSettings {
    #[serde(flatten)]
    pub region: CropRegion,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewport: Option<SizePx>,
}

// ============================================================================
// Job
// ============================================================================

/// One feature applied to one image.
///
/// # JSON Format
///
/// ```json
/// { "feature": "watermark", "watermarks": [{ "text": "Draft", "x": 10 }] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "feature", rename_all = "kebab-case")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Job {
    Convert(ConvertParams),
    Compress(CompressSettings),
    Watermark {
        watermarks: Vec<WatermarkSettings>,
    },
    Crop(CropSettings),
    Favicon(FaviconConfig),
}

impl Job {
    /// The dashboard feature this job belongs to.
    pub fn feature(&self) -> Feature {
        match self {
            Self::Convert(_) => Feature::FormatConversion,
            Self::Compress(_) => Feature::Compression,
            Self::Watermark { .. } => Feature::Watermark,
            Self::Crop(_) => Feature::Cropping,
            Self::Favicon(_) => Feature::Favicon,
        }
    }

    /// Renders the job over `source` and encodes the result.
    pub fn run(&self, source: &SourceImage, fonts: &FontBook, config: &Config) -> Result<OutputArtifact> {
        info!(feature = %self.feature(), "running job");
        match self {
            Self::Convert(params) => render_artifact(source, params, fonts),
            Self::Compress(settings) => {
                let mut params = config.compression.params(settings.quality);
                if let Some(max_size) = settings.max_size {
                    params = params.with_max_size(max_size);
                }
                render_artifact(source, &params, fonts)
            }
            Self::Watermark { watermarks } => {
                let set = WatermarkSet::new(
                    watermarks
                        .iter()
                        .zip(1..)
                        .map(|(settings, id)| settings.to_watermark(WatermarkId(id), &config.watermark))
                        .collect(),
                );
                render_artifact(source, &set, fonts)
            }
            Self::Crop(settings) => {
                let params = CropParams {
                    region: settings.region,
                    viewport: settings.viewport.unwrap_or(config.crop.viewport),
                };
                render_artifact(source, &params, fonts)
            }
            Self::Favicon(favicon) => render_artifact(source, favicon, fonts),
        }
    }

    /// Serializes the job to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the job to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a job from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::OutputFormat;
    use crate::convert::ConversionFormat;
    use crate::error::Error;
    use crate::test_util::source;

    fn run(job: &Job) -> Result<OutputArtifact> {
        job.run(&source(120, 80), &FontBook::empty(), &Config::default())
    }

    #[test]
    fn job_json_is_tagged_by_feature() {
        let job = Job::Convert(ConvertParams::new(ConversionFormat::WebP));
        let json = job.to_json().unwrap();
        assert_eq!(json, r#"{"feature":"convert","format":"webp"}"#);
        assert_eq!(Job::from_json(&json).unwrap(), job);
    }

    #[test]
    fn convert_job() {
        let job = Job::from_json(r#"{"feature":"convert","format":"jpeg"}"#).unwrap();
        let artifact = run(&job).unwrap();
        assert_eq!(artifact.file_name, "converted.jpeg");
        assert_eq!(artifact.dimensions, SizePx::new(120, 80));
    }

    #[test]
    fn compress_job_uses_config_and_overrides() {
        let job = Job::from_json(r#"{"feature":"compress","maxSize":{"width":60,"height":60}}"#).unwrap();
        let artifact = run(&job).unwrap();
        assert_eq!(artifact.format, OutputFormat::Jpeg);
        assert_eq!(artifact.dimensions, SizePx::new(60, 40));
    }

    #[test]
    fn crop_job_flattens_region() {
        let json = r#"{"feature":"crop","startX":110,"startY":60,"endX":10,"endY":10}"#;
        let job = Job::from_json(json).unwrap();
        assert_eq!(job.feature(), Feature::Cropping);

        let artifact = run(&job).unwrap();
        assert_eq!(artifact.file_name, "cropped.png");
        assert_eq!(artifact.dimensions, SizePx::new(100, 50));
    }

    #[test]
    fn empty_crop_job_fails() {
        let json = r#"{"feature":"crop","startX":5,"startY":5,"endX":5,"endY":50}"#;
        let err = run(&Job::from_json(json).unwrap()).unwrap_err();
        assert!(matches!(err, Error::EmptySelection));
    }

    #[test]
    fn watermark_settings_fill_from_style() {
        let style = WatermarkStyle::default();
        let settings = WatermarkSettings {
            x: Some(5.0),
            opacity: Some(3.0),
            ..WatermarkSettings::new("Draft")
        };
        let watermark = settings.to_watermark(WatermarkId(1), &style);

        assert_eq!((watermark.x, watermark.y), (5.0, style.y));
        assert_eq!(watermark.opacity, 1.0);
        assert_eq!(watermark.font_size, style.font_size);
        assert_eq!(WatermarkSettings::from(&watermark).x, Some(5.0));
    }

    #[test]
    fn watermark_job_keeps_dimensions() {
        let job = Job::from_json(r#"{"feature":"watermark","watermarks":[{"text":"Draft"},{"text":"Copy","y":40}]}"#).unwrap();
        let artifact = run(&job).unwrap();
        assert_eq!(artifact.file_name, "watermarked_image.png");
        assert_eq!(artifact.dimensions, SizePx::new(120, 80));
    }

    #[test]
    fn favicon_job_with_defaults() {
        let job = Job::from_json(r#"{"feature":"favicon","size":48,"exportFormat":"ico","fileName":"site"}"#).unwrap();
        let artifact = run(&job).unwrap();
        assert_eq!(artifact.file_name, "site.ico");
        assert_eq!(artifact.dimensions, SizePx::new(48, 48));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        assert!(Job::from_json(r#"{"feature":"sharpen"}"#).is_err());
    }

    #[test]
    fn convert_job_rejects_icon_format() {
        let err = Job::from_json(r#"{"feature":"convert","format":"ico"}"#).unwrap_err();
        assert!(matches!(err, Error::Json(_)), "{err:?}");
    }
}
