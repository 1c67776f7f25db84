//! Error types shared by every feature unit.

use thiserror::Error;

/// Result type alias for dashboard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, editing or exporting an image.
#[derive(Debug, Error)]
pub enum Error {
    /// The input bytes could not be decoded as an image.
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The output image could not be encoded.
    #[error("failed to encode {format}: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },

    /// A crop selection with zero width or height was confirmed.
    #[error("the crop selection is empty; drag a rectangle before cropping")]
    EmptySelection,

    /// A requested output size is outside the supported range.
    #[error("invalid size {size}: expected {min}..={max}")]
    InvalidSize { size: u32, min: u32, max: u32 },

    /// A feature name did not match any dashboard service.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// IO error while reading input or saving an artifact.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration or job profile could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
