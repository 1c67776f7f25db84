//! The pure rendering contract shared by every feature unit.
//!
//! Each feature's parameters implement [`Render`]: given a [`RenderContext`]
//! holding a fresh copy of the source pixels, they redraw the whole output.
//! Nothing is carried over between renders, so an output is always a function
//! of `(source, parameters)`.
//!
//! Interactive units keep the latest drawing in a [`Redraw`] slot that is
//! invalidated explicitly whenever their state changes.

use image::RgbaImage;
use tracing::{debug, instrument};

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::error::Result;
use crate::raster::FontBook;
use crate::source::SourceImage;

// ============================================================================
// Render Context
// ============================================================================

/// Context passed to [`Render::render`].
pub struct RenderContext<'a> {
    /// The working image. Starts as a copy of the source pixels.
    pub image: RgbaImage,

    /// Fonts available for text rendering.
    pub fonts: &'a FontBook,
}

impl<'a> RenderContext<'a> {
    /// Creates a context whose working image is a copy of `source`.
    pub fn new(source: &SourceImage, fonts: &'a FontBook) -> Self {
        Self {
            image: source.data.clone(),
            fonts,
        }
    }
}

// ============================================================================
// Render Trait
// ============================================================================

/// How a rendered image is encoded and named for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub format: OutputFormat,
    /// JPEG quality (1-100); ignored by other formats.
    pub quality: Option<u8>,
    pub file_name: String,
}

impl OutputSpec {
    pub fn new(format: OutputFormat, file_name: impl Into<String>) -> Self {
        Self {
            format,
            quality: None,
            file_name: file_name.into(),
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }
}

/// Parameters of a feature that know how to draw themselves.
pub trait Render {
    /// Redraws `ctx.image` according to these parameters.
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()>;

    /// Describes the file produced from the rendered image.
    fn output(&self) -> OutputSpec;
}

/// Renders `params` over a fresh copy of `source`.
pub fn render_image<R: Render + ?Sized>(
    source: &SourceImage,
    params: &R,
    fonts: &FontBook,
) -> Result<RgbaImage> {
    let mut ctx = RenderContext::new(source, fonts);
    params.render(&mut ctx)?;
    Ok(ctx.image)
}

/// Renders `params` over `source` and encodes the result for download.
///
/// ```
/// use imgdash::{render_artifact, ConversionFormat, ConvertParams, FontBook, SourceImage};
/// use image::RgbaImage;
///
/// let source = SourceImage::from_rgba(RgbaImage::new(8, 4));
/// let params = ConvertParams::new(ConversionFormat::Jpeg);
/// let artifact = render_artifact(&source, &params, &FontBook::empty()).unwrap();
/// assert_eq!(artifact.file_name, "converted.jpeg");
/// ```
#[instrument(level = "debug", skip_all, fields(file = tracing::field::Empty))]
pub fn render_artifact<R: Render + ?Sized>(
    source: &SourceImage,
    params: &R,
    fonts: &FontBook,
) -> Result<OutputArtifact> {
    let spec = params.output();
    tracing::Span::current().record("file", spec.file_name.as_str());
    let image = render_image(source, params, fonts)?;
    OutputArtifact::encode(&image, spec.format, spec.quality, spec.file_name)
}

// ============================================================================
// Redraw slot
// ============================================================================

/// Holds the most recent drawing of an interactive unit plus a version that
/// increments on every state change.
///
/// The drawing is recomputed in full on the first access after
/// [`invalidate`](Self::invalidate); it is never patched incrementally.
#[derive(Debug, Default)]
pub struct Redraw {
    version: u64,
    drawn: Option<(u64, RgbaImage)>,
}

impl Redraw {
    /// Returns the current version number.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Marks the drawing stale.
    pub fn invalidate(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Returns true if the stored drawing is missing or older than the state.
    pub fn is_dirty(&self) -> bool {
        !matches!(self.drawn, Some((v, _)) if v == self.version)
    }

    /// Returns the current drawing, redrawing it with `draw` when dirty.
    pub fn get_or_redraw(&mut self, draw: impl FnOnce() -> RgbaImage) -> &RgbaImage {
        if self.is_dirty() {
            self.drawn = None;
        }
        let version = self.version;
        let (_, image) = self.drawn.get_or_insert_with(|| {
            debug!(version, "redrawing");
            (version, draw())
        });
        image
    }
}
