//! Rasterization helpers built on resvg/usvg.
//!
//! Text and vector outlines are described as small SVG documents and rendered
//! with resvg into an [`RgbaImage`] the size of the target canvas, which is then
//! laid over the working image with [`image::imageops::overlay`].

use std::borrow::Cow;
use std::fmt::Write as _;
use std::sync::Arc;

use image::RgbaImage;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};
use tracing::{debug, warn};

use crate::color::HexColor;
use crate::source::SizePx;

/// Average glyph advance (as a fraction of the font size) used when no font
/// in the database can render a piece of text.
const FALLBACK_ADVANCE: f32 = 0.6;

// ============================================================================
// FontBook
// ============================================================================

/// A shared font database used for rendering and measuring text.
///
/// Cloning is cheap; clones share the same database.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<fontdb::Database>,
}

impl FontBook {
    /// Creates a font book with every font installed on the system.
    pub fn system() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        debug!(faces = db.len(), "loaded system fonts");
        Self::from_database(db)
    }

    /// Creates a font book without any fonts. Text renders as nothing.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(fontdb::Database::new()),
        }
    }

    /// Creates a font book from in-memory font files (TTF, OTF or collections).
    ///
    /// Used where no system fonts exist, such as in a browser.
    pub fn from_font_data(fonts: impl IntoIterator<Item = Vec<u8>>) -> Self {
        let mut db = fontdb::Database::new();
        for data in fonts {
            db.load_font_data(data);
        }
        debug!(faces = db.len(), "loaded font data");
        Self::from_database(db)
    }

    fn from_database(mut db: fontdb::Database) -> Self {
        resolve_sans_serif(&mut db);
        Self { db: Arc::new(db) }
    }

    /// The family that `sans-serif` (and so any unknown family) resolves to.
    pub fn fallback_family(&self) -> &str {
        self.db.family_name(&fontdb::Family::SansSerif)
    }

    /// Returns the number of font faces available.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Returns true if no font faces are available.
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    fn options(&self) -> Options<'static> {
        Options {
            fontdb: Arc::clone(&self.db),
            ..Options::default()
        }
    }

    /// Renders an SVG document at its natural size.
    ///
    /// Returns `None` if the SVG cannot be parsed or has an empty size.
    pub fn render_svg(&self, svg_data: &str) -> Option<RgbaImage> {
        let tree = match Tree::from_str(svg_data, &self.options()) {
            Ok(tree) => tree,
            Err(e) => {
                warn!(error = %e, "failed to parse generated svg");
                return None;
            }
        };

        let size = tree.size();
        let mut pixmap = Pixmap::new(size.width().ceil() as u32, size.height().ceil() as u32)?;
        resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

        Some(pixmap_to_rgba_image(&pixmap))
    }
}

/// Points `sans-serif` at a loaded family when its default (Arial) is missing.
///
/// Every text run lists `sans-serif` as its fallback family.
fn resolve_sans_serif(db: &mut fontdb::Database) {
    let current = db.family_name(&fontdb::Family::SansSerif).to_owned();
    let families: Vec<String> = db
        .faces()
        .filter_map(|face| face.families.first().map(|(name, _)| name.clone()))
        .collect();
    if families.iter().any(|name| name.eq_ignore_ascii_case(&current)) {
        return;
    }

    let Some(family) = families
        .iter()
        .find(|name| name.contains("Sans") && !name.contains("Mono"))
        .or_else(|| families.first())
    else {
        return;
    };
    debug!(missing = %current, %family, "sans-serif fallback remapped");
    db.set_sans_serif_family(family.clone());
}

impl std::fmt::Debug for FontBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontBook").field("faces", &self.db.len()).finish()
    }
}

impl Default for FontBook {
    fn default() -> Self {
        Self::system()
    }
}

// ============================================================================
// Text measurement
// ============================================================================

/// Width and height of a rendered line of text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
}

/// Measures single-line text for hit-testing and edit-field placement.
pub trait TextMeasurer {
    fn measure(&self, text: &str, font_family: &str, font_size: f32) -> TextMetrics;
}

/// Measures from the outline bounds of the shaped text, without rasterizing.
///
/// Width runs from x = 0 to the right edge of the last glyph. Height is the
/// font size, as with canvas text boxes.
impl TextMeasurer for FontBook {
    fn measure(&self, text: &str, font_family: &str, font_size: f32) -> TextMetrics {
        let height = font_size.max(0.0);
        if text.trim().is_empty() || font_size <= 0.0 {
            return TextMetrics { width: 0.0, height };
        }

        let style = TextStyle {
            font_family,
            font_size,
            color: HexColor::BLACK,
            opacity: 1.0,
            anchor: TextAnchor::Start,
        };
        let mut svg = SvgCanvas::new(SizePx::new(1, 1));
        svg.text(0.0, 0.0, text, &style);

        let right = Tree::from_str(&svg.finish(), &self.options())
            .ok()
            .filter(|tree| tree.root().has_children())
            .map(|tree| tree.root().bounding_box().right());

        match right {
            Some(right) if right > 0.0 => TextMetrics {
                width: right.ceil(),
                height,
            },
            _ => FixedAdvance(FALLBACK_ADVANCE).measure(text, font_family, font_size),
        }
    }
}

/// Deterministic metrics: every character advances by `font_size * self.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance(pub f32);

impl TextMeasurer for FixedAdvance {
    fn measure(&self, text: &str, _font_family: &str, font_size: f32) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f32 * font_size * self.0,
            height: font_size.max(0.0),
        }
    }
}

// ============================================================================
// SVG document builder
// ============================================================================

/// Horizontal alignment of a text run relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    /// `(x, y)` is the top-left corner of the text box.
    Start,
    /// `(x, y)` is the centre of the text box.
    Middle,
}

/// Styling for one text run.
#[derive(Debug, Clone)]
pub struct TextStyle<'a> {
    pub font_family: &'a str,
    pub font_size: f32,
    pub color: HexColor,
    pub opacity: f32,
    pub anchor: TextAnchor,
}

/// Accumulates shapes into an SVG document covering a whole canvas.
pub struct SvgCanvas {
    size: SizePx,
    body: String,
}

impl SvgCanvas {
    pub fn new(size: SizePx) -> Self {
        Self {
            size,
            body: String::new(),
        }
    }

    /// Adds a line of text. Empty text is skipped.
    pub fn text(&mut self, x: f32, y: f32, text: &str, style: &TextStyle<'_>) {
        if text.is_empty() {
            return;
        }
        let (anchor, baseline) = match style.anchor {
            TextAnchor::Start => ("start", "hanging"),
            TextAnchor::Middle => ("middle", "central"),
        };
        let _ = write!(
            self.body,
            r#"<text x="{x}" y="{y}" font-family="{family}, sans-serif" font-size="{size}" fill="{fill}" fill-opacity="{opacity}" text-anchor="{anchor}" dominant-baseline="{baseline}" xml:space="preserve">{text}</text>"#,
            family = escape_xml(style.font_family),
            size = style.font_size,
            fill = style.color,
            opacity = style.opacity.clamp(0.0, 1.0),
            text = escape_xml(text),
        );
    }

    /// Adds an unfilled rectangle outline.
    pub fn outline(&mut self, x: f32, y: f32, width: f32, height: f32, color: HexColor, stroke_width: f32) {
        let _ = write!(
            self.body,
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" fill="none" stroke="{color}" stroke-width="{stroke_width}"/>"#,
            width = width.max(0.0),
            height = height.max(0.0),
        );
    }

    /// Returns true if nothing has been drawn.
    pub fn is_blank(&self) -> bool {
        self.body.is_empty()
    }

    pub fn finish(self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{body}</svg>"#,
            w = self.size.width.max(1),
            h = self.size.height.max(1),
            body = self.body,
        )
    }
}

/// Escapes text for use in XML attribute values and character data.
pub fn escape_xml(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 8);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

// ============================================================================
// Pixel conversion
// ============================================================================

/// Converts a premultiplied tiny_skia pixmap into a straight-alpha image.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let raw: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), raw)
        .unwrap_or_else(|| RgbaImage::new(pixmap.width(), pixmap.height()))
}
