//! Square favicon / icon generator.
//!
//! An icon is drawn in three steps: a background (the source image stretched to
//! the icon size, or a flat colour), a circular or square clip, then a line of
//! centred text on top. The text is drawn after the clip and is not masked.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::color::HexColor;
use crate::error::{Error, Result};
use crate::raster::{FontBook, SvgCanvas, TextAnchor, TextStyle};
use crate::render::{OutputSpec, Render, RenderContext};
use crate::source::{SizePx, SourceImage};

/// Icon sizes offered by the size picker.
pub const STANDARD_SIZES: [u32; 7] = [15, 24, 32, 48, 64, 128, 256];

/// Smallest accepted icon edge.
pub const MIN_ICON_SIZE: u32 = 1;
/// Largest accepted icon edge; ICO cannot store more.
pub const MAX_ICON_SIZE: u32 = 256;

/// Font size range of the text slider.
pub const MIN_FONT_SIZE: u32 = 10;
pub const MAX_FONT_SIZE: u32 = 50;

/// Font families offered by the font picker.
pub const FONT_CHOICES: [&str; 12] = [
    "Arial",
    "Verdana",
    "Times New Roman",
    "Courier",
    "Georgia",
    "Palatino",
    "Garamond",
    "Bookman",
    "Comic Sans MS",
    "Trebuchet MS",
    "Arial Black",
    "Impact",
];

/// Samples per axis when computing circle edge coverage.
const EDGE_SAMPLES: u32 = 4;

/// Where the icon background comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum BackgroundMode {
    /// The source image, stretched to a square.
    #[default]
    Image,
    /// A flat fill of `backgroundColor`.
    Color,
}

/// Clip applied to the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Shape {
    /// Inscribed circle; the corners become transparent.
    #[default]
    Circle,
    Square,
}

/// Container format of an exported icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum IconFormat {
    #[default]
    Png,
    Ico,
}

impl From<IconFormat> for OutputFormat {
    fn from(format: IconFormat) -> Self {
        match format {
            IconFormat::Png => OutputFormat::Png,
            IconFormat::Ico => OutputFormat::Ico,
        }
    }
}

// ============================================================================
// FaviconConfig
// ============================================================================

/// Everything that determines how an icon looks and is exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FaviconConfig {
    pub text: String,
    /// Text size in pixels, 10-50.
    pub font_size: u32,
    pub font: String,
    pub text_color: HexColor,
    pub background_mode: BackgroundMode,
    pub background_color: HexColor,
    pub shape: Shape,
    /// Edge length of the square icon, 1-256.
    pub size: u32,
    pub export_format: IconFormat,
    /// Download name; `icon.<ext>` when absent or blank.
    pub file_name: Option<String>,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_size: 20,
            font: FONT_CHOICES[0].to_owned(),
            text_color: HexColor::BLACK,
            background_mode: BackgroundMode::Image,
            background_color: HexColor::WHITE,
            shape: Shape::Circle,
            size: 128,
            export_format: IconFormat::Png,
            file_name: None,
        }
    }
}

impl FaviconConfig {
    /// Fails with [`Error::InvalidSize`] if the icon size is out of range.
    pub fn validate(&self) -> Result<()> {
        validate_size(self.size)
    }

    /// The name offered for download.
    ///
    /// A custom name gets the format's extension appended when it does not
    /// already end with it.
    ///
    /// ```
    /// use imgdash::{FaviconConfig, IconFormat};
    ///
    /// let mut config = FaviconConfig::default();
    /// assert_eq!(config.output_file_name(), "icon.png");
    ///
    /// config.export_format = IconFormat::Ico;
    /// config.file_name = Some("brand".into());
    /// assert_eq!(config.output_file_name(), "brand.ico");
    /// ```
    pub fn output_file_name(&self) -> String {
        let ext = OutputFormat::from(self.export_format).extension();
        match self.file_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                let suffix = format!(".{ext}");
                if name.to_ascii_lowercase().ends_with(&suffix) {
                    name.to_owned()
                } else {
                    format!("{name}{suffix}")
                }
            }
            _ => format!("icon.{ext}"),
        }
    }
}

fn validate_size(size: u32) -> Result<()> {
    if (MIN_ICON_SIZE..=MAX_ICON_SIZE).contains(&size) {
        Ok(())
    } else {
        Err(Error::InvalidSize {
            size,
            min: MIN_ICON_SIZE,
            max: MAX_ICON_SIZE,
        })
    }
}

impl Render for FaviconConfig {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        self.validate()?;
        ctx.image = draw_icon(&ctx.image, self, ctx.fonts);
        Ok(())
    }

    fn output(&self) -> OutputSpec {
        OutputSpec::new(self.export_format.into(), self.output_file_name())
    }
}

/// Draws the icon for `config` over `background`. `config.size` must be valid.
fn draw_icon(background: &RgbaImage, config: &FaviconConfig, fonts: &FontBook) -> RgbaImage {
    let size = config.size;
    let mut icon = match config.background_mode {
        BackgroundMode::Image => imageops::resize(background, size, size, FilterType::Triangle),
        BackgroundMode::Color => RgbaImage::from_pixel(size, size, config.background_color.to_rgba(255)),
    };

    if config.shape == Shape::Circle {
        apply_circle_mask(&mut icon);
    }

    let center = size as f32 / 2.0;
    let style = TextStyle {
        font_family: &config.font,
        font_size: config.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE) as f32,
        color: config.text_color,
        opacity: 1.0,
        anchor: TextAnchor::Middle,
    };
    let mut svg = SvgCanvas::new(SizePx::new(size, size));
    svg.text(center, center, &config.text, &style);
    if !svg.is_blank() {
        if let Some(text) = fonts.render_svg(&svg.finish()) {
            imageops::overlay(&mut icon, &text, 0, 0);
        }
    }

    icon
}

/// Clears everything outside the inscribed circle, with anti-aliased edges.
fn apply_circle_mask(image: &mut RgbaImage) {
    let (width, height) = image.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = width.min(height) as f32 / 2.0;
    let radius_sq = radius * radius;
    let step = 1.0 / EDGE_SAMPLES as f32;
    let total = (EDGE_SAMPLES * EDGE_SAMPLES) as f32;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let mut inside = 0u32;
        for sy in 0..EDGE_SAMPLES {
            for sx in 0..EDGE_SAMPLES {
                let px = x as f32 + (sx as f32 + 0.5) * step - cx;
                let py = y as f32 + (sy as f32 + 0.5) * step - cy;
                if px * px + py * py <= radius_sq {
                    inside += 1;
                }
            }
        }
        if inside < EDGE_SAMPLES * EDGE_SAMPLES {
            pixel[3] = (pixel[3] as f32 * inside as f32 / total).round() as u8;
        }
    }
}

// ============================================================================
// FaviconGenerator
// ============================================================================

/// Interactive icon generator. Every appearance change redraws the icon.
///
/// ```
/// use imgdash::{FaviconGenerator, FaviconConfig, FontBook, IconFormat, SourceImage};
/// use image::RgbaImage;
///
/// let source = SourceImage::from_rgba(RgbaImage::new(300, 200));
/// let mut generator = FaviconGenerator::new(source, FaviconConfig::default(), FontBook::empty()).unwrap();
///
/// generator.set_size(32).unwrap();
/// generator.set_export_format(IconFormat::Ico);
///
/// let artifact = generator.export().unwrap();
/// assert_eq!(artifact.file_name, "icon.ico");
/// assert_eq!(generator.icon().dimensions(), (32, 32));
/// ```
#[derive(Debug)]
pub struct FaviconGenerator {
    source: SourceImage,
    config: FaviconConfig,
    fonts: FontBook,
    icon: RgbaImage,
}

impl FaviconGenerator {
    /// Creates a generator and draws the initial icon.
    pub fn new(source: SourceImage, config: FaviconConfig, fonts: FontBook) -> Result<Self> {
        config.validate()?;
        let icon = draw_icon(&source.data, &config, &fonts);
        Ok(Self {
            source,
            config,
            fonts,
            icon,
        })
    }

    pub fn config(&self) -> &FaviconConfig {
        &self.config
    }

    /// The icon as currently drawn.
    pub fn icon(&self) -> &RgbaImage {
        &self.icon
    }

    fn redraw(&mut self) {
        debug!(size = self.config.size, shape = ?self.config.shape, "redrawing icon");
        self.icon = draw_icon(&self.source.data, &self.config, &self.fonts);
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.config.text = text.into();
        self.redraw();
    }

    /// Sets the font size, clamped to 10-50.
    pub fn set_font_size(&mut self, font_size: u32) {
        self.config.font_size = font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.redraw();
    }

    pub fn set_font(&mut self, font: impl Into<String>) {
        self.config.font = font.into();
        self.redraw();
    }

    /// Sets the text colour from `rrggbb` or `#rrggbb`; returns false and keeps
    /// the previous colour for anything else.
    pub fn set_text_color(&mut self, input: &str) -> bool {
        let Some(color) = parse_color(input) else {
            return false;
        };
        self.config.text_color = color;
        self.redraw();
        true
    }

    pub fn set_background_mode(&mut self, mode: BackgroundMode) {
        self.config.background_mode = mode;
        self.redraw();
    }

    /// Sets the fill colour used in [`BackgroundMode::Color`]; same rules as
    /// [`set_text_color`](Self::set_text_color).
    pub fn set_background_color(&mut self, input: &str) -> bool {
        let Some(color) = parse_color(input) else {
            return false;
        };
        self.config.background_color = color;
        self.redraw();
        true
    }

    pub fn set_shape(&mut self, shape: Shape) {
        self.config.shape = shape;
        self.redraw();
    }

    /// Sets the icon edge length. Out-of-range sizes are rejected and the
    /// current size is kept.
    pub fn set_size(&mut self, size: u32) -> Result<()> {
        validate_size(size)?;
        self.config.size = size;
        self.redraw();
        Ok(())
    }

    /// Export settings do not change the drawing.
    pub fn set_export_format(&mut self, format: IconFormat) {
        self.config.export_format = format;
    }

    pub fn set_file_name(&mut self, file_name: Option<String>) {
        self.config.file_name = file_name;
    }

    /// Encodes the current icon in the chosen format.
    pub fn export(&self) -> Result<OutputArtifact> {
        let spec = self.config.output();
        OutputArtifact::encode(&self.icon, spec.format, spec.quality, spec.file_name)
    }
}

fn parse_color(input: &str) -> Option<HexColor> {
    let color = HexColor::parse(input);
    if color.is_none() {
        warn!(input, "ignoring invalid icon colour");
    }
    color
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::render_artifact;
    use crate::test_util::{changed_area, solid, source, system_fonts};

    fn generator(config: FaviconConfig) -> FaviconGenerator {
        let red = SourceImage::from_rgba(solid(90, 60, [255, 0, 0, 255]));
        FaviconGenerator::new(red, config, FontBook::empty()).unwrap()
    }

    #[test]
    fn text_is_drawn_at_the_centre() {
        let Some(fonts) = system_fonts() else { return };
        let config = FaviconConfig {
            text: "AB".into(),
            font_size: 40,
            size: 64,
            shape: Shape::Square,
            background_mode: BackgroundMode::Color,
            background_color: HexColor::WHITE,
            text_color: HexColor::BLACK,
            ..FaviconConfig::default()
        };
        let blank_config = FaviconConfig {
            text: String::new(),
            ..config.clone()
        };
        let blank = FaviconGenerator::new(source(8, 8), blank_config, fonts.clone()).unwrap();
        let icon = FaviconGenerator::new(source(8, 8), config, fonts).unwrap();

        let (x0, y0, x1, y1) = changed_area(icon.icon(), blank.icon()).expect("text should be drawn");
        let (cx, cy) = ((x0 + x1) as f32 / 2.0, (y0 + y1) as f32 / 2.0);
        assert!((cx - 32.0).abs() <= 4.0, "text centred at x {cx}");
        assert!((cy - 32.0).abs() <= 6.0, "text centred at y {cy}");
    }

    #[test]
    fn defaults_follow_the_picker() {
        let config = FaviconConfig::default();
        assert_eq!(config.size, 128);
        assert_eq!(config.font_size, 20);
        assert_eq!(config.font, "Arial");
        assert_eq!(config.shape, Shape::Circle);
        assert_eq!(config.background_mode, BackgroundMode::Image);
        assert!(STANDARD_SIZES.contains(&config.size));
    }

    #[test]
    fn circle_clears_corners_keeps_center() {
        let icons = generator(FaviconConfig::default());
        let icon = icons.icon();

        assert_eq!(icon.dimensions(), (128, 128));
        for (x, y) in [(0, 0), (127, 0), (0, 127), (127, 127)] {
            assert_eq!(icon.get_pixel(x, y)[3], 0, "corner ({x}, {y})");
        }
        assert_eq!(icon.get_pixel(64, 64).0, [255, 0, 0, 255]);
        assert_eq!(icon.get_pixel(64, 1)[3], 255, "top of the circle");
    }

    #[test]
    fn circle_edges_are_antialiased() {
        let icons = generator(FaviconConfig::default());
        let partial = icons.icon().pixels().filter(|p| p[3] > 0 && p[3] < 255).count();
        assert!(partial > 0);
    }

    #[test]
    fn square_keeps_every_pixel() {
        let mut icons = generator(FaviconConfig::default());
        icons.set_shape(Shape::Square);
        assert!(icons.icon().pixels().all(|p| p[3] == 255));
    }

    #[test]
    fn colour_background_replaces_image() {
        let mut icons = generator(FaviconConfig {
            shape: Shape::Square,
            ..FaviconConfig::default()
        });
        icons.set_background_mode(BackgroundMode::Color);
        assert!(icons.set_background_color("00ff00"));
        assert_eq!(icons.icon().get_pixel(10, 10).0, [0, 255, 0, 255]);

        assert!(!icons.set_background_color("green"));
        assert_eq!(icons.config().background_color, HexColor::rgb(0, 255, 0));
    }

    #[test]
    fn setters_redraw_at_new_size() {
        let mut icons = generator(FaviconConfig::default());
        for size in STANDARD_SIZES {
            icons.set_size(size).unwrap();
            assert_eq!(icons.icon().dimensions(), (size, size));
        }
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        let mut icons = generator(FaviconConfig::default());
        assert!(matches!(icons.set_size(0), Err(Error::InvalidSize { size: 0, .. })));
        assert!(matches!(icons.set_size(512), Err(Error::InvalidSize { size: 512, .. })));
        assert_eq!(icons.config().size, 128);

        let config = FaviconConfig {
            size: 300,
            ..FaviconConfig::default()
        };
        assert!(FaviconGenerator::new(source(10, 10), config, FontBook::empty()).is_err());
    }

    #[test]
    fn font_size_is_clamped() {
        let mut icons = generator(FaviconConfig::default());
        icons.set_font_size(4);
        assert_eq!(icons.config().font_size, MIN_FONT_SIZE);
        icons.set_font_size(80);
        assert_eq!(icons.config().font_size, MAX_FONT_SIZE);
    }

    #[test]
    fn ico_export_is_a_real_ico() {
        let mut icons = generator(FaviconConfig::default());
        icons.set_size(48).unwrap();
        icons.set_export_format(IconFormat::Ico);

        let artifact = icons.export().unwrap();
        assert_eq!(artifact.file_name, "icon.ico");
        assert_eq!(artifact.mime_type(), "image/x-icon");
        assert_eq!(image::guess_format(&artifact.bytes).unwrap(), image::ImageFormat::Ico);

        let decoded = image::load_from_memory(&artifact.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (48, 48));
    }

    #[test]
    fn png_export_keeps_transparency() {
        let icons = generator(FaviconConfig::default());
        let artifact = icons.export().unwrap();
        let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        assert_eq!(&decoded, icons.icon());
    }

    #[test]
    fn custom_file_names() {
        let mut config = FaviconConfig::default();
        for (name, format, expected) in [
            (None, IconFormat::Png, "icon.png"),
            (Some("   "), IconFormat::Ico, "icon.ico"),
            (Some("logo"), IconFormat::Png, "logo.png"),
            (Some("logo.PNG"), IconFormat::Png, "logo.PNG"),
            (Some("logo.png"), IconFormat::Ico, "logo.png.ico"),
        ] {
            config.file_name = name.map(str::to_owned);
            config.export_format = format;
            assert_eq!(config.output_file_name(), expected);
        }
    }

    #[test]
    fn render_matches_generator() {
        let src = SourceImage::from_rgba(solid(90, 60, [255, 0, 0, 255]));
        let config = FaviconConfig {
            size: 32,
            ..FaviconConfig::default()
        };
        let artifact = render_artifact(&src, &config, &FontBook::empty()).unwrap();
        let icons = FaviconGenerator::new(src, config, FontBook::empty()).unwrap();

        assert_eq!(artifact, icons.export().unwrap());
    }

    #[test]
    fn config_json_is_camel_case() {
        let json = r##"{"text":"A","fontSize":30,"backgroundMode":"color","backgroundColor":"#112233","shape":"square","exportFormat":"ico"}"##;
        let config: FaviconConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.font_size, 30);
        assert_eq!(config.background_mode, BackgroundMode::Color);
        assert_eq!(config.background_color, HexColor::rgb(0x11, 0x22, 0x33));
        assert_eq!(config.size, 128, "missing fields take defaults");
        assert_eq!(config.export_format, IconFormat::Ico);
    }
}
