//! Rectangle cropping over a downscaled display canvas.
//!
//! The working image is shown scaled to fit a bounded viewport. Selections are
//! made in display coordinates and copied 1:1 from the displayed pixels, so a
//! crop of a downscaled image yields display-resolution output. Crops chain:
//! each result becomes the new working image until [`CropSession::reset`].

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::color::HexColor;
use crate::error::{Error, Result};
use crate::raster::{FontBook, SvgCanvas};
use crate::render::{render_image, OutputSpec, Render, RenderContext};
use crate::source::{Point, RectPx, SizePx, SourceImage};

/// File name of a cropped image.
pub const CROP_FILE_NAME: &str = "cropped.png";

/// Size of the crop canvas unless configured otherwise.
pub const DEFAULT_VIEWPORT: SizePx = SizePx {
    width: 500,
    height: 500,
};

const SELECTION_COLOR: HexColor = HexColor::rgb(255, 0, 0);
const SELECTION_STROKE: f32 = 2.0;

/// Two corners of a selection in display coordinates, in drag order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CropRegion {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl CropRegion {
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            start_x: start.x,
            start_y: start.y,
            end_x: end.x,
            end_y: end.y,
        }
    }

    /// The covered rectangle with non-negative size, whichever way it was
    /// dragged. Negative coordinates are pinned to zero.
    ///
    /// ```
    /// use imgdash::{CropRegion, Point, RectPx};
    ///
    /// let up_left = CropRegion::new(Point::new(110.0, 60.0), Point::new(10.0, 10.0));
    /// assert_eq!(up_left.normalize(), RectPx::new(10, 10, 100, 50));
    /// ```
    pub fn normalize(&self) -> RectPx {
        let px = |v: f32| v.max(0.0).round() as u32;
        let (left, right) = (px(self.start_x.min(self.end_x)), px(self.start_x.max(self.end_x)));
        let (top, bottom) = (px(self.start_y.min(self.end_y)), px(self.start_y.max(self.end_y)));
        RectPx::new(left, top, right - left, bottom - top)
    }
}

/// Scales `image` down to fit `viewport`, never up.
pub fn fit_to_viewport(image: &RgbaImage, viewport: SizePx) -> RgbaImage {
    let size = SizePx::new(image.width(), image.height());
    let fitted = size.fit_within(viewport);
    if fitted == size {
        image.clone()
    } else {
        imageops::resize(image, fitted.width, fitted.height, FilterType::Triangle)
    }
}

/// One crop applied to an image as shown in a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct CropParams {
    pub region: CropRegion,
    #[serde(default = "default_viewport")]
    pub viewport: SizePx,
}

fn default_viewport() -> SizePx {
    DEFAULT_VIEWPORT
}

impl CropParams {
    pub fn new(region: CropRegion) -> Self {
        Self {
            region,
            viewport: DEFAULT_VIEWPORT,
        }
    }
}

impl Render for CropParams {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let display = fit_to_viewport(&ctx.image, self.viewport);
        let rect = self
            .region
            .normalize()
            .clamp_to(SizePx::new(display.width(), display.height()));
        if rect.is_empty() {
            return Err(Error::EmptySelection);
        }
        ctx.image = imageops::crop_imm(&display, rect.x, rect.y, rect.width, rect.height).to_image();
        Ok(())
    }

    fn output(&self) -> OutputSpec {
        OutputSpec::new(OutputFormat::Png, CROP_FILE_NAME)
    }
}

// ============================================================================
// CropSession
// ============================================================================

/// Interactive cropping over one source image.
#[derive(Debug)]
pub struct CropSession {
    /// The untouched source, restored by [`reset`](Self::reset).
    original: SourceImage,
    /// The image being cropped; replaced by each crop.
    working: SourceImage,
    viewport: SizePx,
    /// `working` scaled to the viewport.
    display: RgbaImage,
    selection: Option<CropRegion>,
    drawing: bool,
    /// Outlines are drawn without text, so no fonts are loaded.
    shapes: FontBook,
}

impl CropSession {
    pub fn new(source: SourceImage) -> Self {
        Self::with_viewport(source, DEFAULT_VIEWPORT)
    }

    pub fn with_viewport(source: SourceImage, viewport: SizePx) -> Self {
        let display = fit_to_viewport(&source.data, viewport);
        Self {
            working: source.clone(),
            original: source,
            viewport,
            display,
            selection: None,
            drawing: false,
            shapes: FontBook::empty(),
        }
    }

    pub fn working(&self) -> &RgbaImage {
        &self.working.data
    }

    /// The working image as shown on the canvas.
    pub fn display(&self) -> &RgbaImage {
        &self.display
    }

    pub fn display_size(&self) -> SizePx {
        SizePx::new(self.display.width(), self.display.height())
    }

    pub fn region(&self) -> Option<CropRegion> {
        self.selection
    }

    /// The selected rectangle, normalized and clamped to the display canvas.
    pub fn selection_rect(&self) -> Option<RectPx> {
        self.selection
            .map(|region| region.normalize().clamp_to(self.display_size()))
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    pub fn pointer_down(&mut self, point: Point) {
        self.selection = Some(CropRegion::new(point, point));
        self.drawing = true;
    }

    pub fn pointer_move(&mut self, point: Point) {
        if !self.drawing {
            return;
        }
        if let Some(region) = self.selection.as_mut() {
            region.end_x = point.x;
            region.end_y = point.y;
        }
    }

    pub fn pointer_up(&mut self) {
        self.drawing = false;
    }

    pub fn set_selection(&mut self, region: CropRegion) {
        self.selection = Some(region);
        self.drawing = false;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.drawing = false;
    }

    /// The display canvas with the current selection outlined.
    pub fn preview(&self) -> RgbaImage {
        let mut image = self.display.clone();
        let Some(rect) = self.selection_rect() else {
            return image;
        };
        let mut svg = SvgCanvas::new(self.display_size());
        svg.outline(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
            SELECTION_COLOR,
            SELECTION_STROKE,
        );
        if let Some(outline) = self.shapes.render_svg(&svg.finish()) {
            imageops::overlay(&mut image, &outline, 0, 0);
        }
        image
    }

    /// Crops the working image to the selection and returns it as PNG.
    ///
    /// The result replaces the working image and the selection is cleared.
    /// Fails with [`Error::EmptySelection`] when nothing is selected or the
    /// selection has zero width or height, leaving the session unchanged.
    pub fn crop(&mut self) -> Result<OutputArtifact> {
        let region = self.selection.ok_or(Error::EmptySelection)?;
        let params = CropParams {
            region,
            viewport: self.viewport,
        };
        let cropped = render_image(&self.working, &params, &self.shapes)?;
        let spec = params.output();
        let artifact = OutputArtifact::encode(&cropped, spec.format, spec.quality, spec.file_name)?;

        info!(
            width = cropped.width(),
            height = cropped.height(),
            "cropped working image"
        );
        self.display = fit_to_viewport(&cropped, self.viewport);
        self.working = SourceImage::from_rgba(cropped);
        self.clear_selection();
        Ok(artifact)
    }

    /// Restores the original image and clears the selection.
    pub fn reset(&mut self) {
        debug!("restoring original image");
        self.working = self.original.clone();
        self.display = fit_to_viewport(&self.working.data, self.viewport);
        self.clear_selection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{gradient, source};
    use proptest::prelude::*;

    fn drag(session: &mut CropSession, from: (f32, f32), to: (f32, f32)) {
        session.pointer_down(Point::new(from.0, from.1));
        session.pointer_move(Point::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        session.pointer_move(Point::new(to.0, to.1));
        session.pointer_up();
    }

    #[test]
    fn same_rectangle_in_every_drag_direction() {
        for (from, to) in [((10.0, 10.0), (110.0, 60.0)), ((110.0, 60.0), (10.0, 10.0))] {
            let mut session = CropSession::new(source(500, 500));
            drag(&mut session, from, to);
            assert_eq!(session.selection_rect(), Some(RectPx::new(10, 10, 100, 50)));

            let artifact = session.crop().unwrap();
            assert_eq!(artifact.file_name, CROP_FILE_NAME);
            assert_eq!(artifact.dimensions, SizePx::new(100, 50));
        }
    }

    #[test]
    fn copies_pixels_one_to_one() {
        let image = gradient(300, 200);
        let mut session = CropSession::new(SourceImage::from_rgba(image.clone()));
        session.set_selection(CropRegion::new(Point::new(20.0, 30.0), Point::new(60.0, 50.0)));

        session.crop().unwrap();

        let expected = imageops::crop_imm(&image, 20, 30, 40, 20).to_image();
        assert_eq!(session.working(), &expected);
    }

    #[test]
    fn large_images_are_cropped_at_display_resolution() {
        let mut session = CropSession::new(source(1000, 500));
        assert_eq!(session.display_size(), SizePx::new(500, 250));

        session.set_selection(CropRegion::new(Point::new(0.0, 0.0), Point::new(500.0, 250.0)));
        let artifact = session.crop().unwrap();
        assert_eq!(artifact.dimensions, SizePx::new(500, 250));
    }

    #[test]
    fn selection_is_clamped_to_canvas() {
        let mut session = CropSession::new(source(200, 100));
        session.set_selection(CropRegion::new(Point::new(150.0, 50.0), Point::new(400.0, 400.0)));
        assert_eq!(session.selection_rect(), Some(RectPx::new(150, 50, 50, 50)));
    }

    #[test]
    fn crops_chain_and_reset_restores_original() {
        let mut session = CropSession::new(source(400, 300));
        session.set_selection(CropRegion::new(Point::new(0.0, 0.0), Point::new(200.0, 200.0)));
        session.crop().unwrap();
        assert!(session.region().is_none(), "selection resets after a crop");

        session.set_selection(CropRegion::new(Point::new(50.0, 50.0), Point::new(100.0, 80.0)));
        let second = session.crop().unwrap();
        assert_eq!(second.dimensions, SizePx::new(50, 30));
        assert_eq!(session.working().dimensions(), (50, 30));

        session.reset();
        assert_eq!(session.working().dimensions(), (400, 300));
        assert_eq!(session.display_size(), SizePx::new(400, 300));
    }

    #[test]
    fn zero_area_selection_is_rejected() {
        let mut session = CropSession::new(source(100, 100));
        assert!(matches!(session.crop(), Err(Error::EmptySelection)));

        session.pointer_down(Point::new(40.0, 40.0));
        session.pointer_up();
        assert!(matches!(session.crop(), Err(Error::EmptySelection)));

        session.set_selection(CropRegion::new(Point::new(10.0, 10.0), Point::new(90.0, 10.0)));
        assert!(matches!(session.crop(), Err(Error::EmptySelection)));
        assert_eq!(session.working().dimensions(), (100, 100), "session unchanged");
    }

    #[test]
    fn moves_without_pointer_down_are_ignored() {
        let mut session = CropSession::new(source(100, 100));
        session.pointer_move(Point::new(50.0, 50.0));
        assert!(session.region().is_none());

        drag(&mut session, (10.0, 10.0), (20.0, 20.0));
        session.pointer_move(Point::new(90.0, 90.0));
        assert_eq!(session.selection_rect(), Some(RectPx::new(10, 10, 10, 10)));
    }

    #[test]
    fn preview_outlines_selection() {
        let mut session = CropSession::new(SourceImage::from_rgba(RgbaImage::new(100, 100)));
        assert!(session.preview().pixels().all(|p| p[3] == 0));

        session.set_selection(CropRegion::new(Point::new(10.0, 10.0), Point::new(60.0, 60.0)));
        let preview = session.preview();
        assert_eq!(preview.get_pixel(10, 30).0, [255, 0, 0, 255]);
        assert_eq!(preview.get_pixel(30, 30)[3], 0);
    }

    proptest! {
        #[test]
        fn normalize_ignores_drag_direction(
            sx in 0.0f32..1000.0, sy in 0.0f32..1000.0,
            ex in 0.0f32..1000.0, ey in 0.0f32..1000.0,
        ) {
            let forward = CropRegion::new(Point::new(sx, sy), Point::new(ex, ey)).normalize();
            let backward = CropRegion::new(Point::new(ex, ey), Point::new(sx, sy)).normalize();
            let mirrored = CropRegion::new(Point::new(sx, ey), Point::new(ex, sy)).normalize();

            prop_assert_eq!(forward, backward);
            prop_assert_eq!(forward, mirrored);
            prop_assert!(forward.x as f32 <= sx.min(ex) + 0.5);
            prop_assert!(forward.right() as f32 >= sx.max(ex) - 0.5);
        }

        #[test]
        fn clamped_selection_stays_on_canvas(
            sx in -100.0f32..800.0, sy in -100.0f32..800.0,
            ex in -100.0f32..800.0, ey in -100.0f32..800.0,
        ) {
            let canvas = SizePx::new(500, 375);
            let rect = CropRegion::new(Point::new(sx, sy), Point::new(ex, ey)).normalize().clamp_to(canvas);
            prop_assert!(rect.right() <= canvas.width);
            prop_assert!(rect.bottom() <= canvas.height);
        }
    }
}
