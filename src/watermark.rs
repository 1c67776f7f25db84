//! Multi-entry text watermark editor.
//!
//! A [`WatermarkEditor`] keeps an ordered list of [`Watermark`] entries over a
//! fixed source image. Entries are drawn onto a transparent overlay the size of
//! the source; the overlay is rebuilt from the whole list whenever the editor's
//! state changes and is composited over the base image for preview and export.
//!
//! Pointer coordinates are canvas-local (see [`Point::from_client`]).

use image::{imageops, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::artifact::{OutputArtifact, OutputFormat};
use crate::color::HexColor;
use crate::error::Result;
use crate::raster::{FontBook, SvgCanvas, TextAnchor, TextMeasurer, TextStyle};
use crate::render::{render_artifact, OutputSpec, Redraw, Render, RenderContext};
use crate::source::{Point, SizePx, SourceImage};

/// File name of a saved watermarked image.
pub const WATERMARK_FILE_NAME: &str = "watermarked_image.png";

/// Colour of the outline drawn around the selected entry.
const HIGHLIGHT: HexColor = HexColor::rgb(0x3b, 0x82, 0xf6);
const HIGHLIGHT_STROKE: f32 = 2.0;

// ============================================================================
// Watermark entries
// ============================================================================

/// Identifier of a watermark entry, unique within one editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct WatermarkId(pub u32);

/// Styling and placement applied to newly added entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct WatermarkStyle {
    pub font_family: String,
    pub font_size: f32,
    pub opacity: f32,
    pub color: HexColor,
    pub x: f32,
    pub y: f32,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_owned(),
            font_size: 48.0,
            opacity: 0.5,
            color: HexColor::WHITE,
            x: 20.0,
            y: 20.0,
        }
    }
}

/// One line of watermark text. `(x, y)` is the top-left corner of its text box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Watermark {
    pub id: WatermarkId,
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// 0.0 (invisible) to 1.0 (opaque).
    pub opacity: f32,
    pub color: HexColor,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

fn default_font_family() -> String {
    WatermarkStyle::default().font_family
}

impl Watermark {
    /// Creates an entry styled and placed by `style`.
    pub fn new(id: WatermarkId, text: impl Into<String>, style: &WatermarkStyle) -> Self {
        Self {
            id,
            text: text.into(),
            x: style.x,
            y: style.y,
            font_size: style.font_size,
            opacity: style.opacity,
            color: style.color,
            font_family: style.font_family.clone(),
        }
    }

    fn text_style(&self) -> TextStyle<'_> {
        TextStyle {
            font_family: &self.font_family,
            font_size: self.font_size,
            color: self.color,
            opacity: self.opacity,
            anchor: TextAnchor::Start,
        }
    }

    /// Bounding box of the rendered text.
    pub fn bounds(&self, measurer: &dyn TextMeasurer) -> TextBounds {
        let metrics = measurer.measure(&self.text, &self.font_family, self.font_size);
        TextBounds {
            x: self.x,
            y: self.y,
            width: metrics.width,
            height: metrics.height,
        }
    }
}

/// Axis-aligned box around a rendered watermark, in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TextBounds {
    /// Returns true if `point` lies inside the box (edges inclusive).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// The full list of entries, drawn in order. Used for export and batch jobs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct WatermarkSet {
    pub watermarks: Vec<Watermark>,
}

impl WatermarkSet {
    pub fn new(watermarks: Vec<Watermark>) -> Self {
        Self { watermarks }
    }
}

impl Render for WatermarkSet {
    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<()> {
        let size = SizePx::new(ctx.image.width(), ctx.image.height());
        let overlay = rasterize(ctx.fonts, draw_watermarks(size, &self.watermarks), size);
        imageops::overlay(&mut ctx.image, &overlay, 0, 0);
        Ok(())
    }

    fn output(&self) -> OutputSpec {
        OutputSpec::new(OutputFormat::Png, WATERMARK_FILE_NAME)
    }
}

fn draw_watermarks(size: SizePx, watermarks: &[Watermark]) -> SvgCanvas {
    let mut svg = SvgCanvas::new(size);
    for watermark in watermarks {
        svg.text(watermark.x, watermark.y, &watermark.text, &watermark.text_style());
    }
    svg
}

fn rasterize(fonts: &FontBook, svg: SvgCanvas, size: SizePx) -> RgbaImage {
    if svg.is_blank() {
        return RgbaImage::new(size.width, size.height);
    }
    fonts
        .render_svg(&svg.finish())
        .unwrap_or_else(|| RgbaImage::new(size.width, size.height))
}

// ============================================================================
// Inline editing
// ============================================================================

/// Placement of the inline text field shown while an entry is being edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEditField {
    pub id: WatermarkId,
    /// Text the field starts with.
    pub text: String,
    pub bounds: TextBounds,
    pub font_size: f32,
}

#[derive(Debug, Clone)]
struct EditState {
    id: WatermarkId,
    draft: String,
}

// ============================================================================
// WatermarkEditor
// ============================================================================

/// Interactive editor for the watermarks of one source image.
///
/// # Example
///
/// ```
/// use imgdash::{FixedAdvance, FontBook, Point, SourceImage, WatermarkEditor};
/// use image::{imageops, RgbaImage};
///
/// let source = SourceImage::from_rgba(RgbaImage::new(200, 100));
/// let mut editor = WatermarkEditor::new(source, FontBook::empty())
///     .with_measurer(FixedAdvance(0.5));
///
/// let id = editor.add("Draft");
/// editor.pointer_down(Point::new(30.0, 30.0));
/// editor.pointer_move(Point::new(40.0, 35.0));
/// editor.pointer_up();
///
/// let moved = editor.get(id).unwrap();
/// assert_eq!((moved.x, moved.y), (30.0, 25.0));
/// ```
pub struct WatermarkEditor {
    /// The base image (never modified).
    source: SourceImage,
    fonts: FontBook,
    measurer: Box<dyn TextMeasurer>,
    style: WatermarkStyle,
    watermarks: Vec<Watermark>,
    next_id: u32,
    selected: Option<WatermarkId>,
    /// Last pointer position while dragging.
    drag: Option<Point>,
    editing: Option<EditState>,
    overlay: Redraw,
}

impl WatermarkEditor {
    /// Creates an editor that measures text with the same fonts it renders with.
    pub fn new(source: SourceImage, fonts: FontBook) -> Self {
        Self {
            source,
            measurer: Box::new(fonts.clone()),
            fonts,
            style: WatermarkStyle::default(),
            watermarks: Vec::new(),
            next_id: 1,
            selected: None,
            drag: None,
            editing: None,
            overlay: Redraw::default(),
        }
    }

    /// Replaces the text measurer used for hit-testing.
    pub fn with_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self.overlay.invalidate();
        self
    }

    /// Sets the style given to entries added from now on.
    pub fn with_style(mut self, style: WatermarkStyle) -> Self {
        self.style = style;
        self
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Entries in drawing (and hit-testing) order.
    pub fn watermarks(&self) -> &[Watermark] {
        &self.watermarks
    }

    pub fn get(&self, id: WatermarkId) -> Option<&Watermark> {
        self.watermarks.iter().find(|w| w.id == id)
    }

    pub fn selected(&self) -> Option<WatermarkId> {
        self.selected
    }

    /// Returns true while a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Version of the editor state, bumped on every change.
    pub fn version(&self) -> u64 {
        self.overlay.version()
    }

    fn get_mut(&mut self, id: WatermarkId) -> Option<&mut Watermark> {
        self.watermarks.iter_mut().find(|w| w.id == id)
    }

    /// Applies `change` to entry `id`, marking the overlay stale.
    fn update(&mut self, id: WatermarkId, change: impl FnOnce(&mut Watermark)) -> bool {
        let Some(watermark) = self.get_mut(id) else {
            debug!(?id, "no such watermark");
            return false;
        };
        change(watermark);
        self.overlay.invalidate();
        true
    }

    // ------------------------------------------------------------------------
    // Collection
    // ------------------------------------------------------------------------

    /// Appends a new entry with the current default style and returns its id.
    pub fn add(&mut self, text: impl Into<String>) -> WatermarkId {
        let id = WatermarkId(self.next_id);
        self.next_id += 1;
        self.watermarks.push(Watermark::new(id, text, &self.style));
        self.overlay.invalidate();
        debug!(?id, count = self.watermarks.len(), "added watermark");
        id
    }

    /// Removes entry `id`, returning it if it existed.
    pub fn remove(&mut self, id: WatermarkId) -> Option<Watermark> {
        let index = self.watermarks.iter().position(|w| w.id == id)?;
        let removed = self.watermarks.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
            self.drag = None;
        }
        if self.editing.as_ref().is_some_and(|e| e.id == id) {
            self.editing = None;
        }
        self.overlay.invalidate();
        debug!(?id, count = self.watermarks.len(), "removed watermark");
        Some(removed)
    }

    pub fn set_text(&mut self, id: WatermarkId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update(id, |w| w.text = text)
    }

    /// Sets the font size in pixels (at least 1).
    pub fn set_font_size(&mut self, id: WatermarkId, font_size: f32) -> bool {
        self.update(id, |w| w.font_size = font_size.max(1.0))
    }

    /// Sets the opacity, clamped to 0.0-1.0.
    pub fn set_opacity(&mut self, id: WatermarkId, opacity: f32) -> bool {
        self.update(id, |w| w.opacity = opacity.clamp(0.0, 1.0))
    }

    pub fn set_position(&mut self, id: WatermarkId, x: f32, y: f32) -> bool {
        self.update(id, |w| {
            w.x = x;
            w.y = y;
        })
    }

    pub fn set_font_family(&mut self, id: WatermarkId, font_family: impl Into<String>) -> bool {
        let font_family = font_family.into();
        self.update(id, |w| w.font_family = font_family)
    }

    /// Sets the colour from `rrggbb` or `#rrggbb`.
    ///
    /// Anything else is ignored and the previous colour is kept; returns
    /// whether the colour was applied.
    pub fn set_color(&mut self, id: WatermarkId, input: &str) -> bool {
        match HexColor::parse(input) {
            Some(color) => self.update(id, |w| w.color = color),
            None => {
                warn!(input, "ignoring invalid watermark colour");
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Hit-testing and pointer input
    // ------------------------------------------------------------------------

    /// Bounding box of entry `id` as measured for hit-testing.
    pub fn bounds(&self, id: WatermarkId) -> Option<TextBounds> {
        self.get(id).map(|w| w.bounds(self.measurer.as_ref()))
    }

    /// Returns the first entry (in list order) whose box contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<WatermarkId> {
        self.watermarks
            .iter()
            .find(|w| w.bounds(self.measurer.as_ref()).contains(point))
            .map(|w| w.id)
    }

    fn select(&mut self, id: Option<WatermarkId>) {
        if self.selected != id {
            self.selected = id;
            self.overlay.invalidate();
        }
    }

    /// Selects the entry under `point`, or clears the selection on a miss.
    pub fn click(&mut self, point: Point) -> Option<WatermarkId> {
        let hit = self.hit_test(point);
        self.select(hit);
        hit
    }

    /// Selects the entry under `point` and starts dragging it.
    pub fn pointer_down(&mut self, point: Point) -> Option<WatermarkId> {
        let hit = self.click(point);
        self.drag = hit.map(|_| point);
        hit
    }

    /// Moves the dragged entry by the pointer delta since the last event.
    pub fn pointer_move(&mut self, point: Point) {
        let (Some(last), Some(id)) = (self.drag, self.selected) else {
            return;
        };
        let (dx, dy) = (point.x - last.x, point.y - last.y);
        self.drag = Some(point);
        self.update(id, |w| {
            w.x += dx;
            w.y += dy;
        });
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// The pointer left the canvas; ends any drag.
    pub fn pointer_leave(&mut self) {
        self.drag = None;
    }

    // ------------------------------------------------------------------------
    // Inline editing
    // ------------------------------------------------------------------------

    /// Starts editing the entry under `point`.
    ///
    /// Returns where the inline field should be placed, or `None` on a miss.
    pub fn double_click(&mut self, point: Point) -> Option<TextEditField> {
        let id = self.click(point)?;
        let watermark = self.get(id)?;
        let field = TextEditField {
            id,
            text: watermark.text.clone(),
            bounds: watermark.bounds(self.measurer.as_ref()),
            font_size: watermark.font_size,
        };
        self.drag = None;
        self.editing = Some(EditState {
            id,
            draft: field.text.clone(),
        });
        Some(field)
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Replaces the pending text of the field being edited.
    pub fn edit_text(&mut self, text: impl Into<String>) {
        if let Some(edit) = self.editing.as_mut() {
            edit.draft = text.into();
        }
    }

    /// The field lost focus: applies the pending text. Returns true if an edit
    /// was committed.
    pub fn commit_edit(&mut self) -> bool {
        match self.editing.take() {
            Some(EditState { id, draft }) => self.set_text(id, draft),
            None => false,
        }
    }

    /// Discards the pending text.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// The transparent overlay holding every entry plus the selection outline.
    ///
    /// Redrawn from the full list only when the state changed since the last
    /// call.
    pub fn overlay(&mut self) -> &RgbaImage {
        let size = self.source.dimensions();
        let highlight = self.selected.and_then(|id| self.bounds(id));
        let (watermarks, fonts) = (&self.watermarks, &self.fonts);

        self.overlay.get_or_redraw(|| {
            let mut svg = draw_watermarks(size, watermarks);
            if let Some(b) = highlight {
                svg.outline(b.x, b.y, b.width, b.height, HIGHLIGHT, HIGHLIGHT_STROKE);
            }
            rasterize(fonts, svg, size)
        })
    }

    /// The base image with the overlay composited on top, as shown to the user.
    pub fn preview(&mut self) -> RgbaImage {
        let mut image = self.source.data.clone();
        imageops::overlay(&mut image, self.overlay(), 0, 0);
        image
    }

    /// Snapshot of the entries for export or serialization.
    pub fn to_set(&self) -> WatermarkSet {
        WatermarkSet::new(self.watermarks.clone())
    }

    /// Composites every entry over the base image and encodes it as PNG.
    ///
    /// The selection outline is not part of the saved image.
    pub fn save(&self) -> Result<OutputArtifact> {
        render_artifact(&self.source, &self.to_set(), &self.fonts)
    }
}

impl std::fmt::Debug for WatermarkEditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkEditor")
            .field("size", &self.source.dimensions())
            .field("watermarks", &self.watermarks)
            .field("selected", &self.selected)
            .field("dragging", &self.drag.is_some())
            .field("editing", &self.editing)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::FixedAdvance;
    use crate::test_util::{changed_area, solid, source, system_fonts};

    /// Editor over a 200x100 image where "Hello" at 48px is 120x48.
    fn editor() -> WatermarkEditor {
        WatermarkEditor::new(source(200, 100), FontBook::empty()).with_measurer(FixedAdvance(0.5))
    }

    #[test]
    fn new_entries_use_default_style() {
        let mut ed = editor();
        let id = ed.add("Hello");
        let w = ed.get(id).unwrap();

        assert_eq!((w.x, w.y), (20.0, 20.0));
        assert_eq!(w.font_size, 48.0);
        assert_eq!(w.opacity, 0.5);
        assert_eq!(w.color, HexColor::WHITE);
        assert_eq!(w.font_family, "Arial");
    }

    #[test]
    fn add_then_remove_restores_collection() {
        let mut ed = editor();
        ed.add("one");
        ed.add("two");
        let before = ed.watermarks().to_vec();

        let id = ed.add("three");
        assert_eq!(ed.watermarks().len(), 3);
        let removed = ed.remove(id).unwrap();

        assert_eq!(removed.text, "three");
        assert_eq!(ed.watermarks(), before.as_slice());
        assert!(ed.remove(id).is_none());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut ed = editor();
        let a = ed.add("a");
        ed.remove(a);
        let b = ed.add("b");
        assert_ne!(a, b);
    }

    #[test]
    fn hit_test_uses_text_box() {
        let mut ed = editor();
        let id = ed.add("Hello");

        assert_eq!(ed.bounds(id), Some(TextBounds { x: 20.0, y: 20.0, width: 120.0, height: 48.0 }));
        assert_eq!(ed.hit_test(Point::new(25.0, 25.0)), Some(id));
        assert_eq!(ed.hit_test(Point::new(140.0, 68.0)), Some(id));
        assert_eq!(ed.hit_test(Point::new(141.0, 30.0)), None);
        assert_eq!(ed.hit_test(Point::new(10.0, 30.0)), None);
    }

    #[test]
    fn first_entry_in_order_wins() {
        let mut ed = editor();
        let first = ed.add("Hello");
        let second = ed.add("Hello");
        assert_ne!(first, second);

        assert_eq!(ed.click(Point::new(30.0, 30.0)), Some(first));
        assert_eq!(ed.selected(), Some(first));
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let mut ed = editor();
        let id = ed.add("Hello");
        ed.click(Point::new(30.0, 30.0));
        assert_eq!(ed.selected(), Some(id));

        assert_eq!(ed.click(Point::new(190.0, 90.0)), None);
        assert_eq!(ed.selected(), None);
    }

    #[test]
    fn drag_translates_by_pointer_delta() {
        let mut ed = editor();
        let id = ed.add("Hello");

        ed.pointer_down(Point::new(30.0, 30.0));
        assert!(ed.is_dragging());
        ed.pointer_move(Point::new(35.0, 32.0));
        ed.pointer_move(Point::new(45.0, 40.0));
        ed.pointer_up();
        ed.pointer_move(Point::new(100.0, 100.0));

        let w = ed.get(id).unwrap();
        assert_eq!((w.x, w.y), (35.0, 30.0));
        assert!(!ed.is_dragging());
    }

    #[test]
    fn leaving_the_canvas_ends_drag() {
        let mut ed = editor();
        let id = ed.add("Hello");
        ed.pointer_down(Point::new(30.0, 30.0));
        ed.pointer_leave();
        ed.pointer_move(Point::new(60.0, 60.0));

        assert_eq!(ed.get(id).map(|w| (w.x, w.y)), Some((20.0, 20.0)));
    }

    #[test]
    fn pointer_down_on_empty_space_does_not_drag() {
        let mut ed = editor();
        let id = ed.add("Hello");
        ed.pointer_down(Point::new(180.0, 90.0));
        ed.pointer_move(Point::new(10.0, 10.0));

        assert!(!ed.is_dragging());
        assert_eq!(ed.get(id).map(|w| (w.x, w.y)), Some((20.0, 20.0)));
    }

    #[test]
    fn inline_edit_commit_and_cancel() {
        let mut ed = editor();
        let id = ed.add("Hello");

        let field = ed.double_click(Point::new(30.0, 30.0)).unwrap();
        assert_eq!(field.id, id);
        assert_eq!(field.text, "Hello");
        assert_eq!(field.bounds.width, 120.0);

        ed.edit_text("Draft");
        assert!(ed.commit_edit());
        assert_eq!(ed.get(id).unwrap().text, "Draft");
        assert!(!ed.is_editing());

        ed.double_click(Point::new(30.0, 30.0)).unwrap();
        ed.edit_text("Discarded");
        ed.cancel_edit();
        assert!(!ed.commit_edit());
        assert_eq!(ed.get(id).unwrap().text, "Draft");

        assert!(ed.double_click(Point::new(190.0, 95.0)).is_none());
    }

    #[test]
    fn color_input_is_validated() {
        let mut ed = editor();
        let id = ed.add("Hello");

        assert!(ed.set_color(id, "abc123"));
        assert_eq!(ed.get(id).unwrap().color, HexColor::rgb(0xab, 0xc1, 0x23));

        assert!(!ed.set_color(id, "zzzzzz"));
        assert!(!ed.set_color(id, "#abc"));
        assert_eq!(ed.get(id).unwrap().color, HexColor::rgb(0xab, 0xc1, 0x23));
    }

    #[test]
    fn setters_clamp_and_report_missing_ids() {
        let mut ed = editor();
        let id = ed.add("Hello");

        assert!(ed.set_opacity(id, 1.7));
        assert!(ed.set_font_size(id, -3.0));
        let w = ed.get(id).unwrap();
        assert_eq!(w.opacity, 1.0);
        assert_eq!(w.font_size, 1.0);

        assert!(!ed.set_text(WatermarkId(99), "nope"));
        assert!(!ed.set_position(WatermarkId(99), 0.0, 0.0));
    }

    #[test]
    fn every_change_bumps_the_version() {
        let mut ed = editor();
        let v0 = ed.version();
        let id = ed.add("Hello");
        let v1 = ed.version();
        ed.set_position(id, 5.0, 5.0);
        let v2 = ed.version();
        ed.overlay();
        let v3 = ed.version();

        assert!(v0 < v1 && v1 < v2);
        assert_eq!(v2, v3, "drawing does not change state");
    }

    #[test]
    fn overlay_outlines_selection_only() {
        let mut ed = editor();
        ed.add("Hello");

        let overlay = ed.overlay().clone();
        assert_eq!(overlay.dimensions(), (200, 100));
        assert!(overlay.pixels().all(|p| p[3] == 0), "no fonts, no selection");

        ed.click(Point::new(30.0, 30.0));
        let overlay = ed.overlay();
        assert!(overlay.get_pixel(20, 40)[3] > 0, "left edge of the outline");
        assert_eq!(overlay.get_pixel(80, 44)[3], 0, "inside the box");
    }

    #[test]
    fn saved_image_has_text_inside_its_bounds() {
        let Some(fonts) = system_fonts() else { return };
        let base = SourceImage::from_rgba(solid(300, 120, [0, 0, 0, 255]));
        let mut ed = WatermarkEditor::new(base.clone(), fonts);
        let id = ed.add("Hello");
        let b = ed.bounds(id).unwrap();
        assert!(b.width > 0.0 && b.width < 300.0);

        let decoded = image::load_from_memory(&ed.save().unwrap().bytes).unwrap().to_rgba8();
        let (x0, y0, x1, y1) = changed_area(&decoded, &base.data).expect("text should be drawn");

        let slack = 4.0;
        assert!(x0 as f32 >= b.x - slack && x1 as f32 <= b.x + b.width + slack, "ink x {x0}..{x1}, box {b:?}");
        assert!(y0 as f32 >= b.y - slack && y1 as f32 <= b.y + b.height + slack, "ink y {y0}..{y1}, box {b:?}");
        assert!(b.contains(Point::new((x0 + x1) as f32 / 2.0, (y0 + y1) as f32 / 2.0)));
    }

    #[test]
    fn ids_are_plain_sequential_numbers() {
        let mut ed = editor();
        assert_eq!(ed.add("a"), WatermarkId(1));
        let second = ed.add("b");
        assert_eq!(serde_json::to_string(&second).unwrap(), "2");
    }

    /// Without fonts the outline is the only thing that could differ.
    #[test]
    fn save_excludes_outline_and_keeps_dimensions() {
        let base = SourceImage::from_rgba(solid(200, 100, [10, 20, 30, 255]));
        let mut ed = WatermarkEditor::new(base.clone(), FontBook::empty()).with_measurer(FixedAdvance(0.5));
        ed.add("Hello");
        ed.click(Point::new(30.0, 30.0));

        let artifact = ed.save().unwrap();
        assert_eq!(artifact.file_name, WATERMARK_FILE_NAME);
        assert_eq!(artifact.format, OutputFormat::Png);

        let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
        assert_eq!(decoded, base.data);
    }

    #[test]
    fn preview_composites_overlay_over_base() {
        let mut ed = WatermarkEditor::new(
            SourceImage::from_rgba(solid(200, 100, [0, 0, 0, 255])),
            FontBook::empty(),
        )
        .with_measurer(FixedAdvance(0.5));
        ed.add("Hello");
        ed.click(Point::new(30.0, 30.0));

        let preview = ed.preview();
        assert_ne!(preview.get_pixel(20, 40).0, [0, 0, 0, 255]);
        assert_eq!(preview.get_pixel(190, 90).0, [0, 0, 0, 255]);
    }

    #[test]
    fn watermark_set_serializes_camel_case() {
        let mut ed = editor();
        ed.add("Hello");
        let json = serde_json::to_string(&ed.to_set()).unwrap();
        assert!(json.contains("\"fontSize\":48.0"));
        assert!(json.contains("\"color\":\"#ffffff\""));

        let parsed: WatermarkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, ed.to_set());
    }
}
