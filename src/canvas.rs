//! HTML Canvas bindings for WASM environments.
//!
//! This module exposes the interactive units to JavaScript:
//! [`WatermarkCanvas`] for the watermark editor and [`FaviconCanvas`] for the
//! icon generator. Both paint their current state into an `HtmlCanvasElement`
//! and return exported files as bytes.
//!
//! # Feature Flag
//!
//! This module is only available with the `canvas` feature enabled:
//!
//! ```toml
//! [dependencies]
//! imgdash = { version = "0.1", features = ["canvas"] }
//! ```
//!
//! # Example (JavaScript/TypeScript)
//!
//! ```javascript
//! import init, { WatermarkCanvas } from 'imgdash';
//!
//! await init();
//!
//! const canvas = document.getElementById('watermark-canvas');
//! const editor = new WatermarkCanvas(imageBytes, fontBytes);
//!
//! editor.add('Draft');
//! canvas.onmousedown = (e) => { editor.pointerDown(canvas, e.clientX, e.clientY); editor.render(canvas); };
//! canvas.onmousemove = (e) => { editor.pointerMove(canvas, e.clientX, e.clientY); editor.render(canvas); };
//! canvas.onmouseup = () => editor.pointerUp();
//!
//! const png = editor.save(); // Uint8Array, named editor.saveFileName()
//! ```

use image::RgbaImage;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen::Clamped;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

use crate::artifact::OutputArtifact;
use crate::config::Config;
use crate::favicon::{FaviconConfig, FaviconGenerator};
use crate::raster::FontBook;
use crate::source::{Point, SourceImage};
use crate::watermark::{WatermarkEditor, WatermarkId, WATERMARK_FILE_NAME};

// ============================================================================
// Helpers
// ============================================================================

fn js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

fn load(image_data: &[u8], font_data: Option<Vec<u8>>) -> Result<(SourceImage, FontBook), JsError> {
    let source = SourceImage::decode(image_data).map_err(js_error)?;
    let fonts = FontBook::from_font_data(font_data);
    Ok((source, fonts))
}

fn load_config(config_json: Option<String>) -> Result<Config, JsError> {
    match config_json {
        Some(json) => Config::from_json(&json).map_err(js_error),
        None => Ok(Config::default()),
    }
}

/// Parses a lowercase enum name such as `"circle"` or `"ico"`.
fn parse_name<T: DeserializeOwned>(name: &str) -> Result<T, JsError> {
    serde_json::from_value(serde_json::Value::String(name.to_owned()))
        .map_err(|_| JsError::new(&format!("Unknown option: {name}")))
}

/// Translates client coordinates into coordinates local to `canvas`.
fn canvas_point(canvas: &HtmlCanvasElement, client_x: f32, client_y: f32) -> Point {
    let rect = canvas.get_bounding_client_rect();
    Point::from_client(client_x, client_y, Point::new(rect.left() as f32, rect.top() as f32))
}

/// Resizes `canvas` to `image` and draws it.
fn paint(canvas: &HtmlCanvasElement, image: &RgbaImage) -> Result<(), JsError> {
    let (width, height) = image.dimensions();
    canvas.set_width(width);
    canvas.set_height(height);

    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")
        .map_err(|_| JsError::new("Failed to get 2d context"))?
        .ok_or_else(|| JsError::new("Canvas 2d context is null"))?
        .dyn_into()
        .map_err(|_| JsError::new("Failed to cast to CanvasRenderingContext2d"))?;

    let image_data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(image.as_raw()), width, height)
        .map_err(|_| JsError::new("Failed to create ImageData"))?;
    ctx.put_image_data(&image_data, 0.0, 0.0)
        .map_err(|_| JsError::new("Failed to put image data"))?;
    Ok(())
}

fn to_bytes(artifact: &OutputArtifact) -> js_sys::Uint8Array {
    js_sys::Uint8Array::from(artifact.bytes.as_slice())
}

// ============================================================================
// WatermarkCanvas
// ============================================================================

/// The watermark editor bound to an HTML canvas.
///
/// Entry ids are plain numbers on the JavaScript side.
#[wasm_bindgen]
pub struct WatermarkCanvas {
    editor: WatermarkEditor,
}

#[wasm_bindgen]
impl WatermarkCanvas {
    /// Creates an editor over an encoded image.
    ///
    /// # Arguments
    ///
    /// * `image_data` - The encoded source image (PNG, JPEG, WebP, ...)
    /// * `font_data` - A font file used for drawing and measuring text
    /// * `config_json` - Optional configuration providing the default style
    #[wasm_bindgen(constructor)]
    pub fn new(
        image_data: &[u8],
        font_data: Option<Vec<u8>>,
        config_json: Option<String>,
    ) -> Result<WatermarkCanvas, JsError> {
        let (source, fonts) = load(image_data, font_data)?;
        let config = load_config(config_json)?;
        Ok(Self {
            editor: WatermarkEditor::new(source, fonts).with_style(config.watermark),
        })
    }

    // ---- Entries ----

    /// Adds an entry and returns its id.
    pub fn add(&mut self, text: String) -> u32 {
        self.editor.add(text).0
    }

    pub fn remove(&mut self, id: u32) -> bool {
        self.editor.remove(WatermarkId(id)).is_some()
    }

    #[wasm_bindgen(js_name = "setText")]
    pub fn set_text(&mut self, id: u32, text: String) -> bool {
        self.editor.set_text(WatermarkId(id), text)
    }

    #[wasm_bindgen(js_name = "setFontSize")]
    pub fn set_font_size(&mut self, id: u32, font_size: f32) -> bool {
        self.editor.set_font_size(WatermarkId(id), font_size)
    }

    #[wasm_bindgen(js_name = "setOpacity")]
    pub fn set_opacity(&mut self, id: u32, opacity: f32) -> bool {
        self.editor.set_opacity(WatermarkId(id), opacity)
    }

    #[wasm_bindgen(js_name = "setPosition")]
    pub fn set_position(&mut self, id: u32, x: f32, y: f32) -> bool {
        self.editor.set_position(WatermarkId(id), x, y)
    }

    /// Sets the colour from `rrggbb` or `#rrggbb`; other input is ignored.
    #[wasm_bindgen(js_name = "setColor")]
    pub fn set_color(&mut self, id: u32, color: &str) -> bool {
        self.editor.set_color(WatermarkId(id), color)
    }

    /// Returns the entries as a JSON array.
    #[wasm_bindgen(js_name = "watermarksJson")]
    pub fn watermarks_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.editor.watermarks()).map_err(js_error)
    }

    /// Returns the selected entry id, if any.
    pub fn selected(&self) -> Option<u32> {
        self.editor.selected().map(|id| id.0)
    }

    // ---- Pointer input ----

    #[wasm_bindgen(js_name = "pointerDown")]
    pub fn pointer_down(&mut self, canvas: &HtmlCanvasElement, client_x: f32, client_y: f32) -> Option<u32> {
        let point = canvas_point(canvas, client_x, client_y);
        self.editor.pointer_down(point).map(|id| id.0)
    }

    #[wasm_bindgen(js_name = "pointerMove")]
    pub fn pointer_move(&mut self, canvas: &HtmlCanvasElement, client_x: f32, client_y: f32) {
        let point = canvas_point(canvas, client_x, client_y);
        self.editor.pointer_move(point);
    }

    #[wasm_bindgen(js_name = "pointerUp")]
    pub fn pointer_up(&mut self) {
        self.editor.pointer_up();
    }

    #[wasm_bindgen(js_name = "pointerLeave")]
    pub fn pointer_leave(&mut self) {
        self.editor.pointer_leave();
    }

    /// Starts inline editing. Returns the field placement as JSON, or
    /// `undefined` when nothing was hit.
    #[wasm_bindgen(js_name = "doubleClick")]
    pub fn double_click(
        &mut self,
        canvas: &HtmlCanvasElement,
        client_x: f32,
        client_y: f32,
    ) -> Result<Option<String>, JsError> {
        let point = canvas_point(canvas, client_x, client_y);
        self.editor
            .double_click(point)
            .map(|field| serde_json::to_string(&field).map_err(js_error))
            .transpose()
    }

    #[wasm_bindgen(js_name = "editText")]
    pub fn edit_text(&mut self, text: String) {
        self.editor.edit_text(text);
    }

    /// Applies the pending edit; call when the field loses focus.
    #[wasm_bindgen(js_name = "commitEdit")]
    pub fn commit_edit(&mut self) -> bool {
        self.editor.commit_edit()
    }

    #[wasm_bindgen(js_name = "cancelEdit")]
    pub fn cancel_edit(&mut self) {
        self.editor.cancel_edit();
    }

    // ---- Rendering ----

    /// Paints the image, the entries and the selection outline.
    pub fn render(&mut self, canvas: &HtmlCanvasElement) -> Result<(), JsError> {
        paint(canvas, &self.editor.preview())
    }

    /// Returns the watermarked image as PNG bytes.
    pub fn save(&self) -> Result<js_sys::Uint8Array, JsError> {
        let artifact = self.editor.save().map_err(js_error)?;
        Ok(to_bytes(&artifact))
    }

    #[wasm_bindgen(js_name = "saveFileName")]
    pub fn save_file_name(&self) -> String {
        WATERMARK_FILE_NAME.to_owned()
    }
}

// ============================================================================
// FaviconCanvas
// ============================================================================

/// The icon generator bound to an HTML canvas.
#[wasm_bindgen]
pub struct FaviconCanvas {
    generator: FaviconGenerator,
}

#[wasm_bindgen]
impl FaviconCanvas {
    /// Creates a generator over an encoded background image.
    ///
    /// `config_json` is an optional icon configuration (`FaviconConfig`
    /// fields in camelCase); missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        image_data: &[u8],
        font_data: Option<Vec<u8>>,
        config_json: Option<String>,
    ) -> Result<FaviconCanvas, JsError> {
        let (source, fonts) = load(image_data, font_data)?;
        let config = match config_json {
            Some(json) => serde_json::from_str::<FaviconConfig>(&json).map_err(js_error)?,
            None => FaviconConfig::default(),
        };
        Ok(Self {
            generator: FaviconGenerator::new(source, config, fonts).map_err(js_error)?,
        })
    }

    #[wasm_bindgen(js_name = "setText")]
    pub fn set_text(&mut self, text: String) {
        self.generator.set_text(text);
    }

    /// Sets the font size; clamped to 10-50.
    #[wasm_bindgen(js_name = "setFontSize")]
    pub fn set_font_size(&mut self, font_size: u32) {
        self.generator.set_font_size(font_size);
    }

    #[wasm_bindgen(js_name = "setFont")]
    pub fn set_font(&mut self, font: String) {
        self.generator.set_font(font);
    }

    #[wasm_bindgen(js_name = "setTextColor")]
    pub fn set_text_color(&mut self, color: &str) -> bool {
        self.generator.set_text_color(color)
    }

    /// Sets the background mode: `"image"` or `"color"`.
    #[wasm_bindgen(js_name = "setBackgroundMode")]
    pub fn set_background_mode(&mut self, mode: &str) -> Result<(), JsError> {
        self.generator.set_background_mode(parse_name(mode)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setBackgroundColor")]
    pub fn set_background_color(&mut self, color: &str) -> bool {
        self.generator.set_background_color(color)
    }

    /// Sets the shape: `"circle"` or `"square"`.
    #[wasm_bindgen(js_name = "setShape")]
    pub fn set_shape(&mut self, shape: &str) -> Result<(), JsError> {
        self.generator.set_shape(parse_name(shape)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setSize")]
    pub fn set_size(&mut self, size: u32) -> Result<(), JsError> {
        self.generator.set_size(size).map_err(js_error)
    }

    /// Sets the export format: `"png"` or `"ico"`.
    #[wasm_bindgen(js_name = "setExportFormat")]
    pub fn set_export_format(&mut self, format: &str) -> Result<(), JsError> {
        self.generator.set_export_format(parse_name(format)?);
        Ok(())
    }

    #[wasm_bindgen(js_name = "setFileName")]
    pub fn set_file_name(&mut self, file_name: Option<String>) {
        self.generator.set_file_name(file_name);
    }

    /// Returns the current configuration as JSON.
    #[wasm_bindgen(js_name = "configJson")]
    pub fn config_json(&self) -> Result<String, JsError> {
        serde_json::to_string(self.generator.config()).map_err(js_error)
    }

    /// Paints the icon at its actual size.
    pub fn render(&self, canvas: &HtmlCanvasElement) -> Result<(), JsError> {
        paint(canvas, self.generator.icon())
    }

    /// Returns the encoded icon.
    pub fn export(&self) -> Result<js_sys::Uint8Array, JsError> {
        let artifact = self.generator.export().map_err(js_error)?;
        Ok(to_bytes(&artifact))
    }

    /// The download name for [`export`](Self::export).
    #[wasm_bindgen(js_name = "exportFileName")]
    pub fn export_file_name(&self) -> String {
        self.generator.config().output_file_name()
    }
}
