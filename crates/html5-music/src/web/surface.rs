use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::error::PlayerError;
use crate::render::layout::FillRect;
use crate::render::Surface;

use super::js_error;

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
    size: (f64, f64),
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, PlayerError> {
        let context = canvas
            .get_context("2d")
            .map_err(js_error)?
            .ok_or_else(|| PlayerError::Dom("canvas has no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| PlayerError::Dom("2d context has an unexpected type".into()))?;
        Ok(Self {
            canvas,
            context,
            size: (0.0, 0.0),
        })
    }
}

impl Surface for CanvasSurface {
    fn sync_size(&mut self) -> (f64, f64) {
        let width = self.canvas.client_width().max(0);
        let height = self.canvas.client_height().max(0);
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.size = (f64::from(width), f64::from(height));
        self.size
    }

    fn size(&self) -> (f64, f64) {
        self.size
    }

    fn clear(&mut self) {
        let (width, height) = self.size;
        self.context.clear_rect(0.0, 0.0, width, height);
    }

    fn set_fill_style(&mut self, color: &str) {
        self.context.set_fill_style_str(color);
    }

    fn fill_rect(&mut self, rect: FillRect) {
        self.context.fill_rect(rect.x, rect.y, rect.w, rect.h);
    }

    fn set_stroke_style(&mut self, color: &str, line_width: f64) {
        self.context.set_stroke_style_str(color);
        self.context.set_line_width(line_width);
    }

    fn begin_path(&mut self) {
        self.context.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.context.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.context.line_to(x, y);
    }

    fn stroke(&mut self) {
        self.context.stroke();
    }
}
