//! `Surface` over an HTML canvas and its container

use std::rc::Rc;

use glam::Vec2;
use log::warn;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use super::window;
use crate::text_drop::{FontSpec, Surface};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    container: HtmlElement,
    context: Option<CanvasRenderingContext2d>,
}

impl CanvasSurface {
    /// Bind `canvas`, sized to `container`
    ///
    /// A canvas without a 2D context still binds; drops on it stay idle.
    pub fn new(canvas: HtmlCanvasElement, container: HtmlElement) -> Rc<Self> {
        let context = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok());
        if context.is_none() {
            warn!("Canvas has no 2D context");
        }
        Rc::new(Self {
            canvas,
            container,
            context,
        })
    }

    /// Computed text colour of the canvas, if any
    fn computed_color(&self) -> Option<String> {
        window()
            .ok()?
            .get_computed_style(&self.canvas)
            .ok()??
            .get_property_value("color")
            .ok()
            .filter(|color| !color.is_empty())
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn sync_size(&self) -> Vec2 {
        self.canvas.set_width(self.container.client_width().max(0) as u32);
        self.canvas.set_height(self.container.client_height().max(0) as u32);
        self.size()
    }

    fn container_width(&self) -> f32 {
        self.container.client_width() as f32
    }

    fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn measure_text(&self, font: &FontSpec, text: &str) -> f32 {
        let Some(ctx) = &self.context else {
            return 0.0;
        };
        ctx.set_font(&font.css());
        ctx.measure_text(text).map_or(0.0, |m| m.width() as f32)
    }

    fn clear(&self) {
        if let Some(ctx) = &self.context {
            let size = self.size();
            ctx.clear_rect(0.0, 0.0, f64::from(size.x), f64::from(size.y));
        }
    }

    fn begin_text(&self, font: &FontSpec, fallback_fill: &str) {
        let Some(ctx) = &self.context else {
            return;
        };
        ctx.set_font(&font.css());
        ctx.set_text_baseline("middle");
        ctx.set_text_align("center");
        let color = self.computed_color();
        ctx.set_fill_style_str(color.as_deref().unwrap_or(fallback_fill));
    }

    fn draw_glyph(&self, text: &str, position: Vec2, angle: f32) {
        let Some(ctx) = &self.context else {
            return;
        };
        ctx.save();
        let _ = ctx.translate(f64::from(position.x), f64::from(position.y));
        let _ = ctx.rotate(f64::from(angle));
        let _ = ctx.fill_text(text, 0.0, 0.0);
        ctx.restore();
    }
}
