//! Browser glue: LocalStorage, a 2D canvas surface and
//! requestAnimationFrame as a frame source

use std::f64::consts::TAU;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, Storage};

use super::storage::{KeyValueStore, StoreError};
use crate::renderer::surface::{Align, Rgba, Surface, css};
use crate::scheduler::{FrameId, FrameSource};
use crate::tuning::Field;

fn backend(e: JsValue) -> StoreError {
    StoreError::Backend(format!("{:?}", e))
}

/// `window.localStorage`; behaves as an empty, write-failing store when the
/// browser refuses access (private mode, disabled storage)
pub struct LocalStorage {
    storage: Option<Storage>,
}

impl LocalStorage {
    pub fn open() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("localStorage unavailable; progress will not be saved");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match &self.storage {
            Some(storage) => storage.get_item(key).map_err(backend),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StoreError::Backend("localStorage unavailable".into()))?;
        storage.set_item(key, value).map_err(backend)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match &self.storage {
            Some(storage) => storage.remove_item(key).map_err(backend),
            None => Ok(()),
        }
    }
}

/// Canvas 2D context drawing in playfield coordinates
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    field: Field,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, field: Field) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()??
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { canvas, ctx, field })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Match the backing store to the displayed size
    pub fn resize(&self, device_pixel_ratio: f64) {
        let w = (self.canvas.client_width() as f64 * device_pixel_ratio) as u32;
        let h = (self.canvas.client_height() as f64 * device_pixel_ratio) as u32;
        self.canvas.set_width(w.max(1));
        self.canvas.set_height(h.max(1));
    }

    fn set_field_transform(&self) {
        let sx = self.canvas.width() as f64 / self.field.width as f64;
        let sy = self.canvas.height() as f64 / self.field.height as f64;
        let _ = self.ctx.set_transform(sx, 0.0, 0.0, sy, 0.0, 0.0);
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, color: Rgba) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(
            0.0,
            0.0,
            self.canvas.width() as f64,
            self.canvas.height() as f64,
        );
        self.set_field_transform();
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Rgba) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.ctx.stroke_rect(x as f64, y as f64, w as f64, h as f64);
    }

    fn fill_circle(&mut self, x: f32, y: f32, r: f32, color: Rgba) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.begin_path();
        if self.ctx.arc(x as f64, y as f64, r.max(0.0) as f64, 0.0, TAU).is_ok() {
            self.ctx.fill();
        }
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, color: Rgba) {
        self.ctx.set_stroke_style_str(&css(color));
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        self.ctx.move_to(x1 as f64, y1 as f64);
        self.ctx.line_to(x2 as f64, y2 as f64);
        self.ctx.stroke();
    }

    fn text(&mut self, x: f32, y: f32, text: &str, size: f32, align: Align, color: Rgba) {
        self.ctx.set_fill_style_str(&css(color));
        self.ctx.set_font(&format!("bold {}px sans-serif", size.round()));
        self.ctx.set_text_align(match align {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        });
        let _ = self.ctx.fill_text(text, x as f64, y as f64);
    }
}

/// `requestAnimationFrame` as a [`FrameSource`]
///
/// Every delivered frame calls `handler` with the request id and the
/// timestamp in seconds.
pub struct BrowserFrames {
    handler: Rc<dyn Fn(FrameId, f64)>,
    pending: Option<(FrameId, i32)>,
}

impl BrowserFrames {
    pub fn new(handler: Rc<dyn Fn(FrameId, f64)>) -> Self {
        Self {
            handler,
            pending: None,
        }
    }
}

impl FrameSource for BrowserFrames {
    fn request(&mut self, id: FrameId) {
        let Some(window) = web_sys::window() else {
            log::error!("No window; cannot request frames");
            return;
        };
        let handler = self.handler.clone();
        let closure = Closure::once(move |time: f64| {
            handler(id, time / 1000.0);
        });
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(handle) => self.pending = Some((id, handle)),
            Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
        }
        closure.forget();
    }

    fn cancel(&mut self, id: FrameId) {
        if let Some((pending, handle)) = self.pending
            && pending == id
        {
            self.pending = None;
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(handle);
            }
        }
    }
}
