//! Browser backend over `web_sys::CanvasRenderingContext2d`.
//!
//! This module is the only place that touches the DOM. [`WebFactory`]
//! creates canvas elements as surfaces, [`WebContext`] forwards the
//! [`Context2d`] calls, and [`Engine`] wires a scene's two surfaces into
//! the page and forwards DOM input to [`EngineCore`].
//!
//! ERROR HANDLING
//! ==============
//! Drawing calls that the browser can reject are logged with `warn!` and
//! skipped; a frame never aborts on one failed call. Surface creation
//! failures surface as [`RenderError`]. Pattern paints are not mapped and
//! fall back to transparent.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    CanvasGradient, CanvasRenderingContext2d, CanvasWindingRule, Document, Element, HtmlCanvasElement,
    HtmlImageElement,
};

use crate::config::SceneOptions;
use crate::doc::{FillRule, GradientKind, ImageHandle, LineCap, LineJoin, ObjectId, Paint};
use crate::engine::{Action, EngineCore};
use crate::error::RenderError;
use crate::input::{Button, Key, Modifiers};
use crate::matrix::{BoundingBox, Matrix};
use crate::point::Point;
use crate::render::{Context2d, Surface, SurfaceFactory};
use crate::scene::Scene;

/// Loaded image elements by source key, shared by every surface.
pub type ImageRegistry = Rc<RefCell<HashMap<String, HtmlImageElement>>>;

fn check(result: Result<(), JsValue>, call: &'static str) {
    if let Err(err) = result {
        warn!(call, error = ?err, "canvas call failed");
    }
}

fn line_cap_name(cap: LineCap) -> &'static str {
    match cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
        LineCap::Square => "square",
    }
}

fn line_join_name(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Miter => "miter",
        LineJoin::Round => "round",
        LineJoin::Bevel => "bevel",
    }
}

// =============================================================
// Context
// =============================================================

/// A [`Context2d`] drawing into a browser canvas.
pub struct WebContext {
    ctx: CanvasRenderingContext2d,
    images: ImageRegistry,
}

impl WebContext {
    #[must_use]
    pub fn new(ctx: CanvasRenderingContext2d, images: ImageRegistry) -> Self {
        Self { ctx, images }
    }

    fn gradient(&self, kind: &GradientKind) -> Option<CanvasGradient> {
        match *kind {
            GradientKind::Linear { x1, y1, x2, y2 } => Some(self.ctx.create_linear_gradient(x1, y1, x2, y2)),
            GradientKind::Radial { x1, y1, r1, x2, y2, r2 } => {
                match self.ctx.create_radial_gradient(x1, y1, r1, x2, y2, r2) {
                    Ok(gradient) => Some(gradient),
                    Err(err) => {
                        warn!(error = ?err, "radial gradient rejected");
                        None
                    }
                }
            }
        }
    }

    fn paint_gradient(&self, paint: &Paint) -> Option<CanvasGradient> {
        let Paint::Gradient(gradient) = paint else {
            return None;
        };
        let canvas_gradient = self.gradient(&gradient.kind)?;
        for stop in &gradient.color_stops {
            #[allow(clippy::cast_possible_truncation)]
            check(canvas_gradient.add_color_stop(stop.offset as f32, &stop.color), "add_color_stop");
        }
        Some(canvas_gradient)
    }
}

impl Context2d for WebContext {
    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn translate(&mut self, x: f64, y: f64) {
        check(self.ctx.translate(x, y), "translate");
    }

    fn scale(&mut self, x: f64, y: f64) {
        check(self.ctx.scale(x, y), "scale");
    }

    fn rotate(&mut self, radians: f64) {
        check(self.ctx.rotate(radians), "rotate");
    }

    fn transform(&mut self, m: &Matrix) {
        let [a, b, c, d, e, f] = m.0;
        check(self.ctx.transform(a, b, c, d, e, f), "transform");
    }

    fn set_transform(&mut self, m: &Matrix) {
        let [a, b, c, d, e, f] = m.0;
        check(self.ctx.set_transform(a, b, c, d, e, f), "set_transform");
    }

    fn global_alpha(&self) -> f64 {
        self.ctx.global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn set_fill_paint(&mut self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_fill_style_str(color),
            Paint::Gradient(_) => match self.paint_gradient(paint) {
                Some(gradient) => self.ctx.set_fill_style_canvas_gradient(&gradient),
                None => self.ctx.set_fill_style_str("transparent"),
            },
            Paint::Pattern(_) => self.ctx.set_fill_style_str("transparent"),
        }
    }

    fn set_stroke_paint(&mut self, paint: &Paint) {
        match paint {
            Paint::Solid(color) => self.ctx.set_stroke_style_str(color),
            Paint::Gradient(_) => match self.paint_gradient(paint) {
                Some(gradient) => self.ctx.set_stroke_style_canvas_gradient(&gradient),
                None => self.ctx.set_stroke_style_str("transparent"),
            },
            Paint::Pattern(_) => self.ctx.set_stroke_style_str("transparent"),
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        let array: js_sys::Array = segments.iter().map(|s| JsValue::from_f64(*s)).collect();
        check(self.ctx.set_line_dash(&array), "set_line_dash");
    }

    fn set_line_dash_offset(&mut self, offset: f64) {
        self.ctx.set_line_dash_offset(offset);
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ctx.set_line_cap(line_cap_name(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ctx.set_line_join(line_join_name(join));
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.ctx.set_miter_limit(limit);
    }

    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64) {
        self.ctx.set_shadow_color(color);
        self.ctx.set_shadow_blur(blur);
        self.ctx.set_shadow_offset_x(offset_x);
        self.ctx.set_shadow_offset_y(offset_y);
    }

    fn clear_shadow(&mut self) {
        self.ctx.set_shadow_color("");
        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_shadow_offset_x(0.0);
        self.ctx.set_shadow_offset_y(0.0);
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.ctx.bezier_curve_to(cp1x, cp1y, cp2x, cp2y, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        check(self.ctx.arc(x, y, radius, start, end), "arc");
    }

    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64, start: f64, end: f64) {
        check(self.ctx.ellipse(x, y, rx, ry, rotation, start, end), "ellipse");
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn fill(&mut self, rule: FillRule) {
        let rule = match rule {
            FillRule::Nonzero => CanvasWindingRule::Nonzero,
            FillRule::Evenodd => CanvasWindingRule::Evenodd,
        };
        self.ctx.fill_with_canvas_winding_rule(rule);
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.stroke_rect(x, y, width, height);
    }

    fn draw_surface(&mut self, surface: &dyn Surface, dx: f64, dy: f64) {
        let Some(source) = surface.as_any().downcast_ref::<WebSurface>() else {
            warn!("draw_surface called with a foreign surface");
            return;
        };
        check(self.ctx.draw_image_with_html_canvas_element(&source.canvas, dx, dy), "draw_surface");
    }

    fn draw_image(&mut self, image: &ImageHandle, source: BoundingBox, dest: BoundingBox) {
        let images = self.images.borrow();
        let Some(element) = images.get(&image.key) else {
            warn!(key = %image.key, "image not registered");
            return;
        };
        check(
            self.ctx.draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                element,
                source.left,
                source.top,
                source.width,
                source.height,
                dest.left,
                dest.top,
                dest.width,
                dest.height,
            ),
            "draw_image",
        );
    }
}

// =============================================================
// Surfaces
// =============================================================

/// A canvas element and its 2D context.
pub struct WebSurface {
    canvas: HtmlCanvasElement,
    context: WebContext,
}

impl WebSurface {
    #[must_use]
    pub fn element(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for WebSurface {
    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    fn context(&mut self) -> &mut dyn Context2d {
        &mut self.context
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Creates detached canvas elements.
pub struct WebFactory {
    document: Document,
    images: ImageRegistry,
}

impl WebFactory {
    #[must_use]
    pub fn new(document: Document, images: ImageRegistry) -> Self {
        Self { document, images }
    }
}

impl SurfaceFactory for WebFactory {
    fn create(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, RenderError> {
        let failed = |reason: String| RenderError::SurfaceCreation { width, height, reason };
        let canvas = self
            .document
            .create_element("canvas")
            .map_err(|err| failed(format!("{err:?}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| failed("not a canvas element".to_owned()))?;
        canvas.set_width(width);
        canvas.set_height(height);
        let ctx = canvas
            .get_context("2d")
            .map_err(|err| failed(format!("{err:?}")))?
            .ok_or_else(|| failed("2d context unavailable".to_owned()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| failed("unexpected context type".to_owned()))?;
        Ok(Box::new(WebSurface { canvas, context: WebContext::new(ctx, Rc::clone(&self.images)) }))
    }
}

// =============================================================
// Engine
// =============================================================

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas elements.
pub struct Engine {
    pub core: EngineCore,
    images: ImageRegistry,
}

impl Engine {
    /// Create a scene and append its lower and upper canvases to `container`.
    pub fn new(container: &Element, options: SceneOptions) -> Result<Self, RenderError> {
        let document = container
            .owner_document()
            .ok_or_else(|| RenderError::Backend("container has no document".to_owned()))?;
        let images = ImageRegistry::default();
        let scene = Scene::new(options, Box::new(WebFactory::new(document, Rc::clone(&images))))?;
        for surface in [scene.lower(), scene.upper()] {
            if let Some(web) = surface.as_any().downcast_ref::<WebSurface>() {
                container
                    .append_child(web.element())
                    .map_err(|err| RenderError::Backend(format!("{err:?}")))?;
            }
        }
        Ok(Self { core: EngineCore::new(scene), images })
    }

    /// Make a loaded image drawable under `key`.
    pub fn register_image(&mut self, key: &str, element: HtmlImageElement) {
        self.images.borrow_mut().insert(key.to_owned(), element);
    }

    /// Update viewport dimensions (CSS pixels).
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64) {
        self.core.scene.set_dimensions(width_css, height_css);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_down(key, modifiers)
    }

    pub fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_up(key, modifiers)
    }

    // --- Render ---

    /// Animation-frame callback: draw pending changes.
    pub fn render(&mut self) {
        if let Err(err) = self.core.render() {
            warn!(error = %err, "frame render failed");
        }
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn active_object(&self) -> Option<ObjectId> {
        self.core.scene.active_object()
    }

    #[must_use]
    pub fn cursor(&self) -> &str {
        &self.core.cursor
    }
}
