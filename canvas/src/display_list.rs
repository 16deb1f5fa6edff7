//! Headless recording backend.
//!
//! [`RecordingSurface`] stores every drawing call as a [`DrawOp`] instead of
//! producing pixels. Tests assert on the recorded list, and the host binary
//! uses it to render without a browser. The context tracks the state that
//! callers read back (current transform and global alpha) through
//! `save`/`restore` the way a real canvas does.

#[cfg(test)]
#[path = "display_list_test.rs"]
mod display_list_test;

use std::any::Any;
use std::cell::Cell;

use crate::doc::{FillRule, ImageHandle, LineCap, LineJoin, Paint};
use crate::error::RenderError;
use crate::matrix::{BoundingBox, Matrix, multiply};
use crate::point::Point;
use crate::render::{Context2d, Surface, SurfaceFactory};

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Save,
    Restore,
    /// The surface was resized, which also resets its state.
    Reset { width: u32, height: u32 },
    Transform(Matrix),
    SetTransform(Matrix),
    GlobalAlpha(f64),
    ClearRect(BoundingBox),
    FillPaint(Paint),
    StrokePaint(Paint),
    LineWidth(f64),
    LineDash(Vec<f64>),
    LineDashOffset(f64),
    LineCap(LineCap),
    LineJoin(LineJoin),
    MiterLimit(f64),
    Shadow { color: String, blur: f64, offset_x: f64, offset_y: f64 },
    ClearShadow,
    BeginPath,
    MoveTo(Point),
    LineTo(Point),
    BezierCurveTo(Point, Point, Point),
    Arc { center: Point, radius: f64, start: f64, end: f64 },
    Ellipse { center: Point, rx: f64, ry: f64, rotation: f64, start: f64, end: f64 },
    ClosePath,
    Fill(FillRule),
    Stroke,
    FillRect(BoundingBox),
    StrokeRect(BoundingBox),
    /// Another recording surface blitted at `(dx, dy)` under `transform`.
    DrawSurface { surface: u64, dx: f64, dy: f64, transform: Matrix },
    DrawImage { key: String, source: BoundingBox, dest: BoundingBox },
}

#[derive(Debug, Clone, Copy)]
struct State {
    transform: Matrix,
    alpha: f64,
}

impl Default for State {
    fn default() -> Self {
        Self { transform: Matrix::IDENTITY, alpha: 1.0 }
    }
}

/// A [`Context2d`] that records calls.
#[derive(Debug, Default)]
pub struct RecordingContext {
    ops: Vec<DrawOp>,
    state: State,
    stack: Vec<State>,
}

impl RecordingContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Drain the recorded calls, keeping the current state.
    pub fn take_ops(&mut self) -> Vec<DrawOp> {
        std::mem::take(&mut self.ops)
    }

    /// The accumulated transform.
    #[must_use]
    pub fn current_transform(&self) -> Matrix {
        self.state.transform
    }

    /// Depth of unmatched `save` calls.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn reset(&mut self, width: u32, height: u32) {
        self.state = State::default();
        self.stack.clear();
        self.ops.push(DrawOp::Reset { width, height });
    }

    fn push_transform(&mut self, m: Matrix) {
        self.state.transform = multiply(&self.state.transform, &m, false);
    }
}

impl Context2d for RecordingContext {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.ops.push(DrawOp::Save);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
        self.ops.push(DrawOp::Restore);
    }

    fn translate(&mut self, x: f64, y: f64) {
        let m = Matrix::translate(x, y);
        self.push_transform(m);
        self.ops.push(DrawOp::Transform(m));
    }

    fn scale(&mut self, x: f64, y: f64) {
        let m = Matrix::scale(x, y);
        self.push_transform(m);
        self.ops.push(DrawOp::Transform(m));
    }

    fn rotate(&mut self, radians: f64) {
        let m = Matrix::rotate(radians.to_degrees());
        self.push_transform(m);
        self.ops.push(DrawOp::Transform(m));
    }

    fn transform(&mut self, m: &Matrix) {
        self.push_transform(*m);
        self.ops.push(DrawOp::Transform(*m));
    }

    fn set_transform(&mut self, m: &Matrix) {
        self.state.transform = *m;
        self.ops.push(DrawOp::SetTransform(*m));
    }

    fn global_alpha(&self) -> f64 {
        self.state.alpha
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.state.alpha = alpha;
        self.ops.push(DrawOp::GlobalAlpha(alpha));
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::ClearRect(BoundingBox { left: x, top: y, width, height }));
    }

    fn set_fill_paint(&mut self, paint: &Paint) {
        self.ops.push(DrawOp::FillPaint(paint.clone()));
    }

    fn set_stroke_paint(&mut self, paint: &Paint) {
        self.ops.push(DrawOp::StrokePaint(paint.clone()));
    }

    fn set_line_width(&mut self, width: f64) {
        self.ops.push(DrawOp::LineWidth(width));
    }

    fn set_line_dash(&mut self, segments: &[f64]) {
        self.ops.push(DrawOp::LineDash(segments.to_vec()));
    }

    fn set_line_dash_offset(&mut self, offset: f64) {
        self.ops.push(DrawOp::LineDashOffset(offset));
    }

    fn set_line_cap(&mut self, cap: LineCap) {
        self.ops.push(DrawOp::LineCap(cap));
    }

    fn set_line_join(&mut self, join: LineJoin) {
        self.ops.push(DrawOp::LineJoin(join));
    }

    fn set_miter_limit(&mut self, limit: f64) {
        self.ops.push(DrawOp::MiterLimit(limit));
    }

    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64) {
        self.ops.push(DrawOp::Shadow { color: color.to_owned(), blur, offset_x, offset_y });
    }

    fn clear_shadow(&mut self) {
        self.ops.push(DrawOp::ClearShadow);
    }

    fn begin_path(&mut self) {
        self.ops.push(DrawOp::BeginPath);
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::MoveTo(Point::new(x, y)));
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ops.push(DrawOp::LineTo(Point::new(x, y)));
    }

    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64) {
        self.ops.push(DrawOp::BezierCurveTo(Point::new(cp1x, cp1y), Point::new(cp2x, cp2y), Point::new(x, y)));
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Arc { center: Point::new(x, y), radius, start, end });
    }

    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64, start: f64, end: f64) {
        self.ops.push(DrawOp::Ellipse { center: Point::new(x, y), rx, ry, rotation, start, end });
    }

    fn close_path(&mut self) {
        self.ops.push(DrawOp::ClosePath);
    }

    fn fill(&mut self, rule: FillRule) {
        self.ops.push(DrawOp::Fill(rule));
    }

    fn stroke(&mut self) {
        self.ops.push(DrawOp::Stroke);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::FillRect(BoundingBox { left: x, top: y, width, height }));
    }

    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ops.push(DrawOp::StrokeRect(BoundingBox { left: x, top: y, width, height }));
    }

    fn draw_surface(&mut self, surface: &dyn Surface, dx: f64, dy: f64) {
        let id = surface.as_any().downcast_ref::<RecordingSurface>().map_or(0, |s| s.id);
        self.ops.push(DrawOp::DrawSurface { surface: id, dx, dy, transform: self.state.transform });
    }

    fn draw_image(&mut self, image: &ImageHandle, source: BoundingBox, dest: BoundingBox) {
        self.ops.push(DrawOp::DrawImage { key: image.key.clone(), source, dest });
    }
}

/// A surface whose context records instead of rasterizing.
#[derive(Debug)]
pub struct RecordingSurface {
    id: u64,
    width: u32,
    height: u32,
    context: RecordingContext,
}

impl RecordingSurface {
    #[must_use]
    pub fn new(id: u64, width: u32, height: u32) -> Self {
        Self { id, width, height, context: RecordingContext::new() }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn recording(&self) -> &RecordingContext {
        &self.context
    }

    pub fn recording_mut(&mut self) -> &mut RecordingContext {
        &mut self.context
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.context.reset(width, height);
    }

    fn context(&mut self) -> &mut dyn Context2d {
        &mut self.context
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Hands out numbered recording surfaces.
///
/// `max_side` simulates a backend that cannot allocate large surfaces.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    next_id: Cell<u64>,
    created: Cell<usize>,
    max_side: Option<u32>,
}

impl RecordingFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_side(max_side: u32) -> Self {
        Self { max_side: Some(max_side), ..Self::default() }
    }

    /// Surfaces successfully created so far.
    #[must_use]
    pub fn created(&self) -> usize {
        self.created.get()
    }
}

impl SurfaceFactory for RecordingFactory {
    fn create(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, RenderError> {
        if let Some(max) = self.max_side {
            if width > max || height > max {
                return Err(RenderError::SurfaceCreation {
                    width,
                    height,
                    reason: format!("exceeds {max}px"),
                });
            }
        }
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.created.set(self.created.get() + 1);
        Ok(Box::new(RecordingSurface::new(id, width, height)))
    }
}
