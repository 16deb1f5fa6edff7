//! Rendering: the drawing-surface abstraction and per-entity drawing.
//!
//! [`Context2d`] is the subset of the HTML canvas 2D API the engine needs.
//! Everything that produces pixels goes through it, so the same code drives
//! the browser backend ([`crate::web`]) and the recording backend
//! ([`crate::display_list`]) used by tests and the host binary.
//!
//! [`render_entity`] is the per-entity pipeline: cull, transform, opacity,
//! shadow, then either draw from the entity's cache surface (refreshing it
//! when dirty) or draw the shape directly.
//!
//! ERROR HANDLING
//! ==============
//! Drawing calls are infallible at this layer; backends that can fail log
//! and continue. The only error surfaced is [`RenderError`] from creating a
//! cache surface, which aborts the current frame.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::any::Any;
use std::f64::consts::PI;

use crate::cache::{draw_cache_on_canvas, remove_cache, render_cache, save_cache_snapshot, should_cache};
use crate::config::CacheConfig;
use crate::consts::KAPPA;
use crate::doc::{
    Entity, EntityKind, FillRule, ImageHandle, LineCap, LineJoin, ObjectId, ObjectStore, Paint, PaintFirst, Style,
};
use crate::error::RenderError;
use crate::matrix::{BoundingBox, Matrix, transform_point};
use crate::point::Point;
use crate::transform::Transformable;

// =============================================================
// Backend traits
// =============================================================

/// The 2D drawing calls the engine issues.
///
/// Semantics follow the HTML canvas: paths are built in the current
/// transform, `save`/`restore` nest the whole state, and `global_alpha`
/// multiplies into every paint.
pub trait Context2d {
    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, x: f64, y: f64);
    fn scale(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);
    /// Multiply `m` into the current transform.
    fn transform(&mut self, m: &Matrix);
    /// Replace the current transform.
    fn set_transform(&mut self, m: &Matrix);
    fn global_alpha(&self) -> f64;
    fn set_global_alpha(&mut self, alpha: f64);
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn set_fill_paint(&mut self, paint: &Paint);
    fn set_stroke_paint(&mut self, paint: &Paint);
    fn set_line_width(&mut self, width: f64);
    fn set_line_dash(&mut self, segments: &[f64]);
    fn set_line_dash_offset(&mut self, offset: f64);
    fn set_line_cap(&mut self, cap: LineCap);
    fn set_line_join(&mut self, join: LineJoin);
    fn set_miter_limit(&mut self, limit: f64);
    fn set_shadow(&mut self, color: &str, blur: f64, offset_x: f64, offset_y: f64);
    fn clear_shadow(&mut self);
    fn begin_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn bezier_curve_to(&mut self, cp1x: f64, cp1y: f64, cp2x: f64, cp2y: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start: f64, end: f64);
    #[allow(clippy::too_many_arguments)]
    fn ellipse(&mut self, x: f64, y: f64, rx: f64, ry: f64, rotation: f64, start: f64, end: f64);
    fn close_path(&mut self);
    fn fill(&mut self, rule: FillRule);
    fn stroke(&mut self);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    /// Draw another surface's pixels with its top-left corner at `(dx, dy)`.
    fn draw_surface(&mut self, surface: &dyn Surface, dx: f64, dy: f64);
    /// Draw the `source` region of `image` into the `dest` rectangle.
    fn draw_image(&mut self, image: &ImageHandle, source: BoundingBox, dest: BoundingBox);
}

/// A pixel buffer with its own drawing context.
///
/// Resizing resets the context state and clears the pixels, as a canvas
/// element does.
pub trait Surface {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn set_size(&mut self, width: u32, height: u32);
    fn context(&mut self) -> &mut dyn Context2d;
    /// Backends downcast surfaces they created to reach their native handle.
    fn as_any(&self) -> &dyn Any;
}

/// Creates offscreen surfaces for render caches.
pub trait SurfaceFactory {
    fn create(&self, width: u32, height: u32) -> Result<Box<dyn Surface>, RenderError>;
}

/// Per-frame inputs shared by every entity drawn in a pass.
pub struct RenderEnv<'a> {
    pub factory: &'a dyn SurfaceFactory,
    pub vpt: Matrix,
    /// Device pixel ratio when retina scaling is on, else 1.
    pub retina: f64,
    pub cache: CacheConfig,
    /// Visible scene rectangle; entities wholly outside it are skipped.
    pub visible_area: Option<(Point, Point)>,
    /// Target of an in-progress scale gesture.
    pub scaling: Option<ObjectId>,
}

impl RenderEnv<'_> {
    /// Scene zoom, read from the viewport transform.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.vpt.0[0]
    }
}

// =============================================================
// Entity pipeline
// =============================================================

/// Draw one entity and, for groups, its children.
///
/// `nested` is true when the caller has already applied the owning group's
/// transform; otherwise the full matrix through the group chain is used,
/// which is how members of an active selection are painted.
pub fn render_entity(
    store: &mut ObjectStore,
    id: &ObjectId,
    ctx: &mut dyn Context2d,
    env: &RenderEnv<'_>,
    nested: bool,
) -> Result<(), RenderError> {
    let Some(entity) = store.get(id) else {
        return Ok(());
    };
    if entity.is_not_visible() {
        return Ok(());
    }
    if let Some((tl, br)) = env.visible_area {
        if entity.group.is_none() && !entity.is_on_screen(tl, br) {
            return Ok(());
        }
    }

    ctx.save();
    let (m, alpha) = if nested || entity.group.is_none() {
        (entity.calc_own_matrix(), ctx.global_alpha() * entity.opacity)
    } else {
        (store.calc_transform_matrix(id), store.object_opacity(id))
    };
    ctx.transform(&m);
    ctx.set_global_alpha(alpha);
    set_shadow(store, id, ctx, env);
    let result = paint_entity(store, id, ctx, env);
    ctx.restore();
    result
}

fn paint_entity(
    store: &mut ObjectStore,
    id: &ObjectId,
    ctx: &mut dyn Context2d,
    env: &RenderEnv<'_>,
) -> Result<(), RenderError> {
    if should_cache(store, id) {
        render_cache(store, id, env)?;
        if let Some(entity) = store.get(id) {
            draw_cache_on_canvas(entity, ctx);
        }
        return Ok(());
    }
    if let Some(entity) = store.get_mut(id) {
        remove_cache(entity);
        entity.dirty = false;
    }
    draw_object(store, id, ctx, env)?;
    if let Some(entity) = store.get_mut(id) {
        if entity.caching.object_caching && entity.caching.statefull_cache {
            save_cache_snapshot(entity);
        }
    }
    Ok(())
}

/// Scale a shadow by the viewport, pixel ratio and accumulated object scale.
fn set_shadow(store: &ObjectStore, id: &ObjectId, ctx: &mut dyn Context2d, env: &RenderEnv<'_>) {
    let Some(shadow) = store.get(id).and_then(|e| e.style.shadow.as_ref()) else {
        return;
    };
    let scaling = store.object_scaling(id);
    let mult_x = env.vpt.0[0] * env.retina;
    let mult_y = env.vpt.0[3] * env.retina;
    let blur = shadow.blur * (mult_x + mult_y) * (scaling.x + scaling.y) / 4.0;
    ctx.set_shadow(&shadow.color, blur, shadow.offset_x * mult_x * scaling.x, shadow.offset_y * mult_y * scaling.y);
}

/// Draw the entity's content in its own centered frame: the shape for
/// leaves, every child for groups.
pub fn draw_object(
    store: &mut ObjectStore,
    id: &ObjectId,
    ctx: &mut dyn Context2d,
    env: &RenderEnv<'_>,
) -> Result<(), RenderError> {
    let Some(entity) = store.get(id) else {
        return Ok(());
    };
    if entity.is_group() {
        for child in entity.children().to_vec() {
            render_entity(store, &child, ctx, env, true)?;
        }
        return Ok(());
    }
    set_stroke_styles(ctx, &entity.style);
    set_fill_styles(ctx, &entity.style);
    draw_shape(entity, ctx);
    Ok(())
}

fn set_stroke_styles(ctx: &mut dyn Context2d, style: &Style) {
    if let Some(stroke) = &style.stroke {
        ctx.set_line_width(style.stroke_width);
        ctx.set_line_cap(style.stroke_line_cap);
        ctx.set_line_dash_offset(style.stroke_dash_offset);
        ctx.set_line_join(style.stroke_line_join);
        ctx.set_miter_limit(style.stroke_miter_limit);
        ctx.set_stroke_paint(stroke);
    }
}

fn set_fill_styles(ctx: &mut dyn Context2d, style: &Style) {
    if let Some(fill) = &style.fill {
        ctx.set_fill_paint(fill);
    }
}

// =============================================================
// Shapes
// =============================================================

fn draw_shape(entity: &Entity, ctx: &mut dyn Context2d) {
    let w = entity.geometry.width;
    let h = entity.geometry.height;
    match &entity.kind {
        EntityKind::Rect { rx, ry } => {
            trace_rect(ctx, w, h, rx.min(w / 2.0), ry.min(h / 2.0));
            paint_in_order(entity, ctx);
        }
        EntityKind::Ellipse { rx, ry } => {
            ctx.begin_path();
            ctx.ellipse(0.0, 0.0, *rx, *ry, 0.0, 0.0, 2.0 * PI);
            paint_in_order(entity, ctx);
        }
        EntityKind::Circle { radius } => {
            ctx.begin_path();
            ctx.arc(0.0, 0.0, *radius, 0.0, 2.0 * PI);
            paint_in_order(entity, ctx);
        }
        EntityKind::Triangle => {
            ctx.begin_path();
            ctx.move_to(-w / 2.0, h / 2.0);
            ctx.line_to(0.0, -h / 2.0);
            ctx.line_to(w / 2.0, h / 2.0);
            ctx.close_path();
            paint_in_order(entity, ctx);
        }
        EntityKind::Polygon { points, path_offset, closed } => {
            let Some((first, rest)) = points.split_first() else {
                return;
            };
            ctx.begin_path();
            ctx.move_to(first.x - path_offset.x, first.y - path_offset.y);
            for p in rest {
                ctx.line_to(p.x - path_offset.x, p.y - path_offset.y);
            }
            if *closed {
                ctx.close_path();
            }
            paint_in_order(entity, ctx);
        }
        EntityKind::Image(_) => paint_in_order(entity, ctx),
        EntityKind::Group(_) => {}
    }
}

/// Rectangle path centered on the origin, corners rounded with bezier arcs.
fn trace_rect(ctx: &mut dyn Context2d, w: f64, h: f64, rx: f64, ry: f64) {
    let x = -w / 2.0;
    let y = -h / 2.0;
    let rounded = rx != 0.0 || ry != 0.0;
    ctx.begin_path();
    ctx.move_to(x + rx, y);
    ctx.line_to(x + w - rx, y);
    if rounded {
        ctx.bezier_curve_to(x + w - KAPPA * rx, y, x + w, y + KAPPA * ry, x + w, y + ry);
    }
    ctx.line_to(x + w, y + h - ry);
    if rounded {
        ctx.bezier_curve_to(x + w, y + h - KAPPA * ry, x + w - KAPPA * rx, y + h, x + w - rx, y + h);
    }
    ctx.line_to(x + rx, y + h);
    if rounded {
        ctx.bezier_curve_to(x + KAPPA * rx, y + h, x, y + h - KAPPA * ry, x, y + h - ry);
    }
    ctx.line_to(x, y + ry);
    if rounded {
        ctx.bezier_curve_to(x, y + KAPPA * ry, x + KAPPA * rx, y, x + rx, y);
    }
    ctx.close_path();
}

fn paint_in_order(entity: &Entity, ctx: &mut dyn Context2d) {
    match entity.style.paint_first {
        PaintFirst::Fill => {
            render_fill(entity, ctx);
            render_stroke(entity, ctx);
        }
        PaintFirst::Stroke => {
            render_stroke(entity, ctx);
            render_fill(entity, ctx);
        }
    }
}

fn render_fill(entity: &Entity, ctx: &mut dyn Context2d) {
    if let EntityKind::Image(image) = &entity.kind {
        let Some(element) = &image.element else {
            return;
        };
        let (w, h) = (entity.geometry.width, entity.geometry.height);
        let source = BoundingBox { left: image.crop_x, top: image.crop_y, width: w, height: h };
        let dest = BoundingBox { left: -w / 2.0, top: -h / 2.0, width: w, height: h };
        ctx.draw_image(element, source, dest);
        return;
    }
    let Some(fill) = &entity.style.fill else {
        return;
    };
    ctx.save();
    if fill.is_positioned() {
        ctx.translate(-entity.geometry.width / 2.0, -entity.geometry.height / 2.0);
    }
    ctx.fill(entity.style.fill_rule);
    ctx.restore();
}

fn render_stroke(entity: &Entity, ctx: &mut dyn Context2d) {
    let style = &entity.style;
    let Some(stroke) = &style.stroke else {
        return;
    };
    if style.stroke_width == 0.0 {
        return;
    }
    if style.shadow.as_ref().is_some_and(|s| !s.affect_stroke) {
        ctx.clear_shadow();
    }
    ctx.save();
    if let EntityKind::Image(_) = entity.kind {
        trace_rect(ctx, entity.geometry.width, entity.geometry.height, 0.0, 0.0);
    }
    ctx.set_line_dash(&style.stroke_dash_array);
    if stroke.is_positioned() {
        ctx.translate(-entity.geometry.width / 2.0, -entity.geometry.height / 2.0);
    }
    ctx.stroke();
    ctx.restore();
}

/// Transformed size in viewport pixels, padded on both sides.
#[must_use]
pub fn current_dimensions(entity: &Entity, vpt: &Matrix) -> Point {
    let dim = entity.transformed_dimensions();
    transform_point(dim, vpt, true).scalar_add(2.0 * entity.controls.padding)
}
