//! Render cache manager: per-entity offscreen surfaces and their dirtiness.
//!
//! An entity that caches draws its content once into an offscreen surface
//! sized from its transformed dimensions, the scene zoom and the pixel ratio,
//! then blits that surface on every frame until something invalidates it.
//!
//! DESIGN
//! ======
//! Surface size is bounded twice. [`limit_cache_size`] keeps both sides
//! within `[min, max]` and the area within the configured budget, scaling the
//! zoom down (and marking the result `capped`) when the ideal size would not
//! fit. [`update_cache_canvas`] then avoids reallocations: it grows with 10%
//! slack and only shrinks when the needed size drops below 90% of the
//! current surface.
//!
//! Invalidation is flag driven. Cache properties set `dirty` on the entity
//! (see [`crate::doc::ObjectStore::set`]); entities with `statefull_cache`
//! additionally compare a [`CacheSnapshot`] taken at the last redraw.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::fmt;

use tracing::debug;

use crate::config::CacheConfig;
use crate::consts::{ALIASING_LIMIT, CACHE_GROWTH_SLACK, CACHE_SHRINK_THRESHOLD};
use crate::doc::{Entity, EntityKind, ImageHandle, ObjectId, ObjectStore, PaintFirst, Prop, Style};
use crate::error::RenderError;
use crate::matrix::Matrix;
use crate::render::{Context2d, RenderEnv, Surface, draw_object};
use crate::transform::Transformable;

// =============================================================
// State
// =============================================================

/// Cache-relevant properties captured at the last redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSnapshot {
    width: f64,
    height: f64,
    style: Style,
    kind: EntityKind,
}

impl CacheSnapshot {
    fn of(entity: &Entity) -> Self {
        let mut style = entity.style.clone();
        style.shadow = None;
        Self { width: entity.geometry.width, height: entity.geometry.height, style, kind: entity.kind.clone() }
    }
}

/// Per-entity cache state. The surface is created lazily on first use.
#[derive(Default)]
pub struct RenderCache {
    pub(crate) surface: Option<Box<dyn Surface>>,
    cache_width: f64,
    cache_height: f64,
    zoom_x: f64,
    zoom_y: f64,
    translation_x: f64,
    translation_y: f64,
    capped: bool,
    own_caching: bool,
    snapshot: Option<CacheSnapshot>,
    redraws: u64,
}

impl fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCache")
            .field("surface", &self.surface.as_ref().map(|s| (s.width(), s.height())))
            .field("cache_width", &self.cache_width)
            .field("cache_height", &self.cache_height)
            .field("zoom_x", &self.zoom_x)
            .field("zoom_y", &self.zoom_y)
            .field("capped", &self.capped)
            .field("own_caching", &self.own_caching)
            .field("redraws", &self.redraws)
            .finish_non_exhaustive()
    }
}

impl RenderCache {
    #[must_use]
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Allocated surface size in device pixels.
    #[must_use]
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(|s| (s.width(), s.height()))
    }

    /// Size of the region actually used, before growth slack.
    #[must_use]
    pub fn cache_size(&self) -> (f64, f64) {
        (self.cache_width, self.cache_height)
    }

    #[must_use]
    pub fn zoom(&self) -> (f64, f64) {
        (self.zoom_x, self.zoom_y)
    }

    #[must_use]
    pub fn translation(&self) -> (f64, f64) {
        (self.translation_x, self.translation_y)
    }

    #[must_use]
    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Decision from the last [`should_cache`] call.
    #[must_use]
    pub fn own_caching(&self) -> bool {
        self.own_caching
    }

    /// How many times content has been drawn into the surface.
    #[must_use]
    pub fn redraws(&self) -> u64 {
        self.redraws
    }
}

impl Entity {
    #[must_use]
    pub fn render_cache(&self) -> &RenderCache {
        &self.cache
    }
}

// =============================================================
// Sizing
// =============================================================

/// Ideal cache size and the zoom content is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheDimensions {
    /// Surface width including the aliasing margin.
    pub width: f64,
    pub height: f64,
    pub zoom_x: f64,
    pub zoom_y: f64,
    /// Untransformed width plus stroke.
    pub x: f64,
    pub y: f64,
    /// The area budget forced a lower zoom.
    pub capped: bool,
}

/// Ideal surface for `id` at the given scene zoom and pixel ratio.
#[must_use]
pub fn cache_canvas_dimensions(store: &ObjectStore, id: &ObjectId, zoom: f64, retina: f64) -> Option<CacheDimensions> {
    let entity = store.get(id)?;
    let scale = store.object_scaling(id);
    let dim = entity.non_transformed_dimensions();
    let zoom_x = scale.x * zoom * retina;
    let zoom_y = scale.y * zoom * retina;
    Some(CacheDimensions {
        width: (dim.x * zoom_x).ceil() + ALIASING_LIMIT,
        height: (dim.y * zoom_y).ceil() + ALIASING_LIMIT,
        zoom_x,
        zoom_y,
        x: dim.x,
        y: dim.y,
        capped: false,
    })
}

/// Clamp a surface into the configured side and area limits.
#[must_use]
pub fn limit_cache_size(mut dims: CacheDimensions, limits: &CacheConfig) -> CacheDimensions {
    let min = f64::from(limits.min_cache_side_limit);
    let max = f64::from(limits.max_cache_side_limit);
    #[allow(clippy::cast_precision_loss)]
    let area = limits.perf_limit_size_total as f64;
    let (width, height) = (dims.width, dims.height);

    if width <= max && height <= max && width * height <= area {
        dims.width = width.max(min);
        dims.height = height.max(min);
        return dims;
    }

    let (limit_x, limit_y) = limit_dims_by_area(width / height, area);
    let x = cap_value(min, limit_x, max);
    let y = cap_value(min, limit_y, max);
    if width > x {
        dims.zoom_x /= width / x;
        dims.width = x;
        dims.capped = true;
    }
    if height > y {
        dims.zoom_y /= height / y;
        dims.height = y;
        dims.capped = true;
    }
    dims.width = dims.width.max(min);
    dims.height = dims.height.max(min);
    dims
}

/// Largest whole-pixel size with `aspect_ratio` whose area fits `area`.
#[must_use]
pub fn limit_dims_by_area(aspect_ratio: f64, area: f64) -> (f64, f64) {
    let rough_width = (area * aspect_ratio).sqrt();
    (rough_width.floor(), (area / rough_width).floor())
}

#[must_use]
pub fn cap_value(min: f64, value: f64, max: f64) -> f64 {
    value.min(max).max(min)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_pixels(value: f64) -> u32 {
    value.ceil().clamp(1.0, f64::from(u32::MAX)) as u32
}

// =============================================================
// Caching decisions
// =============================================================

/// Painting stroke under fill with a shadow cannot be flattened into a
/// parent's cache.
#[must_use]
pub fn needs_its_own_cache(entity: &Entity) -> bool {
    entity.style.paint_first == PaintFirst::Stroke
        && entity.style.has_fill()
        && entity.style.has_stroke()
        && entity.style.shadow.is_some()
}

/// A visible offset shadow is drawn by `id` or, for groups without their
/// own shadow, by any descendant.
#[must_use]
pub fn will_draw_shadow(store: &ObjectStore, id: &ObjectId) -> bool {
    let Some(entity) = store.get(id) else {
        return false;
    };
    if entity.style.shadow.is_some() || !entity.is_group() {
        return entity.has_offset_shadow();
    }
    entity.children().iter().any(|child| will_draw_shadow(store, child))
}

/// Decide whether `id` renders through its own surface and remember the
/// answer for [`is_on_a_cache`].
///
/// Active selections never cache. A group refuses when a child draws an
/// offset shadow, since the shadow would be clipped by the group surface.
pub fn should_cache(store: &mut ObjectStore, id: &ObjectId) -> bool {
    let Some(entity) = store.get(id) else {
        return false;
    };
    let own = if entity.is_active_selection() {
        false
    } else {
        let own = needs_its_own_cache(entity)
            || (entity.caching.object_caching && entity.group.is_none_or(|g| !is_on_a_cache(store, &g)));
        own && !(entity.is_group() && entity.children().iter().any(|c| will_draw_shadow(store, c)))
    };
    if let Some(entity) = store.get_mut(id) {
        entity.cache.own_caching = own;
    }
    own
}

/// `id` or one of its ancestors draws through its own surface.
#[must_use]
pub fn is_on_a_cache(store: &ObjectStore, id: &ObjectId) -> bool {
    let Some(entity) = store.get(id) else {
        return false;
    };
    entity.cache.own_caching || entity.group.is_some_and(|g| is_on_a_cache(store, &g))
}

// =============================================================
// Surface maintenance
// =============================================================

/// Bring the surface in line with the current size and zoom.
///
/// Returns `true` when the surface was reset and must be redrawn. During a
/// scale gesture on an entity with `no_scale_cache` the old surface is kept
/// and stretched instead.
pub fn update_cache_canvas(store: &mut ObjectStore, id: &ObjectId, env: &RenderEnv<'_>) -> bool {
    if env.scaling == Some(*id) && store.get(id).is_some_and(|e| e.caching.no_scale_cache) {
        return false;
    }
    fit_cache_surface(store, id, env)
}

fn fit_cache_surface(store: &mut ObjectStore, id: &ObjectId, env: &RenderEnv<'_>) -> bool {
    let Some(dims) = cache_canvas_dimensions(store, id, env.zoom(), env.retina) else {
        return false;
    };
    let dims = limit_cache_size(dims, &env.cache);
    let min = f64::from(env.cache.min_cache_side_limit);
    let Some(entity) = store.get_mut(id) else {
        return false;
    };
    let cache = &mut entity.cache;
    let Some(surface) = cache.surface.as_mut() else {
        return false;
    };

    let dimensions_changed = dims.width != cache.cache_width || dims.height != cache.cache_height;
    let zoom_changed = dims.zoom_x != cache.zoom_x || dims.zoom_y != cache.zoom_y;
    if !dimensions_changed && !zoom_changed {
        return false;
    }

    let canvas_width = f64::from(surface.width());
    let canvas_height = f64::from(surface.height());
    let mut resize = false;
    let mut extra = (0.0, 0.0);
    if dimensions_changed {
        let growing = dims.width > canvas_width || dims.height > canvas_height;
        let shrinking = (dims.width < canvas_width * CACHE_SHRINK_THRESHOLD
            || dims.height < canvas_height * CACHE_SHRINK_THRESHOLD)
            && canvas_width > min
            && canvas_height > min;
        resize = growing || shrinking;
        if growing && !dims.capped && (dims.width > min || dims.height > min) {
            extra = (dims.width * CACHE_GROWTH_SLACK, dims.height * CACHE_GROWTH_SLACK);
        }
    }

    if resize {
        surface.set_size(to_pixels(dims.width + extra.0), to_pixels(dims.height + extra.1));
        debug!(%id, width = surface.width(), height = surface.height(), capped = dims.capped, "cache surface resized");
    } else {
        let ctx = surface.context();
        ctx.set_transform(&Matrix::IDENTITY);
        ctx.clear_rect(0.0, 0.0, canvas_width, canvas_height);
    }

    let drawing_width = dims.x * dims.zoom_x / 2.0;
    let drawing_height = dims.y * dims.zoom_y / 2.0;
    cache.translation_x = (f64::from(surface.width()) / 2.0 - drawing_width).round() + drawing_width;
    cache.translation_y = (f64::from(surface.height()) / 2.0 - drawing_height).round() + drawing_height;
    let ctx = surface.context();
    ctx.translate(cache.translation_x, cache.translation_y);
    ctx.scale(dims.zoom_x, dims.zoom_y);
    cache.cache_width = dims.width;
    cache.cache_height = dims.height;
    cache.zoom_x = dims.zoom_x;
    cache.zoom_y = dims.zoom_y;
    cache.capped = dims.capped;
    true
}

fn create_cache_canvas(store: &mut ObjectStore, id: &ObjectId, env: &RenderEnv<'_>) -> Result<(), RenderError> {
    let Some(dims) = cache_canvas_dimensions(store, id, env.zoom(), env.retina) else {
        return Ok(());
    };
    let dims = limit_cache_size(dims, &env.cache);
    let surface = env.factory.create(to_pixels(dims.width), to_pixels(dims.height))?;
    debug!(%id, width = surface.width(), height = surface.height(), capped = dims.capped, "cache surface allocated");
    if let Some(entity) = store.get_mut(id) {
        entity.cache.surface = Some(surface);
        entity.cache.snapshot = None;
    }
    fit_cache_surface(store, id, env);
    if let Some(entity) = store.get_mut(id) {
        entity.dirty = true;
    }
    Ok(())
}

/// Erase the region content is drawn into, in cache drawing units.
fn clear_cache_area(entity: &mut Entity) {
    let cache = &mut entity.cache;
    let width = cache.cache_width / cache.zoom_x;
    let height = cache.cache_height / cache.zoom_y;
    if let Some(surface) = cache.surface.as_mut() {
        surface.context().clear_rect(-width / 2.0, -height / 2.0, width, height);
    }
}

/// Whether the cached pixels are stale.
///
/// With `skip_canvas` the surface itself is neither resized nor cleared;
/// groups use that to ask their children.
pub fn is_cache_dirty(store: &mut ObjectStore, id: &ObjectId, skip_canvas: bool, env: &RenderEnv<'_>) -> bool {
    let Some(entity) = store.get(id) else {
        return false;
    };
    if entity.is_not_visible() {
        return false;
    }
    if entity.cache.surface.is_some() && !skip_canvas && update_cache_canvas(store, id, env) {
        return true;
    }
    let Some(entity) = store.get(id) else {
        return false;
    };
    let stale = entity.dirty
        || (entity.caching.statefull_cache && entity.cache.snapshot.as_ref() != Some(&CacheSnapshot::of(entity)));
    let children = if !stale && entity.caching.statefull_cache { entity.children().to_vec() } else { Vec::new() };
    let child_stale = children.iter().any(|child| is_cache_dirty(store, child, true, env));
    if !stale && !child_stale {
        return false;
    }
    if !skip_canvas {
        if let Some(entity) = store.get_mut(id) {
            clear_cache_area(entity);
        }
    }
    true
}

/// Make sure the surface exists and holds current content.
pub fn render_cache(store: &mut ObjectStore, id: &ObjectId, env: &RenderEnv<'_>) -> Result<(), RenderError> {
    if !store.get(id).is_some_and(|e| e.cache.surface.is_some()) {
        create_cache_canvas(store, id, env)?;
    }
    if !is_cache_dirty(store, id, false, env) {
        return Ok(());
    }
    let Some(entity) = store.get_mut(id) else {
        return Ok(());
    };
    if entity.caching.statefull_cache {
        save_cache_snapshot(entity);
    }
    let Some(mut surface) = entity.cache.surface.take() else {
        return Ok(());
    };
    let result = draw_object(store, id, surface.context(), env);
    if let Some(entity) = store.get_mut(id) {
        entity.cache.surface = Some(surface);
        entity.cache.redraws += 1;
        entity.dirty = false;
    }
    result
}

/// Blit the cache surface into `ctx`, undoing the zoom it was drawn at.
pub fn draw_cache_on_canvas(entity: &Entity, ctx: &mut dyn Context2d) {
    let cache = &entity.cache;
    let Some(surface) = cache.surface.as_deref() else {
        return;
    };
    ctx.scale(1.0 / cache.zoom_x, 1.0 / cache.zoom_y);
    ctx.draw_surface(surface, -cache.translation_x, -cache.translation_y);
}

/// Drop the surface; it is recreated from scratch on the next cached render.
pub fn remove_cache(entity: &mut Entity) {
    let cache = &mut entity.cache;
    cache.surface = None;
    cache.cache_width = 0.0;
    cache.cache_height = 0.0;
}

/// Record the cache-relevant properties the surface now reflects.
pub fn save_cache_snapshot(entity: &mut Entity) {
    entity.cache.snapshot = Some(CacheSnapshot::of(entity));
}

/// Mark the cache stale; the next render redraws it.
pub fn invalidate_cache(store: &mut ObjectStore, id: &ObjectId) {
    store.set(id, Prop::Dirty(true));
}

/// Key filter backends file an entity's texture under. Stable for the
/// entity's lifetime, whatever element it currently shows.
#[must_use]
pub fn cache_key(entity: &Entity) -> String {
    format!("texture{}", entity.id.simple())
}

/// Replace the element behind an image entity, resizing it to the new
/// natural size. Returns false when `id` is not an image.
pub fn set_element(store: &mut ObjectStore, id: &ObjectId, element: ImageHandle) -> bool {
    let Some(entity) = store.get_mut(id) else {
        return false;
    };
    let EntityKind::Image(image) = &mut entity.kind else {
        return false;
    };
    let (width, height) = (element.width, element.height);
    debug!(%id, key = %element.key, width, height, "image element replaced");
    image.element = Some(element);
    store.set_all(id, [Prop::Width(width), Prop::Height(height)]);
    invalidate_cache(store, id);
    true
}
