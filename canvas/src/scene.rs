//! The scene: ordered top-level objects, the active selection, the viewport
//! and the two drawing surfaces.
//!
//! A [`Scene`] owns every entity through its [`ObjectStore`] and keeps the
//! paint order of top-level objects separately. Members of a group live in
//! the store too but never appear in the order list; members of an active
//! selection stay in it, because the selection is a transient wrapper.
//!
//! DESIGN
//! ======
//! Two surfaces mirror the browser setup: the lower surface holds the scene
//! and the controls of the active object, the upper surface holds transient
//! feedback (the marquee). Mutations only raise the render request flag;
//! [`Scene::on_animation_frame`] turns any number of requests into one
//! [`Scene::render_all`], and a synchronous render clears the flag so a
//! pending frame becomes a no-op.
//!
//! Entity fields can be changed through [`Scene::store_mut`]; call
//! [`Scene::set_coords`] afterwards when a transform field changed, so hit
//! testing sees the new corners.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use tracing::{debug, trace};

use crate::camera::{Camera, ViewportBounds};
use crate::config::SceneOptions;
use crate::controls::render_controls;
use crate::doc::{Entity, FillRule, GroupRole, ObjectId, ObjectStore, Origin, Paint};
use crate::error::RenderError;
use crate::events::{EventBus, SceneEvent};
use crate::group::{self, Container};
use crate::input::Marquee;
use crate::matrix::Matrix;
use crate::point::Point;
use crate::render::{Context2d, RenderEnv, Surface, SurfaceFactory, render_entity};
use crate::transform::Transformable;

/// Scene state plus its rendering surfaces.
pub struct Scene {
    pub(crate) store: ObjectStore,
    pub(crate) order: Vec<ObjectId>,
    pub(crate) camera: Camera,
    pub(crate) options: SceneOptions,
    pub(crate) active: Option<ObjectId>,
    pub(crate) events: EventBus<SceneEvent>,
    /// Target of an in-progress scale gesture, for `no_scale_cache`.
    pub(crate) scaling: Option<ObjectId>,
    render_requested: bool,
    renders: u64,
    bounds: ViewportBounds,
    factory: Box<dyn SurfaceFactory>,
    lower: Box<dyn Surface>,
    upper: Box<dyn Surface>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("objects", &self.order.len())
            .field("active", &self.active)
            .field("vpt", &self.camera.transform())
            .field("render_requested", &self.render_requested)
            .finish_non_exhaustive()
    }
}

impl Container for Scene {
    fn members(&self) -> &[ObjectId] {
        &self.order
    }
}

/// Device-pixel size of a surface covering `css` pixels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_pixels(css: f64, ratio: f64) -> u32 {
    (css * ratio).ceil().max(1.0) as u32
}

impl Scene {
    /// Create a scene and its two surfaces.
    ///
    /// Fails when the options are invalid or a surface cannot be created.
    pub fn new(options: SceneOptions, factory: Box<dyn SurfaceFactory>) -> Result<Self, RenderError> {
        options.validate()?;
        let ratio = options.retina_scaling();
        let (w, h) = (device_pixels(options.width, ratio), device_pixels(options.height, ratio));
        let lower = factory.create(w, h)?;
        let upper = factory.create(w, h)?;
        let mut scene = Self {
            store: ObjectStore::new(),
            order: Vec::new(),
            camera: Camera::default(),
            options,
            active: None,
            events: EventBus::new(),
            scaling: None,
            render_requested: false,
            renders: 0,
            bounds: ViewportBounds::default(),
            factory,
            lower,
            upper,
        };
        scene.calc_viewport_boundaries();
        Ok(scene)
    }

    // --- Accessors ---

    #[must_use]
    pub fn options(&self) -> &SceneOptions {
        &self.options
    }

    #[must_use]
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    #[must_use]
    pub fn object(&self, id: &ObjectId) -> Option<&Entity> {
        self.store.get(id)
    }

    /// Top-level objects in paint order.
    #[must_use]
    pub fn objects(&self) -> &[ObjectId] {
        &self.order
    }

    pub fn events(&mut self) -> &mut EventBus<SceneEvent> {
        &mut self.events
    }

    #[must_use]
    pub fn lower(&self) -> &dyn Surface {
        self.lower.as_ref()
    }

    #[must_use]
    pub fn upper(&self) -> &dyn Surface {
        self.upper.as_ref()
    }

    #[must_use]
    pub fn is_render_requested(&self) -> bool {
        self.render_requested
    }

    /// Full renders performed so far.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Resize both surfaces (CSS pixels).
    pub fn set_dimensions(&mut self, width: f64, height: f64) {
        self.options.width = width;
        self.options.height = height;
        let ratio = self.options.retina_scaling();
        let (w, h) = (device_pixels(width, ratio), device_pixels(height, ratio));
        self.lower.set_size(w, h);
        self.upper.set_size(w, h);
        self.calc_viewport_boundaries();
        self.request_render_all();
    }

    pub fn set_background_color(&mut self, color: Option<String>) {
        self.options.background_color = color;
        self.request_render_all();
    }

    pub fn set_overlay_color(&mut self, color: Option<String>) {
        self.options.overlay_color = color;
        self.request_render_all();
    }

    /// Recompute the corners of `id` (and its members) under the current viewport.
    pub fn set_coords(&mut self, id: &ObjectId) {
        let vpt = self.camera.transform();
        self.store.set_coords(id, &vpt);
    }

    fn after_add_remove(&mut self) {
        if self.options.render_on_add_remove {
            self.request_render_all();
        }
    }

    fn after_reorder(&mut self) {
        self.sort_selection_members();
        self.after_add_remove();
    }

    // =============================================================
    // Collection
    // =============================================================

    fn on_object_added(&mut self, id: ObjectId) {
        self.set_coords(&id);
        self.events.fire(&SceneEvent::ObjectAdded { target: id });
    }

    /// Append an entity on top and return its id.
    pub fn add(&mut self, entity: Entity) -> ObjectId {
        let id = self.store.insert(entity);
        self.order.push(id);
        self.on_object_added(id);
        self.after_add_remove();
        id
    }

    /// Insert an entity at `index` in paint order (clamped to the end).
    pub fn insert_at(&mut self, entity: Entity, index: usize) -> ObjectId {
        let id = self.store.insert(entity);
        self.order.insert(index.min(self.order.len()), id);
        self.on_object_added(id);
        self.after_add_remove();
        id
    }

    /// Remove a top-level object (and, for groups, its members).
    pub fn remove(&mut self, id: &ObjectId) -> Option<Entity> {
        let index = self.order.iter().position(|o| o == id)?;
        if self.active == Some(*id) {
            self.events.fire(&SceneEvent::BeforeSelectionCleared { target: *id });
            self.discard_internal();
            self.events.fire(&SceneEvent::SelectionCleared { deselected: vec![*id] });
        } else if let Some(selection) = self.active.filter(|a| self.is_selection_of(a, id)) {
            let vpt = self.camera.transform();
            group::remove_with_update(&mut self.store, &selection, id, &vpt);
            if self.store.get(&selection).is_none_or(|s| s.size() == 0) {
                self.discard_internal();
            }
        }
        self.order.remove(index);
        let entity = self.store.remove(id);
        self.events.fire(&SceneEvent::ObjectRemoved { target: *id });
        self.after_add_remove();
        entity
    }

    /// Drop every object and the selection.
    pub fn clear(&mut self) {
        self.discard_active_object();
        self.upper.context().clear_rect(0.0, 0.0, self.options.width, self.options.height);
        for id in std::mem::take(&mut self.order) {
            self.store.remove(&id);
        }
        self.store.clear();
        self.events.fire(&SceneEvent::Cleared);
        self.request_render_all();
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.order.contains(id)
    }

    fn is_selection_of(&self, selection: &ObjectId, id: &ObjectId) -> bool {
        self.store.get(selection).is_some_and(|s| s.is_active_selection() && s.includes(id))
    }

    // =============================================================
    // Z-order
    // =============================================================

    fn index_of(&self, id: &ObjectId) -> Option<usize> {
        self.order.iter().position(|o| o == id)
    }

    fn detach(&mut self, id: &ObjectId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.order.remove(index);
                true
            }
            None => false,
        }
    }

    /// Members to move when `id` is the active selection, else `id` alone.
    fn z_targets(&self, id: &ObjectId) -> Option<Vec<ObjectId>> {
        let entity = self.store.get(id)?;
        if entity.is_active_selection() && self.active == Some(*id) {
            Some(entity.children().to_vec())
        } else {
            None
        }
    }

    pub fn bring_to_front(&mut self, id: &ObjectId) {
        let targets = self.z_targets(id).unwrap_or_else(|| vec![*id]);
        for target in targets {
            if self.detach(&target) {
                self.order.push(target);
            }
        }
        self.after_reorder();
    }

    /// Move to the bottom. Members of an active selection are sent back one
    /// at a time, which reverses their relative order.
    pub fn send_to_back(&mut self, id: &ObjectId) {
        let targets = self.z_targets(id).unwrap_or_else(|| vec![*id]);
        for target in targets {
            if self.detach(&target) {
                self.order.insert(0, target);
            }
        }
        self.after_reorder();
    }

    /// Move one step up; with `intersecting`, jump above the next object
    /// that overlaps it.
    pub fn bring_forward(&mut self, id: &ObjectId, intersecting: bool) {
        if let Some(members) = self.z_targets(id) {
            let mut moved = 0;
            for member in members.iter().rev() {
                if let Some(index) = self.index_of(member) {
                    if index + 1 + moved < self.order.len() {
                        self.order.remove(index);
                        self.order.insert(index + 1, *member);
                    }
                }
                moved += 1;
            }
        } else if let Some(index) = self.index_of(id) {
            if index + 1 != self.order.len() {
                let new_index = if intersecting {
                    (index + 1..self.order.len()).find(|i| self.overlaps(id, &self.order[*i])).unwrap_or(index)
                } else {
                    index + 1
                };
                self.order.remove(index);
                self.order.insert(new_index, *id);
            }
        }
        self.after_reorder();
    }

    /// Move one step down; with `intersecting`, jump below the next object
    /// that overlaps it.
    pub fn send_backwards(&mut self, id: &ObjectId, intersecting: bool) {
        if let Some(members) = self.z_targets(id) {
            for (moved, member) in members.iter().enumerate() {
                if let Some(index) = self.index_of(member) {
                    if index > moved {
                        self.order.remove(index);
                        self.order.insert(index - 1, *member);
                    }
                }
            }
        } else if let Some(index) = self.index_of(id) {
            if index != 0 {
                let new_index = if intersecting {
                    (0..index).rev().find(|i| self.overlaps(id, &self.order[*i])).unwrap_or(index)
                } else {
                    index - 1
                };
                self.order.remove(index);
                self.order.insert(new_index, *id);
            }
        }
        self.after_reorder();
    }

    pub fn move_to(&mut self, id: &ObjectId, index: usize) {
        if self.detach(id) {
            self.order.insert(index.min(self.order.len()), *id);
        }
        self.after_reorder();
    }

    fn overlaps(&self, a: &ObjectId, b: &ObjectId) -> bool {
        match (self.store.get(a), self.store.get(b)) {
            (Some(a), Some(b)) => {
                a.intersects_with_object(b, true)
                    || a.is_contained_within_object(b, true)
                    || b.is_contained_within_object(a, true)
            }
            _ => false,
        }
    }

    // =============================================================
    // Selection
    // =============================================================

    #[must_use]
    pub fn active_object(&self) -> Option<ObjectId> {
        self.active
    }

    /// Members of the active selection, the single active object, or nothing.
    #[must_use]
    pub fn active_objects(&self) -> Vec<ObjectId> {
        let Some(active) = self.active else {
            return Vec::new();
        };
        match self.store.get(&active) {
            Some(entity) if entity.is_active_selection() => entity.children().to_vec(),
            Some(_) => vec![active],
            None => Vec::new(),
        }
    }

    /// Make `id` the active object and fire the selection events.
    pub fn set_active_object(&mut self, id: &ObjectId) {
        let previous = self.active_objects();
        self.set_active_internal(*id);
        self.fire_selection_events(&previous);
    }

    /// Select `members`: one becomes the active object, several are wrapped
    /// in a new active selection kept in scene paint order.
    pub fn select(&mut self, members: &[ObjectId]) {
        let previous = self.active_objects();
        match members {
            [] => return,
            [single] => self.set_active_internal(*single),
            _ => {
                self.discard_internal();
                let vpt = self.camera.transform();
                let selection = group::create_group(&mut self.store, members, GroupRole::ActiveSelection, &vpt);
                self.active = Some(selection);
                self.sort_selection_members();
            }
        }
        self.fire_selection_events(&previous);
    }

    pub fn discard_active_object(&mut self) {
        let previous = self.active_objects();
        if let (Some(active), false) = (self.active, previous.is_empty()) {
            self.events.fire(&SceneEvent::BeforeSelectionCleared { target: active });
        }
        self.discard_internal();
        self.fire_selection_events(&previous);
    }

    /// Keep the active selection's members in scene paint order.
    pub(crate) fn sort_selection_members(&mut self) {
        let Some(selection) = self.active else {
            return;
        };
        let order = &self.order;
        if let Some(data) = self.store.get_mut(&selection).and_then(|e| e.kind.group_mut()) {
            if data.role == GroupRole::ActiveSelection {
                data.children.sort_by_key(|id| order.iter().position(|o| o == id));
            }
        }
    }

    pub(crate) fn set_active_internal(&mut self, id: ObjectId) {
        if self.active == Some(id) || !self.store.contains(&id) {
            return;
        }
        self.discard_internal();
        self.active = Some(id);
    }

    /// Clear the active object without events; an active selection is
    /// dissolved back into its members.
    pub(crate) fn discard_internal(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if self.store.get(&active).is_some_and(Entity::is_active_selection) {
            let vpt = self.camera.transform();
            group::destroy(&mut self.store, &active, &vpt);
            self.store.remove(&active);
            debug!(selection = %active, "active selection dissolved");
        }
    }

    pub(crate) fn fire_selection_events(&mut self, previous: &[ObjectId]) {
        let current = self.active_objects();
        let deselected: Vec<ObjectId> = previous.iter().filter(|o| !current.contains(o)).copied().collect();
        let selected: Vec<ObjectId> = current.iter().filter(|o| !previous.contains(o)).copied().collect();
        if !previous.is_empty() && !current.is_empty() {
            if !selected.is_empty() || !deselected.is_empty() {
                self.events.fire(&SceneEvent::SelectionUpdated { selected, deselected });
            }
        } else if !current.is_empty() {
            self.events.fire(&SceneEvent::SelectionCreated { selected: current });
        } else if !previous.is_empty() {
            self.events.fire(&SceneEvent::SelectionCleared { deselected: previous.to_vec() });
        }
    }

    /// Turn the active selection into a persistent group, which becomes
    /// the active object.
    pub fn to_group(&mut self) -> Option<ObjectId> {
        let selection = self.active.filter(|a| self.store.get(a).is_some_and(Entity::is_active_selection))?;
        let members = self.store.children(&selection);
        let vpt = self.camera.transform();
        let gid = group::convert(&mut self.store, &selection, GroupRole::Group, &vpt)?;
        self.order.retain(|o| !members.contains(o));
        self.order.push(gid);
        self.active = Some(gid);
        self.events.fire(&SceneEvent::ObjectAdded { target: gid });
        self.after_add_remove();
        Some(gid)
    }

    /// Dissolve group `gid` into an active selection of its members, which
    /// go back on top of the paint order.
    pub fn to_active_selection(&mut self, gid: &ObjectId) -> Option<ObjectId> {
        let entity = self.store.get(gid)?;
        if !entity.is_group() || entity.is_active_selection() || !self.contains(gid) {
            return None;
        }
        let members = entity.children().to_vec();
        let previous = self.active_objects();
        if self.active == Some(*gid) {
            self.active = None;
        } else {
            self.discard_internal();
        }
        let vpt = self.camera.transform();
        let selection = group::convert(&mut self.store, gid, GroupRole::ActiveSelection, &vpt)?;
        self.detach(gid);
        self.events.fire(&SceneEvent::ObjectRemoved { target: *gid });
        for member in &members {
            self.order.push(*member);
            self.events.fire(&SceneEvent::ObjectAdded { target: *member });
        }
        self.active = Some(selection);
        self.fire_selection_events(&previous);
        self.after_add_remove();
        Some(selection)
    }

    // =============================================================
    // Placement
    // =============================================================

    fn center_at(&mut self, id: &ObjectId, center: Point) {
        self.store.set_position_by_origin(id, center, Origin::Center, Origin::Center);
        self.set_coords(id);
        self.after_add_remove();
    }

    fn object_center(&self, id: &ObjectId) -> Point {
        self.store.get(id).map_or(Point::ORIGIN, |e| e.center_point())
    }

    /// Center of the surface in scene units, ignoring the viewport.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.options.width / 2.0, self.options.height / 2.0)
    }

    pub fn center_object_h(&mut self, id: &ObjectId) {
        let target = Point::new(self.center().x, self.object_center(id).y);
        self.center_at(id, target);
    }

    pub fn center_object_v(&mut self, id: &ObjectId) {
        let target = Point::new(self.object_center(id).x, self.center().y);
        self.center_at(id, target);
    }

    pub fn center_object(&mut self, id: &ObjectId) {
        let target = self.center();
        self.center_at(id, target);
    }

    pub fn viewport_center_object(&mut self, id: &ObjectId) {
        let target = self.vp_center();
        self.center_at(id, target);
    }

    pub fn viewport_center_object_h(&mut self, id: &ObjectId) {
        let target = Point::new(self.vp_center().x, self.object_center(id).y);
        self.center_at(id, target);
    }

    pub fn viewport_center_object_v(&mut self, id: &ObjectId) {
        let target = Point::new(self.object_center(id).x, self.vp_center().y);
        self.center_at(id, target);
    }

    /// Snap the angle to the nearest multiple of 90 degrees.
    pub fn straighten_object(&mut self, id: &ObjectId) {
        let Some(entity) = self.store.get(id) else {
            return;
        };
        let angle = straighten_angle(entity.geometry.angle);
        self.store.rotate(id, angle);
        self.set_coords(id);
        self.request_render_all();
    }

    // =============================================================
    // Viewport
    // =============================================================

    #[must_use]
    pub fn viewport_transform(&self) -> Matrix {
        self.camera.transform()
    }

    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.camera.zoom()
    }

    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Replace the viewport matrix and refresh every top-level object's
    /// viewport corners.
    pub fn set_viewport_transform(&mut self, vpt: Matrix) {
        self.camera.set_transform(vpt);
        for id in self.order.clone() {
            if self.store.get(&id).is_some_and(|e| e.group.is_none()) {
                self.store.set_coords(&id, &vpt);
            }
        }
        if let Some(active) = self.active.filter(|a| self.store.get(a).is_some_and(Entity::is_active_selection)) {
            self.store.set_coords(&active, &vpt);
        }
        self.calc_viewport_boundaries();
        self.after_add_remove();
    }

    /// Zoom to `value` keeping viewport point `point` fixed.
    pub fn zoom_to_point(&mut self, point: Point, value: f64) {
        let vpt = self.camera.zoomed_to_point(point, value);
        self.set_viewport_transform(vpt);
    }

    pub fn set_zoom(&mut self, value: f64) {
        self.zoom_to_point(Point::ORIGIN, value);
    }

    pub fn absolute_pan(&mut self, point: Point) {
        let vpt = self.camera.panned_to(point);
        self.set_viewport_transform(vpt);
    }

    pub fn relative_pan(&mut self, delta: Point) {
        let vpt = self.camera.panned_by(delta);
        self.set_viewport_transform(vpt);
    }

    /// Scene point under the center of the viewport.
    #[must_use]
    pub fn vp_center(&self) -> Point {
        self.camera.center(self.options.width, self.options.height)
    }

    /// Visible scene rectangle as of the last viewport change.
    #[must_use]
    pub fn viewport_bounds(&self) -> ViewportBounds {
        self.bounds
    }

    fn calc_viewport_boundaries(&mut self) {
        self.bounds = self.camera.bounds(self.options.width, self.options.height);
    }

    // =============================================================
    // Rendering
    // =============================================================

    pub fn request_render_all(&mut self) {
        self.render_requested = true;
    }

    /// Frame callback: render once if anything requested it.
    pub fn on_animation_frame(&mut self) -> Result<bool, RenderError> {
        if !self.render_requested {
            return Ok(false);
        }
        self.render_all()?;
        Ok(true)
    }

    /// Paint order for this frame: active objects last unless stacking is
    /// preserved.
    fn objects_to_render(&self) -> Vec<ObjectId> {
        let actives = self.active_objects();
        if actives.is_empty() || self.options.preserve_object_stacking {
            return self.order.clone();
        }
        let (mut rest, on_top): (Vec<ObjectId>, Vec<ObjectId>) =
            self.order.iter().copied().partition(|o| !actives.contains(o));
        rest.extend(on_top);
        rest
    }

    /// Redraw the lower surface: background, objects, controls, overlay.
    pub fn render_all(&mut self) -> Result<(), RenderError> {
        self.render_requested = false;
        self.calc_viewport_boundaries();
        let objects = self.objects_to_render();
        let vpt = self.camera.transform();
        let retina = self.options.retina_scaling();
        let (width, height) = (self.options.width, self.options.height);
        let env = RenderEnv {
            factory: self.factory.as_ref(),
            vpt,
            retina,
            cache: self.options.cache,
            visible_area: self.options.skip_offscreen.then_some((self.bounds.tl, self.bounds.br)),
            scaling: self.scaling,
        };
        let draw_controls = self.options.interactive;

        let ctx = self.lower.context();
        ctx.save();
        if retina != 1.0 {
            ctx.scale(retina, retina);
        }
        ctx.clear_rect(0.0, 0.0, width, height);
        self.events.fire(&SceneEvent::BeforeRender);
        fill_viewport(ctx, self.options.background_color.as_deref(), width, height);

        ctx.save();
        ctx.transform(&vpt);
        let mut result = Ok(());
        for id in &objects {
            result = render_entity(&mut self.store, id, ctx, &env, false);
            if result.is_err() {
                break;
            }
        }
        ctx.restore();

        if result.is_ok() {
            let active = self.active.filter(|_| draw_controls);
            if let (Some(active), false) = (active, self.options.controls_above_overlay) {
                render_controls(&self.store, &active, ctx, &vpt);
            }
            fill_viewport(ctx, self.options.overlay_color.as_deref(), width, height);
            if let (Some(active), true) = (active, self.options.controls_above_overlay) {
                render_controls(&self.store, &active, ctx, &vpt);
            }
        }
        ctx.restore();
        result?;
        self.renders += 1;
        trace!(objects = objects.len(), renders = self.renders, "scene rendered");
        self.events.fire(&SceneEvent::AfterRender);
        Ok(())
    }

    /// Redraw the upper surface with the marquee, if one is being dragged.
    pub fn render_top(&mut self, marquee: Option<&Marquee>) {
        let retina = self.options.retina_scaling();
        let ctx = self.upper.context();
        ctx.save();
        if retina != 1.0 {
            ctx.scale(retina, retina);
        }
        ctx.clear_rect(0.0, 0.0, self.options.width, self.options.height);
        if let Some(marquee) = marquee.filter(|_| self.options.selection) {
            draw_selection(ctx, marquee, &self.options);
        }
        ctx.restore();
        self.events.fire(&SceneEvent::AfterRender);
    }
}

/// `Math.round` semantics: halves round towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Nearest right angle, rounding down at exact half steps for positive angles.
#[must_use]
pub fn straighten_angle(angle: f64) -> f64 {
    let angle = angle % 360.0;
    if angle > 0.0 { round_half_up((angle - 1.0) / 90.0) * 90.0 } else { round_half_up(angle / 90.0) * 90.0 }
}

fn fill_viewport(ctx: &mut dyn Context2d, color: Option<&str>, width: f64, height: f64) {
    let Some(color) = color else {
        return;
    };
    ctx.save();
    ctx.begin_path();
    ctx.move_to(0.0, 0.0);
    ctx.line_to(width, 0.0);
    ctx.line_to(width, height);
    ctx.line_to(0.0, height);
    ctx.close_path();
    ctx.set_fill_paint(&Paint::solid(color));
    ctx.fill(FillRule::Nonzero);
    ctx.restore();
}

/// Half a pixel, so one-pixel strokes land on pixel centers.
const STROKE_OFFSET: f64 = 0.5;

fn draw_selection(ctx: &mut dyn Context2d, marquee: &Marquee, options: &SceneOptions) {
    let Marquee { start, size } = *marquee;
    let (aleft, atop) = (size.x.abs(), size.y.abs());
    let shift_x = if size.x > 0.0 { 0.0 } else { aleft };
    let shift_y = if size.y > 0.0 { 0.0 } else { atop };
    if !options.selection_color.is_empty() {
        ctx.set_fill_paint(&Paint::solid(&options.selection_color));
        ctx.fill_rect(start.x - shift_x, start.y - shift_y, aleft, atop);
    }
    if options.selection_line_width == 0.0 || options.selection_border_color.is_empty() {
        return;
    }
    ctx.set_line_width(options.selection_line_width);
    ctx.set_stroke_paint(&Paint::solid(&options.selection_border_color));
    ctx.set_line_dash(&options.selection_dash_array);
    ctx.stroke_rect(start.x + STROKE_OFFSET - shift_x, start.y + STROKE_OFFSET - shift_y, aleft, atop);
}
