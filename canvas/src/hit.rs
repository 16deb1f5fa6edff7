//! Hit-testing: control handles, target search, shape-precise refinement,
//! and the cursors that follow from a hit.
//!
//! Every test runs in viewport pixels against the corners stored by
//! [`ObjectStore::set_coords`], so callers pass the raw pointer position.
//! Only the shape-precise refinement maps the pointer back into an entity's
//! local plane.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::config::SceneOptions;
use crate::coords::{Control, find_cross_points};
use crate::doc::{Entity, EntityKind, ObjectId, ObjectStore};
use crate::group::Container;
use crate::input::Modifiers;
use crate::matrix::{Matrix, invert, multiply, transform_point};
use crate::point::Point;
use crate::scene::Scene;
use crate::transform::Transformable;

/// Result of a target search: the top-level hit plus, for groups that
/// check sub-targets, the chain of members under the pointer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetSearch {
    pub target: Option<ObjectId>,
    pub sub_targets: Vec<ObjectId>,
}

/// The control of the active object `entity` under `pointer`, if any.
///
/// The rotate handle is tested first, so it wins where it overlaps a
/// corner on small objects.
#[must_use]
pub fn find_target_corner(entity: &Entity, pointer: Point, active: Option<ObjectId>) -> Option<Control> {
    if !entity.controls.has_controls || entity.group.is_some() || active != Some(entity.id) {
        return None;
    }
    let coords = entity.viewport_coords()?;
    Control::ALL.iter().rev().copied().find(|control| {
        if !entity.controls.is_visible(*control) {
            return false;
        }
        if *control == Control::Mtr && !entity.controls.has_rotating_point {
            return false;
        }
        if entity.behavior.locks.uni_scaling && control.is_side() {
            return false;
        }
        find_cross_points(pointer, &coords.get(*control).corner.lines()) % 2 == 1
    })
}

// =============================================================
// Target search
// =============================================================

impl Scene {
    /// Find the object under viewport `pointer`.
    ///
    /// The active object is preferred: a multi-selection under the pointer
    /// wins unless `skip_group`, a single active object wins on its handles
    /// and, unless stacking is preserved, on its body.
    #[must_use]
    pub fn find_target(&self, pointer: Point, skip_group: bool, modifiers: &Modifiers) -> TargetSearch {
        if self.options.skip_target_find {
            return TargetSearch::default();
        }
        let actives = self.active_objects();
        let active = self.active.and_then(|a| self.store.get(&a));
        let mut active_target = None;
        if let Some(active) = active {
            if actives.len() > 1 && !skip_group && self.check_target(active, pointer) {
                return TargetSearch { target: Some(active.id), sub_targets: Vec::new() };
            }
            if actives.len() == 1 {
                if find_target_corner(active, pointer, self.active).is_some() {
                    return TargetSearch { target: Some(active.id), sub_targets: Vec::new() };
                }
                let mut subs = Vec::new();
                if self.search_possible_targets(&[active.id], pointer, &mut subs) == Some(active.id) {
                    if !self.options.preserve_object_stacking {
                        return TargetSearch { target: Some(active.id), sub_targets: subs };
                    }
                    active_target = Some((active.id, subs));
                }
            }
        }
        let mut sub_targets = Vec::new();
        let mut target = self.search_possible_targets(&self.order, pointer, &mut sub_targets);
        if let Some((held, held_subs)) = active_target {
            if modifiers.is_held(self.options.alt_selection_key) && target.is_some_and(|t| t != held) {
                target = Some(held);
                sub_targets = held_subs;
            }
        }
        TargetSearch { target, sub_targets }
    }

    /// Top-most object of `objects` accepting `pointer`; groups that check
    /// sub-targets push the member hit as well.
    fn search_possible_targets(&self, objects: &[ObjectId], pointer: Point, subs: &mut Vec<ObjectId>) -> Option<ObjectId> {
        for id in objects.iter().rev() {
            let Some(entity) = self.store.get(id) else {
                continue;
            };
            if !self.check_target(entity, pointer) {
                continue;
            }
            if entity.kind.group().is_some_and(|g| g.sub_target_check) {
                if let Some(sub) = self.search_possible_targets(entity.members(), pointer, subs) {
                    subs.push(sub);
                }
            }
            return Some(*id);
        }
        None
    }

    fn check_target(&self, entity: &Entity, pointer: Point) -> bool {
        if !entity.visible || !entity.behavior.evented {
            return false;
        }
        let corner = find_target_corner(entity, pointer, self.active).is_some();
        if !entity.contains_point(pointer, false) && !corner {
            return false;
        }
        if corner || !(self.options.per_pixel_target_find || entity.behavior.per_pixel_target_find) {
            return true;
        }
        let vpt = self.camera.transform();
        shape_contains(&self.store, &entity.id, pointer, &vpt, self.options.target_find_tolerance)
    }
}

// =============================================================
// Shape-precise refinement
// =============================================================

/// Whether viewport `pointer` falls on the filled geometry of `id`,
/// widened by `tolerance` scene units.
#[must_use]
pub fn shape_contains(store: &ObjectStore, id: &ObjectId, pointer: Point, vpt: &Matrix, tolerance: f64) -> bool {
    let Some(entity) = store.get(id) else {
        return false;
    };
    if entity.is_group() {
        return entity.children().iter().any(|child| shape_contains(store, child, pointer, vpt, tolerance));
    }
    let m = multiply(vpt, &store.calc_transform_matrix(id), false);
    let local = transform_point(pointer, &invert(&m), false);
    let scaling = store.object_scaling(id);
    let scale = scaling.x.abs().max(scaling.y.abs()).max(f64::EPSILON);
    let tol = tolerance / scale;
    let half_stroke = if entity.style.has_stroke() { entity.style.stroke_width / 2.0 } else { 0.0 };
    let dims = entity.non_transformed_dimensions();
    match &entity.kind {
        EntityKind::Ellipse { rx, ry } => inside_ellipse(local, rx + half_stroke + tol, ry + half_stroke + tol),
        EntityKind::Circle { radius } => local.x.hypot(local.y) <= radius + half_stroke + tol,
        EntityKind::Triangle => {
            let (w, h) = (entity.geometry.width / 2.0, entity.geometry.height / 2.0);
            let points = [Point::new(-w, h), Point::new(0.0, -h), Point::new(w, h)];
            inside_or_near(local, &points, true, half_stroke + tol)
        }
        EntityKind::Polygon { points, path_offset, closed } => {
            let shifted: Vec<Point> = points.iter().map(|p| *p - *path_offset).collect();
            let filled = *closed || entity.style.has_fill();
            inside_or_near(local, &shifted, filled, half_stroke + tol)
        }
        EntityKind::Rect { .. } | EntityKind::Image(_) | EntityKind::Group(_) => {
            local.x.abs() <= dims.x / 2.0 + tol && local.y.abs() <= dims.y / 2.0 + tol
        }
    }
}

fn inside_ellipse(p: Point, rx: f64, ry: f64) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    (p.x / rx).powi(2) + (p.y / ry).powi(2) <= 1.0
}

/// Even-odd containment when `area`, else distance to the outline; either
/// way a point within `reach` of an edge counts.
fn inside_or_near(p: Point, points: &[Point], area: bool, reach: f64) -> bool {
    if points.is_empty() {
        return false;
    }
    let edges: Vec<(Point, Point)> = if area {
        points.iter().zip(points.iter().cycle().skip(1)).map(|(a, b)| (*a, *b)).collect()
    } else {
        points.windows(2).map(|w| (w[0], w[1])).collect()
    };
    if area && find_all_crossings(p, &edges) % 2 == 1 {
        return true;
    }
    edges.iter().any(|(a, b)| distance_to_segment(p, *a, *b) <= reach)
}

/// Like [`find_cross_points`], without the early exit, for concave outlines.
fn find_all_crossings(point: Point, lines: &[(Point, Point)]) -> usize {
    lines.iter().map(|line| find_cross_points(point, std::slice::from_ref(line))).sum()
}

fn distance_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return p.distance_from(a);
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / len_sq).clamp(0.0, 1.0);
    p.distance_from(a + ab * t)
}

// =============================================================
// Cursors
// =============================================================

const CURSOR_MAP: [&str; 8] =
    ["n-resize", "ne-resize", "e-resize", "se-resize", "s-resize", "sw-resize", "w-resize", "nw-resize"];

/// Position of each resize handle in [`CURSOR_MAP`] for an unrotated object.
fn cursor_offset(control: Control) -> Option<i64> {
    match control {
        Control::Mt => Some(0),
        Control::Tr => Some(1),
        Control::Mr => Some(2),
        Control::Br => Some(3),
        Control::Mb => Some(4),
        Control::Bl => Some(5),
        Control::Ml => Some(6),
        Control::Tl => Some(7),
        Control::Mtr => None,
    }
}

/// Uniform scaling from a corner is possible for this gesture.
#[must_use]
pub fn is_uniscale_possible(entity: &Entity, modifiers: &Modifiers, options: &SceneOptions) -> bool {
    (modifiers.is_held(options.uni_scale_key) || options.uni_scale_transform) && !entity.behavior.locks.uni_scaling
}

/// Whether dragging `control` would be blocked by a lock.
#[must_use]
pub fn action_is_disabled(control: Control, entity: &Entity, modifiers: &Modifiers, options: &SceneOptions) -> bool {
    let locks = &entity.behavior.locks;
    let alt = modifiers.is_held(options.alt_action_key);
    match control {
        Control::Mt | Control::Mb => {
            if alt {
                locks.skewing_x
            } else {
                locks.scaling_y
            }
        }
        Control::Ml | Control::Mr => {
            if alt {
                locks.skewing_y
            } else {
                locks.scaling_x
            }
        }
        Control::Mtr => locks.rotation,
        Control::Tl | Control::Tr | Control::Br | Control::Bl => {
            if is_uniscale_possible(entity, modifiers, options) {
                locks.scaling_x && locks.scaling_y
            } else {
                locks.scaling_x || locks.scaling_y
            }
        }
    }
}

/// Resize cursor for `control`, rotated with the object.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rotated_corner_cursor(control: Control, entity: &Entity, modifiers: &Modifiers, options: &SceneOptions) -> Option<&'static str> {
    let offset = cursor_offset(control)?;
    let mut n = ((entity.geometry.angle % 360.0) / 45.0 + 0.5).floor() as i64;
    if n < 0 {
        n += 8;
    }
    n += offset;
    if modifiers.is_held(options.alt_action_key) && offset % 2 == 0 {
        n += 2;
    }
    CURSOR_MAP.get(usize::try_from(n.rem_euclid(8)).unwrap_or_default()).copied()
}

/// Cursor shown over `control` of `entity`.
#[must_use]
pub fn corner_cursor(control: Control, entity: &Entity, modifiers: &Modifiers, options: &SceneOptions) -> String {
    if action_is_disabled(control, entity, modifiers, options) {
        return options.not_allowed_cursor.clone();
    }
    if let Some(cursor) = rotated_corner_cursor(control, entity, modifiers, options) {
        return cursor.to_owned();
    }
    if control == Control::Mtr && entity.controls.has_rotating_point {
        return options.rotation_cursor.clone();
    }
    options.default_cursor.clone()
}

impl Scene {
    /// Cursor for hovering viewport `pointer` over `target`.
    #[must_use]
    pub fn hover_cursor(&self, target: Option<ObjectId>, pointer: Point, modifiers: &Modifiers) -> String {
        let Some(entity) = target.and_then(|t| self.store.get(&t)) else {
            return self.options.default_cursor.clone();
        };
        let in_selection = self
            .active
            .and_then(|a| self.store.get(&a))
            .is_some_and(|a| a.is_active_selection() && a.includes(&entity.id));
        let corner = if in_selection { None } else { find_target_corner(entity, pointer, self.active) };
        match corner {
            Some(control) => corner_cursor(control, entity, modifiers, &self.options),
            None => entity.behavior.hover_cursor.clone().unwrap_or_else(|| self.options.hover_cursor.clone()),
        }
    }
}
