//! Transform gestures: session setup, and the drag, rotate, scale and skew
//! updates applied on every pointer move.
//!
//! All math runs in the scene plane. Each update recomputes the target's
//! fields from the pointer and the session's anchor, then moves the target
//! so the anchor point stays where it was: scaling from a corner keeps the
//! opposite corner fixed, rotating keeps the anchor fixed, and so on.
//!
//! The anchor can change mid-gesture. Holding the centered key (or the
//! scene's centered options) moves it to the center, scaling through zero
//! swaps it to the opposite edge, and skewing re-anchors the edge that keeps
//! the drag direction intuitive.

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

use tracing::debug;

use crate::config::SceneOptions;
use crate::coords::Control;
use crate::doc::{Entity, Geometry, ObjectId, ObjectStore, Origin, Prop};
use crate::events::SceneEvent;
use crate::hit::{find_target_corner, is_uniscale_possible};
use crate::input::{Modifiers, ScaleMode, TransformAction, TransformSession};
use crate::point::Point;
use crate::scene::Scene;
use crate::transform::Transformable;

/// Which axis a scale update is limited to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScaleBy {
    Free,
    Equally,
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

/// Action implied by grabbing `corner`.
///
/// Grabbing an object that was not already selected always drags it.
#[must_use]
pub fn action_from_corner(
    already_selected: bool,
    corner: Option<Control>,
    modifiers: &Modifiers,
    options: &SceneOptions,
) -> TransformAction {
    let Some(corner) = corner.filter(|_| already_selected) else {
        return TransformAction::Drag;
    };
    let alt = modifiers.is_held(options.alt_action_key);
    match corner {
        Control::Mtr => TransformAction::Rotate,
        Control::Ml | Control::Mr => {
            if alt {
                TransformAction::SkewY
            } else {
                TransformAction::ScaleX
            }
        }
        Control::Mt | Control::Mb => {
            if alt {
                TransformAction::SkewX
            } else {
                TransformAction::ScaleY
            }
        }
        Control::Tl | Control::Tr | Control::Br | Control::Bl => TransformAction::Scale,
    }
}

/// Anchor opposite to `corner`; the entity's own origin on axes the
/// corner does not touch.
#[must_use]
pub fn origin_from_corner(entity: &Entity, corner: Option<Control>) -> (Origin, Origin) {
    let mut origin = (entity.geometry.origin_x, entity.geometry.origin_y);
    match corner {
        Some(Control::Ml | Control::Tl | Control::Bl) => origin.0 = Origin::End,
        Some(Control::Mr | Control::Tr | Control::Br) => origin.0 = Origin::Start,
        _ => {}
    }
    match corner {
        Some(Control::Tl | Control::Mt | Control::Tr) => origin.1 = Origin::End,
        Some(Control::Bl | Control::Mb | Control::Br) => origin.1 = Origin::Start,
        _ => {}
    }
    origin
}

/// Write every field of `geometry` back onto `id`.
pub fn restore_geometry(store: &mut ObjectStore, id: &ObjectId, geometry: &Geometry) {
    store.set_all(
        id,
        [
            Prop::FlipX(geometry.flip_x),
            Prop::FlipY(geometry.flip_y),
            Prop::ScaleX(geometry.scale_x),
            Prop::ScaleY(geometry.scale_y),
            Prop::SkewX(geometry.skew_x),
            Prop::SkewY(geometry.skew_y),
            Prop::Angle(geometry.angle),
            Prop::OriginX(geometry.origin_x),
            Prop::OriginY(geometry.origin_y),
            Prop::Width(geometry.width),
            Prop::Height(geometry.height),
            Prop::Left(geometry.left),
            Prop::Top(geometry.top),
        ],
    );
}

fn sign(value: f64) -> f64 {
    if value < 0.0 { -1.0 } else { 1.0 }
}

impl Scene {
    /// Start a transform of `target` from viewport `pointer`.
    ///
    /// Fires `before:transform`. Returns `None` for unknown targets.
    pub fn setup_current_transform(
        &mut self,
        target: &ObjectId,
        pointer: Point,
        already_selected: bool,
        modifiers: &Modifiers,
    ) -> Option<TransformSession> {
        let entity = self.store.get(target)?;
        let scene_pointer = self.camera.screen_to_scene(pointer);
        let corner = find_target_corner(entity, pointer, self.active);
        let action = action_from_corner(already_selected, corner, modifiers, &self.options);
        let origin = origin_from_corner(entity, corner);
        let g = &entity.geometry;
        let mut session = TransformSession {
            target: *target,
            action,
            corner,
            original: g.clone(),
            original_origin: origin,
            origin_x: origin.0,
            origin_y: origin.1,
            offset: Point::new(scene_pointer.x - g.left, scene_pointer.y - g.top),
            start: scene_pointer,
            last: scene_pointer,
            theta: g.angle.to_radians(),
            mouse_x_sign: 1.0,
            mouse_y_sign: 1.0,
            centered_key: modifiers.is_held(self.options.centered_key),
            reset: false,
            scale_mode: None,
            new_scale: Point::new(g.scale_x, g.scale_y),
            skew_sign: 1.0,
            action_performed: false,
        };
        self.reset_current_transform(&mut session);
        self.scaling = action.is_scale().then_some(*target);
        debug!(%target, ?action, corner = corner.map(Control::name), "transform started");
        self.events.fire(&SceneEvent::BeforeTransform { target: *target, action });
        Some(session)
    }

    /// Restore scale and skew from the snapshot and re-derive the anchor.
    pub(crate) fn reset_current_transform(&mut self, t: &mut TransformSession) {
        self.store.set_all(
            &t.target,
            [
                Prop::ScaleX(t.original.scale_x),
                Prop::ScaleY(t.original.scale_y),
                Prop::SkewX(t.original.skew_x),
                Prop::SkewY(t.original.skew_y),
            ],
        );
        if self.should_center_transform(t) {
            if t.origin_x != Origin::Center {
                t.mouse_x_sign = if t.origin_x == Origin::End { -1.0 } else { 1.0 };
            }
            if t.origin_y != Origin::Center {
                t.mouse_y_sign = if t.origin_y == Origin::End { -1.0 } else { 1.0 };
            }
            t.origin_x = Origin::Center;
            t.origin_y = Origin::Center;
        } else {
            (t.origin_x, t.origin_y) = t.original_origin;
        }
    }

    fn should_center_transform(&self, t: &TransformSession) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let centered = if t.action.is_scale() {
            self.options.centered_scaling || entity.behavior.centered_scaling
        } else if t.action == TransformAction::Rotate {
            self.options.centered_rotation || entity.behavior.centered_rotation
        } else {
            false
        };
        centered != t.centered_key
    }

    /// Apply one pointer move to the session's target. Returns whether the
    /// target changed.
    pub fn transform_object(&mut self, t: &mut TransformSession, pointer: Point, modifiers: &Modifiers) -> bool {
        let p = self.camera.screen_to_scene(pointer);
        t.reset = false;
        t.centered_key = modifiers.is_held(self.options.centered_key);
        if let Some(entity) = self.store.get_mut(&t.target) {
            entity.is_moving = true;
        }
        self.before_scale_transform(t);
        let performed = match t.action {
            TransformAction::Rotate => self.rotate_object(t, p),
            TransformAction::Scale => self.on_scale(t, p, modifiers),
            TransformAction::ScaleX => self.scale_object(t, p, ScaleBy::X),
            TransformAction::ScaleY => self.scale_object(t, p, ScaleBy::Y),
            TransformAction::SkewX => self.skew_object(t, p, Axis::X),
            TransformAction::SkewY => self.skew_object(t, p, Axis::Y),
            TransformAction::Drag => self.translate_object(t, p),
        };
        if performed {
            self.events.fire(&SceneEvent::Transforming { target: t.target, action: t.action });
            self.set_coords(&t.target);
            self.request_render_all();
        }
        t.action_performed |= performed;
        performed
    }

    /// Move the anchor to or from the center when the centered key toggled.
    fn before_scale_transform(&mut self, t: &mut TransformSession) {
        if !t.action.is_scale() {
            return;
        }
        let centered = self.should_center_transform(t);
        let at_center = t.origin_x == Origin::Center && t.origin_y == Origin::Center;
        if centered != at_center {
            self.reset_current_transform(t);
            t.reset = true;
        }
    }

    /// End the gesture: refresh corners and fire the completion events if
    /// anything changed.
    pub fn finalize_transform(&mut self, t: &TransformSession) {
        self.set_coords(&t.target);
        if let Some(entity) = self.store.get_mut(&t.target) {
            entity.is_moving = false;
        }
        self.scaling = None;
        debug!(target = %t.target, action = ?t.action, performed = t.action_performed, "transform finished");
        if t.action_performed {
            self.events.fire(&SceneEvent::Transformed { target: t.target, action: t.action });
            self.events.fire(&SceneEvent::Modified { target: t.target, action: Some(t.action) });
        }
    }

    /// Abort the gesture, putting the target back as it was at the start.
    pub fn cancel_transform(&mut self, t: &TransformSession) {
        restore_geometry(&mut self.store, &t.target, &t.original);
        if let Some(entity) = self.store.get_mut(&t.target) {
            entity.is_moving = false;
        }
        self.scaling = None;
        self.set_coords(&t.target);
        self.request_render_all();
        debug!(target = %t.target, action = ?t.action, "transform cancelled");
    }

    // =============================================================
    // Drag
    // =============================================================

    fn translate_object(&mut self, t: &TransformSession, p: Point) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let locks = entity.behavior.locks;
        let new_left = p.x - t.offset.x;
        let new_top = p.y - t.offset.y;
        let move_x = !locks.movement_x && entity.geometry.left != new_left;
        let move_y = !locks.movement_y && entity.geometry.top != new_top;
        if move_x {
            self.store.set(&t.target, Prop::Left(new_left));
        }
        if move_y {
            self.store.set(&t.target, Prop::Top(new_top));
        }
        move_x || move_y
    }

    // =============================================================
    // Rotate
    // =============================================================

    fn rotate_object(&mut self, t: &TransformSession, p: Point) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        if entity.behavior.locks.rotation {
            return false;
        }
        let anchor = entity.translate_to_origin_point(entity.center_point(), t.origin_x, t.origin_y);
        let last_angle = (t.start - anchor).angle();
        let cur_angle = (p - anchor).angle();
        let mut angle = (cur_angle - last_angle + t.theta).to_degrees();

        let snap = entity.behavior.snap_angle;
        if snap > 0.0 {
            let threshold = entity.behavior.snap_threshold.filter(|t| *t != 0.0).unwrap_or(snap);
            let right = (angle / snap).ceil() * snap;
            let left = (angle / snap).floor() * snap;
            if (angle - left).abs() < threshold {
                angle = left;
            } else if (angle - right).abs() < threshold {
                angle = right;
            }
        }
        if angle < 0.0 {
            angle += 360.0;
        }
        angle %= 360.0;

        if entity.geometry.angle == angle {
            return false;
        }
        self.store.set(&t.target, Prop::Angle(angle));
        self.store.set_position_by_origin(&t.target, anchor, t.origin_x, t.origin_y);
        true
    }

    // =============================================================
    // Scale
    // =============================================================

    fn on_scale(&mut self, t: &mut TransformSession, p: Point, modifiers: &Modifiers) -> bool {
        let uniscale = self
            .store
            .get(&t.target)
            .is_some_and(|e| is_uniscale_possible(e, modifiers, &self.options));
        if uniscale {
            t.scale_mode = Some(ScaleMode::Free);
            return self.scale_object(t, p, ScaleBy::Free);
        }
        if !t.reset && t.scale_mode == Some(ScaleMode::Free) {
            self.reset_current_transform(t);
        }
        t.scale_mode = Some(ScaleMode::Equally);
        self.scale_object(t, p, ScaleBy::Equally)
    }

    fn scale_object(&mut self, t: &mut TransformSession, p: Point, by: ScaleBy) -> bool {
        let zoom = self.camera.zoom();
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let locks = entity.behavior.locks;
        if locks.scaling_x && locks.scaling_y {
            return false;
        }
        let constraint = entity.translate_to_origin_point(entity.center_point(), t.origin_x, t.origin_y);
        let mut local = entity.to_local_point(p, Some((t.origin_x, t.origin_y)));
        let dim = entity.transformed_dimensions();
        let padding = entity.controls.padding / zoom;
        set_local_mouse(&mut local, t, padding);
        let scaled = self.set_object_scale(t, local, by, dim);
        self.store.set_position_by_origin(&t.target, constraint, t.origin_x, t.origin_y);
        scaled
    }

    fn set_object_scale(&mut self, t: &mut TransformSession, mut local: Point, by: ScaleBy, dim: Point) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let locks = entity.behavior.locks;
        let (cur_x, cur_y) = (entity.geometry.scale_x, entity.geometry.scale_y);
        // a collapsed axis has no size to scale against
        let scale_x = if dim.x == 0.0 { cur_x } else { local.x * cur_x / dim.x };
        let scale_y = if dim.y == 0.0 { cur_y } else { local.y * cur_y / dim.y };
        let change_x = cur_x != scale_x;
        let change_y = cur_y != scale_y;
        t.new_scale = Point::new(scale_x, scale_y);

        let mut forbid_x = false;
        let mut forbid_y = false;
        if locks.scaling_flip && scale_x <= 0.0 && scale_x < cur_x {
            forbid_x = true;
            local.x = 0.0;
        }
        if locks.scaling_flip && scale_y <= 0.0 && scale_y < cur_y {
            forbid_y = true;
            local.y = 0.0;
        }

        let set_x = !forbid_x && !locks.scaling_x;
        let set_y = !forbid_y && !locks.scaling_y;
        let mut scaled = false;
        match by {
            ScaleBy::Equally if !locks.scaling_x && !locks.scaling_y => {
                scaled = self.scale_object_equally(t, local, dim);
            }
            ScaleBy::Equally => {}
            ScaleBy::Free => {
                if set_x {
                    self.store.set(&t.target, Prop::ScaleX(scale_x));
                    scaled |= change_x;
                }
                if set_y {
                    self.store.set(&t.target, Prop::ScaleY(scale_y));
                    scaled |= change_y;
                }
            }
            ScaleBy::X if !locks.uni_scaling => {
                if set_x {
                    self.store.set(&t.target, Prop::ScaleX(scale_x));
                    scaled = change_x;
                }
            }
            ScaleBy::Y if !locks.uni_scaling => {
                if set_y {
                    self.store.set(&t.target, Prop::ScaleY(scale_y));
                    scaled = change_y;
                }
            }
            ScaleBy::X | ScaleBy::Y => {}
        }
        if !forbid_x && !forbid_y {
            flip_object(t, by);
        }
        scaled
    }

    /// One ratio for both axes from the combined diagonal offset.
    fn scale_object_equally(&mut self, t: &TransformSession, local: Point, dim: Point) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let (cur_x, cur_y) = (entity.geometry.scale_x, entity.geometry.scale_y);
        let dist = local.y + local.x;
        let last_dist = dim.y * t.original.scale_y / cur_y + dim.x * t.original.scale_x / cur_x;
        if last_dist == 0.0 || !last_dist.is_finite() {
            return false;
        }
        let new_x = sign(local.x) * (t.original.scale_x * dist / last_dist).abs();
        let new_y = sign(local.y) * (t.original.scale_y * dist / last_dist).abs();
        let scaled = new_x != cur_x || new_y != cur_y;
        self.store.set_all(&t.target, [Prop::ScaleX(new_x), Prop::ScaleY(new_y)]);
        scaled
    }

    // =============================================================
    // Skew
    // =============================================================

    fn skew_object(&mut self, t: &mut TransformSession, p: Point, by: Axis) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let locks = entity.behavior.locks;
        if (by == Axis::X && locks.skewing_x) || (by == Axis::Y && locks.skewing_y) {
            return false;
        }
        let center = entity.center_point();
        let centered = Some((Origin::Center, Origin::Center));
        let actual = axis(entity.to_local_point(p, centered), by);
        let last = axis(entity.to_local_point(t.last, centered), by);
        let dim = entity.transformed_dimensions();
        change_skew_transform_origin(actual - last, t, entity, by);

        let local = axis(entity.to_local_point(p, Some((t.origin_x, t.origin_y))), by);
        let constraint = entity.translate_to_origin_point(center, t.origin_x, t.origin_y);
        let skewed = self.set_object_skew(t, local, by, dim);
        t.last = p;
        self.store.set_position_by_origin(&t.target, constraint, t.origin_x, t.origin_y);
        skewed
    }

    fn set_object_skew(&mut self, t: &TransformSession, local: f64, by: Axis, dim: Point) -> bool {
        let Some(entity) = self.store.get(&t.target) else {
            return false;
        };
        let g = &entity.geometry;
        let (dim_no_skew, scale_by, scale_other, current, other_skew) = match by {
            Axis::X => (entity.transformed_dimensions_with_skew(0.0, g.skew_y), g.scale_x, g.scale_y, g.skew_x, g.skew_y),
            Axis::Y => (entity.transformed_dimensions_with_skew(g.skew_x, 0.0), g.scale_y, g.scale_x, g.skew_y, g.skew_x),
        };
        let other = match by {
            Axis::X => Axis::Y,
            Axis::Y => Axis::X,
        };
        let new_dim_mouse = 2.0 * local.abs() - axis(dim_no_skew, by);
        let value = if new_dim_mouse <= 2.0 {
            0.0
        } else {
            (t.skew_sign * ((new_dim_mouse / scale_by) / (axis(dim_no_skew, other) / scale_other)).atan()).to_degrees()
        };
        let skewed = current != value;
        let (skew_prop, scale_prop): (fn(f64) -> Prop, fn(f64) -> Prop) = match by {
            Axis::X => (Prop::SkewX, Prop::ScaleY),
            Axis::Y => (Prop::SkewY, Prop::ScaleX),
        };
        self.store.set(&t.target, skew_prop(value));
        if other_skew != 0.0 {
            if let Some(entity) = self.store.get(&t.target) {
                let new_dim = entity.transformed_dimensions();
                let compensated = axis(dim, other) / axis(new_dim, other) * scale_other;
                self.store.set(&t.target, scale_prop(compensated));
            }
        }
        skewed
    }
}

fn axis(p: Point, by: Axis) -> f64 {
    match by {
        Axis::X => p.x,
        Axis::Y => p.y,
    }
}

/// Normalize the local pointer against the anchor: mirrored for an end
/// anchor, doubled around a center anchor, and shrunk by the padding.
fn set_local_mouse(local: &mut Point, t: &mut TransformSession, padding: f64) {
    match t.origin_x {
        Origin::End => local.x *= -1.0,
        Origin::Center => {
            local.x *= t.mouse_x_sign * 2.0;
            if local.x < 0.0 {
                t.mouse_x_sign = -t.mouse_x_sign;
            }
        }
        Origin::Start | Origin::Fraction(_) => {}
    }
    match t.origin_y {
        Origin::End => local.y *= -1.0,
        Origin::Center => {
            local.y *= t.mouse_y_sign * 2.0;
            if local.y < 0.0 {
                t.mouse_y_sign = -t.mouse_y_sign;
            }
        }
        Origin::Start | Origin::Fraction(_) => {}
    }
    local.x = shrink_by_padding(local.x, padding);
    local.y = shrink_by_padding(local.y, padding);
}

fn shrink_by_padding(value: f64, padding: f64) -> f64 {
    if value.abs() > padding {
        if value < 0.0 { value + padding } else { value - padding }
    } else {
        0.0
    }
}

/// Scaling through zero swaps the anchor to the opposite edge.
fn flip_object(t: &mut TransformSession, by: ScaleBy) {
    if t.new_scale.x < 0.0 && by != ScaleBy::Y {
        t.origin_x = t.origin_x.opposite();
    }
    if t.new_scale.y < 0.0 && by != ScaleBy::X {
        t.origin_y = t.origin_y.opposite();
    }
}

/// Pick the skew anchor so the dragged edge follows the pointer.
fn change_skew_transform_origin(mouse_move: f64, t: &mut TransformSession, entity: &Entity, by: Axis) {
    let skew = match by {
        Axis::X => entity.geometry.skew_x,
        Axis::Y => entity.geometry.skew_y,
    };
    let corner = if matches!(t.corner, Some(Control::Mt | Control::Ml)) { 1.0 } else { -1.0 };
    let mouse_move = if mouse_move > 0.0 { 1.0 } else { -1.0 };
    let mut flip_sign = 1.0;
    if entity.geometry.flip_x {
        flip_sign *= -1.0;
    }
    if entity.geometry.flip_y {
        flip_sign *= -1.0;
    }
    let origin_for = |s: f64| if s < 0.0 { Origin::Start } else { Origin::End };
    let origin = if skew == 0.0 {
        t.skew_sign = -corner * mouse_move * flip_sign;
        origin_for(-mouse_move)
    } else {
        t.skew_sign = sign(skew);
        origin_for(t.skew_sign * corner * flip_sign)
    };
    match by {
        Axis::X => t.origin_x = origin,
        Axis::Y => t.origin_y = origin,
    }
}
