//! Groups and active selections: layout, membership changes, conversions.
//!
//! A group's `left`/`top`/`width`/`height` are derived from its members'
//! scene corners; members are then re-expressed relative to the group
//! center. Every membership change goes through the same cycle: restore the
//! members to scene coordinates, reset the group transform, change the
//! list, lay the group out again. That keeps a group's transform free of
//! accumulated drift no matter how often it is edited.

#[cfg(test)]
#[path = "group_test.rs"]
mod group_test;

use tracing::debug;

use crate::coords::calc_absolute_coords;
use crate::doc::{Entity, GroupRole, ObjectId, ObjectStore, Origin, Prop};
use crate::matrix::{Matrix, bounding_box_from_points};
use crate::point::Point;
use crate::transform::Transformable;

/// Ordered membership shared by groups and the scene.
pub trait Container {
    /// Members in paint order, back to front.
    fn members(&self) -> &[ObjectId];

    #[must_use]
    fn size(&self) -> usize {
        self.members().len()
    }

    #[must_use]
    fn item(&self, index: usize) -> Option<ObjectId> {
        self.members().get(index).copied()
    }

    #[must_use]
    fn includes(&self, id: &ObjectId) -> bool {
        self.members().contains(id)
    }
}

impl Container for Entity {
    fn members(&self) -> &[ObjectId] {
        self.children()
    }
}

// =============================================================
// Layout
// =============================================================

/// Size and place group `gid` around `children` (all in scene coordinates,
/// none attached), then attach them relative to the group center.
///
/// An empty group keeps its position and collapses to zero size.
fn layout(store: &mut ObjectStore, gid: &ObjectId, children: Vec<ObjectId>, vpt: &Matrix) {
    let points: Vec<Point> = children
        .iter()
        .filter_map(|id| calc_absolute_coords(store, id))
        .flat_map(|quad| [quad.tr, quad.br, quad.bl, quad.tl])
        .collect();
    if points.is_empty() {
        store.set_all(gid, [Prop::Width(0.0), Prop::Height(0.0)]);
    } else {
        let bbox = bounding_box_from_points(&points, None);
        store.set_all(gid, [Prop::Width(bbox.width), Prop::Height(bbox.height)]);
        store.set_position_by_origin(gid, bbox.top_left(), Origin::Start, Origin::Start);
    }

    let center = store.get(gid).map_or(Point::ORIGIN, |g| g.center_point());
    for child in &children {
        let Some(entity) = store.get_mut(child) else {
            continue;
        };
        let left = entity.geometry.left - center.x;
        let top = entity.geometry.top - center.y;
        entity.apply(Prop::Left(left));
        entity.apply(Prop::Top(top));
        entity.group = Some(*gid);
    }
    if let Some(data) = store.get_mut(gid).and_then(|g| g.kind.group_mut()) {
        data.children = children;
    }
    store.set_coords(gid, vpt);
    store.set(gid, Prop::Dirty(true));
}

/// Build a group of `role` around top-level `members` and return its id.
///
/// Members keep their scene appearance; the caller owns scene ordering.
pub fn create_group(store: &mut ObjectStore, members: &[ObjectId], role: GroupRole, vpt: &Matrix) -> ObjectId {
    let gid = store.insert(Entity::group_shell(role));
    let members: Vec<ObjectId> = members.iter().copied().filter(|id| store.contains(id)).collect();
    debug!(%gid, members = members.len(), ?role, "group created");
    layout(store, &gid, members, vpt);
    gid
}

/// Detach one member, baking the group chain into its own fields.
pub fn restore_object(store: &mut ObjectStore, id: &ObjectId, vpt: &Matrix) {
    store.realize_transform(id);
    if let Some(entity) = store.get_mut(id) {
        entity.group = None;
    }
    store.set_coords(id, vpt);
}

/// Detach every member of `gid`, leaving the child list unchanged.
fn restore_objects(store: &mut ObjectStore, gid: &ObjectId, vpt: &Matrix) -> Vec<ObjectId> {
    let children = store.children(gid);
    for child in &children {
        restore_object(store, child, vpt);
    }
    children
}

/// Identity scale, skew and flip; angle zero about the center when the
/// group rotates about its center.
fn reset_transform(store: &mut ObjectStore, gid: &ObjectId) {
    store.set_all(
        gid,
        [
            Prop::ScaleX(1.0),
            Prop::ScaleY(1.0),
            Prop::SkewX(0.0),
            Prop::SkewY(0.0),
            Prop::FlipX(false),
            Prop::FlipY(false),
        ],
    );
    store.rotate(gid, 0.0);
}

pub fn add_with_update(store: &mut ObjectStore, gid: &ObjectId, id: &ObjectId, vpt: &Matrix) {
    let mut children = restore_objects(store, gid, vpt);
    reset_transform(store, gid);
    if store.contains(id) && !children.contains(id) {
        children.push(*id);
    }
    layout(store, gid, children, vpt);
}

pub fn remove_with_update(store: &mut ObjectStore, gid: &ObjectId, id: &ObjectId, vpt: &Matrix) {
    let mut children = restore_objects(store, gid, vpt);
    reset_transform(store, gid);
    children.retain(|c| c != id);
    layout(store, gid, children, vpt);
}

/// Dissolve `gid`: members return to scene coordinates and the group is
/// left empty. Returns the former members in paint order.
pub fn destroy(store: &mut ObjectStore, gid: &ObjectId, vpt: &Matrix) -> Vec<ObjectId> {
    for child in store.children(gid) {
        store.set(&child, Prop::Dirty(true));
    }
    let children = restore_objects(store, gid, vpt);
    if let Some(data) = store.get_mut(gid).and_then(|g| g.kind.group_mut()) {
        data.children.clear();
    }
    children
}

/// Move the members of `from` into a fresh container of `role` with the
/// same transform and styling, then drop `from` from the store.
///
/// Members keep their group-relative fields, so nothing visibly moves.
pub fn convert(store: &mut ObjectStore, from: &ObjectId, role: GroupRole, vpt: &Matrix) -> Option<ObjectId> {
    let source = store.get_mut(from)?;
    let children = std::mem::take(&mut source.kind.group_mut()?.children);
    let mut shell = Entity::group_shell(role);
    shell.geometry = source.geometry.clone();
    shell.style = source.style.clone();
    shell.opacity = source.opacity;
    shell.visible = source.visible;
    shell.controls = source.controls.clone();
    shell.behavior = source.behavior.clone();
    shell.caching = source.caching;
    if let Some(data) = shell.kind.group_mut() {
        data.children.clone_from(&children);
    }
    let gid = store.insert(shell);
    store.remove(from);
    for child in &children {
        if let Some(entity) = store.get_mut(child) {
            entity.group = Some(gid);
            entity.dirty = true;
        }
    }
    store.set_coords(&gid, vpt);
    debug!(%gid, %from, ?role, members = children.len(), "group converted");
    Some(gid)
}

impl ObjectStore {
    /// Set `angle`, keeping the center fixed when `centered_rotation` is on.
    pub fn rotate(&mut self, id: &ObjectId, angle: f64) {
        let Some(entity) = self.get(id) else {
            return;
        };
        let g = &entity.geometry;
        let centered = entity.behavior.centered_rotation && (g.origin_x != Origin::Center || g.origin_y != Origin::Center);
        let center = entity.center_point();
        self.set(id, Prop::Angle(angle));
        if centered {
            self.set_position_by_origin(id, center, Origin::Center, Origin::Center);
        }
    }
}
