#![allow(clippy::float_cmp)]

use super::*;

const VPT: Matrix = Matrix::IDENTITY;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn bare(width: f64, height: f64, left: f64, top: f64) -> Entity {
    Entity::rect(width, height).at(left, top).with_stroke(None, 0.0)
}

/// Two 10x10 squares at x = 0 and x = 30, grouped.
fn pair(role: GroupRole) -> (ObjectStore, ObjectId, ObjectId, ObjectId) {
    let mut store = ObjectStore::new();
    let a = store.insert(bare(10.0, 10.0, 0.0, 0.0));
    let b = store.insert(bare(10.0, 10.0, 30.0, 0.0));
    let gid = create_group(&mut store, &[a, b], role, &VPT);
    (store, gid, a, b)
}

// =============================================================
// Layout
// =============================================================

#[test]
fn group_wraps_member_bounds() {
    let (store, gid, a, b) = pair(GroupRole::Group);
    let group = store.get(&gid).unwrap();
    assert_eq!((group.geometry.width, group.geometry.height), (40.0, 10.0));
    assert_eq!((group.geometry.left, group.geometry.top), (0.0, 0.0));
    assert_eq!(group.center_point(), Point::new(20.0, 5.0));
    assert_eq!(group.children(), &[a, b]);
    assert!(group.dirty);
}

#[test]
fn members_are_relative_to_group_center() {
    let (store, gid, a, b) = pair(GroupRole::Group);
    let a = store.get(&a).unwrap();
    let b = store.get(&b).unwrap();
    assert_eq!((a.geometry.left, a.geometry.top), (-20.0, -5.0));
    assert_eq!((b.geometry.left, b.geometry.top), (10.0, -5.0));
    assert_eq!(a.group, Some(gid));
    assert_eq!(b.group, Some(gid));
}

#[test]
fn container_queries() {
    let (store, gid, a, b) = pair(GroupRole::Group);
    let group = store.get(&gid).unwrap();
    assert_eq!(group.size(), 2);
    assert_eq!(group.item(1), Some(b));
    assert_eq!(group.item(2), None);
    assert!(group.includes(&a));
    assert!(!group.includes(&gid));
}

#[test]
fn empty_group_collapses() {
    let mut store = ObjectStore::new();
    let gid = create_group(&mut store, &[], GroupRole::Group, &VPT);
    let group = store.get(&gid).unwrap();
    assert_eq!((group.geometry.width, group.geometry.height), (0.0, 0.0));
    assert_eq!(group.size(), 0);
}

#[test]
fn unknown_members_are_ignored() {
    let mut store = ObjectStore::new();
    let a = store.insert(bare(10.0, 10.0, 0.0, 0.0));
    let gid = create_group(&mut store, &[a, uuid::Uuid::new_v4()], GroupRole::Group, &VPT);
    assert_eq!(store.get(&gid).unwrap().children(), &[a]);
}

// =============================================================
// Membership changes
// =============================================================

#[test]
fn add_with_update_grows_the_group() {
    let (mut store, gid, a, b) = pair(GroupRole::ActiveSelection);
    let c = store.insert(bare(10.0, 20.0, 0.0, 40.0));
    add_with_update(&mut store, &gid, &c, &VPT);
    let group = store.get(&gid).unwrap();
    assert_eq!(group.children(), &[a, b, c]);
    assert_eq!((group.geometry.width, group.geometry.height), (40.0, 60.0));
    assert_eq!(store.get(&c).unwrap().group, Some(gid));
}

#[test]
fn remove_with_update_shrinks_and_detaches() {
    let (mut store, gid, a, b) = pair(GroupRole::ActiveSelection);
    remove_with_update(&mut store, &gid, &b, &VPT);
    let group = store.get(&gid).unwrap();
    assert_eq!(group.children(), &[a]);
    assert_eq!(group.geometry.width, 10.0);
    let b = store.get(&b).unwrap();
    assert_eq!(b.group, None);
    assert_eq!((b.geometry.left, b.geometry.top), (30.0, 0.0));
}

#[test]
fn membership_change_resets_group_transform() {
    let (mut store, gid, a, b) = pair(GroupRole::ActiveSelection);
    store.set_all(&gid, [Prop::ScaleX(2.0), Prop::ScaleY(2.0)]);
    remove_with_update(&mut store, &gid, &a, &VPT);
    let group = store.get(&gid).unwrap();
    assert_eq!((group.geometry.scale_x, group.geometry.scale_y), (1.0, 1.0));
    let b = store.get(&b).unwrap();
    assert_eq!(b.geometry.scale_x, 2.0);
    assert_eq!(group.geometry.width, 20.0);
}

// =============================================================
// Dissolving and converting
// =============================================================

#[test]
fn destroy_bakes_group_transform_into_members() {
    let (mut store, gid, a, b) = pair(GroupRole::Group);
    store.set_all(&gid, [Prop::ScaleX(2.0), Prop::ScaleY(2.0)]);
    let members = destroy(&mut store, &gid, &VPT);
    assert_eq!(members, vec![a, b]);
    assert!(store.get(&gid).unwrap().children().is_empty());

    let b = store.get(&b).unwrap();
    assert_eq!(b.group, None);
    assert!(close(b.geometry.left, 60.0));
    assert!(close(b.geometry.top, 0.0));
    assert!(close(b.geometry.scale_x, 2.0));
    assert!(b.dirty);
}

#[test]
fn restore_from_rotated_group_keeps_scene_angle() {
    let (mut store, gid, _, b) = pair(GroupRole::Group);
    store.rotate(&gid, 90.0);
    restore_object(&mut store, &b, &VPT);
    let b = store.get(&b).unwrap();
    assert!(close(b.geometry.angle, 90.0));
    // group center (20, 5); b's center was 15 to the right, now 15 below
    assert!(close(b.center_point().x, 20.0));
    assert!(close(b.center_point().y, 20.0));
}

#[test]
fn convert_moves_members_to_new_container() {
    let (mut store, gid, a, b) = pair(GroupRole::ActiveSelection);
    store.set(&gid, Prop::Opacity(0.5));
    let new_id = convert(&mut store, &gid, GroupRole::Group, &VPT).unwrap();
    assert!(!store.contains(&gid));
    let group = store.get(&new_id).unwrap();
    assert!(!group.is_active_selection());
    assert_eq!(group.opacity, 0.5);
    assert_eq!(group.children(), &[a, b]);
    assert_eq!(store.get(&a).unwrap().group, Some(new_id));
    assert_eq!(store.get(&a).unwrap().geometry.left, -20.0);
}

#[test]
fn convert_rejects_non_groups() {
    let mut store = ObjectStore::new();
    let a = store.insert(bare(10.0, 10.0, 0.0, 0.0));
    assert!(convert(&mut store, &a, GroupRole::Group, &VPT).is_none());
    assert!(store.contains(&a));
}

// =============================================================
// Rotation
// =============================================================

#[test]
fn centered_rotation_keeps_center() {
    let mut store = ObjectStore::new();
    let id = store.insert(bare(10.0, 20.0, 0.0, 0.0));
    store.rotate(&id, 90.0);
    let entity = store.get(&id).unwrap();
    assert_eq!(entity.geometry.angle, 90.0);
    assert!(close(entity.center_point().x, 5.0));
    assert!(close(entity.center_point().y, 10.0));
}

#[test]
fn uncentered_rotation_pivots_on_origin() {
    let mut store = ObjectStore::new();
    let id = store.insert(bare(10.0, 20.0, 0.0, 0.0));
    store.get_mut(&id).unwrap().behavior.centered_rotation = false;
    store.rotate(&id, 90.0);
    let entity = store.get(&id).unwrap();
    assert_eq!((entity.geometry.left, entity.geometry.top), (0.0, 0.0));
    assert!(close(entity.center_point().x, -10.0));
}
