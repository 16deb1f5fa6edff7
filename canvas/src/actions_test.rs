#![allow(clippy::float_cmp)]

use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::display_list::RecordingFactory;
use crate::events::Event;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn none() -> Modifiers {
    Modifiers::default()
}

fn shift() -> Modifiers {
    Modifiers { shift: true, ..Modifiers::default() }
}

fn alt() -> Modifiers {
    Modifiers { alt: true, ..Modifiers::default() }
}

/// Active 100x50 rect with its top-left at (50, 50): center (100, 75),
/// handles Tl (50, 50), Mt (100, 50), Mr (150, 75), Br (150, 100), Mtr (100, 10).
fn active_rect() -> (Scene, ObjectId) {
    let mut scene = Scene::new(SceneOptions::default(), Box::new(RecordingFactory::new())).unwrap();
    let id = scene.add(Entity::rect(100.0, 50.0).at(50.0, 50.0).with_stroke(None, 0.0));
    scene.set_active_object(&id);
    (scene, id)
}

fn start(scene: &mut Scene, id: &ObjectId, x: f64, y: f64, modifiers: &Modifiers) -> TransformSession {
    scene.setup_current_transform(id, Point::new(x, y), true, modifiers).unwrap()
}

fn geometry(scene: &Scene, id: &ObjectId) -> Geometry {
    scene.object(id).unwrap().geometry.clone()
}

fn record_names(scene: &mut Scene) -> Rc<RefCell<Vec<&'static str>>> {
    let names = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&names);
    scene.events().on(move |event: &SceneEvent| sink.borrow_mut().push(event.name()));
    names
}

// =============================================================
// Session setup
// =============================================================

#[test]
fn action_follows_the_grabbed_handle() {
    let options = SceneOptions::default();
    assert_eq!(action_from_corner(false, Some(Control::Tl), &none(), &options), TransformAction::Drag);
    assert_eq!(action_from_corner(true, None, &none(), &options), TransformAction::Drag);
    assert_eq!(action_from_corner(true, Some(Control::Mtr), &none(), &options), TransformAction::Rotate);
    assert_eq!(action_from_corner(true, Some(Control::Br), &none(), &options), TransformAction::Scale);
    assert_eq!(action_from_corner(true, Some(Control::Ml), &none(), &options), TransformAction::ScaleX);
    assert_eq!(action_from_corner(true, Some(Control::Mb), &none(), &options), TransformAction::ScaleY);
    assert_eq!(action_from_corner(true, Some(Control::Mr), &shift(), &options), TransformAction::SkewY);
    assert_eq!(action_from_corner(true, Some(Control::Mt), &shift(), &options), TransformAction::SkewX);
}

#[test]
fn anchor_is_opposite_the_handle() {
    let entity = Entity::rect(10.0, 10.0).with_origin(Origin::Center, Origin::Center);
    assert_eq!(origin_from_corner(&entity, Some(Control::Tl)), (Origin::End, Origin::End));
    assert_eq!(origin_from_corner(&entity, Some(Control::Br)), (Origin::Start, Origin::Start));
    assert_eq!(origin_from_corner(&entity, Some(Control::Mr)), (Origin::Start, Origin::Center));
    assert_eq!(origin_from_corner(&entity, Some(Control::Mt)), (Origin::Center, Origin::End));
    assert_eq!(origin_from_corner(&entity, None), (Origin::Center, Origin::Center));
}

#[test]
fn setup_records_the_starting_state() {
    let (mut scene, id) = active_rect();
    let names = record_names(&mut scene);
    let session = start(&mut scene, &id, 150.0, 100.0, &none());
    assert_eq!(session.action, TransformAction::Scale);
    assert_eq!(session.corner, Some(Control::Br));
    assert_eq!((session.origin_x, session.origin_y), (Origin::Start, Origin::Start));
    assert_eq!(session.offset, Point::new(100.0, 50.0));
    assert_eq!(session.original, geometry(&scene, &id));
    assert_eq!(scene.scaling, Some(id));
    assert_eq!(*names.borrow(), vec!["before:transform"]);
}

#[test]
fn rotation_anchors_on_center_by_default() {
    let (mut scene, id) = active_rect();
    let session = start(&mut scene, &id, 100.0, 10.0, &none());
    assert_eq!(session.action, TransformAction::Rotate);
    assert_eq!((session.origin_x, session.origin_y), (Origin::Center, Origin::Center));
}

// =============================================================
// Drag
// =============================================================

#[test]
fn drag_moves_by_pointer_delta() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 100.0, 75.0, &none());
    assert_eq!(session.action, TransformAction::Drag);
    assert!(scene.transform_object(&mut session, Point::new(120.0, 85.0), &none()));
    let g = geometry(&scene, &id);
    assert_eq!((g.left, g.top), (70.0, 60.0));
    assert!(scene.object(&id).unwrap().is_moving);
    assert!(!scene.transform_object(&mut session, Point::new(120.0, 85.0), &none()));
}

#[test]
fn movement_lock_pins_one_axis() {
    let (mut scene, id) = active_rect();
    scene.store_mut().get_mut(&id).unwrap().behavior.locks.movement_x = true;
    let mut session = start(&mut scene, &id, 100.0, 75.0, &none());
    scene.transform_object(&mut session, Point::new(120.0, 85.0), &none());
    let g = geometry(&scene, &id);
    assert_eq!((g.left, g.top), (50.0, 60.0));
}

#[test]
fn drag_under_zoom_uses_scene_units() {
    let (mut scene, id) = active_rect();
    scene.set_zoom(2.0);
    let mut session = start(&mut scene, &id, 200.0, 150.0, &none());
    scene.transform_object(&mut session, Point::new(240.0, 150.0), &none());
    assert_eq!(geometry(&scene, &id).left, 70.0);
}

// =============================================================
// Rotate
// =============================================================

#[test]
fn rotate_quarter_turn_about_center() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 100.0, 10.0, &none());
    assert!(scene.transform_object(&mut session, Point::new(165.0, 75.0), &none()));
    let entity = scene.object(&id).unwrap();
    assert!(close(entity.geometry.angle, 90.0));
    let center = entity.center_point();
    assert!(close(center.x, 100.0) && close(center.y, 75.0));
}

#[test]
fn rotation_snaps_within_threshold() {
    let (mut scene, id) = active_rect();
    {
        let behavior = &mut scene.store_mut().get_mut(&id).unwrap().behavior;
        behavior.snap_angle = 45.0;
        behavior.snap_threshold = Some(10.0);
    }
    let mut session = start(&mut scene, &id, 100.0, 10.0, &none());
    scene.transform_object(&mut session, Point::new(165.0, 70.0), &none());
    assert_eq!(geometry(&scene, &id).angle, 90.0);
}

#[test]
fn zero_snap_threshold_falls_back_to_snap_angle() {
    let (mut scene, id) = active_rect();
    {
        let behavior = &mut scene.store_mut().get_mut(&id).unwrap().behavior;
        behavior.snap_angle = 45.0;
        behavior.snap_threshold = Some(0.0);
    }
    let mut session = start(&mut scene, &id, 100.0, 10.0, &none());
    // about 85.6 degrees, within one snap step of 45
    scene.transform_object(&mut session, Point::new(165.0, 70.0), &none());
    assert_eq!(geometry(&scene, &id).angle, 45.0);
}

#[test]
fn rotation_lock_blocks_rotate() {
    let (mut scene, id) = active_rect();
    scene.store_mut().get_mut(&id).unwrap().behavior.locks.rotation = true;
    let mut session = start(&mut scene, &id, 100.0, 10.0, &none());
    assert!(!scene.transform_object(&mut session, Point::new(165.0, 75.0), &none()));
    assert_eq!(geometry(&scene, &id).angle, 0.0);
}

// =============================================================
// Scale
// =============================================================

#[test]
fn corner_scale_is_uniform_and_keeps_opposite_corner() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 100.0, &none());
    assert!(scene.transform_object(&mut session, Point::new(250.0, 150.0), &none()));
    let g = geometry(&scene, &id);
    assert!(close(g.scale_x, 2.0) && close(g.scale_y, 2.0));
    assert!(close(g.left, 50.0) && close(g.top, 50.0));
    assert_eq!(session.scale_mode, Some(ScaleMode::Equally));
}

#[test]
fn uni_scale_key_frees_the_axes() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 100.0, &shift());
    scene.transform_object(&mut session, Point::new(250.0, 125.0), &shift());
    let g = geometry(&scene, &id);
    assert!(close(g.scale_x, 2.0));
    assert!(close(g.scale_y, 1.5));
    assert_eq!(session.scale_mode, Some(ScaleMode::Free));
}

#[test]
fn centered_key_scales_about_center() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 100.0, &none());
    scene.transform_object(&mut session, Point::new(200.0, 125.0), &alt());
    assert_eq!((session.origin_x, session.origin_y), (Origin::Center, Origin::Center));
    let entity = scene.object(&id).unwrap();
    assert!(close(entity.geometry.scale_x, 2.0));
    let center = entity.center_point();
    assert!(close(center.x, 100.0) && close(center.y, 75.0));
}

#[test]
fn side_scale_through_zero_flips() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 75.0, &none());
    assert_eq!(session.action, TransformAction::ScaleX);

    scene.transform_object(&mut session, Point::new(30.0, 75.0), &none());
    let g = geometry(&scene, &id);
    assert!(g.flip_x);
    assert!(close(g.scale_x, 0.2));
    assert!(close(g.left, 30.0));
    assert_eq!(session.origin_x, Origin::End);

    // keeps growing leftwards from the old left edge
    scene.transform_object(&mut session, Point::new(10.0, 75.0), &none());
    let g = geometry(&scene, &id);
    assert!(g.flip_x);
    assert!(close(g.scale_x, 0.4));
    assert!(close(g.left, 10.0));
}

#[test]
fn scaling_flip_lock_stops_at_zero() {
    let (mut scene, id) = active_rect();
    scene.store_mut().get_mut(&id).unwrap().behavior.locks.scaling_flip = true;
    let mut session = start(&mut scene, &id, 150.0, 75.0, &none());
    assert!(!scene.transform_object(&mut session, Point::new(30.0, 75.0), &none()));
    let g = geometry(&scene, &id);
    assert!(!g.flip_x);
    assert_eq!(g.scale_x, 1.0);
}

#[test]
fn collapsed_axis_keeps_its_scale() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 100.0, &shift());
    let collapsed = Point::new(0.0, 50.0);
    assert!(!scene.set_object_scale(&mut session, Point::new(30.0, 40.0), ScaleBy::X, collapsed));
    assert_eq!(geometry(&scene, &id).scale_x, 1.0);

    assert!(scene.set_object_scale(&mut session, Point::new(30.0, 40.0), ScaleBy::Free, collapsed));
    let g = geometry(&scene, &id);
    assert_eq!(g.scale_x, 1.0);
    assert!(close(g.scale_y, 0.8));
    assert!(g.scale_x.is_finite() && g.scale_y.is_finite());
}

#[test]
fn collapsed_box_is_not_scaled_equally() {
    let (mut scene, id) = active_rect();
    let session = start(&mut scene, &id, 150.0, 100.0, &none());
    assert!(!scene.scale_object_equally(&session, Point::new(30.0, 40.0), Point::new(0.0, 0.0)));
    let g = geometry(&scene, &id);
    assert_eq!((g.scale_x, g.scale_y), (1.0, 1.0));
}

#[test]
fn uni_scaling_lock_blocks_side_scale() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 150.0, 75.0, &none());
    scene.store_mut().get_mut(&id).unwrap().behavior.locks.uni_scaling = true;
    assert!(!scene.transform_object(&mut session, Point::new(250.0, 75.0), &none()));
    assert_eq!(geometry(&scene, &id).scale_x, 1.0);
}

// =============================================================
// Skew
// =============================================================

#[test]
fn dragging_top_edge_right_skews_negative() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 100.0, 50.0, &shift());
    assert_eq!(session.action, TransformAction::SkewX);
    assert!(scene.transform_object(&mut session, Point::new(150.0, 50.0), &shift()));

    let entity = scene.object(&id).unwrap();
    assert!(close(entity.geometry.skew_x, -(2.0_f64.atan().to_degrees())));
    assert_eq!(session.origin_x, Origin::Start);
    let anchor = entity.point_by_origin(Origin::Start, Origin::End);
    assert!(close(anchor.x, 50.0) && close(anchor.y, 100.0));
}

#[test]
fn skew_lock_blocks_skew() {
    let (mut scene, id) = active_rect();
    scene.store_mut().get_mut(&id).unwrap().behavior.locks.skewing_x = true;
    let mut session = start(&mut scene, &id, 100.0, 50.0, &shift());
    assert!(!scene.transform_object(&mut session, Point::new(150.0, 50.0), &shift()));
    assert_eq!(geometry(&scene, &id).skew_x, 0.0);
}

// =============================================================
// Finish and cancel
// =============================================================

#[test]
fn finalize_reports_completed_gesture() {
    let (mut scene, id) = active_rect();
    let mut session = start(&mut scene, &id, 100.0, 75.0, &none());
    let names = record_names(&mut scene);
    scene.transform_object(&mut session, Point::new(110.0, 75.0), &none());
    scene.finalize_transform(&session);
    assert_eq!(*names.borrow(), vec!["moving", "moved", "modified"]);
    assert!(!scene.object(&id).unwrap().is_moving);
    assert_eq!(scene.scaling, None);
}

#[test]
fn finalize_without_change_is_silent() {
    let (mut scene, id) = active_rect();
    let session = start(&mut scene, &id, 100.0, 75.0, &none());
    let names = record_names(&mut scene);
    scene.finalize_transform(&session);
    assert!(names.borrow().is_empty());
}

#[test]
fn cancel_restores_original_geometry() {
    let (mut scene, id) = active_rect();
    let original = geometry(&scene, &id);
    let mut session = start(&mut scene, &id, 150.0, 75.0, &none());
    scene.transform_object(&mut session, Point::new(30.0, 75.0), &none());
    assert_ne!(geometry(&scene, &id), original);
    scene.cancel_transform(&session);
    assert_eq!(geometry(&scene, &id), original);
    assert!(!scene.object(&id).unwrap().is_moving);
}

#[test]
fn restore_geometry_undoes_flip() {
    let mut store = ObjectStore::new();
    let id = store.insert(Entity::rect(10.0, 10.0));
    let original = store.get(&id).unwrap().geometry.clone();
    store.set_all(&id, [Prop::ScaleX(-3.0), Prop::Angle(30.0), Prop::Left(5.0)]);
    restore_geometry(&mut store, &id, &original);
    assert_eq!(store.get(&id).unwrap().geometry, original);
}
