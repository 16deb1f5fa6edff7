#![allow(clippy::float_cmp)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::doc::GroupRole;
use crate::group::create_group;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn close_point(a: Point, b: Point) -> bool {
    close(a.x, b.x) && close(a.y, b.y)
}

fn bare(width: f64, height: f64) -> Entity {
    Entity::rect(width, height).with_stroke(None, 0.0)
}

/// Two 10x10 squares at x = 0 and x = 30 in a group centered on (20, 5).
fn grouped() -> (ObjectStore, ObjectId, ObjectId) {
    let mut store = ObjectStore::new();
    let a = store.insert(bare(10.0, 10.0));
    let b = store.insert(bare(10.0, 10.0).at(30.0, 0.0));
    let gid = create_group(&mut store, &[a, b], GroupRole::Group, &Matrix::IDENTITY);
    (store, gid, b)
}

// =============================================================
// Scale constraints
// =============================================================

#[test]
fn zero_scale_becomes_epsilon() {
    let entity = bare(10.0, 10.0);
    assert_eq!(entity.constrain_scale(0.0), MIN_SCALE_EPSILON);
    assert_eq!(entity.constrain_scale(-3.0), -3.0);
}

#[test]
fn min_scale_limit_keeps_sign() {
    let mut entity = bare(10.0, 10.0);
    entity.behavior.min_scale_limit = 0.1;
    assert_eq!(entity.constrain_scale(0.05), 0.1);
    assert_eq!(entity.constrain_scale(-0.05), -0.1);
    assert_eq!(entity.constrain_scale(0.0), 0.1);
    assert_eq!(entity.constrain_scale(2.0), 2.0);
}

#[test]
fn negative_scale_toggles_flip() {
    let mut store = ObjectStore::new();
    let id = store.insert(bare(10.0, 10.0));
    store.set(&id, Prop::ScaleX(-2.0));
    let g = &store.get(&id).unwrap().geometry;
    assert!(g.flip_x);
    assert_eq!(g.scale_x, 2.0);

    store.set(&id, Prop::ScaleX(-2.0));
    assert!(!store.get(&id).unwrap().geometry.flip_x);
}

// =============================================================
// Dimensions
// =============================================================

#[test]
fn dimensions_include_stroke_then_scale() {
    let entity = Entity::rect(10.0, 20.0).with_stroke(None, 2.0).with_scale(2.0, 3.0);
    assert_eq!(entity.non_transformed_dimensions(), Point::new(12.0, 22.0));
    assert_eq!(entity.transformed_dimensions(), Point::new(24.0, 66.0));
}

#[test]
fn skew_widens_the_box() {
    let entity = bare(10.0, 10.0).with_skew(45.0, 0.0);
    let dims = entity.transformed_dimensions();
    assert!(close(dims.x, 20.0));
    assert!(close(dims.y, 10.0));
}

// =============================================================
// Origin conversions
// =============================================================

#[test]
fn center_from_each_origin() {
    let entity = bare(100.0, 50.0);
    let at = Point::ORIGIN;
    assert_eq!(entity.translate_to_center_point(at, Origin::Start, Origin::Start), Point::new(50.0, 25.0));
    assert_eq!(entity.translate_to_center_point(at, Origin::End, Origin::End), Point::new(-50.0, -25.0));
    assert_eq!(entity.translate_to_center_point(at, Origin::Center, Origin::Center), at);
    assert_eq!(entity.translate_to_center_point(at, Origin::Fraction(0.75), Origin::Start), Point::new(-25.0, 25.0));
}

#[test]
fn rotation_pivots_on_the_origin_point() {
    let entity = bare(100.0, 50.0).with_angle(90.0);
    let center = entity.translate_to_center_point(Point::ORIGIN, Origin::Start, Origin::Start);
    assert!(close_point(center, Point::new(-25.0, 50.0)));
}

#[test]
fn origin_and_center_conversions_invert() {
    let entity = bare(100.0, 50.0).with_angle(30.0).with_scale(1.5, 0.5);
    let center = Point::new(40.0, -12.0);
    let origin = entity.translate_to_origin_point(center, Origin::End, Origin::Start);
    let back = entity.translate_to_center_point(origin, Origin::End, Origin::Start);
    assert!(close_point(back, center));
}

#[test]
fn point_by_origin_reads_any_corner() {
    let entity = bare(100.0, 50.0).at(10.0, 20.0);
    assert_eq!(entity.center_point(), Point::new(60.0, 45.0));
    assert_eq!(entity.point_by_origin(Origin::End, Origin::End), Point::new(110.0, 70.0));
    assert_eq!(entity.point_by_origin(Origin::Start, Origin::Start), Point::new(10.0, 20.0));
}

#[test]
fn local_point_is_relative_to_reference() {
    let entity = bare(100.0, 50.0).at(10.0, 20.0);
    let p = Point::new(60.0, 45.0);
    assert_eq!(entity.to_local_point(p, None), Point::new(50.0, 25.0));
    assert_eq!(entity.to_local_point(p, Some((Origin::Center, Origin::Center))), Point::ORIGIN);
    assert_eq!(entity.to_local_point(p, Some((Origin::End, Origin::End))), Point::new(-50.0, -25.0));
}

#[test]
fn local_point_removes_rotation() {
    let entity = bare(100.0, 50.0).with_origin(Origin::Center, Origin::Center).with_angle(90.0);
    let local = entity.to_local_point(Point::new(0.0, 50.0), Some((Origin::Center, Origin::Center)));
    assert!(close_point(local, Point::new(50.0, 0.0)));
}

#[test]
fn set_position_by_origin_moves_left_top() {
    let mut store = ObjectStore::new();
    let id = store.insert(bare(100.0, 50.0));
    store.set_position_by_origin(&id, Point::new(100.0, 100.0), Origin::Center, Origin::Center);
    let g = &store.get(&id).unwrap().geometry;
    assert_eq!((g.left, g.top), (50.0, 75.0));
}

// =============================================================
// Matrices
// =============================================================

#[test]
fn own_matrix_translates_to_center() {
    let entity = bare(100.0, 50.0).at(10.0, 20.0);
    assert_eq!(entity.calc_own_matrix(), Matrix::translate(60.0, 45.0));

    let scaled = bare(100.0, 50.0).at(10.0, 20.0).with_scale(2.0, 2.0);
    assert_eq!(scaled.calc_own_matrix(), Matrix::new(2.0, 0.0, 0.0, 2.0, 110.0, 70.0));
}

#[test]
fn own_matrix_applies_flip() {
    let entity = bare(10.0, 10.0).with_flip(true, false);
    let m = entity.calc_own_matrix();
    assert_eq!((m.0[0], m.0[3]), (-1.0, 1.0));
}

#[test]
fn own_matrix_memo_follows_geometry() {
    let mut entity = bare(10.0, 10.0);
    let first = entity.calc_own_matrix();
    assert!(entity.own_matrix_memo().get().is_some());

    entity.geometry.left = 20.0;
    let moved = entity.calc_own_matrix();
    assert_ne!(first, moved);
    assert_eq!(moved.translation(), Point::new(25.0, 5.0));

    entity.clear_matrix_memo();
    assert!(entity.own_matrix_memo().get().is_none());
}

#[test]
fn own_matrix_decomposes_back_to_geometry() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let angle = rng.random_range(0.0..360.0);
        let (scale_x, scale_y) = (rng.random_range(0.1..8.0), rng.random_range(0.1..8.0));
        let skew_x = rng.random_range(-75.0..75.0);
        let entity = bare(rng.random_range(1.0..300.0), rng.random_range(1.0..300.0))
            .at(rng.random_range(-500.0..500.0), rng.random_range(-500.0..500.0))
            .with_scale(scale_x, scale_y)
            .with_skew(skew_x, 0.0)
            .with_angle(angle);

        let d = decompose(&entity.calc_own_matrix());
        let turn = (d.angle - angle).rem_euclid(360.0);
        assert!(turn < 1e-7 || 360.0 - turn < 1e-7, "angle {angle} came back as {}", d.angle);
        assert!((d.scale_x - scale_x).abs() < 1e-9);
        assert!((d.scale_y - scale_y).abs() < 1e-9);
        assert!((d.skew_x - skew_x).abs() < 1e-7);
        assert_eq!(d.skew_y, 0.0);
        let center = entity.center_point();
        assert!((d.translate_x - center.x).abs() < 1e-9 && (d.translate_y - center.y).abs() < 1e-9);
    }
}

#[test]
fn full_matrix_walks_the_group_chain() {
    let (mut store, gid, b) = grouped();
    assert_eq!(store.calc_transform_matrix(&b), Matrix::translate(35.0, 5.0));
    assert_eq!(store.parent_matrix(&b), Matrix::translate(20.0, 5.0));

    store.set(&gid, Prop::Left(100.0));
    assert_eq!(store.calc_transform_matrix(&b), Matrix::translate(135.0, 5.0));
}

#[test]
fn unknown_id_has_identity_matrix() {
    let store = ObjectStore::new();
    assert_eq!(store.calc_transform_matrix(&uuid::Uuid::new_v4()), Matrix::IDENTITY);
}

#[test]
fn chain_accumulates_scale_opacity_and_angle() {
    let (mut store, gid, b) = grouped();
    store.set_all(&gid, [Prop::ScaleX(2.0), Prop::ScaleY(3.0), Prop::Opacity(0.5), Prop::Angle(30.0)]);
    store.set_all(&b, [Prop::ScaleX(2.0), Prop::Opacity(0.5), Prop::Angle(10.0)]);
    assert_eq!(store.object_scaling(&b), Point::new(4.0, 3.0));
    assert_eq!(store.object_opacity(&b), 0.25);
    assert_eq!(store.total_angle(&b), 40.0);
}

// =============================================================
// Realizing group transforms
// =============================================================

#[test]
fn realized_geometry_leaves_the_store_alone() {
    let (mut store, gid, b) = grouped();
    store.set_all(&gid, [Prop::ScaleX(2.0), Prop::ScaleY(2.0)]);
    let realized = store.realized_geometry(&b).unwrap();
    assert!(close(realized.scale_x, 2.0));
    assert_eq!(store.get(&b).unwrap().geometry.scale_x, 1.0);

    store.realize_transform(&b);
    assert!(close(store.get(&b).unwrap().geometry.scale_x, 2.0));
}

#[test]
fn realized_angle_is_normalized() {
    let (mut store, gid, b) = grouped();
    store.set(&gid, Prop::Angle(-90.0));
    let realized = store.realized_geometry(&b).unwrap();
    assert!(close(realized.angle, 270.0));
}

#[test]
fn mirrored_group_realizes_as_flip() {
    let (mut store, gid, b) = grouped();
    store.set(&gid, Prop::ScaleX(-1.0));
    store.realize_transform(&b);
    let child = store.get(&b).unwrap();
    assert!(child.geometry.flip_x || child.geometry.flip_y);
    assert!(close(child.geometry.scale_x, 1.0));
    assert!(close(child.geometry.scale_y, 1.0));
    // the mirror image of x = 30..40 about the group center x = 20
    assert!(close_point(child.center_point(), Point::new(5.0, 5.0)));
}
