#![allow(clippy::float_cmp)]

use super::*;
use crate::doc::{GroupRole, Origin, Paint, Prop};
use crate::group::create_group;

fn approx(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

fn square(side: f64) -> Quad {
    Quad {
        tl: Point::ORIGIN,
        tr: Point::new(side, 0.0),
        br: Point::new(side, side),
        bl: Point::new(0.0, side),
    }
}

/// 100x50 rect at (10, 20), no stroke, corners computed under `vpt`.
fn placed(vpt: &Matrix) -> (ObjectStore, ObjectId) {
    let mut store = ObjectStore::new();
    let id = store.insert(Entity::rect(100.0, 50.0).at(10.0, 20.0).with_stroke(None, 0.0));
    store.set_coords(&id, vpt);
    (store, id)
}

// =============================================================
// Quad
// =============================================================

#[test]
fn quad_contains_interior_points_only() {
    let q = square(10.0);
    assert!(q.contains_point(Point::new(5.0, 5.0)));
    assert!(!q.contains_point(Point::new(15.0, 5.0)));
    assert!(!q.contains_point(Point::new(-1.0, 5.0)));
    assert!(!q.contains_point(Point::new(5.0, 11.0)));
}

#[test]
fn cross_points_stop_at_two() {
    let q = square(10.0);
    assert_eq!(find_cross_points(Point::new(-5.0, 5.0), &q.lines()), 2);
    assert_eq!(find_cross_points(Point::new(5.0, 5.0), &q.lines()), 1);
}

#[test]
fn quad_rect_relations() {
    let q = square(10.0);
    assert!(q.intersects_rect(Point::new(5.0, 5.0), Point::new(20.0, 20.0)));
    assert!(!q.intersects_rect(Point::new(20.0, 20.0), Point::new(30.0, 30.0)));
    assert!(q.is_contained_within_rect(Point::new(-1.0, -1.0), Point::new(11.0, 11.0)));
    assert!(!q.is_contained_within_rect(Point::new(1.0, 1.0), Point::new(11.0, 11.0)));
}

#[test]
fn quad_quad_relations() {
    let outer = square(10.0);
    let inner = Quad {
        tl: Point::new(2.0, 2.0),
        tr: Point::new(4.0, 2.0),
        br: Point::new(4.0, 4.0),
        bl: Point::new(2.0, 4.0),
    };
    assert!(inner.is_contained_within_quad(&outer));
    assert!(!outer.is_contained_within_quad(&inner));
    assert!(!inner.intersects_quad(&outer));
}

#[test]
fn control_names_and_sides() {
    assert_eq!(Control::Mtr.name(), "mtr");
    assert_eq!(Control::Bl.name(), "bl");
    assert!(Control::Ml.is_side());
    assert!(!Control::Tl.is_side());
    assert!(!Control::Mtr.is_side());
}

// =============================================================
// Absolute coords
// =============================================================

#[test]
fn absolute_corners_of_unrotated_rect() {
    let (store, id) = placed(&Matrix::IDENTITY);
    let q = store.get(&id).unwrap().get_coords(true).unwrap();
    assert_eq!(q.tl, Point::new(10.0, 20.0));
    assert_eq!(q.tr, Point::new(110.0, 20.0));
    assert_eq!(q.br, Point::new(110.0, 70.0));
    assert_eq!(q.bl, Point::new(10.0, 70.0));
}

#[test]
fn corner_centroid_is_the_center_for_every_origin() {
    let origins = [Origin::Start, Origin::Center, Origin::End, Origin::Fraction(0.3), Origin::Fraction(0.85)];
    for origin_x in origins {
        for origin_y in origins {
            let mut store = ObjectStore::new();
            let id = store.insert(
                Entity::rect(80.0, 30.0)
                    .at(37.0, -12.0)
                    .with_origin(origin_x, origin_y)
                    .with_stroke(Some(Paint::solid("black")), 4.0)
                    .with_scale(1.5, 0.75)
                    .with_skew(25.0, -10.0)
                    .with_angle(33.0),
            );
            store.set_coords(&id, &Matrix::IDENTITY);
            let entity = store.get(&id).unwrap();
            let q = entity.get_coords(true).unwrap();
            let centroid = (q.tl + q.tr + q.br + q.bl) / 4.0;
            assert!(approx(centroid, entity.center_point()), "{origin_x:?}/{origin_y:?}: {centroid} vs {}", entity.center_point());
        }
    }
}

#[test]
fn rotated_rect_bounds_swap_axes() {
    let mut store = ObjectStore::new();
    let id = store.insert(
        Entity::rect(100.0, 50.0)
            .with_stroke(None, 0.0)
            .with_origin(Origin::Center, Origin::Center)
            .at(50.0, 50.0)
            .with_angle(90.0),
    );
    let b = store.bounding_rect(&id, true, true, &Matrix::IDENTITY).unwrap();
    assert_eq!((b.left, b.top, b.width, b.height), (25.0, 0.0, 50.0, 100.0));
    assert!(store.get(&id).unwrap().get_coords(true).is_none());
}

#[test]
fn grouped_corners_follow_group_transform() {
    let mut store = ObjectStore::new();
    let a = store.insert(Entity::rect(10.0, 10.0).with_stroke(None, 0.0));
    let b = store.insert(Entity::rect(10.0, 10.0).at(30.0, 0.0).with_stroke(None, 0.0));
    let gid = create_group(&mut store, &[a, b], GroupRole::Group, &Matrix::IDENTITY);
    store.set_all(&gid, [Prop::ScaleX(2.0), Prop::ScaleY(2.0)]);
    store.set_coords(&gid, &Matrix::IDENTITY);

    let q = store.get(&b).unwrap().get_coords(true).unwrap();
    assert!(approx(q.tl, Point::new(60.0, 0.0)));
    assert!(approx(q.br, Point::new(80.0, 20.0)));
}

#[test]
fn containment_predicates_use_absolute_corners() {
    let (store, id) = placed(&Matrix::scale(2.0, 2.0));
    let entity = store.get(&id).unwrap();
    assert!(entity.contains_point(Point::new(50.0, 40.0), true));
    assert!(!entity.contains_point(Point::new(150.0, 40.0), true));
    assert!(entity.contains_point(Point::new(150.0, 80.0), false));
    assert!(entity.intersects_with_rect(Point::new(0.0, 0.0), Point::new(50.0, 50.0), true));
    assert!(entity.is_contained_within_rect(Point::new(0.0, 0.0), Point::new(200.0, 200.0), true));
}

#[test]
fn covering_entity_is_on_screen() {
    let mut store = ObjectStore::new();
    let id = store.insert(Entity::rect(1000.0, 1000.0).at(-100.0, -100.0));
    store.set_coords(&id, &Matrix::IDENTITY);
    let entity = store.get(&id).unwrap();
    assert!(entity.is_on_screen(Point::ORIGIN, Point::new(300.0, 150.0)));
    assert!(!entity.is_on_screen(Point::new(2000.0, 2000.0), Point::new(2100.0, 2100.0)));
}

// =============================================================
// Viewport coords
// =============================================================

#[test]
fn viewport_points_are_zoomed_and_padded() {
    let mut store = ObjectStore::new();
    let id = store.insert(Entity::rect(100.0, 50.0).at(10.0, 20.0).with_stroke(None, 0.0).with_padding(5.0));
    store.set_coords(&id, &Matrix::scale(2.0, 2.0));
    let coords = store.get(&id).unwrap().viewport_coords().copied().unwrap();
    assert!(approx(coords.position(Control::Tl), Point::new(15.0, 35.0)));
    assert!(approx(coords.position(Control::Br), Point::new(225.0, 145.0)));
    assert!(approx(coords.position(Control::Mt), Point::new(120.0, 35.0)));
    assert!(approx(coords.position(Control::Mr), Point::new(225.0, 90.0)));
    assert!(approx(coords.position(Control::Mtr), Point::new(120.0, -5.0)));
}

#[test]
fn corner_hit_area_is_a_square_around_the_handle() {
    let (store, id) = placed(&Matrix::IDENTITY);
    let tl = store.get(&id).unwrap().viewport_coords().unwrap().get(Control::Tl);
    assert!(tl.corner.contains_point(tl.position + Point::new(6.0, 6.0)));
    assert!(tl.corner.contains_point(tl.position - Point::new(6.0, 6.0)));
    assert!(!tl.corner.contains_point(tl.position + Point::new(7.0, 0.0)));
}

#[test]
fn rotated_rect_moves_rotate_handle() {
    let mut store = ObjectStore::new();
    let id = store.insert(
        Entity::rect(100.0, 50.0)
            .with_stroke(None, 0.0)
            .with_origin(Origin::Center, Origin::Center)
            .at(100.0, 100.0)
            .with_angle(90.0),
    );
    store.set_coords(&id, &Matrix::IDENTITY);
    let coords = store.get(&id).unwrap().viewport_coords().copied().unwrap();
    // the top edge now faces right
    assert!(approx(coords.position(Control::Mt), Point::new(125.0, 100.0)));
    assert!(approx(coords.position(Control::Mtr), Point::new(165.0, 100.0)));
}
