#![allow(clippy::float_cmp)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;

fn approx(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

// =============================================================
// Conversions
// =============================================================

#[test]
fn default_camera_is_identity() {
    let camera = Camera::default();
    assert_eq!(camera.transform(), Matrix::IDENTITY);
    assert_eq!(camera.zoom(), 1.0);
    assert_eq!(camera.screen_to_scene(Point::new(3.0, 4.0)), Point::new(3.0, 4.0));
}

#[test]
fn scene_to_screen_applies_zoom_then_pan() {
    let camera = Camera::new(Matrix::new(2.0, 0.0, 0.0, 2.0, 10.0, 20.0));
    assert_eq!(camera.scene_to_screen(Point::new(5.0, 5.0)), Point::new(20.0, 30.0));
    assert_eq!(camera.screen_to_scene(Point::new(20.0, 30.0)), Point::new(5.0, 5.0));
}

#[test]
fn conversions_invert_each_other() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let zoom = rng.random_range(0.1..8.0);
        let camera = Camera::new(Matrix::new(
            zoom,
            0.0,
            0.0,
            zoom,
            rng.random_range(-500.0..500.0),
            rng.random_range(-500.0..500.0),
        ));
        let p = Point::new(rng.random_range(-1000.0..1000.0), rng.random_range(-1000.0..1000.0));
        assert!(approx(camera.screen_to_scene(camera.scene_to_screen(p)), p));
    }
}

// =============================================================
// Zoom and pan
// =============================================================

#[test]
fn zoom_to_point_keeps_point_fixed() {
    let camera = Camera::new(Matrix::new(1.0, 0.0, 0.0, 1.0, -30.0, 12.0));
    let anchor = Point::new(150.0, 75.0);
    let before = camera.screen_to_scene(anchor);
    let zoomed = Camera::new(camera.zoomed_to_point(anchor, 3.0));
    assert_eq!(zoomed.zoom(), 3.0);
    assert!(approx(zoomed.screen_to_scene(anchor), before));
}

#[test]
fn zoom_about_origin_has_no_pan() {
    let camera = Camera::default();
    assert_eq!(camera.zoomed_to_point(Point::ORIGIN, 2.0), Matrix::scale(2.0, 2.0));
}

#[test]
fn pan_to_puts_point_at_top_left() {
    let camera = Camera::new(Matrix::scale(2.0, 2.0));
    let vpt = camera.panned_to(Point::new(40.0, 60.0));
    assert_eq!(vpt, Matrix::new(2.0, 0.0, 0.0, 2.0, -40.0, -60.0));
}

#[test]
fn pan_by_accumulates() {
    let mut camera = Camera::default();
    camera.set_transform(camera.panned_by(Point::new(10.0, -5.0)));
    camera.set_transform(camera.panned_by(Point::new(10.0, -5.0)));
    assert_eq!(camera.transform().translation(), Point::new(20.0, -10.0));
}

// =============================================================
// Bounds
// =============================================================

#[test]
fn bounds_cover_visible_scene() {
    let camera = Camera::new(Matrix::new(2.0, 0.0, 0.0, 2.0, -100.0, -50.0));
    let b = camera.bounds(300.0, 150.0);
    assert_eq!(b.tl, Point::new(50.0, 25.0));
    assert_eq!(b.br, Point::new(200.0, 100.0));
    assert_eq!(b.tr, Point::new(200.0, 25.0));
    assert_eq!(b.bl, Point::new(50.0, 100.0));
}

#[test]
fn center_is_scene_point_under_viewport_middle() {
    let camera = Camera::new(Matrix::scale(2.0, 2.0));
    assert_eq!(camera.center(300.0, 150.0), Point::new(75.0, 37.5));
}
