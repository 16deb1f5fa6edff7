use super::*;

fn square(x: f64, y: f64, side: f64) -> Vec<Point> {
    vec![
        Point::new(x, y),
        Point::new(x + side, y),
        Point::new(x + side, y + side),
        Point::new(x, y + side),
    ]
}

#[test]
fn crossing_segments_intersect_at_center() {
    let r = line_line(Point::new(0.0, 0.0), Point::new(10.0, 10.0), Point::new(0.0, 10.0), Point::new(10.0, 0.0));
    assert!(r.is_intersection());
    assert_eq!(r.points, vec![Point::new(5.0, 5.0)]);
}

#[test]
fn disjoint_segments_have_no_status() {
    let r = line_line(Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(5.0, 0.0), Point::new(6.0, -1.0));
    assert_eq!(r.status, IntersectionStatus::None);
}

#[test]
fn parallel_and_coincident() {
    let p = line_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(0.0, 5.0), Point::new(10.0, 5.0));
    assert_eq!(p.status, IntersectionStatus::Parallel);
    let c = line_line(Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(2.0, 0.0), Point::new(4.0, 0.0));
    assert_eq!(c.status, IntersectionStatus::Coincident);
}

#[test]
fn overlapping_squares_intersect() {
    let r = polygon_polygon(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0));
    assert!(r.is_intersection());
    assert_eq!(r.points.len(), 2);
}

#[test]
fn nested_squares_do_not_intersect() {
    let r = polygon_polygon(&square(0.0, 0.0, 10.0), &square(2.0, 2.0, 2.0));
    assert!(!r.is_intersection());
}

#[test]
fn rectangle_corners_can_be_given_in_any_order() {
    let poly = square(0.0, 0.0, 10.0);
    let a = polygon_rectangle(&poly, Point::new(5.0, 5.0), Point::new(20.0, 20.0));
    let b = polygon_rectangle(&poly, Point::new(20.0, 20.0), Point::new(5.0, 5.0));
    assert!(a.is_intersection());
    assert_eq!(a.points.len(), b.points.len());
}
