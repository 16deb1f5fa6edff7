//! Segment / polygon intersection tests used by selection and culling.

#[cfg(test)]
#[path = "intersection_test.rs"]
mod intersection_test;

use crate::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntersectionStatus {
    /// No shared point.
    #[default]
    None,
    /// At least one crossing point was found.
    Intersection,
    /// Segments lie on the same line.
    Coincident,
    /// Segments are parallel and distinct.
    Parallel,
}

/// Result of an intersection query: a status plus the crossing points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intersection {
    pub status: IntersectionStatus,
    pub points: Vec<Point>,
}

impl Intersection {
    #[must_use]
    pub fn is_intersection(&self) -> bool {
        self.status == IntersectionStatus::Intersection
    }

    fn append(&mut self, other: Intersection) {
        self.points.extend(other.points);
    }

    fn finish(mut self) -> Self {
        if !self.points.is_empty() {
            self.status = IntersectionStatus::Intersection;
        }
        self
    }
}

/// Intersection of segments `a1→a2` and `b1→b2`.
#[must_use]
pub fn line_line(a1: Point, a2: Point, b1: Point, b2: Point) -> Intersection {
    let ua_t = (b2.x - b1.x) * (a1.y - b1.y) - (b2.y - b1.y) * (a1.x - b1.x);
    let ub_t = (a2.x - a1.x) * (a1.y - b1.y) - (a2.y - a1.y) * (a1.x - b1.x);
    let u_b = (b2.y - b1.y) * (a2.x - a1.x) - (b2.x - b1.x) * (a2.y - a1.y);

    if u_b != 0.0 {
        let ua = ua_t / u_b;
        let ub = ub_t / u_b;
        if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
            return Intersection {
                status: IntersectionStatus::Intersection,
                points: vec![Point::new(a1.x + ua * (a2.x - a1.x), a1.y + ua * (a2.y - a1.y))],
            };
        }
        return Intersection::default();
    }

    let status = if ua_t == 0.0 || ub_t == 0.0 {
        IntersectionStatus::Coincident
    } else {
        IntersectionStatus::Parallel
    };
    Intersection { status, points: Vec::new() }
}

/// Intersection of segment `a1→a2` with the closed polygon `points`.
#[must_use]
pub fn line_polygon(a1: Point, a2: Point, points: &[Point]) -> Intersection {
    let mut result = Intersection::default();
    let len = points.len();
    for i in 0..len {
        let b1 = points[i];
        let b2 = points[(i + 1) % len];
        result.append(line_line(a1, a2, b1, b2));
    }
    result.finish()
}

/// Intersection of two closed polygons' edges.
#[must_use]
pub fn polygon_polygon(points1: &[Point], points2: &[Point]) -> Intersection {
    let mut result = Intersection::default();
    let len = points1.len();
    for i in 0..len {
        let a1 = points1[i];
        let a2 = points1[(i + 1) % len];
        result.append(line_polygon(a1, a2, points2));
    }
    result.finish()
}

/// Intersection of a closed polygon's edges with the rectangle spanned by `r1`/`r2`.
#[must_use]
pub fn polygon_rectangle(points: &[Point], r1: Point, r2: Point) -> Intersection {
    let min = r1.min(r2);
    let max = r1.max(r2);
    let top_right = Point::new(max.x, min.y);
    let bottom_left = Point::new(min.x, max.y);

    let mut result = Intersection::default();
    result.append(line_polygon(min, top_right, points));
    result.append(line_polygon(top_right, max, points));
    result.append(line_polygon(max, bottom_left, points));
    result.append(line_polygon(bottom_left, min, points));
    result.finish()
}
