//! Affine matrix utilities.
//!
//! A [`Matrix`] is the 2×3 tuple `[a, b, c, d, e, f]` standing for
//!
//! ```text
//! | a c e |
//! | b d f |
//! | 0 0 1 |
//! ```
//!
//! Everything here is pure. Entities build their matrices from these pieces
//! (see [`crate::transform`]) and the viewport is just another matrix.
//!
//! DESIGN
//! ======
//! [`decompose`] is the QR-style split used when a child leaves a group: it
//! recovers angle, both scales and `skew_x`, but always reports
//! `skew_y = 0.0`. A single 2×3 matrix cannot separate two skew axes from
//! rotation and scale, so entities keep `skew_y` as authoritative state and
//! never re-derive it from a composed matrix.

#[cfg(test)]
#[path = "matrix_test.rs"]
mod matrix_test;

use std::f64::consts::FRAC_PI_2;
use std::ops::Mul;

use serde::{Deserialize, Serialize};

use crate::point::Point;

/// A 2×3 affine transform `[a, b, c, d, e, f]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix(pub [f64; 6]);

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([a, b, c, d, e, f])
    }

    #[must_use]
    pub const fn translate(x: f64, y: f64) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, x, y])
    }

    #[must_use]
    pub const fn scale(x: f64, y: f64) -> Self {
        Self([x, 0.0, 0.0, y, 0.0, 0.0])
    }

    /// Rotation by `degrees`, snapping to exact values on right angles.
    #[must_use]
    pub fn rotate(degrees: f64) -> Self {
        let theta = degrees.to_radians();
        let cos = cos(theta);
        let sin = sin(theta);
        Self([cos, sin, -sin, cos, 0.0, 0.0])
    }

    #[must_use]
    pub fn translation(&self) -> Point {
        Point::new(self.0[4], self.0[5])
    }

    /// The matrix with its translation components zeroed.
    #[must_use]
    pub fn linear(&self) -> Self {
        Self([self.0[0], self.0[1], self.0[2], self.0[3], 0.0, 0.0])
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.0[0] * self.0[3] - self.0[1] * self.0[2]
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Render as an SVG `matrix(...)` transform value.
    #[must_use]
    pub fn to_svg(&self, digits: u32) -> String {
        let parts: Vec<String> = self.0.iter().map(|v| format_number(*v, digits)).collect();
        format!("matrix({})", parts.join(" "))
    }
}

impl Mul for Matrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        multiply(&self, &rhs, false)
    }
}

impl Mul<Point> for Matrix {
    type Output = Point;

    fn mul(self, rhs: Point) -> Point {
        transform_point(rhs, &self, false)
    }
}

// =============================================================
// Core operations
// =============================================================

/// Compose `a ∘ b` (apply `b` first, then `a`).
///
/// With `is_2x2` the translation column of the result is zeroed; this is used
/// for dimension-only transforms.
#[must_use]
pub fn multiply(a: &Matrix, b: &Matrix, is_2x2: bool) -> Matrix {
    let a = &a.0;
    let b = &b.0;
    Matrix([
        a[0] * b[0] + a[2] * b[1],
        a[1] * b[0] + a[3] * b[1],
        a[0] * b[2] + a[2] * b[3],
        a[1] * b[2] + a[3] * b[3],
        if is_2x2 { 0.0 } else { a[0] * b[4] + a[2] * b[5] + a[4] },
        if is_2x2 { 0.0 } else { a[1] * b[4] + a[3] * b[5] + a[5] },
    ])
}

/// Closed-form inverse. Callers guarantee a non-degenerate matrix; scale
/// clamping on entities keeps that true.
#[must_use]
pub fn invert(m: &Matrix) -> Matrix {
    let t = &m.0;
    let a = 1.0 / (t[0] * t[3] - t[1] * t[2]);
    let r = Matrix([a * t[3], -a * t[1], -a * t[2], a * t[0], 0.0, 0.0]);
    let o = transform_point(Point::new(t[4], t[5]), &r, true);
    Matrix([r.0[0], r.0[1], r.0[2], r.0[3], -o.x, -o.y])
}

#[must_use]
pub fn transform_point(p: Point, m: &Matrix, ignore_translation: bool) -> Point {
    let t = &m.0;
    if ignore_translation {
        return Point::new(t[0] * p.x + t[2] * p.y, t[1] * p.x + t[3] * p.y);
    }
    Point::new(t[0] * p.x + t[2] * p.y + t[4], t[1] * p.x + t[3] * p.y + t[5])
}

/// Axis-aligned bounds of a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    #[must_use]
    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    #[must_use]
    pub fn bottom_right(&self) -> Point {
        Point::new(self.left + self.width, self.top + self.height)
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

/// Axis-aligned box enclosing `points`, optionally transformed by `m` first.
#[must_use]
pub fn bounding_box_from_points(points: &[Point], m: Option<&Matrix>) -> BoundingBox {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        let p = match m {
            Some(m) => transform_point(*p, m, false),
            None => *p,
        };
        min = min.min(p);
        max = max.max(p);
    }
    if points.is_empty() {
        return BoundingBox::default();
    }
    BoundingBox { left: min.x, top: min.y, width: max.x - min.x, height: max.y - min.y }
}

// =============================================================
// Decomposition / composition
// =============================================================

/// Transform parameters recovered from (or used to build) a matrix.
///
/// Angles and skews are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    pub angle: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub skew_x: f64,
    pub skew_y: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            flip_x: false,
            flip_y: false,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

/// QR-style decomposition. `skew_y` is always 0 and flips are folded into the
/// sign of `scale_y`.
#[must_use]
pub fn decompose(m: &Matrix) -> TransformOptions {
    let [a, b, c, d, e, f] = m.0;
    let angle = b.atan2(a);
    let denom = a * a + b * b;
    let scale_x = denom.sqrt();
    let scale_y = (a * d - c * b) / scale_x;
    let skew_x = (a * c + b * d).atan2(denom);
    TransformOptions {
        angle: angle.to_degrees(),
        scale_x,
        scale_y,
        skew_x: skew_x.to_degrees(),
        skew_y: 0.0,
        flip_x: false,
        flip_y: false,
        translate_x: e,
        translate_y: f,
    }
}

/// The scale / flip / skew part of an object matrix, without rotation or
/// translation.
#[must_use]
pub fn dimensions_matrix(scale_x: f64, scale_y: f64, flip_x: bool, flip_y: bool, skew_x: f64, skew_y: f64) -> Matrix {
    let mut m = Matrix::scale(if flip_x { -scale_x } else { scale_x }, if flip_y { -scale_y } else { scale_y });
    if skew_x != 0.0 {
        m = multiply(&m, &Matrix([1.0, 0.0, skew_x.to_radians().tan(), 1.0, 0.0, 0.0]), true);
    }
    if skew_y != 0.0 {
        m = multiply(&m, &Matrix([1.0, skew_y.to_radians().tan(), 0.0, 1.0, 0.0, 0.0]), true);
    }
    m
}

/// Build `translate · rotate · dimensions` from explicit options.
#[must_use]
pub fn compose(options: &TransformOptions) -> Matrix {
    let mut m = Matrix::translate(options.translate_x, options.translate_y);
    if options.angle != 0.0 {
        m = multiply(&m, &Matrix::rotate(options.angle), false);
    }
    if options.scale_x != 1.0
        || options.scale_y != 1.0
        || options.skew_x != 0.0
        || options.skew_y != 0.0
        || options.flip_x
        || options.flip_y
    {
        let dims = dimensions_matrix(
            options.scale_x,
            options.scale_y,
            options.flip_x,
            options.flip_y,
            options.skew_x,
            options.skew_y,
        );
        m = multiply(&m, &dims, false);
    }
    m
}

// =============================================================
// Trigonometry
// =============================================================

/// Which quarter turn `angle` lands on, when it is (numerically) a multiple of π/2.
#[allow(clippy::cast_possible_truncation)]
fn quarter_turn(angle: f64) -> Option<i64> {
    let slice = angle / FRAC_PI_2;
    let rounded = slice.round();
    if (slice - rounded).abs() < 1e-12 {
        Some((rounded as i64).rem_euclid(4))
    } else {
        None
    }
}

/// Cosine that returns exact 0 / ±1 on multiples of 90°.
#[must_use]
pub fn cos(angle: f64) -> f64 {
    match quarter_turn(angle) {
        Some(0) => 1.0,
        Some(1 | 3) => 0.0,
        Some(_) => -1.0,
        None => angle.cos(),
    }
}

/// Sine that returns exact 0 / ±1 on multiples of 90°.
#[must_use]
pub fn sin(angle: f64) -> f64 {
    match quarter_turn(angle) {
        Some(0 | 2) => 0.0,
        Some(1) => 1.0,
        Some(_) => -1.0,
        None => angle.sin(),
    }
}

/// Round `value` to `digits` fraction digits.
#[must_use]
pub fn to_fixed(value: f64, digits: u32) -> f64 {
    let factor = 10_f64.powi(i32::try_from(digits).unwrap_or(i32::MAX));
    (value * factor).round() / factor
}

/// Format a number for markup output with at most `digits` fraction digits.
#[must_use]
pub fn format_number(value: f64, digits: u32) -> String {
    let v = to_fixed(value, digits);
    if v == 0.0 { "0".to_owned() } else { format!("{v}") }
}
