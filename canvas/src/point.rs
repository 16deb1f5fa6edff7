//! 2D point / vector value type.
//!
//! `Point` is `Copy` and every operator returns a new value. The compound
//! assignment operators (`+=`, `-=`, `*=`, `/=`) are the in-place variants.

#[cfg(test)]
#[path = "point_test.rs"]
mod point_test;

use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// A point in any of the engine's coordinate spaces (local, group, scene, viewport).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Add `value` to both coordinates.
    #[must_use]
    pub fn scalar_add(self, value: f64) -> Self {
        Self::new(self.x + value, self.y + value)
    }

    /// Subtract `value` from both coordinates.
    #[must_use]
    pub fn scalar_sub(self, value: f64) -> Self {
        Self::new(self.x - value, self.y - value)
    }

    /// Linear interpolation towards `other`; `t = 0.5` is the midpoint.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        Self::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    #[must_use]
    pub fn distance_from(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[must_use]
    pub fn mid_point_from(self, other: Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
    }

    /// Both coordinates strictly less than `other`'s.
    #[must_use]
    pub fn lt(self, other: Self) -> bool {
        self.x < other.x && self.y < other.y
    }

    #[must_use]
    pub fn lte(self, other: Self) -> bool {
        self.x <= other.x && self.y <= other.y
    }

    #[must_use]
    pub fn gt(self, other: Self) -> bool {
        self.x > other.x && self.y > other.y
    }

    #[must_use]
    pub fn gte(self, other: Self) -> bool {
        self.x >= other.x && self.y >= other.y
    }

    #[must_use]
    pub fn swap(self) -> Self {
        Self::new(self.y, self.x)
    }

    /// Rotate this point around `origin` by `radians` (clockwise in screen space).
    #[must_use]
    pub fn rotate_around(self, origin: Self, radians: f64) -> Self {
        let sin = crate::matrix::sin(radians);
        let cos = crate::matrix::cos(radians);
        let d = self - origin;
        Self::new(d.x * cos - d.y * sin, d.x * sin + d.y * cos) + origin
    }

    /// Rotate this vector around the origin by `radians`.
    #[must_use]
    pub fn rotate_vector(self, radians: f64) -> Self {
        self.rotate_around(Self::ORIGIN, radians)
    }

    /// Angle of this vector measured from the positive x axis, in radians.
    #[must_use]
    pub fn angle(self) -> f64 {
        self.y.atan2(self.x)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f64> for Point {
    fn mul_assign(&mut self, rhs: f64) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f64> for Point {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl DivAssign<f64> for Point {
    fn div_assign(&mut self, rhs: f64) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
