//! Viewport transform: pan and zoom between scene units and viewport pixels.
//!
//! The camera is a thin owner of the viewport matrix. Every operation that
//! changes it returns through [`Camera::set_transform`], so the scene can
//! recompute coordinates in one place.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use crate::matrix::{Matrix, invert, transform_point};
use crate::point::Point;

/// Visible scene rectangle, in scene units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportBounds {
    pub tl: Point,
    pub tr: Point,
    pub bl: Point,
    pub br: Point,
}

/// Pan/zoom state for the scene.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    vpt: Matrix,
}

impl Camera {
    #[must_use]
    pub fn new(vpt: Matrix) -> Self {
        Self { vpt }
    }

    #[must_use]
    pub fn transform(&self) -> Matrix {
        self.vpt
    }

    pub fn set_transform(&mut self, vpt: Matrix) {
        self.vpt = vpt;
    }

    /// Horizontal scale of the viewport.
    #[must_use]
    pub fn zoom(&self) -> f64 {
        self.vpt.0[0]
    }

    /// Viewport matrix that zooms to `value` keeping `point` (viewport
    /// pixels) fixed on screen.
    #[must_use]
    pub fn zoomed_to_point(&self, point: Point, value: f64) -> Matrix {
        let scene = transform_point(point, &invert(&self.vpt), false);
        let mut vpt = self.vpt;
        vpt.0[0] = value;
        vpt.0[3] = value;
        let after = transform_point(scene, &vpt, false);
        vpt.0[4] += point.x - after.x;
        vpt.0[5] += point.y - after.y;
        vpt
    }

    /// Viewport matrix whose translation puts scene `point` at the top-left.
    #[must_use]
    pub fn panned_to(&self, point: Point) -> Matrix {
        let mut vpt = self.vpt;
        vpt.0[4] = -point.x;
        vpt.0[5] = -point.y;
        vpt
    }

    /// Viewport matrix moved by `delta` viewport pixels.
    #[must_use]
    pub fn panned_by(&self, delta: Point) -> Matrix {
        self.panned_to(Point::new(-delta.x - self.vpt.0[4], -delta.y - self.vpt.0[5]))
    }

    /// Scene rectangle covered by a `width` x `height` viewport.
    #[must_use]
    pub fn bounds(&self, width: f64, height: f64) -> ViewportBounds {
        let inverse = invert(&self.vpt);
        let tl = transform_point(Point::ORIGIN, &inverse, false);
        let br = transform_point(Point::new(width, height), &inverse, false);
        ViewportBounds { tl, tr: Point::new(br.x, tl.y), bl: Point::new(tl.x, br.y), br }
    }

    /// Scene point under the center of a `width` x `height` viewport.
    #[must_use]
    pub fn center(&self, width: f64, height: f64) -> Point {
        self.screen_to_scene(Point::new(width / 2.0, height / 2.0))
    }

    /// Convert a viewport point (CSS pixels) to scene coordinates.
    #[must_use]
    pub fn screen_to_scene(&self, screen: Point) -> Point {
        transform_point(screen, &invert(&self.vpt), false)
    }

    /// Convert a scene point to viewport coordinates (CSS pixels).
    #[must_use]
    pub fn scene_to_screen(&self, scene: Point) -> Point {
        transform_point(scene, &self.vpt, false)
    }
}
