//! Transform math for entities: own and full matrices, origin conversions.
//!
//! Every entity is positioned by `left`/`top` at the point its
//! `origin_x`/`origin_y` select, so almost every manipulation needs to move
//! between "the origin point" and "the center point". Those conversions rotate
//! about the point being converted from, which is what keeps a shape's
//! anchor fixed while it is scaled or rotated.
//!
//! Own matrices are memoized on the entity keyed by a [`TransformKey`]
//! fingerprint; full matrices additionally key on the parent matrix. Both
//! memos are plain `Cell`s owned by the entity and can be dropped with
//! [`Entity::clear_matrix_memo`].

#[cfg(test)]
#[path = "transform_test.rs"]
mod transform_test;

use std::cell::Cell;

use crate::consts::MIN_SCALE_EPSILON;
use crate::doc::{Entity, Geometry, ObjectId, ObjectStore, Origin, Prop};
use crate::matrix::{Matrix, bounding_box_from_points, decompose, dimensions_matrix, multiply};
use crate::point::Point;

/// Fingerprint of every field that affects an entity's own matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformKey {
    left: f64,
    top: f64,
    width: f64,
    height: f64,
    scale_x: f64,
    scale_y: f64,
    skew_x: f64,
    skew_y: f64,
    angle: f64,
    flip_x: bool,
    flip_y: bool,
    origin_x: Origin,
    origin_y: Origin,
    stroke_width: f64,
}

/// Matrix and origin math shared by everything with a [`Geometry`].
pub trait Transformable {
    fn geometry(&self) -> &Geometry;

    /// Stroke width contributes to the box every dimension is measured on.
    fn stroke_width(&self) -> f64;

    /// Smallest magnitude a scale may take.
    fn min_scale_limit(&self) -> f64;

    fn own_matrix_memo(&self) -> &Cell<Option<(TransformKey, Matrix)>>;

    #[must_use]
    fn transform_key(&self) -> TransformKey {
        let g = self.geometry();
        TransformKey {
            left: g.left,
            top: g.top,
            width: g.width,
            height: g.height,
            scale_x: g.scale_x,
            scale_y: g.scale_y,
            skew_x: g.skew_x,
            skew_y: g.skew_y,
            angle: g.angle,
            flip_x: g.flip_x,
            flip_y: g.flip_y,
            origin_x: g.origin_x,
            origin_y: g.origin_y,
            stroke_width: self.stroke_width(),
        }
    }

    /// Clamp a proposed scale away from zero.
    ///
    /// Below the minimum limit the signed limit is returned; an exact zero
    /// becomes a tiny positive epsilon.
    #[must_use]
    fn constrain_scale(&self, value: f64) -> f64 {
        let limit = self.min_scale_limit();
        if value.abs() < limit {
            if value < 0.0 { -limit } else { limit }
        } else if value == 0.0 {
            MIN_SCALE_EPSILON
        } else {
            value
        }
    }

    /// Size plus stroke width, before any scale or skew.
    #[must_use]
    fn non_transformed_dimensions(&self) -> Point {
        let g = self.geometry();
        let stroke = self.stroke_width();
        Point::new(g.width + stroke, g.height + stroke)
    }

    /// Size after scale and skew, without rotation.
    #[must_use]
    fn transformed_dimensions(&self) -> Point {
        let g = self.geometry();
        self.transformed_dimensions_with_skew(g.skew_x, g.skew_y)
    }

    /// Size after scale and the given skews; with skew this is the extent of
    /// the skewed box.
    #[must_use]
    fn transformed_dimensions_with_skew(&self, skew_x: f64, skew_y: f64) -> Point {
        let g = self.geometry();
        let dims = self.non_transformed_dimensions();
        if skew_x == 0.0 && skew_y == 0.0 {
            return Point::new(dims.x * g.scale_x, dims.y * g.scale_y);
        }
        let w = dims.x / 2.0;
        let h = dims.y / 2.0;
        let corners = [Point::new(-w, -h), Point::new(w, -h), Point::new(-w, h), Point::new(w, h)];
        let m = dimensions_matrix(g.scale_x, g.scale_y, false, false, skew_x, skew_y);
        let bbox = bounding_box_from_points(&corners, Some(&m));
        Point::new(bbox.width, bbox.height)
    }

    /// Move `point` from one origin of the (unrotated) box to another.
    #[must_use]
    fn translate_to_given_origin(
        &self,
        point: Point,
        from_x: Origin,
        from_y: Origin,
        to_x: Origin,
        to_y: Origin,
    ) -> Point {
        let offset_x = to_x.offset() - from_x.offset();
        let offset_y = to_y.offset() - from_y.offset();
        if offset_x == 0.0 && offset_y == 0.0 {
            return point;
        }
        let dim = self.transformed_dimensions();
        Point::new(point.x + offset_x * dim.x, point.y + offset_y * dim.y)
    }

    /// Center of the box whose `(origin_x, origin_y)` point is `point`.
    #[must_use]
    fn translate_to_center_point(&self, point: Point, origin_x: Origin, origin_y: Origin) -> Point {
        let p = self.translate_to_given_origin(point, origin_x, origin_y, Origin::Center, Origin::Center);
        let angle = self.geometry().angle;
        if angle != 0.0 { p.rotate_around(point, angle.to_radians()) } else { p }
    }

    /// The `(origin_x, origin_y)` point of the box centered at `center`.
    #[must_use]
    fn translate_to_origin_point(&self, center: Point, origin_x: Origin, origin_y: Origin) -> Point {
        let p = self.translate_to_given_origin(center, Origin::Center, Origin::Center, origin_x, origin_y);
        let angle = self.geometry().angle;
        if angle != 0.0 { p.rotate_around(center, angle.to_radians()) } else { p }
    }

    /// Center in the parent plane.
    #[must_use]
    fn center_point(&self) -> Point {
        let g = self.geometry();
        self.translate_to_center_point(Point::new(g.left, g.top), g.origin_x, g.origin_y)
    }

    #[must_use]
    fn point_by_origin(&self, origin_x: Origin, origin_y: Origin) -> Point {
        self.translate_to_origin_point(self.center_point(), origin_x, origin_y)
    }

    /// `point` relative to the given origin (or to `left`/`top` when `None`),
    /// with the entity's rotation removed.
    #[must_use]
    fn to_local_point(&self, point: Point, origin: Option<(Origin, Origin)>) -> Point {
        let g = self.geometry();
        let center = self.center_point();
        let reference = match origin {
            Some((ox, oy)) => self.translate_to_given_origin(center, Origin::Center, Origin::Center, ox, oy),
            None => Point::new(g.left, g.top),
        };
        let rotated = if g.angle != 0.0 { point.rotate_around(center, -g.angle.to_radians()) } else { point };
        rotated - reference
    }

    /// The `left`/`top` that put the `(origin_x, origin_y)` point at `pos`.
    #[must_use]
    fn position_by_origin(&self, pos: Point, origin_x: Origin, origin_y: Origin) -> Point {
        let g = self.geometry();
        let center = self.translate_to_center_point(pos, origin_x, origin_y);
        self.translate_to_origin_point(center, g.origin_x, g.origin_y)
    }

    /// Scale, flip and skew part of the own matrix.
    #[must_use]
    fn dimensions_transform(&self, skew_x: f64, skew_y: f64, flipping: bool) -> Matrix {
        let g = self.geometry();
        dimensions_matrix(g.scale_x, g.scale_y, flipping && g.flip_x, flipping && g.flip_y, skew_x, skew_y)
    }

    /// `translate(center) · rotate(angle) · dimensions`, memoized.
    #[must_use]
    fn calc_own_matrix(&self) -> Matrix {
        let key = self.transform_key();
        if let Some((cached, m)) = self.own_matrix_memo().get() {
            if cached == key {
                return m;
            }
        }
        let g = self.geometry();
        let center = self.center_point();
        let mut m = Matrix::translate(center.x, center.y);
        if g.angle != 0.0 {
            m = multiply(&m, &Matrix::rotate(g.angle), false);
        }
        m = multiply(&m, &self.dimensions_transform(g.skew_x, g.skew_y, true), false);
        self.own_matrix_memo().set(Some((key, m)));
        m
    }
}

impl Transformable for Entity {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn stroke_width(&self) -> f64 {
        self.style.stroke_width
    }

    fn min_scale_limit(&self) -> f64 {
        self.behavior.min_scale_limit
    }

    fn own_matrix_memo(&self) -> &Cell<Option<(TransformKey, Matrix)>> {
        &self.own_matrix_memo
    }
}

impl Entity {
    /// Drop both memoized matrices.
    pub fn clear_matrix_memo(&self) {
        self.own_matrix_memo.set(None);
        self.full_matrix_memo.set(None);
    }
}

// =============================================================
// Store-level transforms (walk the group chain)
// =============================================================

impl ObjectStore {
    /// Matrix mapping `id`'s local plane to the scene plane, memoized per
    /// entity on its own fingerprint plus the parent matrix.
    ///
    /// Unknown ids yield the identity.
    #[must_use]
    pub fn calc_transform_matrix(&self, id: &ObjectId) -> Matrix {
        let Some(entity) = self.get(id) else {
            return Matrix::IDENTITY;
        };
        let parent = self.parent_matrix(id);
        let key = entity.transform_key();
        if let Some((cached, cached_parent, m)) = entity.full_matrix_memo.get() {
            if cached == key && cached_parent == parent {
                return m;
            }
        }
        let m = multiply(&parent, &entity.calc_own_matrix(), false);
        entity.full_matrix_memo.set(Some((key, parent, m)));
        m
    }

    /// Full matrix of the owning group, or identity at the top level.
    #[must_use]
    pub fn parent_matrix(&self, id: &ObjectId) -> Matrix {
        self.get(id)
            .and_then(|e| e.group)
            .map_or(Matrix::IDENTITY, |group| self.calc_transform_matrix(&group))
    }

    /// Product of scales along the group chain.
    #[must_use]
    pub fn object_scaling(&self, id: &ObjectId) -> Point {
        let Some(entity) = self.get(id) else {
            return Point::new(1.0, 1.0);
        };
        let own = Point::new(entity.geometry.scale_x, entity.geometry.scale_y);
        match entity.group {
            Some(group) => {
                let parent = self.object_scaling(&group);
                Point::new(own.x * parent.x, own.y * parent.y)
            }
            None => own,
        }
    }

    /// Product of opacities along the group chain.
    #[must_use]
    pub fn object_opacity(&self, id: &ObjectId) -> f64 {
        let Some(entity) = self.get(id) else {
            return 1.0;
        };
        entity.opacity * entity.group.map_or(1.0, |g| self.object_opacity(&g))
    }

    /// Sum of angles along the group chain, in degrees.
    #[must_use]
    pub fn total_angle(&self, id: &ObjectId) -> f64 {
        let Some(entity) = self.get(id) else {
            return 0.0;
        };
        entity.geometry.angle + entity.group.map_or(0.0, |g| self.total_angle(&g))
    }

    /// Move `id` so its `(origin_x, origin_y)` point lands on `pos`.
    pub fn set_position_by_origin(&mut self, id: &ObjectId, pos: Point, origin_x: Origin, origin_y: Origin) {
        let Some(entity) = self.get(id) else {
            return;
        };
        let position = entity.position_by_origin(pos, origin_x, origin_y);
        self.set(id, Prop::Left(position.x));
        self.set(id, Prop::Top(position.y));
    }

    /// `id`'s geometry with the group chain baked into its own fields,
    /// leaving the store untouched.
    ///
    /// Decomposition never yields `skew_y`, so a child with a vertical skew
    /// comes out with that skew folded into scale and `skew_x`. The resulting
    /// angle is normalized into `[0, 360)`.
    #[must_use]
    pub fn realized_geometry(&self, id: &ObjectId) -> Option<Geometry> {
        let entity = self.get(id)?;
        let options = decompose(&self.calc_transform_matrix(id));
        let center = Point::new(options.translate_x, options.translate_y);
        let mut detached = Detached {
            geometry: entity.geometry.clone(),
            stroke_width: entity.style.stroke_width,
            min_scale_limit: entity.behavior.min_scale_limit,
            memo: Cell::new(None),
        };
        let scale_x = detached.constrain_scale(options.scale_x);
        let scale_y = detached.constrain_scale(options.scale_y);
        let g = &mut detached.geometry;
        g.flip_x = scale_x < 0.0;
        g.flip_y = scale_y < 0.0;
        g.scale_x = scale_x.abs();
        g.scale_y = scale_y.abs();
        g.skew_x = options.skew_x;
        g.skew_y = options.skew_y;
        g.angle = options.angle.rem_euclid(360.0);
        let position = detached.position_by_origin(center, Origin::Center, Origin::Center);
        detached.geometry.left = position.x;
        detached.geometry.top = position.y;
        Some(detached.geometry)
    }

    /// Bake the group chain into `id`'s own fields so it keeps its scene
    /// appearance once detached.
    pub fn realize_transform(&mut self, id: &ObjectId) {
        let Some(geometry) = self.realized_geometry(id) else {
            return;
        };
        if let Some(entity) = self.get_mut(id) {
            entity.geometry = geometry;
        }
    }
}

/// Geometry detached from any store, for computing derived positions.
struct Detached {
    geometry: Geometry,
    stroke_width: f64,
    min_scale_limit: f64,
    memo: Cell<Option<(TransformKey, Matrix)>>,
}

impl Transformable for Detached {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn stroke_width(&self) -> f64 {
        self.stroke_width
    }

    fn min_scale_limit(&self) -> f64 {
        self.min_scale_limit
    }

    fn own_matrix_memo(&self) -> &Cell<Option<(TransformKey, Matrix)>> {
        &self.memo
    }
}
