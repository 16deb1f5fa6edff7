//! Corner coordinates and the geometry predicates built on them.
//!
//! Every entity carries two derived corner sets, recomputed by
//! [`ObjectStore::set_coords`] whenever a transform-affecting field changes:
//!
//! - **absolute** (`aCoords`): the four oriented corners in the scene plane,
//!   used for grouping, culling and containment;
//! - **viewport** (`oCoords`): all nine control points in viewport pixels,
//!   padded, each with a small hit quadrilateral rotated with the entity.
//!
//! Both are computed through the full group chain, so grouped entities and
//! members of an active selection can be hit-tested directly against
//! viewport pointers.

#[cfg(test)]
#[path = "coords_test.rs"]
mod coords_test;

use serde::{Deserialize, Serialize};

use crate::consts::HALF_SQRT_2;
use crate::doc::{Entity, ObjectId, ObjectStore};
use crate::intersection::{polygon_polygon, polygon_rectangle};
use crate::matrix::{self, BoundingBox, Matrix, bounding_box_from_points, decompose, multiply, transform_point};
use crate::point::Point;
use crate::transform::Transformable;

/// One of the nine control points of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Tl,
    Tr,
    Br,
    Bl,
    Ml,
    Mt,
    Mr,
    Mb,
    /// The rotate handle above the top edge.
    Mtr,
}

impl Control {
    pub const ALL: [Self; 9] =
        [Self::Tl, Self::Tr, Self::Br, Self::Bl, Self::Ml, Self::Mt, Self::Mr, Self::Mb, Self::Mtr];

    fn index(self) -> usize {
        match self {
            Self::Tl => 0,
            Self::Tr => 1,
            Self::Br => 2,
            Self::Bl => 3,
            Self::Ml => 4,
            Self::Mt => 5,
            Self::Mr => 6,
            Self::Mb => 7,
            Self::Mtr => 8,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Tl => "tl",
            Self::Tr => "tr",
            Self::Br => "br",
            Self::Bl => "bl",
            Self::Ml => "ml",
            Self::Mt => "mt",
            Self::Mr => "mr",
            Self::Mb => "mb",
            Self::Mtr => "mtr",
        }
    }

    /// Edge midpoints, which scale one axis only.
    #[must_use]
    pub fn is_side(self) -> bool {
        matches!(self, Self::Ml | Self::Mt | Self::Mr | Self::Mb)
    }
}

// =============================================================
// Quadrilaterals
// =============================================================

/// Four oriented corners.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Quad {
    pub tl: Point,
    pub tr: Point,
    pub br: Point,
    pub bl: Point,
}

impl Quad {
    /// Corners in drawing order.
    #[must_use]
    pub fn points(&self) -> [Point; 4] {
        [self.tl, self.tr, self.br, self.bl]
    }

    /// The four edges as `(origin, destination)` pairs.
    #[must_use]
    pub fn lines(&self) -> [(Point, Point); 4] {
        [(self.tl, self.tr), (self.tr, self.br), (self.br, self.bl), (self.bl, self.tl)]
    }

    /// Even-odd ray test: a horizontal ray from `point` crosses an odd number of edges.
    #[must_use]
    pub fn contains_point(&self, point: Point) -> bool {
        let crossings = find_cross_points(point, &self.lines());
        crossings % 2 == 1
    }

    #[must_use]
    pub fn bounding_rect(&self) -> BoundingBox {
        bounding_box_from_points(&self.points(), None)
    }

    /// Any edge crosses the rectangle spanned by `tl`/`br`.
    #[must_use]
    pub fn intersects_rect(&self, tl: Point, br: Point) -> bool {
        polygon_rectangle(&self.points(), tl, br).is_intersection()
    }

    /// The bounding box lies entirely inside the rectangle spanned by `tl`/`br`.
    #[must_use]
    pub fn is_contained_within_rect(&self, tl: Point, br: Point) -> bool {
        let b = self.bounding_rect();
        b.left >= tl.x && b.left + b.width <= br.x && b.top >= tl.y && b.top + b.height <= br.y
    }

    #[must_use]
    pub fn intersects_quad(&self, other: &Self) -> bool {
        polygon_polygon(&self.points(), &other.points()).is_intersection()
    }

    /// Every corner lies inside `other`.
    #[must_use]
    pub fn is_contained_within_quad(&self, other: &Self) -> bool {
        self.points().iter().all(|p| other.contains_point(*p))
    }
}

/// Count edge crossings of a horizontal ray cast rightwards from `point`.
///
/// Stops counting at two, which is enough to tell odd from even for a convex
/// quadrilateral.
#[must_use]
pub fn find_cross_points(point: Point, lines: &[(Point, Point)]) -> usize {
    let mut count = 0;
    for (o, d) in lines {
        // Edge entirely below or entirely above the ray.
        if o.y < point.y && d.y < point.y {
            continue;
        }
        if o.y >= point.y && d.y >= point.y {
            continue;
        }
        let xi = if o.x == d.x {
            o.x
        } else {
            let slope = (d.y - o.y) / (d.x - o.x);
            let intercept = o.y - slope * o.x;
            (point.y - intercept) / slope
        };
        if xi >= point.x {
            count += 1;
        }
        if count == 2 {
            break;
        }
    }
    count
}

// =============================================================
// Stored coordinates
// =============================================================

/// A control point and its hit quadrilateral, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlPoint {
    pub position: Point,
    pub corner: Quad,
}

/// All nine control points in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewportCoords {
    points: [ControlPoint; 9],
}

impl ViewportCoords {
    #[must_use]
    pub fn get(&self, control: Control) -> ControlPoint {
        self.points[control.index()]
    }

    #[must_use]
    pub fn position(&self, control: Control) -> Point {
        self.get(control).position
    }

    /// The padded outline.
    #[must_use]
    pub fn quad(&self) -> Quad {
        Quad {
            tl: self.position(Control::Tl),
            tr: self.position(Control::Tr),
            br: self.position(Control::Br),
            bl: self.position(Control::Bl),
        }
    }
}

/// Cached corner sets on an entity. `None` until first computed.
#[derive(Debug, Clone, Default)]
pub struct EntityCoords {
    pub(crate) absolute: Option<Quad>,
    pub(crate) viewport: Option<ViewportCoords>,
}

impl Entity {
    /// Last computed corners: scene plane when `absolute`, else viewport.
    #[must_use]
    pub fn get_coords(&self, absolute: bool) -> Option<Quad> {
        if absolute { self.coords.absolute } else { self.coords.viewport.map(|v| v.quad()) }
    }

    /// Last computed control points in viewport pixels.
    #[must_use]
    pub fn viewport_coords(&self) -> Option<&ViewportCoords> {
        self.coords.viewport.as_ref()
    }

    /// Axis-aligned bounds of the last computed corners.
    #[must_use]
    pub fn bounding_rect(&self, absolute: bool) -> Option<BoundingBox> {
        self.get_coords(absolute).map(|q| q.bounding_rect())
    }

    #[must_use]
    pub fn contains_point(&self, point: Point, absolute: bool) -> bool {
        self.get_coords(absolute).is_some_and(|q| q.contains_point(point))
    }

    #[must_use]
    pub fn intersects_with_rect(&self, tl: Point, br: Point, absolute: bool) -> bool {
        self.get_coords(absolute).is_some_and(|q| q.intersects_rect(tl, br))
    }

    #[must_use]
    pub fn is_contained_within_rect(&self, tl: Point, br: Point, absolute: bool) -> bool {
        self.get_coords(absolute).is_some_and(|q| q.is_contained_within_rect(tl, br))
    }

    #[must_use]
    pub fn intersects_with_object(&self, other: &Entity, absolute: bool) -> bool {
        match (self.get_coords(absolute), other.get_coords(absolute)) {
            (Some(a), Some(b)) => a.intersects_quad(&b),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_contained_within_object(&self, other: &Entity, absolute: bool) -> bool {
        match (self.get_coords(absolute), other.get_coords(absolute)) {
            (Some(a), Some(b)) => a.is_contained_within_quad(&b),
            _ => false,
        }
    }

    /// Any part of the entity falls inside the visible scene rectangle
    /// `tl`/`br`, or the entity covers its center.
    #[must_use]
    pub fn is_on_screen(&self, tl: Point, br: Point) -> bool {
        let Some(quad) = self.coords.absolute else {
            return false;
        };
        let inside = |p: &Point| p.x <= br.x && p.x >= tl.x && p.y <= br.y && p.y >= tl.y;
        if quad.points().iter().any(inside) {
            return true;
        }
        if quad.intersects_rect(tl, br) {
            return true;
        }
        quad.contains_point(tl.mid_point_from(br))
    }
}

// =============================================================
// Computation
// =============================================================

/// `parent · translate(center) · rotate(angle)`: the frame the transformed
/// dimensions are laid out in.
fn start_matrix(store: &ObjectStore, id: &ObjectId, entity: &Entity) -> Matrix {
    let center = entity.center_point();
    let mut m = Matrix::translate(center.x, center.y);
    if entity.geometry.angle != 0.0 {
        m = multiply(&m, &Matrix::rotate(entity.geometry.angle), false);
    }
    multiply(&store.parent_matrix(id), &m, false)
}

fn half_box(entity: &Entity) -> [Point; 4] {
    let dim = entity.transformed_dimensions();
    let w = dim.x / 2.0;
    let h = dim.y / 2.0;
    [Point::new(-w, -h), Point::new(w, -h), Point::new(w, h), Point::new(-w, h)]
}

/// Oriented corners of `entity` in the scene plane.
#[must_use]
pub fn calc_absolute_coords(store: &ObjectStore, id: &ObjectId) -> Option<Quad> {
    let entity = store.get(id)?;
    let m = start_matrix(store, id, entity);
    let [tl, tr, br, bl] = half_box(entity).map(|p| transform_point(p, &m, false));
    Some(Quad { tl, tr, br, bl })
}

/// Padded control points of `entity` in viewport pixels under `vpt`.
#[must_use]
pub fn calc_viewport_coords(store: &ObjectStore, id: &ObjectId, vpt: &Matrix) -> Option<ViewportCoords> {
    let entity = store.get(id)?;
    let m = multiply(vpt, &start_matrix(store, id, entity), false);
    let [mut tl, mut tr, mut br, mut bl] = half_box(entity).map(|p| transform_point(p, &m, false));

    let angle = decompose(&m).angle;
    let theta = angle.to_radians();
    let cos = matrix::cos(theta);
    let sin = matrix::sin(theta);
    let padding = entity.controls.padding;
    if padding != 0.0 {
        let cos_p = cos * padding;
        let sin_p = sin * padding;
        let sum = cos_p + sin_p;
        let diff = cos_p - sin_p;
        tl += Point::new(-diff, -sum);
        tr += Point::new(sum, -diff);
        bl += Point::new(-sum, diff);
        br += Point::new(diff, sum);
    }

    let ml = tl.mid_point_from(bl);
    let mt = tr.mid_point_from(tl);
    let mr = br.mid_point_from(tr);
    let mb = br.mid_point_from(bl);
    let offset = entity.controls.rotating_point_offset;
    let mtr = Point::new(mt.x + sin * offset, mt.y - cos * offset);

    let corner_theta = (45.0 - angle).to_radians();
    let hyp = entity.controls.corner_size * HALF_SQRT_2;
    let cos_half = hyp * matrix::cos(corner_theta);
    let sin_half = hyp * matrix::sin(corner_theta);
    let corner = |p: Point| Quad {
        tl: Point::new(p.x - sin_half, p.y - cos_half),
        tr: Point::new(p.x + cos_half, p.y - sin_half),
        br: Point::new(p.x + sin_half, p.y + cos_half),
        bl: Point::new(p.x - cos_half, p.y + sin_half),
    };

    let positions = [tl, tr, br, bl, ml, mt, mr, mb, mtr];
    Some(ViewportCoords { points: positions.map(|position| ControlPoint { position, corner: corner(position) }) })
}

impl ObjectStore {
    /// Recompute both corner sets of `id` and of every descendant.
    pub fn set_coords(&mut self, id: &ObjectId, vpt: &Matrix) {
        let absolute = calc_absolute_coords(self, id);
        let viewport = calc_viewport_coords(self, id, vpt);
        let children = match self.get_mut(id) {
            Some(entity) => {
                entity.coords = EntityCoords { absolute, viewport };
                entity.children().to_vec()
            }
            None => return,
        };
        for child in &children {
            self.set_coords(child, vpt);
        }
    }

    /// Bounding box of `id`, either from stored corners or freshly computed.
    #[must_use]
    pub fn bounding_rect(&self, id: &ObjectId, absolute: bool, calculate: bool, vpt: &Matrix) -> Option<BoundingBox> {
        if !calculate {
            return self.get(id)?.bounding_rect(absolute);
        }
        let quad = if absolute {
            calc_absolute_coords(self, id)?
        } else {
            calc_viewport_coords(self, id, vpt)?.quad()
        };
        Some(quad.bounding_rect())
    }
}
