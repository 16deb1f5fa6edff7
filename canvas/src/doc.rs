//! Document model: entities, their typed properties, and the in-memory store.
//!
//! This module defines what lives in a scene: the [`Entity`] record (one per
//! drawable node, groups included), the closed [`EntityKind`] set of shapes,
//! paint and style values, and the [`Prop`] enumeration used for every
//! tracked mutation. [`ObjectStore`] owns all live entities, keyed by id.
//!
//! Ownership runs one way. A group owns its children through the id list in
//! [`GroupData::children`]; a child only carries a non-owning
//! [`Entity::group`] back-reference that the store keeps in sync.
//!
//! DESIGN
//! ======
//! Mutations that affect rendering go through [`ObjectStore::set`], which
//! normalizes the value (scale sign folded into flips, zero scale clamped),
//! marks the entity's cache dirty when a cache property changes, and
//! propagates dirtiness to the owning group when that group draws from a
//! combined cache. Plain public fields exist for reads and for the handful of
//! interaction flags that never affect pixels.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::cell::Cell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cache::RenderCache;
use crate::consts::{CORNER_SIZE, ROTATING_POINT_OFFSET};
use crate::coords::{Control, EntityCoords};
use crate::matrix::{Matrix, bounding_box_from_points};
use crate::point::Point;
use crate::transform::{TransformKey, Transformable};

/// Unique identifier for an entity.
pub type ObjectId = Uuid;

// =============================================================
// Origins
// =============================================================

/// Anchor along one axis: which point of the box `left`/`top` refer to.
///
/// `Start` is left (x) or top (y), `End` is right (x) or bottom (y), and
/// `Fraction` is a position in `0.0..=1.0` along the box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Origin {
    #[default]
    Start,
    Center,
    End,
    Fraction(f64),
}

impl Origin {
    /// Offset of this origin from the box center, in units of the box size.
    #[must_use]
    pub fn offset(self) -> f64 {
        match self {
            Self::Start => -0.5,
            Self::Center => 0.0,
            Self::End => 0.5,
            Self::Fraction(v) => v - 0.5,
        }
    }

    /// Mirror `Start` and `End`; centered and fractional origins are unchanged.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::End => Self::Start,
            other => other,
        }
    }
}

// =============================================================
// Paint and style
// =============================================================

/// A color stop on a gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f64,
    pub color: String,
}

/// Gradient geometry, in the entity's top-left based local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GradientKind {
    Linear { x1: f64, y1: f64, x2: f64, y2: f64 },
    Radial { x1: f64, y1: f64, r1: f64, x2: f64, y2: f64, r2: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(flatten)]
    pub kind: GradientKind,
    #[serde(rename = "colorStops")]
    pub color_stops: Vec<ColorStop>,
}

/// A loaded bitmap the backends can draw, identified by its source key.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageHandle {
    pub key: String,
    pub width: f64,
    pub height: f64,
}

/// An image repeated as a fill or stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub source: String,
    pub repeat: String,
    /// Set once the source has been loaded.
    pub image: Option<ImageHandle>,
}

/// How a region is painted.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    /// Any CSS color string.
    Solid(String),
    Gradient(Gradient),
    Pattern(Pattern),
}

impl Paint {
    #[must_use]
    pub fn solid(color: &str) -> Self {
        Self::Solid(color.to_owned())
    }

    /// Gradients and patterns are positioned relative to the entity's top-left corner.
    #[must_use]
    pub fn is_positioned(&self) -> bool {
        !matches!(self, Self::Solid(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: String,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    pub affect_stroke: bool,
}

impl Default for Shadow {
    fn default() -> Self {
        Self { color: "rgb(0,0,0)".to_owned(), blur: 0.0, offset_x: 0.0, offset_y: 0.0, affect_stroke: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaintFirst {
    #[default]
    Fill,
    Stroke,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    Nonzero,
    Evenodd,
}

/// Paint-related fields of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub fill: Option<Paint>,
    pub stroke: Option<Paint>,
    pub stroke_width: f64,
    pub stroke_dash_array: Vec<f64>,
    pub stroke_dash_offset: f64,
    pub stroke_line_cap: LineCap,
    pub stroke_line_join: LineJoin,
    pub stroke_miter_limit: f64,
    pub paint_first: PaintFirst,
    pub fill_rule: FillRule,
    pub shadow: Option<Shadow>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            fill: Some(Paint::solid("rgb(0,0,0)")),
            stroke: None,
            stroke_width: 1.0,
            stroke_dash_array: Vec::new(),
            stroke_dash_offset: 0.0,
            stroke_line_cap: LineCap::Butt,
            stroke_line_join: LineJoin::Miter,
            stroke_miter_limit: 4.0,
            paint_first: PaintFirst::Fill,
            fill_rule: FillRule::Nonzero,
            shadow: None,
        }
    }
}

impl Style {
    #[must_use]
    pub fn has_fill(&self) -> bool {
        self.fill.is_some()
    }

    #[must_use]
    pub fn has_stroke(&self) -> bool {
        self.stroke.is_some() && self.stroke_width > 0.0
    }
}

// =============================================================
// Controls and behavior
// =============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CornerStyle {
    #[default]
    Rect,
    Circle,
}

/// How the selection border and control handles look.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct ControlStyle {
    pub has_controls: bool,
    pub has_borders: bool,
    pub has_rotating_point: bool,
    /// Distance from the top edge to the rotate handle, in viewport pixels.
    pub rotating_point_offset: f64,
    /// Side of each handle, in viewport pixels.
    pub corner_size: f64,
    /// Gap between the shape and its border, in viewport pixels.
    pub padding: f64,
    pub transparent_corners: bool,
    pub corner_color: String,
    pub corner_stroke_color: Option<String>,
    pub corner_style: CornerStyle,
    pub border_color: String,
    pub border_dash_array: Vec<f64>,
    pub border_scale_factor: f64,
    pub border_opacity_when_moving: f64,
    /// Handles that are neither drawn nor hit-tested.
    pub hidden: Vec<Control>,
}

impl Default for ControlStyle {
    fn default() -> Self {
        Self {
            has_controls: true,
            has_borders: true,
            has_rotating_point: true,
            rotating_point_offset: ROTATING_POINT_OFFSET,
            corner_size: CORNER_SIZE,
            padding: 0.0,
            transparent_corners: true,
            corner_color: "rgba(102,153,255,0.75)".to_owned(),
            corner_stroke_color: None,
            corner_style: CornerStyle::Rect,
            border_color: "rgba(102,153,255,0.75)".to_owned(),
            border_dash_array: Vec::new(),
            border_scale_factor: 1.0,
            border_opacity_when_moving: 0.4,
            hidden: Vec::new(),
        }
    }
}

impl ControlStyle {
    #[must_use]
    pub fn is_visible(&self, control: Control) -> bool {
        !self.hidden.contains(&control)
    }

    /// Show or hide one handle.
    pub fn set_visible(&mut self, control: Control, visible: bool) {
        self.hidden.retain(|c| *c != control);
        if !visible {
            self.hidden.push(control);
        }
    }
}

/// Per-axis interaction locks.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Locks {
    pub movement_x: bool,
    pub movement_y: bool,
    pub rotation: bool,
    pub scaling_x: bool,
    pub scaling_y: bool,
    pub uni_scaling: bool,
    pub skewing_x: bool,
    pub skewing_y: bool,
    pub scaling_flip: bool,
}

/// How an entity responds to pointer interaction.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq)]
pub struct Behavior {
    pub selectable: bool,
    pub evented: bool,
    pub centered_scaling: bool,
    pub centered_rotation: bool,
    /// Rotation snaps to multiples of this many degrees; 0 disables snapping.
    pub snap_angle: f64,
    /// Distance in degrees within which snapping engages; unset or zero means `snap_angle`.
    pub snap_threshold: Option<f64>,
    /// Smallest magnitude a scale may take.
    pub min_scale_limit: f64,
    pub per_pixel_target_find: bool,
    pub hover_cursor: Option<String>,
    pub move_cursor: Option<String>,
    pub locks: Locks,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            selectable: true,
            evented: true,
            centered_scaling: false,
            centered_rotation: true,
            snap_angle: 0.0,
            snap_threshold: None,
            min_scale_limit: 0.0,
            per_pixel_target_find: false,
            hover_cursor: None,
            move_cursor: None,
            locks: Locks::default(),
        }
    }
}

/// Whether and how an entity renders through its own cache surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub object_caching: bool,
    /// Compare cache-relevant fields against the last baked snapshot.
    pub statefull_cache: bool,
    /// Keep the cache surface size fixed while this entity is being scaled.
    pub no_scale_cache: bool,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self { object_caching: true, statefull_cache: false, no_scale_cache: true }
    }
}

// =============================================================
// Kinds
// =============================================================

/// Whether a group is persistent or a transient multi-selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRole {
    Group,
    ActiveSelection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupData {
    pub role: GroupRole,
    /// Paint order, back to front.
    pub children: Vec<ObjectId>,
    /// Hit-testing also resolves the child under the pointer.
    pub sub_target_check: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub src: String,
    pub crop_x: f64,
    pub crop_y: f64,
    /// Set once the source has been loaded.
    pub element: Option<ImageHandle>,
}

/// The closed set of drawable shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// Rectangle with optional rounded corners.
    Rect { rx: f64, ry: f64 },
    Ellipse { rx: f64, ry: f64 },
    Circle { radius: f64 },
    /// Isosceles triangle with its apex at the top center.
    Triangle,
    /// Polygon (`closed`) or polyline, points in their own plane.
    Polygon { points: Vec<Point>, path_offset: Point, closed: bool },
    Image(ImageData),
    Group(GroupData),
}

impl EntityKind {
    /// Type tag used in serialized payloads.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Rect { .. } => "rect",
            Self::Ellipse { .. } => "ellipse",
            Self::Circle { .. } => "circle",
            Self::Triangle => "triangle",
            Self::Polygon { closed: true, .. } => "polygon",
            Self::Polygon { closed: false, .. } => "polyline",
            Self::Image(_) => "image",
            Self::Group(GroupData { role: GroupRole::Group, .. }) => "group",
            Self::Group(GroupData { role: GroupRole::ActiveSelection, .. }) => "activeSelection",
        }
    }

    #[must_use]
    pub fn group(&self) -> Option<&GroupData> {
        match self {
            Self::Group(data) => Some(data),
            _ => None,
        }
    }

    pub fn group_mut(&mut self) -> Option<&mut GroupData> {
        match self {
            Self::Group(data) => Some(data),
            _ => None,
        }
    }
}

/// Bounding box and path offset of a point list.
fn polygon_dimensions(points: &[Point]) -> (f64, f64, Point) {
    let bbox = bounding_box_from_points(points, None);
    (bbox.width, bbox.height, bbox.center())
}

// =============================================================
// Entity
// =============================================================

/// Position, size and transform fields.
///
/// `left`/`top` locate the point selected by `origin_x`/`origin_y`, in the
/// parent's plane (the scene, or the owning group's center-based frame).
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees.
    pub skew_x: f64,
    /// Degrees.
    pub skew_y: f64,
    /// Degrees, clockwise.
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub origin_x: Origin,
    pub origin_y: Origin,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            skew_x: 0.0,
            skew_y: 0.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            origin_x: Origin::Start,
            origin_y: Origin::Start,
        }
    }
}

/// A drawable, transformable node.
#[derive(Debug)]
pub struct Entity {
    pub id: ObjectId,
    pub kind: EntityKind,
    pub geometry: Geometry,
    pub style: Style,
    pub opacity: f64,
    pub visible: bool,
    pub controls: ControlStyle,
    pub behavior: Behavior,
    pub caching: CachePolicy,
    /// Owning group, if this entity is a direct member of one.
    pub group: Option<ObjectId>,
    /// The cache surface must be redrawn before its next use.
    pub dirty: bool,
    /// A drag gesture is moving this entity.
    pub is_moving: bool,
    pub(crate) coords: EntityCoords,
    pub(crate) cache: RenderCache,
    pub(crate) own_matrix_memo: Cell<Option<(TransformKey, Matrix)>>,
    pub(crate) full_matrix_memo: Cell<Option<(TransformKey, Matrix, Matrix)>>,
}

impl Entity {
    /// A new entity of `kind` with every other field at its default.
    ///
    /// Size is derived from the kind where the kind defines it (circles,
    /// ellipses, polygons, loaded images).
    #[must_use]
    pub fn new(kind: EntityKind, width: f64, height: f64) -> Self {
        let mut entity = Self {
            id: Uuid::new_v4(),
            kind,
            geometry: Geometry { width, height, ..Geometry::default() },
            style: Style::default(),
            opacity: 1.0,
            visible: true,
            controls: ControlStyle::default(),
            behavior: Behavior::default(),
            caching: CachePolicy::default(),
            group: None,
            dirty: true,
            is_moving: false,
            coords: EntityCoords::default(),
            cache: RenderCache::default(),
            own_matrix_memo: Cell::new(None),
            full_matrix_memo: Cell::new(None),
        };
        entity.sync_kind_dimensions();
        entity
    }

    #[must_use]
    pub fn rect(width: f64, height: f64) -> Self {
        Self::new(EntityKind::Rect { rx: 0.0, ry: 0.0 }, width, height)
    }

    #[must_use]
    pub fn ellipse(rx: f64, ry: f64) -> Self {
        Self::new(EntityKind::Ellipse { rx, ry }, 0.0, 0.0)
    }

    #[must_use]
    pub fn circle(radius: f64) -> Self {
        Self::new(EntityKind::Circle { radius }, 0.0, 0.0)
    }

    #[must_use]
    pub fn triangle(width: f64, height: f64) -> Self {
        Self::new(EntityKind::Triangle, width, height)
    }

    /// A closed polygon positioned so its points keep their scene positions.
    #[must_use]
    pub fn polygon(points: Vec<Point>) -> Self {
        Self::from_points(points, true)
    }

    #[must_use]
    pub fn polyline(points: Vec<Point>) -> Self {
        Self::from_points(points, false)
    }

    fn from_points(points: Vec<Point>, closed: bool) -> Self {
        let mut entity = Self::new(EntityKind::Polygon { points, path_offset: Point::ORIGIN, closed }, 0.0, 0.0);
        if let EntityKind::Polygon { points, .. } = &entity.kind {
            let bbox = bounding_box_from_points(points, None);
            let half_stroke = entity.style.stroke_width / 2.0;
            entity.geometry.left = bbox.left - half_stroke;
            entity.geometry.top = bbox.top - half_stroke;
        }
        entity
    }

    /// An image entity sized to its loaded element.
    #[must_use]
    pub fn image(src: &str, element: Option<ImageHandle>) -> Self {
        let (width, height) = element.as_ref().map_or((0.0, 0.0), |e| (e.width, e.height));
        let mut entity = Self::new(
            EntityKind::Image(ImageData { src: src.to_owned(), crop_x: 0.0, crop_y: 0.0, element }),
            width,
            height,
        );
        entity.style.fill = None;
        entity.style.stroke_width = 0.0;
        entity
    }

    /// An empty container of the given role.
    #[must_use]
    pub fn group_shell(role: GroupRole) -> Self {
        let mut entity = Self::new(
            EntityKind::Group(GroupData { role, children: Vec::new(), sub_target_check: false }),
            0.0,
            0.0,
        );
        entity.style.fill = None;
        entity.style.stroke_width = 0.0;
        entity
    }

    // --- Builder methods ---

    #[must_use]
    pub fn with_id(mut self, id: ObjectId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.geometry.left = left;
        self.geometry.top = top;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin_x: Origin, origin_y: Origin) -> Self {
        self.geometry.origin_x = origin_x;
        self.geometry.origin_y = origin_y;
        self
    }

    /// Scale, normalized the same way [`Prop::ScaleX`] is.
    #[must_use]
    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.apply(Prop::ScaleX(scale_x));
        self.apply(Prop::ScaleY(scale_y));
        self
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f64) -> Self {
        self.geometry.angle = angle;
        self
    }

    #[must_use]
    pub fn with_skew(mut self, skew_x: f64, skew_y: f64) -> Self {
        self.geometry.skew_x = skew_x;
        self.geometry.skew_y = skew_y;
        self
    }

    #[must_use]
    pub fn with_flip(mut self, flip_x: bool, flip_y: bool) -> Self {
        self.geometry.flip_x = flip_x;
        self.geometry.flip_y = flip_y;
        self
    }

    #[must_use]
    pub fn with_fill(mut self, fill: Option<Paint>) -> Self {
        self.style.fill = fill;
        self
    }

    #[must_use]
    pub fn with_stroke(mut self, stroke: Option<Paint>, width: f64) -> Self {
        self.style.stroke = stroke;
        self.style.stroke_width = width;
        self
    }

    #[must_use]
    pub fn with_shadow(mut self, shadow: Option<Shadow>) -> Self {
        self.style.shadow = shadow;
        self
    }

    #[must_use]
    pub fn with_padding(mut self, padding: f64) -> Self {
        self.controls.padding = padding;
        self
    }

    // --- Queries ---

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.kind, EntityKind::Group(_))
    }

    #[must_use]
    pub fn is_active_selection(&self) -> bool {
        matches!(self.kind, EntityKind::Group(GroupData { role: GroupRole::ActiveSelection, .. }))
    }

    /// Direct children, empty for non-groups.
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        self.kind.group().map_or(&[], |g| g.children.as_slice())
    }

    /// Fully transparent, hidden, or without any extent.
    #[must_use]
    pub fn is_not_visible(&self) -> bool {
        self.opacity == 0.0
            || (self.geometry.width == 0.0 && self.geometry.height == 0.0 && self.style.stroke_width == 0.0)
            || !self.visible
    }

    /// A shadow with a non-zero offset is drawn.
    #[must_use]
    pub fn has_offset_shadow(&self) -> bool {
        self.style.shadow.as_ref().is_some_and(|s| s.offset_x != 0.0 || s.offset_y != 0.0)
    }

    // --- Mutation ---

    /// Apply one property and report what it affected.
    ///
    /// Scale values are constrained away from zero and a negative scale
    /// toggles the matching flip, leaving the stored scale positive.
    pub fn apply(&mut self, prop: Prop) -> PropChange {
        let class = prop.class();
        let changed = match prop {
            Prop::Left(v) => assign(&mut self.geometry.left, v),
            Prop::Top(v) => assign(&mut self.geometry.top, v),
            Prop::Width(v) => assign(&mut self.geometry.width, v),
            Prop::Height(v) => assign(&mut self.geometry.height, v),
            Prop::ScaleX(v) => {
                let v = self.constrain_scale(v);
                if v < 0.0 {
                    self.geometry.flip_x = !self.geometry.flip_x;
                    self.geometry.scale_x = -v;
                    true
                } else {
                    assign(&mut self.geometry.scale_x, v)
                }
            }
            Prop::ScaleY(v) => {
                let v = self.constrain_scale(v);
                if v < 0.0 {
                    self.geometry.flip_y = !self.geometry.flip_y;
                    self.geometry.scale_y = -v;
                    true
                } else {
                    assign(&mut self.geometry.scale_y, v)
                }
            }
            Prop::SkewX(v) => assign(&mut self.geometry.skew_x, v),
            Prop::SkewY(v) => assign(&mut self.geometry.skew_y, v),
            Prop::Angle(v) => assign(&mut self.geometry.angle, v),
            Prop::FlipX(v) => assign(&mut self.geometry.flip_x, v),
            Prop::FlipY(v) => assign(&mut self.geometry.flip_y, v),
            Prop::OriginX(v) => assign(&mut self.geometry.origin_x, v),
            Prop::OriginY(v) => assign(&mut self.geometry.origin_y, v),
            Prop::Opacity(v) => assign(&mut self.opacity, v),
            Prop::Visible(v) => assign(&mut self.visible, v),
            Prop::Fill(v) => assign(&mut self.style.fill, v),
            Prop::Stroke(v) => assign(&mut self.style.stroke, v),
            Prop::StrokeWidth(v) => assign(&mut self.style.stroke_width, v),
            Prop::StrokeDashArray(v) => assign(&mut self.style.stroke_dash_array, v),
            Prop::StrokeLineCap(v) => assign(&mut self.style.stroke_line_cap, v),
            Prop::StrokeLineJoin(v) => assign(&mut self.style.stroke_line_join, v),
            Prop::StrokeMiterLimit(v) => assign(&mut self.style.stroke_miter_limit, v),
            Prop::PaintFirst(v) => assign(&mut self.style.paint_first, v),
            Prop::FillRule(v) => assign(&mut self.style.fill_rule, v),
            Prop::Shadow(v) => assign(&mut self.style.shadow, v),
            Prop::Rx(v) => self.apply_kind_value(v, KindField::Rx),
            Prop::Ry(v) => self.apply_kind_value(v, KindField::Ry),
            Prop::Radius(v) => self.apply_kind_value(v, KindField::Radius),
            Prop::Points(points) => match &mut self.kind {
                EntityKind::Polygon { points: slot, .. } => {
                    let changed = assign(slot, points);
                    self.sync_kind_dimensions();
                    changed
                }
                _ => false,
            },
            Prop::Dirty(v) => {
                self.dirty = v;
                return PropChange { changed: true, class: PropClass::Dirty };
            }
        };
        if changed && class == PropClass::Cache {
            self.dirty = true;
        }
        PropChange { changed, class }
    }

    fn apply_kind_value(&mut self, value: f64, field: KindField) -> bool {
        let changed = match (&mut self.kind, field) {
            (EntityKind::Rect { rx, .. } | EntityKind::Ellipse { rx, .. }, KindField::Rx) => assign(rx, value),
            (EntityKind::Rect { ry, .. } | EntityKind::Ellipse { ry, .. }, KindField::Ry) => assign(ry, value),
            (EntityKind::Circle { radius }, KindField::Radius) => assign(radius, value),
            _ => false,
        };
        self.sync_kind_dimensions();
        changed
    }

    /// Derive width/height from shape parameters for kinds that define them.
    fn sync_kind_dimensions(&mut self) {
        match &mut self.kind {
            EntityKind::Ellipse { rx, ry } => {
                self.geometry.width = *rx * 2.0;
                self.geometry.height = *ry * 2.0;
            }
            EntityKind::Circle { radius } => {
                self.geometry.width = *radius * 2.0;
                self.geometry.height = *radius * 2.0;
            }
            EntityKind::Polygon { points, path_offset, .. } => {
                let (width, height, offset) = polygon_dimensions(points);
                self.geometry.width = width;
                self.geometry.height = height;
                *path_offset = offset;
            }
            EntityKind::Rect { .. } | EntityKind::Triangle | EntityKind::Image(_) | EntityKind::Group(_) => {}
        }
    }
}

#[derive(Clone, Copy)]
enum KindField {
    Rx,
    Ry,
    Radius,
}

fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

// =============================================================
// Props
// =============================================================

/// A single typed property write.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    Left(f64),
    Top(f64),
    Width(f64),
    Height(f64),
    ScaleX(f64),
    ScaleY(f64),
    SkewX(f64),
    SkewY(f64),
    Angle(f64),
    FlipX(bool),
    FlipY(bool),
    OriginX(Origin),
    OriginY(Origin),
    Opacity(f64),
    Visible(bool),
    Fill(Option<Paint>),
    Stroke(Option<Paint>),
    StrokeWidth(f64),
    StrokeDashArray(Vec<f64>),
    StrokeLineCap(LineCap),
    StrokeLineJoin(LineJoin),
    StrokeMiterLimit(f64),
    PaintFirst(PaintFirst),
    FillRule(FillRule),
    Shadow(Option<Shadow>),
    Rx(f64),
    Ry(f64),
    Radius(f64),
    Points(Vec<Point>),
    Dirty(bool),
}

/// What a property influences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropClass {
    /// Changes the pixels inside the entity's own cache surface.
    Cache,
    /// Changes how the entity appears in its parent, but not its cache content.
    State,
    /// The dirty flag itself.
    Dirty,
}

impl Prop {
    #[must_use]
    pub fn class(&self) -> PropClass {
        match self {
            Self::Width(_)
            | Self::Height(_)
            | Self::Fill(_)
            | Self::Stroke(_)
            | Self::StrokeWidth(_)
            | Self::StrokeDashArray(_)
            | Self::StrokeLineCap(_)
            | Self::StrokeLineJoin(_)
            | Self::StrokeMiterLimit(_)
            | Self::PaintFirst(_)
            | Self::FillRule(_)
            | Self::Rx(_)
            | Self::Ry(_)
            | Self::Radius(_)
            | Self::Points(_) => PropClass::Cache,
            Self::Left(_)
            | Self::Top(_)
            | Self::ScaleX(_)
            | Self::ScaleY(_)
            | Self::SkewX(_)
            | Self::SkewY(_)
            | Self::Angle(_)
            | Self::FlipX(_)
            | Self::FlipY(_)
            | Self::OriginX(_)
            | Self::OriginY(_)
            | Self::Opacity(_)
            | Self::Visible(_)
            | Self::Shadow(_) => PropClass::State,
            Self::Dirty(_) => PropClass::Dirty,
        }
    }
}

/// Outcome of [`Entity::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropChange {
    pub changed: bool,
    pub class: PropClass,
}

// =============================================================
// Store
// =============================================================

/// In-memory store of every live entity, top-level or grouped.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<ObjectId, Entity>,
}

impl ObjectStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { objects: HashMap::new() }
    }

    /// Insert or replace an entity, returning its id.
    pub fn insert(&mut self, entity: Entity) -> ObjectId {
        let id = entity.id;
        self.objects.insert(id, entity);
        id
    }

    /// Remove an entity and, for groups, all of its descendants.
    pub fn remove(&mut self, id: &ObjectId) -> Option<Entity> {
        let entity = self.objects.remove(id)?;
        for child in entity.children() {
            self.remove(child);
        }
        Some(entity)
    }

    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<&Entity> {
        self.objects.get(id)
    }

    pub fn get_mut(&mut self, id: &ObjectId) -> Option<&mut Entity> {
        self.objects.get_mut(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of entities currently in the store, grouped ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the store contains no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Direct children of `id`, empty for non-groups and unknown ids.
    #[must_use]
    pub fn children(&self, id: &ObjectId) -> Vec<ObjectId> {
        self.get(id).map(|e| e.children().to_vec()).unwrap_or_default()
    }

    /// Set one property on `id`, propagating cache dirtiness to its group.
    ///
    /// Returns whether the stored value changed. Unknown ids are ignored.
    pub fn set(&mut self, id: &ObjectId, prop: Prop) -> bool {
        let Some(entity) = self.objects.get_mut(id) else {
            return false;
        };
        let change = entity.apply(prop.clone());
        let group = entity.group;
        match change.class {
            PropClass::Dirty => {
                if let (Prop::Dirty(value), Some(group)) = (prop, group) {
                    self.set(&group, Prop::Dirty(value));
                }
            }
            PropClass::Cache | PropClass::State if change.changed => {
                if let Some(group) = group.filter(|g| crate::cache::is_on_a_cache(self, g)) {
                    self.set(&group, Prop::Dirty(true));
                }
            }
            PropClass::Cache | PropClass::State => {}
        }
        change.changed
    }

    /// Set several properties in order; returns whether any changed.
    pub fn set_all(&mut self, id: &ObjectId, props: impl IntoIterator<Item = Prop>) -> bool {
        let mut changed = false;
        for prop in props {
            changed |= self.set(id, prop);
        }
        changed
    }

    /// Ids of all entities, in unspecified order.
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.objects.keys()
    }
}
