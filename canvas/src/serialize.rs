//! Object and scene payloads: export to JSON and asynchronous re-creation.
//!
//! [`ObjectPayload`] is the flat, camelCase field map of one entity, with a
//! `type` tag and, for groups, the child payloads under `objects`. Numbers
//! are rounded to the scene's fraction-digit setting on export. Every field
//! is defaulted, so partial payloads load.
//!
//! Loading is asynchronous because images and pattern sources must be
//! fetched first. Sibling payloads load concurrently through
//! [`futures::future::join_all`]; a payload that fails is logged and left
//! out, and never aborts the batch. A pattern that fails to load drops the
//! paint but keeps the object.

#[cfg(test)]
#[path = "serialize_test.rs"]
mod serialize_test;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{LocalBoxFuture, join_all};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::consts::PAYLOAD_VERSION;
use crate::doc::{
    Entity, EntityKind, FillRule, Geometry, Gradient, GroupData, GroupRole, ImageData, ImageHandle, LineCap,
    LineJoin, ObjectId, Origin, Paint, PaintFirst, Pattern, Shadow,
};
use crate::error::{LoadError, PayloadError};
use crate::matrix::to_fixed;
use crate::point::Point;
use crate::scene::Scene;

// =============================================================
// Payload types
// =============================================================

/// An origin as written in payloads: a keyword or a fraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OriginValue {
    Keyword(String),
    Fraction(f64),
}

impl OriginValue {
    fn from_origin(origin: Origin, start: &str, end: &str) -> Self {
        match origin {
            Origin::Start => Self::Keyword(start.to_owned()),
            Origin::Center => Self::Keyword("center".to_owned()),
            Origin::End => Self::Keyword(end.to_owned()),
            Origin::Fraction(v) => Self::Fraction(v),
        }
    }

    fn to_origin(&self, start: &str, end: &str) -> Result<Origin, PayloadError> {
        match self {
            Self::Keyword(k) if k == start => Ok(Origin::Start),
            Self::Keyword(k) if k == "center" => Ok(Origin::Center),
            Self::Keyword(k) if k == end => Ok(Origin::End),
            Self::Keyword(k) => {
                Err(PayloadError::InvalidField { field: "origin", reason: format!("unknown keyword {k:?}") })
            }
            Self::Fraction(v) => Ok(Origin::Fraction(*v)),
        }
    }
}

/// A pattern as written in payloads; the image itself is loaded on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternPayload {
    pub source: String,
    #[serde(default = "default_repeat")]
    pub repeat: String,
}

fn default_repeat() -> String {
    "repeat".to_owned()
}

/// A paint as written in payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaintPayload {
    Color(String),
    Gradient(Gradient),
    Pattern(PatternPayload),
}

impl From<&Paint> for PaintPayload {
    fn from(paint: &Paint) -> Self {
        match paint {
            Paint::Solid(color) => Self::Color(color.clone()),
            Paint::Gradient(gradient) => Self::Gradient(gradient.clone()),
            Paint::Pattern(pattern) => {
                Self::Pattern(PatternPayload { source: pattern.source.clone(), repeat: pattern.repeat.clone() })
            }
        }
    }
}

/// One entity, flattened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: String,
    pub origin_x: OriginValue,
    pub origin_y: OriginValue,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub fill: Option<PaintPayload>,
    pub stroke: Option<PaintPayload>,
    pub stroke_width: f64,
    pub stroke_dash_array: Option<Vec<f64>>,
    pub stroke_line_cap: LineCap,
    pub stroke_dash_offset: f64,
    pub stroke_line_join: LineJoin,
    pub stroke_miter_limit: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub angle: f64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub opacity: f64,
    pub shadow: Option<Shadow>,
    pub visible: bool,
    pub fill_rule: FillRule,
    pub paint_first: PaintFirst,
    pub skew_x: f64,
    pub skew_y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ry: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crop_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<Vec<ObjectPayload>>,
}

impl Default for ObjectPayload {
    fn default() -> Self {
        Self {
            kind: "rect".to_owned(),
            version: PAYLOAD_VERSION.to_owned(),
            origin_x: OriginValue::Keyword("left".to_owned()),
            origin_y: OriginValue::Keyword("top".to_owned()),
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            fill: Some(PaintPayload::Color("rgb(0,0,0)".to_owned())),
            stroke: None,
            stroke_width: 1.0,
            stroke_dash_array: None,
            stroke_line_cap: LineCap::Butt,
            stroke_dash_offset: 0.0,
            stroke_line_join: LineJoin::Miter,
            stroke_miter_limit: 4.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            shadow: None,
            visible: true,
            fill_rule: FillRule::Nonzero,
            paint_first: PaintFirst::Fill,
            skew_x: 0.0,
            skew_y: 0.0,
            rx: None,
            ry: None,
            radius: None,
            points: None,
            src: None,
            crop_x: None,
            crop_y: None,
            objects: None,
        }
    }
}

/// A whole scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScenePayload {
    pub version: String,
    pub objects: Vec<ObjectPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
}

impl Default for ScenePayload {
    fn default() -> Self {
        Self { version: PAYLOAD_VERSION.to_owned(), objects: Vec::new(), background: None }
    }
}

// =============================================================
// Export
// =============================================================

/// Payload of `id` and its descendants, numbers rounded to `digits`.
///
/// Members of an active selection are exported with the selection's
/// transform baked in, so the payload describes where they appear.
#[must_use]
pub fn to_object(scene: &Scene, id: &ObjectId, digits: u32) -> Option<ObjectPayload> {
    let store = scene.store();
    let entity = store.get(id)?;
    let in_selection = entity
        .group
        .and_then(|g| store.get(&g))
        .is_some_and(Entity::is_active_selection);
    let geometry = if in_selection { store.realized_geometry(id)? } else { entity.geometry.clone() };
    let mut payload = entity_payload(entity, &geometry, digits);
    if entity.is_group() {
        let children = entity.children().iter().filter_map(|c| to_object(scene, c, digits)).collect();
        payload.objects = Some(children);
    }
    Some(payload)
}

fn entity_payload(entity: &Entity, g: &Geometry, digits: u32) -> ObjectPayload {
    let r = |v: f64| to_fixed(v, digits);
    let style = &entity.style;
    let mut payload = ObjectPayload {
        kind: entity.kind.type_name().to_owned(),
        version: PAYLOAD_VERSION.to_owned(),
        origin_x: OriginValue::from_origin(g.origin_x, "left", "right"),
        origin_y: OriginValue::from_origin(g.origin_y, "top", "bottom"),
        left: r(g.left),
        top: r(g.top),
        width: r(g.width),
        height: r(g.height),
        fill: style.fill.as_ref().map(PaintPayload::from),
        stroke: style.stroke.as_ref().map(PaintPayload::from),
        stroke_width: r(style.stroke_width),
        stroke_dash_array: (!style.stroke_dash_array.is_empty()).then(|| style.stroke_dash_array.clone()),
        stroke_line_cap: style.stroke_line_cap,
        stroke_dash_offset: r(style.stroke_dash_offset),
        stroke_line_join: style.stroke_line_join,
        stroke_miter_limit: r(style.stroke_miter_limit),
        scale_x: r(g.scale_x),
        scale_y: r(g.scale_y),
        angle: r(g.angle),
        flip_x: g.flip_x,
        flip_y: g.flip_y,
        opacity: r(entity.opacity),
        shadow: style.shadow.clone(),
        visible: entity.visible,
        fill_rule: style.fill_rule,
        paint_first: style.paint_first,
        skew_x: r(g.skew_x),
        skew_y: r(g.skew_y),
        ..ObjectPayload::default()
    };
    match &entity.kind {
        EntityKind::Rect { rx, ry } | EntityKind::Ellipse { rx, ry } => {
            payload.rx = Some(r(*rx));
            payload.ry = Some(r(*ry));
        }
        EntityKind::Circle { radius } => payload.radius = Some(r(*radius)),
        EntityKind::Polygon { points, .. } => {
            payload.points = Some(points.iter().map(|p| Point::new(r(p.x), r(p.y))).collect());
        }
        EntityKind::Image(image) => {
            payload.src = Some(image.src.clone());
            payload.crop_x = Some(r(image.crop_x));
            payload.crop_y = Some(r(image.crop_y));
        }
        EntityKind::Triangle | EntityKind::Group(_) => {}
    }
    payload
}

/// Payload of every top-level object, in paint order.
///
/// The transient active selection is not itself exported; its members are.
#[must_use]
pub fn scene_payload(scene: &Scene) -> ScenePayload {
    let digits = scene.options().num_fraction_digits;
    let objects = scene.objects().iter().filter_map(|id| to_object(scene, id, digits)).collect();
    ScenePayload {
        version: PAYLOAD_VERSION.to_owned(),
        objects,
        background: scene.options().background_color.clone(),
    }
}

/// The scene as a JSON document.
pub fn to_json(scene: &Scene) -> Result<String, PayloadError> {
    Ok(serde_json::to_string(&scene_payload(scene))?)
}

// =============================================================
// Loading
// =============================================================

/// Fetches and decodes image sources.
#[async_trait(?Send)]
pub trait ImageLoader {
    async fn load(&self, src: &str) -> Result<ImageHandle, LoadError>;
}

/// An entity and its loaded descendants, not yet in any store.
#[derive(Debug)]
pub struct Enlivened {
    pub entity: Entity,
    pub children: Vec<Enlivened>,
}

impl Enlivened {
    /// Insert the tree into `scene`'s store and add the root on top.
    pub fn add_to(self, scene: &mut Scene) -> ObjectId {
        let Self { mut entity, children } = self;
        let parent = entity.id;
        let ids: Vec<ObjectId> = children.into_iter().map(|c| c.insert_into(scene, parent)).collect();
        if let Some(group) = entity.kind.group_mut() {
            group.children = ids;
        }
        scene.add(entity)
    }

    fn insert_into(self, scene: &mut Scene, group: ObjectId) -> ObjectId {
        let Self { mut entity, children } = self;
        let parent = entity.id;
        let ids: Vec<ObjectId> = children.into_iter().map(|c| c.insert_into(scene, parent)).collect();
        if let Some(data) = entity.kind.group_mut() {
            data.children = ids;
        }
        entity.group = Some(group);
        scene.store_mut().insert(entity)
    }
}

async fn load_paint(payload: Option<&PaintPayload>, loader: &dyn ImageLoader) -> Option<Paint> {
    match payload? {
        PaintPayload::Color(color) => Some(Paint::Solid(color.clone())),
        PaintPayload::Gradient(gradient) => Some(Paint::Gradient(gradient.clone())),
        PaintPayload::Pattern(pattern) => match loader.load(&pattern.source).await {
            Ok(image) => Some(Paint::Pattern(Pattern {
                source: pattern.source.clone(),
                repeat: pattern.repeat.clone(),
                image: Some(image),
            })),
            Err(err) => {
                warn!(source = %pattern.source, error = %err, "pattern dropped");
                None
            }
        },
    }
}

fn build_kind(payload: &ObjectPayload, image: Option<ImageHandle>) -> Result<EntityKind, LoadError> {
    let kind = match payload.kind.as_str() {
        "rect" => EntityKind::Rect { rx: payload.rx.unwrap_or(0.0), ry: payload.ry.unwrap_or(0.0) },
        "ellipse" => EntityKind::Ellipse { rx: payload.rx.unwrap_or(0.0), ry: payload.ry.unwrap_or(0.0) },
        "circle" => EntityKind::Circle { radius: payload.radius.unwrap_or(0.0) },
        "triangle" => EntityKind::Triangle,
        "polygon" | "polyline" => EntityKind::Polygon {
            points: payload.points.clone().unwrap_or_default(),
            path_offset: Point::ORIGIN,
            closed: payload.kind == "polygon",
        },
        "image" => EntityKind::Image(ImageData {
            src: payload.src.clone().unwrap_or_default(),
            crop_x: payload.crop_x.unwrap_or(0.0),
            crop_y: payload.crop_y.unwrap_or(0.0),
            element: image,
        }),
        "group" => EntityKind::Group(GroupData { role: GroupRole::Group, children: Vec::new(), sub_target_check: false }),
        other => return Err(LoadError::UnknownType(other.to_owned())),
    };
    Ok(kind)
}

/// Load every payload concurrently, keeping the ones that succeed in order.
async fn enliven_all(payloads: &[ObjectPayload], loader: &dyn ImageLoader) -> Vec<Enlivened> {
    let results = join_all(payloads.iter().map(|p| from_object(p, loader))).await;
    results
        .into_iter()
        .zip(payloads)
        .filter_map(|(result, payload)| match result {
            Ok(enlivened) => Some(enlivened),
            Err(err) => {
                warn!(kind = %payload.kind, error = %err, "object skipped while loading");
                None
            }
        })
        .collect()
}

/// Re-create an entity (and its children) from a payload.
pub fn from_object<'a>(
    payload: &'a ObjectPayload,
    loader: &'a dyn ImageLoader,
) -> LocalBoxFuture<'a, Result<Enlivened, LoadError>> {
    async move {
        let image = match (payload.kind.as_str(), payload.src.as_deref()) {
            ("image", Some(src)) => Some(loader.load(src).await?),
            _ => None,
        };
        let kind = build_kind(payload, image.clone())?;
        let fill = load_paint(payload.fill.as_ref(), loader).await;
        let stroke = load_paint(payload.stroke.as_ref(), loader).await;
        let children = match &payload.objects {
            Some(objects) if payload.kind == "group" => enliven_all(objects, loader).await,
            _ => Vec::new(),
        };

        let mut entity = Entity::new(kind, payload.width, payload.height);
        if let Some(image) = &image {
            if payload.width == 0.0 && payload.height == 0.0 {
                entity.geometry.width = image.width;
                entity.geometry.height = image.height;
            }
        }
        let g = &mut entity.geometry;
        g.origin_x = payload.origin_x.to_origin("left", "right")?;
        g.origin_y = payload.origin_y.to_origin("top", "bottom")?;
        g.left = payload.left;
        g.top = payload.top;
        g.angle = payload.angle;
        g.skew_x = payload.skew_x;
        g.skew_y = payload.skew_y;
        g.flip_x = payload.flip_x;
        g.flip_y = payload.flip_y;
        entity = entity.with_scale(payload.scale_x, payload.scale_y);

        let style = &mut entity.style;
        style.fill = fill;
        style.stroke = stroke;
        style.stroke_width = payload.stroke_width;
        style.stroke_dash_array = payload.stroke_dash_array.clone().unwrap_or_default();
        style.stroke_dash_offset = payload.stroke_dash_offset;
        style.stroke_line_cap = payload.stroke_line_cap;
        style.stroke_line_join = payload.stroke_line_join;
        style.stroke_miter_limit = payload.stroke_miter_limit;
        style.fill_rule = payload.fill_rule;
        style.paint_first = payload.paint_first;
        style.shadow = payload.shadow.clone();
        entity.opacity = payload.opacity;
        entity.visible = payload.visible;

        Ok(Enlivened { entity, children })
    }
    .boxed_local()
}

/// Replace the scene's content with the objects in `json`.
///
/// Malformed JSON fails the whole call. Objects that fail to load are
/// skipped. Returns the number of top-level objects added.
pub async fn load_from_json(scene: &mut Scene, json: &str, loader: &dyn ImageLoader) -> Result<usize, LoadError> {
    let payload: ScenePayload = serde_json::from_str(json).map_err(PayloadError::from)?;
    let loaded = enliven_all(&payload.objects, loader).await;
    scene.clear();
    let count = loaded.len();
    for tree in loaded {
        tree.add_to(scene);
    }
    if let Some(background) = payload.background {
        scene.set_background_color(Some(background));
    }
    debug!(requested = payload.objects.len(), loaded = count, "scene loaded");
    scene.request_render_all();
    Ok(count)
}
