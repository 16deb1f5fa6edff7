//! SVG export.
//!
//! Each entity becomes a `<g>` carrying its transform and style, wrapping
//! the shape drawn around the origin the same way the canvas path is
//! traced. Groups nest their children's markup; gradients go into one
//! `<defs>` block. Pattern paints export as `none`.

#[cfg(test)]
#[path = "svg_test.rs"]
mod svg_test;

use crate::doc::{Entity, EntityKind, FillRule, GradientKind, LineCap, LineJoin, ObjectId, ObjectStore, Paint};
use crate::matrix::format_number;
use crate::scene::Scene;
use crate::transform::Transformable;

/// Post-processes each object's markup before it is written.
pub type Reviver<'a> = &'a dyn Fn(String) -> String;

struct SvgWriter<'a> {
    store: &'a ObjectStore,
    digits: u32,
    defs: String,
    reviver: Option<Reviver<'a>>,
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn line_cap_name(cap: LineCap) -> &'static str {
    match cap {
        LineCap::Butt => "butt",
        LineCap::Round => "round",
        LineCap::Square => "square",
    }
}

fn line_join_name(join: LineJoin) -> &'static str {
    match join {
        LineJoin::Miter => "miter",
        LineJoin::Round => "round",
        LineJoin::Bevel => "bevel",
    }
}

impl SvgWriter<'_> {
    fn num(&self, value: f64) -> String {
        format_number(value, self.digits)
    }

    /// Paint reference for a style attribute, emitting gradient defs.
    fn paint(&mut self, paint: Option<&Paint>, entity: &Entity, slot: &str) -> String {
        match paint {
            None | Some(Paint::Pattern(_)) => "none".to_owned(),
            Some(Paint::Solid(color)) => escape_xml(color),
            Some(Paint::Gradient(gradient)) => {
                let id = format!("SVGID_{}_{slot}", entity.id.simple());
                let offset_x = -entity.geometry.width / 2.0;
                let offset_y = -entity.geometry.height / 2.0;
                let open = match gradient.kind {
                    GradientKind::Linear { x1, y1, x2, y2 } => format!(
                        "<linearGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\">",
                        self.num(x1 + offset_x),
                        self.num(y1 + offset_y),
                        self.num(x2 + offset_x),
                        self.num(y2 + offset_y),
                    ),
                    GradientKind::Radial { x1, y1, r1, x2, y2, r2 } => format!(
                        "<radialGradient id=\"{id}\" gradientUnits=\"userSpaceOnUse\" cx=\"{}\" cy=\"{}\" r=\"{}\" fx=\"{}\" fy=\"{}\" fr=\"{}\">",
                        self.num(x2 + offset_x),
                        self.num(y2 + offset_y),
                        self.num(r2),
                        self.num(x1 + offset_x),
                        self.num(y1 + offset_y),
                        self.num(r1),
                    ),
                };
                let close = match gradient.kind {
                    GradientKind::Linear { .. } => "</linearGradient>",
                    GradientKind::Radial { .. } => "</radialGradient>",
                };
                let mut markup = open;
                for stop in &gradient.color_stops {
                    markup.push_str(&format!(
                        "\n<stop offset=\"{}%\" style=\"stop-color:{};\"/>",
                        self.num(stop.offset * 100.0),
                        escape_xml(&stop.color)
                    ));
                }
                markup.push('\n');
                markup.push_str(close);
                markup.push('\n');
                self.defs.push_str(&markup);
                format!("url(#{id})")
            }
        }
    }

    fn styles(&mut self, entity: &Entity) -> String {
        let style = &entity.style;
        let stroke = self.paint(style.stroke.as_ref(), entity, "stroke");
        let fill = self.paint(style.fill.as_ref(), entity, "fill");
        let dash = if style.stroke_dash_array.is_empty() {
            "none".to_owned()
        } else {
            style.stroke_dash_array.iter().map(|d| self.num(*d)).collect::<Vec<_>>().join(" ")
        };
        let rule = match style.fill_rule {
            FillRule::Nonzero => "nonzero",
            FillRule::Evenodd => "evenodd",
        };
        let visibility = if entity.visible { "" } else { " visibility: hidden;" };
        format!(
            "stroke: {stroke}; stroke-width: {}; stroke-dasharray: {dash}; stroke-linecap: {}; stroke-dashoffset: {}; stroke-linejoin: {}; stroke-miterlimit: {}; fill: {fill}; fill-rule: {rule}; opacity: {};{visibility}",
            self.num(style.stroke_width),
            line_cap_name(style.stroke_line_cap),
            self.num(style.stroke_dash_offset),
            line_join_name(style.stroke_line_join),
            self.num(style.stroke_miter_limit),
            self.num(entity.opacity),
        )
    }

    /// The shape element, centered on the origin.
    fn shape(&mut self, entity: &Entity) -> String {
        let g = &entity.geometry;
        let (w, h) = (g.width, g.height);
        match &entity.kind {
            EntityKind::Rect { rx, ry } => format!(
                "<rect x=\"{}\" y=\"{}\" rx=\"{}\" ry=\"{}\" width=\"{}\" height=\"{}\" />\n",
                self.num(-w / 2.0),
                self.num(-h / 2.0),
                self.num(*rx),
                self.num(*ry),
                self.num(w),
                self.num(h),
            ),
            EntityKind::Ellipse { rx, ry } => {
                format!("<ellipse cx=\"0\" cy=\"0\" rx=\"{}\" ry=\"{}\" />\n", self.num(*rx), self.num(*ry))
            }
            EntityKind::Circle { radius } => format!("<circle cx=\"0\" cy=\"0\" r=\"{}\" />\n", self.num(*radius)),
            EntityKind::Triangle => format!(
                "<polygon points=\"{},{} 0,{} {},{}\" />\n",
                self.num(-w / 2.0),
                self.num(h / 2.0),
                self.num(-h / 2.0),
                self.num(w / 2.0),
                self.num(h / 2.0),
            ),
            EntityKind::Polygon { points, path_offset, closed } => {
                let list: Vec<String> = points
                    .iter()
                    .map(|p| format!("{},{}", self.num(p.x - path_offset.x), self.num(p.y - path_offset.y)))
                    .collect();
                let tag = if *closed { "polygon" } else { "polyline" };
                format!("<{tag} points=\"{}\" />\n", list.join(" "))
            }
            EntityKind::Image(image) => format!(
                "<image xlink:href=\"{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" preserveAspectRatio=\"none\" />\n",
                escape_xml(&image.src),
                self.num(-w / 2.0),
                self.num(-h / 2.0),
                self.num(w),
                self.num(h),
            ),
            EntityKind::Group(data) => {
                let children = data.children.clone();
                children.iter().map(|c| self.object(c, false)).collect()
            }
        }
    }

    /// Markup for `id`. Top-level objects carry their full transform so
    /// active selection members land where they are drawn.
    fn object(&mut self, id: &ObjectId, top_level: bool) -> String {
        let store = self.store;
        let Some(entity) = store.get(id) else {
            return String::new();
        };
        let m = if top_level { store.calc_transform_matrix(id) } else { entity.calc_own_matrix() };
        let transform = m.to_svg(self.digits);
        let markup = if entity.is_group() {
            format!("<g transform=\"{transform}\">\n{}</g>\n", self.shape(entity))
        } else {
            let styles = self.styles(entity);
            format!("<g transform=\"{transform}\" style=\"{styles}\">\n{}</g>\n", self.shape(entity))
        };
        match self.reviver {
            Some(reviver) => reviver(markup),
            None => markup,
        }
    }
}

/// Markup fragment for one entity.
#[must_use]
pub fn entity_svg(scene: &Scene, id: &ObjectId, reviver: Option<Reviver<'_>>) -> String {
    let mut writer =
        SvgWriter { store: scene.store(), digits: scene.options().num_fraction_digits, defs: String::new(), reviver };
    let body = writer.object(id, true);
    if writer.defs.is_empty() { body } else { format!("<defs>\n{}</defs>\n{body}", writer.defs) }
}

/// A standalone SVG document of the whole scene, framed by the viewport.
#[must_use]
pub fn to_svg(scene: &Scene, reviver: Option<Reviver<'_>>) -> String {
    let options = scene.options();
    let mut writer = SvgWriter { store: scene.store(), digits: options.num_fraction_digits, defs: String::new(), reviver };
    let vpt = scene.viewport_transform();
    let body: String = scene.objects().iter().map(|id| writer.object(id, true)).collect();
    let view_box = format!(
        "{} {} {} {}",
        writer.num(-vpt.0[4] / vpt.0[0]),
        writer.num(-vpt.0[5] / vpt.0[3]),
        writer.num(options.width / vpt.0[0]),
        writer.num(options.height / vpt.0[3]),
    );
    let background = options.background_color.as_ref().map_or(String::new(), |color| {
        format!(
            "<rect x=\"0\" y=\"0\" width=\"100%\" height=\"100%\" fill=\"{}\"></rect>\n",
            escape_xml(color)
        )
    });
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n\
         <svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" version=\"1.1\" \
         width=\"{}\" height=\"{}\" viewBox=\"{view_box}\" xml:space=\"preserve\">\n\
         <desc>Created with easel</desc>\n<defs>\n{}</defs>\n{background}{body}</svg>",
        writer.num(options.width),
        writer.num(options.height),
        writer.defs,
    )
}
