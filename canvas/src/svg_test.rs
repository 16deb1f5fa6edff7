use super::*;
use crate::config::SceneOptions;
use crate::display_list::RecordingFactory;
use crate::doc::{ColorStop, Gradient, Pattern};
use crate::point::Point;

fn scene() -> Scene {
    Scene::new(SceneOptions::default(), Box::new(RecordingFactory::new())).unwrap()
}

fn rect(width: f64, height: f64, left: f64, top: f64) -> Entity {
    Entity::rect(width, height).at(left, top).with_stroke(None, 0.0)
}

// =============================================================
// Fragments
// =============================================================

#[test]
fn rect_is_centered_under_its_transform() {
    let mut scene = scene();
    let id = scene.add(rect(100.0, 50.0, 50.0, 50.0));
    let svg = entity_svg(&scene, &id, None);
    assert!(svg.starts_with("<g transform=\"matrix(1 0 0 1 100 75)\""));
    assert!(svg.contains("<rect x=\"-50\" y=\"-25\" rx=\"0\" ry=\"0\" width=\"100\" height=\"50\" />"));
    assert!(svg.contains("fill: rgb(0,0,0);"));
    assert!(svg.contains("stroke: none;"));
    assert!(!svg.contains("<defs>"));
}

#[test]
fn shapes_map_to_their_elements() {
    let mut scene = scene();
    let circle = scene.add(Entity::circle(10.0));
    let ellipse = scene.add(Entity::ellipse(6.0, 3.0));
    let triangle = scene.add(Entity::triangle(10.0, 20.0));
    let line = scene.add(Entity::polyline(vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)]));
    assert!(entity_svg(&scene, &circle, None).contains("<circle cx=\"0\" cy=\"0\" r=\"10\" />"));
    assert!(entity_svg(&scene, &ellipse, None).contains("<ellipse cx=\"0\" cy=\"0\" rx=\"6\" ry=\"3\" />"));
    assert!(entity_svg(&scene, &triangle, None).contains("<polygon points=\"-5,10 0,-10 5,10\" />"));
    assert!(entity_svg(&scene, &line, None).contains("<polyline points=\"-5,-5 5,5\" />"));
}

#[test]
fn style_attributes_are_written() {
    let mut scene = scene();
    let mut entity = rect(10.0, 10.0, 0.0, 0.0).with_stroke(Some(Paint::solid("red")), 2.5);
    entity.style.stroke_dash_array = vec![4.0, 2.0];
    entity.opacity = 0.5;
    entity.visible = false;
    let id = scene.add(entity);
    let svg = entity_svg(&scene, &id, None);
    assert!(svg.contains("stroke: red; stroke-width: 2.5; stroke-dasharray: 4 2;"));
    assert!(svg.contains("opacity: 0.5;"));
    assert!(svg.contains("visibility: hidden;"));
}

#[test]
fn text_values_are_escaped() {
    let mut scene = scene();
    let id = scene.add(rect(10.0, 10.0, 0.0, 0.0).with_fill(Some(Paint::solid("\"><script>"))));
    let svg = entity_svg(&scene, &id, None);
    assert!(svg.contains("fill: &quot;&gt;&lt;script&gt;;"));
}

#[test]
fn gradients_become_defs() {
    let mut scene = scene();
    let gradient = Gradient {
        kind: GradientKind::Linear { x1: 0.0, y1: 0.0, x2: 10.0, y2: 0.0 },
        color_stops: vec![
            ColorStop { offset: 0.0, color: "red".to_owned() },
            ColorStop { offset: 1.0, color: "blue".to_owned() },
        ],
    };
    let id = scene.add(rect(10.0, 10.0, 0.0, 0.0).with_fill(Some(Paint::Gradient(gradient))));
    let svg = entity_svg(&scene, &id, None);
    let gradient_id = format!("SVGID_{}_fill", id.simple());
    assert!(svg.starts_with("<defs>\n<linearGradient"));
    assert!(svg.contains(&format!("id=\"{gradient_id}\"")));
    assert!(svg.contains("x1=\"-5\" y1=\"-5\" x2=\"5\" y2=\"-5\""));
    assert!(svg.contains("<stop offset=\"100%\" style=\"stop-color:blue;\"/>"));
    assert!(svg.contains(&format!("fill: url(#{gradient_id});")));
}

#[test]
fn pattern_paint_exports_as_none() {
    let mut scene = scene();
    let pattern = Pattern { source: "tile.png".to_owned(), repeat: "repeat".to_owned(), image: None };
    let id = scene.add(rect(10.0, 10.0, 0.0, 0.0).with_fill(Some(Paint::Pattern(pattern))));
    assert!(entity_svg(&scene, &id, None).contains("fill: none;"));
}

#[test]
fn groups_nest_member_markup() {
    let mut scene = scene();
    let a = scene.add(rect(10.0, 10.0, 0.0, 0.0));
    let b = scene.add(rect(10.0, 10.0, 20.0, 0.0));
    scene.select(&[a, b]);
    let gid = scene.to_group().unwrap();
    let svg = entity_svg(&scene, &gid, None);
    assert!(svg.starts_with("<g transform=\"matrix(1 0 0 1 15 5)\">"));
    assert!(svg.contains("<g transform=\"matrix(1 0 0 1 -10 0)\""));
    assert!(svg.contains("<g transform=\"matrix(1 0 0 1 10 0)\""));
    assert_eq!(svg.matches("<rect").count(), 2);
}

#[test]
fn reviver_rewrites_each_object() {
    let mut scene = scene();
    let id = scene.add(rect(10.0, 10.0, 0.0, 0.0));
    let reviver = |markup: String| format!("<!-- obj -->{markup}");
    let svg = entity_svg(&scene, &id, Some(&reviver));
    assert!(svg.starts_with("<!-- obj --><g"));
}

// =============================================================
// Documents
// =============================================================

#[test]
fn document_frames_the_viewport() {
    let mut scene = scene();
    scene.add(rect(10.0, 10.0, 0.0, 0.0));
    scene.set_background_color(Some("white".to_owned()));
    let svg = to_svg(&scene, None);
    assert!(svg.starts_with("<?xml version=\"1.0\""));
    assert!(svg.contains("width=\"300\" height=\"150\" viewBox=\"0 0 300 150\""));
    assert!(svg.contains("fill=\"white\"></rect>"));
    assert!(svg.ends_with("</svg>"));
}

#[test]
fn zoomed_viewport_shrinks_view_box() {
    let mut scene = scene();
    scene.set_zoom(2.0);
    scene.absolute_pan(Point::new(20.0, 10.0));
    let svg = to_svg(&scene, None);
    assert!(svg.contains("viewBox=\"10 5 150 75\""));
}

#[test]
fn selection_members_carry_the_selection_transform() {
    let mut scene = scene();
    let a = scene.add(rect(10.0, 10.0, 0.0, 0.0));
    let b = scene.add(rect(10.0, 10.0, 20.0, 0.0));
    scene.select(&[a, b]);
    let svg = to_svg(&scene, None);
    assert!(svg.contains("<g transform=\"matrix(1 0 0 1 5 5)\""));
    assert!(svg.contains("<g transform=\"matrix(1 0 0 1 25 5)\""));
}
