#![allow(clippy::float_cmp)]

use super::*;
use crate::display_list::{DrawOp, RecordingContext};
use crate::doc::GroupRole;
use crate::group::create_group;
use crate::matrix::BoundingBox;
use crate::point::Point;

fn rect_store() -> (ObjectStore, ObjectId) {
    let mut store = ObjectStore::new();
    let id = store.insert(Entity::rect(100.0, 50.0).with_stroke(None, 0.0));
    store.set_coords(&id, &Matrix::IDENTITY);
    (store, id)
}

fn render(store: &ObjectStore, id: &ObjectId, vpt: &Matrix) -> Vec<DrawOp> {
    let mut ctx = RecordingContext::new();
    render_controls(store, id, &mut ctx, vpt);
    assert_eq!(ctx.depth(), 0);
    ctx.take_ops()
}

fn stroke_rects(ops: &[DrawOp]) -> Vec<BoundingBox> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::StrokeRect(b) => Some(*b),
            _ => None,
        })
        .collect()
}

// =============================================================
// Single object
// =============================================================

#[test]
fn border_and_nine_handles() {
    let (store, id) = rect_store();
    let ops = render(&store, &id, &Matrix::IDENTITY);
    assert_eq!(ops[1], DrawOp::Transform(Matrix::translate(50.0, 25.0)));
    let rects = stroke_rects(&ops);
    assert_eq!(rects.len(), 10);
    assert_eq!(rects[0], BoundingBox { left: -50.5, top: -25.5, width: 101.0, height: 51.0 });
    assert!(rects[1..].iter().all(|r| r.width == 13.0 && r.height == 13.0));
}

#[test]
fn rotate_stem_is_drawn() {
    let (store, id) = rect_store();
    let ops = render(&store, &id, &Matrix::IDENTITY);
    assert!(ops.contains(&DrawOp::MoveTo(Point::new(0.0, -25.5))));
    assert!(ops.contains(&DrawOp::LineTo(Point::new(0.0, -65.5))));
}

#[test]
fn borders_do_not_scale_with_zoom() {
    let (store, id) = rect_store();
    let ops = render(&store, &id, &Matrix::scale(2.0, 2.0));
    assert_eq!(ops[1], DrawOp::Transform(Matrix::translate(100.0, 50.0)));
    let rects = stroke_rects(&ops);
    assert_eq!(rects[0], BoundingBox { left: -100.5, top: -50.5, width: 201.0, height: 101.0 });
    assert_eq!(rects[1].width, 13.0);
}

#[test]
fn uni_scaling_lock_hides_side_handles() {
    let (mut store, id) = rect_store();
    store.get_mut(&id).unwrap().behavior.locks.uni_scaling = true;
    assert_eq!(stroke_rects(&render(&store, &id, &Matrix::IDENTITY)).len(), 6);
}

#[test]
fn hidden_handle_is_skipped() {
    let (mut store, id) = rect_store();
    store.get_mut(&id).unwrap().controls.set_visible(Control::Mtr, false);
    let ops = render(&store, &id, &Matrix::IDENTITY);
    assert_eq!(stroke_rects(&ops).len(), 9);
    assert!(!ops.contains(&DrawOp::LineTo(Point::new(0.0, -65.5))));
}

#[test]
fn no_controls_leaves_border_only() {
    let (mut store, id) = rect_store();
    store.get_mut(&id).unwrap().controls.has_controls = false;
    assert_eq!(stroke_rects(&render(&store, &id, &Matrix::IDENTITY)).len(), 1);
}

#[test]
fn solid_circle_corners_fill() {
    let (mut store, id) = rect_store();
    {
        let controls = &mut store.get_mut(&id).unwrap().controls;
        controls.corner_style = CornerStyle::Circle;
        controls.transparent_corners = false;
    }
    let ops = render(&store, &id, &Matrix::IDENTITY);
    let fills = ops.iter().filter(|op| matches!(op, DrawOp::Fill(FillRule::Nonzero))).count();
    let arcs = ops.iter().filter(|op| matches!(op, DrawOp::Arc { .. })).count();
    assert_eq!((fills, arcs), (9, 9));
}

#[test]
fn moving_object_dims_its_border() {
    let (mut store, id) = rect_store();
    store.get_mut(&id).unwrap().is_moving = true;
    let ops = render(&store, &id, &Matrix::IDENTITY);
    assert!(ops.contains(&DrawOp::GlobalAlpha(0.4)));
}

// =============================================================
// Active selection
// =============================================================

#[test]
fn selection_members_get_plain_borders() {
    let mut store = ObjectStore::new();
    let a = store.insert(Entity::rect(10.0, 10.0).with_stroke(None, 0.0));
    let b = store.insert(Entity::rect(20.0, 10.0).at(50.0, 0.0).with_stroke(None, 0.0));
    let sel = create_group(&mut store, &[a, b], GroupRole::ActiveSelection, &Matrix::IDENTITY);
    let ops = render(&store, &sel, &Matrix::IDENTITY);
    let rects = stroke_rects(&ops);
    assert_eq!(rects.len(), 12);
    assert!(rects.contains(&BoundingBox { left: -5.5, top: -5.5, width: 11.0, height: 11.0 }));
    assert!(rects.contains(&BoundingBox { left: -10.5, top: -5.5, width: 21.0, height: 11.0 }));
    assert!(ops.contains(&DrawOp::Transform(Matrix::translate(60.0, 5.0))));
}

#[test]
fn unknown_id_draws_nothing() {
    let store = ObjectStore::new();
    assert!(render(&store, &uuid::Uuid::new_v4(), &Matrix::IDENTITY).is_empty());
}
