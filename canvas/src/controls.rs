//! Selection borders and control handles.
//!
//! Controls are drawn on top of the scene in viewport pixels: the context is
//! moved to the entity's center through the viewport and the full group
//! chain, then rotated, so handle sizes and border widths never scale with
//! zoom. Members of an active selection get a border only, laid out with the
//! accumulated scale and skew of the chain.

#[cfg(test)]
#[path = "controls_test.rs"]
mod controls_test;

use std::f64::consts::PI;

use crate::coords::Control;
use crate::doc::{CornerStyle, Entity, FillRule, ObjectId, ObjectStore, Paint};
use crate::matrix::{Matrix, TransformOptions, decompose, dimensions_matrix, multiply, transform_point};
use crate::render::{Context2d, current_dimensions};
use crate::transform::Transformable;

/// Per-pass overrides of an entity's own control style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ControlsPass {
    has_controls: bool,
    for_active_selection: bool,
}

/// Draw borders and handles for the active object `id`.
///
/// An active selection draws its own frame and handles, then a plain border
/// around each member.
pub fn render_controls(store: &ObjectStore, id: &ObjectId, ctx: &mut dyn Context2d, vpt: &Matrix) {
    let Some(entity) = store.get(id) else {
        return;
    };
    let own = ControlsPass { has_controls: entity.controls.has_controls, for_active_selection: false };
    draw_entity_controls(store, entity, ctx, vpt, own);
    if entity.is_active_selection() {
        let member = ControlsPass { has_controls: false, for_active_selection: true };
        for child in entity.children() {
            if let Some(child) = store.get(child) {
                draw_entity_controls(store, child, ctx, vpt, member);
            }
        }
    }
}

fn draw_entity_controls(
    store: &ObjectStore,
    entity: &Entity,
    ctx: &mut dyn Context2d,
    vpt: &Matrix,
    pass: ControlsPass,
) {
    let m = multiply(vpt, &store.calc_transform_matrix(&entity.id), false);
    let options = decompose(&m);
    ctx.save();
    ctx.translate(options.translate_x, options.translate_y);
    ctx.set_line_width(entity.controls.border_scale_factor);
    if entity.group.is_none() {
        ctx.set_global_alpha(if entity.is_moving { entity.controls.border_opacity_when_moving } else { 1.0 });
    }
    if pass.for_active_selection {
        ctx.rotate(options.angle.to_radians());
        if entity.controls.has_borders {
            draw_borders_in_group(entity, ctx, &options);
        }
    } else {
        ctx.rotate(entity.geometry.angle.to_radians());
        if entity.controls.has_borders {
            draw_borders(entity, ctx, vpt, pass.has_controls);
        }
    }
    if pass.has_controls {
        draw_controls(entity, ctx, vpt);
    }
    ctx.restore();
}

fn set_border_style(entity: &Entity, ctx: &mut dyn Context2d) {
    ctx.set_stroke_paint(&Paint::solid(&entity.controls.border_color));
    ctx.set_line_dash(&entity.controls.border_dash_array);
}

/// Padded border plus the stem up to the rotate handle.
fn draw_borders(entity: &Entity, ctx: &mut dyn Context2d, vpt: &Matrix, has_controls: bool) {
    let controls = &entity.controls;
    let wh = current_dimensions(entity, vpt);
    let stroke_width = 1.0 / controls.border_scale_factor;
    let width = wh.x + stroke_width;
    let height = wh.y + stroke_width;
    ctx.save();
    set_border_style(entity, ctx);
    ctx.stroke_rect(-width / 2.0, -height / 2.0, width, height);
    if controls.has_rotating_point
        && controls.is_visible(Control::Mtr)
        && !entity.behavior.locks.rotation
        && has_controls
    {
        let rotate_height = -height / 2.0;
        ctx.begin_path();
        ctx.move_to(0.0, rotate_height);
        ctx.line_to(0.0, rotate_height - controls.rotating_point_offset);
        ctx.stroke();
    }
    ctx.restore();
}

/// Border of an active selection member, sized by the decomposed chain.
fn draw_borders_in_group(entity: &Entity, ctx: &mut dyn Context2d, options: &TransformOptions) {
    let p = entity.non_transformed_dimensions();
    let m = dimensions_matrix(options.scale_x, options.scale_y, false, false, options.skew_x, 0.0);
    let wh = transform_point(p, &m, false);
    let stroke_width = 1.0 / entity.controls.border_scale_factor;
    let width = wh.x + stroke_width;
    let height = wh.y + stroke_width;
    ctx.save();
    set_border_style(entity, ctx);
    ctx.stroke_rect(-width / 2.0, -height / 2.0, width, height);
    ctx.restore();
}

fn draw_controls(entity: &Entity, ctx: &mut dyn Context2d, vpt: &Matrix) {
    let controls = &entity.controls;
    let wh = current_dimensions(entity, vpt);
    let (width, height) = (wh.x, wh.y);
    let size = controls.corner_size;
    let left = -(width + size) / 2.0;
    let top = -(height + size) / 2.0;

    ctx.save();
    let corner_paint = Paint::solid(&controls.corner_color);
    ctx.set_stroke_paint(&corner_paint);
    ctx.set_fill_paint(&corner_paint);
    if !controls.transparent_corners {
        if let Some(color) = &controls.corner_stroke_color {
            ctx.set_stroke_paint(&Paint::solid(color));
        }
    }

    let mut handles = vec![
        (Control::Tl, left, top),
        (Control::Tr, left + width, top),
        (Control::Bl, left, top + height),
        (Control::Br, left + width, top + height),
    ];
    if !entity.behavior.locks.uni_scaling {
        handles.extend([
            (Control::Mt, left + width / 2.0, top),
            (Control::Mb, left + width / 2.0, top + height),
            (Control::Mr, left + width, top + height / 2.0),
            (Control::Ml, left, top + height / 2.0),
        ]);
    }
    if controls.has_rotating_point {
        handles.push((Control::Mtr, left + width / 2.0, top - controls.rotating_point_offset));
    }
    for (control, x, y) in handles {
        draw_control(entity, ctx, control, x, y);
    }
    ctx.restore();
}

fn draw_control(entity: &Entity, ctx: &mut dyn Context2d, control: Control, left: f64, top: f64) {
    let controls = &entity.controls;
    if !controls.is_visible(control) {
        return;
    }
    let size = controls.corner_size;
    let transparent = controls.transparent_corners;
    let extra_stroke = !transparent && controls.corner_stroke_color.is_some();
    match controls.corner_style {
        CornerStyle::Circle => {
            ctx.begin_path();
            ctx.arc(left + size / 2.0, top + size / 2.0, size / 2.0, 0.0, 2.0 * PI);
            if transparent {
                ctx.stroke();
            } else {
                ctx.fill(FillRule::Nonzero);
            }
            if extra_stroke {
                ctx.stroke();
            }
        }
        CornerStyle::Rect => {
            if transparent {
                ctx.stroke_rect(left, top, size, size);
            } else {
                ctx.clear_rect(left, top, size, size);
                ctx.fill_rect(left, top, size, size);
            }
            if extra_stroke {
                ctx.stroke_rect(left, top, size, size);
            }
        }
    }
}
