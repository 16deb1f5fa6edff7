//! Pointer and keyboard state machine on top of a [`Scene`].
//!
//! [`EngineCore`] holds every piece of interaction state that does not
//! depend on a browser, so it can be driven from tests and from the host
//! binary. The browser wrapper in [`crate::web`] forwards DOM events here
//! and processes the returned [`Action`]s.
//!
//! DESIGN
//! ======
//! A gesture runs from pointer-down to pointer-up. On pointer-down the
//! controller picks a target, updates the selection (clearing it, toggling
//! membership with the selection key, or activating the target) and then
//! starts either a marquee or a transform session. Pointer moves grow the
//! marquee or feed the session; pointer-up collects the marquee or
//! finalizes the session. Escape cancels a running transform and restores
//! the target exactly as it was at pointer-down.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::debug;

use crate::doc::ObjectId;
use crate::error::RenderError;
use crate::group::Container;
use crate::hit::find_target_corner;
use crate::input::{Button, InputState, Key, Marquee, Modifiers, TransformAction};
use crate::point::Point;
use crate::scene::Scene;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCursor(String),
    /// The committed scene changed; schedule a frame.
    RenderNeeded,
    /// Only the interaction surface changed.
    RenderTop,
    /// A gesture finished and changed its target.
    ObjectModified { id: ObjectId, action: TransformAction },
}

/// Engine state that needs no canvas element: the scene plus gesture bookkeeping.
#[derive(Debug)]
pub struct EngineCore {
    pub scene: Scene,
    pub input: InputState,
    pub modifiers: Modifiers,
    pub cursor: String,
}

impl EngineCore {
    #[must_use]
    pub fn new(scene: Scene) -> Self {
        let cursor = scene.options().default_cursor.clone();
        Self { scene, input: InputState::Idle, modifiers: Modifiers::default(), cursor }
    }

    /// The marquee being dragged, if any.
    #[must_use]
    pub fn marquee(&self) -> Option<Marquee> {
        match &self.input {
            InputState::Marquee(marquee) => Some(*marquee),
            _ => None,
        }
    }

    /// Run a pending frame and refresh the interaction surface.
    pub fn render(&mut self) -> Result<bool, RenderError> {
        let rendered = self.scene.on_animation_frame()?;
        let marquee = self.marquee();
        self.scene.render_top(marquee.as_ref());
        Ok(rendered)
    }

    // =============================================================
    // Pointer
    // =============================================================

    /// Handle a pointer press at viewport `pointer`.
    pub fn on_pointer_down(&mut self, pointer: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.modifiers = modifiers;
        let mut actions = Vec::new();
        if button != Button::Primary || !self.scene.options().interactive {
            return actions;
        }
        if !matches!(self.input, InputState::Idle) {
            return actions;
        }

        let mut target = self.scene.find_target(pointer, false, &modifiers).target;
        let should_group = self.should_group(target, &modifiers);
        let mut render = false;

        if self.should_clear_selection(target, &modifiers) {
            if self.scene.active_object().is_some() {
                self.scene.discard_active_object();
                render = true;
            }
        } else if should_group {
            if let Some(t) = target {
                self.handle_grouping(pointer, t, &modifiers);
            }
            target = self.scene.active_object();
            render = true;
        }

        let active = self.scene.active_object();
        let starts_marquee = match target.and_then(|t| self.scene.object(&t)) {
            None => true,
            Some(entity) => !entity.behavior.selectable && Some(entity.id) != active,
        };
        if self.scene.options().selection && starts_marquee {
            self.input = InputState::Marquee(Marquee { start: pointer, size: Point::ORIGIN });
        }

        if let Some(t) = target {
            let already_selected = active == Some(t);
            if self.scene.object(&t).is_some_and(|e| e.behavior.selectable) {
                self.scene.set_active_object(&t);
                render |= !already_selected;
            }
            let active = self.scene.active_object();
            let corner = self.scene.object(&t).and_then(|e| find_target_corner(e, pointer, active));
            if active == Some(t) && (corner.is_some() || !should_group) {
                if let Some(session) = self.scene.setup_current_transform(&t, pointer, already_selected, &modifiers) {
                    self.input = InputState::Transforming(Box::new(session));
                }
            }
        }

        let cursor = self.scene.hover_cursor(target, pointer, &modifiers);
        self.set_cursor(cursor, &mut actions);
        if render {
            self.scene.request_render_all();
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    /// Handle a pointer move to viewport `pointer`.
    pub fn on_pointer_move(&mut self, pointer: Point, modifiers: Modifiers) -> Vec<Action> {
        self.modifiers = modifiers;
        let mut actions = Vec::new();
        let mut cursor = None;
        match &mut self.input {
            InputState::Marquee(marquee) => {
                marquee.size = pointer - marquee.start;
                actions.push(Action::RenderTop);
            }
            InputState::Transforming(session) => {
                if self.scene.transform_object(session, pointer, &modifiers) {
                    if session.action == TransformAction::Drag {
                        cursor = Some(
                            self.scene
                                .object(&session.target)
                                .and_then(|e| e.behavior.move_cursor.clone())
                                .unwrap_or_else(|| self.scene.options().move_cursor.clone()),
                        );
                    }
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::Idle => {
                if self.scene.options().interactive {
                    let target = self.scene.find_target(pointer, false, &modifiers).target;
                    cursor = Some(self.scene.hover_cursor(target, pointer, &modifiers));
                }
            }
        }
        if let Some(cursor) = cursor {
            self.set_cursor(cursor, &mut actions);
        }
        actions
    }

    /// Handle a pointer release at viewport `pointer`.
    pub fn on_pointer_up(&mut self, pointer: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.modifiers = modifiers;
        let mut actions = Vec::new();
        if button != Button::Primary {
            return actions;
        }
        match std::mem::take(&mut self.input) {
            InputState::Idle => {}
            InputState::Transforming(session) => {
                self.scene.finalize_transform(&session);
                if session.action_performed {
                    actions.push(Action::ObjectModified { id: session.target, action: session.action });
                    self.scene.request_render_all();
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::Marquee(marquee) => {
                if !marquee.is_click() {
                    self.group_selected_objects(&marquee);
                    self.scene.request_render_all();
                    actions.push(Action::RenderNeeded);
                }
                actions.push(Action::RenderTop);
            }
        }
        let target = self.scene.find_target(pointer, false, &modifiers).target;
        let cursor = self.scene.hover_cursor(target, pointer, &modifiers);
        self.set_cursor(cursor, &mut actions);
        actions
    }

    // =============================================================
    // Keyboard
    // =============================================================

    pub fn on_key_down(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.modifiers = modifiers;
        if let Some(modifier) = key.modifier() {
            self.modifiers.set(modifier, true);
        }
        let mut actions = Vec::new();
        if key.is_escape() {
            match std::mem::take(&mut self.input) {
                InputState::Transforming(session) => {
                    self.scene.cancel_transform(&session);
                    actions.push(Action::RenderNeeded);
                }
                InputState::Marquee(_) => actions.push(Action::RenderTop),
                InputState::Idle => {}
            }
        }
        actions
    }

    pub fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.modifiers = modifiers;
        if let Some(modifier) = key.modifier() {
            self.modifiers.set(modifier, false);
        }
        Vec::new()
    }

    // =============================================================
    // Selection
    // =============================================================

    fn set_cursor(&mut self, cursor: String, actions: &mut Vec<Action>) {
        if self.cursor != cursor {
            self.cursor.clone_from(&cursor);
            actions.push(Action::SetCursor(cursor));
        }
    }

    /// Pressing here drops the current selection.
    fn should_clear_selection(&self, target: Option<ObjectId>, modifiers: &Modifiers) -> bool {
        let Some(target) = target else {
            return true;
        };
        let Some(entity) = self.scene.object(&target) else {
            return true;
        };
        let active = self.scene.active_object();
        let actives = self.scene.active_objects();
        let outside_multi = active.is_some()
            && actives.len() > 1
            && !actives.contains(&target)
            && active != Some(target)
            && !modifiers.has(self.scene.options().selection_key);
        outside_multi
            || !entity.behavior.evented
            || (!entity.behavior.selectable && active.is_some_and(|a| a != target))
    }

    /// The selection key adds `target` to, or removes it from, the selection.
    fn should_group(&self, target: Option<ObjectId>, modifiers: &Modifiers) -> bool {
        let Some(active) = self.scene.active_object() else {
            return false;
        };
        let Some(entity) = target.and_then(|t| self.scene.object(&t)) else {
            return false;
        };
        modifiers.has(self.scene.options().selection_key)
            && entity.behavior.selectable
            && self.scene.options().selection
            && (active != entity.id || entity.is_active_selection())
    }

    fn handle_grouping(&mut self, pointer: Point, target: ObjectId, modifiers: &Modifiers) {
        let Some(active) = self.scene.active_object() else {
            return;
        };
        let on_corner = self
            .scene
            .object(&active)
            .is_some_and(|e| find_target_corner(e, pointer, Some(active)).is_some());
        if on_corner {
            return;
        }
        let mut target = target;
        if target == active {
            match self.scene.find_target(pointer, true, modifiers).target {
                Some(inner) if self.scene.object(&inner).is_some_and(|e| e.behavior.selectable) => target = inner,
                _ => return,
            }
        }
        if self.scene.object(&active).is_some_and(|e| e.is_active_selection()) {
            self.update_active_selection(active, target);
        } else {
            self.create_active_selection(active, target);
        }
    }

    fn update_active_selection(&mut self, selection: ObjectId, target: ObjectId) {
        let previous = self.scene.active_objects();
        let vpt = self.scene.viewport_transform();
        let includes = self.scene.object(&selection).is_some_and(|e| e.includes(&target));
        if includes {
            crate::group::remove_with_update(&mut self.scene.store, &selection, &target, &vpt);
            let remaining = self.scene.store.children(&selection);
            if let [last] = remaining.as_slice() {
                self.scene.set_active_internal(*last);
            }
        } else {
            crate::group::add_with_update(&mut self.scene.store, &selection, &target, &vpt);
            self.scene.sort_selection_members();
        }
        debug!(%selection, %target, removed = includes, "active selection updated");
        self.scene.fire_selection_events(&previous);
    }

    /// Wrap the active object and `target` in a new active selection, lower
    /// one first.
    fn create_active_selection(&mut self, active: ObjectId, target: ObjectId) {
        let order = self.scene.objects();
        let position = |id: &ObjectId| order.iter().position(|o| o == id);
        let members = if position(&active) < position(&target) { [active, target] } else { [target, active] };
        self.scene.select(&members);
    }

    fn group_selected_objects(&mut self, marquee: &Marquee) {
        let mut collected = self.collect_objects(marquee);
        if collected.is_empty() {
            return;
        }
        collected.reverse();
        debug!(count = collected.len(), "marquee selection");
        self.scene.select(&collected);
    }

    /// Selectable visible objects under the marquee, top-most first.
    fn collect_objects(&self, marquee: &Marquee) -> Vec<ObjectId> {
        let (tl, br) = marquee.corners();
        let allow_intersect = !self.scene.options().selection_fully_contained;
        let is_click = marquee.is_click();
        let mut collected = Vec::new();
        for id in self.scene.objects().iter().rev() {
            let Some(entity) = self.scene.object(id) else {
                continue;
            };
            if !entity.behavior.selectable || !entity.visible {
                continue;
            }
            let hit = (allow_intersect && entity.intersects_with_rect(tl, br, false))
                || entity.is_contained_within_rect(tl, br, false)
                || (allow_intersect && entity.contains_point(tl, false))
                || (allow_intersect && entity.contains_point(br, false));
            if hit {
                collected.push(*id);
                if is_click {
                    break;
                }
            }
        }
        collected
    }
}
