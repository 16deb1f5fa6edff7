//! Input model: modifier keys, buttons, and the gesture state machine.
//!
//! This module defines the types consumed by the interaction engine.
//! `Modifiers` captures the keys held at the time of a pointer event and
//! [`ModifierKey`] names one of them in configuration. [`InputState`] is the
//! gesture tracked between pointer-down and pointer-up: either a marquee
//! selection or a transform session carrying everything needed to apply
//! incremental updates and to cancel back to the starting state.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::coords::Control;
use crate::doc::{Geometry, ObjectId, Origin};
use crate::point::Point;

/// A modifier key that can be bound to an interaction in `SceneOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Shift,
    Ctrl,
    Alt,
    Meta,
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    #[must_use]
    pub fn has(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Alt => self.alt,
            ModifierKey::Meta => self.meta,
        }
    }

    /// Whether an optional binding is held; an unbound key never is.
    #[must_use]
    pub fn is_held(&self, key: Option<ModifierKey>) -> bool {
        key.is_some_and(|k| self.has(k))
    }

    /// Track a key press or release.
    pub fn set(&mut self, key: ModifierKey, down: bool) {
        match key {
            ModifierKey::Shift => self.shift = down,
            ModifierKey::Ctrl => self.ctrl = down,
            ModifierKey::Alt => self.alt = down,
            ModifierKey::Meta => self.meta = down,
        }
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Escape"`, `"Shift"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn is_escape(&self) -> bool {
        self.0 == "Escape"
    }

    /// The modifier this key toggles, if it is one.
    #[must_use]
    pub fn modifier(&self) -> Option<ModifierKey> {
        match self.0.as_str() {
            "Shift" => Some(ModifierKey::Shift),
            "Control" => Some(ModifierKey::Ctrl),
            "Alt" => Some(ModifierKey::Alt),
            "Meta" => Some(ModifierKey::Meta),
            _ => None,
        }
    }
}

// =============================================================
// Transform sessions
// =============================================================

/// What a transform gesture does to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformAction {
    Drag,
    Rotate,
    /// Corner handle: uniform unless the uni-scale key is held.
    Scale,
    ScaleX,
    ScaleY,
    SkewX,
    SkewY,
}

impl TransformAction {
    #[must_use]
    pub fn is_scale(self) -> bool {
        matches!(self, Self::Scale | Self::ScaleX | Self::ScaleY)
    }

    /// Event fired once per applied update.
    #[must_use]
    pub fn progress_event(self) -> &'static str {
        match self {
            Self::Drag => "moving",
            Self::Rotate => "rotating",
            Self::Scale | Self::ScaleX | Self::ScaleY => "scaling",
            Self::SkewX | Self::SkewY => "skewing",
        }
    }

    /// Event fired at gesture end when the target changed.
    #[must_use]
    pub fn completed_event(self) -> &'static str {
        match self {
            Self::Drag => "moved",
            Self::Rotate => "rotated",
            Self::Scale | Self::ScaleX | Self::ScaleY => "scaled",
            Self::SkewX | Self::SkewY => "skewed",
        }
    }
}

/// Which variant of a corner scale ran last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleMode {
    /// Both axes follow the pointer independently.
    Free,
    /// One ratio from the combined diagonal offset.
    Equally,
}

/// State of one transform gesture, from pointer-down to pointer-up.
#[derive(Debug, Clone)]
pub struct TransformSession {
    pub target: ObjectId,
    pub action: TransformAction,
    pub corner: Option<Control>,
    /// Target fields at gesture start, restored on cancel.
    pub original: Geometry,
    /// Anchor chosen from the corner at gesture start.
    pub original_origin: (Origin, Origin),
    /// Current anchor; may move to the center and back mid-gesture.
    pub origin_x: Origin,
    pub origin_y: Origin,
    /// Pointer minus `left`/`top` at gesture start, scene plane.
    pub offset: Point,
    /// Pointer at gesture start, scene plane.
    pub start: Point,
    /// Pointer at the previous update, scene plane.
    pub last: Point,
    /// Target angle at gesture start, radians.
    pub theta: f64,
    pub mouse_x_sign: f64,
    pub mouse_y_sign: f64,
    /// Centered-transform key held at the last update.
    pub centered_key: bool,
    /// The anchor was re-derived during the current update.
    pub reset: bool,
    pub scale_mode: Option<ScaleMode>,
    pub new_scale: Point,
    pub skew_sign: f64,
    /// Any update changed the target.
    pub action_performed: bool,
}

/// A marquee drag, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marquee {
    pub start: Point,
    /// Signed extent from `start`.
    pub size: Point,
}

impl Marquee {
    /// Top-left and bottom-right corners.
    #[must_use]
    pub fn corners(&self) -> (Point, Point) {
        let end = self.start + self.size;
        (self.start.min(end), self.start.max(end))
    }

    #[must_use]
    pub fn is_click(&self) -> bool {
        self.size.x == 0.0 && self.size.y == 0.0
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is dragging a selection rectangle.
    Marquee(Marquee),
    /// The user is moving, scaling, rotating or skewing the active object.
    Transforming(Box<TransformSession>),
}

impl InputState {
    #[must_use]
    pub fn session(&self) -> Option<&TransformSession> {
        match self {
            Self::Transforming(session) => Some(session),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut TransformSession> {
        match self {
            Self::Transforming(session) => Some(session),
            _ => None,
        }
    }
}
