//! Scripted pointer and keyboard input.
//!
//! A script is a JSON array of steps, each tagged by `op`:
//!
//! ```json
//! [
//!   {"op": "down", "x": 100, "y": 75},
//!   {"op": "move", "x": 140, "y": 90, "shift": true},
//!   {"op": "up", "x": 140, "y": 90},
//!   {"op": "key", "key": "Escape"}
//! ]
//! ```
//!
//! Coordinates are viewport pixels, as a browser would report them.

#[cfg(test)]
#[path = "replay_test.rs"]
mod replay_test;

use canvas::engine::{Action, EngineCore};
use canvas::input::{Button, Key, Modifiers};
use canvas::point::Point;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::CliError;

/// Modifier flags a step may carry; omitted flags are released.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Held {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl From<Held> for Modifiers {
    fn from(held: Held) -> Self {
        Self { shift: held.shift, ctrl: held.ctrl, alt: held.alt, meta: held.meta }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Down {
        x: f64,
        y: f64,
        #[serde(flatten)]
        held: Held,
    },
    Move {
        x: f64,
        y: f64,
        #[serde(flatten)]
        held: Held,
    },
    Up {
        x: f64,
        y: f64,
        #[serde(flatten)]
        held: Held,
    },
    /// Press and release one key.
    Key {
        key: String,
        #[serde(flatten)]
        held: Held,
    },
    /// Zoom to `value` keeping viewport point `(x, y)` fixed.
    Zoom {
        value: f64,
        #[serde(default)]
        x: f64,
        #[serde(default)]
        y: f64,
    },
    /// Pan the viewport by `(dx, dy)` pixels.
    Pan { dx: f64, dy: f64 },
    /// Run a pending frame, as the browser would between events.
    Frame,
}

/// Totals for one replayed script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub steps: usize,
    pub modified: usize,
    pub frames: usize,
    pub last_cursor: Option<String>,
}

pub fn parse_script(raw: &str) -> Result<Vec<Step>, CliError> {
    serde_json::from_str(raw).map_err(CliError::Script)
}

/// Feed every step to `engine`, rendering whenever a step asks for it.
pub fn replay(engine: &mut EngineCore, steps: &[Step]) -> Result<ReplayReport, CliError> {
    let mut report = ReplayReport::default();
    for (index, step) in steps.iter().enumerate() {
        let actions = match step {
            Step::Down { x, y, held } => engine.on_pointer_down(Point::new(*x, *y), Button::Primary, (*held).into()),
            Step::Move { x, y, held } => engine.on_pointer_move(Point::new(*x, *y), (*held).into()),
            Step::Up { x, y, held } => engine.on_pointer_up(Point::new(*x, *y), Button::Primary, (*held).into()),
            Step::Key { key, held } => {
                let mut actions = engine.on_key_down(Key(key.clone()), (*held).into());
                actions.extend(engine.on_key_up(Key(key.clone()), (*held).into()));
                actions
            }
            Step::Zoom { value, x, y } => {
                if !(*value > 0.0) {
                    return Err(CliError::Replay { step: index, reason: format!("zoom must be positive, got {value}") });
                }
                engine.scene.zoom_to_point(Point::new(*x, *y), *value);
                vec![Action::RenderNeeded]
            }
            Step::Pan { dx, dy } => {
                engine.scene.relative_pan(Point::new(*dx, *dy));
                vec![Action::RenderNeeded]
            }
            Step::Frame => {
                if engine.render()? {
                    report.frames += 1;
                }
                Vec::new()
            }
        };
        for action in &actions {
            debug!(step = index, ?action, "replay action");
            match action {
                Action::ObjectModified { .. } => report.modified += 1,
                Action::SetCursor(cursor) => report.last_cursor = Some(cursor.clone()),
                Action::RenderNeeded | Action::RenderTop => {}
            }
        }
        report.steps += 1;
    }
    info!(steps = report.steps, modified = report.modified, "script replayed");
    Ok(report)
}
