//! Typed publish/subscribe for scene notifications.
//!
//! An [`EventBus`] is owned by whoever emits the events (the scene) and
//! handlers are plain closures. Handlers run synchronously, in subscription
//! order, on the thread that fires.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::fmt;

use crate::doc::ObjectId;
use crate::input::TransformAction;

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// An event with a stable name handlers can filter on.
pub trait Event {
    fn name(&self) -> &'static str;
}

type Handler<E> = Box<dyn FnMut(&E)>;

struct Subscription<E> {
    id: HandlerId,
    filter: Option<&'static str>,
    handler: Handler<E>,
}

/// Synchronous event bus over one event type.
pub struct EventBus<E> {
    subscriptions: Vec<Subscription<E>>,
    next_id: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { subscriptions: Vec::new(), next_id: 0 }
    }
}

impl<E> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("handlers", &self.subscriptions.len()).finish()
    }
}

impl<E: Event> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event.
    pub fn on(&mut self, handler: impl FnMut(&E) + 'static) -> HandlerId {
        self.subscribe(None, Box::new(handler))
    }

    /// Subscribe to events whose [`Event::name`] is `name`.
    pub fn on_named(&mut self, name: &'static str, handler: impl FnMut(&E) + 'static) -> HandlerId {
        self.subscribe(Some(name), Box::new(handler))
    }

    fn subscribe(&mut self, filter: Option<&'static str>, handler: Handler<E>) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.subscriptions.push(Subscription { id, filter, handler });
        id
    }

    /// Remove a handler. Returns whether it was subscribed.
    pub fn off(&mut self, id: HandlerId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn fire(&mut self, event: &E) {
        let name = event.name();
        for sub in &mut self.subscriptions {
            if sub.filter.is_none_or(|f| f == name) {
                (sub.handler)(event);
            }
        }
    }

    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.subscriptions.len()
    }
}

// =============================================================
// Scene events
// =============================================================

/// Notifications emitted by a scene and its interaction engine.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    ObjectAdded { target: ObjectId },
    ObjectRemoved { target: ObjectId },
    SelectionCreated { selected: Vec<ObjectId> },
    SelectionUpdated { selected: Vec<ObjectId>, deselected: Vec<ObjectId> },
    BeforeSelectionCleared { target: ObjectId },
    SelectionCleared { deselected: Vec<ObjectId> },
    BeforeTransform { target: ObjectId, action: TransformAction },
    /// One applied update of a gesture (`moving`, `scaling`, ...).
    Transforming { target: ObjectId, action: TransformAction },
    /// The gesture ended after changing its target (`moved`, `scaled`, ...).
    Transformed { target: ObjectId, action: TransformAction },
    Modified { target: ObjectId, action: Option<TransformAction> },
    BeforeRender,
    AfterRender,
    Cleared,
}

impl Event for SceneEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::ObjectAdded { .. } => "object:added",
            Self::ObjectRemoved { .. } => "object:removed",
            Self::SelectionCreated { .. } => "selection:created",
            Self::SelectionUpdated { .. } => "selection:updated",
            Self::BeforeSelectionCleared { .. } => "before:selection:cleared",
            Self::SelectionCleared { .. } => "selection:cleared",
            Self::BeforeTransform { .. } => "before:transform",
            Self::Transforming { action, .. } => action.progress_event(),
            Self::Transformed { action, .. } => action.completed_event(),
            Self::Modified { .. } => "modified",
            Self::BeforeRender => "before:render",
            Self::AfterRender => "after:render",
            Self::Cleared => "canvas:cleared",
        }
    }
}
