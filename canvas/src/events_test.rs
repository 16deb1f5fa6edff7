use std::cell::RefCell;
use std::rc::Rc;

use uuid::Uuid;

use super::*;

fn recorder(bus: &mut EventBus<SceneEvent>) -> Rc<RefCell<Vec<SceneEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    bus.on(move |e| sink.borrow_mut().push(e.clone()));
    log
}

// =============================================================
// Subscription
// =============================================================

#[test]
fn catch_all_handler_sees_every_event() {
    let mut bus = EventBus::<SceneEvent>::new();
    let log = recorder(&mut bus);
    bus.fire(&SceneEvent::BeforeRender);
    bus.fire(&SceneEvent::AfterRender);
    assert_eq!(*log.borrow(), vec![SceneEvent::BeforeRender, SceneEvent::AfterRender]);
}

#[test]
fn named_handler_filters_by_name() {
    let mut bus = EventBus::<SceneEvent>::new();
    let count = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&count);
    bus.on_named("object:added", move |_| *sink.borrow_mut() += 1);
    let target = Uuid::new_v4();
    bus.fire(&SceneEvent::ObjectAdded { target });
    bus.fire(&SceneEvent::ObjectRemoved { target });
    bus.fire(&SceneEvent::ObjectAdded { target });
    assert_eq!(*count.borrow(), 2);
}

#[test]
fn off_removes_only_that_handler() {
    let mut bus = EventBus::<SceneEvent>::new();
    let first = bus.on(|_| {});
    let _second = bus.on(|_| {});
    assert_eq!(bus.handler_count(), 2);
    assert!(bus.off(first));
    assert!(!bus.off(first));
    assert_eq!(bus.handler_count(), 1);
}

#[test]
fn handlers_run_in_subscription_order() {
    let mut bus = EventBus::<SceneEvent>::new();
    let order = Rc::new(RefCell::new(Vec::new()));
    for n in 0..3 {
        let sink = Rc::clone(&order);
        bus.on(move |_| sink.borrow_mut().push(n));
    }
    bus.fire(&SceneEvent::Cleared);
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

// =============================================================
// Names
// =============================================================

#[test]
fn transform_events_use_action_names() {
    let target = Uuid::new_v4();
    let moving = SceneEvent::Transforming { target, action: TransformAction::Drag };
    let rotated = SceneEvent::Transformed { target, action: TransformAction::Rotate };
    assert_eq!(moving.name(), "moving");
    assert_eq!(rotated.name(), "rotated");
    assert_eq!(SceneEvent::Modified { target, action: None }.name(), "modified");
}

#[test]
fn selection_and_lifecycle_names() {
    assert_eq!(SceneEvent::SelectionCreated { selected: vec![] }.name(), "selection:created");
    assert_eq!(SceneEvent::SelectionCleared { deselected: vec![] }.name(), "selection:cleared");
    assert_eq!(SceneEvent::Cleared.name(), "canvas:cleared");
    assert_eq!(SceneEvent::BeforeRender.name(), "before:render");
}
