//! Tests for the event model and completion tracking

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::json;

use super::*;

#[test]
fn test_new_event_defaults() {
    let event = Event::new("logs");
    assert_eq!(event.routing_key(), "logs");
    assert!(!event.id().is_empty());
    assert_eq!(event.duty(), 1);
    assert!(event.data().is_null());
    assert!(event.labels().is_empty());
    assert!(event.tags().is_empty());
    assert!(!event.has_errors());
}

#[test]
fn test_event_ids_are_unique() {
    assert_ne!(Event::new("a").id(), Event::new("a").id());
}

#[test]
fn test_clone_bumps_duty() {
    let event = Event::new("logs");
    let copy = event.clone();
    assert_eq!(event.duty(), 2);
    assert_eq!(copy.duty(), 2);
    copy.done();
    assert_eq!(event.duty(), 1);
    event.done();
}

#[test]
fn test_hooks_fire_once_after_last_done() {
    let fired = Arc::new(AtomicUsize::new(0));
    let event = Event::new("logs");
    {
        let fired = Arc::clone(&fired);
        event.add_hook(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        });
    }

    let first = event.clone();
    let second = event.clone();

    first.done();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    second.done();
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    event.done();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hooks_run_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let event = Event::new("logs");
    for index in 0..3 {
        let order = Arc::clone(&order);
        event.add_hook(move || order.lock().push(index));
    }
    event.done();
    assert_eq!(*order.lock(), vec![0, 1, 2]);
}

#[test]
fn test_hooks_are_shared_not_copied() {
    let fired = Arc::new(AtomicUsize::new(0));
    let event = Event::new("logs");
    {
        let fired = Arc::clone(&fired);
        event.add_hook(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        });
    }

    // a clone made after hook attachment must not duplicate the hook
    let copy = event.clone();
    event.done();
    copy.done();
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_hooks_fire_once_under_concurrent_done() {
    let fired = Arc::new(AtomicUsize::new(0));
    let event = Event::new("logs");
    {
        let fired = Arc::clone(&fired);
        event.add_hook(move || {
            fired.fetch_add(1, Ordering::SeqCst);
        });
    }

    let copies: Vec<Event> = (0..8).map(|_| event.clone()).collect();
    event.done();

    let mut handles = Vec::new();
    for copy in copies {
        handles.push(tokio::spawn(async move { copy.done() }));
    }
    for handle in handles {
        handle.await.expect("done task panicked");
    }

    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[test]
fn test_field_operations_round_trip() {
    let mut event = Event::new("logs");
    event.set_field("fizz.1.bazz", 44i64).unwrap();
    assert_eq!(event.get_field("fizz.1.bazz"), Ok(&Payload::Int(44)));

    event.delete_field("fizz.1.bazz").unwrap();
    assert_eq!(event.get_field("fizz.1.bazz"), Err(PathError::NoSuchField));
}

#[test]
fn test_set_field_keeps_payload_on_error() {
    let mut event = Event::with_data("logs", Payload::from(json!({"fizz": ["a", "b"]})));
    let err = event.set_field("fizz.nope", 1i64).unwrap_err();
    assert_eq!(err, PathError::InvalidPath);
    assert_eq!(event.data(), &Payload::from(json!({"fizz": ["a", "b"]})));
}

#[test]
fn test_labels_and_tags() {
    let mut event = Event::new("logs");

    event.add_label("source", "api");
    assert_eq!(event.get_label("source"), Some("api"));
    assert!(event.delete_label("source"));
    assert!(!event.delete_label("source"));

    event.add_tag("slow");
    event.add_tag("slow");
    assert_eq!(event.tags().len(), 1);
    assert!(event.has_tag("slow"));
    assert!(event.delete_tag("slow"));
    assert!(!event.has_tag("slow"));
}

#[test]
fn test_error_stack_is_ordered() {
    let mut event = Event::new("logs");
    event.stack_error("first failure");
    event.stack_error(std::io::Error::other("second failure"));
    assert!(event.has_errors());
    assert_eq!(event.errors().len(), 2);
    assert!(event.errors()[0].contains("first"));
    assert!(event.errors()[1].contains("second"));

    event.clear_errors();
    assert!(!event.has_errors());
}

#[test]
fn test_clone_copies_data_but_not_error_backflow() {
    let mut event = Event::with_data("logs", Payload::from(json!({"n": 1})));
    let mut copy = event.clone();

    copy.set_field("n", 2i64).unwrap();
    copy.stack_error("copy only");

    assert_eq!(event.get_field("n"), Ok(&Payload::Int(1)));
    assert!(!event.has_errors());

    event.done();
    copy.done();
}

#[test]
fn test_event_serializes_to_json() {
    let mut event = Event::with_data("logs", Payload::from(json!({"msg": "hi"})));
    event.add_label("host", "node-1");
    event.add_tag("test");
    event.stack_error("boom");

    let value = serde_json::to_value(&event).unwrap();
    assert_eq!(value["routing_key"], json!("logs"));
    assert_eq!(value["data"]["msg"], json!("hi"));
    assert_eq!(value["labels"]["host"], json!("node-1"));
    assert_eq!(value["tags"], json!(["test"]));
    assert_eq!(value["errors"], json!(["boom"]));
}
