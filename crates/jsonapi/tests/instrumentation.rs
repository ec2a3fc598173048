mod fixtures;

use std::sync::{Arc, Mutex};

use fixtures::*;
use jsonapi::prelude::*;
use jsonapi::{CorrelationId, EventKind, Operation};

type Recorded = Arc<Mutex<Vec<(EventKind, Operation, CorrelationId, bool)>>>;

fn recording_runtime() -> (Recorded, Runtime) {
    let events: Recorded = Arc::default();
    let sink = Arc::clone(&events);
    let runtime = Runtime::new().with_observer(move |event| {
        sink.lock().unwrap().push((
            event.kind,
            event.operation,
            event.correlation_id.clone(),
            event.duration.is_some(),
        ));
    });
    (events, runtime)
}

#[test]
fn process_wide_observer_sees_named_runtime_calls() {
    let events: Recorded = Arc::default();
    let sink = Arc::clone(&events);
    jsonapi::set_observer(move |event| {
        if event.runtime.value("instrument") == Some("blogs.create") {
            sink.lock().unwrap().push((
                event.kind,
                event.operation,
                event.correlation_id.clone(),
                event.duration.is_some(),
            ));
        }
    });

    let runtime = Runtime::new().instrument("blogs.create");
    let mut out = Vec::new();
    runtime.marshal_one_payload(&mut out, &sample_blog()).unwrap();
    jsonapi::clear_observer();
    runtime.marshal_one(&sample_blog()).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].0, EventKind::Start);
    assert_eq!(events[1].0, EventKind::Stop);
    assert_eq!(events[0].1, Operation::Marshal);
    assert_eq!(events[0].2, events[1].2);
    assert!(!events[0].3);
    assert!(events[1].3);
}

#[test]
fn each_call_gets_a_fresh_correlation_id() {
    let (events, runtime) = recording_runtime();

    let document = runtime.marshal_one(&comment(1, 1, "hi")).unwrap();
    let _: Comment = runtime.unmarshal_one(&document).unwrap();

    let events = events.lock().unwrap();
    let kinds: Vec<_> = events.iter().map(|e| (e.0, e.1)).collect();
    assert_eq!(
        kinds,
        vec![
            (EventKind::Start, Operation::Marshal),
            (EventKind::Stop, Operation::Marshal),
            (EventKind::Start, Operation::Unmarshal),
            (EventKind::Stop, Operation::Unmarshal),
        ]
    );
    assert_eq!(events[0].2, events[1].2);
    assert_ne!(events[1].2, events[2].2);
}

#[test]
fn failed_call_still_emits_stop() {
    let (events, runtime) = recording_runtime();

    let result = runtime.unmarshal_payload::<Comment, _>("{}".as_bytes());
    assert!(result.is_err());

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].0, EventKind::Stop);
}

#[test]
fn panicking_observer_does_not_fail_the_call() {
    let runtime = Runtime::new().with_observer(|_| panic!("observer exploded"));
    let document = runtime.marshal_one(&comment(1, 1, "hi")).unwrap();
    assert_eq!(document.included.len(), 0);
}
