//! Start/stop events around marshal and unmarshal calls.
//!
//! One observer can be installed process-wide with [`set_observer`]; a
//! [`Runtime`] may carry its own observer, which takes precedence. Observer
//! panics are caught and logged.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::runtime::Runtime;

/// Whether an event opens or closes an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Start,
    Stop,
}

/// The instrumented operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Marshal,
    Unmarshal,
}

impl Operation {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Operation::Marshal => "marshal",
            Operation::Unmarshal => "unmarshal",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier shared by the Start and Stop events of one top-level call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Use a caller-chosen id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A random UUID (version 4).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One instrumentation event.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    pub kind: EventKind,
    pub operation: Operation,
    pub correlation_id: &'a CorrelationId,
    pub timestamp: DateTime<Utc>,
    /// Elapsed time since the matching Start. Only set on Stop.
    pub duration: Option<Duration>,
    /// The runtime that issued the call.
    pub runtime: &'a Runtime,
}

type ObserverFn = dyn Fn(&Event<'_>) + Send + Sync;

/// An installed event callback.
pub struct Observer {
    callback: Box<ObserverFn>,
}

impl Observer {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Invoke the callback, swallowing any panic.
    pub fn notify(&self, event: &Event<'_>) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (self.callback)(event))) {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_string());
            tracing::warn!(
                kind = ?event.kind,
                operation = event.operation.as_str(),
                correlation_id = %event.correlation_id,
                panic = %message,
                "Instrumentation observer panicked"
            );
        }
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

fn global_slot() -> &'static ArcSwapOption<Observer> {
    static SLOT: OnceLock<ArcSwapOption<Observer>> = OnceLock::new();
    SLOT.get_or_init(ArcSwapOption::empty)
}

/// Install the process-wide observer, replacing any previous one.
pub fn set_observer<F>(callback: F)
where
    F: Fn(&Event<'_>) + Send + Sync + 'static,
{
    global_slot().store(Some(Arc::new(Observer::new(callback))));
}

/// Remove the process-wide observer.
pub fn clear_observer() {
    global_slot().store(None);
}

/// Deliver `event` to the runtime's observer, or the process-wide one.
pub(crate) fn dispatch(event: &Event<'_>) {
    match event.runtime.observer() {
        Some(observer) => observer.notify(event),
        None => {
            if let Some(observer) = global_slot().load_full() {
                observer.notify(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_v4_uuids() {
        let id = CorrelationId::generate();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str(), parsed.hyphenated().to_string());
        assert_ne!(id, CorrelationId::generate());
    }

    #[test]
    fn test_observer_panic_is_swallowed() {
        let runtime = Runtime::new();
        let id = CorrelationId::new("x");
        let observer = Observer::new(|_| panic!("boom"));
        observer.notify(&Event {
            kind: EventKind::Start,
            operation: Operation::Marshal,
            correlation_id: &id,
            timestamp: Utc::now(),
            duration: None,
            runtime: &runtime,
        });
    }
}
