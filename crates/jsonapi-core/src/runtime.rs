//! The instrumented entry points.
//!
//! A [`Runtime`] bundles marshal options, free-form context values and an
//! optional observer. Every public call runs inside a `jsonapi` tracing span
//! and emits one Start and one Stop event sharing a fresh correlation id.

use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;

use crate::document::{self, Document, PrimaryData};
use crate::error::Result;
use crate::instrument::{self, CorrelationId, Event, EventKind, Observer, Operation};
use crate::marshal;
use crate::options::MarshalOptions;
use crate::resource::{DynResource, Resource};
use crate::unmarshal;

/// Context key under which [`Runtime::instrument`] stores the instrument name.
pub const INSTRUMENT_KEY: &str = "instrument";

/// Entry point for marshal and unmarshal calls.
///
/// ```
/// use jsonapi_core::{MarshalOptions, Runtime};
///
/// let runtime = Runtime::new()
///     .instrument("blogs.create")
///     .with_options(MarshalOptions::new().omit_null_relations(true));
/// assert_eq!(runtime.value("instrument"), Some("blogs.create"));
/// ```
#[derive(Clone, Default)]
pub struct Runtime {
    values: HashMap<String, String>,
    options: MarshalOptions,
    observer: Option<Arc<Observer>>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name this runtime's calls (for example `"blogs.create"`).
    pub fn instrument(self, name: impl Into<String>) -> Self {
        self.with_value(INSTRUMENT_KEY, name)
    }

    /// Attach a context value, visible to observers.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Look up a context value.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn with_options(mut self, options: MarshalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &MarshalOptions {
        &self.options
    }

    /// Use `callback` for this runtime's events instead of the process-wide observer.
    pub fn with_observer<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Event<'_>) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(Observer::new(callback)));
        self
    }

    pub(crate) fn observer(&self) -> Option<&Arc<Observer>> {
        self.observer.as_ref()
    }

    /// Marshal one record into a single-resource document.
    pub fn marshal_one<T: Resource>(&self, record: &T) -> Result<Document> {
        self.instrumented(Operation::Marshal, |correlation_id| {
            let (object, sideloads) = marshal::marshal_one(record, &self.options, correlation_id)?;
            Ok(document::assemble(
                PrimaryData::One(Box::new(object)),
                sideloads,
            )?)
        })
    }

    /// Marshal records into a collection document, preserving order.
    pub fn marshal_many<T: Resource>(&self, records: &[T]) -> Result<Document> {
        self.instrumented(Operation::Marshal, |correlation_id| {
            let (objects, sideloads) = marshal::marshal_many(
                records.iter().map(|r| r as &dyn DynResource),
                &self.options,
                correlation_id,
            )?;
            Ok(document::assemble(PrimaryData::Many(objects), sideloads)?)
        })
    }

    /// Decode a single-resource document.
    pub fn unmarshal_one<T: Resource>(&self, document: &Document) -> Result<T> {
        self.instrumented(Operation::Unmarshal, |correlation_id| {
            unmarshal::unmarshal_one(document, correlation_id)
        })
    }

    /// Decode a collection document.
    pub fn unmarshal_many<T: Resource>(&self, document: &Document) -> Result<Vec<T>> {
        self.instrumented(Operation::Unmarshal, |correlation_id| {
            unmarshal::unmarshal_many(document, correlation_id)
        })
    }

    /// Marshal one record and write the document as JSON.
    pub fn marshal_one_payload<T: Resource, W: Write>(&self, writer: W, record: &T) -> Result<()> {
        self.marshal_one(record)?.to_writer(writer)
    }

    /// Marshal records and write the collection document as JSON.
    pub fn marshal_many_payload<T: Resource, W: Write>(
        &self,
        writer: W,
        records: &[T],
    ) -> Result<()> {
        self.marshal_many(records)?.to_writer(writer)
    }

    /// Parse a single-resource document from `reader` and decode it.
    pub fn unmarshal_payload<T: Resource, R: Read>(&self, reader: R) -> Result<T> {
        self.instrumented(Operation::Unmarshal, |correlation_id| {
            let document = Document::from_reader(reader)?;
            unmarshal::unmarshal_one(&document, correlation_id)
        })
    }

    /// Parse a collection document from `reader` and decode it.
    pub fn unmarshal_many_payload<T: Resource, R: Read>(&self, reader: R) -> Result<Vec<T>> {
        self.instrumented(Operation::Unmarshal, |correlation_id| {
            let document = Document::from_reader(reader)?;
            unmarshal::unmarshal_many(&document, correlation_id)
        })
    }

    fn instrumented<R>(
        &self,
        operation: Operation,
        call: impl FnOnce(&CorrelationId) -> Result<R>,
    ) -> Result<R> {
        let correlation_id = CorrelationId::generate();
        let span = tracing::debug_span!(
            "jsonapi",
            operation = operation.as_str(),
            correlation_id = %correlation_id,
            instrument = self.value(INSTRUMENT_KEY).unwrap_or("")
        );
        let _entered = span.enter();

        let started = Instant::now();
        self.emit(EventKind::Start, operation, &correlation_id, None);
        let result = call(&correlation_id);
        self.emit(
            EventKind::Stop,
            operation,
            &correlation_id,
            Some(started.elapsed()),
        );

        if let Err(e) = &result {
            tracing::debug!(error = %e, "Operation failed");
        }
        result
    }

    fn emit(
        &self,
        kind: EventKind,
        operation: Operation,
        correlation_id: &CorrelationId,
        duration: Option<std::time::Duration>,
    ) {
        instrument::dispatch(&Event {
            kind,
            operation,
            correlation_id,
            timestamp: Utc::now(),
            duration,
            runtime: self,
        });
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("values", &self.values)
            .field("options", &self.options)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
