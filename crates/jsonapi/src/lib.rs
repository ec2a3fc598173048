//! Metadata-driven JSON:API documents for Rust structs.
//!
//! Declare how a struct maps onto a resource object with `#[derive(Resource)]`,
//! then marshal records into documents and back.
//!
//! ```
//! use jsonapi::prelude::*;
//!
//! #[derive(Debug, Default, PartialEq, Resource)]
//! struct Post {
//!     #[jsonapi(primary = "posts")]
//!     id: u64,
//!     #[jsonapi(attr)]
//!     title: String,
//! }
//!
//! let mut out = Vec::new();
//! jsonapi::marshal_one_payload(&mut out, &Post { id: 1, title: "Foo".into() }).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     r#"{"data":{"type":"posts","id":"1","attributes":{"title":"Foo"}}}"#
//! );
//! ```
//!
//! The free functions here use a default [`Runtime`]. Build a runtime to name
//! calls for instrumentation or to change [`MarshalOptions`].

use std::io::{Read, Write};

pub use jsonapi_core::{
    CONTENT_TYPE, Cardinality, ConversionError, CorrelationId, DeclKind, Document, DynResource,
    Error, Event, EventKind, FieldDecl, FieldMeta, FieldOut, FieldReader, FieldRole, FormatError,
    FromValue, INSTRUMENT_KEY, IdError, Linkage, MarshalOptions, Observer, Operation, PrimaryData,
    RelatedRef, RelationField, Related, Relationship, Relationships, Resource, ResourceId,
    ResourceIdentifier, ResourceKey, ResourceObject, Result, Runtime, Schema, SchemaError,
    Sideloads, ToValue, TypeMetadata, TypeTarget, Value, ValueError, assemble, cached_types,
    clear_observer, invalidate_metadata, resolve, set_observer,
};
pub use jsonapi_core::{document, instrument, metadata, value};
pub use jsonapi_macros::Resource;

#[doc(hidden)]
pub use jsonapi_core as __private;

/// Marshal one record into a single-resource document.
pub fn marshal_one<T: Resource>(record: &T) -> Result<Document> {
    Runtime::new().marshal_one(record)
}

/// Marshal records into a collection document.
pub fn marshal_many<T: Resource>(records: &[T]) -> Result<Document> {
    Runtime::new().marshal_many(records)
}

/// Decode a single-resource document.
pub fn unmarshal_one<T: Resource>(document: &Document) -> Result<T> {
    Runtime::new().unmarshal_one(document)
}

/// Decode a collection document.
pub fn unmarshal_many<T: Resource>(document: &Document) -> Result<Vec<T>> {
    Runtime::new().unmarshal_many(document)
}

/// Marshal one record and write it as JSON.
pub fn marshal_one_payload<T: Resource, W: Write>(writer: W, record: &T) -> Result<()> {
    Runtime::new().marshal_one_payload(writer, record)
}

/// Like [`marshal_one_payload`], but every relation is embedded and nothing
/// is sideloaded.
pub fn marshal_one_embedded_payload<T: Resource, W: Write>(writer: W, record: &T) -> Result<()> {
    Runtime::new()
        .with_options(MarshalOptions::new().embed_all(true))
        .marshal_one_payload(writer, record)
}

/// Marshal records and write the collection document as JSON.
pub fn marshal_many_payload<T: Resource, W: Write>(writer: W, records: &[T]) -> Result<()> {
    Runtime::new().marshal_many_payload(writer, records)
}

/// Read a single-resource document and decode it.
pub fn unmarshal_payload<T: Resource, R: Read>(reader: R) -> Result<T> {
    Runtime::new().unmarshal_payload(reader)
}

/// Read a collection document and decode it.
pub fn unmarshal_many_payload<T: Resource, R: Read>(reader: R) -> Result<Vec<T>> {
    Runtime::new().unmarshal_many_payload(reader)
}

/// Encode a document as a `serde_json::Value`, for callers that post-process it.
pub fn to_json_value(document: &Document) -> Result<serde_json::Value> {
    document.to_json_value()
}

/// Common imports.
pub mod prelude {
    pub use crate::{
        Document, Error, MarshalOptions, Related, Resource, ResourceIdentifier, Result, Runtime,
    };
}
