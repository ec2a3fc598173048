//! Core types for JSON:API Rust.
//!
//! `jsonapi-core` turns native record types into JSON:API documents and back,
//! driven by per-type field metadata.
//!
//! # Role In The Architecture
//!
//! - **Contract layer**: [`Resource`] is implemented by record types, usually
//!   through `#[derive(Resource)]` from `jsonapi-macros`.
//! - **Metadata**: [`metadata`] validates and caches each type's [`Schema`].
//! - **Codec**: [`marshal`] and [`unmarshal`] walk relation graphs;
//!   [`document::assemble`] composes primary data with the sideload set.
//! - **Instrumentation**: [`Runtime`] wraps every call in a tracing span and
//!   Start/Stop [`Event`]s.
//!
//! Most applications should use the `jsonapi` facade.

pub mod document;
pub mod error;
pub mod field;
pub mod identifier;
pub mod instrument;
pub mod marshal;
pub mod metadata;
pub mod options;
pub mod relationship;
pub mod resource;
pub mod runtime;
pub mod sideload;
pub mod unmarshal;
pub mod value;

#[cfg(test)]
mod test_support;

pub use document::{
    CONTENT_TYPE, Document, Linkage, PrimaryData, Relationship, Relationships, ResourceObject,
    assemble,
};
pub use error::{ConversionError, Error, FormatError, Result, SchemaError};
pub use field::{Cardinality, DeclKind, FieldDecl, Schema, TypeTarget};
pub use identifier::{IdError, ResourceId};
pub use instrument::{
    CorrelationId, Event, EventKind, Observer, Operation, clear_observer, set_observer,
};
pub use metadata::{FieldMeta, FieldRole, TypeMetadata, cached_types, invalidate_metadata, resolve};
pub use options::MarshalOptions;
pub use relationship::{RelatedRef, RelationField, Related, ResourceIdentifier};
pub use resource::{DynResource, FieldOut, Resource};
pub use runtime::{INSTRUMENT_KEY, Runtime};
pub use sideload::{ResourceKey, Sideloads};
pub use unmarshal::FieldReader;
pub use value::{FromValue, ToValue, Value, ValueError};
