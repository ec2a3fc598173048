//! Error types for JSON:API Rust.
//!
//! The taxonomy has three kinds of codec failure:
//!
//! - [`SchemaError`]: a type's metadata declaration is unusable. Raised at first
//!   resolution and never retried.
//! - [`ConversionError`]: one field could not be converted between its native and
//!   wire form. Aborts the enclosing marshal/unmarshal call.
//! - [`FormatError`]: the document does not have the shape the codec expects.
//!
//! Unresolved relationship linkages are deliberately absent from this list.

use crate::value::ValueError;

/// Result type alias for codec operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error returned by every marshal/unmarshal entry point.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad or ambiguous metadata declaration.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A single field failed to convert.
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// Malformed document shape.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// Writing the encoded document failed.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

impl Error {
    /// True if this is a schema error.
    pub fn is_schema(&self) -> bool {
        matches!(self, Error::Schema(_))
    }

    /// True if this is a conversion error.
    pub fn is_conversion(&self) -> bool {
        matches!(self, Error::Conversion(_))
    }

    /// True if this is a format error.
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }
}

/// A metadata declaration that cannot be turned into [`TypeMetadata`](crate::TypeMetadata).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("`{type_name}` declares no identifier field")]
    MissingIdentifier { type_name: &'static str },

    #[error("`{type_name}` declares more than one identifier: `{first}` and `{second}`")]
    DuplicateIdentifier {
        type_name: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("`{type_name}` declares an empty resource type on `{field}`")]
    EmptyResourceType {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("`{type_name}` uses wire name `{wire_name}` for both `{first}` and `{second}`")]
    DuplicateWireName {
        type_name: &'static str,
        wire_name: &'static str,
        first: &'static str,
        second: &'static str,
    },

    #[error("`{type_name}.{field}` uses reserved member name `{wire_name}`")]
    ReservedWireName {
        type_name: &'static str,
        field: &'static str,
        wire_name: &'static str,
    },

    #[error("`{type_name}.{field}` uses invalid member name `{wire_name}`")]
    InvalidWireName {
        type_name: &'static str,
        field: &'static str,
        wire_name: &'static str,
    },

    #[error("relation `{type_name}.{field}` targets `{related}`, which has no usable metadata: {source}")]
    UnresolvableRelation {
        type_name: &'static str,
        field: &'static str,
        related: &'static str,
        source: Box<SchemaError>,
    },

    #[error("`{type_name}` encoded {actual} fields but declares {expected}")]
    FieldCountMismatch {
        type_name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("`{type_name}.{field}` encoded a value that does not match its declared role")]
    RoleMismatch {
        type_name: &'static str,
        field: &'static str,
    },
}

/// A single field's wire/native conversion failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("cannot convert `{resource_type}.{field}`: {reason}")]
pub struct ConversionError {
    /// Resource type of the record being converted.
    pub resource_type: String,
    /// Wire name of the offending field.
    pub field: String,
    /// Why the value was rejected.
    pub reason: ValueError,
}

impl ConversionError {
    pub fn new(resource_type: impl Into<String>, field: impl Into<String>, reason: ValueError) -> Self {
        Self {
            resource_type: resource_type.into(),
            field: field.into(),
            reason,
        }
    }
}

/// The document does not have the structure a JSON:API codec expects.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document has no primary data")]
    MissingData,

    #[error("expected {expected} primary data, found {found}")]
    DataShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("relationship `{relationship}` on `{resource_type}`: expected {expected}, found {found}")]
    RelationshipShape {
        resource_type: String,
        relationship: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("expected resource type `{expected}`, found `{found}`")]
    TypeMismatch { expected: String, found: String },

    #[error("resource of type `{resource_type}` is missing its id")]
    MissingIdentifier { resource_type: String },

    #[error("resource `{resource_type}` has malformed id `{id}`: {reason}")]
    MalformedIdentifier {
        resource_type: String,
        id: String,
        reason: String,
    },

    #[error("sideloaded resource has an empty type or id (`{resource_type}`:`{id}`)")]
    EmptyResourceKey { resource_type: String, id: String },
}
