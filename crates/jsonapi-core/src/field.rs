//! Field declarations.
//!
//! A [`Schema`] is the raw, unvalidated declaration a [`Resource`] type hands
//! to the metadata resolver. `#[derive(Resource)]` generates one; it can also be
//! written by hand:
//!
//! ```
//! use jsonapi_core::{FieldDecl, Schema};
//!
//! let schema = Schema::new("Comment")
//!     .field(FieldDecl::identifier("id", "comments"))
//!     .field(FieldDecl::attribute("body", "body"))
//!     .field(FieldDecl::attribute("post_id", "post_id").omit_empty());
//!
//! assert_eq!(schema.fields().len(), 3);
//! ```

use std::any::TypeId;
use std::fmt;

use crate::relationship::RelationField;
use crate::resource::Resource;

/// Whether a relation points at one record or a sequence of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// `Option<Related<T>>`
    One,
    /// `Vec<Related<T>>`
    Many,
}

/// The native type a relation field points at.
#[derive(Clone, Copy)]
pub struct TypeTarget {
    /// `TypeId` of the related record type.
    pub type_id: TypeId,
    /// Rust type name, for diagnostics.
    pub type_name: &'static str,
    /// The related type's declaration.
    pub schema: fn() -> Schema,
}

impl TypeTarget {
    /// Target for a concrete record type.
    pub fn of<T: Resource>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            schema: T::schema,
        }
    }
}

impl fmt::Debug for TypeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTarget")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for TypeTarget {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

/// The declared role of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    /// The resource identifier and the resource type it keys.
    Identifier { resource_type: &'static str },
    /// A plain attribute.
    Attribute {
        wire_name: &'static str,
        omit_empty: bool,
    },
    /// A relation to another record type.
    Relation {
        wire_name: &'static str,
        cardinality: Cardinality,
        embedded: bool,
        target: TypeTarget,
    },
}

/// Declaration of a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Rust field name
    pub name: &'static str,
    /// Declared role
    pub kind: DeclKind,
}

impl FieldDecl {
    /// Declare the identifier field.
    pub fn identifier(name: &'static str, resource_type: &'static str) -> Self {
        Self {
            name,
            kind: DeclKind::Identifier { resource_type },
        }
    }

    /// Declare an attribute.
    pub fn attribute(name: &'static str, wire_name: &'static str) -> Self {
        Self {
            name,
            kind: DeclKind::Attribute {
                wire_name,
                omit_empty: false,
            },
        }
    }

    /// Declare a relation whose cardinality and target come from the field type.
    pub fn relation<F: RelationField>(name: &'static str, wire_name: &'static str) -> Self {
        Self {
            name,
            kind: DeclKind::Relation {
                wire_name,
                cardinality: F::CARDINALITY,
                embedded: false,
                target: TypeTarget::of::<F::Target>(),
            },
        }
    }

    /// Declare a to-one relation to `T`.
    pub fn to_one<T: Resource>(name: &'static str, wire_name: &'static str) -> Self {
        Self {
            name,
            kind: DeclKind::Relation {
                wire_name,
                cardinality: Cardinality::One,
                embedded: false,
                target: TypeTarget::of::<T>(),
            },
        }
    }

    /// Declare a to-many relation to `T`.
    pub fn to_many<T: Resource>(name: &'static str, wire_name: &'static str) -> Self {
        Self {
            name,
            kind: DeclKind::Relation {
                wire_name,
                cardinality: Cardinality::Many,
                embedded: false,
                target: TypeTarget::of::<T>(),
            },
        }
    }

    /// Skip this attribute when its value is null or zero. No-op on other roles.
    pub fn omit_empty(mut self) -> Self {
        if let DeclKind::Attribute { omit_empty, .. } = &mut self.kind {
            *omit_empty = true;
        }
        self
    }

    /// Inline the related records instead of sideloading them. No-op on other roles.
    pub fn embedded(mut self) -> Self {
        if let DeclKind::Relation { embedded, .. } = &mut self.kind {
            *embedded = true;
        }
        self
    }

    /// The member name this field occupies on the wire.
    pub fn wire_name(&self) -> &'static str {
        match &self.kind {
            DeclKind::Identifier { .. } => "id",
            DeclKind::Attribute { wire_name, .. } | DeclKind::Relation { wire_name, .. } => {
                *wire_name
            }
        }
    }
}

/// Ordered field declarations for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<FieldDecl>,
}

impl Schema {
    /// Start an empty declaration for `type_name`.
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            fields: Vec::new(),
        }
    }

    /// Append a field declaration.
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    /// Rust type name this schema describes.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Declarations in field order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// Resource type of the first identifier declaration, if any.
    pub fn resource_type(&self) -> Option<&'static str> {
        self.fields.iter().find_map(|f| match f.kind {
            DeclKind::Identifier { resource_type } => Some(resource_type),
            _ => None,
        })
    }
}
