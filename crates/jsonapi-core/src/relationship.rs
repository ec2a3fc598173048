//! Relation fields.
//!
//! A relation field holds [`Related<T>`] values: either a fully materialized
//! record or a bare (type, id) reference. References appear when a document
//! links to a resource it does not include; marshaling a reference emits
//! linkage only.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::field::Cardinality;
use crate::resource::{DynResource, FieldOut, Resource};
use crate::unmarshal::FieldReader;

/// A (type, id) pair pointing at a resource object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

/// The value of one relation slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Related<T> {
    /// The related record is available.
    Resolved(Box<T>),
    /// Only the linkage is known; the caller may resolve it later.
    Reference(ResourceIdentifier),
}

impl<T> Related<T> {
    /// Wrap a materialized record.
    pub fn new(value: T) -> Self {
        Related::Resolved(Box::new(value))
    }

    /// An unresolved reference.
    pub fn reference(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Related::Reference(ResourceIdentifier::new(resource_type, id))
    }

    /// True if the record is available.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Related::Resolved(_))
    }

    /// Borrow the record if resolved.
    pub fn get(&self) -> Option<&T> {
        match self {
            Related::Resolved(value) => Some(&**value),
            Related::Reference(_) => None,
        }
    }

    /// Mutably borrow the record if resolved.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        match self {
            Related::Resolved(value) => Some(&mut **value),
            Related::Reference(_) => None,
        }
    }

    /// Take the record if resolved.
    pub fn into_inner(self) -> Option<T> {
        match self {
            Related::Resolved(value) => Some(*value),
            Related::Reference(_) => None,
        }
    }

    /// The reference, if unresolved.
    pub fn as_reference(&self) -> Option<&ResourceIdentifier> {
        match self {
            Related::Resolved(_) => None,
            Related::Reference(ident) => Some(ident),
        }
    }
}

impl<T: Resource> Related<T> {
    /// Borrow as a marshaler input.
    pub fn as_related_ref(&self) -> RelatedRef<'_> {
        match self {
            Related::Resolved(value) => RelatedRef::Resolved(&**value),
            Related::Reference(ident) => RelatedRef::Reference(ident),
        }
    }
}

impl<T> From<T> for Related<T> {
    fn from(value: T) -> Self {
        Related::new(value)
    }
}

/// Type-erased view of one [`Related`] value, consumed by the marshaler.
#[derive(Clone, Copy)]
pub enum RelatedRef<'a> {
    Resolved(&'a dyn DynResource),
    Reference(&'a ResourceIdentifier),
}

impl std::fmt::Debug for RelatedRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelatedRef::Resolved(r) => f
                .debug_tuple("Resolved")
                .field(&r.wire_id())
                .finish(),
            RelatedRef::Reference(ident) => f.debug_tuple("Reference").field(ident).finish(),
        }
    }
}

/// A field type that can hold a relation: `Option<Related<T>>` or `Vec<Related<T>>`.
///
/// `#[derive(Resource)]` dispatches through this trait, so the cardinality and
/// target of a relation come from the field's type rather than from the
/// attribute.
pub trait RelationField: Sized {
    /// The related record type.
    type Target: Resource;

    /// One or many.
    const CARDINALITY: Cardinality;

    /// Encode for the marshaler.
    fn to_field_out(&self) -> FieldOut<'_>;

    /// Decode field `index` from the reader.
    fn read(reader: &mut FieldReader<'_, '_>, index: usize) -> Result<Self>;
}

impl<T: Resource> RelationField for Option<Related<T>> {
    type Target = T;
    const CARDINALITY: Cardinality = Cardinality::One;

    fn to_field_out(&self) -> FieldOut<'_> {
        FieldOut::ToOne(self.as_ref().map(Related::as_related_ref))
    }

    fn read(reader: &mut FieldReader<'_, '_>, index: usize) -> Result<Self> {
        reader.to_one(index)
    }
}

impl<T: Resource> RelationField for Vec<Related<T>> {
    type Target = T;
    const CARDINALITY: Cardinality = Cardinality::Many;

    fn to_field_out(&self) -> FieldOut<'_> {
        FieldOut::ToMany(self.iter().map(Related::as_related_ref).collect())
    }

    fn read(reader: &mut FieldReader<'_, '_>, index: usize) -> Result<Self> {
        reader.to_many(index)
    }
}
