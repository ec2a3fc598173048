//! The `Resource` trait.
//!
//! A record type participates in the codec by implementing [`Resource`]:
//! a [`Schema`] describing its fields, an `encode` that exposes field values in
//! schema order, and a `decode` that rebuilds the record from a
//! [`FieldReader`]. `#[derive(Resource)]` writes all three.

use std::sync::Arc;

use crate::error::Result;
use crate::field::Schema;
use crate::identifier::ResourceId;
use crate::metadata::{self, TypeMetadata};
use crate::relationship::RelatedRef;
use crate::unmarshal::FieldReader;
use crate::value::{ToValue, Value};

/// A native record type that maps onto a JSON:API resource object.
///
/// # Example
///
/// ```
/// use jsonapi_core::{FieldDecl, FieldOut, FieldReader, Resource, Result, Schema};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Tag {
///     id: u32,
///     label: String,
/// }
///
/// impl Resource for Tag {
///     fn schema() -> Schema {
///         Schema::new("Tag")
///             .field(FieldDecl::identifier("id", "tags"))
///             .field(FieldDecl::attribute("label", "label"))
///     }
///
///     fn resource_id(&self) -> Option<String> {
///         Some(self.id.to_string())
///     }
///
///     fn encode(&self) -> Vec<FieldOut<'_>> {
///         vec![FieldOut::identifier(&self.id), FieldOut::attribute(&self.label)]
///     }
///
///     fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self> {
///         Ok(Self {
///             id: reader.identifier()?,
///             label: reader.attribute(1)?,
///         })
///     }
/// }
///
/// assert_eq!(Tag::metadata().unwrap().resource_type(), "tags");
/// ```
pub trait Resource: Sized + 'static {
    /// Field declarations in field order.
    fn schema() -> Schema;

    /// The wire id of this record, if set.
    fn resource_id(&self) -> Option<String>;

    /// Field values, one entry per schema field, in schema order.
    fn encode(&self) -> Vec<FieldOut<'_>>;

    /// Rebuild a record from a resource object.
    fn decode(reader: &mut FieldReader<'_, '_>) -> Result<Self>;

    /// Validated, cached metadata for this type.
    fn metadata() -> Result<Arc<TypeMetadata>> {
        Ok(metadata::resolve::<Self>()?)
    }
}

/// Object-safe view of a [`Resource`], used to walk heterogeneous relation graphs.
pub trait DynResource {
    /// Metadata of the concrete type.
    fn type_metadata(&self) -> Result<Arc<TypeMetadata>>;
    /// See [`Resource::resource_id`].
    fn wire_id(&self) -> Option<String>;
    /// See [`Resource::encode`].
    fn encode_fields(&self) -> Vec<FieldOut<'_>>;
}

impl<T: Resource> DynResource for T {
    fn type_metadata(&self) -> Result<Arc<TypeMetadata>> {
        <T as Resource>::metadata()
    }

    fn wire_id(&self) -> Option<String> {
        Resource::resource_id(self)
    }

    fn encode_fields(&self) -> Vec<FieldOut<'_>> {
        Resource::encode(self)
    }
}

/// One encoded field value.
#[derive(Debug)]
pub enum FieldOut<'a> {
    /// The identifier's wire id (`None` when unset).
    Identifier(Option<String>),
    /// An attribute value.
    Attribute(Value),
    /// A to-one relation (`None` when empty).
    ToOne(Option<RelatedRef<'a>>),
    /// A to-many relation.
    ToMany(Vec<RelatedRef<'a>>),
}

impl FieldOut<'_> {
    /// Encode an identifier field.
    pub fn identifier<I: ResourceId>(id: &I) -> Self {
        FieldOut::Identifier(id.to_id())
    }

    /// Encode an attribute field.
    pub fn attribute<V: ToValue + ?Sized>(value: &V) -> Self {
        FieldOut::Attribute(value.to_value())
    }
}
