//! Resource unmarshaling: documents to native records.
//!
//! A decode call indexes the document's `included` objects (and its primary
//! objects) by (type, id). Relationship linkages are resolved against that
//! index; a linkage with no match stays a [`Related::Reference`].

use std::collections::{HashMap, HashSet};

use crate::document::{Document, Linkage, PrimaryData, ResourceObject};
use crate::error::{ConversionError, FormatError, Result, SchemaError};
use crate::identifier::{IdError, ResourceId};
use crate::instrument::CorrelationId;
use crate::metadata::{FieldMeta, FieldRole, TypeMetadata};
use crate::relationship::{RelationField, Related};
use crate::resource::Resource;
use crate::value::{FromValue, Value};

type Key<'doc> = (&'doc str, &'doc str);

/// Decode a single-resource document into `T`.
pub fn unmarshal_one<T: Resource>(document: &Document, correlation_id: &CorrelationId) -> Result<T> {
    let data = document.data.as_ref().ok_or(FormatError::MissingData)?;
    let PrimaryData::One(object) = data else {
        return Err(FormatError::DataShape {
            expected: "object",
            found: data.shape(),
        }
        .into());
    };
    let mut context = DecodeContext::new(document, correlation_id);
    context.decode(object)
}

/// Decode a collection document into a `Vec<T>`, preserving order.
pub fn unmarshal_many<T: Resource>(
    document: &Document,
    correlation_id: &CorrelationId,
) -> Result<Vec<T>> {
    let data = document.data.as_ref().ok_or(FormatError::MissingData)?;
    let PrimaryData::Many(objects) = data else {
        return Err(FormatError::DataShape {
            expected: "array",
            found: data.shape(),
        }
        .into());
    };
    let mut context = DecodeContext::new(document, correlation_id);
    objects.iter().map(|object| context.decode(object)).collect()
}

/// Per-call decode state.
pub(crate) struct DecodeContext<'doc> {
    index: HashMap<Key<'doc>, &'doc ResourceObject>,
    in_flight: HashSet<Key<'doc>>,
    correlation_id: CorrelationId,
}

impl<'doc> DecodeContext<'doc> {
    fn new(document: &'doc Document, correlation_id: &CorrelationId) -> Self {
        let mut index = HashMap::new();
        for object in &document.included {
            match object.id.as_deref() {
                Some(id) => {
                    index.entry((object.resource_type.as_str(), id)).or_insert(object);
                }
                None => tracing::warn!(
                    resource_type = %object.resource_type,
                    "Skipping included resource without an id"
                ),
            }
        }
        let primary = document.data.as_ref().map(PrimaryData::objects).unwrap_or(&[]);
        for object in primary {
            if let Some(id) = object.id.as_deref() {
                index.entry((object.resource_type.as_str(), id)).or_insert(object);
            }
        }

        Self {
            index,
            in_flight: HashSet::new(),
            correlation_id: correlation_id.clone(),
        }
    }

    fn decode<T: Resource>(&mut self, object: &'doc ResourceObject) -> Result<T> {
        let metadata = T::metadata()?;
        if object.resource_type != metadata.resource_type() {
            return Err(FormatError::TypeMismatch {
                expected: metadata.resource_type().to_string(),
                found: object.resource_type.clone(),
            }
            .into());
        }

        let key = object
            .id
            .as_deref()
            .map(|id| (object.resource_type.as_str(), id));
        if let Some(key) = key {
            self.in_flight.insert(key);
        }

        let decoded = {
            let mut reader = FieldReader {
                object,
                metadata: &metadata,
                context: &mut *self,
            };
            T::decode(&mut reader)
        };

        if let Some(key) = key {
            self.in_flight.remove(&key);
        }
        decoded
    }
}

/// Field-by-field access to one resource object, handed to [`Resource::decode`].
///
/// Field indexes are positions in the type's schema.
pub struct FieldReader<'r, 'doc> {
    object: &'doc ResourceObject,
    metadata: &'r TypeMetadata,
    context: &'r mut DecodeContext<'doc>,
}

impl<'doc> FieldReader<'_, 'doc> {
    /// The resource object being decoded.
    pub fn object(&self) -> &'doc ResourceObject {
        self.object
    }

    /// Metadata of the type being decoded.
    pub fn metadata(&self) -> &TypeMetadata {
        self.metadata
    }

    /// Parse the object's id into the identifier type.
    pub fn identifier<I: ResourceId>(&self) -> Result<I> {
        I::from_id(self.object.id.as_deref()).map_err(|e| {
            let resource_type = self.object.resource_type.clone();
            let error = match e {
                IdError::Missing => FormatError::MissingIdentifier { resource_type },
                IdError::Malformed(reason) => FormatError::MalformedIdentifier {
                    resource_type,
                    id: self.object.id.clone().unwrap_or_default(),
                    reason,
                },
            };
            error.into()
        })
    }

    /// Decode the attribute at `index`. A missing member yields `V::default()`.
    pub fn attribute<V: FromValue + Default>(&self, index: usize) -> Result<V> {
        let field = self.field(index)?;
        let FieldRole::Attribute { wire_name, .. } = field.role else {
            return Err(self.role_mismatch(field));
        };
        match self.object.attributes.get(wire_name) {
            None => Ok(V::default()),
            Some(wire) => V::from_value(Value::from_wire(wire)).map_err(|reason| {
                ConversionError::new(self.object.resource_type.clone(), wire_name, reason).into()
            }),
        }
    }

    /// Decode the relation at `index`, dispatching on the field type.
    pub fn relation<F: RelationField>(&mut self, index: usize) -> Result<F> {
        F::read(self, index)
    }

    /// Decode a to-one relation. Absent or `null` data yields `None`.
    ///
    /// An object carrying `attributes` or `relationships` is decoded as
    /// embedded. A bare `{type, id}` is linkage: it is looked up among the
    /// document's `included` and primary objects and stays a
    /// [`Related::Reference`] when absent. An embedded object with neither
    /// member therefore reads as linkage.
    pub fn to_one<T: Resource>(&mut self, index: usize) -> Result<Option<Related<T>>> {
        let field = self.field(index)?;
        let FieldRole::ToOne {
            wire_name,
            resource_type,
            ..
        } = field.role
        else {
            return Err(self.role_mismatch(field));
        };

        let object = self.object;
        let Some(relationship) = object.relationships.get(wire_name) else {
            return Ok(None);
        };
        match &relationship.data {
            None => Ok(None),
            Some(Linkage::One(linkage)) => self.related(resource_type, linkage).map(Some),
            Some(Linkage::Many(_)) => Err(self.shape_error(wire_name, "object", "array")),
        }
    }

    /// Decode a to-many relation. Absent or `null` data yields an empty `Vec`.
    ///
    /// Entries resolve as in [`FieldReader::to_one`].
    pub fn to_many<T: Resource>(&mut self, index: usize) -> Result<Vec<Related<T>>> {
        let field = self.field(index)?;
        let FieldRole::ToMany {
            wire_name,
            resource_type,
            ..
        } = field.role
        else {
            return Err(self.role_mismatch(field));
        };

        let object = self.object;
        let Some(relationship) = object.relationships.get(wire_name) else {
            return Ok(Vec::new());
        };
        match &relationship.data {
            None => Ok(Vec::new()),
            Some(Linkage::Many(linkages)) => linkages
                .iter()
                .map(|linkage| self.related(resource_type, linkage))
                .collect(),
            Some(Linkage::One(_)) => Err(self.shape_error(wire_name, "array", "object")),
        }
    }

    fn related<T: Resource>(
        &mut self,
        resource_type: &'static str,
        linkage: &'doc ResourceObject,
    ) -> Result<Related<T>> {
        if linkage.resource_type != resource_type {
            return Err(FormatError::TypeMismatch {
                expected: resource_type.to_string(),
                found: linkage.resource_type.clone(),
            }
            .into());
        }

        // Without an id the object cannot be linkage, so it is decoded inline.
        let Some(id) = linkage.id.as_deref() else {
            return self.context.decode(linkage).map(Related::new);
        };

        let key = (linkage.resource_type.as_str(), id);
        if self.context.in_flight.contains(&key) {
            tracing::trace!(
                resource_type,
                id,
                correlation_id = %self.context.correlation_id,
                "Cycle detected, keeping reference"
            );
            return Ok(Related::reference(resource_type, id));
        }

        if linkage.has_content() {
            return self.context.decode(linkage).map(Related::new);
        }

        match self.context.index.get(&key).copied() {
            Some(target) => self.context.decode(target).map(Related::new),
            None => {
                tracing::trace!(resource_type, id, "Unresolved linkage, keeping reference");
                Ok(Related::reference(resource_type, id))
            }
        }
    }

    fn field(&self, index: usize) -> Result<&'_ FieldMeta> {
        self.metadata.field(index).ok_or_else(|| {
            SchemaError::FieldCountMismatch {
                type_name: self.metadata.type_name(),
                expected: self.metadata.fields().len(),
                actual: index + 1,
            }
            .into()
        })
    }

    fn role_mismatch(&self, field: &FieldMeta) -> crate::Error {
        SchemaError::RoleMismatch {
            type_name: self.metadata.type_name(),
            field: field.name,
        }
        .into()
    }

    fn shape_error(
        &self,
        relationship: &str,
        expected: &'static str,
        found: &'static str,
    ) -> crate::Error {
        FormatError::RelationshipShape {
            resource_type: self.object.resource_type.clone(),
            relationship: relationship.to_string(),
            expected,
            found,
        }
        .into()
    }
}
