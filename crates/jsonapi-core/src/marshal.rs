//! Resource marshaling: native records to resource objects.
//!
//! Each call walks the relation graph reachable from one record. Related
//! records are either inlined (embedded relations) or written once into the
//! call's [`Sideloads`] and referenced by linkage. A record that is already
//! being marshaled higher up the current path is written as linkage only, so
//! cyclic graphs terminate.

use std::collections::HashSet;

use crate::document::{Linkage, Relationship, ResourceObject};
use crate::error::{ConversionError, Result, SchemaError};
use crate::instrument::CorrelationId;
use crate::metadata::{FieldRole, TypeMetadata};
use crate::options::MarshalOptions;
use crate::relationship::RelatedRef;
use crate::resource::{DynResource, FieldOut};
use crate::sideload::{ResourceKey, Sideloads};

/// Marshal one record and everything reachable from it.
///
/// Returns the primary resource object and the sideload set gathered along
/// the way.
pub fn marshal_one(
    record: &dyn DynResource,
    options: &MarshalOptions,
    correlation_id: &CorrelationId,
) -> Result<(ResourceObject, Sideloads)> {
    let mut marshaler = Marshaler::new(options, correlation_id);
    let object = marshaler.node(record)?;
    Ok((object, marshaler.sideloads))
}

/// Marshal each record with [`marshal_one`], keeping input order and merging
/// the sideload sets (first seen wins).
pub fn marshal_many<'a, I>(
    records: I,
    options: &MarshalOptions,
    correlation_id: &CorrelationId,
) -> Result<(Vec<ResourceObject>, Sideloads)>
where
    I: IntoIterator<Item = &'a dyn DynResource>,
{
    let mut objects = Vec::new();
    let mut sideloads = Sideloads::new();
    for record in records {
        let (object, found) = marshal_one(record, options, correlation_id)?;
        objects.push(object);
        sideloads.merge(found);
    }
    Ok((objects, sideloads))
}

struct Marshaler<'c> {
    options: &'c MarshalOptions,
    correlation_id: &'c CorrelationId,
    sideloads: Sideloads,
    in_flight: HashSet<ResourceKey>,
}

impl<'c> Marshaler<'c> {
    fn new(options: &'c MarshalOptions, correlation_id: &'c CorrelationId) -> Self {
        Self {
            options,
            correlation_id,
            sideloads: Sideloads::new(),
            in_flight: HashSet::new(),
        }
    }

    /// Build the full resource object for `record`.
    fn node(&mut self, record: &dyn DynResource) -> Result<ResourceObject> {
        let metadata = record.type_metadata()?;
        let fields = record.encode_fields();
        if fields.len() != metadata.fields().len() {
            return Err(SchemaError::FieldCountMismatch {
                type_name: metadata.type_name(),
                expected: metadata.fields().len(),
                actual: fields.len(),
            }
            .into());
        }

        let key = record
            .wire_id()
            .map(|id| ResourceKey::new(metadata.resource_type(), id));
        if let Some(key) = &key {
            self.in_flight.insert(key.clone());
        }

        let mut object = ResourceObject::new(metadata.resource_type(), None);
        let written = self.write_fields(&metadata, fields, &mut object);

        if let Some(key) = &key {
            self.in_flight.remove(key);
        }
        written.map(|()| object)
    }

    fn write_fields(
        &mut self,
        metadata: &TypeMetadata,
        fields: Vec<FieldOut<'_>>,
        object: &mut ResourceObject,
    ) -> Result<()> {
        for (meta, out) in metadata.fields().iter().zip(fields) {
            match (meta.role, out) {
                (FieldRole::Identifier { .. }, FieldOut::Identifier(id)) => {
                    object.id = id;
                }
                (
                    FieldRole::Attribute {
                        wire_name,
                        omit_empty,
                    },
                    FieldOut::Attribute(value),
                ) => {
                    if omit_empty && value.is_empty() {
                        continue;
                    }
                    let wire = value.to_wire().map_err(|reason| {
                        ConversionError::new(metadata.resource_type(), wire_name, reason)
                    })?;
                    object.attributes.insert(wire_name.to_string(), wire);
                }
                (
                    FieldRole::ToOne {
                        wire_name,
                        embedded,
                        ..
                    },
                    FieldOut::ToOne(related),
                ) => {
                    let data = match related {
                        None if self.options.omit_null_relations => continue,
                        None => None,
                        Some(related) => Some(Linkage::One(Box::new(
                            self.related(related, embedded)?,
                        ))),
                    };
                    object
                        .relationships
                        .insert(wire_name, Relationship::new(data));
                }
                (
                    FieldRole::ToMany {
                        wire_name,
                        embedded,
                        ..
                    },
                    FieldOut::ToMany(items),
                ) => {
                    let linkages = items
                        .into_iter()
                        .map(|related| self.related(related, embedded))
                        .collect::<Result<Vec<_>>>()?;
                    object
                        .relationships
                        .insert(wire_name, Relationship::new(Some(Linkage::Many(linkages))));
                }
                _ => {
                    return Err(SchemaError::RoleMismatch {
                        type_name: metadata.type_name(),
                        field: meta.name,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// The `data` entry for one related value: a full object when embedded or
    /// when the record has no id, otherwise linkage (sideloading the record on
    /// first sight).
    fn related(&mut self, related: RelatedRef<'_>, embedded: bool) -> Result<ResourceObject> {
        let target = match related {
            RelatedRef::Reference(ident) => {
                return Ok(ResourceObject::linkage(
                    ident.resource_type.clone(),
                    ident.id.clone(),
                ));
            }
            RelatedRef::Resolved(target) => target,
        };

        let metadata = target.type_metadata()?;
        let Some(id) = target.wire_id() else {
            // Linkage needs an id; an unsaved record can only travel inline.
            tracing::trace!(
                resource_type = metadata.resource_type(),
                correlation_id = %self.correlation_id,
                "Related record has no id, embedding it"
            );
            return self.node(target);
        };
        let key = ResourceKey::new(metadata.resource_type(), id.clone());

        if self.in_flight.contains(&key) {
            tracing::trace!(
                resource = %key,
                correlation_id = %self.correlation_id,
                "Cycle detected, writing linkage only"
            );
            return Ok(ResourceObject::linkage(metadata.resource_type(), id));
        }

        if self.options.embeds(embedded) {
            return self.node(target);
        }

        match self.sideloads.reserve(key) {
            Some(slot) => {
                let object = self.node(target)?;
                self.sideloads.fill(slot, object);
            }
            None => {
                tracing::trace!(
                    resource_type = metadata.resource_type(),
                    id = id.as_str(),
                    "Already sideloaded"
                );
            }
        }
        Ok(ResourceObject::linkage(metadata.resource_type(), id))
    }
}
