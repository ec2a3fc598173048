//! JSON:API wire structures and document assembly.
//!
//! These types mirror the JSON shape one-to-one. Attribute and relationship
//! members keep insertion order, which for marshaled records is declared-field
//! order.

use std::collections::HashSet;
use std::fmt;
use std::io::{Read, Write};

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};

use crate::error::{Error, FormatError, Result};
use crate::relationship::ResourceIdentifier;
use crate::sideload::{ResourceKey, Sideloads};

/// Media type for JSON:API documents.
pub const CONTENT_TYPE: &str = "application/vnd.api+json";

/// A resource object: `type`, `id`, `attributes`, `relationships`.
///
/// A bare linkage is a resource object without attributes or relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, JsonValue>,
    #[serde(default, skip_serializing_if = "Relationships::is_empty")]
    pub relationships: Relationships,
}

impl ResourceObject {
    /// An object with no attributes or relationships yet.
    pub fn new(resource_type: impl Into<String>, id: Option<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id,
            attributes: Map::new(),
            relationships: Relationships::default(),
        }
    }

    /// A (type, id) linkage.
    pub fn linkage(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(resource_type, Some(id.into()))
    }

    /// The (type, id) key; an absent id keys as the empty string.
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(
            self.resource_type.clone(),
            self.id.clone().unwrap_or_default(),
        )
    }

    /// The identifier, if the object has an id.
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.id
            .as_ref()
            .map(|id| ResourceIdentifier::new(self.resource_type.clone(), id.clone()))
    }

    /// True if the object carries attributes or relationships (an embedded
    /// payload rather than a bare linkage).
    pub fn has_content(&self) -> bool {
        !self.attributes.is_empty() || !self.relationships.is_empty()
    }
}

/// The `data` member of a relationship: one object or a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceObject>),
    One(Box<ResourceObject>),
}

/// A relationship object. `data: None` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, JsonValue>>,
}

impl Relationship {
    pub fn new(data: Option<Linkage>) -> Self {
        Self { data, meta: None }
    }
}

/// Relationship members in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relationships(Vec<(String, Relationship)>);

impl Relationships {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Look a relationship up by member name.
    pub fn get(&self, name: &str) -> Option<&Relationship> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Insert or replace a relationship.
    pub fn insert(&mut self, name: impl Into<String>, relationship: Relationship) {
        let name = name.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = relationship,
            None => self.0.push((name, relationship)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Relationship)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Relationships {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(k, v)| (k, v)))
    }
}

impl<'de> Deserialize<'de> for Relationships {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RelationshipsVisitor;

        impl<'de> Visitor<'de> for RelationshipsVisitor {
            type Value = Relationships;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of relationship objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut out = Relationships::default();
                while let Some((name, relationship)) = map.next_entry::<String, Relationship>()? {
                    out.insert(name, relationship);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_map(RelationshipsVisitor)
    }
}

/// Top-level `data`: one resource object or a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<ResourceObject>),
    One(Box<ResourceObject>),
}

impl PrimaryData {
    /// The primary objects, in order.
    pub fn objects(&self) -> &[ResourceObject] {
        match self {
            PrimaryData::Many(objects) => objects,
            PrimaryData::One(object) => std::slice::from_ref(object.as_ref()),
        }
    }

    pub(crate) fn shape(&self) -> &'static str {
        match self {
            PrimaryData::Many(_) => "array",
            PrimaryData::One(_) => "object",
        }
    }
}

/// A top-level JSON:API document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Option<PrimaryData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<ResourceObject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Map<String, JsonValue>>,
}

impl Document {
    /// Parse a document from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, FormatError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parse a document from a string.
    pub fn from_str(text: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse a document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, FormatError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the document as compact JSON.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self).map_err(Error::Encode)
    }

    /// Encode the document as a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Encode)
    }

    /// Encode the document as a `serde_json::Value`.
    pub fn to_json_value(&self) -> Result<JsonValue> {
        serde_json::to_value(self).map_err(Error::Encode)
    }

    /// Attach top-level `meta`.
    pub fn with_meta(mut self, meta: Map<String, JsonValue>) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Compose primary data and a sideload set into a document.
///
/// Sideloaded objects that are also primary data are dropped, so one resource
/// never appears in both `data` and `included`.
pub fn assemble(data: PrimaryData, sideloads: Sideloads) -> Result<Document, FormatError> {
    let primary: HashSet<ResourceKey> = data
        .objects()
        .iter()
        .filter(|o| o.id.is_some())
        .map(ResourceObject::key)
        .collect();

    let mut included = Vec::with_capacity(sideloads.len());
    for object in sideloads.into_objects() {
        let key = object.key();
        if key.resource_type.is_empty() || key.id.is_empty() {
            return Err(FormatError::EmptyResourceKey {
                resource_type: key.resource_type,
                id: key.id,
            });
        }
        if primary.contains(&key) {
            tracing::trace!(resource = %key, "Skipping sideload already present as primary data");
            continue;
        }
        included.push(object);
    }

    Ok(Document {
        data: Some(data),
        included,
        meta: None,
    })
}
