//! Metadata resolution and the process-wide type cache.
//!
//! [`resolve`] validates a type's [`Schema`] once and caches the resulting
//! [`TypeMetadata`] by `TypeId`. Relation targets are resolved as part of the
//! same pass, so a schema error anywhere in the reachable type graph surfaces
//! at the first resolution of any type that reaches it.
//!
//! Concurrent first use is allowed: two threads may build the same metadata,
//! but only the first published `Arc` is kept and every caller receives it.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use regex::Regex;

use crate::error::SchemaError;
use crate::field::{Cardinality, DeclKind, Schema, TypeTarget};
use crate::resource::Resource;

/// JSON:API member names: alphanumeric at both ends, `-`, `_` or space inside.
const MEMBER_NAME_PATTERN: &str = r"^[A-Za-z0-9](?:[A-Za-z0-9_\- ]*[A-Za-z0-9])?$";

/// Member names JSON:API reserves on resource objects.
const RESERVED_MEMBERS: [&str; 2] = ["id", "type"];

/// The resolved role of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    Identifier {
        wire_name: &'static str,
        resource_type: &'static str,
    },
    Attribute {
        wire_name: &'static str,
        omit_empty: bool,
    },
    ToOne {
        wire_name: &'static str,
        resource_type: &'static str,
        embedded: bool,
    },
    ToMany {
        wire_name: &'static str,
        resource_type: &'static str,
        embedded: bool,
    },
}

impl FieldRole {
    /// Member name on the wire.
    pub const fn wire_name(&self) -> &'static str {
        match self {
            FieldRole::Identifier { wire_name, .. }
            | FieldRole::Attribute { wire_name, .. }
            | FieldRole::ToOne { wire_name, .. }
            | FieldRole::ToMany { wire_name, .. } => *wire_name,
        }
    }
}

/// One field and its role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    /// Rust field name
    pub name: &'static str,
    /// Resolved role
    pub role: FieldRole,
}

/// Validated metadata for one record type. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    type_name: &'static str,
    resource_type: &'static str,
    identifier: usize,
    fields: Vec<FieldMeta>,
}

impl TypeMetadata {
    /// Rust type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// JSON:API `type` of this record type.
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    /// Fields in declared order.
    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    /// Field at `index`.
    pub fn field(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(index)
    }

    /// The identifier field.
    pub fn identifier(&self) -> &FieldMeta {
        &self.fields[self.identifier]
    }

    /// Look a field up by wire name.
    pub fn field_by_wire_name(&self, wire_name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.role.wire_name() == wire_name)
    }
}

/// Resolve (or fetch from cache) the metadata for `T`.
pub fn resolve<T: Resource>() -> Result<Arc<TypeMetadata>, SchemaError> {
    registry().resolve(TypeTarget::of::<T>())
}

/// Drop every cached entry. Subsequent calls rebuild lazily.
pub fn invalidate_metadata() {
    registry().clear();
}

/// Number of cached types.
pub fn cached_types() -> usize {
    registry().len()
}

fn registry() -> &'static MetadataRegistry {
    static REGISTRY: OnceLock<MetadataRegistry> = OnceLock::new();
    REGISTRY.get_or_init(MetadataRegistry::default)
}

/// Types visited and built during one top-level resolution.
#[derive(Default)]
struct ResolvePass {
    visiting: HashSet<TypeId>,
    built: Vec<(TypeId, TypeMetadata)>,
}

#[derive(Debug, Default)]
struct MetadataRegistry {
    cache: RwLock<HashMap<TypeId, Arc<TypeMetadata>>>,
}

impl MetadataRegistry {
    fn cached(&self, type_id: TypeId) -> Option<Arc<TypeMetadata>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned()
    }

    fn resolve(&self, target: TypeTarget) -> Result<Arc<TypeMetadata>, SchemaError> {
        if let Some(hit) = self.cached(target.type_id) {
            return Ok(hit);
        }
        let mut pass = ResolvePass::default();
        self.build(target, &mut pass)?;
        match self.publish(target.type_id, pass.built) {
            Some(published) => Ok(published),
            // Invalidated between the cache hit and publication.
            None => self.resolve(target),
        }
    }

    /// Build `target` and every type it reaches into `pass.built`. Nothing is
    /// cached until the whole pass has succeeded.
    fn build(
        &self,
        target: TypeTarget,
        pass: &mut ResolvePass,
    ) -> Result<&'static str, SchemaError> {
        if let Some(hit) = self.cached(target.type_id) {
            return Ok(hit.resource_type);
        }
        if let Some((_, built)) = pass.built.iter().find(|(id, _)| *id == target.type_id) {
            return Ok(built.resource_type);
        }
        if pass.visiting.contains(&target.type_id) {
            let schema = (target.schema)();
            return schema
                .resource_type()
                .ok_or(SchemaError::MissingIdentifier {
                    type_name: schema.type_name(),
                });
        }

        pass.visiting.insert(target.type_id);
        let built = self.validate((target.schema)(), pass);
        pass.visiting.remove(&target.type_id);
        let metadata = built?;

        let resource_type = metadata.resource_type;
        pass.built.push((target.type_id, metadata));
        Ok(resource_type)
    }

    /// Publish a successful pass (first published wins) and return the cached
    /// entry for `target`.
    fn publish(
        &self,
        target: TypeId,
        built: Vec<(TypeId, TypeMetadata)>,
    ) -> Option<Arc<TypeMetadata>> {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        for (type_id, metadata) in built {
            let published = cache.entry(type_id).or_insert_with(|| Arc::new(metadata));
            tracing::debug!(
                type_name = published.type_name,
                resource_type = published.resource_type,
                fields = published.fields.len(),
                "Resolved resource metadata"
            );
        }
        cache.get(&target).cloned()
    }

    fn validate(
        &self,
        schema: Schema,
        pass: &mut ResolvePass,
    ) -> Result<TypeMetadata, SchemaError> {
        let type_name = schema.type_name();
        let mut identifier: Option<(usize, &'static str, &'static str)> = None;
        let mut wire_names: HashMap<&'static str, &'static str> = HashMap::new();
        let mut fields = Vec::with_capacity(schema.fields().len());

        for (index, decl) in schema.fields().iter().enumerate() {
            let role = match decl.kind {
                DeclKind::Identifier { resource_type } => {
                    if let Some((_, first, _)) = identifier {
                        return Err(SchemaError::DuplicateIdentifier {
                            type_name,
                            first,
                            second: decl.name,
                        });
                    }
                    if resource_type.is_empty() {
                        return Err(SchemaError::EmptyResourceType {
                            type_name,
                            field: decl.name,
                        });
                    }
                    identifier = Some((index, decl.name, resource_type));
                    FieldRole::Identifier {
                        wire_name: "id",
                        resource_type,
                    }
                }
                DeclKind::Attribute {
                    wire_name,
                    omit_empty,
                } => {
                    check_member_name(type_name, decl.name, wire_name)?;
                    FieldRole::Attribute {
                        wire_name,
                        omit_empty,
                    }
                }
                DeclKind::Relation {
                    wire_name,
                    cardinality,
                    embedded,
                    target,
                } => {
                    check_member_name(type_name, decl.name, wire_name)?;
                    let resource_type = self.build(target, pass).map_err(
                        |source| SchemaError::UnresolvableRelation {
                            type_name,
                            field: decl.name,
                            related: target.type_name,
                            source: Box::new(source),
                        },
                    )?;
                    match cardinality {
                        Cardinality::One => FieldRole::ToOne {
                            wire_name,
                            resource_type,
                            embedded,
                        },
                        Cardinality::Many => FieldRole::ToMany {
                            wire_name,
                            resource_type,
                            embedded,
                        },
                    }
                }
            };

            if !matches!(role, FieldRole::Identifier { .. }) {
                let wire_name = role.wire_name();
                if let Some(first) = wire_names.insert(wire_name, decl.name) {
                    return Err(SchemaError::DuplicateWireName {
                        type_name,
                        wire_name,
                        first,
                        second: decl.name,
                    });
                }
            }

            fields.push(FieldMeta {
                name: decl.name,
                role,
            });
        }

        let (identifier, _, resource_type) =
            identifier.ok_or(SchemaError::MissingIdentifier { type_name })?;

        Ok(TypeMetadata {
            type_name,
            resource_type,
            identifier,
            fields,
        })
    }

    fn clear(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

fn member_name_regex() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| match Regex::new(MEMBER_NAME_PATTERN) {
            Ok(regex) => Some(regex),
            Err(e) => {
                tracing::warn!(
                    pattern = MEMBER_NAME_PATTERN,
                    error = %e,
                    "Invalid member name pattern, skipping member name validation"
                );
                None
            }
        })
        .as_ref()
}

fn check_member_name(
    type_name: &'static str,
    field: &'static str,
    wire_name: &'static str,
) -> Result<(), SchemaError> {
    if RESERVED_MEMBERS.contains(&wire_name) {
        return Err(SchemaError::ReservedWireName {
            type_name,
            field,
            wire_name,
        });
    }
    if member_name_regex().is_some_and(|re| !re.is_match(wire_name)) {
        return Err(SchemaError::InvalidWireName {
            type_name,
            field,
            wire_name,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDecl;
    use crate::test_support::{Author, Book, Chapter, hand_resource};

    #[test]
    fn test_resolve_roles_in_declared_order() {
        let meta = resolve::<Book>().unwrap();
        assert_eq!(meta.resource_type(), "books");
        assert_eq!(meta.identifier().name, "id");

        let roles: Vec<_> = meta.fields().iter().map(|f| f.role).collect();
        assert_eq!(
            roles,
            vec![
                FieldRole::Identifier {
                    wire_name: "id",
                    resource_type: "books"
                },
                FieldRole::Attribute {
                    wire_name: "title",
                    omit_empty: false
                },
                FieldRole::Attribute {
                    wire_name: "page-count",
                    omit_empty: true
                },
                FieldRole::ToOne {
                    wire_name: "author",
                    resource_type: "authors",
                    embedded: false
                },
                FieldRole::ToMany {
                    wire_name: "chapters",
                    resource_type: "chapters",
                    embedded: true
                },
            ]
        );
        assert_eq!(
            meta.field_by_wire_name("page-count").map(|f| f.name),
            Some("pages")
        );
    }

    #[test]
    fn test_resolve_is_cached() {
        let first = resolve::<Chapter>().unwrap();
        let second = resolve::<Chapter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cyclic_type_graph_resolves() {
        // Author -> books -> Book -> author -> Author
        let author = resolve::<Author>().unwrap();
        let books = author.field_by_wire_name("books").unwrap();
        assert_eq!(
            books.role,
            FieldRole::ToMany {
                wire_name: "books",
                resource_type: "books",
                embedded: false
            }
        );
    }

    #[test]
    fn test_concurrent_first_resolution_publishes_one_result() {
        hand_resource!(Racy, "racy", []);

        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| resolve::<Racy>().unwrap()))
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for meta in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], meta));
        }
    }

    #[test]
    fn test_missing_identifier() {
        hand_resource!(NoId, "", [FieldDecl::attribute("title", "title")]);
        assert_eq!(
            resolve::<NoId>().unwrap_err(),
            SchemaError::MissingIdentifier { type_name: "NoId" }
        );
    }

    #[test]
    fn test_duplicate_identifier() {
        hand_resource!(TwoIds, "things", [FieldDecl::identifier("other", "things")]);
        assert_eq!(
            resolve::<TwoIds>().unwrap_err(),
            SchemaError::DuplicateIdentifier {
                type_name: "TwoIds",
                first: "id",
                second: "other"
            }
        );
    }

    #[test]
    fn test_duplicate_wire_name() {
        hand_resource!(
            Clash,
            "clashes",
            [
                FieldDecl::attribute("name", "label"),
                FieldDecl::attribute("title", "label")
            ]
        );
        assert!(matches!(
            resolve::<Clash>().unwrap_err(),
            SchemaError::DuplicateWireName {
                wire_name: "label",
                first: "name",
                second: "title",
                ..
            }
        ));
    }

    #[test]
    fn test_reserved_and_invalid_member_names() {
        hand_resource!(Reserved, "reserved", [FieldDecl::attribute("kind", "type")]);
        assert!(matches!(
            resolve::<Reserved>().unwrap_err(),
            SchemaError::ReservedWireName { wire_name: "type", .. }
        ));

        hand_resource!(Invalid, "invalid", [FieldDecl::attribute("x", "-bad")]);
        assert!(matches!(
            resolve::<Invalid>().unwrap_err(),
            SchemaError::InvalidWireName { wire_name: "-bad", .. }
        ));
    }

    #[test]
    fn test_broken_cycle_member_fails_from_either_side() {
        hand_resource!(Good, "goods", [FieldDecl::to_one::<Flawed>("flawed", "flawed")]);
        hand_resource!(
            Flawed,
            "flaweds",
            [
                FieldDecl::to_one::<Good>("good", "good"),
                FieldDecl::attribute("first", "dup"),
                FieldDecl::attribute("second", "dup")
            ]
        );

        assert!(matches!(
            resolve::<Flawed>().unwrap_err(),
            SchemaError::DuplicateWireName { wire_name: "dup", .. }
        ));
        match resolve::<Good>().unwrap_err() {
            SchemaError::UnresolvableRelation { field, source, .. } => {
                assert_eq!(field, "flawed");
                assert!(matches!(*source, SchemaError::DuplicateWireName { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(resolve::<Flawed>().is_err());
    }

    #[test]
    fn test_successful_pass_publishes_reached_types() {
        hand_resource!(Leaf, "leaves", []);
        hand_resource!(Branch, "branches", [FieldDecl::to_many::<Leaf>("leaves", "leaves")]);

        let branch = resolve::<Branch>().unwrap();
        assert_eq!(branch.resource_type(), "branches");
        assert!(registry().cached(TypeId::of::<Leaf>()).is_some());
    }

    #[test]
    fn test_broken_relation_target() {
        hand_resource!(Orphan, "", [FieldDecl::attribute("body", "body")]);
        hand_resource!(
            Parent,
            "parents",
            [FieldDecl::to_many::<Orphan>("orphans", "orphans")]
        );
        let err = resolve::<Parent>().unwrap_err();
        match err {
            SchemaError::UnresolvableRelation {
                field, source, ..
            } => {
                assert_eq!(field, "orphans");
                assert_eq!(*source, SchemaError::MissingIdentifier { type_name: "Orphan" });
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
