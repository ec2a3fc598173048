//! The per-document sideload set.

use std::collections::HashMap;
use std::fmt;

use crate::document::ResourceObject;

/// (type, id) key of a resource object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub resource_type: String,
    pub id: String,
}

impl ResourceKey {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

/// A reserved position in a [`Sideloads`] set.
#[derive(Debug)]
pub struct Slot(usize);

/// Resource objects destined for `included`, deduplicated by key.
///
/// A key is claimed with [`reserve`](Sideloads::reserve) before its object is
/// built, so the final order is the order in which keys were first seen, even
/// though nested relations finish building first. Writes to an already claimed
/// key are no-ops.
#[derive(Debug, Default)]
pub struct Sideloads {
    slots: Vec<Option<ResourceObject>>,
    index: HashMap<ResourceKey, usize>,
}

impl Sideloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of claimed keys.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if `key` has been claimed.
    pub fn contains(&self, key: &ResourceKey) -> bool {
        self.index.contains_key(key)
    }

    /// Claim `key`. Returns `None` if it was already claimed (first-seen wins).
    pub fn reserve(&mut self, key: ResourceKey) -> Option<Slot> {
        if self.index.contains_key(&key) {
            return None;
        }
        let position = self.slots.len();
        self.slots.push(None);
        self.index.insert(key, position);
        Some(Slot(position))
    }

    /// Store the object for a reserved slot.
    pub fn fill(&mut self, slot: Slot, object: ResourceObject) {
        if let Some(entry) = self.slots.get_mut(slot.0) {
            entry.get_or_insert(object);
        }
    }

    /// Insert a finished object under its own key. No-op if the key is claimed.
    pub fn insert(&mut self, object: ResourceObject) -> bool {
        let key = object.key();
        match self.reserve(key) {
            Some(slot) => {
                self.fill(slot, object);
                true
            }
            None => false,
        }
    }

    /// Merge `other` into `self`, keeping `self`'s entry on key collisions.
    pub fn merge(&mut self, other: Sideloads) {
        for object in other.into_objects() {
            self.insert(object);
        }
    }

    /// Borrow the filled objects in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceObject> {
        self.slots.iter().flatten()
    }

    /// Consume into the filled objects in first-seen order.
    pub fn into_objects(self) -> Vec<ResourceObject> {
        self.slots.into_iter().flatten().collect()
    }
}
