//! Arena of graph objects and their connections.
//!
//! Objects are owned by the store and addressed by id; connections are keyed
//! by `(owner id, relation)`. Nothing holds a pointer back to the store.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::connection::Connection;
use super::relations::{ConnectionKind, RelationTable};
use super::types::{GraphObject, NodeKind};

/// In-memory storage for graph objects and connections.
///
/// Objects keep insertion order, so listings and searches are stable.
#[derive(Debug, Default)]
pub struct GraphStore {
    /// All objects indexed by id.
    objects: IndexMap<String, GraphObject>,
    /// Connections indexed by (owner id, relation name).
    connections: HashMap<(String, String), Connection>,
    /// Relation dispatch table, fixed at construction.
    relations: RelationTable,
    /// Counter for minted entry ids.
    sequence: u64,
}

impl GraphStore {
    /// Creates an empty store with the standard relation table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with a custom relation table.
    #[must_use]
    pub fn with_relations(relations: RelationTable) -> Self {
        Self {
            relations,
            ..Self::default()
        }
    }

    /// Returns the relation table.
    #[must_use]
    pub fn relations(&self) -> &RelationTable {
        &self.relations
    }

    // ── Objects ───────────────────────────────────────────────────────

    /// Gets an object by id.
    pub fn get(&self, id: &str) -> Result<&GraphObject> {
        self.objects
            .get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Gets a mutable reference to an object by id.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut GraphObject> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    /// Returns true if an object with the given id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Inserts or replaces the object stored under `id`.
    ///
    /// The object is re-keyed to `id` if its own id differs.
    pub fn set(&mut self, id: &str, mut object: GraphObject) {
        if object.id() != id {
            object.rename(id);
        }
        self.objects.insert(id.to_string(), object);
    }

    /// Shallow-merges `fields` into an existing object.
    pub fn update(&mut self, id: &str, fields: Map<String, Value>) -> Result<()> {
        self.get_mut(id)?.merge(fields);
        Ok(())
    }

    /// Removes an object, its connections and every entry pointing at it.
    pub fn remove(&mut self, id: &str) -> Result<GraphObject> {
        let object = self
            .objects
            .shift_remove(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.connections.retain(|(owner, _), _| owner != id);
        for connection in self.connections.values_mut() {
            connection.remove_entries_for(id);
        }
        Ok(object)
    }

    /// Returns the total number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the store holds no objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Returns objects of the given kind in insertion order.
    pub fn objects_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &GraphObject> {
        self.objects.values().filter(move |o| o.kind() == kind)
    }

    /// Returns the next value of the store-wide sequence.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    // ── Connections ───────────────────────────────────────────────────

    /// Resolves the behaviour of `relation` on the object `id`.
    pub fn relation_kind(&self, id: &str, relation: &str) -> Result<ConnectionKind> {
        let object = self.get(id)?;
        self.relations
            .lookup(object.kind(), relation)
            .ok_or_else(|| Error::NotFound(format!("{id}/{relation}")))
    }

    /// Resolves or lazily creates the connection `relation` of object `id`.
    pub fn connection(&mut self, id: &str, relation: &str) -> Result<&mut Connection> {
        let kind = self.relation_kind(id, relation)?;
        Ok(self
            .connections
            .entry((id.to_string(), relation.to_string()))
            .or_insert_with(|| Connection::new(id, relation, kind)))
    }

    /// Read-only view of a connection.
    ///
    /// Returns `Ok(None)` for a declared relation that has never been written.
    pub fn peek_connection(&self, id: &str, relation: &str) -> Result<Option<&Connection>> {
        self.relation_kind(id, relation)?;
        Ok(self
            .connections
            .get(&(id.to_string(), relation.to_string())))
    }
}
