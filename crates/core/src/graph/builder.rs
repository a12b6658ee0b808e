//! Graph builder for creating and modifying code graphs
//!
//! The `GraphBuilder` allows mutable operations on the graph structure.
//! It's used during index construction/updates, then converted to an
//! immutable `CodeGraph` via `build()`, which validates every relationship.

use super::code_graph::{CodeGraph, GraphInner, ScopeSummary};
use crate::error::{IndexError, Result};
use crate::model::{Node, NodeId, Relationship, RelationshipKey};
use indexmap::IndexSet;
use std::path::Path;
use std::sync::Arc;
use symgraph_api::Position;
use tracing::trace;

/// Counts of entries a `remove_path` call dropped outright.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Removed {
    pub nodes: usize,
    pub relationships: usize,
}

/// Mutable graph builder
#[derive(Debug, Default)]
pub struct GraphBuilder {
    inner: GraphInner,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_graph(graph: &CodeGraph) -> Self {
        graph.to_builder()
    }

    pub(crate) fn from_inner(inner: GraphInner) -> Self {
        Self { inner }
    }

    // ---- Mutation methods ----

    /// Merge nodes and relationships. A known node id keeps its value
    /// unless the newcomer comes from the file that declares it; known
    /// triples are not duplicated. Either way the producing file is
    /// recorded as an owner.
    pub fn add(
        &mut self,
        nodes: impl IntoIterator<Item = Node>,
        relationships: impl IntoIterator<Item = Relationship>,
    ) {
        for node in nodes {
            self.add_node(node);
        }
        for rel in relationships {
            self.add_relationship(rel);
        }
    }

    pub fn add_node(&mut self, node: Node) {
        let id = node.id().clone();
        self.own_node(&id, node.scope().clone());
        match self.inner.nodes.get_mut(&id) {
            // the declaring file's view replaces a stand-in left by an importer
            Some(existing) if node.is_local() => *existing = node,
            Some(_) => {}
            None => {
                self.inner.nodes.insert(id, node);
            }
        }
    }

    pub fn add_relationship(&mut self, rel: Relationship) {
        let key = rel.key();
        self.own_relationship(&key, rel.scope().clone());
        if !self.inner.relationships.contains_key(&key) {
            self.inner.relationships.insert(key, rel);
        }
    }

    /// Put back a persisted node as-is, with every file that owned it.
    pub(crate) fn restore_node(&mut self, node: Node, owners: Vec<Arc<Path>>) {
        let id = node.id().clone();
        for owner in owners {
            self.own_node(&id, owner);
        }
        self.own_node(&id, node.scope().clone());
        self.inner.nodes.insert(id, node);
    }

    pub(crate) fn restore_relationship(&mut self, rel: Relationship, owners: Vec<Arc<Path>>) {
        let key = rel.key();
        for owner in owners {
            self.own_relationship(&key, owner);
        }
        self.own_relationship(&key, rel.scope().clone());
        self.inner.relationships.insert(key, rel);
    }

    fn own_node(&mut self, id: &NodeId, owner: Arc<Path>) {
        self.inner
            .node_owners
            .entry(id.clone())
            .or_default()
            .insert(owner.clone());
        self.inner
            .file_index
            .entry(owner)
            .or_default()
            .nodes
            .insert(id.clone());
    }

    fn own_relationship(&mut self, key: &RelationshipKey, owner: Arc<Path>) {
        self.inner
            .relationship_owners
            .entry(key.clone())
            .or_default()
            .insert(owner.clone());
        self.inner
            .file_index
            .entry(owner)
            .or_default()
            .relationships
            .insert(key.clone());
    }

    /// Drop everything attributable to `path`.
    ///
    /// Nodes declared in `path` go regardless of who else refers to them.
    /// Other entries another file also produced survive and are re-scoped to
    /// that file. Relationships from other files pointing at removed nodes
    /// are left for the caller to deal with (see [`GraphBuilder::dangling`]).
    pub fn remove_path(&mut self, path: &Path) -> Removed {
        let mut removed = Removed::default();
        let Some(entry) = self.inner.file_index.remove(path) else {
            return removed;
        };

        for id in entry.nodes {
            let declared_here = self
                .inner
                .nodes
                .get(&id)
                .is_some_and(|node| node.path() == path);
            if declared_here {
                self.evict_node(&id);
                removed.nodes += 1;
                continue;
            }
            match release(&mut self.inner.node_owners, &id, path) {
                None => {
                    self.inner.nodes.shift_remove(&id);
                    removed.nodes += 1;
                }
                Some(next) => {
                    if let Some(node) = self.inner.nodes.get_mut(&id) {
                        if node.scope().as_ref() == path {
                            *node = node.with_scope(next);
                        }
                    }
                }
            }
        }

        for key in entry.relationships {
            match release(&mut self.inner.relationship_owners, &key, path) {
                None => {
                    self.inner.relationships.shift_remove(&key);
                    removed.relationships += 1;
                }
                Some(next) => {
                    if let Some(rel) = self.inner.relationships.get_mut(&key) {
                        if rel.scope().as_ref() == path {
                            *rel = rel.with_scope(next);
                        }
                    }
                }
            }
        }

        trace!(path = %path.display(), ?removed, "removed path");
        removed
    }

    fn evict_node(&mut self, id: &NodeId) {
        self.inner.nodes.shift_remove(id);
        for owner in self.inner.node_owners.remove(id).unwrap_or_default() {
            if let Some(entry) = self.inner.file_index.get_mut(&owner) {
                entry.nodes.shift_remove(id);
            }
        }
    }

    /// Relationships whose start or end node is missing.
    pub fn dangling(&self) -> Vec<&Relationship> {
        self.inner
            .relationships
            .values()
            .filter(|rel| self.inner.is_dangling(rel))
            .collect()
    }

    /// Remove and return every dangling relationship.
    pub fn prune_dangling(&mut self) -> Vec<Relationship> {
        let keys: Vec<RelationshipKey> = self.dangling().iter().map(|rel| rel.key()).collect();
        let mut pruned = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(owners) = self.inner.relationship_owners.remove(&key) {
                for owner in owners {
                    if let Some(entry) = self.inner.file_index.get_mut(&owner) {
                        entry.relationships.shift_remove(&key);
                    }
                }
            }
            if let Some(rel) = self.inner.relationships.shift_remove(&key) {
                pruned.push(rel);
            }
        }
        pruned
    }

    /// First dangling relationship as an error.
    pub fn validate(&self) -> Result<()> {
        match self.dangling().first() {
            Some(rel) => Err(IndexError::DanglingRelationship {
                source_id: rel.start().to_string(),
                target_id: rel.end().to_string(),
                rel_type: rel.kind(),
            }),
            None => Ok(()),
        }
    }

    // ---- Read-only accessors used while linking ----

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.inner.nodes.contains_key(id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.inner.nodes.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.inner.relationships.len()
    }

    pub fn file_node(&self, path: &Path) -> Option<&Node> {
        self.inner.file_node(path)
    }

    pub fn node_at(&self, path: &Path, position: Position) -> Option<&Node> {
        self.inner.node_at(path, position)
    }

    pub fn scope_of(&self, path: &Path) -> ScopeSummary {
        self.inner.scope_of(path)
    }

    /// Validate and freeze.
    pub fn build(self) -> Result<CodeGraph> {
        self.validate()?;
        Ok(CodeGraph::from_inner(self.inner))
    }
}

/// Drop `path` from the owners of `key`. Returns the next owner if any remain.
fn release<K: std::hash::Hash + Eq>(
    owners: &mut std::collections::HashMap<K, IndexSet<Arc<Path>>>,
    key: &K,
    path: &Path,
) -> Option<Arc<Path>> {
    let set = owners.get_mut(key)?;
    set.shift_remove(path);
    match set.first() {
        Some(next) => Some(next.clone()),
        None => {
            owners.remove(key);
            None
        }
    }
}
