//! Arc-wrapped immutable code graph
//!
//! `CodeGraph` is a cheap-to-clone snapshot produced by
//! [`GraphBuilder::build`], which only succeeds when every relationship
//! endpoint is present.

use super::builder::GraphBuilder;
use crate::error::Result;
use crate::model::{Node, NodeId, Relationship, RelationshipKey};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symgraph_api::{NodeKind, NodeRecord, Position, RelationshipRecord};

/// Entries a single file is (co-)responsible for.
#[derive(Clone, Debug, Default)]
pub struct FileEntry {
    pub nodes: IndexSet<NodeId>,
    pub relationships: IndexSet<RelationshipKey>,
}

/// Internal data structure (shared via Arc)
#[derive(Clone, Debug, Default)]
pub(crate) struct GraphInner {
    pub nodes: IndexMap<NodeId, Node>,
    pub relationships: IndexMap<RelationshipKey, Relationship>,
    /// Files that produced each entry. An entry lives until its last owner
    /// is evicted.
    pub node_owners: HashMap<NodeId, IndexSet<Arc<Path>>>,
    pub relationship_owners: HashMap<RelationshipKey, IndexSet<Arc<Path>>>,
    pub file_index: HashMap<Arc<Path>, FileEntry>,
}

/// Ids attributable to one file, as seen before an update.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScopeSummary {
    pub path: PathBuf,
    pub nodes: Vec<NodeId>,
    pub relationships: Vec<RelationshipKey>,
}

impl GraphInner {
    pub fn file_node(&self, path: &Path) -> Option<&Node> {
        self.file_index
            .get(path)?
            .nodes
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.kind() == NodeKind::File && node.path() == path)
    }

    /// Smallest node declared in `path` whose range contains `position`,
    /// falling back to the file node.
    pub fn node_at(&self, path: &Path, position: Position) -> Option<&Node> {
        let entry = self.file_index.get(path)?;
        entry
            .nodes
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .filter(|node| node.path() == path)
            .filter_map(|node| node.range().map(|range| (node, range)))
            .filter(|(_, range)| range.contains(position))
            .min_by_key(|(_, range)| range.extent())
            .map(|(node, _)| node)
            .or_else(|| self.file_node(path))
    }

    pub fn scope_of(&self, path: &Path) -> ScopeSummary {
        let mut summary = ScopeSummary {
            path: path.to_path_buf(),
            ..ScopeSummary::default()
        };
        if let Some(entry) = self.file_index.get(path) {
            summary.nodes = entry.nodes.iter().cloned().collect();
            summary.relationships = entry.relationships.iter().cloned().collect();
        }
        summary
    }

    pub fn is_dangling(&self, rel: &Relationship) -> bool {
        !self.nodes.contains_key(rel.start()) || !self.nodes.contains_key(rel.end())
    }
}

/// Immutable code graph (cheap to clone via Arc)
#[derive(Clone, Debug, Default)]
pub struct CodeGraph {
    inner: Arc<GraphInner>,
}

impl CodeGraph {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: GraphInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Rebuild a graph from persisted records, co-owners included, so an
    /// update against it evicts exactly what it would in memory.
    pub fn from_records(
        nodes: impl IntoIterator<Item = NodeRecord>,
        relationships: impl IntoIterator<Item = RelationshipRecord>,
    ) -> Result<Self> {
        let mut builder = GraphBuilder::new();
        for record in nodes {
            let owners = owner_paths(&record.owners);
            builder.restore_node(Node::from_record(record), owners);
        }
        for record in relationships {
            let owners = owner_paths(&record.owners);
            builder.restore_relationship(Relationship::from_record(record), owners);
        }
        builder.build()
    }

    /// Deep copy into a mutable builder.
    pub fn to_builder(&self) -> GraphBuilder {
        GraphBuilder::from_inner((*self.inner).clone())
    }

    pub fn node_count(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.inner.relationships.len()
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.inner.nodes.get(id)
    }

    pub fn contains_relationship(&self, key: &RelationshipKey) -> bool {
        self.inner.relationships.contains_key(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inner.nodes.values()
    }

    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.inner.relationships.values()
    }

    /// Files that own at least one entry.
    pub fn indexed_paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.inner.file_index.keys().map(|p| &**p).collect();
        paths.sort();
        paths
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

    /// Insertion-ordered node records.
    pub fn as_node_list(&self) -> Vec<NodeRecord> {
        self.inner
            .nodes
            .values()
            .map(|node| NodeRecord {
                owners: owner_names(self.inner.node_owners.get(node.id())),
                ..node.to_record()
            })
            .collect()
    }

    /// Insertion-ordered relationship records.
    pub fn as_relationship_list(&self) -> Vec<RelationshipRecord> {
        debug_assert!(
            !self
                .inner
                .relationships
                .values()
                .any(|rel| self.inner.is_dangling(rel))
        );
        self.inner
            .relationships
            .iter()
            .map(|(key, rel)| RelationshipRecord {
                owners: owner_names(self.inner.relationship_owners.get(key)),
                ..rel.to_record()
            })
            .collect()
    }
}

/// Owners worth persisting: only co-owned entries list them.
fn owner_names(owners: Option<&IndexSet<Arc<Path>>>) -> Vec<String> {
    match owners {
        Some(owners) if owners.len() > 1 => owners
            .iter()
            .map(|owner| owner.to_string_lossy().into_owned())
            .collect(),
        _ => Vec::new(),
    }
}

fn owner_paths(owners: &[String]) -> Vec<Arc<Path>> {
    owners.iter().map(|owner| Arc::from(Path::new(owner))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_api::{Range, RelationshipType};

    fn scope(path: &str) -> Arc<Path> {
        Path::new(path).into()
    }

    fn symbol(name: &str, kind: NodeKind, range: Range, file: &str) -> Node {
        let uri = format!("file://{file}");
        Node::new(
            NodeId::derive(&uri, name, kind),
            kind,
            name,
            &uri,
            Some(range),
            scope(file),
        )
    }

    fn range(sl: u32, sc: u32, el: u32, ec: u32) -> Range {
        Range::new(Position::new(sl, sc), Position::new(el, ec))
    }

    #[test]
    fn test_node_at_prefers_innermost_and_falls_back_to_file() {
        let file = Node::file(scope("/repo/a.ts"), "file:///repo/a.ts");
        let class = symbol("Shape", NodeKind::Class, range(0, 0, 10, 1), "/repo/a.ts");
        let method = symbol("area", NodeKind::Method, range(2, 2, 4, 3), "/repo/a.ts");

        let mut builder = GraphBuilder::new();
        builder.add([file.clone(), class.clone(), method.clone()], []);
        let graph = builder.build().unwrap();

        let path = Path::new("/repo/a.ts");
        assert_eq!(graph.node_at(path, Position::new(3, 0)), Some(&method));
        assert_eq!(graph.node_at(path, Position::new(8, 0)), Some(&class));
        assert_eq!(graph.node_at(path, Position::new(20, 0)), Some(&file));
        assert_eq!(graph.node_at(Path::new("/repo/b.ts"), Position::new(0, 0)), None);
    }

    #[test]
    fn test_from_records_rebuilds_graph() {
        let file = Node::file(scope("/repo/a.ts"), "file:///repo/a.ts");
        let class = symbol("Shape", NodeKind::Class, range(0, 0, 10, 1), "/repo/a.ts");
        let contains = Relationship::new(
            file.id().clone(),
            class.id().clone(),
            RelationshipType::Contains,
            scope("/repo/a.ts"),
        );
        let mut builder = GraphBuilder::new();
        builder.add([file, class], [contains]);
        let graph = builder.build().unwrap();

        let restored =
            CodeGraph::from_records(graph.as_node_list(), graph.as_relationship_list()).unwrap();
        assert_eq!(restored.node_count(), 2);
        assert_eq!(restored.relationship_count(), 1);
        assert_eq!(
            restored.scope_of(Path::new("/repo/a.ts")),
            graph.scope_of(Path::new("/repo/a.ts"))
        );
    }

    #[test]
    fn test_records_keep_every_owner() {
        let helper = |owner: &str| {
            Node::new(
                NodeId::derive("file:///vendor/lib.d.ts", "helper", NodeKind::Function),
                NodeKind::Function,
                "helper",
                "file:///vendor/lib.d.ts",
                Some(range(2, 0, 2, 6)),
                scope(owner),
            )
        };
        let mut builder = GraphBuilder::new();
        builder.add([helper("/repo/a.ts"), helper("/repo/b.ts")], []);
        let graph = builder.build().unwrap();

        let records = graph.as_node_list();
        assert_eq!(records[0].owners, vec!["/repo/a.ts", "/repo/b.ts"]);

        let restored = CodeGraph::from_records(records, graph.as_relationship_list()).unwrap();
        assert_eq!(restored.as_node_list(), graph.as_node_list());
        for path in ["/repo/a.ts", "/repo/b.ts"] {
            assert_eq!(restored.scope_of(Path::new(path)), graph.scope_of(Path::new(path)));
        }

        let mut builder = restored.to_builder();
        builder.remove_path(Path::new("/repo/a.ts"));
        let survivor = builder.node(helper("/repo/b.ts").id()).unwrap();
        assert_eq!(survivor.scope().as_ref(), Path::new("/repo/b.ts"));
    }
}
