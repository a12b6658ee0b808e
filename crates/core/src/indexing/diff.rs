//! Change-set previews: what re-indexing some files would do to a graph,
//! labelled with the environment the change comes from. No store is read
//! or written.

use super::project::ProjectIndexer;
use super::update::{GraphUpdater, UpdateReport};
use crate::error::Result;
use crate::graph::CodeGraph;
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;
use symgraph_api::{NodeRecord, RelationshipRecord, RelationshipType, SymbolSource};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: PathBuf,
    pub change: ChangeKind,
}

/// Difference between a base graph and the same graph with a change set
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDiff {
    /// Environment the base graph describes, e.g. the main branch.
    pub base: String,
    /// Environment the change set comes from, e.g. a pull request.
    pub environment: String,
    pub files: Vec<FileChange>,
    pub added_nodes: Vec<NodeRecord>,
    /// Nodes whose declaration moved or changed shape; head values.
    pub modified_nodes: Vec<NodeRecord>,
    pub removed_nodes: Vec<NodeRecord>,
    pub added_relationships: Vec<RelationshipRecord>,
    pub removed_relationships: Vec<RelationshipRecord>,
}

impl GraphDiff {
    /// No graph change, whatever the files said.
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_relationships.is_empty()
            && self.removed_relationships.is_empty()
    }
}

pub struct GraphDiffer<'a> {
    indexer: &'a ProjectIndexer,
    base: String,
    environment: String,
}

impl<'a> GraphDiffer<'a> {
    pub fn new(
        indexer: &'a ProjectIndexer,
        base: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            indexer,
            base: base.into(),
            environment: environment.into(),
        }
    }

    /// Re-index `changed` on top of `base` and report what moved.
    ///
    /// Files are classified against `base`: a path it knew nothing about is
    /// added, a path that no longer exists is deleted.
    pub async fn diff<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        base: &CodeGraph,
        changed: &[PathBuf],
    ) -> Result<(GraphDiff, UpdateReport)> {
        let (head, report) = GraphUpdater::new(self.indexer)
            .apply(source, base, changed)
            .await?;

        let files = report
            .prior
            .iter()
            .map(|prior| {
                let change = if report.removed.contains(&prior.path) {
                    ChangeKind::Deleted
                } else if prior.nodes.is_empty() && prior.relationships.is_empty() {
                    ChangeKind::Added
                } else {
                    ChangeKind::Modified
                };
                FileChange {
                    path: prior.path.clone(),
                    change,
                }
            })
            .collect();

        let mut diff = GraphDiff {
            base: self.base.clone(),
            environment: self.environment.clone(),
            files,
            ..GraphDiff::default()
        };
        compare_nodes(&mut diff, base.as_node_list(), head.as_node_list());
        compare_relationships(&mut diff, base.as_relationship_list(), head.as_relationship_list());

        info!(
            base = %diff.base,
            environment = %diff.environment,
            added = diff.added_nodes.len(),
            modified = diff.modified_nodes.len(),
            removed = diff.removed_nodes.len(),
            "graph diff ready"
        );
        Ok((diff, report))
    }
}

/// Ownership is bookkeeping; only the declaration itself counts as a change.
fn same_declaration(a: &NodeRecord, b: &NodeRecord) -> bool {
    a.label == b.label && a.name == b.name && a.path == b.path && a.range == b.range
}

fn compare_nodes(diff: &mut GraphDiff, base: Vec<NodeRecord>, head: Vec<NodeRecord>) {
    let mut base: IndexMap<String, NodeRecord> =
        base.into_iter().map(|n| (n.id.clone(), n)).collect();
    for node in head {
        match base.shift_remove(&node.id) {
            None => diff.added_nodes.push(node),
            Some(before) if !same_declaration(&before, &node) => diff.modified_nodes.push(node),
            Some(_) => {}
        }
    }
    diff.removed_nodes = base.into_values().collect();
}

type Triple = (String, String, RelationshipType);

fn compare_relationships(
    diff: &mut GraphDiff,
    base: Vec<RelationshipRecord>,
    head: Vec<RelationshipRecord>,
) {
    let key =
        |r: &RelationshipRecord| -> Triple { (r.source_id.clone(), r.target_id.clone(), r.rel_type) };
    let mut base: IndexMap<Triple, RelationshipRecord> =
        base.into_iter().map(|r| (key(&r), r)).collect();
    for rel in head {
        if base.shift_remove(&key(&rel)).is_none() {
            diff.added_relationships.push(rel);
        }
    }
    diff.removed_relationships = base.into_values().collect();
}
