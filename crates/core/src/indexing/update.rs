//! Incremental updates: evict what changed files contributed, re-index
//! them, and persist the merged result.

use super::project::{BuildReport, ProjectIndexer};
use crate::config::StaleEdgePolicy;
use crate::error::{IndexError, Result};
use crate::graph::{CodeGraph, ScopeSummary};
use indexmap::IndexSet;
use std::path::PathBuf;
use symgraph_api::{GraphStore, SourceFile, SymbolSource};
use tracing::{info, warn};

#[derive(Debug, Default, Clone)]
pub struct UpdateReport {
    /// What each changed path owned before the update.
    pub prior: Vec<ScopeSummary>,
    pub evicted_nodes: usize,
    pub evicted_relationships: usize,
    pub rebuilt: Vec<PathBuf>,
    /// Changed paths that no longer exist; evicted only.
    pub removed: Vec<PathBuf>,
    /// Relationships dropped because an endpoint did not come back.
    pub pruned: usize,
    pub build: BuildReport,
}

pub struct GraphUpdater<'a> {
    indexer: &'a ProjectIndexer,
}

impl<'a> GraphUpdater<'a> {
    pub fn new(indexer: &'a ProjectIndexer) -> Self {
        Self { indexer }
    }

    /// Apply a change set to `graph` and persist the result.
    ///
    /// Everything scoped to a changed path is evicted and the path is
    /// indexed again; entries owned by other files are untouched. The store
    /// only sees the result: each changed path is deleted there before the
    /// merged graph is saved, so a rejected update leaves it as it was.
    pub async fn update<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        store: &dyn GraphStore,
        graph: &CodeGraph,
        changed: &[PathBuf],
    ) -> Result<(CodeGraph, UpdateReport)> {
        let (updated, report) = self.apply(source, graph, changed).await?;

        for path in report.prior.iter().map(|prior| &prior.path) {
            store.delete_path(path).await.map_err(IndexError::Store)?;
        }
        store
            .save(&updated.as_node_list(), &updated.as_relationship_list())
            .await
            .map_err(IndexError::Store)?;

        info!(
            changed = report.prior.len(),
            evicted_nodes = report.evicted_nodes,
            pruned = report.pruned,
            nodes = updated.node_count(),
            relationships = updated.relationship_count(),
            "graph updated"
        );
        Ok((updated, report))
    }

    /// The in-memory half of [`GraphUpdater::update`]: the updated graph,
    /// with no store involved.
    pub async fn apply<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        graph: &CodeGraph,
        changed: &[PathBuf],
    ) -> Result<(CodeGraph, UpdateReport)> {
        let changed: IndexSet<PathBuf> = changed.iter().cloned().collect();
        let mut report = UpdateReport {
            prior: changed.iter().map(|path| graph.scope_of(path)).collect(),
            ..UpdateReport::default()
        };

        let mut builder = graph.to_builder();
        for path in &changed {
            let removed = builder.remove_path(path);
            report.evicted_nodes += removed.nodes;
            report.evicted_relationships += removed.relationships;
        }

        let mut files = Vec::new();
        for path in changed.iter() {
            let exists = tokio::fs::metadata(path)
                .await
                .map(|meta| meta.is_file())
                .unwrap_or(false);
            if exists {
                files.push(SourceFile::new(path.clone()));
                report.rebuilt.push(path.clone());
            } else {
                info!(path = %path.display(), "file gone, evicting only");
                report.removed.push(path.clone());
            }
        }
        report.build = self.indexer.index_into(source, &mut builder, &files).await?;

        let stale = builder.dangling().len();
        if stale > 0 {
            match self.indexer.config().stale_edges {
                StaleEdgePolicy::Prune => {
                    for rel in builder.prune_dangling() {
                        warn!(
                            source = %rel.start(),
                            target = %rel.end(),
                            kind = %rel.kind(),
                            "pruned stale relationship"
                        );
                    }
                    report.pruned = stale;
                }
                StaleEdgePolicy::Reject => {
                    return Err(IndexError::StaleRelationships { count: stale });
                }
            }
        }
        let updated = builder.build()?;
        Ok((updated, report))
    }
}
