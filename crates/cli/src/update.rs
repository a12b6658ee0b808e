use crate::{IndexerArgs, LspArgs, graph_file, open_session};
use std::path::{Path, PathBuf};
use symgraph_core::{CodeGraph, GraphUpdater, JsonFileStore, ProjectIndexer};
use tracing::info;

/// Changed paths as the graph records them: absolute, resolved against the
/// canonical root. Deleted files cannot be canonicalized and keep the joined form.
pub(crate) fn resolve(root: &Path, file: PathBuf) -> PathBuf {
    let joined = if file.is_absolute() {
        file
    } else {
        root.join(file)
    };
    joined.canonicalize().unwrap_or(joined)
}

pub async fn run(
    root: PathBuf,
    files: Vec<PathBuf>,
    out: Option<PathBuf>,
    lsp: LspArgs,
    indexer: IndexerArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = root.canonicalize()?;
    let indexer = ProjectIndexer::new(indexer.indexer_config()?);
    let store = JsonFileStore::new(graph_file(&root, out));

    let stored = store.load().await?;
    let graph = CodeGraph::from_records(stored.nodes, stored.relationships)?;
    let changed: Vec<PathBuf> = files.into_iter().map(|f| resolve(&root, f)).collect();
    info!(
        "Updating {} file(s) against {} nodes...",
        changed.len(),
        graph.node_count()
    );

    let mut session = open_session(&root, &lsp).await?;
    let result = GraphUpdater::new(&indexer)
        .update(&mut session, &store, &graph, &changed)
        .await;
    session.shutdown_exit_close().await;
    let (graph, report) = result?;

    info!("Update complete!");
    info!(
        "Evicted: {} nodes, {} relationships",
        report.evicted_nodes, report.evicted_relationships
    );
    info!(
        "Rebuilt: {}, removed: {}, stale edges pruned: {}",
        report.rebuilt.len(),
        report.removed.len(),
        report.pruned
    );
    info!("Nodes: {}", graph.node_count());
    info!("Relationships: {}", graph.relationship_count());
    Ok(())
}
