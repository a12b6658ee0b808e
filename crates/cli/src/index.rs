use crate::{IndexerArgs, LspArgs, graph_file, open_session};
use std::path::PathBuf;
use symgraph_core::{IndexError, JsonFileStore, ProjectIndexer, ProjectScanner};
use tracing::{info, warn};

pub async fn run(
    root: PathBuf,
    out: Option<PathBuf>,
    ext: Vec<String>,
    lsp: LspArgs,
    indexer: IndexerArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = root.canonicalize()?;
    let indexer = ProjectIndexer::new(indexer.indexer_config()?);
    let mut scanner = ProjectScanner::new(&root);
    if !ext.is_empty() {
        scanner = scanner.with_extensions(&ext);
    }
    let store = JsonFileStore::new(graph_file(&root, out));

    info!("Indexing project at: {}...", root.display());
    let mut session = open_session(&root, &lsp).await?;
    // cleared only once the server is reachable
    let result = match store.clear().await {
        Ok(()) => indexer.index_project(&mut session, &scanner, &store).await,
        Err(e) => Err(IndexError::Store(e)),
    };
    session.shutdown_exit_close().await;
    let (graph, report) = result?;

    for path in &report.files_failed {
        warn!(path = %path.display(), "file was not indexed");
    }
    info!("Indexing complete!");
    info!(
        "Files: {} indexed, {} without symbols, {} failed",
        report.files_indexed,
        report.files_empty,
        report.files_failed.len()
    );
    info!("Nodes: {}", graph.node_count());
    info!("Relationships: {}", graph.relationship_count());
    info!("Graph saved to: {}", store.path().display());
    Ok(())
}
