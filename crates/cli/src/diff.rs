use crate::update::resolve;
use crate::{IndexerArgs, LspArgs, graph_file, open_session};
use std::path::PathBuf;
use symgraph_core::{CodeGraph, GraphDiff, GraphDiffer, JsonFileStore, ProjectIndexer};
use tracing::info;

pub struct DiffArgs {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
    pub out: Option<PathBuf>,
    pub base: String,
    pub environment: String,
    pub report: Option<PathBuf>,
}

pub async fn run(
    args: DiffArgs,
    lsp: LspArgs,
    indexer: IndexerArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let root = args.root.canonicalize()?;
    let indexer = ProjectIndexer::new(indexer.indexer_config()?);
    let store = JsonFileStore::new(graph_file(&root, args.out));

    let stored = store.load().await?;
    let base = CodeGraph::from_records(stored.nodes, stored.relationships)?;
    let changed: Vec<PathBuf> = args.files.into_iter().map(|f| resolve(&root, f)).collect();
    info!(
        "Diffing {} file(s) from {} against {} ({} nodes)...",
        changed.len(),
        args.environment,
        args.base,
        base.node_count()
    );

    let mut session = open_session(&root, &lsp).await?;
    let result = GraphDiffer::new(&indexer, args.base, args.environment)
        .diff(&mut session, &base, &changed)
        .await;
    session.shutdown_exit_close().await;
    let (diff, _) = result?;

    info!(
        "Nodes: +{} ~{} -{}",
        diff.added_nodes.len(),
        diff.modified_nodes.len(),
        diff.removed_nodes.len()
    );
    info!(
        "Relationships: +{} -{}",
        diff.added_relationships.len(),
        diff.removed_relationships.len()
    );
    write_report(&diff, args.report)
}

fn write_report(diff: &GraphDiff, report: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(diff)?;
    match report {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, json)?;
            info!("Diff written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_report_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("diff.json");
        let diff = GraphDiff {
            base: "main".into(),
            environment: "pr-1".into(),
            ..GraphDiff::default()
        };

        write_report(&diff, Some(path.clone())).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["base"], "main");
        assert_eq!(written["environment"], "pr-1");
    }
}
