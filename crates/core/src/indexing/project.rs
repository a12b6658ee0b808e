//! Whole-project indexing: one document at a time through a symbol source,
//! merged into a single graph.

use super::file_indexer::{FileIndex, FileIndexer};
use super::link::link;
use crate::config::IndexerConfig;
use crate::error::{IndexError, Result};
use crate::graph::{CodeGraph, GraphBuilder};
use crate::model::KindTable;
use crate::util::path_to_uri;
use std::path::PathBuf;
use symgraph_api::{ApiError, FileSource, GraphStore, SourceFile, SymbolSource};
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub files_indexed: usize,
    /// Files that contributed nothing: no symbols, or none resolvable.
    pub files_empty: usize,
    pub files_failed: Vec<PathBuf>,
    pub symbols_skipped: usize,
    pub references_linked: usize,
}

enum FileFailure {
    /// The backend is gone; nothing after this file can succeed either.
    Fatal(ApiError),
    Isolated(String),
}

impl From<ApiError> for FileFailure {
    fn from(e: ApiError) -> Self {
        if e.is_fatal() {
            FileFailure::Fatal(e)
        } else {
            FileFailure::Isolated(e.to_string())
        }
    }
}

pub struct ProjectIndexer {
    config: IndexerConfig,
    kinds: KindTable,
}

impl ProjectIndexer {
    pub fn new(config: IndexerConfig) -> Self {
        let kinds = config.kind_table();
        Self { config, kinds }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Index `files` into a fresh graph.
    pub async fn build<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        files: &[SourceFile],
    ) -> Result<(CodeGraph, BuildReport)> {
        let mut builder = GraphBuilder::new();
        let report = self.index_into(source, &mut builder, files).await?;
        let graph = builder.build()?;
        info!(
            files = files.len(),
            indexed = report.files_indexed,
            failed = report.files_failed.len(),
            nodes = graph.node_count(),
            relationships = graph.relationship_count(),
            "graph built"
        );
        Ok((graph, report))
    }

    /// Enumerate, index, and persist a whole project.
    pub async fn index_project<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        files: &dyn FileSource,
        store: &dyn GraphStore,
    ) -> Result<(CodeGraph, BuildReport)> {
        let files = files.files().map_err(IndexError::Files)?;
        let (graph, report) = self.build(source, &files).await?;
        store
            .save(&graph.as_node_list(), &graph.as_relationship_list())
            .await
            .map_err(IndexError::Store)?;
        Ok((graph, report))
    }

    /// Index `files` and merge them, plus the edges their references
    /// resolve to, into `builder`.
    ///
    /// A file whose queries fail is skipped and reported; only a fatal
    /// backend error aborts the run.
    pub(crate) async fn index_into<S: SymbolSource + ?Sized>(
        &self,
        source: &mut S,
        builder: &mut GraphBuilder,
        files: &[SourceFile],
    ) -> Result<BuildReport> {
        let indexer = FileIndexer::new(&self.kinds, &self.config);
        let mut report = BuildReport::default();
        let mut references = Vec::new();
        let mut links = Vec::new();

        for file in files {
            match self.index_file(&indexer, source, file).await {
                Ok(index) => {
                    report.symbols_skipped += index.skipped_symbols;
                    if index.is_empty() {
                        report.files_empty += 1;
                        continue;
                    }
                    report.files_indexed += 1;
                    builder.add(index.nodes, index.relationships);
                    references.extend(index.references);
                    links.extend(index.links);
                }
                Err(FileFailure::Fatal(e)) => {
                    warn!(path = %file.path.display(), error = %e, "symbol source unavailable");
                    return Err(IndexError::Source(e));
                }
                Err(FileFailure::Isolated(reason)) => {
                    warn!(path = %file.path.display(), %reason, "skipping file");
                    report.files_failed.push(file.path.clone());
                }
            }
        }

        report.references_linked = link(builder, &references, &links);
        debug!(linked = report.references_linked, "references linked");
        Ok(report)
    }

    async fn index_file<S: SymbolSource + ?Sized>(
        &self,
        indexer: &FileIndexer<'_>,
        source: &mut S,
        file: &SourceFile,
    ) -> std::result::Result<FileIndex, FileFailure> {
        let text = tokio::fs::read_to_string(&file.path)
            .await
            .map_err(|e| FileFailure::Isolated(e.to_string()))?;
        let uri = path_to_uri(&file.path).map_err(|e| FileFailure::Isolated(e.to_string()))?;
        source
            .open_document(&uri, &text, &file.extension)
            .await?;
        Ok(indexer.index(source, &file.path, &uri).await?)
    }
}
