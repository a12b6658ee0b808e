//! Graph store backed by a single JSON document.

use async_trait::async_trait;
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use symgraph_api::{
    ApiError, ApiResult, GraphStore, NodeRecord, RelationshipRecord, RelationshipType,
};
use tokio::sync::Mutex;
use tracing::debug;

/// On-disk shape: the node list and the relationship list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredGraph {
    pub nodes: Vec<NodeRecord>,
    pub relationships: Vec<RelationshipRecord>,
}

type Triple = (String, String, RelationshipType);

fn triple(rel: &RelationshipRecord) -> Triple {
    (rel.source_id.clone(), rel.target_id.clone(), rel.rel_type)
}

impl StoredGraph {
    /// Upsert nodes by id and relationships by triple, keeping first-insert order.
    pub fn upsert(&mut self, nodes: &[NodeRecord], relationships: &[RelationshipRecord]) {
        let mut by_id: IndexMap<String, NodeRecord> = self
            .nodes
            .drain(..)
            .map(|n| (n.id.clone(), n))
            .collect();
        for node in nodes {
            by_id.insert(node.id.clone(), node.clone());
        }
        self.nodes = by_id.into_values().collect();

        let mut by_triple: IndexMap<Triple, RelationshipRecord> = self
            .relationships
            .drain(..)
            .map(|r| (triple(&r), r))
            .collect();
        for rel in relationships {
            by_triple.insert(triple(rel), rel.clone());
        }
        self.relationships = by_triple.into_values().collect();
    }

    /// Drop entries scoped to `path` and every relationship touching a
    /// dropped node.
    pub fn delete_scope(&mut self, path: &Path) -> (usize, usize) {
        let scope = path.to_string_lossy();
        let before = (self.nodes.len(), self.relationships.len());

        let removed: IndexSet<String> = self
            .nodes
            .iter()
            .filter(|n| n.scope == scope)
            .map(|n| n.id.clone())
            .collect();
        self.nodes.retain(|n| !removed.contains(&n.id));
        self.relationships.retain(|r| {
            r.scope != scope && !removed.contains(&r.source_id) && !removed.contains(&r.target_id)
        });

        (
            before.0 - self.nodes.len(),
            before.1 - self.relationships.len(),
        )
    }
}

fn unavailable(path: &Path, e: impl std::fmt::Display) -> ApiError {
    ApiError::Unavailable(format!("{}: {e}", path.display()))
}

/// Whole-document JSON store. Every write replaces the file atomically.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents; a missing file reads as an empty graph.
    pub async fn load(&self) -> ApiResult<StoredGraph> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Remove the stored graph so the next save starts from scratch.
    pub async fn clear(&self) -> ApiResult<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&self.path, e)),
        }
    }

    async fn read(&self) -> ApiResult<StoredGraph> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ApiError::Internal(format!("corrupt graph file {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoredGraph::default()),
            Err(e) => Err(unavailable(&self.path, e)),
        }
    }

    async fn write(&self, graph: &StoredGraph) -> ApiResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| unavailable(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(graph)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| unavailable(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| unavailable(&self.path, e))
    }
}

#[async_trait]
impl GraphStore for JsonFileStore {
    async fn save(&self, nodes: &[NodeRecord], relationships: &[RelationshipRecord]) -> ApiResult<()> {
        let _guard = self.lock.lock().await;
        let mut graph = self.read().await?;
        graph.upsert(nodes, relationships);
        self.write(&graph).await?;
        debug!(
            path = %self.path.display(),
            nodes = graph.nodes.len(),
            relationships = graph.relationships.len(),
            "graph saved"
        );
        Ok(())
    }

    async fn delete_path(&self, path: &Path) -> ApiResult<()> {
        let _guard = self.lock.lock().await;
        let mut graph = self.read().await?;
        let (nodes, relationships) = graph.delete_scope(path);
        if nodes == 0 && relationships == 0 {
            return Ok(());
        }
        self.write(&graph).await?;
        debug!(scope = %path.display(), nodes, relationships, "scope deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_api::NodeKind;
    use tempfile::tempdir;

    fn node(id: &str, name: &str, scope: &str) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            label: NodeKind::Function,
            name: name.into(),
            path: scope.into(),
            uri: format!("file://{scope}"),
            range: None,
            scope: scope.into(),
            owners: vec![],
        }
    }

    fn rel(source: &str, target: &str, scope: &str) -> RelationshipRecord {
        RelationshipRecord {
            source_id: source.into(),
            target_id: target.into(),
            rel_type: RelationshipType::Uses,
            scope: scope.into(),
            owners: vec![],
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("graph.json"));
        assert_eq!(store.load().await.unwrap(), StoredGraph::default());
    }

    #[tokio::test]
    async fn test_save_upserts() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("out/graph.json"));

        store
            .save(&[node("a", "a", "/one.ts"), node("b", "b", "/two.ts")], &[rel("a", "b", "/one.ts")])
            .await
            .unwrap();
        store
            .save(&[node("a", "renamed", "/one.ts")], &[rel("a", "b", "/one.ts")])
            .await
            .unwrap();

        let graph = store.load().await.unwrap();
        let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["renamed", "b"]);
        assert_eq!(graph.relationships.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_path_detaches_relationships() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("graph.json"));
        store
            .save(
                &[node("a", "a", "/one.ts"), node("b", "b", "/two.ts"), node("c", "c", "/two.ts")],
                &[rel("b", "a", "/two.ts"), rel("b", "c", "/two.ts"), rel("c", "b", "/one.ts")],
            )
            .await
            .unwrap();

        store.delete_path(Path::new("/one.ts")).await.unwrap();

        let graph = store.load().await.unwrap();
        let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(graph.relationships, vec![rel("b", "c", "/two.ts")]);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("graph.json"));
        store.save(&[node("a", "a", "/one.ts")], &[]).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), StoredGraph::default());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_internal_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("graph.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = JsonFileStore::new(path).load().await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
