use super::id::NodeId;
use crate::util::uri_to_path;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symgraph_api::{NodeKind, NodeRecord, Range};

/// A graph vertex. Immutable; the only derived copy is a re-scoped one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    name: Arc<str>,
    /// Declaration document.
    uri: Arc<str>,
    path: Arc<Path>,
    range: Option<Range>,
    /// File whose indexing produced the node.
    scope: Arc<Path>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        name: &str,
        uri: &str,
        range: Option<Range>,
        scope: Arc<Path>,
    ) -> Self {
        let path: Arc<Path> = uri_to_path(uri)
            .unwrap_or_else(|| PathBuf::from(uri))
            .into();
        Self {
            id,
            kind,
            name: Arc::from(name),
            uri: Arc::from(uri),
            path,
            range,
            scope,
        }
    }

    pub fn file(path: Arc<Path>, uri: &str) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            id: NodeId::file(uri),
            kind: NodeKind::File,
            name: Arc::from(name),
            uri: Arc::from(uri),
            path: path.clone(),
            range: None,
            scope: path,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn range(&self) -> Option<&Range> {
        self.range.as_ref()
    }

    pub fn scope(&self) -> &Arc<Path> {
        &self.scope
    }

    /// Produced by the file that declares it, as opposed to a stand-in
    /// recorded by a file that only refers to the declaration.
    pub fn is_local(&self) -> bool {
        *self.path == *self.scope
    }

    pub(crate) fn with_scope(&self, scope: Arc<Path>) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    pub fn to_record(&self) -> NodeRecord {
        NodeRecord {
            id: self.id.to_string(),
            label: self.kind,
            name: self.name.to_string(),
            path: self.path.to_string_lossy().into_owned(),
            uri: self.uri.to_string(),
            range: self.range,
            scope: self.scope.to_string_lossy().into_owned(),
            owners: Vec::new(),
        }
    }

    pub fn from_record(record: NodeRecord) -> Self {
        Self {
            id: NodeId::from(record.id),
            kind: record.label,
            name: Arc::from(record.name),
            uri: Arc::from(record.uri),
            path: PathBuf::from(record.path).into(),
            range: record.range,
            scope: PathBuf::from(record.scope).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symgraph_api::Position;

    #[test]
    fn test_file_node() {
        let path: Arc<Path> = Path::new("/repo/src/app.ts").into();
        let node = Node::file(path.clone(), "file:///repo/src/app.ts");
        assert_eq!(node.kind(), NodeKind::File);
        assert_eq!(node.name(), "app.ts");
        assert_eq!(node.scope(), &path);
        assert_eq!(node.id(), &NodeId::file("file:///repo/src/app.ts"));
        assert!(node.is_local());
    }

    #[test]
    fn test_record_carries_declaration_path_and_scope() {
        let range = Range::new(Position::new(1, 0), Position::new(3, 1));
        let node = Node::new(
            NodeId::derive("file:///repo/lib.ts", "helper", NodeKind::Function),
            NodeKind::Function,
            "helper",
            "file:///repo/lib.ts",
            Some(range),
            Path::new("/repo/app.ts").into(),
        );
        assert!(!node.is_local());
        let record = node.to_record();
        assert_eq!(record.path, "/repo/lib.ts");
        assert_eq!(record.scope, "/repo/app.ts");
        assert_eq!(record.label, NodeKind::Function);
        assert_eq!(Node::from_record(record), node);
    }
}
