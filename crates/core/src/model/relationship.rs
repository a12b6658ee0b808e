use super::id::NodeId;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symgraph_api::{RelationshipRecord, RelationshipType};

/// Relationship identity: duplicates with the same triple collapse.
pub type RelationshipKey = (NodeId, NodeId, RelationshipType);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    start: NodeId,
    end: NodeId,
    kind: RelationshipType,
    scope: Arc<Path>,
}

impl Relationship {
    pub fn new(start: NodeId, end: NodeId, kind: RelationshipType, scope: Arc<Path>) -> Self {
        Self {
            start,
            end,
            kind,
            scope,
        }
    }

    pub fn start(&self) -> &NodeId {
        &self.start
    }

    pub fn end(&self) -> &NodeId {
        &self.end
    }

    pub fn kind(&self) -> RelationshipType {
        self.kind
    }

    pub fn scope(&self) -> &Arc<Path> {
        &self.scope
    }

    pub fn key(&self) -> RelationshipKey {
        (self.start.clone(), self.end.clone(), self.kind)
    }

    pub(crate) fn with_scope(&self, scope: Arc<Path>) -> Self {
        Self {
            scope,
            ..self.clone()
        }
    }

    pub fn to_record(&self) -> RelationshipRecord {
        RelationshipRecord {
            source_id: self.start.to_string(),
            target_id: self.end.to_string(),
            rel_type: self.kind,
            scope: self.scope.to_string_lossy().into_owned(),
            owners: Vec::new(),
        }
    }

    /// Rebuild from a record. Co-owners are the graph's business, see
    /// [`crate::CodeGraph::from_records`].
    pub fn from_record(record: RelationshipRecord) -> Self {
        Self {
            start: NodeId::from(record.source_id),
            end: NodeId::from(record.target_id),
            kind: record.rel_type,
            scope: PathBuf::from(record.scope).into(),
        }
    }
}
