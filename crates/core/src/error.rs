use std::path::PathBuf;
use symgraph_api::{ApiError, RelationshipType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Symbol source failed: {0}")]
    Source(ApiError),
    #[error("File traversal failed: {0}")]
    Files(ApiError),
    #[error("Graph store failed: {0}")]
    Store(ApiError),
    #[error("Path cannot be expressed as a file URI: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Relationship {rel_type} {source_id} -> {target_id} references a missing node")]
    DanglingRelationship {
        source_id: String,
        target_id: String,
        rel_type: RelationshipType,
    },
    #[error("{count} relationships point at nodes removed by the update")]
    StaleRelationships { count: usize },
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
