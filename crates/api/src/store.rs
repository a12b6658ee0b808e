use crate::error::ApiResult;
use crate::models::{NodeRecord, RelationshipRecord};
use async_trait::async_trait;
use std::path::Path;

/// Persistence boundary for a built graph.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upsert nodes by id and relationships by (source, target, type).
    async fn save(&self, nodes: &[NodeRecord], relationships: &[RelationshipRecord])
    -> ApiResult<()>;

    /// Remove every entry scoped to `path`, together with relationships touching
    /// the removed nodes.
    async fn delete_path(&self, path: &Path) -> ApiResult<()>;
}
