use std::fmt;
use std::sync::Arc;
use symgraph_api::NodeKind;
use xxhash_rust::xxh3::Xxh3;

/// Content-derived node identity: 16 hex chars of xxh3-64 over the
/// declaration URI, the qualified name and the node kind.
///
/// Re-indexing an unchanged declaration always yields the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Arc<str>);

impl NodeId {
    pub fn derive(uri: &str, qualified_name: &str, kind: NodeKind) -> Self {
        let mut hasher = Xxh3::new();
        hasher.update(uri.as_bytes());
        hasher.update(&[0]);
        hasher.update(qualified_name.as_bytes());
        hasher.update(&[0]);
        hasher.update(kind.label().as_bytes());
        Self(Arc::from(format!("{:016x}", hasher.digest())))
    }

    /// Id of the File node for a document.
    pub fn file(uri: &str) -> Self {
        Self::derive(uri, "", NodeKind::File)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeId {
    fn from(raw: String) -> Self {
        Self(Arc::from(raw))
    }
}

impl From<&str> for NodeId {
    fn from(raw: &str) -> Self {
        Self(Arc::from(raw))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
