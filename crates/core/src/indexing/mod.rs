pub mod diff;
pub mod file_indexer;
mod link;
pub mod project;
pub mod update;

pub use diff::{ChangeKind, FileChange, GraphDiff, GraphDiffer};
pub use file_indexer::{FileIndex, FileIndexer, PendingLink, PendingReference};
pub use project::{BuildReport, ProjectIndexer};
pub use update::{GraphUpdater, UpdateReport};
