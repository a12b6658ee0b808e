pub mod config;
pub mod error;
pub mod graph;
pub mod indexing;
pub mod logging;
pub mod model;
pub mod project;
pub mod store;
pub mod util;

pub use config::{IndexerConfig, StaleEdgePolicy};
pub use error::{IndexError, Result};
pub use graph::{CodeGraph, GraphBuilder, ScopeSummary};
pub use indexing::{
    BuildReport, ChangeKind, GraphDiff, GraphDiffer, GraphUpdater, ProjectIndexer, UpdateReport,
};
pub use project::ProjectScanner;
pub use store::JsonFileStore;
