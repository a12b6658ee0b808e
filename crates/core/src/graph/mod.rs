pub mod builder;
pub mod code_graph;

pub use builder::GraphBuilder;
pub use code_graph::{CodeGraph, ScopeSummary};
