pub mod graph;
pub mod language;
pub mod source;
pub mod symbol;

pub use graph::*;
pub use language::*;
pub use source::*;
pub use symbol::*;
