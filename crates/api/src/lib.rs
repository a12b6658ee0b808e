pub mod error;
pub mod models;
pub mod source;
pub mod store;

// Re-export commonly used types
pub use error::{ApiError, ApiResult};
pub use models::*;
pub use source::{FileSource, SymbolSource};
pub use store::GraphStore;
