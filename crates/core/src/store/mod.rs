pub mod json;

pub use json::{JsonFileStore, StoredGraph};
