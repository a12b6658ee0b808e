pub mod scanner;

pub use scanner::{DEFAULT_EXTENSIONS, IGNORE_FILE_NAME, ProjectScanner};
