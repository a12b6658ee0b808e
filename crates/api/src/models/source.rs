use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file selected for indexing, as produced by the traversal collaborator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Extension without the leading dot, e.g. `ts`.
    pub extension: String,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_string();
        Self { path, extension }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_is_derived_from_path() {
        let file = SourceFile::new("/repo/src/app.tsx");
        assert_eq!(file.extension, "tsx");

        let file = SourceFile::new("/repo/Makefile");
        assert_eq!(file.extension, "");
    }
}
